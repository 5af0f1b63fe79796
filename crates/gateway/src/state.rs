//! Application state shared across handlers.

use std::sync::Arc;

use messaging::SignatureValidator;
use orchestrator::{MessageSender, Orchestrator};

/// Reply transport used by the pipeline.
pub type Sender = Arc<dyn MessageSender>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Inbound pipeline.
    pub orchestrator: Arc<Orchestrator<Sender>>,
    /// Webhook signature checker; `None` when validation is disabled.
    pub signatures: Option<Arc<SignatureValidator>>,
    /// Externally visible base URL, if configured.
    pub public_base_url: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        orchestrator: Orchestrator<Sender>,
        signatures: Option<SignatureValidator>,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            signatures: signatures.map(Arc::new),
            public_base_url,
        }
    }
}
