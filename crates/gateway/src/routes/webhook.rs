//! Inbound WhatsApp webhook.

use std::collections::HashMap;

use axum::extract::{OriginalUri, State};
use axum::http::{header, HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use axum::Form;
use messaging::{InboundMessage, SignatureValidator, SIGNATURE_HEADER};
use orchestrator::{InboundAttachment, InboundEvent};
use tracing::{debug, info};

use crate::error::{GatewayError, Result};
use crate::state::AppState;

/// Empty TwiML document: replies are sent through the API, not inline.
const EMPTY_TWIML: &str = "<Response></Response>";

/// Handle one webhook delivery.
///
/// The event is processed before answering, so a persistence failure
/// surfaces as a 500 and the provider retries the delivery.
pub async fn receive(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    if let Some(validator) = &state.signatures {
        let url = request_url(&headers, &uri, state.public_base_url.as_deref());
        verify(validator, &headers, &url, &form)?;
    }

    let message =
        InboundMessage::from_form(&form).map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
    info!(
        sid = message.message_sid.as_deref().unwrap_or("-"),
        media = message.media.len(),
        "Webhook received"
    );

    let report = state.orchestrator.handle(to_event(message)).await?;
    info!(
        account_id = %report.account_id,
        onboarded = report.onboarded,
        rate_limited = report.rate_limited,
        attachments = report.attachments.len(),
        command = ?report.command,
        replies_sent = report.replies_sent,
        replies_failed = report.replies_failed,
        "Webhook handled"
    );

    Ok(([(header::CONTENT_TYPE, "text/xml")], EMPTY_TWIML).into_response())
}

fn verify(
    validator: &SignatureValidator,
    headers: &HeaderMap,
    url: &str,
    form: &HashMap<String, String>,
) -> Result<()> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::InvalidSignature)?;

    let params: Vec<(String, String)> = form
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if validator.validate(url, &params, signature) {
        Ok(())
    } else {
        debug!(url, "Signature mismatch");
        Err(GatewayError::InvalidSignature)
    }
}

/// Rebuild the URL the provider signed.
///
/// Proxy headers win, then the configured public base URL, then `Host`.
pub fn request_url(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let forwarded_proto = value("x-forwarded-proto");
    let forwarded_host = value("x-forwarded-host");
    if forwarded_proto.is_none() && forwarded_host.is_none() {
        if let Some(base) = public_base_url {
            return format!("{}{}", base.trim_end_matches('/'), path);
        }
    }

    let proto = forwarded_proto.unwrap_or_else(|| "http".to_string());
    let host = forwarded_host
        .or_else(|| value(header::HOST.as_str()))
        .unwrap_or_default();
    format!("{proto}://{host}{path}")
}

/// Webhook media has no filename; the pipeline names it from its id.
fn to_event(message: InboundMessage) -> InboundEvent {
    InboundEvent {
        address: message.from,
        text: message.body,
        attachments: message
            .media
            .into_iter()
            .map(|m| InboundAttachment::new(m.url, m.content_type))
            .collect(),
    }
}
