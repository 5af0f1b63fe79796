//! Transport-neutral inbound events.

/// One attachment of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundAttachment {
    /// Where the bytes can be fetched from.
    pub locator: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Filename supplied by the caller, if any. The WhatsApp webhook carries
    /// none, so webhook attachments are named `{file_id}.{ext}`.
    pub filename: Option<String>,
}

impl InboundAttachment {
    pub fn new(locator: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            mime_type: mime_type.into(),
            filename: None,
        }
    }

    /// Keep `filename` as the stored name, for transports that know it.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A normalized inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    /// Sender address.
    pub address: String,
    /// Message text, possibly empty.
    pub text: String,
    /// Attachments in provider order.
    pub attachments: Vec<InboundAttachment>,
}

impl InboundEvent {
    /// A text-only event.
    pub fn text(address: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// An event with no text and no attachments yet.
    pub fn empty(address: impl Into<String>) -> Self {
        Self::text(address, "")
    }

    /// Append an attachment.
    pub fn with_attachment(mut self, attachment: InboundAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Whether the event carries attachments.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
