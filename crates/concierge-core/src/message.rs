use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound user utterance handed over by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Stable user key (e.g. a WhatsApp phone number).
    pub user_id: String,
    /// Message text content. Voice notes arrive already transcribed.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl IncomingMessage {
    /// Build a text-only message stamped now.
    pub fn text(user_id: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
        }
    }

    /// First document attachment, if any.
    pub fn document(&self) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|a| matches!(a.file_type, AttachmentType::Document))
    }
}

/// A file attachment on a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file_type: AttachmentType,
    pub url: Option<String>,
    pub filename: Option<String>,
}

/// Supported attachment types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Document,
    Audio,
    Other,
}
