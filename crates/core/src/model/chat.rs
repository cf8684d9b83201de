use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::MessageId;

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Student,
    Tutor,
}

/// One turn of a tutor conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            text: text.into(),
            sent_at,
        }
    }

    #[must_use]
    pub fn student(text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self::new(ChatRole::Student, text, sent_at)
    }

    #[must_use]
    pub fn tutor(text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self::new(ChatRole::Tutor, text, sent_at)
    }
}
