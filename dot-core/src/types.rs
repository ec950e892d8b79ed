//! Core domain types shared across the pipeline.
//!
//! | Term | Definition |
//! |------|------------|
//! | **Snapshot** | A sanitized, point-in-time copy of host data ([`DotData`]) |
//! | **Guarding** | Row sampling and byte-budget enforcement before transmission |
//! | **Profile** | A bounded statistical summary sent instead of oversized data |
//! | **Spec** | The validated, versioned dashboard description |
//! | **Backend** | The external text-generation service behind a model client |

use serde::{Deserialize, Serialize};

/// Sanitized host data: an ordered, string-keyed JSON mapping.
pub type DotData = serde_json::Map<String, serde_json::Value>;

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// One turn of the conversation with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
