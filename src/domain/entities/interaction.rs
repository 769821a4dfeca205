//! Interaction events and matching strategies

use serde::{Deserialize, Serialize};

/// Concrete interaction subtypes the dispatcher can route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Button,
    ModalSubmit,
    StringSelect,
    UserSelect,
    RoleSelect,
    MentionableSelect,
    ChannelSelect,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Button => "button",
            InteractionKind::ModalSubmit => "modal-submit",
            InteractionKind::StringSelect => "string-select",
            InteractionKind::UserSelect => "user-select",
            InteractionKind::RoleSelect => "role-select",
            InteractionKind::MentionableSelect => "mentionable-select",
            InteractionKind::ChannelSelect => "channel-select",
        }
    }

    /// Map a platform discriminant onto a routable kind
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "button" => Some(InteractionKind::Button),
            "modal-submit" => Some(InteractionKind::ModalSubmit),
            "string-select" => Some(InteractionKind::StringSelect),
            "user-select" => Some(InteractionKind::UserSelect),
            "role-select" => Some(InteractionKind::RoleSelect),
            "mentionable-select" => Some(InteractionKind::MentionableSelect),
            "channel-select" => Some(InteractionKind::ChannelSelect),
            _ => None,
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule for testing an incoming identifier against a registered pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    Exact,
    Prefix,
    Regex,
}

/// One event from the external platform.
///
/// The wire format belongs to the platform client; this is the narrow view
/// the dispatcher needs.
#[derive(Debug, Clone)]
pub struct Interaction {
    /// Platform discriminant for the concrete subtype
    pub raw_kind: String,
    /// Identifier the registered patterns are matched against
    pub custom_id: String,
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
    /// Selected values for select-menu interactions
    pub values: Vec<String>,
    /// Submitted fields for modal interactions
    pub fields: serde_json::Value,
}

impl Interaction {
    pub fn new(raw_kind: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            raw_kind: raw_kind.into(),
            custom_id: custom_id.into(),
            user_id: None,
            channel_id: None,
            values: Vec::new(),
            fields: serde_json::Value::Null,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }
}
