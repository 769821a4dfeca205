//! Command declarations and invocations

use serde::{Deserialize, Serialize};

/// Declaration of an externally-invokable command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    /// Platform-specific option payload, passed through untouched
    #[serde(default)]
    pub options: serde_json::Value,
}

impl CommandSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// Well-formedness check applied before registration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("command name is empty".to_string());
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(format!(
                "command name '{}' must be lowercase alphanumeric with '_' or '-'",
                self.name
            ));
        }
        if self.description.is_empty() {
            return Err("command description is empty".to_string());
        }
        Ok(())
    }
}

/// One incoming invocation of a registered command
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub name: String,
    pub args: Vec<String>,
    pub channel_id: Option<String>,
    pub user_id: Option<String>,
}

impl CommandInvocation {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            channel_id: None,
            user_id: None,
        }
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_schema_passes() {
        assert!(CommandSchema::new("ticket", "Open a ticket").validate().is_ok());
    }

    #[test]
    fn empty_name_fails() {
        assert!(CommandSchema::new("", "x").validate().is_err());
    }

    #[test]
    fn uppercase_name_fails() {
        assert!(CommandSchema::new("Ticket", "x").validate().is_err());
    }

    #[test]
    fn empty_description_fails() {
        assert!(CommandSchema::new("ticket", "").validate().is_err());
    }
}
