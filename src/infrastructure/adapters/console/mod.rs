//! Console adapter for development/testing

use async_trait::async_trait;

use crate::application::errors::ClientError;
use crate::domain::entities::{CommandSchema, Interaction};
use crate::domain::traits::{ClientHandle, ClientInfo};

/// Client handle that prints to stdout, for local runs
pub struct ConsoleAdapter {
    info: ClientInfo,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ClientInfo {
                id: "console".to_string(),
                name: name.into(),
            },
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new("addon-host")
    }
}

#[async_trait]
impl ClientHandle for ConsoleAdapter {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), ClientError> {
        println!("[{}] {}", channel_id, text);
        Ok(())
    }

    async fn acknowledge(
        &self,
        interaction: &Interaction,
        text: Option<&str>,
    ) -> Result<(), ClientError> {
        match text {
            Some(t) => println!("[ack {}] {}", interaction.custom_id, t),
            None => println!("[ack {}]", interaction.custom_id),
        }
        Ok(())
    }

    async fn register_command(&self, schema: &CommandSchema) -> Result<(), ClientError> {
        tracing::debug!("console client accepted command '{}'", schema.name);
        Ok(())
    }

    fn client_info(&self) -> ClientInfo {
        self.info.clone()
    }
}
