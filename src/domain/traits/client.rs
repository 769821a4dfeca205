//! Client handle - abstraction over the external chat platform

use async_trait::async_trait;

use crate::application::errors::ClientError;
use crate::domain::entities::{CommandSchema, Interaction};

/// Imperative API of the platform client, treated as a black box.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    /// Send a plain message to a channel
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), ClientError>;

    /// Acknowledge an interaction, optionally with user-visible text
    async fn acknowledge(
        &self,
        interaction: &Interaction,
        text: Option<&str>,
    ) -> Result<(), ClientError>;

    /// Announce a command declaration to the platform
    async fn register_command(&self, schema: &CommandSchema) -> Result<(), ClientError>;

    /// Platform identity for diagnostics
    fn client_info(&self) -> ClientInfo;
}

/// Client information
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: String,
    pub name: String,
}
