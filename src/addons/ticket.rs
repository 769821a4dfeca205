//! Ticket addon - example consumer of the host registries
//!
//! Opens and closes support tickets through the Store collaborator. On any
//! handler error the triggering user still gets a best-effort
//! acknowledgement; details go to the server log.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::errors::HostError;
use crate::domain::entities::{
    CommandInvocation, CommandSchema, Interaction, InteractionKind, MatchStrategy,
};
use crate::domain::traits::{
    ClientHandle, CommandDecl, CommandModule, CommandRunner, FeatureModule, InteractionDecl,
    InteractionHandler, Store,
};

const FALLBACK_REPLY: &str = "Something went wrong, please try again.";

/// Feature half: button and modal handlers
pub struct TicketFeature {
    store: Arc<dyn Store>,
}

impl TicketFeature {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FeatureModule for TicketFeature {
    async fn execute(&self, _client: Arc<dyn ClientHandle>) -> Result<(), HostError> {
        info!("ticket addon ready");
        Ok(())
    }

    fn interactions(&self) -> Vec<InteractionDecl> {
        vec![
            InteractionDecl::new(
                InteractionKind::Button,
                "ticket_close_",
                MatchStrategy::Prefix,
                Arc::new(CloseButton {
                    store: self.store.clone(),
                }),
            ),
            InteractionDecl::new(
                InteractionKind::ModalSubmit,
                "ticket_modal",
                MatchStrategy::Exact,
                Arc::new(OpenModal {
                    store: self.store.clone(),
                }),
            ),
        ]
    }

    fn intents(&self) -> Vec<String> {
        vec!["guild-messages".to_string()]
    }
}

struct CloseButton {
    store: Arc<dyn Store>,
}

#[async_trait]
impl InteractionHandler for CloseButton {
    async fn handle(
        &self,
        interaction: &Interaction,
        client: Arc<dyn ClientHandle>,
    ) -> Result<bool, HostError> {
        let Some(ticket_id) = interaction.custom_id.strip_prefix("ticket_close_") else {
            return Ok(false);
        };

        match close_ticket(&*self.store, ticket_id).await {
            Ok(true) => {
                client
                    .acknowledge(interaction, Some(&format!("Ticket {} closed.", ticket_id)))
                    .await?;
                Ok(true)
            }
            Ok(false) => {
                client
                    .acknowledge(interaction, Some("That ticket is already closed."))
                    .await?;
                Ok(true)
            }
            Err(e) => {
                warn!("could not close ticket {}: {}", ticket_id, e);
                if let Err(ack) = client.acknowledge(interaction, Some(FALLBACK_REPLY)).await {
                    warn!("acknowledgement also failed: {}", ack);
                }
                Ok(true)
            }
        }
    }
}

struct OpenModal {
    store: Arc<dyn Store>,
}

#[async_trait]
impl InteractionHandler for OpenModal {
    async fn handle(
        &self,
        interaction: &Interaction,
        client: Arc<dyn ClientHandle>,
    ) -> Result<bool, HostError> {
        let subject = interaction
            .fields
            .get("subject")
            .and_then(|v| v.as_str())
            .unwrap_or("(no subject)");
        let opened_by = interaction.user_id.as_deref().unwrap_or("unknown");

        match open_ticket(&*self.store, opened_by, subject).await {
            Ok(ticket_id) => {
                client
                    .acknowledge(interaction, Some(&format!("Ticket {} opened.", ticket_id)))
                    .await?;
                Ok(true)
            }
            Err(e) => {
                warn!("could not open ticket for {}: {}", opened_by, e);
                if let Err(ack) = client.acknowledge(interaction, Some(FALLBACK_REPLY)).await {
                    warn!("acknowledgement also failed: {}", ack);
                }
                Ok(true)
            }
        }
    }
}

/// Command half: the `ticket` chat command
pub struct TicketCommands {
    store: Arc<dyn Store>,
}

impl TicketCommands {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl CommandModule for TicketCommands {
    fn commands(&self) -> Vec<CommandDecl> {
        vec![CommandDecl {
            schema: CommandSchema::new("ticket", "Open or close a support ticket"),
            handler: Arc::new(TicketRunner {
                store: self.store.clone(),
            }),
        }]
    }
}

struct TicketRunner {
    store: Arc<dyn Store>,
}

#[async_trait]
impl CommandRunner for TicketRunner {
    async fn run(
        &self,
        invocation: CommandInvocation,
        client: Arc<dyn ClientHandle>,
    ) -> Result<(), HostError> {
        let channel = invocation.channel_id.as_deref().unwrap_or("console");
        let user = invocation.user_id.as_deref().unwrap_or("unknown");

        match invocation.args.first().map(|s| s.as_str()) {
            Some("open") => {
                let joined = invocation.args[1..].join(" ");
                let subject: &str = if joined.is_empty() {
                    "(no subject)"
                } else {
                    &joined
                };
                let ticket_id = open_ticket(&*self.store, user, subject).await?;
                client
                    .send_message(
                        channel,
                        &format!(
                            "Ticket {} opened. Press ticket_close_{} to close it.",
                            ticket_id, ticket_id
                        ),
                    )
                    .await?;
            }
            Some("close") => {
                let Some(ticket_id) = invocation.args.get(1) else {
                    client
                        .send_message(channel, "Usage: ticket close <id>")
                        .await?;
                    return Ok(());
                };
                if close_ticket(&*self.store, ticket_id).await? {
                    client
                        .send_message(channel, &format!("Ticket {} closed.", ticket_id))
                        .await?;
                } else {
                    client
                        .send_message(channel, "That ticket is already closed.")
                        .await?;
                }
            }
            _ => {
                client
                    .send_message(channel, "Usage: ticket open <subject> | ticket close <id>")
                    .await?;
            }
        }
        Ok(())
    }
}

async fn open_ticket(store: &dyn Store, opened_by: &str, subject: &str) -> Result<String, HostError> {
    let ticket_id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();
    store
        .execute(
            "INSERT INTO tickets (id, opened_by, subject, status, created_at)
             VALUES (?1, ?2, ?3, 'open', ?4)",
            &[ticket_id.as_str(), opened_by, subject, created_at.as_str()],
        )
        .await?;
    Ok(ticket_id)
}

/// Returns false when the ticket was not open
async fn close_ticket(store: &dyn Store, ticket_id: &str) -> Result<bool, HostError> {
    let closed_at = Utc::now().to_rfc3339();
    let changed = store
        .execute(
            "UPDATE tickets SET status = 'closed', closed_at = ?2
             WHERE id = ?1 AND status = 'open'",
            &[ticket_id, closed_at.as_str()],
        )
        .await?;
    Ok(changed > 0)
}
