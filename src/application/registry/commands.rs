//! Command table - conflict-checked command registration

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::application::errors::{HostError, RegistryError};
use crate::domain::entities::{CommandInvocation, CommandSchema};
use crate::domain::traits::{ClientHandle, CommandRunner};

/// One registered command with its owning module label
pub struct RegisteredCommand {
    pub schema: CommandSchema,
    pub handler: Arc<dyn CommandRunner>,
    pub source: String,
}

/// Table of globally unique command names.
///
/// The first registrant of a name wins; later claims are rejected so the
/// caller can downgrade them to a skip.
#[derive(Default)]
pub struct CommandTable {
    entries: RwLock<HashMap<String, RegisteredCommand>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a command; a taken name reports the existing owner
    pub fn insert(&self, command: RegisteredCommand) -> Result<(), RegistryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RegistryError::Internal("lock poisoned".to_string()))?;

        if let Some(existing) = entries.get(&command.schema.name) {
            return Err(RegistryError::DuplicateCommand {
                name: command.schema.name.clone(),
                existing_source: existing.source.clone(),
            });
        }

        entries.insert(command.schema.name.clone(), command);
        Ok(())
    }

    /// Look up a command's handler
    pub fn handler(&self, name: &str) -> Option<Arc<dyn CommandRunner>> {
        self.entries
            .read()
            .ok()?
            .get(name)
            .map(|c| c.handler.clone())
    }

    /// Run the named command; `Ok(false)` means no such command
    pub async fn dispatch(
        &self,
        invocation: CommandInvocation,
        client: Arc<dyn ClientHandle>,
    ) -> Result<bool, HostError> {
        let Some(handler) = self.handler(&invocation.name) else {
            return Ok(false);
        };
        handler.run(invocation, client).await?;
        Ok(true)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .ok()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .ok()
            .map(|e| e.contains_key(name))
            .unwrap_or(false)
    }

    pub fn source_of(&self, name: &str) -> Option<String> {
        self.entries
            .read()
            .ok()?
            .get(name)
            .map(|c| c.source.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().ok().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
