//! Module entry-point contract and the loading seam

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::application::errors::{HostError, LoadError};
use crate::domain::entities::{
    CommandInvocation, CommandSchema, DiscoveredModule, Interaction, InteractionKind,
    MatchStrategy, ModuleKind,
};
use crate::domain::traits::client::ClientHandle;

/// Handler for a routable interaction.
///
/// Returns whether the event was consumed; `false` lets dispatch fall
/// through to the next candidate.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(
        &self,
        interaction: &Interaction,
        client: Arc<dyn ClientHandle>,
    ) -> Result<bool, HostError>;
}

/// Handler for a registered command
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        invocation: CommandInvocation,
        client: Arc<dyn ClientHandle>,
    ) -> Result<(), HostError>;
}

/// One interaction handler declared by a module
#[derive(Clone)]
pub struct InteractionDecl {
    pub kind: InteractionKind,
    pub pattern: String,
    pub strategy: MatchStrategy,
    pub handler: Arc<dyn InteractionHandler>,
}

impl InteractionDecl {
    pub fn new(
        kind: InteractionKind,
        pattern: impl Into<String>,
        strategy: MatchStrategy,
        handler: Arc<dyn InteractionHandler>,
    ) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            strategy,
            handler,
        }
    }
}

/// One command declared by a command module
#[derive(Clone)]
pub struct CommandDecl {
    pub schema: CommandSchema,
    pub handler: Arc<dyn CommandRunner>,
}

/// Entry-point contract for feature modules
#[async_trait]
pub trait FeatureModule: Send + Sync {
    /// Initialize the module against the platform client
    async fn execute(&self, client: Arc<dyn ClientHandle>) -> Result<(), HostError>;

    /// Interaction handlers to register for this module
    fn interactions(&self) -> Vec<InteractionDecl> {
        Vec::new()
    }

    /// Intents to pre-register before the client connects
    fn intents(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Entry-point contract for command modules
pub trait CommandModule: Send + Sync {
    /// Command declarations exposed by this module
    fn commands(&self) -> Vec<CommandDecl>;

    fn interactions(&self) -> Vec<InteractionDecl> {
        Vec::new()
    }
}

/// A loaded entry point, shape-validated by the loader
pub enum AddonEntry {
    Feature(Arc<dyn FeatureModule>),
    Command(Arc<dyn CommandModule>),
}

impl AddonEntry {
    pub fn kind(&self) -> ModuleKind {
        match self {
            AddonEntry::Feature(_) => ModuleKind::Feature,
            AddonEntry::Command(_) => ModuleKind::Command,
        }
    }
}

/// Capability boundary between the host and module code.
///
/// The loader must never trust the loaded shape; a wrong-kind or broken
/// entry is a `LoadError`, not a panic.
pub trait EntryLoader: Send + Sync {
    fn load(&self, module: &DiscoveredModule) -> Result<AddonEntry, LoadError>;
}

type EntryFactory = Arc<dyn Fn() -> AddonEntry + Send + Sync>;

/// In-memory loader for built-in addons and tests, keyed by (directory
/// name, kind).
#[derive(Default)]
pub struct StaticEntryLoader {
    entries: RwLock<HashMap<(String, ModuleKind), EntryFactory>>,
}

impl StaticEntryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, directory_name: impl Into<String>, kind: ModuleKind, factory: F)
    where
        F: Fn() -> AddonEntry + Send + Sync + 'static,
    {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((directory_name.into(), kind), Arc::new(factory));
        }
    }
}

impl EntryLoader for StaticEntryLoader {
    fn load(&self, module: &DiscoveredModule) -> Result<AddonEntry, LoadError> {
        let factory = self
            .entries
            .read()
            .map_err(|_| LoadError::Entry("loader lock poisoned".to_string()))?
            .get(&(module.directory_name.clone(), module.kind))
            .cloned()
            .ok_or_else(|| {
                LoadError::Entry(format!(
                    "no {} entry registered for '{}'",
                    module.kind, module.directory_name
                ))
            })?;
        Ok(factory())
    }
}
