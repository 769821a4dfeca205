//! Host context - explicitly constructed, explicitly passed

use std::time::Duration;

use crate::application::intents::IntentRegistry;
use crate::application::registry::{CommandTable, InteractionRegistry};

/// Default per-module load timeout
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state of one host instance.
///
/// Tests build isolated contexts per case; nothing here is process-global.
pub struct HostContext {
    pub commands: CommandTable,
    pub interactions: InteractionRegistry,
    pub intents: IntentRegistry,
    pub load_timeout: Duration,
}

impl HostContext {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_LOAD_TIMEOUT)
    }

    pub fn with_timeout(load_timeout: Duration) -> Self {
        Self {
            commands: CommandTable::new(),
            interactions: InteractionRegistry::new(),
            intents: IntentRegistry::new(),
            load_timeout,
        }
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}
