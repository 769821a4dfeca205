//! Shared-library entry loader
//!
//! The production EntryLoader: dlopens a module's entry file and resolves a
//! per-kind init symbol. Loaded libraries stay alive for the lifetime of the
//! process; handlers registered by their modules keep pointing into them.

use std::sync::{Arc, Mutex};

use libloading::{Library, Symbol};

use crate::application::errors::LoadError;
use crate::domain::entities::{DiscoveredModule, ModuleKind};
use crate::domain::traits::{AddonEntry, CommandModule, EntryLoader, FeatureModule};

/// Init symbol a feature entry file must export
pub type FeatureEntryFn = unsafe extern "C" fn() -> *mut dyn FeatureModule;
/// Init symbol a command entry file must export
pub type CommandEntryFn = unsafe extern "C" fn() -> *mut dyn CommandModule;

pub const FEATURE_ENTRY_SYMBOL: &[u8] = b"addon_feature_entry";
pub const COMMAND_ENTRY_SYMBOL: &[u8] = b"addon_command_entry";

#[derive(Default)]
pub struct LibraryLoader {
    libraries: Mutex<Vec<Library>>,
}

impl LibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn retain(&self, library: Library) -> Result<(), LoadError> {
        self.libraries
            .lock()
            .map_err(|_| LoadError::Entry("library lock poisoned".to_string()))?
            .push(library);
        Ok(())
    }
}

impl EntryLoader for LibraryLoader {
    fn load(&self, module: &DiscoveredModule) -> Result<AddonEntry, LoadError> {
        let path = &module.resolved_entry_path;

        let library = unsafe { Library::new(path) }
            .map_err(|e| LoadError::Entry(format!("{}: {}", path.display(), e)))?;

        let entry = match module.kind {
            ModuleKind::Feature => {
                let init: Symbol<FeatureEntryFn> =
                    unsafe { library.get(FEATURE_ENTRY_SYMBOL) }.map_err(|e| {
                        LoadError::Shape(format!("missing feature entry symbol: {}", e))
                    })?;
                let ptr = unsafe { init() };
                if ptr.is_null() {
                    return Err(LoadError::Shape("feature entry returned null".to_string()));
                }
                AddonEntry::Feature(unsafe { Arc::from_raw(ptr) })
            }
            ModuleKind::Command => {
                let init: Symbol<CommandEntryFn> =
                    unsafe { library.get(COMMAND_ENTRY_SYMBOL) }.map_err(|e| {
                        LoadError::Shape(format!("missing command entry symbol: {}", e))
                    })?;
                let ptr = unsafe { init() };
                if ptr.is_null() {
                    return Err(LoadError::Shape("command entry returned null".to_string()));
                }
                AddonEntry::Command(unsafe { Arc::from_raw(ptr) })
            }
        };

        self.retain(library)?;
        Ok(entry)
    }
}
