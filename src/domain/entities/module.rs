//! Discovered module records

use std::path::PathBuf;

use super::descriptor::AddonDescriptor;

/// Kind of entry point a discovered module exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    Feature,
    Command,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Feature => "feature",
            ModuleKind::Command => "command",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry point found on disk during discovery
#[derive(Debug, Clone)]
pub struct DiscoveredModule {
    pub directory_name: String,
    pub directory_path: PathBuf,
    pub descriptor: AddonDescriptor,
    /// Absolute path to the file loaded for this kind
    pub resolved_entry_path: PathBuf,
    pub kind: ModuleKind,
    /// Set when nested one level under a creator directory
    pub creator_label: Option<String>,
    /// Set when found under a parent's declared extensions subdirectory
    pub is_extension: bool,
    pub parent_label: Option<String>,
}

impl DiscoveredModule {
    /// Display label, creator- or parent-qualified when applicable
    pub fn display_label(&self) -> String {
        let base = self
            .descriptor
            .name
            .clone()
            .unwrap_or_else(|| self.directory_name.clone());
        if let Some(parent) = &self.parent_label {
            format!("{}:{}", parent, base)
        } else if let Some(creator) = &self.creator_label {
            format!("{}/{}", creator, base)
        } else {
            base
        }
    }

    pub fn priority(&self) -> u32 {
        self.descriptor.priority
    }
}
