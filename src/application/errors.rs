//! Application layer errors

use thiserror::Error;

/// General host errors
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Descriptor parsing and validation errors
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Unreadable descriptor: {0}")]
    Unreadable(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("No entry point declared (expected addonfile, commandfile or mainfile)")]
    NoEntryPoint,
}

/// Errors produced while loading a single module
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Entry load failed: {0}")]
    Entry(String),

    #[error("Invalid module shape: {0}")]
    Shape(String),

    #[error("Execute failed: {0}")]
    Execute(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Registration conflicts and registry failures
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Command '{name}' already registered by {existing_source}")]
    DuplicateCommand { name: String, existing_source: String },

    #[error("Interaction handler for {kind} '{pattern}' already registered by {existing_source}")]
    DuplicateInteraction {
        kind: String,
        pattern: String,
        existing_source: String,
    },

    #[error("Internal registry error: {0}")]
    Internal(String),
}

/// Errors from the platform client handle
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Send failed: {0}")]
    Send(String),

    #[error("Client unavailable: {0}")]
    Unavailable(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
