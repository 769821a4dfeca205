pub mod context;
pub mod errors;
pub mod intents;
pub mod loader;
pub mod registry;

pub use context::HostContext;
