pub mod commands;
pub mod interactions;

pub use commands::{CommandTable, RegisteredCommand};
pub use interactions::{DispatchOutcome, InteractionRegistration, InteractionRegistry};
