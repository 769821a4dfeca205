pub mod command;
pub mod descriptor;
pub mod interaction;
pub mod module;

pub use command::{CommandInvocation, CommandSchema};
pub use descriptor::{parse_fields, AddonDescriptor, FieldValue, DESCRIPTOR_FILE};
pub use interaction::{Interaction, InteractionKind, MatchStrategy};
pub use module::{DiscoveredModule, ModuleKind};
