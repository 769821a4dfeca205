pub mod client;
pub mod module;
pub mod store;

pub use client::{ClientHandle, ClientInfo};
pub use module::{
    AddonEntry, CommandDecl, CommandModule, CommandRunner, EntryLoader, FeatureModule,
    InteractionDecl, InteractionHandler, StaticEntryLoader,
};
pub use store::Store;
