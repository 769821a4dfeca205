//! Built-in addons shipped with the host

pub mod ticket;

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::entities::{parse_fields, AddonDescriptor, DiscoveredModule, ModuleKind};
use crate::domain::traits::{AddonEntry, StaticEntryLoader, Store};

pub use ticket::{TicketCommands, TicketFeature};

/// Built-in modules go through the same discovery shape and loader pipeline
/// as disk addons; only their entry points come from memory.
pub fn builtins(store: Arc<dyn Store>) -> (StaticEntryLoader, Vec<DiscoveredModule>) {
    let loader = StaticEntryLoader::new();

    let feature_store = store.clone();
    loader.register("ticket", ModuleKind::Feature, move || {
        AddonEntry::Feature(Arc::new(TicketFeature::new(feature_store.clone())))
    });
    loader.register("ticket", ModuleKind::Command, move || {
        AddonEntry::Command(Arc::new(TicketCommands::new(store.clone())))
    });

    let (descriptor, _) = AddonDescriptor::from_fields(parse_fields(
        "author: addon-host\nname: ticket\nversion: 0.1\naddonfile: builtin\ncommandfile: builtin\n",
    ))
    .expect("builtin descriptor is well-formed");

    let modules = [ModuleKind::Feature, ModuleKind::Command]
        .into_iter()
        .map(|kind| DiscoveredModule {
            directory_name: "ticket".to_string(),
            directory_path: PathBuf::from("builtin/ticket"),
            descriptor: descriptor.clone(),
            resolved_entry_path: PathBuf::from("builtin"),
            kind,
            creator_label: None,
            is_extension: false,
            parent_label: None,
        })
        .collect();

    (loader, modules)
}
