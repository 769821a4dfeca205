//! Priority grouping and the timed loader
//!
//! Modules load in strictly descending priority tiers; within a tier they
//! load concurrently, each wrapped in a timeout. Nothing a module does
//! during its own load may escape this boundary.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::report::LoadResult;
use crate::application::context::HostContext;
use crate::application::errors::{LoadError, RegistryError};
use crate::application::registry::RegisteredCommand;
use crate::domain::entities::{DiscoveredModule, ModuleKind};
use crate::domain::traits::{AddonEntry, ClientHandle, EntryLoader};

/// Load every discovered module, one result per input.
///
/// The barrier between tiers is the JoinSet drain: every module of a tier
/// has settled (success, failure, or timeout) before the next tier spawns.
pub async fn load_all(
    ctx: Arc<HostContext>,
    loader: Arc<dyn EntryLoader>,
    client: Arc<dyn ClientHandle>,
    modules: Vec<DiscoveredModule>,
) -> Vec<LoadResult> {
    let mut tiers: BTreeMap<u32, Vec<DiscoveredModule>> = BTreeMap::new();
    for module in modules {
        tiers.entry(module.priority()).or_default().push(module);
    }

    let mut results = Vec::new();
    for (priority, tier) in tiers.into_iter().rev() {
        debug!("loading priority tier {} ({} module(s))", priority, tier.len());
        let mut set = JoinSet::new();
        for module in tier {
            let ctx = ctx.clone();
            let loader = loader.clone();
            let client = client.clone();
            set.spawn(async move { load_one(ctx, loader, client, module).await });
        }
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("load task panicked: {}", e),
            }
        }
    }

    results
}

/// Load one module under the configured timeout.
async fn load_one(
    ctx: Arc<HostContext>,
    loader: Arc<dyn EntryLoader>,
    client: Arc<dyn ClientHandle>,
    module: DiscoveredModule,
) -> LoadResult {
    let label = module.display_label();
    let kind = module.kind;
    let window = ctx.load_timeout;
    let started = Instant::now();

    // Spawned so a stuck module keeps running detached after the timeout
    // fires; the load is only marked failed, the work is not cancelled.
    // Its late completion or error goes unobserved (known limitation).
    let attempt = tokio::spawn(run_load(ctx, loader, client, module));

    match tokio::time::timeout(window, attempt).await {
        Ok(Ok(Ok(outcome))) => outcome.into_result(label, kind, started.elapsed()),
        Ok(Ok(Err(e))) => {
            warn!("failed to load {}: {}", label, e);
            LoadResult::failed(label, kind, started.elapsed(), e.to_string())
        }
        Ok(Err(join_err)) => {
            error!("load of {} panicked: {}", label, join_err);
            LoadResult::failed(label, kind, started.elapsed(), join_err.to_string())
        }
        Err(_) => {
            let e = LoadError::Timeout(window.as_secs());
            warn!("failed to load {}: {}", label, e);
            LoadResult::failed(label, kind, started.elapsed(), e.to_string())
        }
    }
}

/// What a successful load attempt produced
enum LoadOutcome {
    Feature {
        handlers: usize,
    },
    Command {
        commands: usize,
        handlers: usize,
        messages: Vec<String>,
        all_skipped: bool,
    },
}

impl LoadOutcome {
    fn into_result(
        self,
        label: String,
        kind: ModuleKind,
        elapsed: std::time::Duration,
    ) -> LoadResult {
        match self {
            LoadOutcome::Feature { handlers } => {
                LoadResult::succeeded(label, kind, elapsed).with_counts(0, handlers)
            }
            LoadOutcome::Command {
                commands,
                handlers,
                messages,
                all_skipped,
            } => {
                let result = LoadResult::succeeded(label, kind, elapsed)
                    .with_counts(commands, handlers)
                    .with_messages(messages);
                if all_skipped {
                    result.into_skipped()
                } else {
                    result
                }
            }
        }
    }
}

async fn run_load(
    ctx: Arc<HostContext>,
    loader: Arc<dyn EntryLoader>,
    client: Arc<dyn ClientHandle>,
    module: DiscoveredModule,
) -> Result<LoadOutcome, LoadError> {
    let label = module.display_label();
    let priority = module.priority();
    let entry = loader.load(&module)?;

    if entry.kind() != module.kind {
        return Err(LoadError::Shape(format!(
            "entry point is a {} module, expected {}",
            entry.kind(),
            module.kind
        )));
    }

    match entry {
        AddonEntry::Feature(feature) => {
            for intent in feature.intents() {
                ctx.intents.request(intent);
            }
            feature
                .execute(client)
                .await
                .map_err(|e| LoadError::Execute(e.to_string()))?;
            // A single exact-match collision here fails the whole module
            let handlers = ctx
                .interactions
                .register_batch(&label, priority, feature.interactions())?;
            Ok(LoadOutcome::Feature { handlers })
        }
        AddonEntry::Command(command) => {
            let decls = command.commands();
            if decls.is_empty() {
                return Err(LoadError::Shape(
                    "command module declares no commands".to_string(),
                ));
            }

            let mut messages = Vec::new();
            let mut inserted = 0;
            let mut conflicts = 0;
            for decl in decls {
                if let Err(reason) = decl.schema.validate() {
                    messages.push(format!("malformed command declaration: {}", reason));
                    continue;
                }
                let schema = decl.schema.clone();
                match ctx.commands.insert(RegisteredCommand {
                    schema: decl.schema,
                    handler: decl.handler,
                    source: label.clone(),
                }) {
                    Ok(()) => {
                        inserted += 1;
                        // Best effort; the table entry stands either way
                        if let Err(e) = client.register_command(&schema).await {
                            warn!("could not announce command '{}': {}", schema.name, e);
                        }
                    }
                    Err(RegistryError::DuplicateCommand {
                        name,
                        existing_source,
                    }) => {
                        conflicts += 1;
                        messages.push(format!(
                            "command '{}' already registered by {}; skipped",
                            name, existing_source
                        ));
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            let handlers = ctx
                .interactions
                .register_batch(&label, priority, command.interactions())?;

            Ok(LoadOutcome::Command {
                commands: inserted,
                handlers,
                messages,
                all_skipped: inserted == 0 && conflicts > 0,
            })
        }
    }
}
