use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use addon_host::addons;
use addon_host::application::errors::HostError;
use addon_host::application::loader::{discover, load_all, LoadSummary};
use addon_host::application::registry::DispatchOutcome;
use addon_host::application::HostContext;
use addon_host::domain::entities::{CommandInvocation, Interaction};
use addon_host::domain::traits::ClientHandle;
use addon_host::infrastructure::adapters::console::ConsoleAdapter;
use addon_host::infrastructure::config::Config;
use addon_host::infrastructure::database::SqliteStore;
use addon_host::infrastructure::library::LibraryLoader;

#[derive(Parser)]
#[command(name = "addon-host")]
#[command(about = "A plugin host for chat platform addons", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Addons directory (overrides config)
    #[arg(short, long)]
    addons_dir: Option<String>,

    /// Per-module load details in the summary
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_host(cli.config, cli.addons_dir, cli.verbose).await {
                error!("host failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("addon-host v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
    }
}

async fn run_host(
    config_path: String,
    addons_dir: Option<String>,
    verbose: bool,
) -> Result<(), HostError> {
    // Load config
    let mut config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using environment", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };
    if let Some(dir) = addons_dir {
        config.addons.directory = dir.into();
    }
    let verbose = verbose || config.host.verbose;

    info!(
        "{} v{} starting, addons from {}",
        config.host.name,
        env!("CARGO_PKG_VERSION"),
        config.addons.directory.display()
    );

    let store = Arc::new(SqliteStore::open(&config.database.path)?);
    info!("Database initialized");

    let client: Arc<dyn ClientHandle> = Arc::new(ConsoleAdapter::new(config.host.name.clone()));
    let ctx = Arc::new(HostContext::with_timeout(Duration::from_secs(
        config.addons.load_timeout_secs,
    )));
    let mut summary = LoadSummary::new();

    // Built-in addons first, through the same pipeline
    let phase = Instant::now();
    let (builtin_loader, builtin_modules) = addons::builtins(store.clone());
    let results = load_all(
        ctx.clone(),
        Arc::new(builtin_loader),
        client.clone(),
        builtin_modules,
    )
    .await;
    summary.extend(results);
    summary.record_phase("builtin load", phase.elapsed());

    // Disk addons
    let phase = Instant::now();
    let modules = discover(&config.addons.directory);
    summary.record_phase("discovery", phase.elapsed());

    let phase = Instant::now();
    let loader = Arc::new(LibraryLoader::new());
    let results = load_all(ctx.clone(), loader, client.clone(), modules).await;
    summary.extend(results);
    summary.record_phase("addon load", phase.elapsed());

    summary.report(verbose);

    let intents = ctx.intents.collected();
    if !intents.is_empty() {
        info!("client connecting with intents: {}", intents.join(", "));
    }

    if config
        .adapters
        .console
        .as_ref()
        .map(|c| c.enabled)
        .unwrap_or(false)
    {
        console_loop(ctx, client, &config.host.prefix).await?;
    }

    Ok(())
}

/// Read commands and simulated interactions from stdin.
///
/// `<prefix>name args...` invokes a command; `<kind> <custom-id>` (for
/// example `button ticket_close_42`) dispatches an interaction; `quit`
/// exits.
async fn console_loop(
    ctx: Arc<HostContext>,
    client: Arc<dyn ClientHandle>,
    prefix: &str,
) -> Result<(), HostError> {
    use tokio::io::AsyncBufReadExt;

    info!("console ready ({} command(s) registered)", ctx.commands.len());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        if let Some(rest) = line.strip_prefix(prefix) {
            let mut parts = rest.split_whitespace();
            let Some(name) = parts.next() else { continue };
            let invocation = CommandInvocation::new(name, parts.map(String::from).collect())
                .with_channel("console")
                .with_user("console-user");
            match ctx.commands.dispatch(invocation, client.clone()).await {
                Ok(true) => {}
                Ok(false) => println!("Unknown command: {}{}", prefix, name),
                Err(e) => error!("command '{}' failed: {}", name, e),
            }
            continue;
        }

        if let Some((raw_kind, custom_id)) = line.split_once(' ') {
            let interaction = Interaction::new(raw_kind, custom_id).with_user("console-user");
            match ctx.interactions.dispatch(&interaction, client.clone()).await {
                DispatchOutcome::Handled => {}
                DispatchOutcome::Unhandled => println!("No handler for '{}'", custom_id),
                DispatchOutcome::Unroutable => println!("Unknown interaction kind '{}'", raw_kind),
            }
            continue;
        }

        println!("Try '{}ticket open <subject>' or 'quit'", prefix);
    }

    Ok(())
}

fn init_config(path: &str) {
    if std::path::Path::new(path).exists() {
        println!("{} already exists, not overwriting", path);
        return;
    }
    match Config::default().save(path) {
        Ok(()) => println!("Wrote default config to {}", path),
        Err(e) => error!("could not write {}: {}", path, e),
    }
}
