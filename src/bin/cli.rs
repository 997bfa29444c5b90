//! Gatehouse CLI
//!
//! Administers a gatehouse snapshot file and prints config specs.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gatehouse::{
    Config, ConfigSpecsOptions, Engine, EntityNames, FeatureGateArgs, FileStorage, MutationStatus, SsrOptions,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Gatehouse CLI
#[derive(Parser, Debug)]
#[command(name = "gatehouse-cli")]
#[command(about = "Administer feature gates, target apps and SDK keys")]
#[command(version)]
struct Args {
    /// Snapshot file
    #[arg(short, long, default_value = "./gatehouse.db")]
    data: PathBuf,

    /// Storage key prefix
    #[arg(long, default_value = gatehouse::config::DEFAULT_KEY_PREFIX)]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register an SDK key
    RegisterKey { sdk_key: String },

    /// Create a feature gate
    CreateGate {
        name: String,

        /// Create the gate disabled
        #[arg(long)]
        disabled: bool,

        /// Target apps to scope the gate to
        #[arg(short, long = "target-app")]
        target_apps: Vec<String>,
    },

    /// Create a target app, optionally scoping existing gates to it
    CreateTargetApp {
        name: String,

        #[arg(short, long = "gate")]
        gates: Vec<String>,
    },

    /// Assign target apps to an SDK key
    Assign {
        sdk_key: String,

        #[arg(required = true)]
        target_apps: Vec<String>,
    },

    /// Print the config specs served to an SDK key
    Specs {
        sdk_key: String,

        /// Include the SSR mapping for every key and target app
        #[arg(long)]
        ssr_all: bool,
    },

    /// List target apps, or those of one SDK key
    TargetApps {
        #[arg(long)]
        sdk_key: Option<String>,
    },

    /// Rewrite legacy untagged sets
    Migrate,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gatehouse=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Gatehouse CLI v{}", gatehouse::VERSION);
    tracing::info!("Data file: {}", args.data.display());

    if let Err(e) = run(args).await {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> gatehouse::Result<()> {
    let config = Config::builder().key_prefix(args.prefix).build();
    let storage = Arc::new(FileStorage::open_path(&args.data));
    let engine = Engine::builder().storage(storage).config(config).build()?;
    engine.initialize().await?;

    match args.command {
        Commands::RegisterKey { sdk_key } => {
            report(engine.register_sdk_key(&sdk_key).await?);
        }
        Commands::CreateGate {
            name,
            disabled,
            target_apps,
        } => {
            let gate = FeatureGateArgs::enabled(!disabled).target_apps(target_apps);
            report(engine.create_gate(&name, gate).await?);
        }
        Commands::CreateTargetApp { name, gates } => {
            let entities = EntityNames::new().with(gatehouse::EntityKind::FeatureGate, gates);
            report(engine.create_target_app(&name, &entities).await?);
        }
        Commands::Assign { sdk_key, target_apps } => {
            report(engine.assign_target_apps_to_sdk_key(&target_apps, &sdk_key).await?);
        }
        Commands::Specs { sdk_key, ssr_all } => {
            let options = if ssr_all {
                ConfigSpecsOptions::ssr(SsrOptions::all())
            } else {
                ConfigSpecsOptions::default()
            };
            let specs = engine.get_config_specs(&sdk_key, &options).await?;
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
        Commands::TargetApps { sdk_key } => match engine.target_app_names(sdk_key.as_deref()).await? {
            Some(apps) => apps.iter().for_each(|app| println!("{}", app)),
            None => println!("(global)"),
        },
        Commands::Migrate => {
            let report = engine.migrate_legacy_encoding().await?;
            println!(
                "scanned={} rewritten={} current={} repaired={} pruned={}",
                report.keys_scanned,
                report.keys_rewritten,
                report.keys_current,
                report.entities_repaired,
                report.dangling_pruned
            );
        }
    }

    engine.shutdown().await
}

fn report(status: MutationStatus) {
    match status {
        MutationStatus::Applied => println!("OK"),
        MutationStatus::NotFound => println!("not found"),
        MutationStatus::Rejected => println!("rejected"),
    }
}
