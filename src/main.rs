use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod models;
mod sync;

use commands::{ConfigCommand, DecodeCommand, EncodeCommand, ImportCommand, ProjectCommand};
use config::Config;
use db::{init_db, ProjectRepository};
use sync::Importer;

#[derive(Parser)]
#[command(name = "apicase")]
#[command(version)]
#[command(about = "API test case editor codec and catalog importer", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an editor form into a runner case
    Encode(EncodeCommand),

    /// Convert a runner case into editor rows
    Decode(DecodeCommand),

    /// Manage projects
    Project(ProjectCommand),

    /// Import catalog items into a project
    Import(ImportCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apicase=info,apicase_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Encode(cmd)) => cmd.run()?,
        Some(Commands::Decode(cmd)) => cmd.run()?,
        Some(Commands::Project(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            cmd.run(&ProjectRepository::new(pool)).await?;
        }
        Some(Commands::Import(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let span = tracing::info_span!("import");
            let importer = Importer::new(pool, config.catalog.clone(), &config.importer.value)
                .with_span(span);
            cmd.run(&importer, &config).await?;
        }
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
