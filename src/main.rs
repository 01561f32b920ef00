//! Langdex CLI - serve and administer the programming language catalog

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use langdex::config::{self, ServeSettings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "langdex")]
#[command(version)]
#[command(about = "Programming language catalog - CRUD HTTP API")]
#[command(long_about = r#"
Langdex serves a catalog of programming languages over HTTP:
  • Create, read, update and delete language records
  • Filter languages by key feature tags
  • Account signup/login with bearer tokens

Example usage:
  langdex init
  langdex import --file seed.json
  langdex serve --port 3000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Import areas, techs and languages from a JSON seed file
    Import {
        /// Seed document
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show row counts for the catalog database
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Print every language in the catalog
    List {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Print the version
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        *self == OutputMode::Human
    }
}

/// Print a `{status, command, data}` line for JSON mode
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let payload = serde_json::json!({
            "status": "success",
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string(&payload)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(e) = run(cli, output_mode).await {
        if output_mode.is_human() {
            langdex::ui::error(&format!("{:#}", e));
        } else {
            let payload = serde_json::json!({ "status": "fail", "message": format!("{:#}", e) });
            println!("{}", payload);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let file_config = config::load_config(Some(&config_path))?;
    let database_for = |database: Option<PathBuf>| -> anyhow::Result<PathBuf> {
        Ok(ServeSettings::resolve(file_config.as_ref(), database, None, None)?.database)
    };

    match cli.command {
        Commands::Serve { database, host, port } => {
            let settings = ServeSettings::resolve(file_config.as_ref(), database, host, port)?;
            tracing::info!("Serving catalog from {:?}", settings.database);
            commands::run_serve(output_mode, settings).await
        }
        Commands::Init { force } => commands::run_init(output_mode, &config_path, force),
        Commands::Import { file, database } => {
            commands::run_import(output_mode, &database_for(database)?, &file)
        }
        Commands::Stats { database } => commands::run_stats(output_mode, &database_for(database)?),
        Commands::List { database } => commands::run_list(output_mode, &database_for(database)?),
        Commands::Version => commands::run_version(output_mode),
    }
}
