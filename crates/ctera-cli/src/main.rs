//! CTERA module runner (ctera-module)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ctera_cli::commands::{ListCommand, RunCommand, ShowCommand};
use ctera_client::ClientConfig;

#[derive(Parser)]
#[command(name = "ctera-module")]
#[command(about = "Run CTERA ensure modules")]
#[command(version)]
#[command(long_about = "
Run CTERA ensure modules

Each module brings one resource on a CTERA edge filer or portal to the
requested state and prints the outcome as JSON on stdout.

Examples:
  ctera-module list                                  # List modules
  ctera-module show ctera_portal_tenant              # Describe a module
  ctera-module run ctera_filer_ntp ntp.json          # Run a module
  ctera-module -c site.toml run ctera_filer_array a.json
")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file with connection defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a module
    Run {
        /// Module name, e.g. ctera_filer_share
        module: String,

        /// JSON file holding the module and connection arguments
        args_file: PathBuf,
    },

    /// List available modules
    List,

    /// Show how a module connects and fails
    Show {
        /// Module name
        module: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Run { module, args_file } => {
            let config = ClientConfig::load_with_defaults(cli.config.as_deref())
                .context("Failed to load configuration")?;
            let cmd = RunCommand::new(config);
            match cmd.execute(&module, &args_file).await {
                Ok(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
                    if outcome.has_failed() {
                        std::process::exit(1);
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        Commands::List => {
            ListCommand::new().execute();
            Ok(())
        }

        Commands::Show { module } => ShowCommand::new().execute(&module),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);

                if cli.verbose || cli.debug {
                    let mut source = e.source();
                    while let Some(err) = source {
                        eprintln!("  Caused by: {}", err);
                        source = err.source();
                    }
                }
            }
            std::process::exit(1);
        }
    }
}
