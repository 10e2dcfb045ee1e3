use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use daogov::Deployment;
use daogov_config::{init_tracing, DaoGovConfig};
use daogov_core::FileStorage;

mod script;

use script::{Runner, Script};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario script against a fresh deployment
    Run {
        /// Path to the YAML script
        script: PathBuf,
        /// Configuration file; DAOGOV_* environment variables otherwise
        #[arg(long)]
        config: Option<PathBuf>,
        /// Persist state under this directory instead of memory
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            config,
            data_dir,
            json,
        } => {
            let config = match config {
                Some(path) => DaoGovConfig::from_file(path)?,
                None => DaoGovConfig::from_env()?,
            };
            init_tracing(&config)?;

            let script = Script::from_file(&script)?;
            let genesis = script.genesis_time.unwrap_or_else(|| Utc::now().timestamp());
            info!("Replaying {} steps from {}", script.steps.len(), genesis);

            let deployment = match data_dir {
                Some(dir) => {
                    let storage = FileStorage::new(dir).await?;
                    Deployment::with_storage(config, Arc::new(storage), genesis)
                }
                None => Deployment::in_memory(config, genesis),
            };
            let mut runner = Runner::new(deployment);
            let outcomes = runner.run(&script).await;

            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(events) => {
                        if !json {
                            println!("[{}] {}: ok", outcome.index, outcome.step);
                        }
                        for event in events {
                            if json {
                                println!("{}", serde_json::to_string(event)?);
                            } else {
                                println!("    {} {}", event.name, event.payload);
                            }
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        if json {
                            let report = serde_json::json!({
                                "step": outcome.index,
                                "name": outcome.step,
                                "error": e.to_string(),
                            });
                            println!("{}", report);
                        } else {
                            println!("[{}] {}: FAILED: {}", outcome.index, outcome.step, e);
                        }
                    }
                }
            }
            if !json {
                println!("{} steps, {} failed", outcomes.len(), failed);
            }
        }
    }

    Ok(())
}
