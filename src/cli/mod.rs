use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::core::{AppConfig, logging};

pub mod models;
pub mod parse;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8000")]
        port: String,
    },
    /// Turn a scheduling request into calendar actions and print them
    Parse {
        #[arg(long)]
        text: String,
        /// Path to a photo of a flyer or timetable
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List the models available to the configured API key
    Models {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // A missing .env file is fine, the environment may already be set
    let _ = dotenvy::dotenv();
    logging::init();

    let config = AppConfig::from_env()?;

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::Parse { text, image }) => {
            parse::run(text, image, config).await?;
        }
        Some(Command::Models {}) => {
            models::run(config).await?;
        }
        None => {}
    }

    Ok(())
}
