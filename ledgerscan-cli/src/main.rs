use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerscan_core::Session;
use ledgerscan_extract::GeminiExtractor;
use std::path::PathBuf;
use std::sync::Arc;

mod auth;
mod config;
mod extract_cmd;
mod logging;
mod output;
mod paths;
mod state;
mod tui;
mod worker;

use auth::{AuthCommand, AuthStore};
use config::{Config, ConfigCommand, OutputFormat};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LEDGERSCAN_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "ledgerscan", version = VERSION, about = "Extract transactions from bank statement images with Gemini")]
struct Cli {
    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive analyzer (default)
    Tui,

    /// Extract transactions from statement images and print them
    Extract {
        /// Statement images, in page order
        files: Vec<PathBuf>,

        /// Output format (default from config.toml)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the Gemini API key
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage ~/.ledgerscan/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn build_session(cfg: &Config, store: AuthStore) -> Session {
    let store = Arc::new(store);
    let extractor = GeminiExtractor::new(cfg.gemini_settings(), store.clone());
    Session::new(store, Arc::new(extractor), Arc::new(cfg.classifier()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            logging::init_file(cli.verbose, &state::log_path()?)?;
            let cfg = config::load_config()?;
            let session = build_session(&cfg, AuthStore::open_default()?);
            let export_dir = std::env::current_dir().context("current dir")?;
            let handle = tokio::runtime::Handle::current();

            tokio::task::spawn_blocking(move || tui::run_tui(session, handle, export_dir))
                .await
                .context("ui thread panicked")??;
        }

        Command::Extract {
            files,
            format,
            output,
        } => {
            logging::init_stderr(cli.verbose);
            let cfg = config::load_config()?;
            let session = build_session(&cfg, AuthStore::open_default()?);
            let format = format.unwrap_or(cfg.output.format);
            extract_cmd::run(session, files, format, output.as_deref()).await?;
        }

        Command::Auth { command } => {
            logging::init_stderr(cli.verbose);
            auth::run(command).await?;
        }

        Command::Config { command } => {
            logging::init_stderr(cli.verbose);
            config::run(command)?;
        }
    }

    Ok(())
}
