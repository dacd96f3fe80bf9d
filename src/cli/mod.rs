//! Command-line interface for the Daemon backend.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{BackendKind, Config};
use crate::server::{self, AppState};

/// daemon-backend - Backend API for Daemon workflows
#[derive(Parser, Debug)]
#[command(name = "daemon-backend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Backend implementations to wire up (overrides config)
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    /// Google Cloud backends
    Gcp,
    /// In-memory backends (state lost on shutdown)
    Memory,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Gcp => Self::Gcp,
            BackendArg::Memory => Self::Memory,
        }
    }
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve { bind, backend } => {
                let mut config = Config::load()?;
                if let Some(bind) = bind {
                    config.bind_addr = bind;
                }
                if let Some(backend) = backend {
                    config.backend = backend.into();
                }

                let state = AppState::from_config(&config)?;
                server::serve(&config, state).await
            }

            Commands::Config => {
                let config = Config::load()?;
                println!("{config:#?}");
                Ok(())
            }
        }
    }
}
