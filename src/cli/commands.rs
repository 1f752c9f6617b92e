//! CLI commands and argument parsing

use crate::config::Service;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SELFNET northbound-interface gateway
#[derive(Parser, Debug)]
#[command(name = "selfnet-nbi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Gateway configuration file (YAML); defaults apply without one
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format of status messages
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Service to mount
        #[arg(short, long, value_enum, default_value = "all")]
        service: ServiceSelection,

        /// Address to bind, overriding `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate the configuration and attach configured databases
    Check,

    /// List services and their base paths
    Services,
}

/// Which services `serve` mounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceSelection {
    Identity,
    Monitoring,
    Autonomous,
    Orchestration,
    Catalogue,
    /// Every service not excluded by `server.exclude`
    All,
}

impl ServiceSelection {
    /// Services to mount; `All` honours the configured exclusions
    pub fn services(self, exclude: &[Service]) -> Vec<Service> {
        match self {
            ServiceSelection::Identity => vec![Service::Identity],
            ServiceSelection::Monitoring => vec![Service::Monitoring],
            ServiceSelection::Autonomous => vec![Service::Autonomous],
            ServiceSelection::Orchestration => vec![Service::Orchestration],
            ServiceSelection::Catalogue => vec![Service::Catalogue],
            ServiceSelection::All => Service::ALL
                .into_iter()
                .filter(|s| !exclude.contains(s))
                .collect(),
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
