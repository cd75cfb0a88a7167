//! Command line interface of `convoy`, built on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (request, submit, config)
//! and global flags that override values from `convoy.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConvoyConfig;
use crate::error::ConvoyError;

/// Convoy: drives transport jobs through carrier and warehouse workflows.
#[derive(Debug, Parser)]
#[command(name = "convoy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (defaults to ./convoy.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the carrier/warehouse service.
    #[arg(long, global = true)]
    pub remote_url: Option<String>,

    /// Delay between polls of the same job, in milliseconds.
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Maximum number of jobs driven concurrently.
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Directory receiving confirmation files.
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request a single transport job and follow it to completion.
    Request {
        /// Client identifier; a random one is generated when omitted.
        #[arg(long)]
        client_id: Option<String>,

        #[arg(long)]
        product_id: String,

        #[arg(long)]
        quantity: u32,

        /// Origin site (A or B).
        #[arg(long)]
        origin: String,

        /// Destination site (A or B).
        #[arg(long)]
        destination: String,

        /// Collection time as an ISO-8601 timestamp.
        #[arg(long)]
        collection_time: String,
    },

    /// Submit every job in a JSON or TOML file and follow them to completion.
    Submit {
        /// Path to the job file.
        file: PathBuf,
    },

    /// Print the effective configuration.
    Config,
}

impl Cli {
    /// Apply command line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut ConvoyConfig) -> Result<(), ConvoyError> {
        if let Some(url) = &self.remote_url {
            config.remote_url = url.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(n) = self.max_concurrency {
            config.max_concurrency = n;
        }
        if let Some(dir) = &self.out_dir {
            config.confirmation_dir = dir.clone();
        }
        config.validate()
    }
}
