//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// IntervalChannel - last-value-wins sampling demo
#[derive(Parser, Debug)]
#[command(name = "ic")]
#[command(author, version, about = "Sample a bursty producer through a last-value interval channel", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run concurrent producers through a sampling channel and print deliveries
    Run {
        /// Sampling interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Number of concurrent producers
        #[arg(short, long)]
        producers: Option<usize>,

        /// Delay between sends of one producer in milliseconds
        #[arg(short, long)]
        send_every_ms: Option<u64>,

        /// How long to run in milliseconds
        #[arg(short, long)]
        run_ms: Option<u64>,

        /// Output format (text, yaml)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Output format for `run`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown format: {}. Use: text or yaml", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Overrides given on the `run` subcommand
#[derive(Debug, Default, Clone, Copy)]
pub struct RunOverrides {
    pub interval_ms: Option<u64>,
    pub producers: Option<usize>,
    pub send_every_ms: Option<u64>,
    pub run_ms: Option<u64>,
}

impl RunOverrides {
    /// Layer the overrides on top of a loaded config
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(v) = self.interval_ms {
            config.interval_ms = v;
        }
        if let Some(v) = self.producers {
            config.producers = v;
        }
        if let Some(v) = self.send_every_ms {
            config.send_every_ms = v;
        }
        if let Some(v) = self.run_ms {
            config.run_ms = v;
        }
        config
    }
}
