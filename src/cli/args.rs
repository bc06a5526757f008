//! CLI argument definitions using clap
//!
//! Commands:
//! - abform init --config <path>
//! - abform start --config <path>
//! - abform simulate --probability <p> --samples <n> [--seed <s>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// abform - A/B form experiment service
#[derive(Parser, Debug)]
#[command(name = "abform")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./abform.json")]
        config: PathBuf,
    },

    /// Start the experiment HTTP server
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./abform.json")]
        config: PathBuf,
    },

    /// Run the router offline and print the observed split
    Simulate {
        /// Probability of routing to site A
        #[arg(long)]
        probability: f64,

        /// Number of routing decisions to draw
        #[arg(long, default_value_t = 100_000)]
        samples: u64,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from(["abform", "simulate", "--probability", "0.3", "--seed", "7"])
            .unwrap();
        match cli.command {
            Command::Simulate {
                probability,
                samples,
                seed,
            } => {
                assert_eq!(probability, 0.3);
                assert_eq!(samples, 100_000);
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_start_default_config_path() {
        let cli = Cli::try_parse_from(["abform", "start"]).unwrap();
        match cli.command {
            Command::Start { config } => assert_eq!(config, PathBuf::from("./abform.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
