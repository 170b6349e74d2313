//! CLI module for Scribe
//!
//! Command-line parsing for the `scribe-server` binary. Uses clap for
//! argument parsing and owo-colors for terminal output.

pub mod output;

use crate::types::TaskRequest;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scribe - multi-agent research and content pipeline
#[derive(Parser, Debug)]
#[command(
    name = "scribe-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Scribe - research, write and analyse content with cooperating agents",
    long_about = "Runs a Research -> Writing -> Analysis pipeline per submitted topic.\n\n\
                  Without a subcommand the HTTP server is started. Every stage falls back to\n\
                  deterministic output when no language model is reachable.",
    after_help = "EXAMPLES:\n    \
                  scribe-server                                   # Start the server\n    \
                  scribe-server run --topic \"Rust async\"          # Run one task and print it\n    \
                  scribe-server config --validate                 # Check scribe.toml\n    \
                  scribe-server --config my.toml serve            # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "scribe.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Drive a single task through the pipeline and print the outcome
    Run {
        /// Topic to research and write about
        #[arg(short, long)]
        topic: String,

        #[arg(long, default_value = "article")]
        content_type: String,

        #[arg(long, default_value = "professional")]
        tone: String,

        #[arg(long, default_value = "medium")]
        length: String,

        /// Research depth
        #[arg(long, default_value = "comprehensive")]
        depth: String,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Commands {
    /// The task request described by a `run` invocation.
    pub fn task_request(&self) -> Option<TaskRequest> {
        match self {
            Commands::Run {
                topic,
                content_type,
                tone,
                length,
                depth,
            } => Some(
                TaskRequest::new(topic.clone())
                    .with_content_type(content_type.clone())
                    .with_tone(tone.clone())
                    .with_length(length.clone())
                    .with_depth(depth.clone()),
            ),
            _ => None,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::try_parse_from(["scribe-server"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("scribe.toml"));
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_run_builds_request() {
        let cli = Cli::try_parse_from([
            "scribe-server",
            "--no-color",
            "run",
            "--topic",
            "Machine Learning Applications",
            "--tone",
            "casual",
        ])
        .unwrap();
        assert!(cli.no_color);

        let request = cli.command.unwrap().task_request().unwrap();
        assert_eq!(request.topic, "Machine Learning Applications");
        assert_eq!(request.tone, "casual");
        assert_eq!(request.content_type, "article");
        assert_eq!(request.depth, "comprehensive");
    }

    #[test]
    fn test_run_requires_topic() {
        assert!(Cli::try_parse_from(["scribe-server", "run"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["scribe-server", "config", "--validate", "-c", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                validate: true,
                full: false
            })
        ));
    }
}
