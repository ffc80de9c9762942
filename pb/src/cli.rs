//! CLI argument parsing for pb

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pb")]
#[command(author, version, about = "Context-aware progress bars", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a simulated workload through a progress bar
    Run {
        /// Number of iterations
        #[arg(short, long, default_value = "100")]
        total: u64,

        /// Milliseconds of simulated work per iteration
        #[arg(short, long, default_value = "20")]
        delay_ms: u64,

        /// Hide the total so the bar shows only a count
        #[arg(long)]
        unknown_total: bool,

        /// Fail the loop body at this iteration
        #[arg(long)]
        fail_at: Option<u64>,

        /// Leave the loop early at this iteration
        #[arg(long)]
        break_at: Option<u64>,

        /// Force append-only output
        #[arg(long, conflicts_with = "interactive")]
        script: bool,

        /// Force in-place terminal output
        #[arg(long)]
        interactive: bool,

        /// Seconds between frames, overriding the mode default
        #[arg(long)]
        debounce: Option<f64>,

        /// Text shown before the bar
        #[arg(long)]
        desc: Option<String>,
    },

    /// Print a duration in the bar's time format
    FormatTime {
        /// Seconds, fractional allowed
        #[arg(required = true)]
        seconds: f64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Run { .. } => "run",
            Command::FormatTime { .. } => "format-time",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["pb", "run"]).expect("run should parse");
        match cli.command {
            Command::Run {
                total,
                delay_ms,
                unknown_total,
                fail_at,
                script,
                ..
            } => {
                assert_eq!(total, 100);
                assert_eq!(delay_ms, 20);
                assert!(!unknown_total);
                assert!(fail_at.is_none());
                assert!(!script);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pb", "format-time", "75", "--log-level", "debug"]).expect("should parse");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.command.name(), "format-time");
    }

    #[test]
    fn test_script_conflicts_with_interactive() {
        let result = Cli::try_parse_from(["pb", "run", "--script", "--interactive"]);
        assert!(result.is_err());
    }
}
