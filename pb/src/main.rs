//! pb - progress bar demo and utilities
//!
//! CLI entry point for driving a simulated workload through a progress bar.

use std::io::IsTerminal;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use progress_bar_plus::cli::{Cli, Command};
use progress_bar_plus::config::Config;
use progress_bar_plus::{ProgressBar, format_time, install_exit_hook};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        None => tracing::Level::INFO,
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install subscriber: {e}"))?;

    debug!(?level, "setup_logging: initialized");
    Ok(())
}

struct RunOptions {
    total: u64,
    delay: Duration,
    unknown_total: bool,
    fail_at: Option<u64>,
    break_at: Option<u64>,
    script: bool,
    interactive: bool,
    debounce: Option<Duration>,
    desc: Option<String>,
}

fn cmd_run(config: Config, opts: RunOptions) -> Result<()> {
    debug!(total = opts.total, delay = ?opts.delay, "cmd_run: called");
    let mut builder = ProgressBar::builder()
        .config(config)
        .force_script_mode(opts.script)
        .force_interactive_mode(opts.interactive);
    if !opts.unknown_total {
        builder = builder.total(opts.total);
    }
    if let Some(debounce) = opts.debounce {
        builder = builder.debounce(debounce);
    }
    if let Some(desc) = opts.desc {
        builder = builder.description(desc);
    }
    let bar = builder.build();
    info!(mode = %bar.mode(), "cmd_run: starting workload");

    // A filter hides the exact length so the bar sees no total
    let items: Box<dyn Iterator<Item = u64> + Send> = if opts.unknown_total {
        Box::new((0..opts.total).filter(|_| true))
    } else {
        Box::new(0..opts.total)
    };

    let mut iter = bar.wrap(items);
    while let Some(i) = iter.next() {
        if opts.break_at == Some(i) {
            debug!(i, "cmd_run: breaking early");
            break;
        }
        if opts.fail_at == Some(i) {
            let err = eyre!("simulated failure at iteration {i}");
            iter.bar().fail(format!("{err:#}"));
            return Err(err);
        }
        std::thread::sleep(opts.delay);
    }
    Ok(())
}

fn cmd_format_time(seconds: f64) -> Result<()> {
    debug!(seconds, "cmd_format_time: called");
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(eyre!("seconds must be a non-negative number, got {seconds}"));
    }
    println!("{}", format_time(seconds));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    let _exit = install_exit_hook();

    debug!(command = cli.command.name(), "main: dispatching command");
    match cli.command {
        Command::Run {
            total,
            delay_ms,
            unknown_total,
            fail_at,
            break_at,
            script,
            interactive,
            debounce,
            desc,
        } => {
            let debounce = debounce
                .map(|secs| Duration::try_from_secs_f64(secs).map_err(|e| eyre!("invalid --debounce {secs}: {e}")))
                .transpose()?;
            let opts = RunOptions {
                total,
                delay: Duration::from_millis(delay_ms),
                unknown_total,
                fail_at,
                break_at,
                script,
                interactive,
                debounce,
                desc,
            };
            // Iteration sleeps, so it runs off the async workers; deferred
            // renders still land on the runtime
            tokio::task::spawn_blocking(move || cmd_run(config, opts))
                .await
                .context("Workload task panicked")?
        }
        Command::FormatTime { seconds } => cmd_format_time(seconds),
    }
}
