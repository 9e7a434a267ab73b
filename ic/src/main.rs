//! ic - interval sampling channel demo
//!
//! CLI entry point for running the bursty-producer demo and inspecting config.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use intervalchannel::cli::{Cli, Command, OutputFormat, RunOverrides};
use intervalchannel::config::Config;
use intervalchannel::demo;

fn parse_level(level: &str) -> tracing::Level {
    match level.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", level);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run {
            interval_ms,
            producers,
            send_every_ms,
            run_ms,
            format,
        } => {
            let overrides = RunOverrides {
                interval_ms,
                producers,
                send_every_ms,
                run_ms,
            };
            cmd_run(overrides.apply(config), format).await
        }
        Command::Config => cmd_config(&config),
    }
}

async fn cmd_run(config: Config, format: OutputFormat) -> Result<()> {
    info!(%format, "ic run starting");
    let report = demo::run(&config).await?;

    if format == OutputFormat::Yaml {
        let yaml = serde_yaml::to_string(&report).context("Failed to serialize report")?;
        print!("{}", yaml);
        return Ok(());
    }

    for d in &report.deliveries {
        println!(
            "{} {} {}",
            format!("tick #{}", d.tick).cyan(),
            format!("value {}", d.value).bold(),
            format!("(+{}ms)", d.elapsed.as_millis()).dimmed()
        );
    }

    println!();
    println!("{} Sampled every {}ms", "✓".green(), config.interval_ms);
    println!("  Sent: {}", report.channel.sent);
    println!("  Delivered: {}", report.channel.delivered);
    println!("  Superseded: {}", report.superseded());
    println!("  Queue actions executed: {}", report.queue.executed);
    if report.queue.panicked > 0 {
        println!("  {} {}", "Consumer panics:".red(), report.queue.panicked);
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}
