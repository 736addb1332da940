//! litho-sim - Lithography Tool Telemetry Simulator
//!
//! Usage:
//!   litho-sim run --ticks 30 --interval-ms 500
//!   litho-sim run --set vibrationControl=10 --format json
//!   litho-sim generate --ticks 100 --seed 7
//!   litho-sim params
//!   litho-sim metrics

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use litho_sim::engine::parse_assignment;
use litho_sim::logging::init_logging;
use litho_sim::{
    ControlParameters, Dashboard, DashboardConfig, Metric, Parameter, SimulationDriver,
    TickOutcome,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "litho-sim")]
#[command(about = "Simulated lithography telemetry with threshold alerting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer-driven simulation and stream readings
    Run {
        #[command(flatten)]
        sim: SimArgs,

        /// Stop after this many ticks (default: run until Ctrl-C)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Generate readings back-to-back without waiting on the timer
    Generate {
        #[command(flatten)]
        sim: SimArgs,

        /// Number of readings to generate
        #[arg(short, long, default_value = "20")]
        ticks: u64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        format: OutputFormat,
    },

    /// List control parameters and their defaults
    Params,

    /// List charted metrics and their units
    Metrics,
}

#[derive(Args)]
struct SimArgs {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds (500, 1000 or 2000)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Parameter override, e.g. --set alignmentPrecision=40 (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    overrides: Vec<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { sim, ticks, format } => run(sim, ticks, format).await,
        Commands::Generate { sim, ticks, format } => generate(sim, ticks, format),
        Commands::Params => {
            list_params();
            Ok(())
        }
        Commands::Metrics => {
            list_metrics();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Config errors surface before logging is installed, so report on stderr
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Merge config file and CLI flags, then install logging
fn resolve_config(sim: &SimArgs) -> litho_sim::Result<DashboardConfig> {
    let mut config = match &sim.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(ms) = sim.interval_ms {
        config.tick_interval_ms = ms;
    }
    if sim.seed.is_some() {
        config.seed = sim.seed;
    }
    for assignment in &sim.overrides {
        let (parameter, value) = parse_assignment(assignment)?;
        config.parameters.set(parameter, value);
    }
    config.validate()?;

    init_logging(&config.log_level);
    Ok(config)
}

async fn run(sim: SimArgs, ticks: Option<u64>, format: OutputFormat) -> litho_sim::Result<()> {
    let config = resolve_config(&sim)?;
    let dashboard = Dashboard::from_config(&config, config.rng())?;

    eprintln!("╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║           LITHO-SIM Live Telemetry                           ║");
    eprintln!("╠══════════════════════════════════════════════════════════════╣");
    eprintln!("║ Interval: {:47}ms ║", config.tick_interval_ms);
    eprintln!(
        "║ Ticks: {:53} ║",
        ticks.map_or("until Ctrl-C".to_string(), |n| n.to_string())
    );
    eprintln!("╚══════════════════════════════════════════════════════════════╝");

    let (handle, task) = SimulationDriver::spawn(dashboard);
    let mut events = handle.subscribe();
    handle.start().await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen = 0u64;
    while !limit_reached(seen, ticks) {
        tokio::select! {
            event = events.recv() => match event {
                Ok(outcome) => {
                    print_outcome(&outcome, format);
                    seen += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Output fell behind, readings skipped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    let snapshot = handle.shutdown().await?;
    drop(handle);
    let _ = task.await;

    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║                     Simulation Stopped                       ║");
    eprintln!("╠══════════════════════════════════════════════════════════════╣");
    eprintln!("║ Ticks: {:53} ║", snapshot.stats.tick_count);
    eprintln!("║ Alerts raised: {:45} ║", snapshot.stats.alerts_raised);
    eprintln!("║ Readings in history: {:39} ║", snapshot.history.len());
    eprintln!("╚══════════════════════════════════════════════════════════════╝");
    Ok(())
}

/// `None` runs until interrupted; `Some(0)` prints nothing
fn limit_reached(seen: u64, ticks: Option<u64>) -> bool {
    ticks.is_some_and(|n| seen >= n)
}

fn generate(sim: SimArgs, ticks: u64, format: OutputFormat) -> litho_sim::Result<()> {
    let config = resolve_config(&sim)?;
    let interval = config.tick_interval()?;
    let mut dashboard = Dashboard::from_config(&config, config.rng())?;
    dashboard.start();

    // Timestamps advance in simulated time, one interval per reading
    let t0 = Utc::now();
    for i in 0..ticks {
        let offset = chrono::Duration::milliseconds((i * interval.as_millis()) as i64);
        if let Some(outcome) = dashboard.tick_at(t0 + offset) {
            print_outcome(&outcome, format);
        }
    }

    let stats = dashboard.stats();
    eprintln!(
        "\nGenerated {} readings, {} alerts ({} retained in log)",
        stats.tick_count,
        stats.alerts_raised,
        dashboard.alerts().len()
    );
    Ok(())
}

fn print_outcome(outcome: &TickOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(outcome) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "Failed to serialize reading"),
        },
        OutputFormat::Pretty => {
            let r = &outcome.reading;
            println!(
                "[{}] overlay {:.2} nm | focus {:.1} nm | {} wafers/h | temp {:.2} mK | vib {:.2} nm | vac {:.0e} mbar",
                r.time_label(),
                r.overlay_accuracy,
                r.focus_stability,
                r.throughput_rate,
                r.temperature_variation,
                r.vibration_level,
                r.vacuum_quality,
            );
            for alert in &outcome.alerts {
                println!("    {:7} {}", alert.severity.to_string(), alert.message);
            }
        }
    }
}

fn list_params() {
    let defaults = ControlParameters::default();
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Control Parameters (0-100)                   ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    for parameter in Parameter::ALL {
        println!(
            "║ {:20} {:22} default {:>8} ║",
            parameter.name(),
            parameter.label(),
            defaults.get(parameter)
        );
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("\nUsage: litho-sim run --set <NAME>=<VALUE>");
}

fn list_metrics() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Charted Metrics                         ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    for metric in Metric::ALL {
        println!(
            "║ {:22} {:24} {:>12} ║",
            metric.name(),
            metric.label(),
            metric.unit()
        );
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
}
