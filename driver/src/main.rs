mod config;
mod job;
mod machine;
mod my_clock;
mod transport;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cnc_motion::{Machine, Transport};
use embedded_hal::delay::DelayNs;
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, DriverConfig};
use crate::job::run_job;
use crate::machine::LoggedSpindle;
use crate::my_clock::{SimulatedClock, StdDelay};
use crate::transport::{EchoTransport, LineTransport};

/// Streams G-code lines to the stepper driver boards.
#[derive(Parser, Debug)]
#[command(name = "cnc_driver")]
#[command(version)]
#[command(about = "Plans and streams G/M-code motion to stepper driver boards")]
struct Args {
    /// G-code file to run. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// TOML config with [machine] and [transport] sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device, overrides the config file.
    #[arg(short, long)]
    port: Option<String>,

    #[arg(short, long)]
    baud: Option<u32>,

    /// Print actuator messages instead of sending them, without sleeping.
    #[arg(long)]
    dry_run: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn setup_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn open_input(path: Option<&PathBuf>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    })
}

fn run<T: Transport, D: DelayNs>(config: DriverConfig, input: Box<dyn BufRead>, transport: T, delay: D) -> ExitCode {
    let mut machine = match Machine::new(config.machine, transport, delay, LoggedSpindle::default()) {
        Ok(machine) => machine,
        Err(err) => {
            tracing::error!("invalid machine config: {}", err);
            return ExitCode::FAILURE;
        },
    };
    match run_job(input, &mut machine) {
        Ok(summary) => {
            tracing::info!(
                "job done: {} executed, {} skipped, steps {:?}, {:.3}s moving, final position {:?}",
                summary.executed,
                summary.skipped,
                summary.steps,
                summary.move_time_us as f64 / 1_000_000.0,
                machine.position(),
            );
            if let Some(fault) = machine.fault() {
                tracing::warn!("job ended with a latched limit fault on {} axis", fault.axis);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!("job aborted: {}", err);
            ExitCode::FAILURE
        },
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(&args);

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{}", err);
            return ExitCode::FAILURE;
        },
    };
    if let Some(port) = &args.port {
        config.transport.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.transport.baud = baud;
    }

    let input = match open_input(args.input.as_ref()) {
        Ok(input) => input,
        Err(err) => {
            tracing::error!("cannot open input: {}", err);
            return ExitCode::FAILURE;
        },
    };

    if args.dry_run {
        tracing::info!("dry run, actuator messages go to stdout");
        return run(config, input, EchoTransport::new(io::stdout().lock()), SimulatedClock::default());
    }
    match LineTransport::open(&config.transport) {
        Ok(transport) => run(config, input, transport, StdDelay),
        Err(err) => {
            tracing::error!("cannot open {}: {}", config.transport.port, err);
            ExitCode::FAILURE
        },
    }
}
