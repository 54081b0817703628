use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use stretcher::decoder::Event;
use tracing::{info, warn};

use crate::{
    codec::decode_stream,
    config::{Config, LogLevel},
    format::{format_event, format_event_json, format_report},
    serial, setup_logger,
    simulation::{simulate, SimulationParams},
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Configuration file to use
    #[clap(long = "config", short = 'c')]
    config: Option<PathBuf>,

    /// Set desired logging level, overriding the configuration file
    #[clap(short, long, value_enum)]
    loglevel: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Decode telemetry from a serial device and print the events
    Decode {
        /// Serial device to read, `-` for stdin. Defaults to the configured
        /// port
        port: Option<PathBuf>,

        /// Baud rate of the serial device, overriding the configuration file
        #[clap(short, long)]
        baud_rate: Option<u32>,

        /// Print events as JSON lines
        #[clap(long)]
        json: bool,
    },
    /// Run the device core against a simulated bus
    Simulate {
        /// Bus cycles to run before aborting
        #[clap(long, default_value_t = SimulationParams::default().cycles)]
        cycles: usize,

        /// Low half-period of the simulated bus, in ticks
        #[clap(long, default_value_t = SimulationParams::default().low)]
        low: u32,

        /// High half-period of the simulated bus, in ticks
        #[clap(long, default_value_t = SimulationParams::default().high)]
        high: u32,

        /// Print the report as JSON
        #[clap(long)]
        json: bool,
    },
}

pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    setup_logger(args.loglevel.unwrap_or(config.loglevel).into())?;

    if !config.check() {
        warn!("Continuing with a questionable configuration");
    }

    match args.command {
        Command::Decode {
            port,
            baud_rate,
            json,
        } => {
            let port = port.unwrap_or_else(|| config.port.clone());
            let baud_rate = baud_rate.unwrap_or(config.baud_rate);
            decode(&port, baud_rate, json, config.tick_rate_hz).await?;
        }
        Command::Simulate {
            cycles,
            low,
            high,
            json,
        } => {
            let params = SimulationParams {
                low,
                high,
                cycles,
                ..Default::default()
            };
            let report = simulate(config.device_config(), &params);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let mut buf = String::new();
                format_report(&mut buf, &report, config.tick_rate_hz)?;
                print!("{buf}");
            }
        }
    }

    Ok(())
}

/// Output line for an event, or `None` when it cannot be formatted
fn event_line(event: &Event, json: bool, tick_rate_hz: u32) -> Option<String> {
    if json {
        format_event_json(event, tick_rate_hz)
            .map_err(|e| warn!("Could not serialize {event:?}: {e}"))
            .ok()
    } else {
        let mut buf = String::new();
        format_event(&mut buf, event, tick_rate_hz)
            .map_err(|e| warn!("Could not format {event:?}: {e}"))
            .ok()?;
        Some(buf)
    }
}

async fn decode(
    port: &Path,
    baud_rate: u32,
    json: bool,
    tick_rate_hz: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut print_event = |event: Event| {
        if let Some(line) = event_line(&event, json, tick_rate_hz) {
            println!("{line}");
        }
    };

    if port == Path::new("-") {
        info!("Reading telemetry from stdin");
        decode_stream(tokio::io::stdin(), &mut print_event).await?;
    } else {
        info!("Reading telemetry from {}", port.display());
        let device = serial::open(port, baud_rate)?;
        decode_stream(device, &mut print_event).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINARY: &str = "/usr/bin/stretcher";

    #[test]
    fn decode_defaults_to_configured_port() {
        let options = Args::try_parse_from([BINARY, "decode"]).unwrap();
        assert_eq!(options.config, None);
        assert_eq!(
            options.command,
            Command::Decode {
                port: None,
                baud_rate: None,
                json: false
            }
        );
    }

    #[test]
    fn decode_options() {
        let options = Args::try_parse_from([
            BINARY,
            "-c",
            "/etc/stretcher/stretcher.toml",
            "--loglevel",
            "debug",
            "decode",
            "--json",
            "--baud-rate",
            "115200",
            "-",
        ])
        .unwrap();
        assert_eq!(
            options.config.as_deref(),
            Some(Path::new("/etc/stretcher/stretcher.toml"))
        );
        assert_eq!(options.loglevel, Some(LogLevel::Debug));
        assert_eq!(
            options.command,
            Command::Decode {
                port: Some(PathBuf::from("-")),
                baud_rate: Some(115200),
                json: true
            }
        );
    }

    #[test]
    fn simulate_options() {
        let options =
            Args::try_parse_from([BINARY, "simulate", "--low", "30", "--cycles", "3"]).unwrap();
        assert_eq!(
            options.command,
            Command::Simulate {
                cycles: 3,
                low: 30,
                high: SimulationParams::default().high,
                json: false
            }
        );
    }

    #[test]
    fn event_lines() {
        let event = Event::FinishTraining {
            measurements: [15, 15, 15],
        };
        assert_eq!(
            event_line(&event, false, 12_000_000).as_deref(),
            Some("* finish link training: bus speed 400000 Hz (low 15, high 15, low 15 ticks)")
        );

        let line = event_line(&Event::StartStretching, true, 12_000_000).unwrap();
        assert_eq!(line, r#"{"event":"start-stretching"}"#);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from([BINARY]).is_err());
    }
}
