//! Host side tooling for the stretcher clock line observer.
//!
//! Reads device telemetry from a serial port and turns it into events, and
//! runs the device core against a simulated bus.

pub mod bus;
pub mod cli;
pub mod codec;
pub mod config;
pub mod format;
pub mod serial;
pub mod simulation;

use tracing::level_filters::LevelFilter;

/// Install a global `tracing` subscriber writing to stderr, and forward
/// records of the `log` crate to it.
pub fn setup_logger(level: LevelFilter) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_log::LogTracer::init()?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_installs_once() {
        fn install() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            setup_logger(LevelFilter::WARN)?;
            Ok(())
        }

        assert!(install().is_ok());
        assert!(install().is_err());
    }
}
