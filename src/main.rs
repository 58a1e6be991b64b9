//! # VESC UART Emulator
//!
//! Answers VESC protocol requests from a display or app on a serial port on
//! behalf of a custom motor controller.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::io::AsyncReadExt;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use vesc_uart_emu::config::Config;
use vesc_uart_emu::emulator::VescEmulator;
use vesc_uart_emu::motor::SharedMotorState;
use vesc_uart_emu::serial::VescSerial;
use vesc_uart_emu::telemetry::logger::{StatsLogger, StatsRecord};
use vesc_uart_emu::telemetry::ProtocolStats;
use vesc_uart_emu::vesc::protocol::FirmwareInfo;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Bytes pulled from the serial port per read
const READ_CHUNK_SIZE: usize = 64;

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up non-blocking logging
///    - Load configuration (first CLI argument or `config/default.toml`)
///    - Open the serial link and attach its transmit half to the emulator
///
/// 2. **Main Loop**
///    - Feed received bytes into the receive window
///    - Run a processing pass every `poll_interval_ms`
///    - Append a stats record every `log_interval_ms` when telemetry is enabled
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - No serial device can be opened
/// - The serial link reports EOF or a read error
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("VESC UART emulator v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    let motor = Arc::new(SharedMotorState::new());
    motor.set_battery_voltage(config.motor.battery_voltage);

    let serial = VescSerial::open(&config.serial)?;
    info!("Serial link opened at: {}", serial.device_path());
    let (mut reader, transport) = serial.split();

    let mut emulator = VescEmulator::new(
        config.protocol.rx_buffer_size,
        FirmwareInfo::from(&config.firmware),
        Duration::from_millis(config.serial.timeout_ms),
    );
    emulator.attach(transport);

    let firmware = emulator.firmware();
    info!(
        "Reporting firmware {}.{}.{} ({})",
        firmware.major, firmware.minor, firmware.patch, firmware.hw_name
    );

    let mut stats_logger = if config.telemetry.enabled {
        Some(StatsLogger::new(&config.telemetry)?)
    } else {
        None
    };

    let mut poll = interval(Duration::from_millis(config.protocol.poll_interval_ms));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats_tick = interval(Duration::from_millis(config.telemetry.log_interval_ms));
    stats_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut read_buf = [0u8; READ_CHUNK_SIZE];

    info!("Listening for VESC requests");
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            read = reader.read(&mut read_buf) => {
                match read {
                    Ok(0) => {
                        error!("Serial link closed");
                        log_summary(&emulator.stats());
                        bail!("serial link closed");
                    }
                    Ok(n) => emulator.receive(&read_buf[..n]),
                    Err(e) => {
                        error!("Serial read failed: {}", e);
                        log_summary(&emulator.stats());
                        return Err(e.into());
                    }
                }
            }

            _ = poll.tick() => {
                emulator.process(motor.as_ref()).await;
            }

            _ = stats_tick.tick(), if stats_logger.is_some() => {
                if let Some(logger) = stats_logger.as_mut() {
                    let record = StatsRecord::now(emulator.stats(), motor.current_setpoint());
                    if let Err(e) = logger.log(&record) {
                        warn!("Failed to write stats record: {}", e);
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                log_summary(&emulator.stats());
                break;
            }
        }
    }

    Ok(())
}

/// Load the configuration file, falling back to defaults when it is missing
fn load_config(path: &str) -> Result<Config> {
    if !std::path::Path::new(path).exists() {
        warn!("Config file {} not found, using defaults", path);
        return Ok(Config::default());
    }

    let config = Config::load(path)?;
    info!("Loaded configuration from {}", path);
    Ok(config)
}

fn log_summary(stats: &ProtocolStats) {
    info!(
        "Frames: {} received, {} responses sent, {} transmit errors",
        stats.frames_received, stats.responses_sent, stats.transmit_errors
    );
    info!(
        "Noise: {} resync bytes, {} CRC errors, {} end marker errors, {} oversize lengths, {} overruns",
        stats.resync_bytes,
        stats.crc_errors,
        stats.end_marker_errors,
        stats.oversize_lengths,
        stats.rx_overruns
    );
    info!(
        "Commands: {} unknown, {} malformed",
        stats.unknown_commands, stats.malformed_commands
    );
}
