//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{Result, VescError};
use crate::vesc::protocol::{FirmwareInfo, VESC_RX_BUFFER_SIZE, VESC_TX_TIMEOUT_MS};

/// Baud rates accepted for the host link
const ALLOWED_BAUD_RATES: [u32; 8] = [9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub firmware: FirmwareConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Transmit timeout per response frame
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Protocol engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolConfig {
    /// Receive window size in bytes; also caps the largest accepted frame
    #[serde(default = "default_rx_buffer_size")]
    pub rx_buffer_size: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Identity reported to the host
#[derive(Debug, Deserialize, Clone)]
pub struct FirmwareConfig {
    #[serde(default = "default_fw_major")]
    pub major: u8,

    #[serde(default = "default_fw_minor")]
    pub minor: u8,

    #[serde(default)]
    pub patch: u8,

    #[serde(default = "default_hw_name")]
    pub hw_name: String,

    #[serde(default)]
    pub paired: bool,
}

/// Initial motor telemetry for the host-side emulation
#[derive(Debug, Deserialize, Clone)]
pub struct MotorConfig {
    /// Battery voltage in millivolts
    #[serde(default = "default_battery_voltage")]
    pub battery_voltage: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { VESC_TX_TIMEOUT_MS }

fn default_rx_buffer_size() -> usize { VESC_RX_BUFFER_SIZE }
fn default_poll_interval_ms() -> u64 { 1 }

fn default_fw_major() -> u8 { 5 }
fn default_fw_minor() -> u8 { 2 }
fn default_hw_name() -> String { "EBiCS".to_string() }

fn default_battery_voltage() -> u32 { 36000 }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 1000 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            rx_buffer_size: default_rx_buffer_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            major: default_fw_major(),
            minor: default_fw_minor(),
            patch: 0,
            hw_name: default_hw_name(),
            paired: false,
        }
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            battery_voltage: default_battery_voltage(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
        }
    }
}

impl From<&FirmwareConfig> for FirmwareInfo {
    fn from(config: &FirmwareConfig) -> Self {
        Self {
            major: config.major,
            minor: config.minor,
            patch: config.patch,
            hw_name: config.hw_name.clone(),
            paired: config.paired,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vesc_uart_emu::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !ALLOWED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(&format!(
                "baud_rate must be one of: {:?}",
                ALLOWED_BAUD_RATES
            )));
        }

        if !(1..=10_000).contains(&self.serial.timeout_ms) {
            return Err(invalid("serial timeout_ms must be between 1 and 10000"));
        }

        if !(16..=65_536).contains(&self.protocol.rx_buffer_size) {
            return Err(invalid("rx_buffer_size must be between 16 and 65536"));
        }

        if !(1..=1_000).contains(&self.protocol.poll_interval_ms) {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        let hw_name = &self.firmware.hw_name;
        if hw_name.is_empty() || hw_name.len() > 16 || !hw_name.is_ascii() {
            return Err(invalid("hw_name must be 1 to 16 ASCII characters"));
        }

        let telemetry = &self.telemetry;
        if telemetry.enabled && telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if !(1..=60_000).contains(&telemetry.log_interval_ms) {
            return Err(invalid("telemetry log_interval_ms must be between 1 and 60000"));
        }

        if telemetry.max_records_per_file == 0 || telemetry.max_files_to_keep == 0 {
            return Err(invalid(
                "telemetry max_records_per_file and max_files_to_keep must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> VescError {
    VescError::Config(toml::de::Error::custom(msg))
}
