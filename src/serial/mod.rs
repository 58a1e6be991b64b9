//! # Serial Communication Module
//!
//! Handles the serial link to the VESC host (display, app or logger).
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control)
//! - Splitting it into a read half that feeds the receive window and a
//!   transmit half used for responses
//! - Falling back to common USB-serial device paths

pub mod port_trait;

use crate::config::SerialConfig;
use crate::error::{Result, VescError};
use tokio::io::{ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use port_trait::TokioSerialPort;

/// VESC default UART baud rate
pub const VESC_BAUD_RATE: u32 = 115_200;

/// Fallback device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common for VESC displays)
    "/dev/ttyACM0", // USB CDC devices
];

/// Receiving half of the serial link
pub type SerialReader = ReadHalf<SerialStream>;

/// Transmitting half of the serial link
pub type SerialTransport = TokioSerialPort<WriteHalf<SerialStream>>;

/// VESC Serial Port Handler
///
/// Owns the opened port until it is split into reader and transport.
pub struct VescSerial {
    /// Serial port handle
    port: SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for VescSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VescSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl VescSerial {
    /// Open the configured port, falling back to the default device paths
    ///
    /// # Errors
    ///
    /// Returns error if none of the candidate devices can be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vesc_uart_emu::config::SerialConfig;
    /// use vesc_uart_emu::serial::VescSerial;
    ///
    /// # async fn run() -> anyhow::Result<()> {
    /// let serial = VescSerial::open(&SerialConfig::default())?;
    /// let (reader, transport) = serial.split();
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths: Vec<&str> = vec![config.port.as_str()];
        paths.extend(
            DEFAULT_DEVICE_PATHS
                .iter()
                .copied()
                .filter(|p| *p != config.port),
        );

        Self::open_with_paths(&paths, config.baud_rate)
    }

    /// Open the first device in `paths` that succeeds
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Returns
    ///
    /// * `Result<VescSerial>` - Connected serial port or error
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened VESC host link at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(VescError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port at 8N1
    fn open_port(path: &str, baud_rate: u32) -> Result<SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| VescError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Split into the receive half and a transport for responses
    pub fn split(self) -> (SerialReader, SerialTransport) {
        let (reader, writer) = tokio::io::split(self.port);
        (reader, TokioSerialPort::new(writer))
    }
}
