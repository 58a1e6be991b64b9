//! # VESC Emulator Engine
//!
//! One protocol engine instance: receive window, scan cursor, transmit
//! scratch buffer, command dispatcher and the transport used for responses.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use vesc_uart_emu::config::Config;
//! use vesc_uart_emu::emulator::VescEmulator;
//! use vesc_uart_emu::motor::SharedMotorState;
//! use vesc_uart_emu::serial::VescSerial;
//! use vesc_uart_emu::vesc::protocol::FirmwareInfo;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let (_reader, transport) = VescSerial::open(&config.serial)?.split();
//!
//! let mut emulator = VescEmulator::new(256, FirmwareInfo::default(), Duration::from_millis(100));
//! emulator.attach(transport);
//!
//! let motor = SharedMotorState::new();
//! emulator.receive(&[0x02, 0x01, 0x04, 0x40, 0x84, 0x03]);
//! emulator.process(&motor).await;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::CommandError;
use crate::motor::MotorState;
use crate::serial::port_trait::SerialPortIO;
use crate::telemetry::ProtocolStats;
use crate::vesc::commands::Dispatcher;
use crate::vesc::encoder::encode_frame_into;
use crate::vesc::framer::StreamFramer;
use crate::vesc::protocol::FirmwareInfo;
use crate::vesc::window::RxWindow;

/// Largest frame overhead: 3-byte header + CRC + end marker
const MAX_FRAME_OVERHEAD: usize = 6;

/// VESC protocol engine
#[derive(Debug)]
pub struct VescEmulator<P> {
    window: RxWindow,
    framer: StreamFramer,
    dispatcher: Dispatcher,
    /// Reused for every outbound frame
    tx_buffer: Vec<u8>,
    tx_timeout: Duration,
    port: Option<P>,
    stats: ProtocolStats,
}

impl<P: SerialPortIO> VescEmulator<P> {
    /// Create an engine with no transport attached
    ///
    /// # Arguments
    ///
    /// * `window_capacity` - Receive window size in bytes
    /// * `firmware` - Identity reported to `COMM_FW_VERSION`
    /// * `tx_timeout` - Upper bound on each response transmission
    pub fn new(window_capacity: usize, firmware: FirmwareInfo, tx_timeout: Duration) -> Self {
        Self {
            window: RxWindow::new(window_capacity),
            framer: StreamFramer::new(window_capacity),
            dispatcher: Dispatcher::new(firmware),
            tx_buffer: Vec::with_capacity(window_capacity + MAX_FRAME_OVERHEAD),
            tx_timeout,
            port: None,
            stats: ProtocolStats::default(),
        }
    }

    /// Attach the transport used for responses
    pub fn attach(&mut self, port: P) {
        self.port = Some(port);
    }

    /// Whether a transport is attached
    pub fn is_attached(&self) -> bool {
        self.port.is_some()
    }

    /// Firmware identity reported to the host
    pub fn firmware(&self) -> &FirmwareInfo {
        self.dispatcher.firmware()
    }

    /// Counters accumulated since construction
    pub fn stats(&self) -> ProtocolStats {
        self.stats
    }

    /// Position of the next unread byte in the receive window
    pub fn cursor(&self) -> usize {
        self.framer.cursor()
    }

    /// Store bytes received from the host
    ///
    /// Never blocks. If the framer has not drained enough of the window, the
    /// oldest unread bytes are overwritten; this is counted as an overrun and
    /// the lost data is resynchronized past like any other noise.
    pub fn receive(&mut self, data: &[u8]) {
        let unread = self
            .window
            .distance(self.framer.cursor(), self.window.write_position());
        let free = self.window.capacity() - 1 - unread;

        if data.len() > free {
            warn!(
                "Receive window overrun: {} bytes arrived with {} free",
                data.len(),
                free
            );
            self.stats.rx_overruns += 1;
        }

        self.window.write(data);
    }

    /// Run one processing pass
    ///
    /// Dispatches every complete frame received before the pass started and
    /// transmits responses in order. Returns immediately when no transport is
    /// attached or no complete frame is available.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of frames dispatched
    pub async fn process<M: MotorState + ?Sized>(&mut self, motor: &M) -> usize {
        if self.port.is_none() {
            return 0;
        }

        let write_pos = self.window.write_position();
        let mut dispatched = 0;

        while let Some(payload) = self.framer.next_frame(&self.window, write_pos, &mut self.stats) {
            dispatched += 1;

            let response = match self.dispatcher.dispatch(payload, motor) {
                Ok(response) => response,
                Err(e) => {
                    debug!("Ignoring payload: {}", e);
                    match e {
                        CommandError::Unknown(_) => self.stats.unknown_commands += 1,
                        CommandError::Empty | CommandError::Truncated { .. } => {
                            self.stats.malformed_commands += 1
                        }
                    }
                    None
                }
            };

            if let Some(response) = response {
                self.send(&response).await;
            }
        }

        dispatched
    }

    /// Frame and transmit one response payload
    async fn send(&mut self, payload: &[u8]) {
        let Some(port) = self.port.as_mut() else {
            return;
        };

        encode_frame_into(payload, &mut self.tx_buffer);
        let frame = &self.tx_buffer;

        let result = tokio::time::timeout(self.tx_timeout, async {
            port.write_all(frame).await?;
            port.flush().await
        })
        .await;

        match result {
            Ok(Ok(())) => {
                debug!(
                    "Sent response for command {} ({} bytes)",
                    payload[0],
                    self.tx_buffer.len()
                );
                self.stats.responses_sent += 1;
            }
            Ok(Err(e)) => {
                warn!("Failed to send response: {}", e);
                self.stats.transmit_errors += 1;
            }
            Err(_) => {
                warn!("Response transmit timed out after {:?}", self.tx_timeout);
                self.stats.transmit_errors += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::{MockMotorState, SharedMotorState};
    use crate::serial::port_trait::mocks::MockSerialPort;
    use crate::vesc::decoder::decode_frame;
    use crate::vesc::encoder::{encode_frame, encode_fw_version_payload, encode_set_current_payload};
    use crate::vesc::protocol::VESC_VALUES_PAYLOAD_SIZE;
    use std::io;

    fn attached(capacity: usize) -> (VescEmulator<MockSerialPort>, MockSerialPort) {
        let port = MockSerialPort::new();
        let mut emulator =
            VescEmulator::new(capacity, FirmwareInfo::default(), Duration::from_millis(100));
        emulator.attach(port.clone());
        (emulator, port)
    }

    #[tokio::test]
    async fn test_unattached_process_is_noop() {
        let mut emulator: VescEmulator<MockSerialPort> =
            VescEmulator::new(256, FirmwareInfo::default(), Duration::from_millis(100));
        let mut motor = MockMotorState::new();
        motor.expect_set_current_setpoint().never();

        emulator.receive(&encode_frame(&encode_set_current_payload(1.0)));

        assert!(!emulator.is_attached());
        assert_eq!(emulator.process(&motor).await, 0);
        assert_eq!(emulator.cursor(), 0);
    }

    #[tokio::test]
    async fn test_window_sized_length_does_not_stall() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();

        emulator.receive(&[0x02, 0xFB]);
        let mut dispatched = 0;
        for _ in 0..40 {
            emulator.receive(&encode_frame(&[4]));
            dispatched += emulator.process(&motor).await;
        }

        assert_eq!(dispatched, 40);
        assert_eq!(port.get_written_data().len(), 40);
        assert_eq!(emulator.stats().oversize_lengths, 1);
        assert_eq!(emulator.stats().rx_overruns, 0);
    }

    #[test]
    fn test_reports_configured_firmware() {
        let firmware = FirmwareInfo {
            major: 6,
            minor: 5,
            patch: 1,
            hw_name: "CUSTOM".to_string(),
            paired: true,
        };
        let emulator: VescEmulator<MockSerialPort> =
            VescEmulator::new(256, firmware.clone(), Duration::from_millis(100));

        assert_eq!(emulator.firmware(), &firmware);
    }

    #[tokio::test]
    async fn test_fw_version_request_gets_framed_response() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();

        emulator.receive(&encode_frame(&[0]));
        assert_eq!(emulator.process(&motor).await, 1);

        let written = port.get_written_data();
        assert_eq!(written.len(), 1);
        assert_eq!(
            decode_frame(&written[0]),
            Ok(&encode_fw_version_payload(&FirmwareInfo::default())[..])
        );
        assert_eq!(emulator.stats().responses_sent, 1);
    }

    #[tokio::test]
    async fn test_get_values_response_fields() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();
        motor.set_debug_current(0, 1000);
        motor.set_debug_current(1, 2000);
        motor.set_speed(300);
        motor.set_battery_voltage(4800);
        motor.set_error_state(2);

        emulator.receive(&encode_frame(&[4]));
        emulator.process(&motor).await;

        let written = port.get_written_data();
        let payload = decode_frame(&written[0]).unwrap();
        assert_eq!(payload.len(), VESC_VALUES_PAYLOAD_SIZE);
        assert_eq!(payload[0], 4);
        assert_eq!(&payload[5..9], &200i32.to_be_bytes());
        assert_eq!(&payload[9..13], &100i32.to_be_bytes());
        assert_eq!(&payload[23..27], &3000i32.to_be_bytes());
        assert_eq!(&payload[27..29], &48i16.to_be_bytes());
        assert_eq!(payload[53], 2);
    }

    #[tokio::test]
    async fn test_set_current_updates_motor_without_response() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();

        emulator.receive(&encode_frame(&encode_set_current_payload(2.5)));
        assert_eq!(emulator.process(&motor).await, 1);

        assert_eq!(motor.current_setpoint(), 2500);
        assert!(port.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_short_set_current_is_ignored() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();
        motor.set_current_setpoint(1234);

        emulator.receive(&encode_frame(&[6, 0x00, 0x00]));
        emulator.process(&motor).await;

        assert_eq!(motor.current_setpoint(), 1234);
        assert!(port.get_written_data().is_empty());
        assert_eq!(emulator.stats().malformed_commands, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_alive_commands_are_silent() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();

        emulator.receive(&encode_frame(&[30]));
        emulator.receive(&encode_frame(&[0x55, 0x01]));
        assert_eq!(emulator.process(&motor).await, 2);

        assert!(port.get_written_data().is_empty());
        assert_eq!(emulator.stats().unknown_commands, 1);
        assert_eq!(emulator.stats().frames_received, 2);
    }

    #[tokio::test]
    async fn test_responses_in_request_order() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();

        emulator.receive(&encode_frame(&[4]));
        emulator.receive(&[0xFF, 0xAA]);
        emulator.receive(&encode_frame(&[0]));
        assert_eq!(emulator.process(&motor).await, 2);

        let written = port.get_written_data();
        assert_eq!(written.len(), 2);
        assert_eq!(decode_frame(&written[0]).unwrap()[0], 4);
        assert_eq!(decode_frame(&written[1]).unwrap()[0], 0);
    }

    #[tokio::test]
    async fn test_partial_frame_across_passes() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();
        let frame = encode_frame(&[0]);

        emulator.receive(&frame[..3]);
        assert_eq!(emulator.process(&motor).await, 0);
        assert_eq!(emulator.cursor(), 0);

        emulator.receive(&frame[3..]);
        assert_eq!(emulator.process(&motor).await, 1);
        assert_eq!(port.get_written_data().len(), 1);
    }

    #[tokio::test]
    async fn test_many_passes_wrap_the_window() {
        let (mut emulator, port) = attached(64);
        let motor = SharedMotorState::new();
        let frame = encode_frame(&[0]);

        for _ in 0..50 {
            emulator.receive(&frame);
            assert_eq!(emulator.process(&motor).await, 1);
        }

        assert_eq!(port.get_written_data().len(), 50);
        assert_eq!(emulator.stats().resync_bytes, 0);
        assert_eq!(emulator.stats().rx_overruns, 0);
    }

    #[tokio::test]
    async fn test_overrun_is_counted_not_fatal() {
        let (mut emulator, port) = attached(32);
        let motor = SharedMotorState::new();

        emulator.receive(&[0xAA; 40]);
        assert_eq!(emulator.stats().rx_overruns, 1);
        emulator.process(&motor).await;

        emulator.receive(&encode_frame(&[0]));
        assert_eq!(emulator.process(&motor).await, 1);
        assert_eq!(port.get_written_data().len(), 1);
    }

    #[tokio::test]
    async fn test_transmit_error_is_counted() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();
        port.set_write_error(io::ErrorKind::BrokenPipe);

        emulator.receive(&encode_frame(&[0]));
        assert_eq!(emulator.process(&motor).await, 1);

        assert_eq!(emulator.stats().transmit_errors, 1);
        assert_eq!(emulator.stats().responses_sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_timeout() {
        let (mut emulator, port) = attached(256);
        let motor = SharedMotorState::new();
        port.set_write_delay(Duration::from_secs(5));

        emulator.receive(&encode_frame(&[4]));
        emulator.receive(&encode_frame(&[0]));
        assert_eq!(emulator.process(&motor).await, 2);

        assert_eq!(emulator.stats().transmit_errors, 2);
        assert!(port.get_written_data().is_empty());
    }
}
