//! # Command Dispatch
//!
//! Decodes verified payloads into commands and runs their handlers.
//!
//! | Command | ID | Effect |
//! |---------|----|--------|
//! | `COMM_FW_VERSION` | 0 | reply with firmware identity |
//! | `COMM_GET_VALUES` | 4 | reply with live telemetry |
//! | `COMM_SET_CURRENT` | 6 | write current setpoint, no reply |
//! | `COMM_ALIVE` | 30 | nothing |
//!
//! Anything else is dropped without a reply.

use super::encoder::{encode_fw_version_payload, encode_values_payload};
use super::protocol::*;
use crate::error::CommandError;
use crate::motor::MotorState;
use tracing::debug;

/// A decoded host command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Report firmware version
    FwVersion,
    /// Report live telemetry
    GetValues,
    /// Set target current
    SetCurrent {
        /// Target current in amperes
        amps: f32,
    },
    /// Keep-alive
    Alive,
}

impl Command {
    /// Decode a verified payload
    ///
    /// # Errors
    ///
    /// Returns error if the payload is empty, the ID is not handled, or a
    /// set-current body is shorter than 4 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use vesc_uart_emu::vesc::commands::Command;
    ///
    /// let cmd = Command::parse(&[6, 0x40, 0x20, 0x00, 0x00]).unwrap();
    /// assert_eq!(cmd, Command::SetCurrent { amps: 2.5 });
    /// ```
    pub fn parse(payload: &[u8]) -> Result<Self, CommandError> {
        let (&id, body) = payload.split_first().ok_or(CommandError::Empty)?;

        match CommPacketId::try_from(id)? {
            CommPacketId::FwVersion => Ok(Self::FwVersion),
            CommPacketId::GetValues => Ok(Self::GetValues),
            CommPacketId::SetCurrent => match body {
                // IEEE-754 single precision, big-endian on the wire
                [b0, b1, b2, b3, ..] => Ok(Self::SetCurrent {
                    amps: f32::from_be_bytes([*b0, *b1, *b2, *b3]),
                }),
                _ => Err(CommandError::Truncated {
                    id,
                    len: payload.len(),
                }),
            },
            CommPacketId::Alive => Ok(Self::Alive),
        }
    }

    /// Wire ID of this command
    pub fn id(&self) -> CommPacketId {
        match self {
            Self::FwVersion => CommPacketId::FwVersion,
            Self::GetValues => CommPacketId::GetValues,
            Self::SetCurrent { .. } => CommPacketId::SetCurrent,
            Self::Alive => CommPacketId::Alive,
        }
    }
}

/// Convert amperes to a milliampere setpoint
///
/// Out-of-range values saturate at the `i32` limits and NaN maps to 0.
pub fn amps_to_milliamps(amps: f32) -> i32 {
    (amps * 1000.0) as i32
}

/// Snapshot motor telemetry in VESC wire units
pub fn values_from_motor<M: MotorState + ?Sized>(motor: &M) -> Values {
    let [input_current, motor_current] = motor.debug_currents();

    Values {
        temp_fet: VESC_PLACEHOLDER_TEMP,
        temp_motor: VESC_PLACEHOLDER_TEMP,
        avg_motor_current: motor_current / 10,
        avg_input_current: input_current / 10,
        rpm: motor.speed().saturating_mul(10),
        input_voltage: (motor.battery_voltage() / 100) as i16,
        fault_code: motor.error_state(),
        controller_id: VESC_CONTROLLER_ID,
    }
}

/// Runs command handlers against a motor state
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    firmware: FirmwareInfo,
}

impl Dispatcher {
    /// Create a dispatcher reporting the given firmware identity
    pub fn new(firmware: FirmwareInfo) -> Self {
        Self { firmware }
    }

    /// Firmware identity reported by `COMM_FW_VERSION`
    pub fn firmware(&self) -> &FirmwareInfo {
        &self.firmware
    }

    /// Handle one verified payload
    ///
    /// # Arguments
    ///
    /// * `payload` - Command ID and body
    /// * `motor` - Motor state, read for telemetry and written by set-current
    ///
    /// # Returns
    ///
    /// * `Ok(Some(payload))` - Response payload to frame and transmit
    /// * `Ok(None)` - Command handled, nothing to send
    ///
    /// # Errors
    ///
    /// Returns the parse error for empty, unknown or truncated commands. No
    /// state is touched in that case.
    pub fn dispatch<M: MotorState + ?Sized>(
        &self,
        payload: &[u8],
        motor: &M,
    ) -> Result<Option<Vec<u8>>, CommandError> {
        let command = Command::parse(payload)?;
        debug!("Dispatching {:?} ({} byte payload)", command.id(), payload.len());

        let response = match command {
            Command::FwVersion => Some(encode_fw_version_payload(&self.firmware)),
            Command::GetValues => Some(encode_values_payload(&values_from_motor(motor))),
            Command::SetCurrent { amps } => {
                motor.set_current_setpoint(amps_to_milliamps(amps));
                None
            }
            Command::Alive => None,
        };

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::{MockMotorState, SharedMotorState};
    use crate::vesc::encoder::encode_set_current_payload;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(Command::parse(&[0]), Ok(Command::FwVersion));
        assert_eq!(Command::parse(&[4]), Ok(Command::GetValues));
        assert_eq!(Command::parse(&[30]), Ok(Command::Alive));
        assert_eq!(
            Command::parse(&[6, 0xBF, 0x80, 0x00, 0x00]),
            Ok(Command::SetCurrent { amps: -1.0 })
        );
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        assert_eq!(Command::parse(&[4, 0xFF, 0xFF]), Ok(Command::GetValues));
        assert_eq!(
            Command::parse(&[6, 0x40, 0x20, 0x00, 0x00, 0x99]),
            Ok(Command::SetCurrent { amps: 2.5 })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse(&[]), Err(CommandError::Empty));
        assert_eq!(Command::parse(&[5]), Err(CommandError::Unknown(5)));
        assert_eq!(
            Command::parse(&[6, 0x00, 0x00]),
            Err(CommandError::Truncated { id: 6, len: 3 })
        );
        assert_eq!(
            Command::parse(&[6, 0x40, 0x20, 0x00]),
            Err(CommandError::Truncated { id: 6, len: 4 })
        );
    }

    #[test]
    fn test_command_id() {
        assert_eq!(Command::FwVersion.id(), CommPacketId::FwVersion);
        assert_eq!(Command::SetCurrent { amps: 1.0 }.id(), CommPacketId::SetCurrent);
    }

    #[test]
    fn test_amps_to_milliamps() {
        assert_eq!(amps_to_milliamps(2.5), 2500);
        assert_eq!(amps_to_milliamps(-12.25), -12250);
        assert_eq!(amps_to_milliamps(0.0), 0);
        assert_eq!(amps_to_milliamps(f32::NAN), 0);
        assert_eq!(amps_to_milliamps(f32::INFINITY), i32::MAX);
    }

    #[test]
    fn test_set_current_writes_setpoint() {
        let motor = SharedMotorState::new();
        let dispatcher = Dispatcher::default();

        let response = dispatcher
            .dispatch(&encode_set_current_payload(2.5), &motor)
            .unwrap();

        assert!(response.is_none());
        assert_eq!(motor.current_setpoint(), 2500);
    }

    #[test]
    fn test_short_set_current_leaves_state_untouched() {
        let mut motor = MockMotorState::new();
        motor.expect_set_current_setpoint().never();

        let result = Dispatcher::default().dispatch(&[6, 0x00, 0x00], &motor);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_current_writes_exactly_once() {
        let mut motor = MockMotorState::new();
        motor
            .expect_set_current_setpoint()
            .withf(|&ma| ma == -4000)
            .times(1)
            .return_const(());

        let result = Dispatcher::default().dispatch(&encode_set_current_payload(-4.0), &motor);
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_fw_version_response() {
        let mut motor = MockMotorState::new();
        motor.expect_set_current_setpoint().never();

        let response = Dispatcher::default().dispatch(&[0], &motor).unwrap().unwrap();
        assert_eq!(response, encode_fw_version_payload(&FirmwareInfo::default()));
        assert_eq!(response[0], 0);
    }

    #[test]
    fn test_get_values_response() {
        let motor = SharedMotorState::new();
        motor.set_debug_current(0, 1000);
        motor.set_debug_current(1, 2000);
        motor.set_speed(300);
        motor.set_battery_voltage(4800);
        motor.set_error_state(2);

        let response = Dispatcher::default().dispatch(&[4], &motor).unwrap().unwrap();

        assert_eq!(response.len(), VESC_VALUES_PAYLOAD_SIZE);
        assert_eq!(response[0], u8::from(CommPacketId::GetValues));
        assert_eq!(&response[1..3], &250i16.to_be_bytes());
        assert_eq!(&response[3..5], &250i16.to_be_bytes());
        assert_eq!(&response[5..9], &200i32.to_be_bytes()); // motor current
        assert_eq!(&response[9..13], &100i32.to_be_bytes()); // input current
        assert_eq!(&response[23..27], &3000i32.to_be_bytes()); // rpm
        assert_eq!(&response[27..29], &48i16.to_be_bytes()); // voltage
        assert_eq!(response[53], 2); // fault
        assert_eq!(response[58], 1); // controller id
    }

    #[test]
    fn test_values_from_motor_with_mock() {
        let mut motor = MockMotorState::new();
        motor.expect_debug_currents().return_const([-255, 19]);
        motor.expect_speed().return_const(-7);
        motor.expect_battery_voltage().return_const(41_999u32);
        motor.expect_error_state().return_const(0u8);

        let values = values_from_motor(&motor);
        assert_eq!(values.avg_input_current, -25); // truncates toward zero
        assert_eq!(values.avg_motor_current, 1);
        assert_eq!(values.rpm, -70);
        assert_eq!(values.input_voltage, 419);
        assert_eq!(values.fault_code, 0);
    }

    #[test]
    fn test_alive_and_unknown_produce_nothing() {
        let mut motor = MockMotorState::new();
        motor.expect_set_current_setpoint().never();

        let dispatcher = Dispatcher::default();
        assert_eq!(dispatcher.dispatch(&[30], &motor), Ok(None));
        assert_eq!(
            dispatcher.dispatch(&[0x7F, 1, 2], &motor),
            Err(CommandError::Unknown(0x7F))
        );
    }
}
