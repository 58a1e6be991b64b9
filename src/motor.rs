//! # Motor State
//!
//! Telemetry and setpoint shared with the motor-control side.
//!
//! The motor controller owns the state and updates telemetry on its own
//! schedule; the protocol engine only borrows it for one processing pass.
//! Every field is read and written individually, so a reader never sees a
//! torn value but may see fields from different control cycles.

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU8, Ordering};

/// Access the protocol engine needs to the motor-control state
#[cfg_attr(test, mockall::automock)]
pub trait MotorState {
    /// Debug currents `[input, motor]` in milliamps
    fn debug_currents(&self) -> [i32; 2];

    /// Motor speed in controller units (reported ×10 as RPM)
    fn speed(&self) -> i32;

    /// Battery voltage in millivolts
    fn battery_voltage(&self) -> u32;

    /// Active fault code, 0 when healthy
    fn error_state(&self) -> u8;

    /// Store the commanded current target in milliamps
    fn set_current_setpoint(&self, milliamps: i32);
}

/// Lock-free motor state, one atomic per field
///
/// Share it between the motor-control task and the protocol engine with an
/// `Arc`.
///
/// # Examples
///
/// ```
/// use vesc_uart_emu::motor::{MotorState, SharedMotorState};
///
/// let state = SharedMotorState::new();
/// state.set_battery_voltage(36_000);
/// state.set_current_setpoint(2_500);
///
/// assert_eq!(state.battery_voltage(), 36_000);
/// assert_eq!(state.current_setpoint(), 2_500);
/// ```
#[derive(Debug, Default)]
pub struct SharedMotorState {
    debug: [AtomicI32; 2],
    speed: AtomicI32,
    battery_voltage: AtomicU32,
    error_state: AtomicU8,
    current_setpoint: AtomicI32,
}

impl SharedMotorState {
    /// Create a state with all fields zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Update one debug current slot (0 = input, 1 = motor)
    pub fn set_debug_current(&self, index: usize, value: i32) {
        if let Some(slot) = self.debug.get(index) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    /// Update the motor speed
    pub fn set_speed(&self, speed: i32) {
        self.speed.store(speed, Ordering::Relaxed);
    }

    /// Update the battery voltage in millivolts
    pub fn set_battery_voltage(&self, millivolts: u32) {
        self.battery_voltage.store(millivolts, Ordering::Relaxed);
    }

    /// Update the fault code
    pub fn set_error_state(&self, code: u8) {
        self.error_state.store(code, Ordering::Relaxed);
    }

    /// Last commanded current target in milliamps
    pub fn current_setpoint(&self) -> i32 {
        self.current_setpoint.load(Ordering::Relaxed)
    }
}

impl MotorState for SharedMotorState {
    fn debug_currents(&self) -> [i32; 2] {
        [
            self.debug[0].load(Ordering::Relaxed),
            self.debug[1].load(Ordering::Relaxed),
        ]
    }

    fn speed(&self) -> i32 {
        self.speed.load(Ordering::Relaxed)
    }

    fn battery_voltage(&self) -> u32 {
        self.battery_voltage.load(Ordering::Relaxed)
    }

    fn error_state(&self) -> u8 {
        self.error_state.load(Ordering::Relaxed)
    }

    fn set_current_setpoint(&self, milliamps: i32) {
        self.current_setpoint.store(milliamps, Ordering::Relaxed);
    }
}
