//! # VESC UART Emulator Library
//!
//! Make a custom motor controller look like a VESC to displays, phone apps
//! and loggers on its serial port.
//!
//! This library provides the VESC wire format (CRC16, framing), a stream
//! framer that resynchronizes over noisy serial input, the command dispatcher
//! for firmware version, live values, set current and keep-alive, and the
//! protocol engine that ties them to a serial transport.

pub mod config;
pub mod emulator;
pub mod error;
pub mod motor;
pub mod serial;
pub mod telemetry;
pub mod vesc;
