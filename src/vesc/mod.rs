//! # VESC Protocol Module
//!
//! Implementation of the subset of the VESC UART protocol a display or app
//! needs to talk to a motor controller.
//!
//! This module handles:
//! - Frame encoding (short and long length headers)
//! - CRC16 checksum calculation
//! - Frame synchronization over a circular receive window
//! - Command decoding and response payloads

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
pub mod window;
pub mod framer;
pub mod commands;
