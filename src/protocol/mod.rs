//! Serial protocol implementation for CH340 USB relay boards.
//!
//! This module contains the low-level command constants, frame builders,
//! and checksum logic for the write-only relay protocol.

pub mod commands;

pub use commands::*;
