//! oledlink wire protocols
//!
//! Two ways of getting SSD1306 command and data bytes onto the panel's I2C
//! bus are defined here.
//!
//! # Framed UART bridge
//!
//! A microcontroller listens on a UART and relays each frame as one I2C
//! write transaction:
//! ```text
//! ┌─────────┬───────────┬─────────┬─────────────┐
//! │ ADDRESS │ SIZE (BE) │ CONTROL │ PAYLOAD     │
//! │ 1B      │ 2B        │ 1B      │ SIZE - 1 B  │
//! └─────────┴───────────┴─────────┴─────────────┘
//! ```
//! `SIZE` counts the control byte, because the bridge writes it to the bus
//! as the first byte of the transaction.
//!
//! # USB-I2C bridge
//!
//! An i2c-tiny-usb compatible adapter takes class control transfers whose
//! `request` field is either a bridge command ([`bridge::UsbCommand`]) or a
//! set of I2C transaction flags ([`bridge::I2cFlags`]).

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bridge;
pub mod frame;

pub use bridge::{BridgeStatus, I2cFlags, UsbCommand};
pub use frame::{
    Control, Frame, FrameError, FrameParser, ParsedFrame, HEADER_SIZE, MAX_PAYLOAD_SIZE,
    MAX_WIRE_PAYLOAD,
};
