//! Desktop HAL for oledlink
//!
//! This crate provides host implementations of the shared `oledlink-hal`
//! traits:
//!
//! - USB device discovery against an allow-list, and control transfers
//!   through libusb (implements `oledlink_hal::ControlTransfer`)
//! - OS serial port enumeration and blocking writes (implements
//!   `oledlink_hal::SerialPorts` / `oledlink_hal::UartTx`)

#![deny(unsafe_code)]

pub mod serial;
pub mod usb;

pub use serial::{HostSerialPort, HostSerialPorts, UNBOUNDED_TIMEOUT};
pub use usb::{HostError, UsbDeviceLease, DEFAULT_TIMEOUT};
