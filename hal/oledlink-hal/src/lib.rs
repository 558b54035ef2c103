//! oledlink Hardware Abstraction Layer
//!
//! This crate defines the seams between the panel driver and the hardware
//! that carries its bytes. Concrete implementations live in
//! `oledlink-hal-host` (libusb, OS serial ports) or in test mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Panel controller (oledlink-display)    │
//! └─────────────────────────────────────────┘
//!                     │ Transport
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Transports (oledlink-drivers)          │
//! └─────────────────────────────────────────┘
//!          │ I2cBus / ControlTransfer   │ UartTx / SerialPorts
//!          ▼                            ▼
//! ┌───────────────────────────────────────────┐
//! │  oledlink-hal-host (rusb, serialport)     │
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Command/data byte sink for the panel
//! - [`i2c::I2cBus`] - I2C bus master operations
//! - [`usb::ControlTransfer`] - USB vendor/class control transfers
//! - [`uart::UartTx`], [`uart::SerialPorts`] - Serial ports

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod i2c;
pub mod transport;
pub mod uart;
pub mod usb;

// Re-export key traits at crate root for convenience
pub use i2c::I2cBus;
pub use transport::Transport;
pub use uart::{SerialPorts, UartConfig, UartTx};
pub use usb::ControlTransfer;
