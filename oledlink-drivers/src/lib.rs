//! Transport implementations
//!
//! This crate provides the two ways of moving SSD1306 command and data bytes
//! to a panel, both implementing [`oledlink_hal::Transport`]:
//!
//! - [`transport::I2cTransport`]: prefixes the control byte and writes to any
//!   [`oledlink_hal::I2cBus`], typically a [`bridge::UsbBridge`]
//! - [`transport::UartTransport`]: wraps bytes in the framed UART bridge
//!   protocol
//!
//! The drivers are generic over the HAL seams, so all protocol logic runs
//! against in-memory mocks in tests.

#![deny(unsafe_code)]

pub mod bridge;
pub mod transport;

pub use bridge::{BridgeConfig, BridgeError, UsbBridge};
pub use transport::{connect, I2cTransport, SerialError, UartTransport};
