//! Panel transports
//!
//! Both transports implement [`oledlink_hal::Transport`]:
//!
//! - I2C: control byte + payload written as one bus transaction
//! - UART: control byte + payload wrapped in a bridge frame

pub mod i2c;
pub mod uart;

pub use i2c::I2cTransport;
pub use uart::{connect, SerialError, UartTransport, PRIMING_CYCLES};
