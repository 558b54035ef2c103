//! USB-I2C bridge command set
//!
//! The bridge (i2c-tiny-usb compatible) is driven with class control
//! transfers. The `request` field carries either a [`UsbCommand`] or, for
//! I2C traffic, an OR of [`I2cFlags`]; `index` carries the I2C address.

/// Vendor/product pairs of supported bridge adapters
pub const DEVICE_IDS: &[(u16, u16)] = &[
    (0x0403, 0xC631), // i2c-tiny-usb on FTDI-assigned PID
    (0x1C40, 0x0534), // i2c-tiny-usb on EZPrototypes PID
];

/// Class request, host to device
pub const REQUEST_TYPE_OUT: u8 = 0x20;
/// Class request, device to host
pub const REQUEST_TYPE_IN: u8 = 0x20 | 0x80;

/// `value` flag marking an I2C read message
pub const I2C_M_RD: u16 = 0x01;

/// Longest single register read the bridge supports
pub const MAX_READ_LEN: usize = 2;

/// Bridge commands (the control transfer `request` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UsbCommand {
    /// Round-trip the `value` field
    Echo = 0,
    /// Read the I2C functionality bitmask
    GetFunctions = 1,
    /// Set the I2C clock delay in microseconds
    SetDelay = 2,
    /// Status of the last I2C transaction
    GetStatus = 3,
    /// Reset the adapter
    Reset = 0xFE,
    /// Firmware debug hook
    Debug = 0xFF,
}

impl UsbCommand {
    /// Raw request byte
    pub const fn request(self) -> u8 {
        self as u8
    }
}

/// I2C transaction flags, OR-ed into the `request` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cFlags(u8);

impl I2cFlags {
    /// Issue a START before the transfer
    pub const BEGIN: Self = Self(1);
    /// Issue a STOP after the transfer
    pub const END: Self = Self(2);
    /// The transfer carries I2C payload
    pub const IO: Self = Self(4);

    /// Combine two flag sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Raw request byte
    pub const fn request(self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for I2cFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Result of the most recent I2C transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeStatus {
    /// No transaction since reset
    Idle,
    /// Target acknowledged
    Ack,
    /// Target did not acknowledge
    Nack,
    /// Value outside the documented set
    Unknown(u8),
}

impl BridgeStatus {
    /// Parse a status byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => BridgeStatus::Idle,
            1 => BridgeStatus::Ack,
            2 => BridgeStatus::Nack,
            other => BridgeStatus::Unknown(other),
        }
    }

    /// True for [`BridgeStatus::Ack`]
    pub fn is_ack(self) -> bool {
        self == BridgeStatus::Ack
    }
}
