//! USB-I2C bridge driver
//!
//! Speaks the i2c-tiny-usb control transfer protocol:
//! - bridge commands (echo, functionality, clock delay, status, reset)
//! - I2C register reads of up to two bytes, split into a write phase and a
//!   read phase, each confirmed by polling `GetStatus`
//! - I2C writes as a single OUT transfer with BEGIN|END|IO
//!
//! # Status polling
//!
//! Every write-type command is followed by a `GetStatus` poll, except the
//! I2C write used for panel traffic. Existing bridge firmware is driven that
//! way, so the check is opt-in through [`BridgeConfig::strict_writes`].

use log::{debug, trace, warn};
use oledlink_hal::{ControlTransfer, I2cBus};
use oledlink_protocol::bridge::{
    BridgeStatus, I2cFlags, UsbCommand, I2C_M_RD, MAX_READ_LEN, REQUEST_TYPE_IN,
    REQUEST_TYPE_OUT,
};
use thiserror::Error;

/// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError<E> {
    /// A status-checked operation was not acknowledged
    #[error("bridge reported {status:?} instead of ACK")]
    WriteFailed { status: BridgeStatus },
    /// Register reads are limited to 0, 1 or 2 bytes
    #[error("bridge reads are limited to 2 bytes, {0} requested")]
    InvalidLength(usize),
    /// Register reads take exactly one register byte
    #[error("bridge register reads take one register byte, got {0}")]
    RegisterWidth(usize),
    /// Device returned fewer bytes than requested
    #[error("short control transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer { expected: usize, actual: usize },
    /// Underlying USB transfer failed
    #[error("usb transfer failed: {0:?}")]
    Usb(E),
    /// The device handle was already released
    #[error("bridge device already released")]
    Released,
}

/// Bridge behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeConfig {
    /// Poll `GetStatus` after I2C writes too
    pub strict_writes: bool,
}

/// i2c-tiny-usb compatible bridge
///
/// Owns the opened device exclusively. The device is dropped on
/// [`UsbBridge::release`] or when the bridge itself is dropped.
pub struct UsbBridge<D> {
    device: Option<D>,
    config: BridgeConfig,
}

impl<D: ControlTransfer> UsbBridge<D> {
    /// Wrap an opened device with default settings
    pub fn new(device: D) -> Self {
        Self::with_config(device, BridgeConfig::default())
    }

    /// Wrap an opened device
    pub fn with_config(device: D, config: BridgeConfig) -> Self {
        Self {
            device: Some(device),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Check whether the device handle has been released
    pub fn is_released(&self) -> bool {
        self.device.is_none()
    }

    /// Drop the device handle
    pub fn release(&mut self) {
        if self.device.take().is_some() {
            debug!("usb bridge released");
        }
    }

    fn device(&mut self) -> Result<&mut D, BridgeError<D::Error>> {
        self.device.as_mut().ok_or(BridgeError::Released)
    }

    /// IN transfer of a bridge command, expecting `buf.len()` bytes
    fn read_command(
        &mut self,
        cmd: UsbCommand,
        value: i16,
        index: i16,
        buf: &mut [u8],
    ) -> Result<(), BridgeError<D::Error>> {
        let expected = buf.len();
        let actual = self
            .device()?
            .read_control(REQUEST_TYPE_IN, cmd.request(), value as u16, index as u16, buf)
            .map_err(BridgeError::Usb)?;
        if actual < expected {
            return Err(BridgeError::ShortTransfer { expected, actual });
        }
        Ok(())
    }

    /// OUT transfer of a bridge command followed by a status check
    fn write_command(
        &mut self,
        cmd: UsbCommand,
        value: i16,
        index: i16,
    ) -> Result<(), BridgeError<D::Error>> {
        self.device()?
            .write_control(REQUEST_TYPE_OUT, cmd.request(), value as u16, index as u16, &[])
            .map_err(BridgeError::Usb)?;
        self.expect_ack()
    }

    fn expect_ack(&mut self) -> Result<(), BridgeError<D::Error>> {
        let status = self.get_status()?;
        if !status.is_ack() {
            warn!("bridge status {:?} after write", status);
            return Err(BridgeError::WriteFailed { status });
        }
        Ok(())
    }

    /// Status of the most recent I2C transaction
    pub fn get_status(&mut self) -> Result<BridgeStatus, BridgeError<D::Error>> {
        let mut buf = [0u8; 1];
        self.read_command(UsbCommand::GetStatus, 0, 0, &mut buf)?;
        Ok(BridgeStatus::from_byte(buf[0]))
    }

    /// Round-trip `value` through the bridge (connectivity self-test)
    pub fn echo(&mut self, value: i16) -> Result<i16, BridgeError<D::Error>> {
        let mut buf = [0u8; 2];
        self.read_command(UsbCommand::Echo, value, 0, &mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    /// I2C functionality bitmask reported by the adapter
    pub fn get_functions(&mut self) -> Result<u32, BridgeError<D::Error>> {
        let mut buf = [0u8; 4];
        self.read_command(UsbCommand::GetFunctions, 0, 0, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Set the I2C clock delay in microseconds
    pub fn set_delay(&mut self, delay_us: i16) -> Result<(), BridgeError<D::Error>> {
        debug!("bridge clock delay {} us", delay_us);
        self.write_command(UsbCommand::SetDelay, delay_us, 0)
    }

    /// Reset the adapter; not status-checked
    pub fn reset(&mut self) -> Result<(), BridgeError<D::Error>> {
        self.device()?
            .write_control(REQUEST_TYPE_OUT, UsbCommand::Reset.request(), 0, 0, &[])
            .map_err(BridgeError::Usb)?;
        Ok(())
    }

    /// Read `length` (0..=2) bytes from `register` of the device at `address`
    ///
    /// A two-byte read is returned little-endian. A zero-length read only
    /// performs the register write and returns 0.
    pub fn read(
        &mut self,
        address: u8,
        register: u8,
        length: usize,
    ) -> Result<u16, BridgeError<D::Error>> {
        if length > MAX_READ_LEN {
            return Err(BridgeError::InvalidLength(length));
        }

        self.device()?
            .write_control(
                REQUEST_TYPE_OUT,
                (I2cFlags::IO | I2cFlags::BEGIN).request(),
                0,
                u16::from(address),
                &[register],
            )
            .map_err(BridgeError::Usb)?;
        self.expect_ack()?;

        if length == 0 {
            return Ok(0);
        }

        let mut buf = [0u8; MAX_READ_LEN];
        let actual = self
            .device()?
            .read_control(
                REQUEST_TYPE_IN,
                (I2cFlags::IO | I2cFlags::END).request(),
                I2C_M_RD,
                u16::from(address),
                &mut buf[..length],
            )
            .map_err(BridgeError::Usb)?;
        if actual < length {
            return Err(BridgeError::ShortTransfer {
                expected: length,
                actual,
            });
        }
        self.expect_ack()?;

        Ok(if length == 2 {
            u16::from_le_bytes(buf)
        } else {
            u16::from(buf[0])
        })
    }

    /// Write `data` to the device at `address` as one I2C transaction
    pub fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BridgeError<D::Error>> {
        trace!("i2c write 0x{:02x}: {} bytes", address, data.len());
        self.device()?
            .write_control(
                REQUEST_TYPE_OUT,
                (I2cFlags::IO | I2cFlags::BEGIN | I2cFlags::END).request(),
                0,
                u16::from(address),
                data,
            )
            .map_err(BridgeError::Usb)?;

        if self.config.strict_writes {
            self.expect_ack()?;
        }
        Ok(())
    }
}

impl<D: ControlTransfer> I2cBus for UsbBridge<D> {
    type Error = BridgeError<D::Error>;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        UsbBridge::write(self, address, data)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        let [register] = write_data else {
            return Err(BridgeError::RegisterWidth(write_data.len()));
        };
        let value = self.read(address, *register, read_buf.len())?.to_le_bytes();
        read_buf.copy_from_slice(&value[..read_buf.len()]);
        Ok(())
    }

    fn release(&mut self) {
        UsbBridge::release(self)
    }
}
