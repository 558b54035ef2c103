//! libusb-backed USB access
//!
//! A [`UsbDeviceLease`] is the single owner of one opened bridge adapter.
//! The handle keeps its libusb context alive, so dropping the lease closes
//! the device and releases the context together.

use std::time::Duration;

use log::{debug, info};
use oledlink_hal::ControlTransfer;
use oledlink_protocol::bridge::DEVICE_IDS;
use rusb::{Context, DeviceHandle, UsbContext};
use thiserror::Error;

/// Control transfer timeout used unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Host USB errors
#[derive(Debug, Error)]
pub enum HostError {
    /// No attached device matches the allow-list
    #[error("no supported USB-I2C bridge is connected")]
    DeviceNotFound,
    /// libusb failure
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),
}

/// Exclusive lease on an opened USB device
pub struct UsbDeviceLease {
    handle: DeviceHandle<Context>,
    vendor_id: u16,
    product_id: u16,
    timeout: Duration,
}

impl UsbDeviceLease {
    /// Open the first attached i2c-tiny-usb compatible bridge
    pub fn open_bridge() -> Result<Self, HostError> {
        Self::open(DEVICE_IDS)
    }

    /// Open the first attached device whose (VID, PID) is in `allow_list`
    pub fn open(allow_list: &[(u16, u16)]) -> Result<Self, HostError> {
        let context = Context::new()?;

        for device in context.devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    debug!(
                        "skipping bus {} device {}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            let ids = (descriptor.vendor_id(), descriptor.product_id());
            if !allow_list.contains(&ids) {
                continue;
            }

            let handle = device.open()?;
            info!(
                "opened bridge {:04x}:{:04x} on bus {} device {}",
                ids.0,
                ids.1,
                device.bus_number(),
                device.address()
            );
            return Ok(Self {
                handle,
                vendor_id: ids.0,
                product_id: ids.1,
                timeout: DEFAULT_TIMEOUT,
            });
        }

        Err(HostError::DeviceNotFound)
    }

    /// Override the control transfer timeout (zero waits forever)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// (VID, PID) of the opened device
    pub fn ids(&self) -> (u16, u16) {
        (self.vendor_id, self.product_id)
    }
}

impl Drop for UsbDeviceLease {
    fn drop(&mut self) {
        debug!(
            "closing bridge {:04x}:{:04x}",
            self.vendor_id, self.product_id
        );
    }
}

impl ControlTransfer for UsbDeviceLease {
    type Error = rusb::Error;

    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        self.handle
            .read_control(request_type, request, value, index, buf, self.timeout)
    }

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, Self::Error> {
        self.handle
            .write_control(request_type, request, value, index, data, self.timeout)
    }
}
