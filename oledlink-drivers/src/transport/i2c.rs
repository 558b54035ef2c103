//! I2C panel transport
//!
//! The SSD1306 I2C interface expects every write transaction to start with
//! a control byte: `0x00` for a run of commands, `0x40` for display RAM.

use log::trace;
use oledlink_hal::{I2cBus, Transport};
use oledlink_protocol::Control;

/// Panel transport over any I2C bus
pub struct I2cTransport<B> {
    bus: B,
    address: u8,
    released: bool,
}

impl<B: I2cBus> I2cTransport<B> {
    /// Create a transport for the panel at `address` on `bus`
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            released: false,
        }
    }

    /// I2C address of the panel
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Access the underlying bus (e.g. for bridge self-tests)
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the transport, returning the bus
    pub fn into_inner(self) -> B {
        self.bus
    }

    fn send(&mut self, control: Control, bytes: &[u8]) -> Result<(), B::Error> {
        let mut buffer = Vec::with_capacity(bytes.len() + 1);
        buffer.push(control.byte());
        buffer.extend_from_slice(bytes);
        trace!("{:?} -> 0x{:02x}: {} bytes", control, self.address, bytes.len());
        self.bus.write(self.address, &buffer)
    }
}

impl<B: I2cBus> Transport for I2cTransport<B> {
    type Error = B::Error;

    fn send_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.send(Control::Command, bytes)
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.send(Control::Data, bytes)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.bus.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::MockDevice;
    use crate::bridge::UsbBridge;
    use oledlink_protocol::bridge::REQUEST_TYPE_OUT;

    #[derive(Default)]
    struct RecordingBus {
        writes: Vec<(u8, Vec<u8>)>,
        releases: usize,
    }

    impl I2cBus for RecordingBus {
        type Error = ();

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ()> {
            self.writes.push((address, data.to_vec()));
            Ok(())
        }

        fn write_read(&mut self, _: u8, _: &[u8], _: &mut [u8]) -> Result<(), ()> {
            Err(())
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    #[test]
    fn test_command_prefixes_control_byte() {
        let mut transport = I2cTransport::new(RecordingBus::default(), 0x3C);
        transport.send_command(&[0xAE, 0xD5, 0x80]).unwrap();
        transport.send_data(&[0xFF]).unwrap();

        let bus = transport.into_inner();
        assert_eq!(
            bus.writes,
            vec![
                (0x3C, vec![0x00, 0xAE, 0xD5, 0x80]),
                (0x3C, vec![0x40, 0xFF]),
            ]
        );
    }

    #[test]
    fn test_release_is_forwarded_once() {
        let mut transport = I2cTransport::new(RecordingBus::default(), 0x3C);
        transport.release();
        transport.release();
        assert_eq!(transport.into_inner().releases, 1);
    }

    #[test]
    fn test_over_usb_bridge() {
        let bridge = UsbBridge::new(MockDevice::default());
        let mut transport = I2cTransport::new(bridge, 0x3D);
        transport.send_command(&[0xAF]).unwrap();

        transport.release();
        assert!(transport.bus_mut().is_released());
    }

    #[test]
    fn test_bridge_write_layout() {
        let mut device = MockDevice::default();
        {
            let bridge = UsbBridge::new(&mut device);
            let mut transport = I2cTransport::new(bridge, 0x3C);
            transport.send_data(&[0x01, 0x02]).unwrap();
        }
        assert_eq!(device.transfers.len(), 1);
        assert_eq!(device.transfers[0].request_type, REQUEST_TYPE_OUT);
        assert_eq!(device.transfers[0].request, 7);
        assert_eq!(device.transfers[0].index, 0x3C);
        assert_eq!(device.transfers[0].data, vec![0x40, 0x01, 0x02]);
    }
}
