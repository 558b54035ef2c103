//! Runtime transport selection
//!
//! The panel controller is generic over its transport; the tool picks the
//! concrete one from the configuration and dispatches through an enum.

use std::io;
use std::time::Duration;

use oledlink_drivers::{
    connect, BridgeConfig, BridgeError, I2cTransport, SerialError, UartTransport, UsbBridge,
};
use oledlink_hal::{Transport, UartConfig};
use oledlink_hal_host::{HostError, HostSerialPort, HostSerialPorts, UsbDeviceLease};
use thiserror::Error;

use crate::config::{TransportConfig, TransportKind};

pub type HostBridge = UsbBridge<UsbDeviceLease>;

/// Errors from either host transport
#[derive(Debug, Error)]
pub enum HostTransportError {
    #[error(transparent)]
    Device(#[from] HostError),
    #[error(transparent)]
    Bridge(#[from] BridgeError<rusb::Error>),
    #[error(transparent)]
    Serial(#[from] SerialError<io::Error>),
}

/// Transport chosen at runtime
pub enum HostTransport {
    Usb(I2cTransport<HostBridge>),
    Uart(UartTransport<HostSerialPort>),
}

impl Transport for HostTransport {
    type Error = HostTransportError;

    fn send_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        match self {
            HostTransport::Usb(t) => Ok(t.send_command(bytes)?),
            HostTransport::Uart(t) => Ok(t.send_command(bytes)?),
        }
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        match self {
            HostTransport::Usb(t) => Ok(t.send_data(bytes)?),
            HostTransport::Uart(t) => Ok(t.send_data(bytes)?),
        }
    }

    fn release(&mut self) {
        match self {
            HostTransport::Usb(t) => t.release(),
            HostTransport::Uart(t) => t.release(),
        }
    }
}

/// Open the USB bridge alone, without a panel transport on top
pub fn open_bridge(config: &TransportConfig) -> Result<HostBridge, HostTransportError> {
    let lease =
        UsbDeviceLease::open_bridge()?.with_timeout(Duration::from_millis(config.timeout_ms));
    let mut bridge = UsbBridge::with_config(
        lease,
        BridgeConfig {
            strict_writes: config.strict_writes,
        },
    );

    if let Some(delay) = config.i2c_delay_us {
        bridge.set_delay(delay)?;
    }
    Ok(bridge)
}

/// Open the configured transport
pub fn open(config: &TransportConfig) -> Result<HostTransport, HostTransportError> {
    match config.kind {
        TransportKind::Usb => {
            let bridge = open_bridge(config)?;
            Ok(HostTransport::Usb(I2cTransport::new(bridge, config.address)))
        }
        TransportKind::Uart => {
            let line = UartConfig::with_baudrate(config.baud_rate);
            let transport = connect(&HostSerialPorts, &config.port, &line, config.address)?;
            Ok(HostTransport::Uart(transport))
        }
    }
}
