//! OS serial ports via the `serialport` crate

use std::io::{self, Write};
use std::time::Duration;

use oledlink_hal::uart::{DataBits, Parity, StopBits};
use oledlink_hal::{SerialPorts, UartConfig, UartTx};

/// Read/write timeout standing in for "block forever"
///
/// The largest value every platform backend accepts without overflow.
pub const UNBOUNDED_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Serial ports of the running host
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSerialPorts;

/// An opened OS serial port; closed on drop
pub struct HostSerialPort {
    port: Box<dyn serialport::SerialPort>,
}

impl HostSerialPort {
    /// Name of the underlying device, if the OS reports one
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl SerialPorts for HostSerialPorts {
    type Port = HostSerialPort;
    type Error = io::Error;

    fn available(&self) -> Result<Vec<String>, io::Error> {
        Ok(serialport::available_ports()?
            .into_iter()
            .map(|info| info.port_name)
            .collect())
    }

    fn open(&self, path: &str, config: &UartConfig) -> Result<HostSerialPort, io::Error> {
        let port = serialport::new(path, config.baudrate)
            .data_bits(match config.data_bits {
                DataBits::Seven => serialport::DataBits::Seven,
                DataBits::Eight => serialport::DataBits::Eight,
            })
            .parity(match config.parity {
                Parity::None => serialport::Parity::None,
                Parity::Even => serialport::Parity::Even,
                Parity::Odd => serialport::Parity::Odd,
            })
            .stop_bits(match config.stop_bits {
                StopBits::One => serialport::StopBits::One,
                StopBits::Two => serialport::StopBits::Two,
            })
            .timeout(UNBOUNDED_TIMEOUT)
            .open()?;
        Ok(HostSerialPort { port })
    }
}

impl UartTx for HostSerialPort {
    type Error = io::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        self.port.flush()
    }
}
