//! Framed UART panel transport
//!
//! Each command or data burst becomes one bridge frame: address, big-endian
//! size, control byte, payload. The bridge microcontroller relays it as a
//! single I2C write.
//!
//! # Connecting
//!
//! The bridge can be left mid-frame by a previous session. [`connect`]
//! therefore opens and closes the port [`PRIMING_CYCLES`] times, each time
//! sending an all-zero command frame, before opening the session it keeps.

use log::{debug, info, trace, warn};
use oledlink_hal::{SerialPorts, Transport, UartConfig, UartTx};
use oledlink_protocol::{Control, Frame};
use thiserror::Error;

/// Open/send/close cycles performed before the retained session
pub const PRIMING_CYCLES: usize = 5;

/// Payload of each priming frame
const PRIMING_PAYLOAD: [u8; 8] = [0; 8];

/// Serial transport errors
#[derive(Debug, Error)]
pub enum SerialError<E> {
    /// Neither the requested port nor any other port exists
    #[error("no serial port available")]
    NoSerialPort,
    /// Payload does not fit the 16-bit size field
    #[error("payload of {0} bytes does not fit a bridge frame")]
    PayloadTooLarge(usize),
    /// Port enumeration, open or write failed
    #[error("serial port error: {0:?}")]
    Port(E),
    /// The port was already released
    #[error("serial port already released")]
    Released,
}

/// Panel transport over the framed UART bridge
pub struct UartTransport<P> {
    port: Option<P>,
    address: u8,
}

impl<P: UartTx> UartTransport<P> {
    /// Wrap an opened port, addressing the panel at `address`
    pub fn new(port: P, address: u8) -> Self {
        Self {
            port: Some(port),
            address,
        }
    }

    /// I2C address written into every frame
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Check whether the port has been released
    pub fn is_released(&self) -> bool {
        self.port.is_none()
    }

    /// Flush buffered output
    pub fn flush(&mut self) -> Result<(), SerialError<P::Error>> {
        self.port
            .as_mut()
            .ok_or(SerialError::Released)?
            .flush()
            .map_err(SerialError::Port)
    }

    fn send(&mut self, control: Control, bytes: &[u8]) -> Result<(), SerialError<P::Error>> {
        let frame = Frame::new(self.address, control, bytes)
            .map_err(|_| SerialError::PayloadTooLarge(bytes.len()))?;
        let port = self.port.as_mut().ok_or(SerialError::Released)?;

        trace!("frame {:?} size {}", control, frame.size());
        port.write_blocking(&frame.header())
            .map_err(SerialError::Port)?;
        port.write_blocking(frame.payload)
            .map_err(SerialError::Port)
    }
}

impl<P: UartTx> Transport for UartTransport<P> {
    type Error = SerialError<P::Error>;

    fn send_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.send(Control::Command, bytes)
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.send(Control::Data, bytes)
    }

    fn release(&mut self) {
        if self.port.take().is_some() {
            debug!("serial port released");
        }
    }
}

/// Pick `path` if present, otherwise the first available port
pub fn resolve_port<S: SerialPorts>(
    ports: &S,
    path: &str,
) -> Result<String, SerialError<S::Error>> {
    let available = ports.available().map_err(SerialError::Port)?;
    if available.iter().any(|p| p == path) {
        return Ok(path.to_string());
    }

    match available.into_iter().next() {
        Some(fallback) => {
            warn!("serial port {} not found, using {}", path, fallback);
            Ok(fallback)
        }
        None => Err(SerialError::NoSerialPort),
    }
}

/// Prime the bridge and open the session used for panel traffic
///
/// The priming cycles run strictly one after another; each port is closed
/// before the next is opened.
pub fn connect<S>(
    ports: &S,
    path: &str,
    config: &UartConfig,
    address: u8,
) -> Result<UartTransport<S::Port>, SerialError<S::Error>>
where
    S: SerialPorts,
    S::Port: UartTx<Error = S::Error>,
{
    let path = resolve_port(ports, path)?;

    for cycle in 0..PRIMING_CYCLES {
        debug!("priming {} ({}/{})", path, cycle + 1, PRIMING_CYCLES);
        let port = ports.open(&path, config).map_err(SerialError::Port)?;
        let mut priming = UartTransport::new(port, address);
        priming.send_command(&PRIMING_PAYLOAD)?;
        priming.flush()?;
        priming.release();
    }

    let port = ports.open(&path, config).map_err(SerialError::Port)?;
    info!(
        "serial bridge on {} at {} baud, panel 0x{:02x}",
        path, config.baudrate, address
    );
    Ok(UartTransport::new(port, address))
}
