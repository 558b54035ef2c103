//! Panel transport capability
//!
//! A transport moves controller command bytes and display RAM bytes to the
//! panel. How it does so (a USB bridge relaying I2C, a framed UART) is
//! invisible to the panel controller.

/// Command/data byte sink for an SSD1306-class controller
///
/// Every call is one complete, ordered transaction on the underlying
/// channel. Implementations hold exclusive ownership of that channel.
pub trait Transport {
    /// Error type for transport operations
    type Error: core::fmt::Debug;

    /// Send controller command bytes (control byte `0x00` on the wire)
    fn send_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Send display RAM bytes (control byte `0x40` on the wire)
    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Release the underlying channel
    ///
    /// The owner calls this at most once. Dropping the transport releases
    /// it as well; this hook only makes the moment explicit.
    fn release(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn send_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).send_command(bytes)
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).send_data(bytes)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
