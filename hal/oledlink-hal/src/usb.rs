//! USB control transfer abstraction
//!
//! The I2C bridge adapter is driven entirely through control transfers on
//! endpoint zero. Keeping that behind a trait lets the bridge protocol be
//! exercised without a device attached.

/// Control transfers on endpoint zero of an opened USB device
pub trait ControlTransfer {
    /// Error type for transfer failures
    type Error: core::fmt::Debug;

    /// Device-to-host control transfer
    ///
    /// Returns the number of bytes actually read into `buf`.
    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error>;

    /// Host-to-device control transfer
    ///
    /// Returns the number of bytes actually written from `data`.
    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, Self::Error>;
}

impl<T: ControlTransfer + ?Sized> ControlTransfer for &mut T {
    type Error = T::Error;

    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        (**self).read_control(request_type, request, value, index, buf)
    }

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, Self::Error> {
        (**self).write_control(request_type, request, value, index, data)
    }
}
