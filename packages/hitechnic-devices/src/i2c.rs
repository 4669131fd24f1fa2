//! I2C transport used by sensor drivers.
//!
//! Drivers in this crate never touch the bus directly. The host supplies an [`I2cTransport`] bound
//! to the port a sensor is plugged into, and every hardware exchange goes through
//! [`I2cTransport::transaction`]. Timeouts and bus arbitration are the transport's business.

/// A blocking, per-port I2C connection supplied by the host runtime.
pub trait I2cTransport {
    /// The error produced when a bus transaction fails.
    type Error: core::error::Error + 'static;

    /// Performs one request/response exchange with the device.
    ///
    /// `register_select` picks the transfer kind on the host side, `payload` is written to the
    /// device, and `response.len()` bytes are read back into `response`. An empty `response`
    /// makes this a pure write.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the transfer fails. Callers do not retry.
    fn transaction(
        &mut self,
        register_select: u8,
        payload: &[u8],
        response: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Returns `true` if the device is currently powered and responding.
    fn is_active(&self) -> bool;
}

impl<T: I2cTransport + ?Sized> I2cTransport for &mut T {
    type Error = T::Error;

    fn transaction(
        &mut self,
        register_select: u8,
        payload: &[u8],
        response: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).transaction(register_select, payload, response)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
