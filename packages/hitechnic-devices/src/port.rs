//! EV3 sensor ports.
//!
//! The EV3 brick has four input ports labeled 1 through 4. A [`SensorPort`] is a checked port
//! number handed to a device when it is created. Devices are constructed explicitly by the caller;
//! there is no global registry of port instances.

use snafu::ensure;

use crate::{InvalidPortSnafu, PortError};

/// An input port on the EV3 brick.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SensorPort {
    /// The number of the port.
    ///
    /// Ports are numbered starting from 1.
    number: u8,
}

impl SensorPort {
    /// The lowest valid port number.
    pub const MIN_NUMBER: u8 = 1;

    /// The highest valid port number.
    pub const MAX_NUMBER: u8 = 4;

    /// Creates a sensor port from its printed number.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidPort`] if `number` is not in `1..=4`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hitechnic_devices::SensorPort;
    ///
    /// let port = SensorPort::new(3).unwrap();
    /// assert_eq!(port.number(), 3);
    ///
    /// assert!(SensorPort::new(0).is_err());
    /// ```
    pub fn new(number: u8) -> Result<Self, PortError> {
        ensure!(
            (Self::MIN_NUMBER..=Self::MAX_NUMBER).contains(&number),
            InvalidPortSnafu { number }
        );

        Ok(Self { number })
    }

    /// Returns the number of the port.
    ///
    /// Ports are numbered starting from 1.
    #[must_use]
    pub const fn number(&self) -> u8 {
        self.number
    }

    /// Zero-based index of the port, as used by host bus tables.
    #[must_use]
    pub const fn index(&self) -> usize {
        (self.number - 1) as usize
    }
}
