//! Drivers for HiTechnic sensors attached to LEGO EV3 input ports.
//!
//! # Overview
//!
//! HiTechnic sensors talk to the EV3 brick over I2C. Each sensor lives on one of the brick's four
//! input ports, and every exchange with it is a single blocking [transaction]: a register select,
//! a few payload bytes, and an optional response of fixed length.
//!
//! This crate does not own the bus. Instead, the host runtime hands a device an implementation of
//! [`I2cTransport`] for the port the sensor is plugged into, and the device drives it:
//!
//! ```no_run
//! use hitechnic_devices::{hitechnic::color_v2::HiTechnicColorSensor, SensorPort};
//!
//! # fn demo<B: hitechnic_devices::I2cTransport>(bus: B) -> Result<(), Box<dyn core::error::Error>> {
//! let port = SensorPort::new(1)?;
//! let mut sensor = HiTechnicColorSensor::new(port, bus);
//!
//! let hsvl = sensor.hsvl()?;
//! println!("hue: {:?}, value: {}", hsvl.hue, hsvl.value);
//! # Ok(())
//! # }
//! ```
//!
//! [transaction]: I2cTransport::transaction

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod color;
pub mod hitechnic;
pub mod i2c;
pub mod port;

pub use i2c::I2cTransport;
pub use port::SensorPort;
use snafu::Snafu;

#[derive(Debug, Snafu)]
/// Errors that can take place when addressing EV3 sensor ports.
pub enum PortError {
    /// The port number does not name one of the brick's input ports.
    #[snafu(display(
        "Port {number} is not a sensor port (expected {}..={}).",
        SensorPort::MIN_NUMBER,
        SensorPort::MAX_NUMBER
    ))]
    InvalidPort {
        /// The rejected port number.
        number: u8,
    },
}
