//! HiTechnic Color Sensor V2.
//!
//! The sensor lights its target with a white LED and reports a color number along with the
//! red, green, blue and white components of the reflected light. It can also run with the LED
//! off (passive) or hand out unprocessed photodiode counts (raw).
//!
//! The driver exposes five [`SoftMode`]s, each selecting how a sample is interpreted, on top of
//! the three [`PhysicalMode`]s the chip supports. A mode command is only sent when the requested
//! mode changes, so calling a reader repeatedly costs one bus read per call.
//!
//! The sensor must be configured for the local mains frequency to cancel ambient flicker. It
//! ships set for 60Hz; see [`HiTechnicColorSensor::set_frequency`].

use alloc::{string::String, vec::Vec};

use snafu::{ResultExt, Snafu};

use crate::{
    color::{Hsvl, Rgb, Rgbw},
    i2c::I2cTransport,
    port::SensorPort,
};

/// Register select used for every transaction with the sensor.
const REGISTER_SELECT: u8 = 1;

/// Command register. Writing a mode or frequency byte here reconfigures the sensor.
const COMMAND_REGISTER: u8 = 0x41;

/// First data register. Reads start here.
const DATA_REGISTER: u8 = 0x42;

/// Length of a sample read from [`DATA_REGISTER`].
pub const SAMPLE_LEN: usize = 8;

/// Hardware state selected by a command byte.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum PhysicalMode {
    /// LED on, ambient light cancelled.
    Active = 0,
    /// LED off, no ambient light cancellation.
    Passive = 1,
    /// Unprocessed light sensor counts.
    Raw = 3,
}

/// How the driver reads and interprets samples.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum SoftMode {
    /// Color number followed by red, green, blue and white.
    #[default]
    All = 0,
    /// Color number only.
    Color = 1,
    /// Red, green and blue.
    Rgbw = 2,
    /// 16-bit red, green, blue and white with the LED off.
    PassiveRgbw = 5,
    /// 16-bit unprocessed red, green, blue and white.
    RawRgbw = 6,
}

impl SoftMode {
    /// The hardware state this mode needs.
    #[must_use]
    pub const fn physical_mode(self) -> PhysicalMode {
        match self {
            Self::All | Self::Color | Self::Rgbw => PhysicalMode::Active,
            Self::PassiveRgbw => PhysicalMode::Passive,
            Self::RawRgbw => PhysicalMode::Raw,
        }
    }
}

impl TryFrom<u8> for SoftMode {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::All),
            1 => Ok(Self::Color),
            2 => Ok(Self::Rgbw),
            5 => Ok(Self::PassiveRgbw),
            6 => Ok(Self::RawRgbw),
            other => Err(other),
        }
    }
}

impl From<SoftMode> for u8 {
    fn from(mode: SoftMode) -> Self {
        mode as u8
    }
}

/// Mains frequency the sensor cancels ambient flicker at.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum CancellationFrequency {
    /// 50Hz mains.
    Hz50 = 0x35,
    /// 60Hz mains. This is the factory setting.
    #[default]
    Hz60 = 0x36,
}

/// Requested and applied mode of one sensor.
///
/// Modes are compared by raw value: a command is due whenever the requested value differs from
/// the last one a command was issued for, even if both map to the same [`PhysicalMode`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SensorState {
    mode: u8,
    applied: Option<u8>,
}

impl SensorState {
    /// Creates a state with `mode` requested and nothing applied yet.
    #[must_use]
    pub const fn new(mode: SoftMode) -> Self {
        Self {
            mode: mode as u8,
            applied: None,
        }
    }

    /// The last requested mode, as a raw value.
    #[must_use]
    pub const fn raw_mode(&self) -> u8 {
        self.mode
    }

    /// The last requested mode, or `None` if it has no [`SoftMode`].
    #[must_use]
    pub fn mode(&self) -> Option<SoftMode> {
        SoftMode::try_from(self.mode).ok()
    }

    /// The raw mode a command was last issued for.
    #[must_use]
    pub const fn applied(&self) -> Option<u8> {
        self.applied
    }

    /// Records a mode request and decides whether the hardware needs a command.
    ///
    /// Returns the physical mode to send, or `None` if nothing should be written. While the
    /// device is inactive the request is only recorded.
    pub fn request(&mut self, raw: u8, active: bool) -> Option<PhysicalMode> {
        self.mode = raw;

        if !active {
            log::debug!("color sensor inactive, deferring mode {raw}");
            return None;
        }

        if self.applied == Some(raw) {
            return None;
        }
        self.applied = Some(raw);

        match SoftMode::try_from(raw) {
            Ok(mode) => Some(mode.physical_mode()),
            Err(raw) => {
                log::warn!("color sensor mode {raw} has no physical mode, not sending");
                None
            }
        }
    }

    /// Forgets the applied mode so the next request issues a command.
    pub const fn invalidate(&mut self) {
        self.applied = None;
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::new(SoftMode::default())
    }
}

/// Picks out the values a sample holds under `raw_mode`.
///
/// Unknown modes yield a single `0`.
#[must_use]
pub fn decode(raw_mode: u8, sample: &[u8; SAMPLE_LEN]) -> &[u8] {
    match SoftMode::try_from(raw_mode) {
        Ok(SoftMode::All) => &sample[0..5],
        Ok(SoftMode::Color) => &sample[0..1],
        Ok(SoftMode::Rgbw) => &sample[1..4],
        Ok(SoftMode::PassiveRgbw | SoftMode::RawRgbw) => &sample[..],
        Err(_) => &[0],
    }
}

/// Settings applied when creating a [`HiTechnicColorSensor`].
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct ColorSensorConfig {
    /// Mode requested at creation.
    pub initial_mode: SoftMode,
    /// Mains frequency written by [`HiTechnicColorSensor::resync_mode`], if any.
    pub mains_frequency: Option<CancellationFrequency>,
}

/// A HiTechnic Color Sensor V2 on an EV3 sensor port.
#[derive(Debug)]
pub struct HiTechnicColorSensor<B> {
    port: SensorPort,
    bus: B,
    state: SensorState,
    mains_frequency: Option<CancellationFrequency>,
    sample: [u8; SAMPLE_LEN],
}

impl<B: I2cTransport> HiTechnicColorSensor<B> {
    /// Identification string the sensor reports over I2C.
    pub const DEVICE_ID: &'static str = "HiTechncColorPD";

    /// Creates a color sensor in [`SoftMode::All`].
    ///
    /// No bus traffic happens here; the mode command goes out on first use.
    pub fn new(port: SensorPort, bus: B) -> Self {
        Self::with_config(port, bus, ColorSensorConfig::default())
    }

    /// Creates a color sensor with the given settings.
    pub fn with_config(port: SensorPort, bus: B, config: ColorSensorConfig) -> Self {
        Self {
            port,
            bus,
            state: SensorState::new(config.initial_mode),
            mains_frequency: config.mains_frequency,
            sample: [0; SAMPLE_LEN],
        }
    }

    /// Returns the port number of the sensor.
    #[must_use]
    pub const fn port_number(&self) -> u8 {
        self.port.number()
    }

    /// Returns the transport this sensor talks through.
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Returns the transport this sensor talks through, mutably.
    pub const fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Returns the requested mode, or `None` if a raw value without a [`SoftMode`] was set.
    #[must_use]
    pub fn mode(&self) -> Option<SoftMode> {
        self.state.mode()
    }

    /// Returns the requested mode as a raw value.
    #[must_use]
    pub const fn raw_mode(&self) -> u8 {
        self.state.raw_mode()
    }

    /// Requests a mode, writing a mode command if it differs from the applied one.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if the mode command fails.
    pub fn set_mode(&mut self, mode: SoftMode) -> Result<(), ColorSensorError<B::Error>> {
        self.set_raw_mode(mode.into())
    }

    /// Requests a mode by raw value.
    ///
    /// Values without a [`SoftMode`] are recorded but send nothing, and later queries decode to
    /// a single `0`.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if the mode command fails.
    pub fn set_raw_mode(&mut self, raw: u8) -> Result<(), ColorSensorError<B::Error>> {
        let active = self.bus.is_active();

        if let Some(physical) = self.state.request(raw, active) {
            log::debug!(
                "color sensor on port {}: mode {raw} -> {physical:?}",
                self.port.number()
            );
            self.write_command(physical as u8)?;
        }

        Ok(())
    }

    /// Re-sends the requested mode, followed by the configured mains frequency.
    ///
    /// Hosts call this once the device becomes active, so that requests deferred while it was
    /// inactive reach the hardware.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a command fails.
    pub fn resync_mode(&mut self) -> Result<(), ColorSensorError<B::Error>> {
        self.state.invalidate();
        self.set_raw_mode(self.state.raw_mode())?;

        if let Some(frequency) = self.mains_frequency {
            if self.bus.is_active() {
                self.set_frequency(frequency)?;
            }
        }

        Ok(())
    }

    /// Sets the mains frequency the sensor cancels.
    ///
    /// This does not affect the mode.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if the command fails.
    pub fn set_frequency(
        &mut self,
        frequency: CancellationFrequency,
    ) -> Result<(), ColorSensorError<B::Error>> {
        log::debug!(
            "color sensor on port {}: cancelling at {frequency:?}",
            self.port.number()
        );
        self.write_command(frequency as u8)
    }

    /// Reads a sample and returns the values the current mode holds.
    ///
    /// | Mode | Values |
    /// |---|---|
    /// | [`All`](SoftMode::All) | color number, red, green, blue, white |
    /// | [`Color`](SoftMode::Color) | color number |
    /// | [`Rgbw`](SoftMode::Rgbw) | red, green, blue |
    /// | [`PassiveRgbw`](SoftMode::PassiveRgbw), [`RawRgbw`](SoftMode::RawRgbw) | eight bytes, four big-endian words |
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if the read fails.
    pub fn query(&mut self) -> Result<&[u8], ColorSensorError<B::Error>> {
        self.read_sample()?;

        let values = decode(self.state.raw_mode(), &self.sample);
        log::trace!(
            "color sensor on port {}: {} values in mode {}",
            self.port.number(),
            values.len(),
            self.state.raw_mode()
        );

        Ok(values)
    }

    /// Reads a sample and renders its values as text.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if the read fails.
    pub fn info(&mut self) -> Result<Vec<String>, ColorSensorError<B::Error>> {
        use alloc::string::ToString;

        if self.mode() == Some(SoftMode::Color) {
            let color = self.query()?[0];
            return Ok(alloc::vec![color.to_string()]);
        }

        Ok(self.query()?.iter().map(ToString::to_string).collect())
    }

    /// Returns the color number followed by red, green, blue and white.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a transaction fails.
    pub fn all(&mut self) -> Result<[u8; 5], ColorSensorError<B::Error>> {
        self.set_mode(SoftMode::All)?;
        self.read_sample()?;

        let [color, r, g, b, w, ..] = self.sample;
        Ok([color, r, g, b, w])
    }

    /// Returns the color number.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a transaction fails.
    pub fn color(&mut self) -> Result<u8, ColorSensorError<B::Error>> {
        self.set_mode(SoftMode::Color)?;
        self.read_sample()?;

        Ok(self.sample[0])
    }

    /// Returns the 8-bit red, green and blue components.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a transaction fails.
    pub fn rgb(&mut self) -> Result<Rgb<u8>, ColorSensorError<B::Error>> {
        self.set_mode(SoftMode::Rgbw)?;
        self.read_sample()?;

        let [_, r, g, b, ..] = self.sample;
        Ok(Rgb::new(r, g, b))
    }

    /// Returns 16-bit components measured with the LED off.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a transaction fails.
    pub fn passive_rgbw(&mut self) -> Result<Rgbw<u16>, ColorSensorError<B::Error>> {
        self.set_mode(SoftMode::PassiveRgbw)?;
        self.read_sample()?;

        Ok(Rgbw::from_be_bytes(self.sample))
    }

    /// Returns unprocessed 16-bit components.
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a transaction fails.
    pub fn raw_rgbw(&mut self) -> Result<Rgbw<u16>, ColorSensorError<B::Error>> {
        self.set_mode(SoftMode::RawRgbw)?;
        self.read_sample()?;

        Ok(Rgbw::from_be_bytes(self.sample))
    }

    /// Returns hue, saturation, value and lightness computed from [`rgb`](Self::rgb).
    ///
    /// # Errors
    ///
    /// Returns [`ColorSensorError::Transaction`] if a transaction fails.
    pub fn hsvl(&mut self) -> Result<Hsvl, ColorSensorError<B::Error>> {
        Ok(Hsvl::from_rgb(self.rgb()?))
    }

    fn write_command(&mut self, value: u8) -> Result<(), ColorSensorError<B::Error>> {
        self.bus
            .transaction(REGISTER_SELECT, &[COMMAND_REGISTER, value], &mut [])
            .context(TransactionSnafu {
                port: self.port.number(),
            })
    }

    fn read_sample(&mut self) -> Result<(), ColorSensorError<B::Error>> {
        self.bus
            .transaction(REGISTER_SELECT, &[DATA_REGISTER], &mut self.sample)
            .context(TransactionSnafu {
                port: self.port.number(),
            })
    }
}

#[derive(Debug, Snafu)]
/// Errors that can occur when using a color sensor.
pub enum ColorSensorError<E>
where
    E: core::error::Error + 'static,
{
    /// A bus transaction with the sensor failed.
    #[snafu(display("I2C transaction with the color sensor on port {port} failed: {source}"))]
    Transaction {
        /// Port the sensor is plugged into.
        port: u8,
        /// The transport's error.
        source: E,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::mock::{BusFault, MockBus};

    const SAMPLE: [u8; 8] = [9, 10, 20, 30, 40, 50, 60, 70];

    fn sensor(bus: MockBus) -> HiTechnicColorSensor<MockBus> {
        HiTechnicColorSensor::new(SensorPort::new(1).unwrap(), bus)
    }

    #[test]
    fn soft_modes_map_to_physical_modes() {
        assert_eq!(SoftMode::All.physical_mode(), PhysicalMode::Active);
        assert_eq!(SoftMode::Color.physical_mode(), PhysicalMode::Active);
        assert_eq!(SoftMode::Rgbw.physical_mode(), PhysicalMode::Active);
        assert_eq!(SoftMode::PassiveRgbw.physical_mode(), PhysicalMode::Passive);
        assert_eq!(SoftMode::RawRgbw.physical_mode(), PhysicalMode::Raw);
    }

    #[test]
    fn raw_mode_values() {
        for mode in [
            SoftMode::All,
            SoftMode::Color,
            SoftMode::Rgbw,
            SoftMode::PassiveRgbw,
            SoftMode::RawRgbw,
        ] {
            assert_eq!(SoftMode::try_from(u8::from(mode)), Ok(mode));
        }
        assert_eq!(SoftMode::try_from(3), Err(3));
    }

    #[test]
    fn construction_is_silent() {
        let sensor = sensor(MockBus::active());
        assert!(sensor.bus().transfers.is_empty());
        assert_eq!(sensor.mode(), Some(SoftMode::All));
    }

    #[test]
    fn mode_change_writes_one_command() {
        let mut sensor = sensor(MockBus::active());

        sensor.set_mode(SoftMode::PassiveRgbw).unwrap();
        sensor.set_mode(SoftMode::RawRgbw).unwrap();
        sensor.set_mode(SoftMode::Color).unwrap();

        assert_eq!(
            sensor.bus().writes(),
            [&[0x41, 1][..], &[0x41, 3][..], &[0x41, 0][..]]
        );
        assert!(sensor.bus().transfers.iter().all(|t| t.register_select == 1));
    }

    #[test]
    fn repeated_mode_is_idempotent() {
        let mut sensor = sensor(MockBus::active());

        sensor.set_mode(SoftMode::Rgbw).unwrap();
        sensor.set_mode(SoftMode::Rgbw).unwrap();

        assert_eq!(sensor.bus().writes(), [&[65, 0][..]]);
    }

    #[test]
    fn same_physical_mode_still_resends_on_raw_change() {
        let mut sensor = sensor(MockBus::active());

        sensor.set_mode(SoftMode::All).unwrap();
        sensor.set_mode(SoftMode::Color).unwrap();

        assert_eq!(sensor.bus().writes(), [&[65, 0][..], &[65, 0][..]]);
    }

    #[test]
    fn inactive_sensor_defers_mode() {
        let mut sensor = sensor(MockBus::default());

        sensor.set_mode(SoftMode::RawRgbw).unwrap();
        assert!(sensor.bus().transfers.is_empty());
        assert_eq!(sensor.mode(), Some(SoftMode::RawRgbw));

        sensor.bus_mut().active = true;
        sensor.resync_mode().unwrap();
        assert_eq!(sensor.bus().writes(), [&[65, 3][..]]);
    }

    #[test]
    fn resync_resends_mode_and_frequency() {
        let config = ColorSensorConfig {
            initial_mode: SoftMode::Color,
            mains_frequency: Some(CancellationFrequency::Hz50),
        };
        let mut sensor =
            HiTechnicColorSensor::with_config(SensorPort::new(2).unwrap(), MockBus::active(), config);

        sensor.set_mode(SoftMode::Color).unwrap();
        sensor.resync_mode().unwrap();

        assert_eq!(
            sensor.bus().writes(),
            [&[65, 0][..], &[65, 0][..], &[65, 53][..]]
        );
    }

    #[test]
    fn frequency_commands() {
        let mut sensor = sensor(MockBus::active());

        sensor.set_frequency(CancellationFrequency::Hz50).unwrap();
        sensor.set_frequency(CancellationFrequency::Hz60).unwrap();

        assert_eq!(sensor.bus().writes(), [&[65, 53][..], &[65, 54][..]]);
        assert_eq!(sensor.mode(), Some(SoftMode::All));
    }

    #[test]
    fn unknown_raw_mode_sends_nothing_and_decodes_to_zero() {
        let mut sensor = sensor(MockBus::active().with_sample(SAMPLE));

        sensor.set_raw_mode(4).unwrap();
        assert!(sensor.bus().writes().is_empty());
        assert_eq!(sensor.mode(), None);
        assert_eq!(sensor.raw_mode(), 4);

        assert_eq!(sensor.query().unwrap(), [0]);
    }

    #[test]
    fn query_lengths_follow_mode() {
        for (mode, expected) in [
            (SoftMode::All, &SAMPLE[0..5]),
            (SoftMode::Color, &SAMPLE[0..1]),
            (SoftMode::Rgbw, &SAMPLE[1..4]),
            (SoftMode::PassiveRgbw, &SAMPLE[..]),
            (SoftMode::RawRgbw, &SAMPLE[..]),
        ] {
            let mut sensor = sensor(MockBus::active().with_sample(SAMPLE));
            sensor.set_mode(mode).unwrap();

            assert_eq!(sensor.query().unwrap(), expected);

            let read = sensor.bus().transfers.last().unwrap();
            assert_eq!(read.payload, [0x42]);
            assert_eq!(read.read_len, SAMPLE_LEN);
        }
    }

    #[test]
    fn readers() {
        let mut sensor = sensor(
            MockBus::active()
                .with_sample(SAMPLE)
                .with_sample(SAMPLE)
                .with_sample(SAMPLE)
                .with_sample([1, 2, 3, 4, 5, 6, 7, 8])
                .with_sample([255, 255, 0, 0, 0, 1, 128, 0]),
        );

        assert_eq!(sensor.all().unwrap(), [9, 10, 20, 30, 40]);
        assert_eq!(sensor.color().unwrap(), 9);
        assert_eq!(sensor.rgb().unwrap(), Rgb::new(10, 20, 30));
        assert_eq!(
            sensor.passive_rgbw().unwrap(),
            Rgbw::new(258, 772, 1286, 1800)
        );
        assert_eq!(sensor.raw_rgbw().unwrap(), Rgbw::new(65535, 0, 1, 32768));

        assert_eq!(
            sensor.bus().writes(),
            [
                &[65, 0][..],
                &[65, 0][..],
                &[65, 0][..],
                &[65, 1][..],
                &[65, 3][..]
            ]
        );
    }

    #[test]
    fn hsvl_reads_in_rgbw_mode() {
        let mut sensor = sensor(MockBus::active().with_sample([7, 0, 255, 0, 0, 0, 0, 0]));

        let hsvl = sensor.hsvl().unwrap();
        assert_eq!(hsvl.to_array(), [120, 100, 100, 50]);
        assert_eq!(sensor.mode(), Some(SoftMode::Rgbw));
    }

    #[test]
    fn info_renders_values() {
        let mut sensor = sensor(MockBus::active().with_sample(SAMPLE).with_sample(SAMPLE));

        sensor.set_mode(SoftMode::Color).unwrap();
        assert_eq!(sensor.info().unwrap(), ["9"]);

        sensor.set_mode(SoftMode::Rgbw).unwrap();
        assert_eq!(sensor.info().unwrap(), ["10", "20", "30"]);
    }

    #[test]
    fn transport_errors_propagate() {
        let mut bus = MockBus::active();
        bus.fail = true;
        let mut sensor = sensor(bus);

        let err = sensor.set_mode(SoftMode::RawRgbw).unwrap_err();
        assert!(matches!(
            err,
            ColorSensorError::Transaction {
                port: 1,
                source: BusFault
            }
        ));
        assert!(sensor.query().is_err());
    }
}
