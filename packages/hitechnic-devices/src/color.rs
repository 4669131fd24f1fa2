//! Color types.
//!
//! This module re-exports [`Rgb`] from the [`rgb`] crate as the container for 8-bit sensor
//! readings, and adds the four-channel [`Rgbw`] and derived [`Hsvl`] types.

pub use rgb::Rgb;

/// A red/green/blue/white reading.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Rgbw<T> {
    /// Red channel
    pub r: T,
    /// Green channel
    pub g: T,
    /// Blue channel
    pub b: T,
    /// White (unfiltered) channel
    pub w: T,
}

impl<T> Rgbw<T> {
    /// Creates a new reading from its channels.
    pub const fn new(r: T, g: T, b: T, w: T) -> Self {
        Self { r, g, b, w }
    }
}

impl Rgbw<u16> {
    /// Reassembles four big-endian 16-bit channels from an 8-byte sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use hitechnic_devices::color::Rgbw;
    ///
    /// let rgbw = Rgbw::from_be_bytes([0x01, 0x02, 0, 255, 255, 0, 0, 0]);
    /// assert_eq!(rgbw, Rgbw::new(0x0102, 255, 0xFF00, 0));
    /// ```
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self {
            r: u16::from_be_bytes([bytes[0], bytes[1]]),
            g: u16::from_be_bytes([bytes[2], bytes[3]]),
            b: u16::from_be_bytes([bytes[4], bytes[5]]),
            w: u16::from_be_bytes([bytes[6], bytes[7]]),
        }
    }
}

/// Hue, saturation, value and lightness derived from an 8-bit RGB reading.
///
/// Saturation, value and lightness are percentages. Hue is in degrees.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Hsvl {
    /// Hue in degrees, or `None` for black, white and grey, where hue is undefined.
    pub hue: Option<u16>,
    /// Saturation, or `None` for black, where saturation is undefined.
    pub saturation: Option<u8>,
    /// Value (brightness of the strongest channel).
    pub value: u8,
    /// Lightness (mean of the strongest and weakest channel).
    pub lightness: u8,
}

impl Hsvl {
    /// Converts an RGB reading in the sensor's `0..=255` range.
    ///
    /// Hue is taken from whichever channel is strongest; ties resolve to red, then green.
    ///
    /// # Examples
    ///
    /// ```
    /// use hitechnic_devices::color::{Hsvl, Rgb};
    ///
    /// let red = Hsvl::from_rgb(Rgb::new(255, 0, 0));
    /// assert_eq!(red.hue, Some(0));
    /// assert_eq!(red.saturation, Some(100));
    ///
    /// let black = Hsvl::from_rgb(Rgb::new(0, 0, 0));
    /// assert_eq!(black.to_array(), [-1, -1, 0, 0]);
    /// ```
    #[must_use]
    pub fn from_rgb(rgb: Rgb<u8>) -> Self {
        let max = rgb.r.max(rgb.g).max(rgb.b);
        let min = rgb.r.min(rgb.g).min(rgb.b);

        // 0..=510 and 0..=255 onto a 0..=100 scale.
        let lightness = (f64::from(max) + f64::from(min)) / 5.12;
        let value = f64::from(max) / 2.56;

        let mut hsvl = Self {
            hue: None,
            saturation: None,
            value: round(value) as u8,
            lightness: round(lightness) as u8,
        };

        // Black: no hue, no saturation.
        if max == 0 {
            return hsvl;
        }

        let scale = f64::from(max);
        let (r, g, b) = (
            f64::from(rgb.r) / scale,
            f64::from(rgb.g) / scale,
            f64::from(rgb.b) / scale,
        );
        let (hi, lo) = (r.max(g).max(b), r.min(g).min(b));
        hsvl.saturation = Some(round((hi - lo) * 100.0) as u8);

        // White or grey: no hue.
        if max == min {
            return hsvl;
        }

        let span = hi - lo;
        let (r, g, b) = ((r - lo) / span, (g - lo) / span, (b - lo) / span);

        let hue = if rgb.r == max {
            let hue = 60.0 * (g - b);
            if hue < 0.0 { hue + 360.0 } else { hue }
        } else if rgb.g == max {
            120.0 + 60.0 * (b - r)
        } else {
            240.0 + 60.0 * (r - g)
        };
        // Hues just below 360 round up onto the wrap point.
        hsvl.hue = Some(round(hue) as u16 % 360);

        hsvl
    }

    /// Returns `[hue, saturation, value, lightness]`, using `-1` for undefined components.
    #[must_use]
    pub fn to_array(self) -> [i16; 4] {
        [
            self.hue.map_or(-1, |hue| hue as i16),
            self.saturation.map_or(-1, i16::from),
            i16::from(self.value),
            i16::from(self.lightness),
        ]
    }
}

impl From<Rgb<u8>> for Hsvl {
    fn from(rgb: Rgb<u8>) -> Self {
        Self::from_rgb(rgb)
    }
}

/// Rounds half away from zero.
fn round(x: f64) -> f64 {
    libm::round(x)
}
