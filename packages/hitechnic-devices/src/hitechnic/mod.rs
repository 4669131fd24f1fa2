//! HiTechnic sensors.
//!
//! HiTechnic sensors share a command layout: a write of `[command register, value]` changes
//! device settings, and a write of the data register followed by a fixed-length read fetches the
//! latest sample.

pub mod color_v2;
