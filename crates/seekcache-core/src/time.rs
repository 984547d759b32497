//! Time base for decoder timestamps and frame/sample counting.
//!
//! Decoders report timestamps in 100 ns ticks. Frames and audio sample-frames
//! are counted in whole units, so every conversion goes through rational
//! arithmetic to stay exact for rates like 30000/1001.

use num_rational::Rational64;
use num_traits::{CheckedDiv, CheckedMul};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp units per second (100 ns ticks).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Both terms are non-zero.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.numerator != 0 && self.denominator != 0
    }

    #[inline]
    fn ratio(self) -> Rational64 {
        Rational64::new(self.numerator as i64, self.denominator as i64)
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// Frame index containing the given timestamp (floor).
///
/// `rate` must be valid (see [`FrameRate::is_valid`]).
#[inline]
pub fn frame_from_timestamp(ticks: i64, rate: FrameRate) -> i64 {
    (Rational64::new(ticks, TICKS_PER_SECOND) * rate.ratio())
        .floor()
        .to_integer()
}

/// First tick that belongs to the given frame.
///
/// Rounds up so that `frame_from_timestamp(timestamp_from_frame(f))` is `f`
/// for rates that do not divide the tick rate evenly. Saturates at the `i64`
/// range; see [`checked_timestamp_from_frame`].
#[inline]
pub fn timestamp_from_frame(frame: i64, rate: FrameRate) -> i64 {
    checked_timestamp_from_frame(frame, rate).unwrap_or(saturated(frame))
}

/// [`timestamp_from_frame`], or `None` when the tick count does not fit in
/// an `i64`.
pub fn checked_timestamp_from_frame(frame: i64, rate: FrameRate) -> Option<i64> {
    let seconds = Rational64::from_integer(frame).checked_div(&rate.ratio())?;
    ceil_to_integer(seconds.checked_mul(&Rational64::from_integer(TICKS_PER_SECOND))?)
}

/// Sample-frame index containing the given timestamp (floor).
///
/// `sample_rate` must be non-zero.
#[inline]
pub fn sample_from_timestamp(ticks: i64, sample_rate: u32) -> i64 {
    (Rational64::new(ticks, TICKS_PER_SECOND) * sample_rate as i64)
        .floor()
        .to_integer()
}

/// First tick that belongs to the given sample-frame (ceil). Saturates at
/// the `i64` range.
#[inline]
pub fn timestamp_from_sample(sample: i64, sample_rate: u32) -> i64 {
    checked_timestamp_from_sample(sample, sample_rate).unwrap_or(saturated(sample))
}

/// [`timestamp_from_sample`], or `None` when the tick count does not fit in
/// an `i64`.
pub fn checked_timestamp_from_sample(sample: i64, sample_rate: u32) -> Option<i64> {
    let seconds = Rational64::new(sample, sample_rate as i64);
    ceil_to_integer(seconds.checked_mul(&Rational64::from_integer(TICKS_PER_SECOND))?)
}

/// Ceiling without the intermediate `numer + denom` of `Ratio::ceil`.
fn ceil_to_integer(value: Rational64) -> Option<i64> {
    let truncated = value.to_integer();
    if value.is_integer() || *value.numer() < 0 {
        Some(truncated)
    } else {
        truncated.checked_add(1)
    }
}

fn saturated(sign: i64) -> i64 {
    if sign < 0 {
        i64::MIN
    } else {
        i64::MAX
    }
}

/// Ticks as seconds, for logging.
#[inline]
pub fn ticks_to_seconds(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}
