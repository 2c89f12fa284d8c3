//! Sample type and level conversions

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Lowest sample rate a chain can be prepared for, in Hz
pub const MIN_SAMPLE_RATE: f64 = 8000.0;

/// Lowest level a meter displays, in dBFS
pub const METER_FLOOR_DB: f64 = -72.0;

/// Highest level a meter displays, in dBFS
pub const METER_CEILING_DB: f64 = 12.0;

/// Convert decibels to linear gain
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    if db <= -144.0 {
        0.0
    } else {
        10.0_f64.powf(db / 20.0)
    }
}

/// Convert linear gain to decibels, never going below `floor_db`
#[inline]
pub fn gain_to_db(gain: f64, floor_db: f64) -> f64 {
    if gain <= 0.0 {
        floor_db
    } else {
        (20.0 * gain.log10()).max(floor_db)
    }
}
