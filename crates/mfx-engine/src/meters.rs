//! Block RMS meters shared between the audio and UI threads

use mfx_core::{METER_CEILING_DB, METER_FLOOR_DB, gain_to_db};
use portable_atomic::{AtomicF32, Ordering};

/// Pre- and post-chain RMS for both channels, written once per block
#[derive(Debug, Default)]
pub struct ChainMeters {
    left_pre: AtomicF32,
    right_pre: AtomicF32,
    left_post: AtomicF32,
    right_post: AtomicF32,
}

impl ChainMeters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn store_pre(&self, left: f64, right: f64) {
        self.left_pre.store(left as f32, Ordering::Relaxed);
        self.right_pre.store(right as f32, Ordering::Relaxed);
    }

    #[inline]
    pub fn store_post(&self, left: f64, right: f64) {
        self.left_post.store(left as f32, Ordering::Relaxed);
        self.right_post.store(right as f32, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            left_pre: self.left_pre.load(Ordering::Relaxed),
            right_pre: self.right_pre.load(Ordering::Relaxed),
            left_post: self.left_post.load(Ordering::Relaxed),
            right_post: self.right_post.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.store_pre(0.0, 0.0);
        self.store_post(0.0, 0.0);
    }
}

/// Linear RMS values read at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterSnapshot {
    pub left_pre: f32,
    pub right_pre: f32,
    pub left_post: f32,
    pub right_post: f32,
}

/// Meter reading in dBFS, clamped to the displayable range
#[inline]
pub fn meter_db(rms: f32) -> f64 {
    gain_to_db(rms as f64, METER_FLOOR_DB).min(METER_CEILING_DB)
}

impl MeterSnapshot {
    pub fn left_pre_db(&self) -> f64 {
        meter_db(self.left_pre)
    }

    pub fn right_pre_db(&self) -> f64 {
        meter_db(self.right_pre)
    }

    pub fn left_post_db(&self) -> f64 {
        meter_db(self.left_post)
    }

    pub fn right_post_db(&self) -> f64 {
        meter_db(self.right_post)
    }
}
