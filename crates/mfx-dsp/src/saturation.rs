//! Overdrive
//!
//! tanh soft clipper. The output gain falls as drive rises so that loud
//! settings stay near the level of the dry signal.

use mfx_core::Sample;

use crate::{EffectUnit, MonoProcessor, ProcessContext, ProcessSpec, process_unless_bypassed};

pub const MIN_DRIVE: f64 = 1.0;
pub const MAX_DRIVE: f64 = 100.0;

/// Level compensation for a tanh stage driven by `drive`
#[inline]
pub fn drive_compensation(drive: f64) -> f64 {
    drive.powf(-2.642) * 0.6103 + 0.3903
}

/// Soft-clipping overdrive
#[derive(Debug, Clone)]
pub struct Overdrive {
    drive: f64,
    output_gain: f64,
}

impl Overdrive {
    pub fn new() -> Self {
        Self {
            drive: MIN_DRIVE,
            output_gain: drive_compensation(MIN_DRIVE),
        }
    }

    /// Set drive amount (1 = gentle, 100 = hard)
    pub fn set_drive(&mut self, drive: f64) {
        let drive = drive.clamp(MIN_DRIVE, MAX_DRIVE);
        if drive != self.drive {
            self.drive = drive;
            self.output_gain = drive_compensation(drive);
        }
    }

    #[inline]
    pub fn drive(&self) -> f64 {
        self.drive
    }
}

impl Default for Overdrive {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoProcessor for Overdrive {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.output_gain * (self.drive * input).tanh()
    }
}

impl EffectUnit for Overdrive {
    fn prepare(&mut self, _spec: &ProcessSpec) {}

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        process_unless_bypassed(self, ctx);
    }

    // Stateless
    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compensation_curve() {
        assert_relative_eq!(drive_compensation(1.0), 1.0006, epsilon = 1e-12);
        assert!(drive_compensation(100.0) < 0.4);
    }

    #[test]
    fn test_output_is_bounded() {
        let mut od = Overdrive::new();
        od.set_drive(100.0);
        for x in [-10.0, -1.0, -0.01, 0.0, 0.01, 1.0, 10.0] {
            let y = od.process_sample(x);
            assert!(y.abs() <= drive_compensation(100.0) + 1e-12);
            assert_eq!(y.signum(), if x == 0.0 { y.signum() } else { x.signum() });
        }
        assert_eq!(od.process_sample(0.0), 0.0);
    }

    #[test]
    fn test_drive_is_clamped() {
        let mut od = Overdrive::new();
        od.set_drive(0.0);
        assert_eq!(od.drive(), MIN_DRIVE);
        od.set_drive(1000.0);
        assert_eq!(od.drive(), MAX_DRIVE);
    }

    #[test]
    fn test_bypass_leaves_block() {
        let mut od = Overdrive::new();
        od.set_drive(50.0);
        let mut block = vec![0.8; 16];
        let mut ctx = ProcessContext::replacing(&mut block);
        ctx.is_bypassed = true;
        od.process(&mut ctx);
        assert!(block.iter().all(|&x| x == 0.8));
    }
}
