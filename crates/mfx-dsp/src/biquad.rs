//! Biquad filter implementation using Transposed Direct Form II
//!
//! Coefficient sets follow the RBJ audio EQ cookbook and are stored
//! normalized by a0.

use mfx_core::Sample;
use std::f64::consts::PI;

use crate::MonoProcessor;

/// Biquad coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// Shared RBJ intermediates for one (freq, q) pair
struct Rbj {
    cos_omega: f64,
    alpha: f64,
}

impl Rbj {
    fn new(freq: f64, q: f64, sample_rate: f64) -> Self {
        // Keep the design frequency strictly inside (0, nyquist)
        let freq = freq.min((sample_rate * 0.49).max(1.0)).max(1.0);
        let omega = 2.0 * PI * freq / sample_rate;
        Self {
            cos_omega: omega.cos(),
            alpha: omega.sin() / (2.0 * q.max(1e-3)),
        }
    }
}

impl BiquadCoeffs {
    /// Divide everything through by a0
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let inv = 1.0 / a0;
        Self {
            b0: b0 * inv,
            b1: b1 * inv,
            b2: b2 * inv,
            a1: a1 * inv,
            a2: a2 * inv,
        }
    }

    /// Bandpass, constant 0 dB peak gain
    pub fn bandpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let Rbj { cos_omega, alpha } = Rbj::new(freq, q, sample_rate);
        Self::normalized(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
    }

    pub fn notch(freq: f64, q: f64, sample_rate: f64) -> Self {
        let Rbj { cos_omega, alpha } = Rbj::new(freq, q, sample_rate);
        let k = -2.0 * cos_omega;
        Self::normalized(1.0, k, 1.0, 1.0 + alpha, k, 1.0 - alpha)
    }

    pub fn allpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let Rbj { cos_omega, alpha } = Rbj::new(freq, q, sample_rate);
        let k = -2.0 * cos_omega;
        Self::normalized(1.0 - alpha, k, 1.0 + alpha, 1.0 + alpha, k, 1.0 - alpha)
    }

    /// Peaking EQ, `gain_db` at the centre frequency
    pub fn peaking(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let Rbj { cos_omega, alpha } = Rbj::new(freq, q, sample_rate);
        let k = -2.0 * cos_omega;
        Self::normalized(
            1.0 + alpha * a,
            k,
            1.0 - alpha * a,
            1.0 + alpha / a,
            k,
            1.0 - alpha / a,
        )
    }

    /// Unity gain, no filtering
    pub fn bypass() -> Self {
        Self {
            b0: 1.0,
            ..Self::default()
        }
    }

    /// Magnitude response at `freq`
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }
}

/// Transposed Direct Form II biquad filter
#[derive(Debug, Clone)]
pub struct BiquadTDF2 {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl BiquadTDF2 {
    pub fn new() -> Self {
        Self::with_coeffs(BiquadCoeffs::bypass())
    }

    pub fn with_coeffs(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Swap coefficients, keeping state
    #[inline]
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Clear filter memory
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.z1 == 0.0 && self.z2 == 0.0
    }
}

impl Default for BiquadTDF2 {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoProcessor for BiquadTDF2 {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }
}
