//! Level analysis

use mfx_core::Sample;

/// RMS level of one block (0.0 for an empty block)
#[inline]
pub fn block_rms(block: &[Sample]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = block.iter().map(|&x| x * x).sum();
    (sum_squares / block.len() as f64).sqrt()
}
