//! Post-chain sample tap for spectrum analysis
//!
//! The audio thread copies each processed stereo block into a pair of rtrb
//! rings; the UI drains them at its own pace. Frames that do not fit are
//! counted and discarded, never waited on.

use mfx_core::Sample;
use portable_atomic::{AtomicU64, Ordering};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::Arc;

/// Create a tap buffering up to `capacity` frames per channel (0 disables it)
pub fn analyzer_tap(capacity: usize) -> (AnalyzerWriter, AnalyzerReader) {
    let overflow = Arc::new(AtomicU64::new(0));

    if capacity == 0 {
        return (
            AnalyzerWriter {
                rings: None,
                overflow: Arc::clone(&overflow),
            },
            AnalyzerReader {
                rings: None,
                overflow,
            },
        );
    }

    let (left_tx, left_rx) = RingBuffer::<f32>::new(capacity);
    let (right_tx, right_rx) = RingBuffer::<f32>::new(capacity);
    (
        AnalyzerWriter {
            rings: Some((left_tx, right_tx)),
            overflow: Arc::clone(&overflow),
        },
        AnalyzerReader {
            rings: Some((left_rx, right_rx)),
            overflow,
        },
    )
}

/// Audio-thread end
pub struct AnalyzerWriter {
    rings: Option<(Producer<f32>, Producer<f32>)>,
    overflow: Arc<AtomicU64>,
}

impl AnalyzerWriter {
    /// Copy as many frames as fit; the rest count as overflow
    pub fn push_block(&mut self, left: &[Sample], right: &[Sample]) {
        let Some((left_tx, right_tx)) = self.rings.as_mut() else {
            return;
        };

        let frames = left.len().min(right.len());
        let fit = frames.min(left_tx.slots()).min(right_tx.slots());

        for (&l, &r) in left[..fit].iter().zip(&right[..fit]) {
            // Slots were counted above; a failed push cannot happen
            let _ = left_tx.push(l as f32);
            let _ = right_tx.push(r as f32);
        }

        if fit < frames {
            self.overflow.fetch_add((frames - fit) as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.rings.is_some()
    }
}

/// UI end
pub struct AnalyzerReader {
    rings: Option<(Consumer<f32>, Consumer<f32>)>,
    overflow: Arc<AtomicU64>,
}

impl AnalyzerReader {
    /// Drain up to `min(left_out.len(), right_out.len())` frames; returns frames read
    pub fn read(&mut self, left_out: &mut [f32], right_out: &mut [f32]) -> usize {
        let Some((left_rx, right_rx)) = self.rings.as_mut() else {
            return 0;
        };

        let frames = left_out
            .len()
            .min(right_out.len())
            .min(left_rx.slots())
            .min(right_rx.slots());

        for (l, r) in left_out[..frames].iter_mut().zip(&mut right_out[..frames]) {
            *l = left_rx.pop().unwrap_or(0.0);
            *r = right_rx.pop().unwrap_or(0.0);
        }
        frames
    }

    /// Frames waiting to be read
    pub fn available(&self) -> usize {
        self.rings
            .as_ref()
            .map_or(0, |(l, r)| l.slots().min(r.slots()))
    }

    /// Frames dropped because the UI fell behind
    pub fn overflow_count(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.rings.is_some()
    }
}
