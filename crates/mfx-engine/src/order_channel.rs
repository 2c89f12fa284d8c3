//! Latest-wins SPSC channel for small value snapshots
//!
//! Values cross as packed `u64` words, so every slot is read and written
//! with a single atomic operation and a reader can never observe half of an
//! update. When the ring is full the producer discards the oldest unread
//! entry instead of failing: the consumer only ever cares about the newest
//! value, and the producer must never block.
//!
//! Head and tail are monotonic counters. The producer is the only writer of
//! `head`; both sides advance `tail`, always by compare-and-swap, so a
//! producer overwrite and a consumer read of the same slot can never both
//! succeed.

use crossbeam_utils::CachePadded;
use mfx_core::{EffectKind, EffectOrder};
use portable_atomic::{AtomicU64, Ordering};
use std::marker::PhantomData;
use std::sync::Arc;

// ============ Word Packing ============

/// A value that fits in one `u64`
pub trait SlotWord: Copy + Send {
    fn to_word(self) -> u64;

    /// `None` for words that do not decode to a valid value
    fn from_word(word: u64) -> Option<Self>;
}

impl SlotWord for u64 {
    #[inline]
    fn to_word(self) -> u64 {
        self
    }

    #[inline]
    fn from_word(word: u64) -> Option<Self> {
        Some(word)
    }
}

const KIND_BITS: u32 = 3;
const KIND_MASK: u64 = (1 << KIND_BITS) - 1;

impl SlotWord for EffectOrder {
    /// Three bits per slot, slot 0 in the lowest bits
    #[inline]
    fn to_word(self) -> u64 {
        self.iter()
            .enumerate()
            .fold(0, |word, (slot, kind)| word | (kind.index() as u64) << (KIND_BITS * slot as u32))
    }

    #[inline]
    fn from_word(word: u64) -> Option<Self> {
        if word >> (KIND_BITS * EffectKind::COUNT as u32) != 0 {
            return None;
        }

        let mut kinds = EffectKind::ALL;
        for (slot, kind) in kinds.iter_mut().enumerate() {
            let tag = (word >> (KIND_BITS * slot as u32)) & KIND_MASK;
            *kind = EffectKind::from_index(tag as usize)?;
        }
        EffectOrder::new(kinds).ok()
    }
}

// ============ Channel ============

struct Shared {
    slots: Box<[AtomicU64]>,
    /// Next index the producer writes
    head: CachePadded<AtomicU64>,
    /// Next index the consumer reads
    tail: CachePadded<AtomicU64>,
}

impl Shared {
    #[inline]
    fn slot(&self, index: u64) -> &AtomicU64 {
        &self.slots[(index % self.slots.len() as u64) as usize]
    }
}

/// Create a channel holding up to `capacity` pending values (minimum 1)
pub fn order_channel<T: SlotWord>(capacity: usize) -> (OrderSender<T>, OrderReceiver<T>) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        slots: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
        head: CachePadded::new(AtomicU64::new(0)),
        tail: CachePadded::new(AtomicU64::new(0)),
    });

    (
        OrderSender {
            shared: Arc::clone(&shared),
            dropped: 0,
            _marker: PhantomData,
        },
        OrderReceiver {
            shared,
            _marker: PhantomData,
        },
    )
}

/// Producing end. Not `Clone`: there is exactly one producer.
pub struct OrderSender<T: SlotWord> {
    shared: Arc<Shared>,
    dropped: u64,
    _marker: PhantomData<fn(T)>,
}

impl<T: SlotWord> OrderSender<T> {
    /// Queue a value without blocking. A full channel loses its oldest entry.
    pub fn push(&mut self, value: T) {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= shared.slots.len() as u64 {
            // A failed exchange means the consumer just freed a slot
            if shared
                .tail
                .compare_exchange(tail, tail + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.dropped += 1;
            }
        }

        shared.slot(head).store(value.to_word(), Ordering::Release);
        shared.head.store(head + 1, Ordering::Release);
    }

    /// Entries discarded because the channel was full
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }
}

/// Consuming end. Not `Clone`: there is exactly one consumer.
pub struct OrderReceiver<T: SlotWord> {
    shared: Arc<Shared>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SlotWord> OrderReceiver<T> {
    /// Oldest pending value, or `None` when nothing is pending
    pub fn try_pop(&mut self) -> Option<T> {
        let shared = &*self.shared;
        loop {
            let tail = shared.tail.load(Ordering::Acquire);
            let head = shared.head.load(Ordering::Acquire);
            if tail == head {
                return None;
            }

            let word = shared.slot(tail).load(Ordering::Acquire);
            if shared
                .tail
                .compare_exchange(tail, tail + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // The producer dropped this entry (and may have reused the slot)
                continue;
            }

            match T::from_word(word) {
                Some(value) => return Some(value),
                None => continue,
            }
        }
    }

    /// Pop everything pending and keep only the newest value
    pub fn drain_latest(&mut self) -> Option<T> {
        let mut latest = None;
        while let Some(value) = self.try_pop() {
            latest = Some(value);
        }
        latest
    }

    /// Values currently pending
    pub fn len(&self) -> usize {
        let tail = self.shared.tail.load(Ordering::Acquire);
        let head = self.shared.head.load(Ordering::Acquire);
        head.saturating_sub(tail) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
