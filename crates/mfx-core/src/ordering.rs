//! Effect processing order
//!
//! An `EffectOrder` is always a permutation of every `EffectKind`. The
//! constructors validate; there is no way to build a partial order.

use serde::{Deserialize, Serialize};

use crate::{EffectKind, OrderError};

/// Processing order of the chain, slot 0 first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct EffectOrder([EffectKind; EffectKind::COUNT]);

impl EffectOrder {
    /// Kinds in declaration order
    pub const fn identity() -> Self {
        Self(EffectKind::ALL)
    }

    /// Build an order, rejecting repeated kinds
    pub fn new(kinds: [EffectKind; EffectKind::COUNT]) -> Result<Self, OrderError> {
        let mut seen = [false; EffectKind::COUNT];
        for kind in kinds {
            if std::mem::replace(&mut seen[kind.index()], true) {
                return Err(OrderError::DuplicateKind(kind));
            }
        }
        Ok(Self(kinds))
    }

    #[inline]
    pub fn kinds(&self) -> &[EffectKind; EffectKind::COUNT] {
        &self.0
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<EffectKind> {
        self.0.get(index).copied()
    }

    pub fn position_of(&self, kind: EffectKind) -> usize {
        // Every kind is present exactly once
        self.0.iter().position(|&k| k == kind).unwrap_or(kind.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.0.iter().copied()
    }

    /// Order with the kinds in slots `a` and `b` exchanged
    pub fn with_swapped(mut self, a: usize, b: usize) -> Self {
        if a < EffectKind::COUNT && b < EffectKind::COUNT {
            self.0.swap(a, b);
        }
        self
    }

    /// Order with `kind` moved to `to_slot`, shifting the kinds in between
    pub fn with_moved(mut self, kind: EffectKind, to_slot: usize) -> Self {
        let to_slot = to_slot.min(EffectKind::COUNT - 1);
        let from = self.position_of(kind);
        if from < to_slot {
            self.0[from..=to_slot].rotate_left(1);
        } else {
            self.0[to_slot..=from].rotate_right(1);
        }
        self
    }

    // ============ Persisted Payload ============

    /// Integer kind tags in slot order
    pub fn to_payload(&self) -> [i64; EffectKind::COUNT] {
        self.0.map(|kind| kind.index() as i64)
    }

    /// Parse a persisted payload, rejecting anything that is not a permutation
    pub fn from_payload(payload: &[i64]) -> Result<Self, OrderError> {
        if payload.len() != EffectKind::COUNT {
            return Err(OrderError::WrongLength {
                expected: EffectKind::COUNT,
                actual: payload.len(),
            });
        }

        let mut kinds = EffectKind::ALL;
        for (slot, &tag) in kinds.iter_mut().zip(payload) {
            *slot = EffectKind::try_from(tag)?;
        }
        Self::new(kinds)
    }

    /// Parse a persisted payload, recovering to the identity order on failure
    pub fn from_payload_or_identity(payload: &[i64]) -> Self {
        match Self::from_payload(payload) {
            Ok(order) => order,
            Err(e) => {
                log::warn!("Discarding persisted effect order ({e}), using identity order");
                Self::identity()
            }
        }
    }
}

impl Default for EffectOrder {
    fn default() -> Self {
        Self::identity()
    }
}

impl TryFrom<Vec<i64>> for EffectOrder {
    type Error = OrderError;

    fn try_from(payload: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_payload(&payload)
    }
}

impl From<EffectOrder> for Vec<i64> {
    fn from(order: EffectOrder) -> Self {
        order.to_payload().to_vec()
    }
}

impl std::fmt::Display for EffectOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" → ")?;
            }
            f.write_str(kind.name())?;
        }
        Ok(())
    }
}
