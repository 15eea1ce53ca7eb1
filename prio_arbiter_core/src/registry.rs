use std::fmt;
use std::num::NonZeroUsize;

use crate::{cfg::ArbiterCfg, error::ArbiterError};

/// Priority rank of a requestor slot. Rank 1 is the highest priority.
///
/// A `Rank` is never zero; "no grantee" is spelled `Option::<Rank>::None`.
/// Ranks are only produced by a checked constructor or by scanning a registry,
/// so a held rank always names a real slot of the arbiter that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Rank(NonZeroUsize);

impl Rank {
    /// Checked constructor for a rank in `1..=slots`.
    pub fn new(rank: usize, slots: usize) -> Result<Self, ArbiterError> {
        if rank > slots {
            return Err(ArbiterError::RankOutOfRange { rank, slots });
        }
        NonZeroUsize::new(rank)
            .map(Rank)
            .ok_or(ArbiterError::RankOutOfRange { rank, slots })
    }

    /// Rank of the slot stored at zero-based position `idx`.
    #[inline]
    pub(crate) fn from_index(idx: usize) -> Self {
        Rank(NonZeroUsize::MIN.saturating_add(idx))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Zero-based position of this rank in a slot collection.
    #[inline]
    pub fn index(self) -> usize {
        self.0.get() - 1
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live lines of one requestor slot for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotInput {
    pub request: bool,
    /// Payload offered by the requestor. Only meaningful while `request` holds.
    pub data: u64,
}

impl SlotInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn requesting(data: u64) -> Self {
        Self { request: true, data }
    }
}

/// Snapshot of every request line, sampled once per tick.
///
/// Rank 0 is the "no request" sentinel and reads as permanently deasserted;
/// ranks `1..=N` mirror the external lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestRegistry {
    slots: Vec<SlotInput>,
    idle: u64,
}

impl RequestRegistry {
    /// Sample `lines` for an arbiter shaped by `cfg`.
    ///
    /// Payloads are truncated to the configured width, the way a narrower port would.
    pub fn sample(cfg: &ArbiterCfg, lines: &[SlotInput]) -> Result<Self, ArbiterError> {
        if lines.len() != cfg.slots {
            return Err(ArbiterError::SlotCountMismatch {
                expected: cfg.slots,
                got: lines.len(),
            });
        }
        let mask = cfg.data_mask();
        let slots = lines
            .iter()
            .map(|s| SlotInput {
                request: s.request,
                data: s.data & mask,
            })
            .collect();
        Ok(Self {
            slots,
            idle: cfg.idle_value(),
        })
    }

    /// Registry with every line deasserted.
    pub fn quiet(cfg: &ArbiterCfg) -> Self {
        Self {
            slots: vec![SlotInput::idle(); cfg.slots],
            idle: cfg.idle_value(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Request line for `rank`; `None` is the sentinel and is always false.
    #[inline]
    pub fn request(&self, rank: Option<Rank>) -> bool {
        rank.and_then(|r| self.slots.get(r.index()))
            .map_or(false, |s| s.request)
    }

    #[inline]
    pub fn data(&self, rank: Rank) -> u64 {
        self.slots.get(rank.index()).map_or(self.idle, |s| s.data)
    }

    #[inline]
    pub fn idle_value(&self) -> u64 {
        self.idle
    }

    /// Request lines in rank order, rank 1 first.
    pub fn lines(&self) -> impl Iterator<Item = bool> + '_ {
        self.slots.iter().map(|s| s.request)
    }

    pub fn slots(&self) -> &[SlotInput] {
        &self.slots
    }
}
