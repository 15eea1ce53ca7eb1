//! Outside-world adapter: turn request events into level-signaled lines.
//!
//! Requestors assert and release whenever they like; a `LineLatch` remembers the
//! current level of every line so the arbiter can sample all of them once per tick.

use std::borrow::Cow;

use prio_arbiter_core::{ArbiterCfg, ArbiterError, Rank, RequestRegistry, SlotInput};

/// What happened on one channel's lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Raise the request line of `rank` and offer `data`.
    Assert { rank: usize, data: u64 },
    /// Drop the request line of `rank`.
    Release { rank: usize },
    /// Change the payload of `rank` without touching its request line.
    Data { rank: usize, data: u64 },
    /// Drive the channel's reset input.
    Reset(bool),
}

/// A raw event addressed to one arbiter channel.
#[derive(Clone, Debug)]
pub struct RequestEvent<'a> {
    pub channel_id: Cow<'a, str>,
    pub kind: RequestKind,
}

impl<'a> RequestEvent<'a> {
    pub fn new(channel_id: impl Into<Cow<'a, str>>, kind: RequestKind) -> Self {
        Self {
            channel_id: channel_id.into(),
            kind,
        }
    }

    pub fn assert(channel_id: impl Into<Cow<'a, str>>, rank: usize, data: u64) -> Self {
        Self::new(channel_id, RequestKind::Assert { rank, data })
    }

    pub fn release(channel_id: impl Into<Cow<'a, str>>, rank: usize) -> Self {
        Self::new(channel_id, RequestKind::Release { rank })
    }

    pub fn data(channel_id: impl Into<Cow<'a, str>>, rank: usize, data: u64) -> Self {
        Self::new(channel_id, RequestKind::Data { rank, data })
    }

    pub fn reset(channel_id: impl Into<Cow<'a, str>>, active: bool) -> Self {
        Self::new(channel_id, RequestKind::Reset(active))
    }
}

/// Current level of every line of one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineLatch {
    lines: Vec<SlotInput>,
    reset: bool,
}

impl LineLatch {
    /// All lines low, reset released.
    pub fn new(cfg: &ArbiterCfg) -> Self {
        Self {
            lines: vec![SlotInput::idle(); cfg.slots],
            reset: false,
        }
    }

    /// Apply one event. Ranks outside the channel are refused and leave the latch untouched.
    pub fn apply(&mut self, kind: RequestKind) -> Result<(), ArbiterError> {
        match kind {
            RequestKind::Assert { rank, data } => {
                let slot = self.slot_mut(rank)?;
                slot.request = true;
                slot.data = data;
            }
            RequestKind::Release { rank } => {
                self.slot_mut(rank)?.request = false;
            }
            RequestKind::Data { rank, data } => {
                self.slot_mut(rank)?.data = data;
            }
            RequestKind::Reset(active) => {
                self.reset = active;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn reset_active(&self) -> bool {
        self.reset
    }

    pub fn lines(&self) -> &[SlotInput] {
        &self.lines
    }

    /// Sample the latched lines for this tick.
    pub fn sample(&self, cfg: &ArbiterCfg) -> Result<RequestRegistry, ArbiterError> {
        RequestRegistry::sample(cfg, &self.lines)
    }

    fn slot_mut(&mut self, rank: usize) -> Result<&mut SlotInput, ArbiterError> {
        let rank = Rank::new(rank, self.lines.len())?;
        Ok(&mut self.lines[rank.index()])
    }
}
