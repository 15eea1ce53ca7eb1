use crate::{
    cfg::ArbiterCfg,
    error::ArbiterError,
    registry::{Rank, RequestRegistry},
    resolve::highest_priority_pending,
};

/// The grant register: the only persistent state of an arbiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GrantState {
    granted: Option<Rank>,
}

impl GrantState {
    /// Register holding `rank`. Used when restoring a saved register.
    pub fn held(rank: Rank) -> Self {
        Self { granted: Some(rank) }
    }

    #[inline]
    pub fn granted(&self) -> Option<Rank> {
        self.granted
    }

    /// Value the register takes at the next tick boundary.
    ///
    /// Reset wins. Otherwise the incumbent holds while its own line stays high;
    /// an empty register or a lapsed incumbent re-arbitrates by priority.
    pub fn next(&self, reset: bool, registry: &RequestRegistry) -> GrantState {
        if reset {
            return GrantState::default();
        }
        if registry.request(self.granted) {
            return *self;
        }
        GrantState {
            granted: highest_priority_pending(registry),
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.granted = None;
    }

    /// Verify the held rank names a slot of an arbiter shaped by `cfg`.
    pub fn check(&self, cfg: &ArbiterCfg) -> Result<(), ArbiterError> {
        match self.granted {
            Some(r) if r.get() > cfg.slots => Err(ArbiterError::RankOutOfRange {
                rank: r.get(),
                slots: cfg.slots,
            }),
            _ => Ok(()),
        }
    }
}
