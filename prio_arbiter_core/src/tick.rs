use crate::{
    registry::{Rank, RequestRegistry},
    resolve::highest_priority_pending,
    select::select,
    state::GrantState,
};

/// Everything an arbiter drives or decides during one tick.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TickOutputs {
    /// `grants[i]` is the grant line of rank `i + 1`.
    pub grants: Vec<bool>,
    pub routed: u64,
    /// Register value entering the tick (what the outputs were driven from).
    pub granted: Option<Rank>,
    /// Register value after the tick boundary.
    pub next: Option<Rank>,
    pub highest_pending: Option<Rank>,
}

impl TickOutputs {
    #[inline]
    pub fn grant(&self, rank: Rank) -> bool {
        self.grants.get(rank.index()).copied().unwrap_or(false)
    }

    pub fn grantee(&self) -> Option<Rank> {
        self.grants.iter().position(|&g| g).map(Rank::from_index)
    }

    /// True when the register changes at this tick's boundary.
    #[inline]
    pub fn changed(&self) -> bool {
        self.granted != self.next
    }
}

/// One arbiter tick as a pure function of the entering register and the sampled lines.
///
/// Outputs are read from `state` as it stands entering the tick; the returned
/// register is the value decided for the next tick.
pub fn step(state: GrantState, reset: bool, registry: &RequestRegistry) -> (GrantState, TickOutputs) {
    let out = select(&state, reset, registry);
    let highest_pending = highest_priority_pending(registry);
    let next = state.next(reset, registry);

    let outputs = TickOutputs {
        grants: out.grants,
        routed: out.routed,
        granted: state.granted(),
        next: next.granted(),
        highest_pending,
    };
    (next, outputs)
}

/// In-place form of [`step`].
pub fn arbiter_tick(reset: bool, registry: &RequestRegistry, state: &mut GrantState) -> TickOutputs {
    let (next, outputs) = step(*state, reset, registry);

    log::trace!(
        "tick: reset={} granted={:?} pending={:?}",
        reset,
        outputs.granted,
        outputs.highest_pending
    );
    if outputs.changed() {
        log::debug!("grant register {:?} -> {:?}", outputs.granted, outputs.next);
    }

    *state = next;
    outputs
}
