use crate::{
    registry::{Rank, RequestRegistry},
    state::GrantState,
};

/// Combinational outputs for one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorOutput {
    /// `grants[i]` is the grant line of rank `i + 1`.
    pub grants: Vec<bool>,
    /// The shared output channel.
    pub routed: u64,
}

impl SelectorOutput {
    pub fn grantee(&self) -> Option<Rank> {
        self.grants.iter().position(|&g| g).map(Rank::from_index)
    }

    pub fn asserted_count(&self) -> usize {
        self.grants.iter().filter(|&&g| g).count()
    }
}

/// Drive grant lines and the routed output from the register value entering this tick.
///
/// Only the register holder can be granted, and only while its own line is high,
/// so a holder that drops its request is blanked within the same tick. While
/// `reset` is asserted nothing is granted.
pub fn select(state: &GrantState, reset: bool, registry: &RequestRegistry) -> SelectorOutput {
    let holder = if reset {
        None
    } else {
        state.granted().filter(|&r| registry.request(Some(r)))
    };

    let grants = (0..registry.len())
        .map(|idx| holder.map_or(false, |r| r.index() == idx))
        .collect();

    let routed = holder.map_or(registry.idle_value(), |r| registry.data(r));

    SelectorOutput { grants, routed }
}
