use crate::registry::{Rank, RequestRegistry};

/// Highest-priority asserted request line, or `None` when every line is low.
///
/// Scans from rank 1 upward and stops at the first asserted line, so ties cannot occur.
#[inline]
pub fn highest_priority_pending(registry: &RequestRegistry) -> Option<Rank> {
    registry.lines().position(|req| req).map(Rank::from_index)
}

/// Number of asserted request lines this tick.
#[inline]
pub fn pending_count(registry: &RequestRegistry) -> usize {
    registry.lines().filter(|&req| req).count()
}
