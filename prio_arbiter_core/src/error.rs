use thiserror::Error;

/// Construction-time and interface-contract violations.
///
/// The arbiter has no recoverable runtime errors: a value of this type means the
/// arbiter was misconstructed or fed inputs that break the one-line-per-slot contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArbiterError {
    #[error("an arbiter needs at least one requestor slot")]
    NoSlots,

    #[error("payload width must be within 1..=64 bits, got {bits}")]
    DataWidth { bits: u32 },

    #[error("rank {rank} is outside 1..={slots}")]
    RankOutOfRange { rank: usize, slots: usize },

    #[error("expected {expected} requestor slots, got {got}")]
    SlotCountMismatch { expected: usize, got: usize },
}
