//! prio_arbiter_supervisor
//!
//! Orchestration layer around `prio_arbiter_core`.
//!
//! Responsibilities:
//! - own one grant register and one set of latched request lines per channel
//! - shard channels by `channel_id` (deterministic)
//! - turn outside-world request events into level-signaled lines
//! - tick every channel through the core step function
//!
//! Non-goals:
//! - no IO
//! - no async
//! - no arbitration policy (lives in core)

pub mod adapter;
pub mod supervisor;

pub use adapter::{LineLatch, RequestEvent, RequestKind};

pub use supervisor::{
    ApplyStats,
    ArbiterSupervisor,
    RestoreStats,
    SupervisorSnapshot,
    TickAction,
};
