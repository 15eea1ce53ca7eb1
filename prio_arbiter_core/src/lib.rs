//! Fixed-priority arbiter for a single shared output channel.
//!
//! One grant register, updated once per tick, selects which requestor's payload
//! reaches the output. Rank 1 has the highest priority, but an incumbent keeps
//! the channel for as long as it holds its request line high.

pub mod cfg;
pub mod error;
pub mod registry;
pub mod resolve;
pub mod state;
pub mod select;
pub mod tick;
pub mod arbiter;

pub use cfg::{ArbiterCfg, MAX_DATA_WIDTH};
pub use error::ArbiterError;
pub use registry::{Rank, RequestRegistry, SlotInput};
pub use resolve::{highest_priority_pending, pending_count};
pub use state::GrantState;
pub use select::{select, SelectorOutput};
pub use tick::{arbiter_tick, step, TickOutputs};
pub use arbiter::Arbiter;
