//! The reversible pebble-game SAT scheduler.
//!
//! Scheduling a network is a game on its gate DAG: a pebble on a gate means
//! the gate's value is materialized on an ancilla, and a pebble may only be
//! placed or removed while all the gate's children are pebbled. The game
//! starts with no pebbles and must end with pebbles exactly on the primary
//! outputs, never using more than the configured budget at once.
//!
//! The game is encoded as a sequence of incremental SAT instances over a
//! growing number of time steps ([`encoder`]), a satisfying assignment is
//! decoded into a [`Schedule`] ([`decode`]), and the whole search is driven
//! by [`manager`].
//!
//! [`Schedule`]: crate::schedule::Schedule

use std::time::Duration;

use thiserror::Error;

use crate::network::NetworkError;

pub mod encoder;
pub mod manager;

pub(crate) mod decode;

pub use encoder::PebbleSolver;
pub use manager::{pebble_schedule, PebbleManager};

/// The result of a pebbling operation.
pub type Result<T> = std::result::Result<T, PebbleError>;

/// Error returned when scheduling failed.
///
/// Note that an unsatisfiable or timed-out search is *not* an error: those
/// are expected control outcomes, reported through
/// [`PebblingStats::success`]. Errors are reserved for contract violations.
#[derive(Debug, Error)]
pub enum PebbleError {
    /// The network violates the capability contract (eg a gate's fanin
    /// refers to a gate that is never enumerated, or gates are not listed in
    /// topological order).
    #[error("bad network: {0}")]
    BadNetwork(String),

    /// Just forwarding a [`NetworkError`].
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// A schedule failed the post-decode self check. This indicates a bug in
    /// the encoding or in the backend solver, not a property of the input.
    #[error("schedule invariant violated: {0}")]
    Invariant(String),
}

/// Configuration of the pebbling search.
#[derive(Debug, Clone)]
pub struct PebblingConfig {
    /// Pebble budget. 0 means unbounded (one pebble per gate); anything above
    /// the gate count is clamped down to it.
    pub pebble_limit: u32,
    /// Conflict budget per SAT call, 0 means unbounded.
    pub conflict_limit: u32,
    /// On a timed-out SAT call, raise the budget by one pebble and restart
    /// the encoding from scratch.
    pub increment_on_timeout: bool,
    /// After a successful search, retry with one pebble less and keep the
    /// tightest schedule found.
    pub decrement_on_success: bool,
    /// Emit per-step progress events.
    pub progress: bool,
    /// Emit diagnostic trace events.
    pub verbose: bool,
}

impl Default for PebblingConfig {
    fn default() -> Self {
        PebblingConfig {
            pebble_limit: 0,
            conflict_limit: 0,
            increment_on_timeout: false,
            decrement_on_success: false,
            progress: false,
            verbose: false,
        }
    }
}

/// Statistics of one scheduling run.
#[derive(Debug, Clone)]
pub struct PebblingStats {
    /// False when the search was abandoned (conflict budget exhausted with no
    /// adaptive policy left, or no schedule within the internal step cap).
    pub success: bool,
    /// Final number of time steps of the solved encoding.
    pub steps: u32,
    /// Final pebble budget.
    pub pebbles: u32,
    /// Peak number of simultaneously occupied ancillae in the schedule.
    pub required_ancillae: u32,
    /// Total wall time of the search.
    pub time_total: Duration,
}
