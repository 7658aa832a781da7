//! Reversible pebble-game scheduling of logic networks.
//!
//! Quantum circuit synthesis from a classical combinational network has to
//! decide *when* each gate's value lives on an ancilla qubit: a value must be
//! materialized before any gate reading it is computed or uncomputed, every
//! ancilla must be returned to its clean state, and only a bounded number of
//! ancillae exist. This is exactly the reversible pebble game on the gate
//! DAG. The crate encodes the game as a sequence of incremental SAT
//! instances, grows the number of time steps until a trajectory exists, and
//! decodes the satisfying assignment into an ordered [`Schedule`] of
//! compute/uncompute actions a downstream circuit emitter can consume.
//!
//! The scheduler is generic over two traits:
//! - [`Network`], a read-only view of the combinational DAG (the crate ships
//!   [`LogicNetwork`], and any AIG/XAG-style type can implement it)
//! - [`SatSolver`], a minimal incremental CDCL interface (the crate ships a
//!   [varisat](https://docs.rs/varisat) backend).
//!
//! ```rust
//! use qpebble::function::TruthTable;
//! use qpebble::network::{LogicNetwork, NetEdge, NetNode};
//! use qpebble::pebble::PebblingConfig;
//! use qpebble::strategy::{schedule_network, QubitMapping};
//!
//! // g3 = i1 & i2, g4 = g3 & i1; output g4.
//! let mut net = LogicNetwork::new();
//! let i1 = net.add_node(NetNode::Input(1)).unwrap();
//! let i2 = net.add_node(NetNode::Input(2)).unwrap();
//! let g3 = net
//!     .new_gate(
//!         3,
//!         vec![NetEdge::new(i1.clone(), false), NetEdge::new(i2, false)],
//!         TruthTable::conjunction(2),
//!     )
//!     .unwrap();
//! net.new_gate(
//!     4,
//!     vec![NetEdge::new(g3, false), NetEdge::new(i1, false)],
//!     TruthTable::conjunction(2),
//! )
//! .unwrap();
//! net.add_output(4, false).unwrap();
//! net.update();
//!
//! let (schedule, stats) =
//!     schedule_network(&net, QubitMapping::Pebbling, &PebblingConfig::default()).unwrap();
//! assert!(stats.success);
//! assert_eq!(schedule.len(), 3); // compute g3, compute g4, uncompute g3
//! ```

pub mod function;
pub mod network;
pub mod pebble;
pub mod sat;
pub mod schedule;
pub mod strategy;

pub use function::TruthTable;
pub use network::{LogicNetwork, NetEdge, NetNode, Network, NetworkError, NodeId};
pub use pebble::{
    pebble_schedule, PebbleError, PebbleManager, PebbleSolver, PebblingConfig, PebblingStats,
};
pub use sat::{Lit, SatSolver, SolveResult, VarisatSolver};
pub use schedule::{verify_schedule, Action, Schedule, Step};
pub use strategy::{bennett, bennett_inplace, schedule_network, QubitMapping};
