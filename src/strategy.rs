//! Mapping strategies: how a network becomes a reversible schedule.
//!
//! The surrounding command layer picks one of three qubit-mapping strategies:
//! - [`QubitMapping::Bennett`] computes every gate in topological order and
//!   uncomputes every non-output gate in reverse order. Always succeeds, uses
//!   one ancilla per gate at the peak.
//! - [`QubitMapping::BennettInplace`] does the same but lets XOR-like gates
//!   overwrite their single-fanout operands.
//! - [`QubitMapping::Pebbling`] runs the SAT-based pebble game search under
//!   the configured budget; it is the only strategy consulting the
//!   configuration.

use std::collections::HashSet;
use std::time::Instant;

use crate::network::Network;
use crate::pebble::{pebble_schedule, PebblingConfig, PebblingStats, Result};
use crate::schedule::{verify_schedule, Schedule, ScheduleBuilder};

/// Qubit-mapping strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QubitMapping {
    Bennett,
    BennettInplace,
    Pebbling,
}

/// Produce the reversible schedule of a network under the selected strategy.
pub fn schedule_network<N: Network>(
    net: &N,
    mapping: QubitMapping,
    config: &PebblingConfig,
) -> Result<(Schedule<N::Node>, PebblingStats)> {
    match mapping {
        QubitMapping::Bennett => bennett(net),
        QubitMapping::BennettInplace => bennett_inplace(net),
        QubitMapping::Pebbling => pebble_schedule(net, config),
    }
}

/// Compute every gate in topological order, then uncompute every non-output
/// gate in reverse order.
pub fn bennett<N: Network>(net: &N) -> Result<(Schedule<N::Node>, PebblingStats)> {
    bennett_mapping(net, false)
}

/// Like [`bennett`], with the in-place rewrite for XOR-like gates.
pub fn bennett_inplace<N: Network>(net: &N) -> Result<(Schedule<N::Node>, PebblingStats)> {
    bennett_mapping(net, true)
}

fn bennett_mapping<N: Network>(
    net: &N,
    try_inplace: bool,
) -> Result<(Schedule<N::Node>, PebblingStats)> {
    let start = Instant::now();

    let mut po_nodes = HashSet::new();
    net.foreach_po(|signal| {
        po_nodes.insert(net.get_node(signal));
    });
    let mut gates = Vec::new();
    net.foreach_gate(|node, index| gates.push((node, index)));

    let mut builder = ScheduleBuilder::new(net, try_inplace);
    for &(_, index) in &gates {
        builder.compute(index);
    }
    for &(node, index) in gates.iter().rev() {
        if !po_nodes.contains(&node) {
            builder.uncompute(index);
        }
    }

    let schedule = builder.finish();
    let required_ancillae = verify_schedule(net, &schedule)?;
    let stats = PebblingStats {
        success: true,
        // Bennett schedules have no SAT horizon, every action is its own step.
        steps: schedule.len() as u32,
        pebbles: required_ancillae,
        required_ancillae,
        time_total: start.elapsed(),
    };
    Ok((schedule, stats))
}
