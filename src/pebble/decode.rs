//! Decode a satisfying pebble trajectory into a schedule.
//!
//! The model gives, for every step, which gates are pebbled. Diffing two
//! adjacent steps yields the gates toggled between them; each toggle becomes
//! one action. The move clauses guarantee that the children of any toggled
//! gate are pebbled on both sides of the step, so toggles within one step
//! never depend on each other. Removals are still emitted before placements:
//! this keeps the intermediate ancilla occupancy within the budget even in
//! the middle of a step.

use crate::network::Network;
use crate::schedule::{Schedule, ScheduleBuilder};

/// Turn the pebble matrix (`values[s][i]` = pebble on gate `i` at step `s`)
/// into an ordered action sequence. With `try_inplace`, XOR-like gates
/// overwrite their single-fanout children instead of taking fresh ancillae.
pub(crate) fn extract<N: Network>(
    net: &N,
    values: &[Vec<bool>],
    try_inplace: bool,
) -> Schedule<N::Node> {
    let mut builder = ScheduleBuilder::new(net, try_inplace);
    let nr_gates = builder.num_gates();

    for s in 1..values.len() {
        for i in 0..nr_gates {
            if values[s - 1][i] && !values[s][i] {
                builder.uncompute(i);
            }
        }
        for i in 0..nr_gates {
            if !values[s - 1][i] && values[s][i] {
                builder.compute(i);
            }
        }
    }

    builder.finish()
}
