//! Schedules: ordered sequences of reversible compute/uncompute actions.
//!
//! A [`Schedule`] is what the scheduler hands to a downstream circuit
//! emitter: for each step, which gate is (un)computed and whether it happens
//! on a fresh ancilla or in place of a single-fanout XOR operand. Actions are
//! plain value types in a contiguous sequence, consumers dispatch by case
//! analysis.
//!
//! The module also owns the abstract reversible machine: [`ScheduleBuilder`]
//! tracks which gate values are materialized while actions are emitted (both
//! the SAT decoder and the Bennett strategies go through it), and
//! [`verify_schedule`] replays a finished schedule from scratch to check that
//! every action is executable and that the machine ends with exactly the
//! primary outputs materialized.

use std::collections::{HashMap, HashSet};

use crate::function::TruthTable;
use crate::network::Network;
use crate::pebble::{PebbleError, Result};

/// One reversible operation applied to a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Place the gate's value on a clean ancilla.
    Compute,
    /// Return the ancilla holding the gate's value to the clean state.
    Uncompute,
    /// Place the gate's value by XOR-ing its remaining operands into the
    /// ancilla currently holding the value of the gate with index `target`
    /// (the target's value is consumed, the ancilla now holds this gate).
    ComputeInplace { target: usize },
    /// Inverse of [`Action::ComputeInplace`]: XOR the remaining operands into
    /// the ancilla holding this gate's value, re-materializing the gate with
    /// index `target`.
    UncomputeInplace { target: usize },
}

/// A node together with the action applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<N> {
    pub node: N,
    pub action: Action,
}

/// The ordered action sequence realizing a pebble trajectory.
pub type Schedule<N> = Vec<Step<N>>;

/// Emits actions while tracking the machine state.
///
/// The builder knows, at every point of the emitted prefix, which gate values
/// are live on an ancilla, which values were displaced by an in-place compute,
/// and which gate sits on which displaced slot. In-place classification
/// consults this state, so the emitted stream is always executable:
/// - an in-place compute consumes its target, and the target's own later
///   uncompute is absorbed (nothing is emitted for it)
/// - an in-place computed gate is normally uncomputed in place, which
///   re-materializes the target
/// - if the target was independently recomputed in the meantime, the gate
///   falls back to a plain uncompute (its ancilla genuinely holds the gate).
pub(crate) struct ScheduleBuilder<'a, N: Network> {
    net: &'a N,
    index_of: HashMap<N::Node, usize>,
    node_of: Vec<N::Node>,
    /// Gate indices whose value is currently materialized on an ancilla.
    live: HashSet<usize>,
    /// Gate indices whose value was consumed by an in-place compute while the
    /// trajectory still considers them pebbled.
    displaced: HashSet<usize>,
    /// For an in-place computed gate, the target it overwrote.
    inplace_of: HashMap<usize, usize>,
    peak: usize,
    try_inplace: bool,
    steps: Schedule<N::Node>,
}

impl<'a, N: Network> ScheduleBuilder<'a, N> {
    pub fn new(net: &'a N, try_inplace: bool) -> Self {
        let mut index_of = HashMap::new();
        let mut node_of = Vec::new();
        net.foreach_gate(|node, index| {
            index_of.insert(node, index);
            node_of.push(node);
        });
        ScheduleBuilder {
            net,
            index_of,
            node_of,
            live: HashSet::new(),
            displaced: HashSet::new(),
            inplace_of: HashMap::new(),
            peak: 0,
            try_inplace,
            steps: Vec::new(),
        }
    }

    pub fn num_gates(&self) -> usize {
        self.node_of.len()
    }

    /// The in-place target for computing gate `index`, if any: the gate must
    /// be XOR-like (its function equals parity over its fanins), and the
    /// target is its first single-fanout gate child whose value is live.
    fn inplace_target(&self, index: usize) -> Option<usize> {
        if !self.try_inplace {
            return None;
        }
        let node = self.node_of[index];
        let function = self.net.node_function(node);
        if function != TruthTable::parity(function.num_vars()) {
            return None;
        }
        let mut target = None;
        self.net.foreach_fanin(node, |signal| {
            if target.is_some() {
                return;
            }
            let child = self.net.get_node(signal);
            if self.net.is_pi(child) || self.net.is_constant(child) {
                return;
            }
            if self.net.fanout_size(child) != 1 {
                return;
            }
            let child_index = self.index_of[&child];
            if self.live.contains(&child_index) {
                target = Some(child_index);
            }
        });
        target
    }

    /// Place a pebble on gate `index`.
    pub fn compute(&mut self, index: usize) {
        let action = match self.inplace_target(index) {
            Some(target) => {
                self.live.remove(&target);
                self.displaced.insert(target);
                self.inplace_of.insert(index, target);
                Action::ComputeInplace { target }
            }
            None => Action::Compute,
        };
        self.live.insert(index);
        self.peak = self.peak.max(self.live.len());
        self.steps.push(Step {
            node: self.node_of[index],
            action,
        });
    }

    /// Remove the pebble from gate `index`.
    pub fn uncompute(&mut self, index: usize) {
        if self.displaced.remove(&index) {
            // The value was already consumed by an in-place parent, the
            // trajectory-level removal costs nothing here.
            return;
        }
        if let Some(target) = self.inplace_of.remove(&index) {
            if !self.live.contains(&target) {
                self.displaced.remove(&target);
                self.live.remove(&index);
                self.live.insert(target);
                self.steps.push(Step {
                    node: self.node_of[index],
                    action: Action::UncomputeInplace { target },
                });
                return;
            }
            // The target was recomputed on a fresh ancilla in the meantime,
            // so this ancilla genuinely holds the gate: fall through.
        }
        self.live.remove(&index);
        self.steps.push(Step {
            node: self.node_of[index],
            action: Action::Uncompute,
        });
    }

    /// Highest number of simultaneously occupied ancillae seen so far.
    pub fn peak_live(&self) -> usize {
        self.peak
    }

    pub fn finish(self) -> Schedule<N::Node> {
        self.steps
    }
}

/// Replay a schedule on the abstract reversible machine and check it.
///
/// Verified properties:
/// - every action only reads materialized values (all gate children live,
///   modulo the in-place target bookkeeping)
/// - in-place actions only happen on XOR-like gates targeting one of their
///   children
/// - no double compute, no uncompute of a clean gate
/// - the machine ends with exactly the primary-output gates materialized.
///
/// Returns the peak number of simultaneously occupied ancillae (the
/// required-ancillae count of the schedule).
pub fn verify_schedule<N: Network>(net: &N, schedule: &[Step<N::Node>]) -> Result<u32> {
    let mut index_of = HashMap::new();
    let mut node_of = Vec::new();
    net.foreach_gate(|node, index| {
        index_of.insert(node, index);
        node_of.push(node);
    });

    let invariant = |message: String| PebbleError::Invariant(message);

    let mut live: HashSet<usize> = HashSet::new();
    let mut peak = 0usize;

    for (position, step) in schedule.iter().enumerate() {
        let index = *index_of
            .get(&step.node)
            .ok_or_else(|| invariant(format!("action {} applies to a non-gate node", position)))?;

        // Gate children whose value the action reads. The in-place target is
        // checked separately: a compute reads it as the rewritten ancilla, an
        // uncompute re-creates it.
        let excluded = match step.action {
            Action::UncomputeInplace { target } => Some(target),
            _ => None,
        };
        let node = node_of[index];
        let mut children = Vec::new();
        net.foreach_fanin(node, |signal| {
            let child = net.get_node(signal);
            if !net.is_pi(child) && !net.is_constant(child) {
                children.push(index_of[&child]);
            }
        });
        for &child in &children {
            if Some(child) != excluded && !live.contains(&child) {
                return Err(invariant(format!(
                    "action {} on gate {} reads gate {} which is not materialized",
                    position, index, child
                )));
            }
        }

        match step.action {
            Action::Compute => {
                if !live.insert(index) {
                    return Err(invariant(format!("gate {} computed twice", index)));
                }
            }
            Action::Uncompute => {
                if !live.remove(&index) {
                    return Err(invariant(format!("gate {} uncomputed while clean", index)));
                }
            }
            Action::ComputeInplace { target } | Action::UncomputeInplace { target } => {
                let function = net.node_function(node);
                if function != TruthTable::parity(function.num_vars()) {
                    return Err(invariant(format!(
                        "in-place action on gate {} which is not XOR-like",
                        index
                    )));
                }
                if !children.contains(&target) {
                    return Err(invariant(format!(
                        "in-place target {} is not a child of gate {}",
                        target, index
                    )));
                }
                match step.action {
                    Action::ComputeInplace { .. } => {
                        if !live.remove(&target) {
                            return Err(invariant(format!(
                                "in-place compute of gate {} consumes clean gate {}",
                                index, target
                            )));
                        }
                        if !live.insert(index) {
                            return Err(invariant(format!("gate {} computed twice", index)));
                        }
                    }
                    Action::UncomputeInplace { .. } => {
                        if !live.remove(&index) {
                            return Err(invariant(format!(
                                "gate {} uncomputed while clean",
                                index
                            )));
                        }
                        if !live.insert(target) {
                            return Err(invariant(format!(
                                "in-place uncompute of gate {} re-materializes live gate {}",
                                index, target
                            )));
                        }
                    }
                    _ => unreachable!(),
                }
            }
        }
        peak = peak.max(live.len());
    }

    let mut po = HashSet::new();
    net.foreach_po(|signal| {
        let node = net.get_node(signal);
        if !net.is_pi(node) && !net.is_constant(node) {
            po.insert(index_of[&node]);
        }
    });
    if live != po {
        return Err(invariant(format!(
            "schedule ends with gates {:?} materialized, outputs are {:?}",
            live, po
        )));
    }

    Ok(peak as u32)
}
