//! Time-indexed SAT encoding of the pebble game.
//!
//! For a network with `G` gates and a budget of `P` pebbles, every time step
//! `s` owns `G` pebble variables plus, when `0 < P < G`, a
//! `(G - P) x P` grid of sequential-counter registers bounding the number of
//! pebbles (Sinz, 2005). All variable index arithmetic lives in
//! [`PebbleSolver::pvar`] and [`PebbleSolver::avar`]; nothing else in the
//! crate computes a variable index.

use std::collections::{HashMap, HashSet};

use crate::network::Network;
use crate::sat::{Lit, SatSolver, SolveResult, Var};
use crate::schedule::Schedule;

use super::{decode, PebbleError, Result};

/// SAT encoder and solve driver for one pebble budget.
///
/// The solver owns its SAT backend and borrows the network read-only. The
/// horizon starts at zero steps; [`add_step`] extends it by one. The goal
/// state (outputs pebbled, everything else clean) is *not* part of the clause
/// database: it is passed to every solve call as assumptions, so extending
/// the horizon never needs to retract anything.
///
/// [`add_step`]: PebbleSolver::add_step
pub struct PebbleSolver<'a, N: Network, S: SatSolver> {
    net: &'a N,
    solver: S,
    /// Effective pebble budget, in `[1, nr_gates]` (0 requested means unbounded).
    pebbles: usize,
    nr_steps: usize,
    nr_gates: usize,
    /// Gate-to-gate edges as (parent index, child index) pairs; PIs and
    /// constants impose no move constraint and are left out.
    edges: Vec<(usize, usize)>,
    is_po: Vec<bool>,
}

impl<'a, N: Network, S: SatSolver + Default> PebbleSolver<'a, N, S> {
    /// Build the gate indexation and validate the network contract.
    pub fn new(net: &'a N, pebbles: u32) -> Result<Self> {
        let nr_gates = net.num_gates();

        let mut node_of = Vec::with_capacity(nr_gates);
        let mut index_of = HashMap::with_capacity(nr_gates);
        let mut out_of_order = false;
        net.foreach_gate(|node, index| {
            if index != node_of.len() {
                out_of_order = true;
            }
            index_of.insert(node, index);
            node_of.push(node);
        });
        if out_of_order || node_of.len() != nr_gates {
            return Err(PebbleError::BadNetwork(format!(
                "foreach_gate enumerated {} gates, num_gates reports {}",
                node_of.len(),
                nr_gates
            )));
        }

        let mut edges = Vec::new();
        for (index, &node) in node_of.iter().enumerate() {
            let mut bad_child = None;
            net.foreach_fanin(node, |signal| {
                let child = net.get_node(signal);
                if net.is_pi(child) || net.is_constant(child) {
                    return;
                }
                match index_of.get(&child) {
                    Some(&child_index) if child_index < index => {
                        edges.push((index, child_index));
                    }
                    Some(_) => bad_child = Some("gates are not in topological order"),
                    None => bad_child = Some("fanin refers to a gate without an index"),
                }
            });
            if let Some(message) = bad_child {
                return Err(PebbleError::BadNetwork(format!(
                    "gate {}: {}",
                    index, message
                )));
            }
        }

        let mut po_set = HashSet::new();
        net.foreach_po(|signal| {
            let node = net.get_node(signal);
            if let Some(&index) = index_of.get(&node) {
                po_set.insert(index);
            }
        });
        let is_po = (0..nr_gates).map(|i| po_set.contains(&i)).collect();

        let pebbles = if pebbles == 0 || pebbles as usize > nr_gates {
            nr_gates
        } else {
            pebbles as usize
        };

        Ok(PebbleSolver {
            net,
            solver: S::default(),
            pebbles,
            nr_steps: 0,
            nr_gates,
            edges,
            is_po,
        })
    }
}

impl<'a, N: Network, S: SatSolver> PebbleSolver<'a, N, S> {
    pub fn nr_steps(&self) -> usize {
        self.nr_steps
    }

    pub fn pebbles(&self) -> usize {
        self.pebbles
    }

    /// Width of the per-step counter register block.
    fn aux_width(&self) -> usize {
        if self.pebbles < self.nr_gates {
            self.pebbles * (self.nr_gates - self.pebbles)
        } else {
            0
        }
    }

    /// Pebble variable of gate `i` at step `step`.
    fn pvar(&self, step: usize, i: usize) -> Var {
        step * (self.nr_gates + self.aux_width()) + i
    }

    /// Counter register `(j, k)` at step `step`: "at least `k + 1` pebbles
    /// among the gates `0 ..= j + k`".
    fn avar(&self, step: usize, j: usize, k: usize) -> Var {
        step * (self.nr_gates + self.aux_width()) + self.nr_gates + j * self.pebbles + k
    }

    /// Declare the step-0 variables and force the empty initial state.
    pub fn initialize(&mut self) {
        self.solver.set_nr_vars(self.nr_gates + self.aux_width());
        for i in 0..self.nr_gates {
            self.solver.add_clause(&[Lit::negative(self.pvar(0, i))]);
        }
    }

    /// The four clauses encoding that toggling `p` between two adjacent steps
    /// requires the child to be pebbled in both.
    fn add_edge_clause(&mut self, p: Var, p_next: Var, ch: Var, ch_next: Var) {
        self.solver
            .add_clause(&[Lit::negative(p), Lit::positive(p_next), Lit::positive(ch)]);
        self.solver
            .add_clause(&[Lit::positive(p), Lit::negative(p_next), Lit::positive(ch)]);
        self.solver
            .add_clause(&[Lit::negative(p), Lit::positive(p_next), Lit::positive(ch_next)]);
        self.solver
            .add_clause(&[Lit::positive(p), Lit::negative(p_next), Lit::positive(ch_next)]);
    }

    /// Sinz sequential counter keeping step `step` at no more than `pebbles`
    /// pebbles. Only emitted when `0 < P < G`.
    fn add_cardinality_clauses(&mut self, step: usize) {
        let rows = self.nr_gates - self.pebbles;
        let cols = self.pebbles;

        // A register implies the same register of the next row.
        for j in 0..rows.saturating_sub(1) {
            for k in 0..cols {
                self.solver.add_clause(&[
                    Lit::negative(self.avar(step, j, k)),
                    Lit::positive(self.avar(step, j + 1, k)),
                ]);
            }
        }

        for j in 0..rows {
            // A pebble starts the count of its row.
            self.solver.add_clause(&[
                Lit::negative(self.pvar(step, j)),
                Lit::positive(self.avar(step, j, 0)),
            ]);
            // A pebble on top of a count of k makes a count of k + 1.
            for k in 0..cols - 1 {
                self.solver.add_clause(&[
                    Lit::negative(self.pvar(step, j + k + 1)),
                    Lit::negative(self.avar(step, j, k)),
                    Lit::positive(self.avar(step, j, k + 1)),
                ]);
            }
            // A pebble on top of a full count overflows the budget.
            self.solver.add_clause(&[
                Lit::negative(self.pvar(step, j + cols)),
                Lit::negative(self.avar(step, j, cols - 1)),
            ]);
        }
    }

    /// Extend the horizon by one step: declare the new variables, constrain
    /// the moves along every gate-to-gate edge, and bound the new step's
    /// pebble count.
    pub fn add_step(&mut self) {
        self.nr_steps += 1;
        let step = self.nr_steps;
        self.solver
            .set_nr_vars((step + 1) * (self.nr_gates + self.aux_width()));

        for edge_index in 0..self.edges.len() {
            let (parent, child) = self.edges[edge_index];
            let p = self.pvar(step - 1, parent);
            let p_next = self.pvar(step, parent);
            let ch = self.pvar(step - 1, child);
            let ch_next = self.pvar(step, child);
            self.add_edge_clause(p, p_next, ch, ch_next);
        }

        if self.aux_width() > 0 {
            self.add_cardinality_clauses(step);
        }
    }

    /// The goal state as assumptions for the current horizon: outputs
    /// pebbled, everything else clean.
    pub fn assumptions(&self) -> Vec<Lit> {
        (0..self.nr_gates)
            .map(|i| Lit::with_value(self.pvar(self.nr_steps, i), self.is_po[i]))
            .collect()
    }

    /// One attempt at the current horizon.
    pub fn solve(&mut self, conflict_limit: u32) -> SolveResult {
        let assumptions = self.assumptions();
        self.solver.solve(&assumptions, conflict_limit)
    }

    /// The pebble matrix of the last satisfying model, `values[s][i]` being
    /// the pebble on gate `i` at step `s`.
    fn model_values(&self) -> Vec<Vec<bool>> {
        (0..=self.nr_steps)
            .map(|s| {
                (0..self.nr_gates)
                    .map(|i| self.solver.var_value(self.pvar(s, i)))
                    .collect()
            })
            .collect()
    }

    /// Decode the last satisfying model into a schedule.
    /// Only meaningful after [`solve`] returned [`SolveResult::Sat`].
    ///
    /// [`solve`]: PebbleSolver::solve
    pub fn extract_schedule(&self, try_inplace: bool) -> Schedule<N::Node> {
        decode::extract(self.net, &self.model_values(), try_inplace)
    }
}
