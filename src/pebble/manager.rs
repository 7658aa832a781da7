//! Horizon search and budget policies.
//!
//! One attempt fixes a pebble budget, encodes step 0 and grows the horizon
//! one step per UNSAT answer until the goal assumptions become satisfiable.
//! On top of that sit the two adaptive knobs: `increment_on_timeout` restarts
//! a timed-out attempt with one more pebble (the whole encoding is rebuilt,
//! its variable layout depends on the budget), and `decrement_on_success`
//! keeps tightening the budget after a solution, returning the tightest
//! schedule found. With both knobs set, the increment only drives the search
//! for a first solution: a timeout while tightening ends the run with the
//! best schedule already recorded, the two policies would otherwise push the
//! budget in opposite directions forever.

use std::time::Instant;

use tracing::{debug, info};

use crate::network::Network;
use crate::sat::{SatSolver, SolveResult, VarisatSolver};
use crate::schedule::{verify_schedule, Schedule};

use super::{PebbleSolver, PebblingConfig, PebblingStats, Result};

/// UNSAT horizons are extended up to this many steps before the attempt is
/// abandoned as unsolvable.
const MAX_STEPS: usize = 100;

enum Attempt<T> {
    Solved { schedule: T, steps: u32 },
    Exhausted,
    TimedOut,
}

/// Drives [`PebbleSolver`] attempts over a network.
pub struct PebbleManager<'a, N: Network> {
    net: &'a N,
    config: PebblingConfig,
}

impl<'a, N: Network> PebbleManager<'a, N> {
    pub fn new(net: &'a N, config: PebblingConfig) -> Self {
        PebbleManager { net, config }
    }

    /// Run the search with the given SAT backend.
    ///
    /// An unsolvable or abandoned search is not an error: it comes back as an
    /// empty schedule with [`PebblingStats::success`] set to false. Errors
    /// are reserved for networks violating the capability contract and for
    /// schedules failing the replay self-check.
    pub fn run<S: SatSolver + Default>(&self) -> Result<(Schedule<N::Node>, PebblingStats)> {
        let start = Instant::now();
        let nr_gates = self.net.num_gates();
        let mut pebbles =
            if self.config.pebble_limit == 0 || self.config.pebble_limit as usize > nr_gates {
                nr_gates
            } else {
                self.config.pebble_limit as usize
            };

        // Schedule, steps, pebbles, required ancillae of the best solution.
        let mut best: Option<(Schedule<N::Node>, u32, u32, u32)> = None;

        loop {
            if self.config.verbose {
                debug!(pebbles, "starting pebbling attempt");
            }
            match self.attempt::<S>(pebbles)? {
                Attempt::Solved { schedule, steps } => {
                    let required = verify_schedule(self.net, &schedule)?;
                    if self.config.progress {
                        info!(pebbles, steps, required, "schedule found");
                    }
                    best = Some((schedule, steps, pebbles as u32, required));
                    if self.config.decrement_on_success && pebbles > 1 {
                        pebbles -= 1;
                        continue;
                    }
                    break;
                }
                Attempt::Exhausted => {
                    if self.config.verbose {
                        debug!(pebbles, max_steps = MAX_STEPS, "no schedule within the step cap");
                    }
                    break;
                }
                Attempt::TimedOut => {
                    // The increment only applies while no schedule exists,
                    // else it would cycle against the decrement.
                    if best.is_none() && self.config.increment_on_timeout && pebbles < nr_gates {
                        pebbles += 1;
                        if self.config.verbose {
                            debug!(pebbles, "conflict budget exhausted, restarting with one more pebble");
                        }
                        continue;
                    }
                    break;
                }
            }
        }

        let time_total = start.elapsed();
        Ok(match best {
            Some((schedule, steps, pebbles, required_ancillae)) => {
                let stats = PebblingStats {
                    success: true,
                    steps,
                    pebbles,
                    required_ancillae,
                    time_total,
                };
                (schedule, stats)
            }
            None => (
                Vec::new(),
                PebblingStats {
                    success: false,
                    steps: 0,
                    pebbles: pebbles as u32,
                    required_ancillae: 0,
                    time_total,
                },
            ),
        })
    }

    /// One fixed-budget attempt: grow the horizon until SAT, the step cap, or
    /// a blown conflict budget.
    fn attempt<S: SatSolver + Default>(&self, pebbles: usize) -> Result<Attempt<Schedule<N::Node>>> {
        let mut solver: PebbleSolver<N, S> = PebbleSolver::new(self.net, pebbles as u32)?;
        solver.initialize();
        loop {
            match solver.solve(self.config.conflict_limit) {
                SolveResult::Sat => {
                    return Ok(Attempt::Solved {
                        schedule: solver.extract_schedule(true),
                        steps: solver.nr_steps() as u32,
                    });
                }
                SolveResult::Unsat => {
                    if solver.nr_steps() >= MAX_STEPS {
                        return Ok(Attempt::Exhausted);
                    }
                    solver.add_step();
                    if self.config.progress {
                        info!(steps = solver.nr_steps(), "extending horizon");
                    }
                }
                SolveResult::Timeout => return Ok(Attempt::TimedOut),
            }
        }
    }
}

/// Schedule a network with the bundled varisat backend.
pub fn pebble_schedule<N: Network>(
    net: &N,
    config: &PebblingConfig,
) -> Result<(Schedule<N::Node>, PebblingStats)> {
    PebbleManager::new(net, config.clone()).run::<VarisatSolver>()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::function::TruthTable;
    use crate::network::{LogicNetwork, NetEdge, NetNode, NodeId};
    use crate::sat::Lit;

    fn edge(net: &LogicNetwork, id: NodeId) -> NetEdge {
        NetEdge::new(net.get_node(id).unwrap(), false)
    }

    /// g5 = i1 & i2, g6 = g5 & i3, g7 = g6 & i4; output g7.
    fn and_chain() -> LogicNetwork {
        let mut net = LogicNetwork::new();
        for id in 1..=4 {
            net.add_node(NetNode::Input(id)).unwrap();
        }
        net.new_gate(5, vec![edge(&net, 1), edge(&net, 2)], TruthTable::conjunction(2))
            .unwrap();
        net.new_gate(6, vec![edge(&net, 5), edge(&net, 3)], TruthTable::conjunction(2))
            .unwrap();
        net.new_gate(7, vec![edge(&net, 6), edge(&net, 4)], TruthTable::conjunction(2))
            .unwrap();
        net.add_output(7, false).unwrap();
        net.update();
        net
    }

    fn config(pebble_limit: u32) -> PebblingConfig {
        PebblingConfig {
            pebble_limit,
            ..PebblingConfig::default()
        }
    }

    #[test]
    fn chain_solves_with_three_pebbles() {
        let net = and_chain();
        let (schedule, stats) = pebble_schedule(&net, &config(3)).unwrap();
        assert!(stats.success);
        assert_eq!(stats.steps, 5);
        assert_eq!(stats.pebbles, 3);
        assert_eq!(stats.required_ancillae, 3);
        assert_eq!(schedule.len(), 5);
    }

    #[test]
    fn chain_fails_with_tight_budgets() {
        // Two pebbles: uncomputing the middle gate needs its child live,
        // which would be a third simultaneous pebble. One pebble: the second
        // gate can never even be computed.
        let net = and_chain();
        for pebble_limit in [1, 2] {
            let (schedule, stats) = pebble_schedule(&net, &config(pebble_limit)).unwrap();
            assert!(!stats.success);
            assert!(schedule.is_empty());
        }
    }

    #[test]
    fn unbounded_budget_uses_gate_count() {
        let net = and_chain();
        let (_, stats) = pebble_schedule(&net, &config(0)).unwrap();
        assert!(stats.success);
        assert_eq!(stats.pebbles, 3);
    }

    #[test]
    fn decrement_on_success_keeps_tightest() {
        // Three pebbles succeed, two exhaust the cap: the recorded best stays
        // at three and the run still reports success.
        let net = and_chain();
        let config = PebblingConfig {
            decrement_on_success: true,
            ..PebblingConfig::default()
        };
        let (schedule, stats) = pebble_schedule(&net, &config).unwrap();
        assert!(stats.success);
        assert_eq!(stats.pebbles, 3);
        assert_eq!(schedule.len(), 5);
    }

    /// A backend that always gives up, for exercising the timeout policy.
    #[derive(Default)]
    struct AlwaysTimeout;

    impl SatSolver for AlwaysTimeout {
        fn set_nr_vars(&mut self, _nr_vars: usize) {}
        fn add_clause(&mut self, _clause: &[Lit]) {}
        fn solve(&mut self, _assumptions: &[Lit], _conflict_limit: u32) -> SolveResult {
            SolveResult::Timeout
        }
        fn var_value(&self, _var: usize) -> bool {
            false
        }
    }

    #[test]
    fn timeout_without_policy_fails_immediately() {
        let net = and_chain();
        let manager = PebbleManager::new(&net, config(1));
        let (schedule, stats) = manager.run::<AlwaysTimeout>().unwrap();
        assert!(!stats.success);
        assert!(schedule.is_empty());
        assert_eq!(stats.pebbles, 1);
    }

    /// Delegates to varisat a fixed number of calls per attempt, then times
    /// out. Six calls let the three-pebble chain attempt finish (five UNSAT
    /// horizons plus the SAT one) while the follow-up attempt blows its
    /// budget instead.
    struct TimeoutAfter {
        inner: VarisatSolver,
        remaining: u32,
    }

    impl Default for TimeoutAfter {
        fn default() -> Self {
            TimeoutAfter {
                inner: VarisatSolver::new(),
                remaining: 6,
            }
        }
    }

    impl SatSolver for TimeoutAfter {
        fn set_nr_vars(&mut self, nr_vars: usize) {
            self.inner.set_nr_vars(nr_vars);
        }
        fn add_clause(&mut self, clause: &[Lit]) {
            self.inner.add_clause(clause);
        }
        fn solve(&mut self, assumptions: &[Lit], conflict_limit: u32) -> SolveResult {
            if self.remaining == 0 {
                return SolveResult::Timeout;
            }
            self.remaining -= 1;
            self.inner.solve(assumptions, conflict_limit)
        }
        fn var_value(&self, var: usize) -> bool {
            self.inner.var_value(var)
        }
    }

    #[test]
    fn timeout_while_tightening_keeps_best() {
        // Both knobs set: the timeout hits the two-pebble tightening attempt,
        // which must end the run with the three-pebble schedule instead of
        // climbing the budget back up.
        let net = and_chain();
        let config = PebblingConfig {
            decrement_on_success: true,
            increment_on_timeout: true,
            ..PebblingConfig::default()
        };
        let manager = PebbleManager::new(&net, config);
        let (schedule, stats) = manager.run::<TimeoutAfter>().unwrap();
        assert!(stats.success);
        assert_eq!(stats.pebbles, 3);
        assert_eq!(schedule.len(), 5);
    }

    #[test]
    fn increment_on_timeout_climbs_to_gate_count() {
        let net = and_chain();
        let config = PebblingConfig {
            pebble_limit: 1,
            increment_on_timeout: true,
            ..PebblingConfig::default()
        };
        let manager = PebbleManager::new(&net, config);
        let (schedule, stats) = manager.run::<AlwaysTimeout>().unwrap();
        // Restarted at 2 and 3 pebbles, then ran out of room.
        assert!(!stats.success);
        assert!(schedule.is_empty());
        assert_eq!(stats.pebbles, 3);
    }

    #[test]
    fn single_output_gate() {
        let mut net = LogicNetwork::new();
        net.add_node(NetNode::Input(1)).unwrap();
        net.add_node(NetNode::Input(2)).unwrap();
        net.new_gate(3, vec![edge(&net, 1), edge(&net, 2)], TruthTable::conjunction(2))
            .unwrap();
        net.add_output(3, false).unwrap();
        net.update();

        let (schedule, stats) = pebble_schedule(&net, &config(1)).unwrap();
        assert!(stats.success);
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.required_ancillae, 1);
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn empty_network() {
        let net = LogicNetwork::new();
        let (schedule, stats) = pebble_schedule(&net, &PebblingConfig::default()).unwrap();
        assert!(stats.success);
        assert!(schedule.is_empty());
        assert_eq!(stats.steps, 0);
        assert_eq!(stats.required_ancillae, 0);
    }
}
