//! [`SatSolver`] backend over the varisat CDCL solver.

use varisat::ExtendFormula;

use super::{Lit, SatSolver, SolveResult, Var};

/// Incremental backend wrapping a [`varisat::Solver`].
///
/// varisat exposes no conflict budget, so the `conflict_limit` argument is
/// accepted and ignored: this backend never reports
/// [`SolveResult::Timeout`] on a completed search. A budget-capable CDCL can
/// be swapped in by implementing [`SatSolver`] for it.
pub struct VarisatSolver {
    solver: varisat::Solver<'static>,
    nr_vars: usize,
    model: Vec<bool>,
}

impl VarisatSolver {
    pub fn new() -> Self {
        VarisatSolver {
            solver: varisat::Solver::new(),
            nr_vars: 0,
            model: Vec::new(),
        }
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        VarisatSolver::new()
    }
}

fn to_varisat(lit: Lit) -> varisat::Lit {
    let var = varisat::Var::from_index(lit.var());
    if lit.is_positive() {
        varisat::Lit::positive(var)
    } else {
        varisat::Lit::negative(var)
    }
}

impl SatSolver for VarisatSolver {
    fn set_nr_vars(&mut self, nr_vars: usize) {
        while self.nr_vars < nr_vars {
            self.solver.new_var();
            self.nr_vars += 1;
        }
    }

    fn add_clause(&mut self, clause: &[Lit]) {
        let lits: Vec<varisat::Lit> = clause.iter().map(|&lit| to_varisat(lit)).collect();
        self.solver.add_clause(&lits);
    }

    fn solve(&mut self, assumptions: &[Lit], _conflict_limit: u32) -> SolveResult {
        let assumptions: Vec<varisat::Lit> =
            assumptions.iter().map(|&lit| to_varisat(lit)).collect();
        self.solver.assume(&assumptions);
        match self.solver.solve() {
            Ok(true) => {
                self.model = vec![false; self.nr_vars];
                if let Some(model) = self.solver.model() {
                    for lit in model {
                        let index = lit.var().index();
                        if index < self.model.len() {
                            self.model[index] = lit.is_positive();
                        }
                    }
                }
                SolveResult::Sat
            }
            Ok(false) => SolveResult::Unsat,
            // The solver gave up without an answer (cannot happen with a
            // default-configured varisat); report it like a blown budget.
            Err(_) => SolveResult::Timeout,
        }
    }

    fn var_value(&self, var: Var) -> bool {
        self.model.get(var).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn solve_sat_test() {
        // (x0 | x1) & (!x0 | x1) is satisfiable, and forces x1
        let mut solver = VarisatSolver::new();
        solver.set_nr_vars(2);
        solver.add_clause(&[Lit::positive(0), Lit::positive(1)]);
        solver.add_clause(&[Lit::negative(0), Lit::positive(1)]);
        assert_eq!(solver.solve(&[], 0), SolveResult::Sat);
        assert!(solver.var_value(1));
    }

    #[test]
    fn solve_unsat_test() {
        let mut solver = VarisatSolver::new();
        solver.set_nr_vars(1);
        solver.add_clause(&[Lit::positive(0)]);
        solver.add_clause(&[Lit::negative(0)]);
        assert_eq!(solver.solve(&[], 0), SolveResult::Unsat);
    }

    #[test]
    fn assumptions_are_per_call() {
        // x0 | x1 alone is satisfiable, but not under assumptions !x0, !x1.
        let mut solver = VarisatSolver::new();
        solver.set_nr_vars(2);
        solver.add_clause(&[Lit::positive(0), Lit::positive(1)]);
        assert_eq!(
            solver.solve(&[Lit::negative(0), Lit::negative(1)], 0),
            SolveResult::Unsat
        );
        // The assumptions must not stick to the clause database.
        assert_eq!(solver.solve(&[Lit::negative(0)], 0), SolveResult::Sat);
        assert!(solver.var_value(1));
        assert_eq!(solver.solve(&[], 0), SolveResult::Sat);
    }

    #[test]
    fn growing_variables() {
        let mut solver = VarisatSolver::new();
        solver.set_nr_vars(1);
        solver.add_clause(&[Lit::positive(0)]);
        assert_eq!(solver.solve(&[], 0), SolveResult::Sat);

        solver.set_nr_vars(3);
        solver.add_clause(&[Lit::positive(2)]);
        solver.add_clause(&[Lit::negative(1)]);
        assert_eq!(solver.solve(&[], 0), SolveResult::Sat);
        assert!(solver.var_value(0));
        assert!(!solver.var_value(1));
        assert!(solver.var_value(2));
    }
}
