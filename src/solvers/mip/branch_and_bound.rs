//Landscape_opt
//Copyright (C) 2022-2023 A. Dubray
//
//This program is free software: you can redistribute it and/or modify
//it under the terms of the GNU Affero General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//This program is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU Affero General Public License for more details.
//
//You should have received a copy of the GNU Affero General Public License
//along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Depth-first branch-and-bound on the integer columns of a `MipModel`. Each node solves the linear
//! relaxation with the current column bounds. The bounds are stored in a trail so that they are
//! restored when the search backtracks. The branching column is the most fractional one, and the
//! up branch is explored first.
//!
//! The search is bounded by a time limit and a node limit, checked before each node. When one of
//! them is reached, the search stops and reports the bound of the root relaxation and the best
//! objective found, without claiming optimality.

use std::time::{Duration, Instant};

use search_trail::{F64Manager, ReversibleF64, SaveAndRestore, StateManager};
use tracing::{debug, info};

use crate::common::INTEGRALITY_TOLERANCE;
use crate::error::{Error, Result, SolverError};
use crate::solvers::mip::backend::{LpBackend, LpOutcome};
use crate::solvers::mip::builder::{MipModel, Sense};
use crate::statistics::Statistics;

/// Resources given to a solve. None means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveLimits {
    pub timeout: Option<Duration>,
    pub node_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MipSolution {
    pub values: Vec<f64>,
    pub objective: f64,
    /// Objective of the root relaxation
    pub bound: f64,
}

pub struct BranchAndBound<'m, L: LpBackend, const S: bool> {
    model: &'m MipModel,
    backend: &'m L,
    state: StateManager,
    lower: Vec<ReversibleF64>,
    upper: Vec<ReversibleF64>,
    integer_columns: Vec<usize>,
    /// Best integral solution, with its objective in the maximization sense
    incumbent: Option<(Vec<f64>, f64)>,
    /// Bound of the root relaxation, in the maximization sense
    root_bound: Option<f64>,
    limits: SolveLimits,
    start: Instant,
    number_nodes: usize,
    limit_reached: bool,
    statistics: Statistics<S>,
}

pub type StatBranchAndBound<'m, L> = BranchAndBound<'m, L, true>;
pub type QuietBranchAndBound<'m, L> = BranchAndBound<'m, L, false>;

impl<'m, L: LpBackend, const S: bool> BranchAndBound<'m, L, S> {

    pub fn new(model: &'m MipModel, backend: &'m L, limits: SolveLimits) -> Self {
        let mut state = StateManager::default();
        let lower = model.columns().iter().map(|c| state.manage_f64(c.lower_bound)).collect();
        let upper = model.columns().iter().map(|c| state.manage_f64(c.upper_bound)).collect();
        Self {
            model,
            backend,
            state,
            lower,
            upper,
            integer_columns: model.integer_columns(),
            incumbent: None,
            root_bound: None,
            limits,
            start: Instant::now(),
            number_nodes: 0,
            limit_reached: false,
            statistics: Statistics::default(),
        }
    }

    fn sign(&self) -> f64 {
        match self.model.sense() {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        }
    }

    fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let lower = self.lower.iter().map(|r| self.state.get_f64(*r)).collect();
        let upper = self.upper.iter().map(|r| self.state.get_f64(*r)).collect();
        (lower, upper)
    }

    fn is_limit_reached(&self) -> bool {
        if let Some(limit) = self.limits.node_limit {
            if self.number_nodes >= limit {
                return true;
            }
        }
        if let Some(timeout) = self.limits.timeout {
            if self.start.elapsed() >= timeout {
                return true;
            }
        }
        false
    }

    /// Returns the integer column whose value is the farthest from an integer, if any
    fn most_fractional(&self, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for column in self.integer_columns.iter().copied() {
            let distance = (values[column] - values[column].round()).abs();
            if distance > INTEGRALITY_TOLERANCE && best.is_none_or(|(_, d)| distance > d) {
                best = Some((column, distance));
            }
        }
        best.map(|(column, _)| column)
    }

    /// Solves the relaxation of the model at the root, ignoring integrality
    pub fn solve_relaxation(&mut self) -> Result<MipSolution> {
        self.start = Instant::now();
        let (lower, upper) = self.bounds();
        self.statistics.lp_solve();
        match self.backend.solve_lp(self.model, &lower, &upper)? {
            LpOutcome::Infeasible => Err(SolverError::Infeasible.into()),
            LpOutcome::Optimal { values, objective } => {
                self.statistics.root_bound(objective);
                self.statistics.peak_memory();
                self.statistics.print();
                Ok(MipSolution { values, objective, bound: objective })
            },
        }
    }

    /// Solves the model to optimality, or fails if the limits are reached
    pub fn solve(&mut self) -> Result<MipSolution> {
        self.start = Instant::now();
        self.explore()?;
        self.statistics.peak_memory();
        self.statistics.print();
        let sign = self.sign();
        let elapsed = self.start.elapsed();
        if self.limit_reached {
            info!(nodes = self.number_nodes, elapsed_ms = elapsed.as_millis() as u64, "branch-and-bound stopped by its limits");
            return Err(Error::Solver(SolverError::LimitReached {
                nodes: self.number_nodes,
                elapsed_ms: elapsed.as_millis(),
                best_bound: self.root_bound.map(|b| sign * b),
                incumbent: self.incumbent.as_ref().map(|(_, o)| sign * o),
            }));
        }
        debug!(nodes = self.number_nodes, elapsed_ms = elapsed.as_millis() as u64, "branch-and-bound done");
        match self.incumbent.take() {
            Some((values, objective)) => Ok(MipSolution {
                values,
                objective: sign * objective,
                bound: sign * self.root_bound.unwrap_or(objective),
            }),
            None => Err(SolverError::Infeasible.into()),
        }
    }

    fn explore(&mut self) -> Result<()> {
        if self.is_limit_reached() {
            self.limit_reached = true;
            return Ok(());
        }
        self.number_nodes += 1;
        self.statistics.node();
        let (lower, upper) = self.bounds();
        self.statistics.lp_solve();
        let (mut values, objective) = match self.backend.solve_lp(self.model, &lower, &upper)? {
            LpOutcome::Infeasible => {
                self.statistics.infeasible();
                return Ok(());
            },
            LpOutcome::Optimal { values, objective } => (values, self.sign() * objective),
        };
        if self.root_bound.is_none() {
            self.root_bound = Some(objective);
            self.statistics.root_bound(self.sign() * objective);
        }
        if let Some((_, best)) = &self.incumbent {
            if objective <= best + 1e-9 * best.abs().max(1.0) {
                self.statistics.pruned();
                return Ok(());
            }
        }
        match self.most_fractional(&values) {
            None => {
                for column in self.integer_columns.iter().copied() {
                    values[column] = values[column].round();
                }
                self.statistics.incumbent(self.sign() * objective);
                self.incumbent = Some((values, objective));
            },
            Some(column) => {
                let value = values[column];
                self.state.save_state();
                self.state.set_f64(self.lower[column], value.ceil());
                let up = self.explore();
                self.state.restore_state();
                up?;
                if self.limit_reached {
                    return Ok(());
                }
                self.state.save_state();
                self.state.set_f64(self.upper[column], value.floor());
                let down = self.explore();
                self.state.restore_state();
                down?;
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_branch_and_bound {
    use std::time::Duration;

    use crate::error::{Error, SolverError};
    use crate::solvers::mip::backend::MicroLpBackend;
    use crate::solvers::mip::branch_and_bound::*;
    use crate::solvers::mip::builder::*;

    // max 5a + 4b + 3c s.t. 2a + 3b + c <= 5, 4a + b + 2c <= 11, 3a + 4b + 2c <= 8, binaries
    fn knapsack() -> MipModel {
        let mut builder = MipBuilder::new();
        let y = builder.add_columns(VarType::binary(3));
        builder.set_objective(y, 5.0).set_objective(y + 1, 4.0).set_objective(y + 2, 3.0);
        builder.buff_entry(y, 2.0).buff_entry(y + 1, 3.0).buff_entry(y + 2, 1.0).push_row(-INFINITY, 5.0);
        builder.buff_entry(y, 4.0).buff_entry(y + 1, 1.0).buff_entry(y + 2, 2.0).push_row(-INFINITY, 11.0);
        builder.buff_entry(y, 3.0).buff_entry(y + 1, 4.0).buff_entry(y + 2, 2.0).push_row(-INFINITY, 8.0);
        builder.build(Sense::Maximize)
    }

    #[test]
    pub fn optimal_binary_solution() {
        let model = knapsack();
        let backend = MicroLpBackend;
        let mut solver = QuietBranchAndBound::new(&model, &backend, SolveLimits::default());
        let solution = solver.solve().unwrap();
        assert!((solution.objective - 9.0).abs() < 1e-6);
        assert_eq!(vec![1.0, 1.0, 0.0], solution.values);
        assert!(solution.bound >= solution.objective - 1e-6);
    }

    #[test]
    pub fn relaxation_bounds_integral_solution() {
        let model = knapsack();
        let backend = MicroLpBackend;
        let relaxed = QuietBranchAndBound::new(&model, &backend, SolveLimits::default()).solve_relaxation().unwrap();
        let integral = StatBranchAndBound::new(&model, &backend, SolveLimits::default()).solve().unwrap();
        assert!(relaxed.objective >= integral.objective - 1e-6);
    }

    #[test]
    pub fn node_limit_is_reported() {
        let model = knapsack();
        let backend = MicroLpBackend;
        let limits = SolveLimits { timeout: None, node_limit: Some(1) };
        let mut solver = QuietBranchAndBound::new(&model, &backend, limits);
        match solver.solve() {
            Err(Error::Solver(SolverError::LimitReached { nodes, best_bound, .. })) => {
                assert_eq!(1, nodes);
                assert!(best_bound.is_some());
            },
            other => panic!("Expected a limit error, got {:?}", other),
        }
    }

    #[test]
    pub fn zero_timeout_is_reported() {
        let model = knapsack();
        let backend = MicroLpBackend;
        let limits = SolveLimits { timeout: Some(Duration::ZERO), node_limit: None };
        let mut solver = QuietBranchAndBound::new(&model, &backend, limits);
        assert!(matches!(solver.solve(), Err(Error::Solver(SolverError::LimitReached { nodes: 0, best_bound: None, incumbent: None, .. }))));
    }

    #[test]
    pub fn minimization() {
        // min a + b s.t. a + b >= 1.5, binaries
        let mut builder = MipBuilder::new();
        let y = builder.add_columns(VarType::binary(2));
        builder.set_objective(y, 1.0).set_objective(y + 1, 1.0);
        builder.buff_entry(y, 1.0).buff_entry(y + 1, 1.0).push_row(1.5, INFINITY);
        let model = builder.build(Sense::Minimize);
        let backend = MicroLpBackend;
        let solution = QuietBranchAndBound::new(&model, &backend, SolveLimits::default()).solve().unwrap();
        assert!((solution.objective - 2.0).abs() < 1e-6);
    }
}
