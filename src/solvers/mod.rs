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


//! Solvers of the budget-constrained ECA maximisation. All of them take a landscape, a restoration
//! plan and a budget, and return a `Solution` whose cost does not exceed the budget.
//!
//! The budget is checked identically by every solver:
//!     - A negative (or NaN) budget is infeasible
//!     - With a zero budget, or an empty plan, the solution funds nothing
//!     - A positive budget below the cost of the cheapest option is infeasible

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::common::{Formulation, Method, Weighting};
use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::error::{Error, Result};
use crate::solution::Solution;

pub mod mip;
pub mod pl_eca;
pub mod pl_eca_2;
pub mod pl_eca_3;
pub mod randomized_rounding;
pub mod greedy;
pub mod bogo;

pub use bogo::Bogo;
pub use greedy::{GreedyDec, GreedyInc, NaiveDec, NaiveInc};
pub use pl_eca::PlEcaSolver;
pub use randomized_rounding::RandomizedRounding;

/// Parameters shared by the solvers. Each solver only reads the ones it needs.
#[derive(Debug, Clone)]
pub struct SolverParameters {
    /// Formulation solved by the exact solver, and relaxed by the randomized rounding
    formulation: Formulation,
    /// Seed of the random generators
    seed: u64,
    /// Number of trials of the randomized rounding
    trials: usize,
    /// Time limit of the branch-and-bound
    timeout: Option<Duration>,
    /// Node limit of the branch-and-bound
    node_limit: Option<usize>,
    /// Solve only the linear relaxation of the formulation
    relaxed: bool,
    /// Weights used to draw the options in the randomized rounding
    weighting: Weighting,
    /// Number of threads running the randomized rounding trials
    jobs: usize,
    /// Folder in which the trial log is written
    outfolder: Option<PathBuf>,
    /// Collect and print solver statistics
    statistics: bool,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            formulation: Formulation::PlEca3,
            seed: 2024,
            trials: 100,
            timeout: None,
            node_limit: None,
            relaxed: false,
            weighting: Weighting::Fractional,
            jobs: 1,
            outfolder: None,
            statistics: false,
        }
    }
}

impl SolverParameters {

    pub fn new(formulation: Formulation, seed: u64, trials: usize, timeout: Option<Duration>, node_limit: Option<usize>) -> Self {
        Self {
            formulation,
            seed,
            trials,
            timeout,
            node_limit,
            ..Self::default()
        }
    }

    // --- GETTERS --- //

    pub fn formulation(&self) -> Formulation {
        self.formulation
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.node_limit
    }

    pub fn relaxed(&self) -> bool {
        self.relaxed
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn outfolder(&self) -> Option<&Path> {
        self.outfolder.as_deref()
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    // --- SETTERS --- //

    pub fn with_formulation(mut self, formulation: Formulation) -> Self {
        self.formulation = formulation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_node_limit(mut self, node_limit: Option<usize>) -> Self {
        self.node_limit = node_limit;
        self
    }

    pub fn with_relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_outfolder(mut self, outfolder: Option<PathBuf>) -> Self {
        self.outfolder = outfolder;
        self
    }

    pub fn with_statistics(mut self, statistics: bool) -> Self {
        self.statistics = statistics;
        self
    }
}

/// Checks the budget against the plan. Returns the solution funding nothing when no option can
/// (or needs to) be funded, and an error when the budget is infeasible.
pub fn trivial_solution(landscape: &Landscape, plan: &RestorationPlan, budget: f64, method: &str) -> Result<Option<Solution>> {
    let cheapest = plan.cheapest_cost().unwrap_or(0.0);
    if budget.is_nan() || budget < 0.0 {
        return Err(Error::Infeasible { budget, cheapest });
    }
    if budget == 0.0 || plan.is_empty() {
        info!(budget, options = plan.nb_options(), "nothing to fund");
        return Ok(Some(Solution::from_selection(landscape, plan, &[], method)));
    }
    if budget < cheapest {
        return Err(Error::Infeasible { budget, cheapest });
    }
    Ok(None)
}

/// Options bought so far, in increasing index. The cost is summed in the order of the plan, as
/// `Solution` sums it, so an option accepted by `try_add` can not push the solution over the
/// budget through rounding.
#[derive(Debug, Clone, Default)]
pub(crate) struct Purchase {
    selection: Vec<OptionIndex>,
    cost: f64,
}

impl Purchase {

    /// Cost of the purchase once the option is added
    pub fn cost_with(&self, plan: &RestorationPlan, option: OptionIndex) -> f64 {
        let position = self.selection.partition_point(|o| *o < option);
        self.selection[..position].iter()
            .chain(std::iter::once(&option))
            .chain(self.selection[position..].iter())
            .map(|o| plan.cost(*o))
            .sum()
    }

    /// Buys the option if the total cost stays within the budget
    pub fn try_add(&mut self, plan: &RestorationPlan, option: OptionIndex, budget: f64) -> bool {
        debug_assert!(!self.contains(option));
        let cost = self.cost_with(plan, option);
        if cost > budget {
            return false;
        }
        let position = self.selection.partition_point(|o| *o < option);
        self.selection.insert(position, option);
        self.cost = cost;
        true
    }

    pub fn contains(&self, option: OptionIndex) -> bool {
        self.selection.binary_search(&option).is_ok()
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn selection(&self) -> &[OptionIndex] {
        &self.selection
    }
}

pub enum GenericSolver<'a> {
    PlEca(PlEcaSolver<'a>),
    RandomizedRounding(RandomizedRounding<'a>),
    NaiveInc(NaiveInc<'a>),
    GreedyInc(GreedyInc<'a>),
    GreedyDec(GreedyDec<'a>),
    NaiveDec(NaiveDec<'a>),
    Bogo(Bogo<'a>),
}

impl<'a> GenericSolver<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan, method: Method, parameters: SolverParameters) -> Self {
        match method {
            Method::PlEca => GenericSolver::PlEca(PlEcaSolver::new(landscape, plan, parameters)),
            Method::RandomizedRounding => GenericSolver::RandomizedRounding(RandomizedRounding::new(landscape, plan, parameters)),
            Method::NaiveInc => GenericSolver::NaiveInc(NaiveInc::new(landscape, plan)),
            Method::GreedyInc => GenericSolver::GreedyInc(GreedyInc::new(landscape, plan)),
            Method::GreedyDec => GenericSolver::GreedyDec(GreedyDec::new(landscape, plan)),
            Method::NaiveDec => GenericSolver::NaiveDec(NaiveDec::new(landscape, plan)),
            Method::Bogo => GenericSolver::Bogo(Bogo::new(landscape, plan, parameters)),
        }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        match self {
            GenericSolver::PlEca(solver) => solver.solve(budget),
            GenericSolver::RandomizedRounding(solver) => solver.solve(budget),
            GenericSolver::NaiveInc(solver) => solver.solve(budget),
            GenericSolver::GreedyInc(solver) => solver.solve(budget),
            GenericSolver::GreedyDec(solver) => solver.solve(budget),
            GenericSolver::NaiveDec(solver) => solver.solve(budget),
            GenericSolver::Bogo(solver) => solver.solve(budget),
        }
    }
}

/// Solves the problem with the given method
pub fn solve(landscape: &Landscape, plan: &RestorationPlan, budget: f64, method: Method, parameters: SolverParameters) -> Result<Solution> {
    GenericSolver::new(landscape, plan, method, parameters).solve(budget)
}
