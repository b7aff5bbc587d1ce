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


//! Randomized rounding of the linear relaxation of an ECA formulation. The options are drawn
//! without replacement, proportionally to their weight, and funded while they fit in the
//! remaining budget. Each trial is an independent draw; the best selection over all trials is
//! returned.
//!
//! A trial only depends on the seed, its index and the weights: its generator is seeded with the
//! seed and uses the index of the trial as stream. Hence the result is the same whether the
//! trials are run sequentially or in parallel.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, info_span};

use crate::common::{Formulation, Weighting};
use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::core::sum_tree::SumTree;
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::precomputation::Precomputation;
use crate::solution::Solution;
use crate::solvers::pl_eca::solve_formulation;
use crate::solvers::pl_eca_2::PlEca2;
use crate::solvers::pl_eca_3::PlEca3;
use crate::solvers::{trivial_solution, Purchase, SolverParameters};

const METHOD: &str = "randomized-rounding";

pub struct RandomizedRounding<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
    parameters: SolverParameters,
}

impl<'a> RandomizedRounding<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan, parameters: SolverParameters) -> Self {
        Self { landscape, plan, parameters }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, METHOD)? {
            return Ok(solution);
        }
        let span = info_span!("randomized_rounding", budget, trials = self.parameters.trials());
        let _guard = span.enter();
        let needs_precomputation = self.parameters.formulation() == Formulation::PlEca3 || self.parameters.weighting() == Weighting::GainWeighted;
        let precomputation = if needs_precomputation { Some(Precomputation::new(self.landscape, self.plan)) } else { None };
        let relaxation = match (&precomputation, self.parameters.formulation()) {
            (Some(precomputation), Formulation::PlEca3) => solve_formulation(&PlEca3::new(precomputation), budget, true, &self.parameters)?,
            _ => solve_formulation(&PlEca2::new(self.landscape, self.plan), budget, true, &self.parameters)?,
        };
        info!(bound = relaxation.eca(), "relaxation solved");
        let weights = self.weights(&relaxation, precomputation.as_ref());
        let mut solution = self.round(&weights, budget)?;
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }

    /// Sampling weight of each option, from its value in the relaxation
    pub fn weights(&self, relaxation: &Solution, precomputation: Option<&Precomputation>) -> Vec<f64> {
        let gains = match (self.parameters.weighting(), precomputation) {
            (Weighting::GainWeighted, Some(precomputation)) => {
                precomputation.assert_fresh(self.landscape, self.plan);
                Some(precomputation.gains())
            },
            _ => None,
        };
        self.plan.options().map(|option| {
            let coef = relaxation.coef(option).max(0.0);
            match gains {
                Some(gains) => coef * gains.eca_gain(option).max(0.0),
                None => coef,
            }
        }).collect()
    }

    /// Runs the trials with the given sampling weights and returns the best selection found. Ties
    /// are broken in favour of the first trial.
    pub fn round(&self, weights: &[f64], budget: f64) -> Result<Solution> {
        let tree = SumTree::new(weights);
        let mut by_cost = self.plan.options().collect::<Vec<OptionIndex>>();
        by_cost.sort_by(|a, b| self.plan.cost(*a).total_cmp(&self.plan.cost(*b)).then(a.cmp(b)));
        let trials = self.parameters.trials().max(1) as u64;
        let solutions = if self.parameters.jobs() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.parameters.jobs())
                .build()
                .map_err(|e| Error::ThreadPool(e.to_string()))?;
            pool.install(|| {
                (0..trials).into_par_iter()
                    .map_init(|| tree.clone(), |tree, trial| self.trial(tree, &by_cost, budget, trial))
                    .collect::<Result<Vec<Solution>>>()
            })?
        } else {
            let mut tree = tree.clone();
            (0..trials).map(|trial| self.trial(&mut tree, &by_cost, budget, trial)).collect::<Result<Vec<Solution>>>()?
        };

        if self.parameters.statistics() || self.parameters.outfolder().is_some() {
            let mut logger = Logger::<true>::new(self.parameters.outfolder())?;
            for (trial, solution) in solutions.iter().enumerate() {
                logger.log_trial(trial as u64, solution)?;
            }
            if let Some(path) = logger.outpath() {
                info!(path = %path.display(), "trials written");
            }
            if self.parameters.statistics() {
                logger.print();
            }
        }

        let mut best: Option<Solution> = None;
        for solution in solutions {
            if best.as_ref().is_none_or(|b| solution.eca() > b.eca()) {
                best = Some(solution);
            }
        }
        match best {
            Some(solution) => Ok(solution),
            None => Ok(Solution::from_selection(self.landscape, self.plan, &[], METHOD)),
        }
    }

    /// One rounding pass. The tree is reset before drawing. `by_cost` lists the options by
    /// increasing cost; the pass stops as soon as the cheapest option still drawable does not fit.
    fn trial(&self, tree: &mut SumTree, by_cost: &[OptionIndex], budget: f64, trial: u64) -> Result<Solution> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.parameters.seed());
        rng.set_stream(trial);
        tree.reset();
        let mut purchase = Purchase::default();
        let mut cheapest = 0;
        loop {
            while cheapest < by_cost.len() && tree.weight(by_cost[cheapest].0) <= 0.0 {
                cheapest += 1;
            }
            if cheapest == by_cost.len() || purchase.cost_with(self.plan, by_cost[cheapest]) > budget {
                break;
            }
            match tree.sample_and_reset(&mut rng) {
                Ok(leaf) => {
                    purchase.try_add(self.plan, OptionIndex(leaf), budget);
                },
                Err(Error::EmptySumTree) => break,
                Err(e) => return Err(e),
            };
        }
        debug!(trial, options = purchase.selection().len(), cost = purchase.cost(), "trial done");
        Ok(Solution::from_selection(self.landscape, self.plan, purchase.selection(), METHOD))
    }
}
