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


//! Random baseline: the options are drawn uniformly without replacement and bought while they
//! fit in the budget.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::core::sum_tree::SumTree;
use crate::error::{Error, Result};
use crate::solution::Solution;
use crate::solvers::{trivial_solution, Purchase, SolverParameters};

pub struct Bogo<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
    parameters: SolverParameters,
}

impl<'a> Bogo<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan, parameters: SolverParameters) -> Self {
        Self { landscape, plan, parameters }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, "bogo")? {
            return Ok(solution);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.parameters.seed());
        let mut tree = SumTree::new(&vec![1.0; self.plan.nb_options()]);
        let mut purchase = Purchase::default();
        loop {
            match tree.sample_and_reset(&mut rng) {
                Ok(leaf) => {
                    purchase.try_add(self.plan, OptionIndex(leaf), budget);
                },
                Err(Error::EmptySumTree) => break,
                Err(e) => return Err(e),
            }
        }
        debug!(options = purchase.selection().len(), cost = purchase.cost(), "random selection");
        let mut solution = Solution::from_selection(self.landscape, self.plan, purchase.selection(), "bogo");
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }
}
