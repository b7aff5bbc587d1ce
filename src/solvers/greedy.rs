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


//! Greedy heuristics of the ECA maximisation, ranking the options by ECA gain per unit of cost.

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::eca::eca_with_options;
use crate::error::Result;
use crate::precomputation::Precomputation;
use crate::solution::Solution;
use crate::solvers::pl_eca_3::useful_options;
use crate::solvers::{trivial_solution, Purchase};

/// Gain (or loss) of an option per unit of cost. Free options come first.
fn ratio(delta: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        delta / cost
    } else if delta > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Sorts by decreasing ratio, and by increasing index for equal ratios
fn by_decreasing_ratio(a: &(OptionIndex, f64), b: &(OptionIndex, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Ranks the options once, by the gain they bring alone, and funds them in that order
pub struct NaiveInc<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
}

impl<'a> NaiveInc<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan) -> Self {
        Self { landscape, plan }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, "naive-inc")? {
            return Ok(solution);
        }
        let precomputation = Precomputation::new(self.landscape, self.plan);
        let gains = precomputation.gains();
        let mut ranking = useful_options(&precomputation).into_iter()
            .map(|o| (o, ratio(gains.eca_gain(o), self.plan.cost(o))))
            .filter(|(_, r)| *r > 0.0)
            .collect::<Vec<(OptionIndex, f64)>>();
        ranking.sort_by(by_decreasing_ratio);
        let mut purchase = Purchase::default();
        for (option, _) in ranking {
            purchase.try_add(self.plan, option, budget);
        }
        let selection = purchase.selection();
        debug!(options = selection.len(), estimate = gains.additive_estimate(selection), "naive selection");
        let mut solution = Solution::from_selection(self.landscape, self.plan, selection, "naive-inc");
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }
}

/// Repeatedly funds the option with the best ECA gain per unit of cost among the ones that fit
pub struct GreedyInc<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
}

impl<'a> GreedyInc<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan) -> Self {
        Self { landscape, plan }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, "greedy-inc")? {
            return Ok(solution);
        }
        let mut purchase = Purchase::default();
        let mut current = eca_with_options(self.landscape, self.plan, &[]);
        loop {
            let candidates = self.plan.options()
                .filter(|o| !purchase.contains(*o) && purchase.cost_with(self.plan, *o) <= budget)
                .collect::<Vec<OptionIndex>>();
            let best = candidates.par_iter().map(|option| {
                let mut with = purchase.selection().to_vec();
                with.push(*option);
                let eca = eca_with_options(self.landscape, self.plan, &with);
                (*option, ratio(eca - current, self.plan.cost(*option)), eca)
            }).collect::<Vec<(OptionIndex, f64, f64)>>()
                .into_iter()
                .min_by(|a, b| by_decreasing_ratio(&(a.0, a.1), &(b.0, b.1)));
            match best {
                Some((option, r, eca)) if r > 0.0 => {
                    debug!(option = option.0, ratio = r, eca, "option funded");
                    purchase.try_add(self.plan, option, budget);
                    current = eca;
                },
                _ => break,
            }
        }
        let mut solution = Solution::from_selection(self.landscape, self.plan, purchase.selection(), "greedy-inc");
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }
}

/// Starts from all the options and repeatedly drops the one losing the least ECA per unit of cost,
/// until the budget is respected
pub struct GreedyDec<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
}

impl<'a> GreedyDec<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan) -> Self {
        Self { landscape, plan }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, "greedy-dec")? {
            return Ok(solution);
        }
        let all = self.plan.options().collect::<Vec<OptionIndex>>();
        let mut solution = Solution::from_selection(self.landscape, self.plan, &all, "greedy-dec");
        while solution.cost() > budget {
            let selected = solution.selected();
            let current = solution.eca();
            // Free options do not help to respect the budget
            let worst = selected.par_iter().filter(|o| self.plan.cost(**o) > 0.0).map(|option| {
                let without = selected.iter().copied().filter(|o| o != option).collect::<Vec<OptionIndex>>();
                let loss = current - eca_with_options(self.landscape, self.plan, &without);
                (*option, ratio(loss, self.plan.cost(*option)))
            }).collect::<Vec<(OptionIndex, f64)>>()
                .into_iter()
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            match worst {
                Some((option, loss)) => {
                    debug!(option = option.0, ratio = loss, "option dropped");
                    solution.remove(option, self.landscape, self.plan);
                },
                None => break,
            }
        }
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }
}

/// Ranks the options once, by the ECA lost when each one alone is removed from the full plan, and
/// drops them in that order until the budget is respected
pub struct NaiveDec<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
}

impl<'a> NaiveDec<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan) -> Self {
        Self { landscape, plan }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, "naive-dec")? {
            return Ok(solution);
        }
        let all = self.plan.options().collect::<Vec<OptionIndex>>();
        let mut solution = Solution::from_selection(self.landscape, self.plan, &all, "naive-dec");
        let full = solution.eca();
        let mut ranking = all.par_iter().filter(|o| self.plan.cost(**o) > 0.0).map(|option| {
            let without = all.iter().copied().filter(|o| o != option).collect::<Vec<OptionIndex>>();
            let loss = full - eca_with_options(self.landscape, self.plan, &without);
            (*option, ratio(loss, self.plan.cost(*option)))
        }).collect::<Vec<(OptionIndex, f64)>>();
        ranking.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        for (option, loss) in ranking {
            if solution.cost() <= budget {
                break;
            }
            debug!(option = option.0, ratio = loss, "option dropped");
            solution.remove(option, self.landscape, self.plan);
        }
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }
}
