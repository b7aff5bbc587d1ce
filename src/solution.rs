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

use std::fmt;

use crate::common::FLOAT_CMP_THRESHOLD;
use crate::core::decored::DecoredLandscape;
use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::eca::squared_eca_of;

/// This structure represents the options funded by a solver, with the resulting connectivity.
/// The coefficient of an option is 1 if it is funded and 0 otherwise; fractional coefficients
/// only appear in the solutions of relaxed models.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Coefficient of each option of the plan
    coefs: Vec<f64>,
    /// Sum of the costs of the options, weighted by their coefficient
    cost: f64,
    /// ECA of the landscape once the options are applied
    eca: f64,
    /// Value of the objective of the solver (ECA squared for the MIP formulations)
    objective: f64,
    /// Time, in milliseconds, taken to compute the solution
    compute_time_ms: u128,
    /// Size of the model solved, if any
    nb_vars: usize,
    nb_constraints: usize,
    /// Name of the method that produced the solution
    method: String,
}

impl Solution {

    /// Creates the solution funding the given options, and evaluates its ECA
    pub fn from_selection(landscape: &Landscape, plan: &RestorationPlan, selection: &[OptionIndex], method: &str) -> Self {
        let mut coefs = vec![0.0; plan.nb_options()];
        for option in selection.iter().copied() {
            coefs[option.0] = 1.0;
        }
        Self::from_coefs(landscape, plan, coefs, method)
    }

    /// Creates the solution with the given coefficients, and evaluates its ECA
    pub fn from_coefs(landscape: &Landscape, plan: &RestorationPlan, coefs: Vec<f64>, method: &str) -> Self {
        assert_eq!(coefs.len(), plan.nb_options(), "One coefficient per option is expected");
        let mut solution = Self {
            coefs,
            cost: 0.0,
            eca: 0.0,
            objective: 0.0,
            compute_time_ms: 0,
            nb_vars: 0,
            nb_constraints: 0,
            method: method.to_string(),
        };
        solution.evaluate(landscape, plan);
        solution
    }

    /// Creates a fractional solution whose score is given by the objective of a relaxed model
    /// rather than evaluated on the landscape.
    pub fn from_relaxation(plan: &RestorationPlan, coefs: Vec<f64>, objective: f64, method: &str) -> Self {
        assert_eq!(coefs.len(), plan.nb_options(), "One coefficient per option is expected");
        let cost = plan.options().map(|o| plan.cost(o) * coefs[o.0]).sum();
        Self {
            coefs,
            cost,
            eca: objective.max(0.0).sqrt(),
            objective,
            compute_time_ms: 0,
            nb_vars: 0,
            nb_constraints: 0,
            method: method.to_string(),
        }
    }

    fn evaluate(&mut self, landscape: &Landscape, plan: &RestorationPlan) {
        let applied = self.coefs.iter().copied().enumerate().filter(|(_, c)| *c > FLOAT_CMP_THRESHOLD).map(|(i, c)| (OptionIndex(i), c));
        let view = DecoredLandscape::with_options(landscape, plan, applied);
        self.objective = squared_eca_of(&view);
        self.eca = self.objective.sqrt();
        self.cost = plan.options().map(|o| plan.cost(o) * self.coefs[o.0]).sum();
    }

    /// Removes an option from the solution. The cost and the ECA are updated accordingly.
    pub fn remove(&mut self, option: OptionIndex, landscape: &Landscape, plan: &RestorationPlan) {
        if self.coefs[option.0] != 0.0 {
            self.coefs[option.0] = 0.0;
            self.evaluate(landscape, plan);
        }
    }

    pub(crate) fn set_model_statistics(&mut self, objective: f64, nb_vars: usize, nb_constraints: usize) {
        self.objective = objective;
        self.nb_vars = nb_vars;
        self.nb_constraints = nb_constraints;
    }

    pub(crate) fn set_compute_time(&mut self, compute_time_ms: u128) {
        self.compute_time_ms = compute_time_ms;
    }

    // --- GETTERS --- //

    pub fn contains(&self, option: OptionIndex) -> bool {
        self.coefs[option.0] > FLOAT_CMP_THRESHOLD
    }

    pub fn coef(&self, option: OptionIndex) -> f64 {
        self.coefs[option.0]
    }

    pub fn coefs(&self) -> &[f64] {
        &self.coefs
    }

    /// Returns the options with a non-zero coefficient, in increasing order
    pub fn selected(&self) -> Vec<OptionIndex> {
        (0..self.coefs.len()).map(OptionIndex).filter(|o| self.contains(*o)).collect()
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn eca(&self) -> f64 {
        self.eca
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn compute_time_ms(&self) -> u128 {
        self.compute_time_ms
    }

    pub fn nb_vars(&self) -> usize {
        self.nb_vars
    }

    pub fn nb_constraints(&self) -> usize {
        self.nb_constraints
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn print(&self) {
        println!("{}", self);
    }

    /// Row of the trial log: cost, ECA and the selected options separated by spaces
    pub fn to_csv_row(&self) -> String {
        let selected = self.selected().iter().map(|o| o.0.to_string()).collect::<Vec<String>>().join(" ");
        format!("{},{:.10},{}", self.cost, self.eca, selected)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let selected = self.coefs.iter().enumerate().filter(|(_, c)| **c > FLOAT_CMP_THRESHOLD).map(|(i, c)| {
            if *c < 1.0 - FLOAT_CMP_THRESHOLD {
                format!("{}({:.3})", i, c)
            } else {
                format!("{}", i)
            }
        }).collect::<Vec<String>>().join(" ");
        write!(f, "{} | ECA {:.6} | cost {} | options [{}] | {} ms", self.method, self.eca, self.cost, selected, self.compute_time_ms)?;
        if self.nb_vars > 0 {
            write!(f, " | {} variables | {} constraints", self.nb_vars, self.nb_constraints)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_solution {
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;
    use crate::eca::eca;
    use crate::solution::*;

    fn instance() -> (Landscape, RestorationPlan) {
        let mut landscape = Landscape::new();
        let a = landscape.add_patch(1.0, 0.0, 0.0);
        let b = landscape.add_patch(1.0, 0.0, 0.0);
        let ab = landscape.add_corridor(a, b, 0.1);
        let mut plan = RestorationPlan::new();
        let o0 = plan.add_option(2.0);
        plan.add_corridor(o0, ab, 0.9);
        let o1 = plan.add_option(3.0);
        plan.add_patch(o1, a, 1.0);
        (landscape, plan)
    }

    #[test]
    pub fn selection() {
        let (landscape, plan) = instance();
        let solution = Solution::from_selection(&landscape, &plan, &[OptionIndex(1), OptionIndex(0)], "test");
        assert_eq!(5.0, solution.cost());
        assert_eq!(vec![OptionIndex(0), OptionIndex(1)], solution.selected());
        // qualities (2, 1), p(a, b) = 0.9: 4 + 1 + 2 * 0.9
        assert!((solution.eca() - 6.8_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    pub fn remove_updates_cost_and_eca() {
        let (landscape, plan) = instance();
        let mut solution = Solution::from_selection(&landscape, &plan, &[OptionIndex(0), OptionIndex(1)], "test");
        solution.remove(OptionIndex(1), &landscape, &plan);
        assert!(!solution.contains(OptionIndex(1)));
        assert_eq!(2.0, solution.cost());
        assert!((solution.eca() - 2.9_f64.sqrt()).abs() < 1e-12);
        solution.remove(OptionIndex(0), &landscape, &plan);
        assert_eq!(0.0, solution.cost());
        assert!((solution.eca() - eca(&landscape)).abs() < 1e-12);
    }

    #[test]
    pub fn relaxation() {
        let (_, plan) = instance();
        let solution = Solution::from_relaxation(&plan, vec![0.5, 0.0], 9.0, "relaxed");
        assert_eq!(1.0, solution.cost());
        assert_eq!(3.0, solution.eca());
        assert_eq!("1,3.0000000000,0", solution.to_csv_row());
    }
}
