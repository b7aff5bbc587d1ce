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


//! Exact solving of the ECA maximisation with one of the flow formulations. The models maximise
//! the squared ECA; the solutions report the ECA evaluated on the landscape with the selected
//! options, and the value of the model as objective.

use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::common::{Formulation, FLOAT_CMP_THRESHOLD};
use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::error::Result;
use crate::precomputation::Precomputation;
use crate::solution::Solution;
use crate::solvers::mip::{solve_model, MicroLpBackend, MipModel, SolveLimits};
use crate::solvers::pl_eca_2::PlEca2;
use crate::solvers::pl_eca_3::PlEca3;
use crate::solvers::{trivial_solution, SolverParameters};

/// A model of the ECA maximisation, with the selection variable of option i in column
/// `options_offset + i`.
pub struct EcaModel {
    pub model: MipModel,
    pub options_offset: usize,
}

impl EcaModel {

    /// Values of the selection variables in a solution of the model, clamped in [0, 1]
    pub fn option_values(&self, values: &[f64], nb_options: usize) -> Vec<f64> {
        values[self.options_offset..self.options_offset + nb_options].iter().map(|v| v.clamp(0.0, 1.0)).collect()
    }
}

pub trait EcaFormulation {
    fn name(&self) -> &'static str;
    fn landscape(&self) -> &Landscape;
    fn plan(&self) -> &RestorationPlan;
    /// Builds the model of the problem with the given budget
    fn build(&self, budget: f64) -> EcaModel;
}

/// Builds and solves the model of the formulation. If `relaxed` is set, the solution is the one of
/// the linear relaxation and has fractional coefficients.
pub fn solve_formulation<F: EcaFormulation + ?Sized>(formulation: &F, budget: f64, relaxed: bool, parameters: &SolverParameters) -> Result<Solution> {
    let span = info_span!("pl_eca", formulation = formulation.name(), budget);
    let _guard = span.enter();
    let plan = formulation.plan();
    let model = formulation.build(budget);
    info!(vars = model.model.nb_vars(), constraints = model.model.nb_constraints(), "model built");
    let limits = SolveLimits { timeout: parameters.timeout(), node_limit: parameters.node_limit() };
    let result = solve_model(&model.model, &MicroLpBackend, limits, relaxed, parameters.statistics())?;
    let coefs = model.option_values(&result.values, plan.nb_options());
    let mut solution = if relaxed {
        Solution::from_relaxation(plan, coefs, result.objective, formulation.name())
    } else {
        let selection = coefs.iter().enumerate().filter(|(_, c)| **c > 0.5).map(|(i, _)| OptionIndex(i)).collect::<Vec<OptionIndex>>();
        Solution::from_selection(formulation.landscape(), plan, &selection, formulation.name())
    };
    solution.set_model_statistics(result.objective, model.model.nb_vars(), model.model.nb_constraints());
    if !relaxed && (solution.objective().sqrt() - solution.eca()).abs() > 1e-4 * solution.eca().max(1.0) {
        warn!(model = solution.objective().sqrt(), evaluated = solution.eca(), "model and landscape ECA differ");
    }
    debug_assert!(relaxed || solution.cost() <= budget + FLOAT_CMP_THRESHOLD * budget.max(1.0));
    Ok(solution)
}

/// Exact solver of the ECA maximisation, with the formulation given in the parameters
pub struct PlEcaSolver<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
    parameters: SolverParameters,
}

impl<'a> PlEcaSolver<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan, parameters: SolverParameters) -> Self {
        Self { landscape, plan, parameters }
    }

    pub fn solve(&self, budget: f64) -> Result<Solution> {
        let start = Instant::now();
        if let Some(solution) = trivial_solution(self.landscape, self.plan, budget, &self.parameters.formulation().to_string())? {
            return Ok(solution);
        }
        let mut solution = match self.parameters.formulation() {
            Formulation::PlEca2 => {
                let formulation = PlEca2::new(self.landscape, self.plan);
                solve_formulation(&formulation, budget, self.parameters.relaxed(), &self.parameters)?
            },
            Formulation::PlEca3 => {
                let precomputation = Precomputation::new(self.landscape, self.plan);
                let formulation = PlEca3::new(&precomputation);
                solve_formulation(&formulation, budget, self.parameters.relaxed(), &self.parameters)?
            },
        };
        solution.set_compute_time(start.elapsed().as_millis());
        Ok(solution)
    }
}

#[cfg(test)]
mod test_pl_eca {
    use crate::common::Formulation;
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;
    use crate::eca::eca;
    use crate::error::Error;
    use crate::solvers::pl_eca::*;

    fn instance() -> (Landscape, RestorationPlan) {
        let mut landscape = Landscape::new();
        let n0 = landscape.add_patch(4.0, 0.0, 0.0);
        let n1 = landscape.add_patch(1.0, 1.0, 0.0);
        let n2 = landscape.add_patch(4.0, 2.0, 0.0);
        let a01 = landscape.add_corridor(n0, n1, 0.3);
        let a12 = landscape.add_corridor(n1, n2, 0.3);
        let mut plan = RestorationPlan::new();
        let o0 = plan.add_option(1.0);
        plan.add_corridor(o0, a01, 0.9);
        let o1 = plan.add_option(1.0);
        plan.add_corridor(o1, a12, 0.9);
        let o2 = plan.add_option(1.5);
        plan.add_patch(o2, n1, 0.5);
        (landscape, plan)
    }

    #[test]
    pub fn both_formulations_agree() {
        let (landscape, plan) = instance();
        for budget in [1.0, 2.0, 2.5, 3.5] {
            let a = PlEcaSolver::new(&landscape, &plan, SolverParameters::default().with_formulation(Formulation::PlEca2)).solve(budget).unwrap();
            let b = PlEcaSolver::new(&landscape, &plan, SolverParameters::default().with_formulation(Formulation::PlEca3)).solve(budget).unwrap();
            assert!((a.eca() - b.eca()).abs() < 1e-6);
            assert!(a.cost() <= budget);
            assert!(b.cost() <= budget);
        }
    }

    #[test]
    pub fn chain_is_restored_together() {
        let (landscape, plan) = instance();
        let solution = PlEcaSolver::new(&landscape, &plan, SolverParameters::default()).solve(2.0).unwrap();
        assert_eq!(vec![OptionIndex(0), OptionIndex(1)], solution.selected());
    }

    #[test]
    pub fn relaxation_is_an_upper_bound() {
        let (landscape, plan) = instance();
        for formulation in [Formulation::PlEca2, Formulation::PlEca3] {
            let parameters = SolverParameters::default().with_formulation(formulation);
            let integral = PlEcaSolver::new(&landscape, &plan, parameters.clone()).solve(1.5).unwrap();
            let relaxed = PlEcaSolver::new(&landscape, &plan, parameters.with_relaxed(true)).solve(1.5).unwrap();
            assert!(relaxed.objective() >= integral.objective() - 1e-6);
        }
    }

    #[test]
    pub fn zero_budget() {
        let (landscape, plan) = instance();
        let solution = PlEcaSolver::new(&landscape, &plan, SolverParameters::default()).solve(0.0).unwrap();
        assert!(solution.selected().is_empty());
        assert!((solution.eca() - eca(&landscape)).abs() < 1e-9);
    }

    #[test]
    pub fn budget_below_cheapest_option() {
        let (landscape, plan) = instance();
        let result = PlEcaSolver::new(&landscape, &plan, SolverParameters::default()).solve(0.5);
        assert!(matches!(result, Err(Error::Infeasible { .. })));
    }
}
