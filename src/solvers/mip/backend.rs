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

//! Engines solving the linear relaxation of a `MipModel`, with column bounds overriding the ones
//! of the model (as set by the branch-and-bound).

use good_lp::solvers::microlp::microlp;
use good_lp::*;

use crate::error::{Result, SolverError};
use crate::solvers::mip::builder::{MipModel, Sense};

#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
}

pub trait LpBackend: Sync {
    /// Solves the linear relaxation of the model in which the bounds of column i are
    /// [lower[i], upper[i]].
    fn solve_lp(&self, model: &MipModel, lower: &[f64], upper: &[f64]) -> Result<LpOutcome>;
}

/// Pure Rust simplex, through `good_lp`
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroLpBackend;

impl LpBackend for MicroLpBackend {

    fn solve_lp(&self, model: &MipModel, lower: &[f64], upper: &[f64]) -> Result<LpOutcome> {
        if lower.iter().zip(upper.iter()).any(|(l, u)| l > u) {
            return Ok(LpOutcome::Infeasible);
        }
        let mut vars = variables!();
        let columns: Vec<Variable> = lower.iter().zip(upper.iter()).map(|(l, u)| {
            let mut definition = variable();
            if l.is_finite() {
                definition = definition.min(*l);
            }
            if u.is_finite() {
                definition = definition.max(*u);
            }
            vars.add(definition)
        }).collect();

        let objective = model.columns().iter().enumerate()
            .filter(|(_, c)| c.objective != 0.0)
            .fold(Expression::from(0.0), |acc, (i, c)| acc + c.objective * columns[i]);
        let mut problem = match model.sense() {
            Sense::Maximize => vars.maximise(objective).using(microlp),
            Sense::Minimize => vars.minimise(objective).using(microlp),
        };
        for row in model.rows() {
            if row.entries.is_empty() {
                if row.lower_bound > 0.0 || row.upper_bound < 0.0 {
                    return Ok(LpOutcome::Infeasible);
                }
                continue;
            }
            let expression = row.entries.iter().fold(Expression::from(0.0), |acc, (c, coef)| acc + *coef * columns[*c]);
            if row.upper_bound.is_finite() {
                problem.add_constraint(expression.clone().leq(row.upper_bound));
            }
            if row.lower_bound.is_finite() {
                problem.add_constraint(expression.geq(row.lower_bound));
            }
        }
        match problem.solve() {
            Ok(solution) => {
                let values = columns.iter().map(|c| solution.value(*c)).collect::<Vec<f64>>();
                let objective = model.objective_value(&values);
                Ok(LpOutcome::Optimal { values, objective })
            },
            Err(ResolutionError::Infeasible) => Ok(LpOutcome::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded.into()),
            Err(e) => Err(SolverError::Numerical(e.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod test_backend {
    use crate::solvers::mip::backend::*;
    use crate::solvers::mip::builder::*;

    #[test]
    pub fn small_lp() {
        // max x + y s.t. x + 2y <= 4, 3x + y <= 6, x, y >= 0
        let mut builder = MipBuilder::new();
        let x = builder.add_columns(VarType::continuous(2, 0.0, INFINITY));
        builder.set_objective(x, 1.0).set_objective(x + 1, 1.0);
        builder.buff_entry(x, 1.0).buff_entry(x + 1, 2.0).push_row(-INFINITY, 4.0);
        builder.buff_entry(x, 3.0).buff_entry(x + 1, 1.0).push_row(-INFINITY, 6.0);
        let model = builder.build(Sense::Maximize);
        let lower = vec![0.0, 0.0];
        let upper = vec![INFINITY, INFINITY];
        match MicroLpBackend.solve_lp(&model, &lower, &upper).unwrap() {
            LpOutcome::Optimal { values, objective } => {
                assert!((objective - 2.8).abs() < 1e-6);
                assert!((values[0] - 1.6).abs() < 1e-6);
                assert!((values[1] - 1.2).abs() < 1e-6);
            },
            LpOutcome::Infeasible => panic!("The LP is feasible"),
        }
    }

    #[test]
    pub fn infeasible_bounds() {
        let mut builder = MipBuilder::new();
        builder.add_columns(VarType::binary(1));
        builder.buff_entry(0, 1.0).push_row(2.0, INFINITY);
        let model = builder.build(Sense::Minimize);
        assert_eq!(LpOutcome::Infeasible, MicroLpBackend.solve_lp(&model, &[0.0], &[1.0]).unwrap());
        assert_eq!(LpOutcome::Infeasible, MicroLpBackend.solve_lp(&model, &[1.0], &[0.0]).unwrap());
    }
}
