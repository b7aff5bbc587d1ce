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


//! Mixed-integer programming layer: model construction, LP engines and a branch-and-bound on top
//! of them.

pub mod builder;
pub mod backend;
pub mod branch_and_bound;

pub use backend::{LpBackend, LpOutcome, MicroLpBackend};
pub use branch_and_bound::{MipSolution, QuietBranchAndBound, SolveLimits, StatBranchAndBound};
pub use builder::{MipBuilder, MipModel, Sense, VarType, INFINITY};

use crate::error::Result;

/// Solves the model, or only its linear relaxation if `relaxed` is set. When `statistics` is set,
/// the statistics of the search are printed at the end.
pub fn solve_model<L: LpBackend>(model: &MipModel, backend: &L, limits: SolveLimits, relaxed: bool, statistics: bool) -> Result<MipSolution> {
    if statistics {
        let mut solver = StatBranchAndBound::new(model, backend, limits);
        if relaxed { solver.solve_relaxation() } else { solver.solve() }
    } else {
        let mut solver = QuietBranchAndBound::new(model, backend, limits);
        if relaxed { solver.solve_relaxation() } else { solver.solve() }
    }
}
