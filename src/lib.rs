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


// Re-export the modules
pub mod common;
pub mod core;
pub mod error;
pub mod eca;
pub mod solution;
mod statistics;
mod logger;
pub mod precomputation;
pub mod solvers;
pub mod parsers;
pub mod args;

use tracing::info;

use parsers::{Parser, StdLandscapeParser, StdRestorationPlanParser};
use args::*;

pub use common::*;
pub use error::{Error, Result, SolverError};
pub use solution::Solution;
pub use solvers::{solve, GenericSolver, SolverParameters};

use peak_alloc::PeakAlloc;
#[global_allocator]
pub static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Reads the landscape and the restoration plan given in the arguments, and selects the options
/// to fund with the requested method.
pub fn run(args: &Args) -> Result<Solution> {
    let landscape = StdLandscapeParser.parse(args.landscape())?;
    let plan = StdRestorationPlanParser::new(&landscape).parse(args.plan())?;
    info!(patches = landscape.nb_nodes(), corridors = landscape.nb_arcs(), options = plan.nb_options(), "instance loaded");
    let solution = solve(&landscape, &plan, args.budget(), args.method(), args.solver_param())?;
    solution.print();
    if args.statistics() {
        println!("Peak memory usage {} Mb", PEAK_ALLOC.peak_usage_as_mb());
    }
    Ok(solution)
}
