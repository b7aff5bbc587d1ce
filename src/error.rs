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

use std::path::PathBuf;

/// Failure of the underlying LP/MIP engine. None of these are retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The time or node limit was reached before optimality was proven. The bound is the
    /// objective of the root relaxation and the incumbent the best integral objective found.
    LimitReached {
        nodes: usize,
        elapsed_ms: u128,
        best_bound: Option<f64>,
        incumbent: Option<f64>,
    },
    /// The LP engine reported a failure that is not infeasibility
    Numerical(String),
    Unbounded,
    /// The constraints of the model can not be satisfied
    Infeasible,
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::LimitReached { nodes, elapsed_ms, best_bound, incumbent } => {
                write!(f, "Solver limit reached after {} nodes ({} ms), best bound {:?}, incumbent {:?}", nodes, elapsed_ms, best_bound, incumbent)
            },
            SolverError::Numerical(message) => write!(f, "LP engine failure: {}", message),
            SolverError::Unbounded => write!(f, "The relaxation is unbounded"),
            SolverError::Infeasible => write!(f, "The model has no feasible solution"),
        }
    }
}

impl std::error::Error for SolverError {}

#[derive(Debug)]
pub enum Error {
    /// The budget can not fund any option (or is not a valid budget)
    Infeasible { budget: f64, cheapest: f64 },
    Solver(SolverError),
    /// A weighted draw was attempted on a sum tree with zero total weight
    EmptySumTree,
    Parse { file: PathBuf, line: usize, message: String },
    Io { path: PathBuf, source: std::io::Error },
    InvalidPlan(String),
    /// The worker threads could not be started
    ThreadPool(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Infeasible { budget, cheapest } => write!(f, "Budget {} is infeasible, the cheapest option costs {}", budget, cheapest),
            Error::Solver(e) => write!(f, "{}", e),
            Error::EmptySumTree => write!(f, "Can not pick in a sum tree with zero total weight"),
            Error::Parse { file, line, message } => write!(f, "{}:{}: {}", file.display(), line, message),
            Error::Io { path, source } => write!(f, "Can not read {}: {}", path.display(), source),
            Error::InvalidPlan(message) => write!(f, "Invalid restoration plan: {}", message),
            Error::ThreadPool(message) => write!(f, "Can not start the worker threads: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Solver(e) => Some(e),
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SolverError> for Error {
    fn from(e: SolverError) -> Self {
        Error::Solver(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
