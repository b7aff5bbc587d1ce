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
use clap::ValueEnum;

/// Coefficients below this threshold are considered as 0
pub const FLOAT_CMP_THRESHOLD: f64 = 0.000000001;

/// Distance to the nearest integer under which an LP value is considered integral
pub const INTEGRALITY_TOLERANCE: f64 = 0.000001;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Method {
    /// Exact resolution of a MIP formulation
    PlEca,
    /// Randomized rounding of the relaxation of a MIP formulation
    RandomizedRounding,
    /// Options sorted once by marginal gain per unit of cost
    NaiveInc,
    /// Iteratively adds the option with the best gain per unit of cost
    GreedyInc,
    /// Iteratively removes the option with the smallest loss per unit of cost
    GreedyDec,
    /// Options sorted once by the loss of their removal per unit of cost, removed until the budget fits
    NaiveDec,
    /// Options drawn uniformly at random, bought while they fit
    Bogo,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Formulation {
    /// Flow formulation on the whole landscape, with one global big-M constant
    PlEca2,
    /// Flow formulation on the landscapes contracted for each target patch, with tight constants
    PlEca3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Weighting {
    /// Options are drawn proportionally to their value in the relaxation
    Fractional,
    /// Options are drawn proportionally to their value in the relaxation times their marginal gain
    GainWeighted,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::PlEca => write!(f, "pl-eca"),
            Method::RandomizedRounding => write!(f, "randomized-rounding"),
            Method::NaiveInc => write!(f, "naive-inc"),
            Method::GreedyInc => write!(f, "greedy-inc"),
            Method::GreedyDec => write!(f, "greedy-dec"),
            Method::NaiveDec => write!(f, "naive-dec"),
            Method::Bogo => write!(f, "bogo"),
        }
    }
}

impl std::fmt::Display for Formulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formulation::PlEca2 => write!(f, "pl-eca-2"),
            Formulation::PlEca3 => write!(f, "pl-eca-3"),
        }
    }
}

impl std::fmt::Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Weighting::Fractional => write!(f, "fractional"),
            Weighting::GainWeighted => write!(f, "gain-weighted"),
        }
    }
}
