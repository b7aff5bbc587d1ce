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

//! Equivalent Connected Area of a landscape:
//!
//! ```text
//! ECA = sqrt( sum_s sum_t q(s) * q(t) * p(s, t) )
//! ```
//!
//! where p(s, t) is the best path probability from s to t (and p(s, s) = 1). Only the patches
//! with a positive quality contribute, so the probabilities are only computed between them. The
//! searches from each source are run in parallel, and the results are collected in order before
//! being aggregated, so that the value does not depend on the scheduling.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::core::decored::DecoredLandscape;
use crate::core::dijkstra::{best_probabilities, forward_adjacency};
use crate::core::landscape::{Landscape, NodeIndex};
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};

/// Returns the patches with a positive quality and the matrix of the best path probabilities
/// between them (row = source, column = target).
pub fn probability_matrix(view: &DecoredLandscape) -> (Vec<NodeIndex>, DMatrix<f64>) {
    let landscape = view.landscape();
    let support = landscape.nodes().filter(|n| view.quality(*n) > 0.0).collect::<Vec<NodeIndex>>();
    let adjacency = forward_adjacency(landscape, |a| view.probability(a));
    let rows = support.par_iter().map(|s| {
        let best = best_probabilities(&adjacency, s.0);
        support.iter().map(|t| best[t.0]).collect::<Vec<f64>>()
    }).collect::<Vec<Vec<f64>>>();
    let k = support.len();
    let matrix = DMatrix::from_fn(k, k, |i, j| rows[i][j]);
    (support, matrix)
}

/// Returns the squared ECA of the view, i.e. the value maximised by the MIP formulations
pub fn squared_eca_of(view: &DecoredLandscape) -> f64 {
    let (support, matrix) = probability_matrix(view);
    if support.is_empty() {
        return 0.0;
    }
    let qualities = DVector::from_iterator(support.len(), support.iter().map(|n| view.quality(*n)));
    qualities.dot(&(&matrix * &qualities)).max(0.0)
}

pub fn eca_of(view: &DecoredLandscape) -> f64 {
    squared_eca_of(view).sqrt()
}

/// ECA of the landscape without any restoration
pub fn eca(landscape: &Landscape) -> f64 {
    eca_of(&DecoredLandscape::new(landscape))
}

/// ECA of the landscape once the given options are funded
pub fn eca_with_options(landscape: &Landscape, plan: &RestorationPlan, options: &[OptionIndex]) -> f64 {
    eca_of(&DecoredLandscape::with_options(landscape, plan, options.iter().map(|o| (*o, 1.0))))
}

#[cfg(test)]
mod test_eca {
    use crate::eca::*;
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;

    #[test]
    pub fn isolated_patches() {
        let mut landscape = Landscape::new();
        landscape.add_patch(3.0, 0.0, 0.0);
        landscape.add_patch(4.0, 0.0, 0.0);
        // sqrt(9 + 16)
        assert!((eca(&landscape) - 5.0).abs() < 1e-12);
    }

    #[test]
    pub fn empty_landscape() {
        let landscape = Landscape::new();
        assert_eq!(0.0, eca(&landscape));
    }

    #[test]
    pub fn connected_patches() {
        let mut landscape = Landscape::new();
        let a = landscape.add_patch(1.0, 0.0, 0.0);
        let b = landscape.add_patch(1.0, 0.0, 0.0);
        let c = landscape.add_patch(0.0, 0.0, 0.0);
        landscape.add_corridor(a, c, 0.5);
        landscape.add_corridor(c, b, 0.5);
        landscape.add_corridor(b, a, 1.0);
        // 1 + 1 + p(a, b) + p(b, a) = 2 + 0.25 + 1
        assert!((eca(&landscape) - 3.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    pub fn restoration_increases_eca() {
        let mut landscape = Landscape::new();
        let a = landscape.add_patch(1.0, 0.0, 0.0);
        let b = landscape.add_patch(1.0, 0.0, 0.0);
        let ab = landscape.add_corridor(a, b, 0.0);
        let mut plan = RestorationPlan::new();
        let o = plan.add_option(1.0);
        plan.add_corridor(o, ab, 1.0);
        plan.add_patch(o, b, 1.0);
        // 1 + 4 + 1 * 2
        assert!((eca_with_options(&landscape, &plan, &[o]) - 7.0_f64.sqrt()).abs() < 1e-12);
        assert!((eca(&landscape) - 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
