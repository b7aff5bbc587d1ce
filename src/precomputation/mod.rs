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

//! Precomputation shared by the solvers: the landscape contracted around each target patch and
//! the marginal gain of each option. A precomputation borrows the landscape and the plan it is
//! computed from, and records their revisions. Using it with a landscape or a plan that has been
//! mutated since is a programming error and panics.

pub mod arcs;
pub mod contraction;
pub mod marginal;

use rayon::prelude::*;
use tracing::debug;

use crate::core::landscape::{Landscape, NodeIndex};
use crate::core::restoration_plan::RestorationPlan;
use arcs::{ArcClassification, ProbabilityBounds};
use contraction::ContractionResult;
use marginal::MarginalGains;

pub struct Precomputation<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
    landscape_revision: usize,
    plan_revision: usize,
    results: Vec<ContractionResult>,
    gains: MarginalGains,
}

impl<'a> Precomputation<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan) -> Self {
        let bounds = ProbabilityBounds::new(landscape, plan);
        let classification = ArcClassification::new(landscape, &bounds);
        let targets = target_nodes(landscape, plan);
        let results = targets.par_iter().map(|t| {
            let (contractable, deletable) = classification.for_target(landscape, *t);
            ContractionResult::new(landscape, plan, *t, &contractable, &deletable)
        }).collect::<Vec<ContractionResult>>();
        let gains = MarginalGains::new(&results, plan.nb_options());
        debug!(
            targets = results.len(),
            nodes = results.iter().map(|r| r.nb_nodes()).sum::<usize>(),
            arcs = results.iter().map(|r| r.nb_arcs()).sum::<usize>(),
            "contraction done"
        );
        Self {
            landscape,
            plan,
            landscape_revision: landscape.revision(),
            plan_revision: plan.revision(),
            results,
            gains,
        }
    }

    /// Panics if the landscape or the plan are not the ones the precomputation was built from, or
    /// have been modified since.
    pub fn assert_fresh(&self, landscape: &Landscape, plan: &RestorationPlan) {
        assert!(std::ptr::eq(self.landscape, landscape), "Precomputation used with another landscape");
        assert!(std::ptr::eq(self.plan, plan), "Precomputation used with another restoration plan");
        assert_eq!(self.landscape_revision, landscape.revision(), "Landscape modified since the precomputation");
        assert_eq!(self.plan_revision, plan.revision(), "Restoration plan modified since the precomputation");
    }

    pub fn landscape(&self) -> &'a Landscape {
        self.landscape
    }

    pub fn plan(&self) -> &'a RestorationPlan {
        self.plan
    }

    pub fn results(&self) -> &[ContractionResult] {
        &self.results
    }

    pub fn gains(&self) -> &MarginalGains {
        &self.gains
    }
}

/// The patches that can contribute to the ECA: the ones with a positive quality, or a quality
/// that can be restored.
pub fn target_nodes(landscape: &Landscape, plan: &RestorationPlan) -> Vec<NodeIndex> {
    landscape.nodes().filter(|n| landscape.quality(*n) > 0.0 || plan.contains_node(*n)).collect()
}
