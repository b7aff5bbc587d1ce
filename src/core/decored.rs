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

//! A decored landscape is a view of a landscape on which restoration options have been applied.
//! The base landscape is borrowed immutably; the view owns its own qualities and probabilities.
//! Applying an option with a coefficient c (1 for a funded option, in [0, 1] for fractional
//! solutions)
//!     - adds c * gain to the quality of each improved patch
//!     - sets the probability of each restored corridor to max(current, p + c * (restored - p))
//!
//! so that quality gains of several options add up while corridor restorations do not.

use crate::core::landscape::{ArcIndex, Landscape, NodeIndex};
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};

#[derive(Debug, Clone)]
pub struct DecoredLandscape<'a> {
    landscape: &'a Landscape,
    qualities: Vec<f64>,
    /// Indexed by the arc index space of the landscape; removed corridors keep a probability of 0
    probabilities: Vec<f64>,
}

impl<'a> DecoredLandscape<'a> {

    pub fn new(landscape: &'a Landscape) -> Self {
        let qualities = landscape.nodes().map(|n| landscape.quality(n)).collect();
        let mut probabilities = vec![0.0; landscape.arc_capacity()];
        for arc in landscape.arcs() {
            probabilities[arc.0] = landscape.probability(arc);
        }
        Self {
            landscape,
            qualities,
            probabilities,
        }
    }

    /// Builds the view of the landscape in which the options are applied with their coefficient
    pub fn with_options<I>(landscape: &'a Landscape, plan: &RestorationPlan, options: I) -> Self
        where I: IntoIterator<Item = (OptionIndex, f64)>
    {
        let mut decored = Self::new(landscape);
        for (option, coef) in options {
            decored.apply(plan, option, coef);
        }
        decored
    }

    pub fn apply(&mut self, plan: &RestorationPlan, option: OptionIndex, coef: f64) {
        for (node, gain) in plan[option].nodes().iter().copied() {
            self.qualities[node.0] += coef * gain;
        }
        for (arc, restored) in plan[option].arcs().iter().copied() {
            if !self.landscape.is_valid_arc(arc) {
                continue;
            }
            let base = self.landscape.probability(arc);
            let improved = base + coef * (restored - base);
            if improved > self.probabilities[arc.0] {
                self.probabilities[arc.0] = improved;
            }
        }
    }

    pub fn landscape(&self) -> &'a Landscape {
        self.landscape
    }

    pub fn quality(&self, node: NodeIndex) -> f64 {
        self.qualities[node.0]
    }

    pub fn probability(&self, arc: ArcIndex) -> f64 {
        self.probabilities[arc.0]
    }

    pub fn qualities(&self) -> &[f64] {
        &self.qualities
    }
}

#[cfg(test)]
mod test_decored {
    use crate::core::decored::*;
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;

    #[test]
    pub fn apply_options() {
        let mut landscape = Landscape::new();
        let a = landscape.add_patch(1.0, 0.0, 0.0);
        let b = landscape.add_patch(2.0, 0.0, 0.0);
        let ab = landscape.add_corridor(a, b, 0.2);
        let mut plan = RestorationPlan::new();
        let o0 = plan.add_option(1.0);
        let o1 = plan.add_option(1.0);
        plan.add_corridor(o0, ab, 0.6);
        plan.add_patch(o0, b, 1.0);
        plan.add_corridor(o1, ab, 0.4);
        plan.add_patch(o1, b, 0.5);

        let decored = DecoredLandscape::with_options(&landscape, &plan, vec![(o0, 1.0), (o1, 1.0)]);
        assert_eq!(0.6, decored.probability(ab));
        assert_eq!(3.5, decored.quality(b));
        assert_eq!(1.0, decored.quality(a));
        // The base landscape is untouched
        assert_eq!(0.2, landscape.probability(ab));
        assert_eq!(2.0, landscape.quality(b));

        let half = DecoredLandscape::with_options(&landscape, &plan, vec![(o0, 0.5)]);
        assert!((half.probability(ab) - 0.4).abs() < 1e-12);
        assert_eq!(2.5, half.quality(b));
    }
}
