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

//! Classification of the corridors with respect to a target patch. The probability of a corridor
//! lies between its base probability (p_min) and the best probability any option restores it to
//! (p_max). For a corridor (u, v) and a target t, the corridor is
//!     - strong if, whatever the restorations, every best path from u to t starts with (u, v).
//!       It is detected by a search from u in which (u, v) and the paths continuing it take their
//!       worst probabilities while every other path takes its best ones.
//!     - useless if, whatever the restorations, no best path from u to t uses (u, v). It is
//!       detected by the opposite search.
//!
//! In both searches the paths going through (u, v) are labeled, and a labeled path wins the ties.
//! Any best path from a patch s to t that goes through u continues with a best path from u to t,
//! hence a strong corridor can be contracted and a useless one deleted in the graph of t.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::core::landscape::{ArcIndex, Landscape, NodeIndex};
use crate::core::restoration_plan::RestorationPlan;

#[derive(Debug, Clone, Copy)]
struct LabeledEntry {
    value: f64,
    labeled: bool,
    node: usize,
}

impl PartialEq for LabeledEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LabeledEntry {}

impl PartialOrd for LabeledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LabeledEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
            .then_with(|| self.labeled.cmp(&other.labeled))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Bounds on the probabilities of the corridors, indexed by the arc index space of the landscape
pub struct ProbabilityBounds {
    pub p_min: Vec<f64>,
    pub p_max: Vec<f64>,
}

impl ProbabilityBounds {

    pub fn new(landscape: &Landscape, plan: &RestorationPlan) -> Self {
        let mut p_min = vec![0.0; landscape.arc_capacity()];
        let mut p_max = vec![0.0; landscape.arc_capacity()];
        for arc in landscape.arcs() {
            p_min[arc.0] = landscape.probability(arc);
            p_max[arc.0] = p_min[arc.0];
            for option in plan.options_of_arc(arc).iter().copied() {
                if let Some(restored) = plan[option].restored_probability(arc) {
                    p_max[arc.0] = p_max[arc.0].max(restored);
                }
            }
        }
        Self { p_min, p_max }
    }
}

/// For each corridor, the patches for which it is strong and the patches for which it is useful
/// (i.e. not useless). Both lists are sorted.
pub struct ArcClassification {
    strong: Vec<Vec<NodeIndex>>,
    useful: Vec<Vec<NodeIndex>>,
}

impl ArcClassification {

    pub fn new(landscape: &Landscape, bounds: &ProbabilityBounds) -> Self {
        let arcs = landscape.arcs().collect::<Vec<ArcIndex>>();
        let classified = arcs.par_iter().map(|arc| {
            (identify_strong(landscape, bounds, *arc), identify_useful(landscape, bounds, *arc))
        }).collect::<Vec<(Vec<NodeIndex>, Vec<NodeIndex>)>>();
        let mut strong = vec![vec![]; landscape.arc_capacity()];
        let mut useful = vec![vec![]; landscape.arc_capacity()];
        for (arc, (s, u)) in arcs.iter().zip(classified) {
            strong[arc.0] = s;
            useful[arc.0] = u;
        }
        Self { strong, useful }
    }

    pub fn is_strong(&self, arc: ArcIndex, target: NodeIndex) -> bool {
        self.strong[arc.0].binary_search(&target).is_ok()
    }

    pub fn is_useless(&self, arc: ArcIndex, target: NodeIndex) -> bool {
        self.useful[arc.0].binary_search(&target).is_err()
    }

    /// Returns, for the target, the corridors that can be contracted and the ones that can be
    /// deleted.
    pub fn for_target(&self, landscape: &Landscape, target: NodeIndex) -> (Vec<ArcIndex>, Vec<ArcIndex>) {
        let contractable = landscape.arcs().filter(|a| self.is_strong(*a, target)).collect();
        let deletable = landscape.arcs().filter(|a| self.is_useless(*a, target)).collect();
        (contractable, deletable)
    }
}

/// Labeled search from the source of the arc. The arc starts the labeled paths. Labeled paths
/// are extended with the probabilities of `labeled_bound` and unlabeled ones with the
/// probabilities of `unlabeled_bound`. Returns, for each patch, whether its best path is labeled,
/// or None if it is unreachable.
fn labeled_search(landscape: &Landscape, arc: ArcIndex, labeled_bound: &[f64], unlabeled_bound: &[f64]) -> Vec<Option<bool>> {
    let n = landscape.nb_nodes();
    let source = landscape.source(arc).0;
    let mut best: Vec<Option<(f64, bool)>> = vec![None; n];
    let mut settled: Vec<Option<bool>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    let improves = |current: Option<(f64, bool)>, value: f64, labeled: bool| -> bool {
        match current {
            None => value > 0.0,
            Some((v, l)) => value > v || (value == v && labeled && !l),
        }
    };

    settled[source] = Some(false);
    for a in landscape.out_arcs(NodeIndex(source)) {
        let (value, labeled) = if a == arc {
            (labeled_bound[a.0], true)
        } else {
            (unlabeled_bound[a.0], false)
        };
        let next = landscape.target(a).0;
        if settled[next].is_none() && improves(best[next], value, labeled) {
            best[next] = Some((value, labeled));
            heap.push(LabeledEntry { value, labeled, node: next });
        }
    }

    while let Some(LabeledEntry { value, labeled, node }) = heap.pop() {
        if settled[node].is_some() {
            continue;
        }
        settled[node] = Some(labeled);
        let bound = if labeled { labeled_bound } else { unlabeled_bound };
        for a in landscape.out_arcs(NodeIndex(node)) {
            let next = landscape.target(a).0;
            let candidate = value * bound[a.0];
            if settled[next].is_none() && improves(best[next], candidate, labeled) {
                best[next] = Some((candidate, labeled));
                heap.push(LabeledEntry { value: candidate, labeled, node: next });
            }
        }
    }
    settled
}

/// Patches (other than the source of the arc) for which the arc is strong
fn identify_strong(landscape: &Landscape, bounds: &ProbabilityBounds, arc: ArcIndex) -> Vec<NodeIndex> {
    let source = landscape.source(arc);
    labeled_search(landscape, arc, &bounds.p_min, &bounds.p_max).iter().enumerate()
        .filter(|(i, l)| *i != source.0 && **l == Some(true))
        .map(|(i, _)| NodeIndex(i))
        .collect()
}

/// Patches for which the arc can be on a best path
fn identify_useful(landscape: &Landscape, bounds: &ProbabilityBounds, arc: ArcIndex) -> Vec<NodeIndex> {
    labeled_search(landscape, arc, &bounds.p_max, &bounds.p_min).iter().enumerate()
        .filter(|(_, l)| **l == Some(true))
        .map(|(i, _)| NodeIndex(i))
        .collect()
}

#[cfg(test)]
mod test_arcs {
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;
    use crate::precomputation::arcs::*;

    // 0 -> 1 -> 2 with a restorable shortcut 0 -> 2
    fn instance() -> (Landscape, RestorationPlan) {
        let mut landscape = Landscape::new();
        let nodes = (0..3).map(|_| landscape.add_patch(1.0, 0.0, 0.0)).collect::<Vec<NodeIndex>>();
        landscape.add_corridor(nodes[0], nodes[1], 0.9);
        landscape.add_corridor(nodes[1], nodes[2], 0.9);
        let shortcut = landscape.add_corridor(nodes[0], nodes[2], 0.1);
        let mut plan = RestorationPlan::new();
        let o = plan.add_option(1.0);
        plan.add_corridor(o, shortcut, 0.95);
        (landscape, plan)
    }

    #[test]
    pub fn bounds() {
        let (landscape, plan) = instance();
        let bounds = ProbabilityBounds::new(&landscape, &plan);
        assert_eq!(vec![0.9, 0.9, 0.1], bounds.p_min);
        assert_eq!(vec![0.9, 0.9, 0.95], bounds.p_max);
    }

    #[test]
    pub fn strong_arcs() {
        let (landscape, plan) = instance();
        let bounds = ProbabilityBounds::new(&landscape, &plan);
        let classification = ArcClassification::new(&landscape, &bounds);
        // Only path from 1 to 2
        assert!(classification.is_strong(ArcIndex(1), NodeIndex(2)));
        // The shortcut may be better than 0 -> 1 -> 2
        assert!(!classification.is_strong(ArcIndex(0), NodeIndex(2)));
        assert!(classification.is_strong(ArcIndex(0), NodeIndex(1)));
        assert!(!classification.is_strong(ArcIndex(0), NodeIndex(0)));
    }

    #[test]
    pub fn useless_arcs() {
        let (landscape, plan) = instance();
        let bounds = ProbabilityBounds::new(&landscape, &plan);
        let classification = ArcClassification::new(&landscape, &bounds);
        // Both paths from 0 to 2 can be the best one
        assert!(!classification.is_useless(ArcIndex(0), NodeIndex(2)));
        assert!(!classification.is_useless(ArcIndex(2), NodeIndex(2)));
        // The shortcut never helps to reach 1, and nothing helps to reach 0
        assert!(classification.is_useless(ArcIndex(2), NodeIndex(1)));
        assert!(classification.is_useless(ArcIndex(0), NodeIndex(0)));
        let (contractable, deletable) = classification.for_target(&landscape, NodeIndex(1));
        assert_eq!(vec![ArcIndex(0)], contractable);
        assert_eq!(vec![ArcIndex(1), ArcIndex(2)], deletable);
    }
}
