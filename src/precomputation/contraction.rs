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

//! Contraction of the landscape around a target patch t. The result is a smaller graph in which
//! the flow reaching t, sum_s q(s) * p(s, t), is the same as in the landscape for every
//! combination of funded options. It is obtained by
//!     1. Deleting the corridors that are useless for t
//!     2. Contracting the corridors (u, v) that are strong for t and not restorable: u is merged
//!        into v. Its incoming corridors are redirected to v with their probabilities multiplied
//!        by p(u, v), and its quality (and quality gains) are added to v, scaled by p(u, v).
//!     3. Removing the patches that can not reach t, and the patches that can not send any flow
//!        (no quality, no gain and no incoming corridor).

use std::collections::VecDeque;

use crate::core::dijkstra::{Adjacency, best_probabilities, flow_into};
use crate::core::landscape::{ArcIndex, Landscape, NodeIndex};
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};

#[derive(Debug, Clone, PartialEq)]
pub struct ContractedNode {
    /// Patch of the landscape in which the other patches have been merged
    pub origin: NodeIndex,
    pub quality: f64,
    /// Quality gains of the options, including the gains of the merged patches
    pub gains: Vec<(OptionIndex, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractedArc {
    pub source: usize,
    pub target: usize,
    pub probability: f64,
    /// Probability of the arc if the option is funded
    pub restorations: Vec<(OptionIndex, f64)>,
}

#[derive(Debug, Clone)]
pub struct ContractionResult {
    nodes: Vec<ContractedNode>,
    arcs: Vec<ContractedArc>,
    out_arcs: Vec<Vec<usize>>,
    in_arcs: Vec<Vec<usize>>,
    /// Index of the target patch in the contracted graph
    target: usize,
    /// Quality of the target in the landscape
    target_quality: f64,
    /// Quality gains of the options on the target in the plan
    target_gains: Vec<(OptionIndex, f64)>,
    /// Options that modify the contracted graph, sorted
    options: Vec<OptionIndex>,
}

fn add_gain(gains: &mut Vec<(OptionIndex, f64)>, option: OptionIndex, gain: f64) {
    match gains.iter_mut().find(|(o, _)| *o == option) {
        Some((_, g)) => *g += gain,
        None => gains.push((option, gain)),
    }
}

/// Working copy of the landscape used during the contraction
struct ContractionGraph {
    alive: Vec<bool>,
    qualities: Vec<f64>,
    gains: Vec<Vec<(OptionIndex, f64)>>,
    arcs: Vec<Option<ContractedArc>>,
    out_arcs: Vec<Vec<usize>>,
    in_arcs: Vec<Vec<usize>>,
}

impl ContractionGraph {

    fn new(landscape: &Landscape, plan: &RestorationPlan) -> Self {
        let n = landscape.nb_nodes();
        let mut gains = vec![vec![]; n];
        for node in landscape.nodes() {
            for option in plan.options_of_node(node).iter().copied() {
                if let Some(gain) = plan[option].quality_gain(node) {
                    add_gain(&mut gains[node.0], option, gain);
                }
            }
        }
        let mut arcs = vec![None; landscape.arc_capacity()];
        let mut out_arcs = vec![vec![]; n];
        let mut in_arcs = vec![vec![]; n];
        for arc in landscape.arcs() {
            let restorations = plan.options_of_arc(arc).iter().copied()
                .filter_map(|o| plan[o].restored_probability(arc).map(|p| (o, p)))
                .collect();
            let source = landscape.source(arc).0;
            let target = landscape.target(arc).0;
            arcs[arc.0] = Some(ContractedArc { source, target, probability: landscape.probability(arc), restorations });
            out_arcs[source].push(arc.0);
            in_arcs[target].push(arc.0);
        }
        Self {
            alive: vec![true; n],
            qualities: landscape.nodes().map(|n| landscape.quality(n)).collect(),
            gains,
            arcs,
            out_arcs,
            in_arcs,
        }
    }

    fn delete_arc(&mut self, arc: usize) {
        self.arcs[arc] = None;
    }

    fn delete_node(&mut self, node: usize) {
        self.alive[node] = false;
        // The lists may contain arcs that have been redirected to another patch since
        for arc in self.out_arcs[node].iter().chain(self.in_arcs[node].iter()) {
            if self.arcs[*arc].as_ref().is_some_and(|a| a.source == node || a.target == node) {
                self.arcs[*arc] = None;
            }
        }
    }

    fn live_in_arcs(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.in_arcs[node].iter().copied().filter(move |a| self.arcs[*a].as_ref().is_some_and(|arc| arc.target == node))
    }

    fn live_out_arcs(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.out_arcs[node].iter().copied().filter(move |a| self.arcs[*a].as_ref().is_some_and(|arc| arc.source == node))
    }

    /// Merges the source of the arc into its target
    fn contract(&mut self, arc: usize) {
        let (u, v, p) = match &self.arcs[arc] {
            Some(a) => (a.source, a.target, a.probability),
            None => return,
        };
        if u == v {
            self.delete_arc(arc);
            return;
        }
        for b in self.live_in_arcs(u).collect::<Vec<usize>>() {
            let mut redirected = match self.arcs[b].take() {
                Some(a) => a,
                None => continue,
            };
            if redirected.source == v {
                continue;
            }
            redirected.target = v;
            redirected.probability *= p;
            for (_, restored) in redirected.restorations.iter_mut() {
                *restored *= p;
            }
            self.arcs[b] = Some(redirected);
            self.in_arcs[v].push(b);
        }
        self.qualities[v] += p * self.qualities[u];
        for (option, gain) in std::mem::take(&mut self.gains[u]) {
            add_gain(&mut self.gains[v], option, p * gain);
        }
        self.delete_node(u);
    }

    fn can_flow(arc: &ContractedArc) -> bool {
        arc.probability > 0.0 || arc.restorations.iter().any(|(_, p)| *p > 0.0)
    }

    /// Removes the patches from which the target can not be reached
    fn remove_unreachable(&mut self, target: usize) {
        let mut reached = vec![false; self.alive.len()];
        let mut queue = VecDeque::new();
        reached[target] = true;
        queue.push_back(target);
        while let Some(node) = queue.pop_front() {
            for arc in self.live_in_arcs(node).collect::<Vec<usize>>() {
                let (source, flows) = match &self.arcs[arc] {
                    Some(a) => (a.source, Self::can_flow(a)),
                    None => continue,
                };
                if flows && !reached[source] {
                    reached[source] = true;
                    queue.push_back(source);
                }
            }
        }
        for node in 0..self.alive.len() {
            if self.alive[node] && !reached[node] {
                self.delete_node(node);
            }
        }
    }

    /// Removes the patches, other than the target, that can not send any flow
    fn remove_sterile(&mut self, target: usize) {
        let mut queue = (0..self.alive.len()).collect::<VecDeque<usize>>();
        while let Some(node) = queue.pop_front() {
            if node == target || !self.alive[node] {
                continue;
            }
            if self.qualities[node] > 0.0 || !self.gains[node].is_empty() || self.live_in_arcs(node).next().is_some() {
                continue;
            }
            let successors = self.live_out_arcs(node).filter_map(|a| self.arcs[a].as_ref().map(|arc| arc.target)).collect::<Vec<usize>>();
            self.delete_node(node);
            queue.extend(successors);
        }
    }
}

impl ContractionResult {

    /// Contracts the landscape for the target, given the corridors that are strong and useless
    /// for it.
    pub fn new(landscape: &Landscape, plan: &RestorationPlan, target: NodeIndex, contractable: &[ArcIndex], deletable: &[ArcIndex]) -> Self {
        let mut graph = ContractionGraph::new(landscape, plan);
        for arc in deletable.iter().copied() {
            graph.delete_arc(arc.0);
        }
        for arc in contractable.iter().copied() {
            let contract = match &graph.arcs[arc.0] {
                Some(a) => a.restorations.is_empty() && a.source != target.0,
                None => false,
            };
            if contract {
                graph.contract(arc.0);
            }
        }
        graph.remove_unreachable(target.0);
        graph.remove_sterile(target.0);

        let mut mapping = vec![usize::MAX; graph.alive.len()];
        let mut nodes = vec![];
        for node in 0..graph.alive.len() {
            if graph.alive[node] {
                mapping[node] = nodes.len();
                nodes.push(ContractedNode {
                    origin: NodeIndex(node),
                    quality: graph.qualities[node],
                    gains: std::mem::take(&mut graph.gains[node]),
                });
            }
        }
        let mut arcs = vec![];
        let mut out_arcs = vec![vec![]; nodes.len()];
        let mut in_arcs = vec![vec![]; nodes.len()];
        for arc in graph.arcs.into_iter().flatten() {
            if !graph.alive[arc.source] || !graph.alive[arc.target] || arc.source == arc.target || !ContractionGraph::can_flow(&arc) {
                continue;
            }
            let id = arcs.len();
            let source = mapping[arc.source];
            let target = mapping[arc.target];
            out_arcs[source].push(id);
            in_arcs[target].push(id);
            arcs.push(ContractedArc { source, target, probability: arc.probability, restorations: arc.restorations });
        }
        let mut options = nodes.iter().flat_map(|n| n.gains.iter().map(|(o, _)| *o))
            .chain(arcs.iter().flat_map(|a| a.restorations.iter().map(|(o, _)| *o)))
            .collect::<Vec<OptionIndex>>();
        options.sort();
        options.dedup();
        let target_gains = plan.options_of_node(target).iter().copied()
            .filter_map(|o| plan[o].quality_gain(target).map(|g| (o, g)))
            .collect();
        Self {
            target: mapping[target.0],
            nodes,
            arcs,
            out_arcs,
            in_arcs,
            target_quality: landscape.quality(target),
            target_gains,
            options,
        }
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nb_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn nodes(&self) -> &[ContractedNode] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[ContractedArc] {
        &self.arcs
    }

    pub fn out_arcs(&self, node: usize) -> &[usize] {
        &self.out_arcs[node]
    }

    pub fn in_arcs(&self, node: usize) -> &[usize] {
        &self.in_arcs[node]
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn origin_target(&self) -> NodeIndex {
        self.nodes[self.target].origin
    }

    pub fn target_quality(&self) -> f64 {
        self.target_quality
    }

    pub fn target_gains(&self) -> &[(OptionIndex, f64)] {
        &self.target_gains
    }

    pub fn options(&self) -> &[OptionIndex] {
        &self.options
    }

    pub fn touches(&self, option: OptionIndex) -> bool {
        self.options.binary_search(&option).is_ok()
    }

    /// Adjacency of the reversed contracted graph, with the probability of the arcs when the
    /// given options are funded.
    fn backward_adjacency(&self, funded: &[OptionIndex]) -> Adjacency {
        let mut adjacency = vec![vec![]; self.nodes.len()];
        for arc in self.arcs.iter() {
            let p = arc.restorations.iter().filter(|(o, _)| funded.contains(o)).map(|(_, p)| *p).fold(arc.probability, f64::max);
            if p > 0.0 {
                adjacency[arc.target].push((arc.source, p));
            }
        }
        adjacency
    }

    /// Weight of the target in the objective (its quality in the restored landscape)
    pub fn target_weight(&self, funded: &[OptionIndex]) -> f64 {
        self.target_quality + self.target_gains.iter().filter(|(o, _)| funded.contains(o)).map(|(_, g)| *g).sum::<f64>()
    }

    /// Returns the flow reaching the target when the given options are funded
    pub fn flow(&self, funded: &[OptionIndex]) -> f64 {
        let qualities = self.nodes.iter().map(|n| {
            n.quality + n.gains.iter().filter(|(o, _)| funded.contains(o)).map(|(_, g)| *g).sum::<f64>()
        }).collect::<Vec<f64>>();
        flow_into(&self.backward_adjacency(funded), &qualities, self.target)
    }

    /// Returns an upper bound on the flow that can reach the node, whatever options are funded.
    /// It is the big-M constant of the flow formulation on this graph.
    pub fn max_flow_in(&self, node: usize) -> f64 {
        let mut adjacency = vec![vec![]; self.nodes.len()];
        for arc in self.arcs.iter() {
            let p = arc.restorations.iter().map(|(_, p)| *p).fold(arc.probability, f64::max);
            if p > 0.0 {
                adjacency[arc.target].push((arc.source, p));
            }
        }
        let best = best_probabilities(&adjacency, node);
        self.nodes.iter().zip(best.iter()).map(|(n, p)| {
            p * (n.quality + n.gains.iter().map(|(_, g)| *g).sum::<f64>())
        }).sum()
    }
}

#[cfg(test)]
mod test_contraction {
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;
    use crate::precomputation::arcs::*;
    use crate::precomputation::contraction::*;

    // 0 -> 1 -> 2 -> 3, with a restorable corridor 1 -> 2 and a gain on 0
    fn chain() -> (Landscape, RestorationPlan) {
        let mut landscape = Landscape::new();
        let nodes = (0..4).map(|i| landscape.add_patch(i as f64 + 1.0, 0.0, 0.0)).collect::<Vec<NodeIndex>>();
        landscape.add_corridor(nodes[0], nodes[1], 0.5);
        let restorable = landscape.add_corridor(nodes[1], nodes[2], 0.2);
        landscape.add_corridor(nodes[2], nodes[3], 0.8);
        let mut plan = RestorationPlan::new();
        let o0 = plan.add_option(1.0);
        plan.add_corridor(o0, restorable, 0.6);
        let o1 = plan.add_option(1.0);
        plan.add_patch(o1, nodes[0], 2.0);
        (landscape, plan)
    }

    fn contract(landscape: &Landscape, plan: &RestorationPlan, target: NodeIndex) -> ContractionResult {
        let bounds = ProbabilityBounds::new(landscape, plan);
        let classification = ArcClassification::new(landscape, &bounds);
        let (contractable, deletable) = classification.for_target(landscape, target);
        ContractionResult::new(landscape, plan, target, &contractable, &deletable)
    }

    #[test]
    pub fn chain_is_contracted() {
        let (landscape, plan) = chain();
        let result = contract(&landscape, &plan, NodeIndex(3));
        // 0 is merged into 1; 2 is merged into 3
        assert_eq!(2, result.nb_nodes());
        assert_eq!(1, result.nb_arcs());
        assert_eq!(NodeIndex(3), result.origin_target());
        let merged = &result.nodes()[0];
        assert_eq!(NodeIndex(1), merged.origin);
        assert_eq!(2.5, merged.quality);
        assert_eq!(vec![(OptionIndex(1), 1.0)], merged.gains);
        assert_eq!(vec![OptionIndex(0), OptionIndex(1)], result.options());
        let arc = &result.arcs()[0];
        assert!((arc.probability - 0.16).abs() < 1e-12);
        assert!((arc.restorations[0].1 - 0.48).abs() < 1e-12);
    }

    #[test]
    pub fn flow_matches_landscape() {
        let (landscape, plan) = chain();
        let result = contract(&landscape, &plan, NodeIndex(3));
        // q(0) p(0, 3) + q(1) p(1, 3) + q(2) p(2, 3) + q(3)
        let base = 1.0 * 0.08 + 2.0 * 0.16 + 3.0 * 0.8 + 4.0;
        assert!((result.flow(&[]) - base).abs() < 1e-12);
        let restored = 3.0 * 0.24 + 2.0 * 0.48 + 3.0 * 0.8 + 4.0;
        assert!((result.flow(&[OptionIndex(0), OptionIndex(1)]) - restored).abs() < 1e-12);
        assert!((result.max_flow_in(result.target()) - restored).abs() < 1e-12);
        assert_eq!(4.0, result.target_weight(&[OptionIndex(1)]));
    }

    #[test]
    pub fn unreachable_patches_are_removed() {
        let (landscape, plan) = chain();
        let result = contract(&landscape, &plan, NodeIndex(0));
        assert_eq!(1, result.nb_nodes());
        assert_eq!(0, result.nb_arcs());
        assert_eq!(vec![(OptionIndex(1), 2.0)], result.target_gains());
        assert_eq!(3.0, result.target_weight(&[OptionIndex(1)]));
        assert_eq!(1.0, result.flow(&[]));
        assert_eq!(3.0, result.flow(&[OptionIndex(1)]));
    }
}
