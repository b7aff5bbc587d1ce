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

//! A restoration plan is the catalog of candidate restoration options for a landscape. An option
//! restores a set of existing landscape elements:
//!     1. For a patch, it increases its quality by a given gain
//!     2. For a corridor, it raises its probability to a restored value
//!
//! and has a non-negative cost. The options are stored in insertion order and are addressed by
//! their `OptionIndex`. For each element of the landscape, the plan also maintains the options that
//! reference it.
//!
//! Removing an option shifts the index of all the options after it. Any structure derived from
//! the plan (precomputation, MIP model, solution) must be rebuilt after a mutation; the revision
//! counter of the plan allows to detect such mutations.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::core::landscape::{ArcIndex, Landscape, NodeIndex};
use crate::error::{Error, Result};

/// Abstraction used as a typesafe way of retrieving a `RestorationOption` in the `RestorationPlan`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OptionIndex(pub usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestorationOption {
    /// Patches improved by the option, with their quality gain
    nodes: Vec<(NodeIndex, f64)>,
    /// Corridors improved by the option, with their restored probability
    arcs: Vec<(ArcIndex, f64)>,
    cost: f64,
}

impl RestorationOption {

    pub fn new(cost: f64) -> Self {
        Self {
            nodes: vec![],
            arcs: vec![],
            cost,
        }
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn nodes(&self) -> &[(NodeIndex, f64)] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[(ArcIndex, f64)] {
        &self.arcs
    }

    pub fn nb_elements(&self) -> usize {
        self.nodes.len() + self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.arcs.is_empty()
    }

    pub fn quality_gain(&self, node: NodeIndex) -> Option<f64> {
        self.nodes.iter().find(|(n, _)| *n == node).map(|(_, gain)| *gain)
    }

    pub fn restored_probability(&self, arc: ArcIndex) -> Option<f64> {
        self.arcs.iter().find(|(a, _)| *a == arc).map(|(_, p)| *p)
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.iter().any(|(n, _)| *n == node)
    }

    pub fn contains_arc(&self, arc: ArcIndex) -> bool {
        self.arcs.iter().any(|(a, _)| *a == arc)
    }

    fn add_node(&mut self, node: NodeIndex, gain: f64) -> bool {
        if self.contains_node(node) {
            return false;
        }
        self.nodes.push((node, gain));
        true
    }

    fn add_arc(&mut self, arc: ArcIndex, restored_probability: f64) -> bool {
        if self.contains_arc(arc) {
            return false;
        }
        self.arcs.push((arc, restored_probability));
        true
    }

    fn remove_node(&mut self, node: NodeIndex) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|(n, _)| *n != node);
        before != self.nodes.len()
    }

    fn remove_arc(&mut self, arc: ArcIndex) -> bool {
        let before = self.arcs.len();
        self.arcs.retain(|(a, _)| *a != arc);
        before != self.arcs.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RestorationPlan {
    options: Vec<RestorationOption>,
    /// For each patch, the options improving it
    node_options: FxHashMap<NodeIndex, Vec<OptionIndex>>,
    /// For each corridor, the options improving it
    arc_options: FxHashMap<ArcIndex, Vec<OptionIndex>>,
    /// Incremented at each mutation of the plan
    revision: usize,
}

impl RestorationPlan {

    pub fn new() -> Self {
        Self::default()
    }

    // --- PLAN CREATION --- //

    pub fn add_option(&mut self, cost: f64) -> OptionIndex {
        assert!(cost >= 0.0, "The cost of an option must be non-negative, got {}", cost);
        let id = OptionIndex(self.options.len());
        self.options.push(RestorationOption::new(cost));
        self.revision += 1;
        id
    }

    /// Adds a quality gain on a patch to the option. Returns false if the option already improves
    /// the patch, in which case the plan is unchanged.
    pub fn add_patch(&mut self, option: OptionIndex, node: NodeIndex, gain: f64) -> bool {
        assert!(gain >= 0.0, "Quality gains must be non-negative, got {}", gain);
        if !self.options[option.0].add_node(node, gain) {
            return false;
        }
        self.node_options.entry(node).or_default().push(option);
        self.revision += 1;
        true
    }

    /// Adds a corridor restoration to the option. Returns false if the option already restores
    /// the corridor, in which case the plan is unchanged.
    pub fn add_corridor(&mut self, option: OptionIndex, arc: ArcIndex, restored_probability: f64) -> bool {
        assert!((0.0..=1.0).contains(&restored_probability), "Restored probabilities must be in [0, 1], got {}", restored_probability);
        if !self.options[option.0].add_arc(arc, restored_probability) {
            return false;
        }
        self.arc_options.entry(arc).or_default().push(option);
        self.revision += 1;
        true
    }

    pub fn set_cost(&mut self, option: OptionIndex, cost: f64) {
        assert!(cost >= 0.0, "The cost of an option must be non-negative, got {}", cost);
        self.options[option.0].cost = cost;
        self.revision += 1;
    }

    // --- PLAN REDUCTION --- //

    /// Removes the patch from every option that references it
    pub fn remove_node(&mut self, node: NodeIndex) {
        if let Some(options) = self.node_options.remove(&node) {
            for option in options {
                self.options[option.0].remove_node(node);
            }
            self.revision += 1;
        }
    }

    /// Removes the corridor from every option that references it
    pub fn remove_arc(&mut self, arc: ArcIndex) {
        if let Some(options) = self.arc_options.remove(&arc) {
            for option in options {
                self.options[option.0].remove_arc(arc);
            }
            self.revision += 1;
        }
    }

    /// Removes an option from the plan. The options after it are shifted by one, preserving
    /// their relative order.
    pub fn remove_option(&mut self, option: OptionIndex) {
        self.options.remove(option.0);
        self.reindex();
        self.revision += 1;
    }

    /// Removes all the options that do not improve any element. Returns the number of removed
    /// options.
    pub fn remove_empty_options(&mut self) -> usize {
        let before = self.options.len();
        self.options.retain(|o| !o.is_empty());
        let removed = before - self.options.len();
        if removed > 0 {
            self.reindex();
            self.revision += 1;
        }
        removed
    }

    /// Removes from the options the corridors that are no longer in the landscape
    pub fn clean_invalid_elements(&mut self, landscape: &Landscape) {
        let invalid = self.arc_options.keys().copied().filter(|a| !landscape.is_valid_arc(*a)).collect::<Vec<ArcIndex>>();
        for arc in invalid {
            self.remove_arc(arc);
        }
    }

    fn reindex(&mut self) {
        self.node_options.clear();
        self.arc_options.clear();
        for (i, option) in self.options.iter().enumerate() {
            for (node, _) in option.nodes.iter() {
                self.node_options.entry(*node).or_default().push(OptionIndex(i));
            }
            for (arc, _) in option.arcs.iter() {
                self.arc_options.entry(*arc).or_default().push(OptionIndex(i));
            }
        }
    }

    // --- QUERIES --- //

    pub fn nb_options(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn revision(&self) -> usize {
        self.revision
    }

    pub fn options(&self) -> impl Iterator<Item = OptionIndex> {
        (0..self.options.len()).map(OptionIndex)
    }

    pub fn cost(&self, option: OptionIndex) -> f64 {
        self.options[option.0].cost
    }

    pub fn total_cost(&self) -> f64 {
        self.options.iter().map(|o| o.cost).sum()
    }

    /// Returns the cost of the cheapest option, or None if the plan is empty
    pub fn cheapest_cost(&self) -> Option<f64> {
        self.options.iter().map(|o| o.cost).min_by(|a, b| a.total_cmp(b))
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.node_options.contains_key(&node)
    }

    pub fn contains_arc(&self, arc: ArcIndex) -> bool {
        self.arc_options.contains_key(&arc)
    }

    pub fn options_of_node(&self, node: NodeIndex) -> &[OptionIndex] {
        self.node_options.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn options_of_arc(&self, arc: ArcIndex) -> &[OptionIndex] {
        self.arc_options.get(&arc).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Returns the patches improved by at least one option
    pub fn restorable_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.node_options.keys().copied()
    }

    /// Returns the corridors improved by at least one option
    pub fn restorable_arcs(&self) -> impl Iterator<Item = ArcIndex> + '_ {
        self.arc_options.keys().copied()
    }

    /// Checks that the plan only references elements of the landscape and that its values are in
    /// their domains.
    pub fn validate(&self, landscape: &Landscape) -> Result<()> {
        for (i, option) in self.options.iter().enumerate() {
            if !option.cost.is_finite() || option.cost < 0.0 {
                return Err(Error::InvalidPlan(format!("option {} has cost {}", i, option.cost)));
            }
            for (node, gain) in option.nodes.iter() {
                if node.0 >= landscape.nb_nodes() {
                    return Err(Error::InvalidPlan(format!("option {} references unknown patch {}", i, node.0)));
                }
                if !gain.is_finite() || *gain < 0.0 {
                    return Err(Error::InvalidPlan(format!("option {} has quality gain {} on patch {}", i, gain, node.0)));
                }
            }
            for (arc, probability) in option.arcs.iter() {
                if !landscape.is_valid_arc(*arc) {
                    return Err(Error::InvalidPlan(format!("option {} references unknown corridor {}", i, arc.0)));
                }
                if !(0.0..=1.0).contains(probability) {
                    return Err(Error::InvalidPlan(format!("option {} restores corridor {} to probability {}", i, arc.0, probability)));
                }
            }
        }
        Ok(())
    }
}

impl std::ops::Index<OptionIndex> for RestorationPlan {
    type Output = RestorationOption;

    fn index(&self, index: OptionIndex) -> &Self::Output {
        &self.options[index.0]
    }
}

impl fmt::Display for RestorationPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, option) in self.options.iter().enumerate() {
            writeln!(f, "option {} | cost {} | {} patches | {} corridors", i, option.cost, option.nodes.len(), option.arcs.len())?;
            for (node, gain) in option.nodes.iter() {
                writeln!(f, "\tpatch {} +{}", node.0, gain)?;
            }
            for (arc, probability) in option.arcs.iter() {
                writeln!(f, "\tcorridor {} -> {}", arc.0, probability)?;
            }
        }
        Ok(())
    }
}
