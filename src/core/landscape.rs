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

//! The landscape is a directed graph in which the nodes are habitat patches and the arcs are
//! corridors between them. Each patch has a quality (its area, or any capacity weight) and each
//! corridor has the probability that an individual successfully travels along it.
//!
//! Corridors can be removed. Their index is then tombstoned so that the indexes used by a
//! restoration plan stay valid.

/// Abstraction used as a typesafe way of retrieving a `Patch` in the `Landscape` structure
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeIndex(pub usize);

/// Abstraction used as a typesafe way of retrieving a `Corridor` in the `Landscape` structure
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ArcIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    /// Quality of the patch
    pub quality: f64,
    /// Coordinates of the patch, only used for reporting
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corridor {
    pub source: NodeIndex,
    pub target: NodeIndex,
    /// Probability that an individual crosses the corridor
    pub probability: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Landscape {
    /// Patches of the landscape
    patches: Vec<Patch>,
    /// Corridors of the landscape. A removed corridor is replaced by None
    corridors: Vec<Option<Corridor>>,
    /// Outgoing corridors of each patch
    out_arcs: Vec<Vec<ArcIndex>>,
    /// Incoming corridors of each patch
    in_arcs: Vec<Vec<ArcIndex>>,
    /// Number of corridors that have not been removed
    number_live_arcs: usize,
    /// Incremented at each mutation of the landscape
    revision: usize,
}

impl Landscape {

    // --- LANDSCAPE CREATION --- //

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patch(&mut self, quality: f64, x: f64, y: f64) -> NodeIndex {
        assert!(quality >= 0.0, "Patch quality must be non-negative, got {}", quality);
        let id = NodeIndex(self.patches.len());
        self.patches.push(Patch { quality, x, y });
        self.out_arcs.push(vec![]);
        self.in_arcs.push(vec![]);
        self.revision += 1;
        id
    }

    pub fn add_corridor(&mut self, source: NodeIndex, target: NodeIndex, probability: f64) -> ArcIndex {
        assert!((0.0..=1.0).contains(&probability), "Corridor probability must be in [0, 1], got {}", probability);
        assert!(source.0 < self.patches.len() && target.0 < self.patches.len(), "Corridor between unknown patches");
        let id = ArcIndex(self.corridors.len());
        self.corridors.push(Some(Corridor { source, target, probability }));
        self.out_arcs[source.0].push(id);
        self.in_arcs[target.0].push(id);
        self.number_live_arcs += 1;
        self.revision += 1;
        id
    }

    /// Removes a corridor from the landscape. The index of the corridor is not reused.
    pub fn remove_corridor(&mut self, arc: ArcIndex) {
        if let Some(corridor) = self.corridors[arc.0].take() {
            self.out_arcs[corridor.source.0].retain(|a| *a != arc);
            self.in_arcs[corridor.target.0].retain(|a| *a != arc);
            self.number_live_arcs -= 1;
            self.revision += 1;
        }
    }

    pub fn set_quality(&mut self, node: NodeIndex, quality: f64) {
        assert!(quality >= 0.0, "Patch quality must be non-negative, got {}", quality);
        self.patches[node.0].quality = quality;
        self.revision += 1;
    }

    pub fn set_probability(&mut self, arc: ArcIndex, probability: f64) {
        assert!((0.0..=1.0).contains(&probability), "Corridor probability must be in [0, 1], got {}", probability);
        if let Some(corridor) = self.corridors[arc.0].as_mut() {
            corridor.probability = probability;
            self.revision += 1;
        }
    }

    // --- QUERIES --- //

    pub fn nb_nodes(&self) -> usize {
        self.patches.len()
    }

    /// Returns the number of corridors that are still in the landscape
    pub fn nb_arcs(&self) -> usize {
        self.number_live_arcs
    }

    /// Returns the size of the corridor index space, including removed corridors
    pub fn arc_capacity(&self) -> usize {
        self.corridors.len()
    }

    pub fn revision(&self) -> usize {
        self.revision
    }

    pub fn is_valid_arc(&self, arc: ArcIndex) -> bool {
        arc.0 < self.corridors.len() && self.corridors[arc.0].is_some()
    }

    pub fn quality(&self, node: NodeIndex) -> f64 {
        self.patches[node.0].quality
    }

    pub fn probability(&self, arc: ArcIndex) -> f64 {
        self[arc].probability
    }

    pub fn source(&self, arc: ArcIndex) -> NodeIndex {
        self[arc].source
    }

    pub fn target(&self, arc: ArcIndex) -> NodeIndex {
        self[arc].target
    }

    pub fn total_quality(&self) -> f64 {
        self.patches.iter().map(|p| p.quality).sum()
    }

    /// Returns the first live corridor going from source to target, if any
    pub fn find_corridor(&self, source: NodeIndex, target: NodeIndex) -> Option<ArcIndex> {
        self.out_arcs[source.0].iter().copied().find(|a| self.target(*a) == target)
    }

    // --- ITERATORS --- //

    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.patches.len()).map(NodeIndex)
    }

    pub fn arcs(&self) -> impl Iterator<Item = ArcIndex> + '_ {
        self.corridors.iter().enumerate().filter(|(_, c)| c.is_some()).map(|(i, _)| ArcIndex(i))
    }

    pub fn out_arcs(&self, node: NodeIndex) -> impl Iterator<Item = ArcIndex> + '_ {
        self.out_arcs[node.0].iter().copied()
    }

    pub fn in_arcs(&self, node: NodeIndex) -> impl Iterator<Item = ArcIndex> + '_ {
        self.in_arcs[node.0].iter().copied()
    }
}

impl std::ops::Index<NodeIndex> for Landscape {
    type Output = Patch;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.patches[index.0]
    }
}

impl std::ops::Index<ArcIndex> for Landscape {
    type Output = Corridor;

    fn index(&self, index: ArcIndex) -> &Self::Output {
        match &self.corridors[index.0] {
            Some(corridor) => corridor,
            None => panic!("Access to removed corridor {}", index.0),
        }
    }
}

#[cfg(test)]
mod test_landscape {
    use crate::core::landscape::*;

    fn chain() -> Landscape {
        let mut landscape = Landscape::new();
        let a = landscape.add_patch(1.0, 0.0, 0.0);
        let b = landscape.add_patch(2.0, 1.0, 0.0);
        let c = landscape.add_patch(3.0, 2.0, 0.0);
        landscape.add_corridor(a, b, 0.5);
        landscape.add_corridor(b, c, 0.25);
        landscape
    }

    #[test]
    pub fn creation() {
        let landscape = chain();
        assert_eq!(3, landscape.nb_nodes());
        assert_eq!(2, landscape.nb_arcs());
        assert_eq!(6.0, landscape.total_quality());
        assert_eq!(NodeIndex(1), landscape.target(ArcIndex(0)));
        assert_eq!(vec![ArcIndex(1)], landscape.out_arcs(NodeIndex(1)).collect::<Vec<ArcIndex>>());
        assert_eq!(vec![ArcIndex(0)], landscape.in_arcs(NodeIndex(1)).collect::<Vec<ArcIndex>>());
    }

    #[test]
    pub fn remove_corridor_keeps_indexes() {
        let mut landscape = chain();
        let revision = landscape.revision();
        landscape.remove_corridor(ArcIndex(0));
        assert_eq!(1, landscape.nb_arcs());
        assert_eq!(2, landscape.arc_capacity());
        assert!(!landscape.is_valid_arc(ArcIndex(0)));
        assert_eq!(vec![ArcIndex(1)], landscape.arcs().collect::<Vec<ArcIndex>>());
        assert_eq!(0, landscape.in_arcs(NodeIndex(1)).count());
        assert_eq!(0.25, landscape.probability(ArcIndex(1)));
        assert!(landscape.revision() > revision);
        // Removing twice is a no-op
        let revision = landscape.revision();
        landscape.remove_corridor(ArcIndex(0));
        assert_eq!(revision, landscape.revision());
    }

    #[test]
    pub fn find_corridor() {
        let landscape = chain();
        assert_eq!(Some(ArcIndex(1)), landscape.find_corridor(NodeIndex(1), NodeIndex(2)));
        assert_eq!(None, landscape.find_corridor(NodeIndex(2), NodeIndex(1)));
    }

    #[test]
    #[should_panic]
    pub fn invalid_probability() {
        let mut landscape = chain();
        landscape.add_corridor(NodeIndex(0), NodeIndex(2), 1.5);
    }
}
