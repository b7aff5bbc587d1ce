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

//! Multiplicative Dijkstra: computes, from a source, the maximum over all paths of the product of
//! the probabilities of their arcs. Since probabilities are in [0, 1], the product can only
//! decrease along a path and the usual label-setting argument holds.
//!
//! The graphs are given as adjacency lists of (neighbor, probability). Building the adjacency once
//! and running one search per source is how the connectivity indicators use it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::landscape::{ArcIndex, Landscape};

pub type Adjacency = Vec<Vec<(usize, f64)>>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct HeapEntry {
    pub probability: f64,
    pub node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Highest probability first, then lowest node
    fn cmp(&self, other: &Self) -> Ordering {
        self.probability.total_cmp(&other.probability).then_with(|| other.node.cmp(&self.node))
    }
}

/// Builds the adjacency of the landscape, following the corridors from source to target
pub fn forward_adjacency<P>(landscape: &Landscape, probability: P) -> Adjacency
    where P: Fn(ArcIndex) -> f64
{
    let mut adjacency = vec![vec![]; landscape.nb_nodes()];
    for arc in landscape.arcs() {
        let p = probability(arc);
        if p > 0.0 {
            adjacency[landscape.source(arc).0].push((landscape.target(arc).0, p));
        }
    }
    adjacency
}

/// Builds the adjacency of the reversed landscape
pub fn backward_adjacency<P>(landscape: &Landscape, probability: P) -> Adjacency
    where P: Fn(ArcIndex) -> f64
{
    let mut adjacency = vec![vec![]; landscape.nb_nodes()];
    for arc in landscape.arcs() {
        let p = probability(arc);
        if p > 0.0 {
            adjacency[landscape.target(arc).0].push((landscape.source(arc).0, p));
        }
    }
    adjacency
}

/// Returns, for each node, the best path probability from the source. Unreachable nodes have a
/// probability of 0 and the source a probability of 1.
pub fn best_probabilities(adjacency: &[Vec<(usize, f64)>], source: usize) -> Vec<f64> {
    let mut best = vec![0.0; adjacency.len()];
    let mut settled = vec![false; adjacency.len()];
    let mut heap = BinaryHeap::new();
    best[source] = 1.0;
    heap.push(HeapEntry { probability: 1.0, node: source });
    while let Some(HeapEntry { probability, node }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        for (next, p) in adjacency[node].iter().copied() {
            let candidate = probability * p;
            if !settled[next] && candidate > best[next] {
                best[next] = candidate;
                heap.push(HeapEntry { probability: candidate, node: next });
            }
        }
    }
    best
}

/// Returns the quality-weighted flow reaching the target, i.e. sum_s q(s) * p(s, t), given the
/// adjacency of the reversed graph.
pub fn flow_into(backward: &[Vec<(usize, f64)>], qualities: &[f64], target: usize) -> f64 {
    best_probabilities(backward, target).iter().zip(qualities.iter()).map(|(p, q)| p * q).sum()
}
