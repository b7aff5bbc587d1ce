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

//! This module implements a sum tree used for weighted random sampling. It is a complete binary
//! tree, stored in a plain vector, in which
//!     1. The leaves hold non-negative weights
//!     2. Each internal node holds the sum of its two children
//!
//! Picking a leaf proportionally to its weight is a descent from the root, in O(log n). Updating a
//! leaf recomputes its ancestors from their children, so that the sums are exact after any
//! sequence of updates (in particular, zeroing every leaf yields a total of exactly 0).

use rand::Rng;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct SumTree {
    /// The tree. Index 0 is unused, the root is at index 1 and the children of node i are at 2i
    /// and 2i + 1. The leaves start at index `capacity`.
    tree: Vec<f64>,
    /// Weights given at the creation of the tree, restored by `reset`
    initial_weights: Vec<f64>,
    /// Number of leaves of the complete tree (power of two)
    capacity: usize,
}

impl SumTree {

    pub fn new(weights: &[f64]) -> Self {
        for (i, w) in weights.iter().copied().enumerate() {
            assert!(w >= 0.0, "Weight {} of leaf {} is not a non-negative number", w, i);
        }
        let capacity = weights.len().max(1).next_power_of_two();
        let mut tree = vec![0.0; 2 * capacity];
        tree[capacity..capacity + weights.len()].copy_from_slice(weights);
        for i in (1..capacity).rev() {
            tree[i] = tree[2 * i] + tree[2 * i + 1];
        }
        Self {
            tree,
            initial_weights: weights.to_vec(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.initial_weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initial_weights.is_empty()
    }

    /// Returns the total weight of the leaves
    pub fn total(&self) -> f64 {
        self.tree[1]
    }

    pub fn weight(&self, leaf: usize) -> f64 {
        self.tree[self.capacity + leaf]
    }

    /// Sets the weight of a leaf and updates the sums of its ancestors
    pub fn update(&mut self, leaf: usize, weight: f64) {
        assert!(leaf < self.len(), "Leaf {} out of bounds ({} leaves)", leaf, self.len());
        assert!(weight >= 0.0, "Weight {} of leaf {} is not a non-negative number", weight, leaf);
        let mut node = self.capacity + leaf;
        self.tree[node] = weight;
        while node > 1 {
            node /= 2;
            self.tree[node] = self.tree[2 * node] + self.tree[2 * node + 1];
        }
    }

    /// Restores the weights given at the creation of the tree
    pub fn reset(&mut self) {
        for w in self.tree.iter_mut() {
            *w = 0.0;
        }
        self.tree[self.capacity..self.capacity + self.initial_weights.len()].copy_from_slice(&self.initial_weights);
        for i in (1..self.capacity).rev() {
            self.tree[i] = self.tree[2 * i] + self.tree[2 * i + 1];
        }
    }

    /// Returns the leaf selected by the value, in [0, 1), each leaf being selected with a
    /// probability proportional to its weight. When the value lands exactly on the boundary
    /// between two subtrees, the left one is chosen. Zero-weight leaves are never returned.
    pub fn pick(&self, value: f64) -> Result<usize> {
        if self.total() <= 0.0 {
            return Err(Error::EmptySumTree);
        }
        let mut rest = value.clamp(0.0, 1.0) * self.total();
        let mut node = 1;
        while node < self.capacity {
            let left = self.tree[2 * node];
            let right = self.tree[2 * node + 1];
            if left > 0.0 && (rest <= left || right <= 0.0) {
                node *= 2;
            } else {
                rest -= left;
                node = 2 * node + 1;
            }
        }
        Ok(node - self.capacity)
    }

    /// Picks a leaf and sets its weight to 0, so that it can not be picked again before the next
    /// reset.
    pub fn pick_and_reset(&mut self, value: f64) -> Result<usize> {
        let leaf = self.pick(value)?;
        self.update(leaf, 0.0);
        Ok(leaf)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize> {
        self.pick(rng.gen_range(0.0..1.0))
    }

    pub fn sample_and_reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize> {
        self.pick_and_reset(rng.gen_range(0.0..1.0))
    }
}

#[cfg(test)]
mod test_sum_tree {
    use crate::core::sum_tree::*;
    use crate::error::Error;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn check_sums(tree: &SumTree) {
        for i in 1..tree.capacity {
            assert_eq!(tree.tree[2 * i] + tree.tree[2 * i + 1], tree.tree[i]);
        }
    }

    #[test]
    pub fn creation() {
        let tree = SumTree::new(&[1.0, 2.0, 3.0]);
        assert_eq!(3, tree.len());
        assert_eq!(4, tree.capacity);
        assert_eq!(6.0, tree.total());
        check_sums(&tree);
    }

    #[test]
    pub fn all_zero_weights() {
        let tree = SumTree::new(&[0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(0.0, tree.total());
        check_sums(&tree);
        assert!(matches!(tree.pick(0.5), Err(Error::EmptySumTree)));
    }

    #[test]
    pub fn empty_tree() {
        let tree = SumTree::new(&[]);
        assert!(tree.is_empty());
        assert!(matches!(tree.pick(0.0), Err(Error::EmptySumTree)));
    }

    #[test]
    pub fn sums_after_updates() {
        let mut tree = SumTree::new(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
        tree.update(3, 1.7);
        tree.update(0, 0.0);
        tree.update(6, 0.05);
        check_sums(&tree);
        let leaves = (0..tree.len()).map(|i| tree.weight(i)).collect::<Vec<f64>>();
        assert!((leaves.iter().sum::<f64>() - tree.total()).abs() < 1e-12);
    }

    #[test]
    pub fn pick_boundaries() {
        let tree = SumTree::new(&[1.0, 1.0, 2.0]);
        assert_eq!(0, tree.pick(0.0).unwrap());
        // 0.25 * 4 = 1.0 is the boundary between leaf 0 and leaf 1
        assert_eq!(0, tree.pick(0.25).unwrap());
        assert_eq!(1, tree.pick(0.3).unwrap());
        // 0.5 * 4 = 2.0 is the boundary between the two subtrees
        assert_eq!(1, tree.pick(0.5).unwrap());
        assert_eq!(2, tree.pick(0.51).unwrap());
        assert_eq!(2, tree.pick(0.999).unwrap());
    }

    #[test]
    pub fn pick_skips_zero_weights() {
        let tree = SumTree::new(&[0.0, 3.0, 0.0, 0.0, 1.0]);
        assert_eq!(1, tree.pick(0.0).unwrap());
        assert_eq!(1, tree.pick(0.75).unwrap());
        assert_eq!(4, tree.pick(0.8).unwrap());
    }

    #[test]
    pub fn pick_is_read_only() {
        let tree = SumTree::new(&[1.0, 2.0]);
        let first = tree.pick(0.9).unwrap();
        let second = tree.pick(0.9).unwrap();
        assert_eq!(first, second);
        assert_eq!(3.0, tree.total());
    }

    #[test]
    pub fn pick_and_reset_without_replacement() {
        let weights = [0.3, 1.2, 0.01, 4.0, 0.7, 2.2, 0.9, 0.1, 1.1];
        let mut tree = SumTree::new(&weights);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = vec![false; weights.len()];
        for _ in 0..weights.len() {
            let leaf = tree.sample_and_reset(&mut rng).unwrap();
            assert!(!seen[leaf]);
            seen[leaf] = true;
            check_sums(&tree);
        }
        assert_eq!(0.0, tree.total());
        assert!(seen.iter().all(|s| *s));
        assert!(matches!(tree.sample_and_reset(&mut rng), Err(Error::EmptySumTree)));
    }

    #[test]
    pub fn reset_restores_weights() {
        let mut tree = SumTree::new(&[1.0, 2.0, 3.0]);
        tree.pick_and_reset(0.0).unwrap();
        tree.pick_and_reset(0.0).unwrap();
        tree.update(2, 10.0);
        tree.reset();
        assert_eq!(6.0, tree.total());
        assert_eq!(2.0, tree.weight(1));
        check_sums(&tree);
    }

    #[test]
    pub fn sampling_is_deterministic() {
        let mut a = SumTree::new(&[1.0, 5.0, 2.0, 0.5]);
        let mut b = a.clone();
        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..4 {
            assert_eq!(a.sample_and_reset(&mut rng_a).unwrap(), b.sample_and_reset(&mut rng_b).unwrap());
        }
    }

    #[test]
    #[should_panic]
    pub fn negative_weight() {
        SumTree::new(&[1.0, -1.0]);
    }
}
