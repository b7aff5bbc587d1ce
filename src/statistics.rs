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

use std::fmt;

use crate::PEAK_ALLOC;

/// Implements a bunch of statistics that are collected during the branch-and-bound
#[derive(Default)]
pub struct Statistics<const B: bool> {
    number_nodes: usize,
    number_lp_solves: usize,
    number_infeasible: usize,
    number_pruned: usize,
    number_incumbents: usize,
    root_bound: Option<f64>,
    best_objective: Option<f64>,
    peak_memory: f32,
}

impl<const B: bool> Statistics<B> {
    pub fn node(&mut self) {
        if B {
            self.number_nodes += 1;
        }
    }

    pub fn lp_solve(&mut self) {
        if B {
            self.number_lp_solves += 1;
        }
    }

    pub fn infeasible(&mut self) {
        if B {
            self.number_infeasible += 1;
        }
    }

    pub fn pruned(&mut self) {
        if B {
            self.number_pruned += 1;
        }
    }

    pub fn incumbent(&mut self, objective: f64) {
        if B {
            self.number_incumbents += 1;
            self.best_objective = Some(objective);
        }
    }

    pub fn root_bound(&mut self, bound: f64) {
        if B {
            self.root_bound = Some(bound);
        }
    }

    pub fn peak_memory(&mut self) {
        if B {
            self.peak_memory = PEAK_ALLOC.peak_usage_as_mb();
        }
    }

    pub fn print(&self) {
        if B {
            println!("{}", self);
        }
    }
}

impl<const B: bool> fmt::Display for Statistics<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if B {
            let gap = match (self.root_bound, self.best_objective) {
                (Some(bound), Some(best)) if bound.abs() > 0.0 => 100.0 * (bound - best).abs() / bound.abs(),
                _ => 0.0,
            };
            writeln!(f,
                "nodes {} | LP solves {} | #infeasible {} | #pruned {} | #incumbents {} | root gap {:.3}% | Peak memory usage {} Mb",
                self.number_nodes,
                self.number_lp_solves,
                self.number_infeasible,
                self.number_pruned,
                self.number_incumbents,
                gap,
                self.peak_memory)
        } else {
            write!(f, "")
        }
    }
}

#[cfg(test)]
mod test_statistics {
    use crate::statistics::Statistics;

    #[test]
    pub fn quiet_statistics_are_empty() {
        let mut statistics = Statistics::<false>::default();
        statistics.node();
        statistics.incumbent(1.0);
        assert_eq!(0, statistics.number_nodes);
        assert_eq!("", format!("{}", statistics));
    }

    #[test]
    pub fn collected_statistics() {
        let mut statistics = Statistics::<true>::default();
        statistics.node();
        statistics.node();
        statistics.pruned();
        statistics.root_bound(10.0);
        statistics.incumbent(9.0);
        assert_eq!(2, statistics.number_nodes);
        assert!(format!("{}", statistics).contains("root gap 10.000%"));
    }
}
