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

//! Incremental construction of a mixed-integer program, independently of the engine that solves
//! it. The columns are registered by blocks (`VarType`), each block getting a contiguous range of
//! column indexes. A row is built by staging (column, coefficient) entries in a buffer and is then
//! pushed with its bounds.
//!
//! The associated functions `compose_pair`/`retrieve_pair` (unordered pairs) and
//! `compose_couple`/`retrieve_couple` (ordered pairs) give a consistent enumeration of the pairs of
//! entities, used to assign columns to them.

use rustc_hash::FxHashMap;

pub const INFINITY: f64 = f64::INFINITY;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A block of columns sharing the same default bounds and integrality
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VarType {
    pub number: usize,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub integer: bool,
}

impl VarType {

    pub fn continuous(number: usize, lower_bound: f64, upper_bound: f64) -> Self {
        Self { number, lower_bound, upper_bound, integer: false }
    }

    pub fn binary(number: usize) -> Self {
        Self { number, lower_bound: 0.0, upper_bound: 1.0, integer: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub objective: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub integer: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub entries: Vec<(usize, f64)>,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// An assembled mixed-integer program
#[derive(Debug, Clone)]
pub struct MipModel {
    pub(crate) sense: Sense,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Row>,
    pub(crate) names: FxHashMap<usize, String>,
}

impl MipModel {

    pub fn nb_vars(&self) -> usize {
        self.columns.len()
    }

    pub fn nb_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn col_name(&self, column: usize) -> Option<&str> {
        self.names.get(&column).map(|s| s.as_str())
    }

    /// Returns the columns that must take integer values
    pub fn integer_columns(&self) -> Vec<usize> {
        self.columns.iter().enumerate().filter(|(_, c)| c.integer).map(|(i, _)| i).collect()
    }

    /// Objective value of an assignment of the columns
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.columns.iter().zip(values.iter()).map(|(c, v)| c.objective * v).sum()
    }
}

#[derive(Debug, Default)]
pub struct MipBuilder {
    columns: Vec<Column>,
    rows: Vec<Row>,
    names: FxHashMap<usize, String>,
    buffer: Vec<(usize, f64)>,
}

impl MipBuilder {

    pub fn new() -> Self {
        Self::default()
    }

    // --- COLUMNS --- //

    /// Adds the columns of the block and returns the index of the first one
    pub fn add_columns(&mut self, var_type: VarType) -> usize {
        let offset = self.columns.len();
        for _ in 0..var_type.number {
            self.columns.push(Column {
                objective: 0.0,
                lower_bound: var_type.lower_bound,
                upper_bound: var_type.upper_bound,
                integer: var_type.integer,
            });
        }
        offset
    }

    pub fn set_objective(&mut self, column: usize, coef: f64) -> &mut Self {
        self.columns[column].objective = coef;
        self
    }

    pub fn set_bounds(&mut self, column: usize, lower_bound: f64, upper_bound: f64) -> &mut Self {
        self.columns[column].lower_bound = lower_bound;
        self.columns[column].upper_bound = upper_bound;
        self
    }

    pub fn set_integer(&mut self, column: usize) -> &mut Self {
        self.columns[column].integer = true;
        self
    }

    pub fn set_continuous(&mut self, column: usize) -> &mut Self {
        self.columns[column].integer = false;
        self
    }

    pub fn set_col_name(&mut self, column: usize, name: String) -> &mut Self {
        self.names.insert(column, name);
        self
    }

    // --- ROWS --- //

    /// Stages an entry of the row being built
    pub fn buff_entry(&mut self, column: usize, coef: f64) -> &mut Self {
        debug_assert!(column < self.columns.len(), "Entry on unknown column {}", column);
        self.buffer.push((column, coef));
        self
    }

    /// Discards the last staged entry
    pub fn pop_entry_buffer(&mut self) -> &mut Self {
        self.buffer.pop();
        self
    }

    pub fn clear_entry_buffer(&mut self) -> &mut Self {
        self.buffer.clear();
        self
    }

    /// Adds the row lower_bound <= sum(staged entries) <= upper_bound and keeps the staged entries
    pub fn push_row_without_clearing(&mut self, lower_bound: f64, upper_bound: f64) -> &mut Self {
        self.rows.push(Row {
            entries: self.buffer.clone(),
            lower_bound,
            upper_bound,
        });
        self
    }

    /// Adds the row lower_bound <= sum(staged entries) <= upper_bound and clears the staged entries
    pub fn push_row(&mut self, lower_bound: f64, upper_bound: f64) -> &mut Self {
        self.rows.push(Row {
            entries: std::mem::take(&mut self.buffer),
            lower_bound,
            upper_bound,
        });
        self
    }

    pub fn nb_vars(&self) -> usize {
        self.columns.len()
    }

    pub fn nb_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn build(self, sense: Sense) -> MipModel {
        MipModel {
            sense,
            columns: self.columns,
            rows: self.rows,
            names: self.names,
        }
    }

    // --- ENUMERATION OF PAIRS --- //

    /// Number of unordered pairs of n elements
    pub fn nb_pairs(n: usize) -> usize {
        n * n.saturating_sub(1) / 2
    }

    /// Index of the unordered pair {i, j}, with i != j
    pub fn compose_pair(i: usize, j: usize) -> usize {
        debug_assert!(i != j);
        let (low, high) = if i < j { (i, j) } else { (j, i) };
        Self::nb_pairs(high) + low
    }

    /// Returns the pair (i, j), with i < j, of the given index
    pub fn retrieve_pair(id: usize) -> (usize, usize) {
        let mut j = ((2 * id + 1) as f64).sqrt().round() as usize;
        // Guards against the rounding of the square root for large indexes
        while Self::nb_pairs(j) > id {
            j -= 1;
        }
        while Self::nb_pairs(j + 1) <= id {
            j += 1;
        }
        (id - Self::nb_pairs(j), j)
    }

    /// Number of ordered pairs of n distinct elements
    pub fn nb_couples(n: usize) -> usize {
        2 * Self::nb_pairs(n)
    }

    /// Index of the ordered pair (i, j), with i != j
    pub fn compose_couple(i: usize, j: usize) -> usize {
        2 * Self::compose_pair(i, j) + if i < j { 0 } else { 1 }
    }

    /// Returns the ordered pair of the given index
    pub fn retrieve_couple(id: usize) -> (usize, usize) {
        let (i, j) = Self::retrieve_pair(id / 2);
        if id % 2 == 0 {
            (i, j)
        } else {
            (j, i)
        }
    }
}
