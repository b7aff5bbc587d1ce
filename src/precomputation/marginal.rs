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

//! Marginal gains of the options. The squared ECA decomposes over the target patches,
//!
//! ```text
//! ECA^2 = sum_t w(t) * flow(t)
//! ```
//!
//! and an option only changes the terms of the targets whose contracted graph it modifies. The
//! gain of an option alone is thus computed on these contracted graphs only.
//!
//! The gain of a set of options is estimated by the sum of their gains. This is exact when the
//! options modify disjoint parts of the landscape, and only an approximation otherwise.

use rayon::prelude::*;

use crate::core::restoration_plan::OptionIndex;
use crate::precomputation::contraction::ContractionResult;

#[derive(Debug, Clone, PartialEq)]
pub struct MarginalGains {
    /// Squared ECA of the landscape without restoration
    base: f64,
    /// Increase of the squared ECA when each option is funded alone
    squared_gains: Vec<f64>,
}

impl MarginalGains {

    pub fn new(results: &[ContractionResult], nb_options: usize) -> Self {
        let per_target = results.par_iter().map(|result| {
            let base_flow = result.flow(&[]);
            let base = result.target_weight(&[]) * base_flow;
            let deltas = result.options().iter().copied().map(|option| {
                let funded = [option];
                let value = result.target_weight(&funded) * result.flow(&funded);
                (option, value - base)
            }).collect::<Vec<(OptionIndex, f64)>>();
            (base, deltas)
        }).collect::<Vec<(f64, Vec<(OptionIndex, f64)>)>>();
        let mut base = 0.0;
        let mut squared_gains = vec![0.0; nb_options];
        for (b, deltas) in per_target {
            base += b;
            for (option, delta) in deltas {
                squared_gains[option.0] += delta;
            }
        }
        Self { base, squared_gains }
    }

    pub fn base_squared_eca(&self) -> f64 {
        self.base
    }

    pub fn base_eca(&self) -> f64 {
        self.base.max(0.0).sqrt()
    }

    /// Increase of the squared ECA when the option is funded alone
    pub fn squared_gain(&self, option: OptionIndex) -> f64 {
        self.squared_gains[option.0]
    }

    /// Increase of the ECA when the option is funded alone
    pub fn eca_gain(&self, option: OptionIndex) -> f64 {
        (self.base + self.squared_gains[option.0]).max(0.0).sqrt() - self.base_eca()
    }

    /// Estimation of the ECA when the options are funded, assuming that their gains add up
    pub fn additive_estimate(&self, options: &[OptionIndex]) -> f64 {
        (self.base + options.iter().map(|o| self.squared_gains[o.0]).sum::<f64>()).max(0.0).sqrt()
    }
}
