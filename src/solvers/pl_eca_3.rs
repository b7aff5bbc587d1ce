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


//! Flow formulation of the ECA maximisation on the contracted instances of the precomputation.
//! The flow towards each target t is modelled on the landscape contracted around t, which is
//! usually much smaller than the landscape. The big-M constants are specific to each contracted
//! patch: the flow crossing a corridor (u, v) is bounded by the maximal flow that can reach u when
//! every option is funded.

use tracing::debug;

use crate::core::landscape::Landscape;
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::precomputation::Precomputation;
use crate::solvers::mip::{MipBuilder, Sense, VarType, INFINITY};
use crate::solvers::pl_eca::{EcaFormulation, EcaModel};

pub struct PlEca3<'b, 'a> {
    precomputation: &'b Precomputation<'a>,
}

impl<'b, 'a> PlEca3<'b, 'a> {

    pub fn new(precomputation: &'b Precomputation<'a>) -> Self {
        Self { precomputation }
    }
}

impl EcaFormulation for PlEca3<'_, '_> {

    fn name(&self) -> &'static str {
        "pl-eca-3"
    }

    fn landscape(&self) -> &Landscape {
        self.precomputation.landscape()
    }

    fn plan(&self) -> &RestorationPlan {
        self.precomputation.plan()
    }

    fn build(&self, budget: f64) -> EcaModel {
        let plan = self.precomputation.plan();
        let mut builder = MipBuilder::new();
        let y = builder.add_columns(VarType::binary(plan.nb_options()));
        for option in plan.options() {
            builder.set_col_name(y + option.0, format!("y_{}", option.0));
        }

        for result in self.precomputation.results() {
            let t = result.target();
            let origin = result.origin_target();
            let max_flows = (0..result.nb_nodes()).map(|u| result.max_flow_in(u)).collect::<Vec<f64>>();
            debug!(target = origin.0, nodes = result.nb_nodes(), arcs = result.nb_arcs(), "contracted instance");

            // Restored arcs are enumerated arc by arc
            let mut restoration_offsets = Vec::with_capacity(result.nb_arcs());
            let mut nb_restorations = 0;
            for arc in result.arcs() {
                restoration_offsets.push(nb_restorations);
                nb_restorations += arc.restorations.len();
            }

            let x = builder.add_columns(VarType::continuous(result.nb_arcs(), 0.0, INFINITY));
            let rx = builder.add_columns(VarType::continuous(nb_restorations, 0.0, INFINITY));
            let f = builder.add_columns(VarType::continuous(1, 0.0, INFINITY));
            builder.set_col_name(f, format!("f_{}", origin.0));
            let rf = builder.add_columns(VarType::continuous(result.target_gains().len(), 0.0, INFINITY));

            builder.set_objective(f, result.target_quality());
            for (k, (_, gain)) in result.target_gains().iter().enumerate() {
                builder.set_objective(rf + k, *gain);
            }

            // out_flow(u) - in_flow(u) <= q(u) + restored quality of u
            for (u, node) in result.nodes().iter().enumerate() {
                for b in result.out_arcs(u).iter().copied() {
                    builder.buff_entry(x + b, 1.0);
                    for k in 0..result.arcs()[b].restorations.len() {
                        builder.buff_entry(rx + restoration_offsets[b] + k, 1.0);
                    }
                }
                for a in result.in_arcs(u).iter().copied() {
                    let arc = &result.arcs()[a];
                    builder.buff_entry(x + a, -arc.probability);
                    for (k, (_, p)) in arc.restorations.iter().enumerate() {
                        builder.buff_entry(rx + restoration_offsets[a] + k, -p);
                    }
                }
                for (option, gain) in node.gains.iter() {
                    builder.buff_entry(y + option.0, -gain);
                }
                if u == t {
                    builder.buff_entry(f, 1.0);
                }
                builder.push_row(-INFINITY, node.quality);
            }

            // restored_x <= M_x * y_i
            for (a, arc) in result.arcs().iter().enumerate() {
                for (k, (option, _)) in arc.restorations.iter().enumerate() {
                    builder.buff_entry(y + option.0, max_flows[arc.source]);
                    builder.buff_entry(rx + restoration_offsets[a] + k, -1.0);
                    builder.push_row(0.0, INFINITY);
                }
            }

            // restored_f <= f_t and restored_f <= M_f * y_i
            for (k, (option, _)) in result.target_gains().iter().enumerate() {
                builder.buff_entry(f, 1.0).buff_entry(rf + k, -1.0).push_row(0.0, INFINITY);
                builder.buff_entry(y + option.0, max_flows[t]).buff_entry(rf + k, -1.0).push_row(0.0, INFINITY);
            }
        }

        for option in plan.options() {
            builder.buff_entry(y + option.0, plan.cost(option));
        }
        builder.push_row(-INFINITY, budget);

        EcaModel {
            model: builder.build(Sense::Maximize),
            options_offset: y,
        }
    }
}

/// Options whose selection changes the flow towards at least one target
pub fn useful_options(precomputation: &Precomputation) -> Vec<OptionIndex> {
    precomputation.plan().options().filter(|o| precomputation.results().iter().any(|r| r.touches(*o))).collect()
}
