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


//! Flow formulation of the ECA maximisation on the whole landscape. For each target patch t, a
//! generalized flow (whose amount is multiplied by the probability of the corridors it crosses)
//! carries the quality of every patch to t, and the flow f_t reaching t is such that
//! q(t) * f_t = q(t) * sum_s q(s) p_st. All the targets share a single big-M constant, the total
//! quality that can be present in the landscape.

use rustc_hash::FxHashMap;

use crate::core::landscape::{ArcIndex, Landscape, NodeIndex};
use crate::core::restoration_plan::{OptionIndex, RestorationPlan};
use crate::precomputation::target_nodes;
use crate::solvers::mip::{MipBuilder, Sense, VarType, INFINITY};
use crate::solvers::pl_eca::{EcaFormulation, EcaModel};

pub struct PlEca2<'a> {
    landscape: &'a Landscape,
    plan: &'a RestorationPlan,
}

impl<'a> PlEca2<'a> {

    pub fn new(landscape: &'a Landscape, plan: &'a RestorationPlan) -> Self {
        Self { landscape, plan }
    }

    /// Upper bound on any flow of the formulation
    fn big_m(&self) -> f64 {
        let gains = self.plan.options().map(|o| self.plan[o].nodes().iter().map(|(_, g)| *g).sum::<f64>()).sum::<f64>();
        self.landscape.total_quality() + gains
    }
}

impl EcaFormulation for PlEca2<'_> {

    fn name(&self) -> &'static str {
        "pl-eca-2"
    }

    fn landscape(&self) -> &Landscape {
        self.landscape
    }

    fn plan(&self) -> &RestorationPlan {
        self.plan
    }

    fn build(&self, budget: f64) -> EcaModel {
        let landscape = self.landscape;
        let plan = self.plan;
        let big_m = self.big_m();
        let arcs = landscape.arcs().collect::<Vec<ArcIndex>>();
        let mut position = vec![usize::MAX; landscape.arc_capacity()];
        for (i, arc) in arcs.iter().enumerate() {
            position[arc.0] = i;
        }
        // (arc position, option, restored probability)
        let restorations = plan.options().flat_map(|o| {
            let position = &position;
            plan[o].arcs().iter().filter(|(a, _)| landscape.is_valid_arc(*a)).map(move |(a, p)| (position[a.0], o, *p))
        }).collect::<Vec<(usize, OptionIndex, f64)>>();
        let mut restorations_of_arc: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for (r, (a, _, _)) in restorations.iter().enumerate() {
            restorations_of_arc.entry(*a).or_default().push(r);
        }
        let gains_of_node = |node: NodeIndex| -> Vec<(OptionIndex, f64)> {
            plan.options_of_node(node).iter().filter_map(|o| plan[*o].quality_gain(node).map(|g| (*o, g))).collect()
        };

        let mut builder = MipBuilder::new();
        let y = builder.add_columns(VarType::binary(plan.nb_options()));
        for option in plan.options() {
            builder.set_col_name(y + option.0, format!("y_{}", option.0));
        }

        for t in target_nodes(landscape, plan) {
            let x = builder.add_columns(VarType::continuous(arcs.len(), 0.0, INFINITY));
            let rx = builder.add_columns(VarType::continuous(restorations.len(), 0.0, INFINITY));
            let f = builder.add_columns(VarType::continuous(1, 0.0, INFINITY));
            builder.set_col_name(f, format!("f_{}", t.0));
            let target_gains = gains_of_node(t);
            let rf = builder.add_columns(VarType::continuous(target_gains.len(), 0.0, INFINITY));

            builder.set_objective(f, landscape.quality(t));
            for (k, (_, gain)) in target_gains.iter().enumerate() {
                builder.set_objective(rf + k, *gain);
            }

            // out_flow(u) - in_flow(u) <= q(u) + restored quality of u
            for u in landscape.nodes() {
                for arc in landscape.out_arcs(u) {
                    builder.buff_entry(x + position[arc.0], 1.0);
                    for r in restorations_of_arc.get(&position[arc.0]).into_iter().flatten() {
                        builder.buff_entry(rx + *r, 1.0);
                    }
                }
                for arc in landscape.in_arcs(u) {
                    builder.buff_entry(x + position[arc.0], -landscape.probability(arc));
                    for r in restorations_of_arc.get(&position[arc.0]).into_iter().flatten() {
                        builder.buff_entry(rx + *r, -restorations[*r].2);
                    }
                }
                for (option, gain) in gains_of_node(u) {
                    builder.buff_entry(y + option.0, -gain);
                }
                if u == t {
                    builder.buff_entry(f, 1.0);
                }
                builder.push_row(-INFINITY, landscape.quality(u));
            }

            // restored_x <= M * y_i
            for (r, (_, option, _)) in restorations.iter().enumerate() {
                builder.buff_entry(y + option.0, big_m).buff_entry(rx + r, -1.0).push_row(0.0, INFINITY);
            }

            // restored_f <= f_t and restored_f <= M * y_i
            for (k, (option, _)) in target_gains.iter().enumerate() {
                builder.buff_entry(f, 1.0).buff_entry(rf + k, -1.0).push_row(0.0, INFINITY);
                builder.buff_entry(y + option.0, big_m).buff_entry(rf + k, -1.0).push_row(0.0, INFINITY);
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

#[cfg(test)]
mod test_pl_eca_2 {
    use crate::core::landscape::*;
    use crate::core::restoration_plan::*;
    use crate::eca::{eca, eca_with_options};
    use crate::solvers::mip::{solve_model, MicroLpBackend, SolveLimits};
    use crate::solvers::pl_eca::EcaFormulation;
    use crate::solvers::pl_eca_2::PlEca2;

    fn instance() -> (Landscape, RestorationPlan) {
        let mut landscape = Landscape::new();
        let n0 = landscape.add_patch(2.0, 0.0, 0.0);
        let n1 = landscape.add_patch(1.0, 1.0, 0.0);
        let n2 = landscape.add_patch(3.0, 2.0, 0.0);
        let a01 = landscape.add_corridor(n0, n1, 0.2);
        landscape.add_corridor(n1, n2, 0.5);
        let mut plan = RestorationPlan::new();
        let o0 = plan.add_option(5.0);
        plan.add_corridor(o0, a01, 0.9);
        let o1 = plan.add_option(10.0);
        plan.add_patch(o1, n1, 2.0);
        (landscape, plan)
    }

    #[test]
    pub fn relaxation_without_budget_is_base_eca() {
        let (landscape, plan) = instance();
        let model = PlEca2::new(&landscape, &plan).build(0.0);
        let solution = solve_model(&model.model, &MicroLpBackend, SolveLimits::default(), true, false).unwrap();
        let expected = eca(&landscape);
        assert!((solution.objective - expected * expected).abs() < 1e-6);
    }

    #[test]
    pub fn full_budget_funds_everything() {
        let (landscape, plan) = instance();
        let model = PlEca2::new(&landscape, &plan).build(100.0);
        let solution = solve_model(&model.model, &MicroLpBackend, SolveLimits::default(), false, false).unwrap();
        let expected = eca_with_options(&landscape, &plan, &[OptionIndex(0), OptionIndex(1)]);
        assert!((solution.objective - expected * expected).abs() < 1e-6);
    }

    #[test]
    pub fn model_size() {
        let (landscape, plan) = instance();
        let model = PlEca2::new(&landscape, &plan).build(12.0);
        // 3 targets, each with 2 arcs, 1 restored arc, 1 f and one restored f for n1
        assert_eq!(2 + 3 * (2 + 1 + 1) + 1, model.model.nb_vars());
        // 3 flow rows and 1 linking row per target, 2 rows for the gain of n1, 1 budget row
        assert_eq!(3 * (3 + 1) + 2 + 1, model.model.nb_constraints());
    }
}
