use assert_float_eq::*;
use paste::paste;

use landscape_opt::core::landscape::*;
use landscape_opt::core::restoration_plan::*;
use landscape_opt::eca::{eca, eca_with_options};
use landscape_opt::solvers::solve;
use clap::ValueEnum;

use landscape_opt::{Error, Formulation, Method, SolverError, SolverParameters, Weighting};

// 3 patches, 2 corridors, two options costing 5 and 10
fn chain() -> (Landscape, RestorationPlan) {
    let mut landscape = Landscape::new();
    let n0 = landscape.add_patch(1.0, 0.0, 0.0);
    let n1 = landscape.add_patch(2.0, 1.0, 0.0);
    let n2 = landscape.add_patch(1.5, 2.0, 0.0);
    let a0 = landscape.add_corridor(n0, n1, 0.3);
    let a1 = landscape.add_corridor(n1, n2, 0.2);
    let mut plan = RestorationPlan::new();
    let o0 = plan.add_option(5.0);
    plan.add_corridor(o0, a0, 0.9);
    let o1 = plan.add_option(10.0);
    plan.add_patch(o1, n2, 2.0);
    plan.add_corridor(o1, a1, 0.8);
    (landscape, plan)
}

// 3x3 grid with corridors in both directions between neighbours
fn grid() -> (Landscape, RestorationPlan) {
    let mut landscape = Landscape::new();
    for i in 0..9 {
        landscape.add_patch(0.5 * (i + 1) as f64, (i % 3) as f64, (i / 3) as f64);
    }
    let mut pairs = vec![];
    for i in 0..9 {
        if i % 3 < 2 {
            pairs.push((i, i + 1));
        }
        if i / 3 < 2 {
            pairs.push((i, i + 3));
        }
    }
    let mut arcs = vec![];
    for (u, v) in pairs.iter().copied() {
        let forward = landscape.add_corridor(NodeIndex(u), NodeIndex(v), 0.2);
        let backward = landscape.add_corridor(NodeIndex(v), NodeIndex(u), 0.2);
        arcs.push((forward, backward));
    }
    let mut plan = RestorationPlan::new();
    for k in 0..4 {
        let option = plan.add_option((k + 1) as f64);
        let (forward, backward) = arcs[2 * k];
        plan.add_corridor(option, forward, 0.9);
        plan.add_corridor(option, backward, 0.9);
        plan.add_patch(option, NodeIndex(2 * k), 1.0);
    }
    (landscape, plan)
}

/// Best ECA over every subset of options within the budget
fn exhaustive(landscape: &Landscape, plan: &RestorationPlan, budget: f64) -> (Vec<OptionIndex>, f64) {
    let options = plan.options().collect::<Vec<OptionIndex>>();
    let mut best = (vec![], eca(landscape));
    for mask in 0..(1usize << options.len()) {
        let subset = options.iter().copied().filter(|o| mask & (1 << o.0) != 0).collect::<Vec<OptionIndex>>();
        let cost: f64 = subset.iter().map(|o| plan.cost(*o)).sum();
        if cost > budget {
            continue;
        }
        let value = eca_with_options(landscape, plan, &subset);
        if value > best.1 + 1e-9 {
            best = (subset, value);
        }
    }
    best
}

macro_rules! exact_tests {
    ($($name:ident: [$instance:ident, $budget:expr],)*) => {
        $(
            paste! {
                #[test]
                fn [<pl_eca_2_ $name>]() {
                    let (landscape, plan) = $instance();
                    let (_, expected) = exhaustive(&landscape, &plan, $budget);
                    let parameters = SolverParameters::default().with_formulation(Formulation::PlEca2);
                    let solution = solve(&landscape, &plan, $budget, Method::PlEca, parameters).unwrap();
                    assert!(solution.cost() <= $budget + 1e-9);
                    assert_float_relative_eq!(expected, solution.eca(), 1e-5);
                }

                #[test]
                fn [<pl_eca_3_ $name>]() {
                    let (landscape, plan) = $instance();
                    let (_, expected) = exhaustive(&landscape, &plan, $budget);
                    let parameters = SolverParameters::default().with_formulation(Formulation::PlEca3);
                    let solution = solve(&landscape, &plan, $budget, Method::PlEca, parameters).unwrap();
                    assert!(solution.cost() <= $budget + 1e-9);
                    assert_float_relative_eq!(expected, solution.eca(), 1e-5);
                }

                #[test]
                fn [<heuristics_ $name>]() {
                    let (landscape, plan) = $instance();
                    let (_, optimum) = exhaustive(&landscape, &plan, $budget);
                    for method in Method::value_variants().iter().copied().filter(|m| *m != Method::PlEca) {
                        let solution = solve(&landscape, &plan, $budget, method, SolverParameters::default().with_trials(20)).unwrap();
                        assert!(solution.cost() <= $budget + 1e-9, "{} exceeds the budget", method);
                        assert!(solution.eca() <= optimum * (1.0 + 1e-6), "{} is above the optimum", method);
                        assert!(solution.eca() >= eca(&landscape) * (1.0 - 1e-6), "{} is below the base ECA", method);
                    }
                }
            }
        )*
    }
}

exact_tests! {
    chain_budget_5: [chain, 5.0],
    chain_budget_12: [chain, 12.0],
    chain_budget_15: [chain, 15.0],
    grid_budget_3: [grid, 3.0],
    grid_budget_5: [grid, 5.0],
    grid_budget_10: [grid, 10.0],
}

#[test]
fn chain_selection_matches_enumeration() {
    let (landscape, plan) = chain();
    let (expected, _) = exhaustive(&landscape, &plan, 12.0);
    let solution = solve(&landscape, &plan, 12.0, Method::PlEca, SolverParameters::default()).unwrap();
    assert_eq!(expected, solution.selected());
    assert_eq!(1, solution.selected().len());
}

#[test]
fn zero_budget_keeps_base_landscape() {
    let (landscape, plan) = grid();
    for method in Method::value_variants().iter().copied() {
        let solution = solve(&landscape, &plan, 0.0, method, SolverParameters::default()).unwrap();
        assert!(solution.selected().is_empty());
        assert_float_relative_eq!(eca(&landscape), solution.eca());
    }
}

#[test]
fn budget_below_cheapest_is_infeasible() {
    let (landscape, plan) = chain();
    match solve(&landscape, &plan, 4.0, Method::PlEca, SolverParameters::default()) {
        Err(Error::Infeasible { budget, cheapest }) => {
            assert_eq!(4.0, budget);
            assert_eq!(5.0, cheapest);
        },
        other => panic!("Expected an infeasible budget, got {:?}", other),
    }
}

#[test]
fn relaxation_bounds_integral_optimum() {
    let (landscape, plan) = grid();
    for formulation in [Formulation::PlEca2, Formulation::PlEca3] {
        let parameters = SolverParameters::default().with_formulation(formulation);
        let integral = solve(&landscape, &plan, 5.0, Method::PlEca, parameters.clone()).unwrap();
        let relaxed = solve(&landscape, &plan, 5.0, Method::PlEca, parameters.with_relaxed(true)).unwrap();
        assert!(relaxed.objective() >= integral.objective() * (1.0 - 1e-6));
        assert!(relaxed.cost() <= 5.0 + 1e-6);
    }
}

#[test]
fn node_limit_stops_at_a_fractional_root() {
    // No subset of the options costs 4.5, so a root spending the whole budget is fractional
    let (landscape, plan) = grid();
    let (_, optimum) = exhaustive(&landscape, &plan, 4.5);
    for formulation in [Formulation::PlEca2, Formulation::PlEca3] {
        let parameters = SolverParameters::default().with_formulation(formulation);
        let root = solve(&landscape, &plan, 4.5, Method::PlEca, parameters.clone().with_relaxed(true)).unwrap();
        let fractional = root.coefs().iter().any(|c| (c - c.round()).abs() > 1e-6);
        assert!(fractional, "{} has an integral root", formulation);
        match solve(&landscape, &plan, 4.5, Method::PlEca, parameters.with_node_limit(Some(1))) {
            Err(Error::Solver(SolverError::LimitReached { nodes, best_bound: Some(bound), incumbent, .. })) => {
                assert_eq!(1, nodes);
                assert!(incumbent.is_none());
                assert_float_relative_eq!(root.objective(), bound, 1e-6);
                assert!(bound >= optimum * optimum * (1.0 - 1e-6));
            },
            other => panic!("Expected the node limit to be reached, got {:?}", other),
        }
    }
}

#[test]
fn randomized_rounding_is_reproducible() {
    let (landscape, plan) = grid();
    for weighting in [Weighting::Fractional, Weighting::GainWeighted] {
        let parameters = SolverParameters::default().with_seed(7).with_trials(30).with_weighting(weighting);
        let first = solve(&landscape, &plan, 6.0, Method::RandomizedRounding, parameters.clone()).unwrap();
        let second = solve(&landscape, &plan, 6.0, Method::RandomizedRounding, parameters.clone().with_jobs(3)).unwrap();
        assert_eq!(first.selected(), second.selected());
        assert_eq!(first.eca(), second.eca());
        assert!(first.cost() <= 6.0);
    }
}

#[test]
fn removed_arc_leaves_other_options() {
    let (mut landscape, mut plan) = chain();
    let a1 = landscape.find_corridor(NodeIndex(1), NodeIndex(2)).unwrap();
    landscape.remove_corridor(a1);
    plan.remove_arc(a1);
    assert_eq!(1, plan[OptionIndex(0)].arcs().len());
    assert_eq!(0, plan[OptionIndex(1)].arcs().len());
    assert_eq!(1, plan[OptionIndex(1)].nodes().len());
    assert_eq!(0, plan.remove_empty_options());

    plan.remove_node(NodeIndex(2));
    assert_eq!(1, plan.remove_empty_options());
    assert_eq!(1, plan.nb_options());
    assert_eq!(5.0, plan.cost(OptionIndex(0)));
    let solution = solve(&landscape, &plan, 5.0, Method::PlEca, SolverParameters::default()).unwrap();
    assert_eq!(vec![OptionIndex(0)], solution.selected());
}
