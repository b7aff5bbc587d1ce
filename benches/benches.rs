use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use landscape_opt::core::landscape::*;
use landscape_opt::core::restoration_plan::*;
use landscape_opt::eca::eca;
use landscape_opt::precomputation::Precomputation;
use landscape_opt::solvers::solve;
use landscape_opt::{Method, SolverParameters};

/// Square grid of patches with corridors in both directions between neighbours. Every fourth
/// corridor pair can be restored by its own option.
fn grid(side: usize) -> (Landscape, RestorationPlan) {
    let mut landscape = Landscape::new();
    for i in 0..side * side {
        landscape.add_patch(1.0 + (i % 7) as f64, (i % side) as f64, (i / side) as f64);
    }
    let mut plan = RestorationPlan::new();
    let mut count = 0;
    for i in 0..side * side {
        let mut neighbours = vec![];
        if i % side + 1 < side {
            neighbours.push(i + 1);
        }
        if i / side + 1 < side {
            neighbours.push(i + side);
        }
        for j in neighbours {
            let forward = landscape.add_corridor(NodeIndex(i), NodeIndex(j), 0.1);
            let backward = landscape.add_corridor(NodeIndex(j), NodeIndex(i), 0.1);
            if count % 4 == 0 {
                let option = plan.add_option(1.0 + (count % 3) as f64);
                plan.add_corridor(option, forward, 0.8);
                plan.add_corridor(option, backward, 0.8);
            }
            count += 1;
        }
    }
    (landscape, plan)
}

macro_rules! make_benches {
    ($($side:expr,)*) => {
        pub fn bench(c: &mut Criterion) {
            let mut group = c.benchmark_group("landscape_opt");
            group.sample_size(10);
            $(
                let (landscape, plan) = grid($side);
                group.bench_with_input(BenchmarkId::new("eca", $side), &landscape, |b, l| b.iter(|| eca(l)));
                group.bench_with_input(BenchmarkId::new("precomputation", $side), &(&landscape, &plan), |b, (l, p)| b.iter(|| Precomputation::new(l, p)));
                for method in [Method::RandomizedRounding, Method::GreedyInc] {
                    let parameters = SolverParameters::default().with_trials(50);
                    group.bench_with_input(BenchmarkId::new(method.to_string(), $side), &(&landscape, &plan), |b, (l, p)| {
                        b.iter(|| solve(l, p, 4.0, method, parameters.clone()))
                    });
                }
            )*
            group.finish();
        }
        criterion_group!(benches, bench);
        criterion_main!(benches);
    }
}

make_benches!(
    4,
    6,
);
