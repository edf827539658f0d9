//! Benchmarks for step planning and batch application.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stagetrack::graph::{reference_pipeline, StageDefinition, StageGraph, StageGraphBuilder};
use stagetrack::render::render_diagram;
use stagetrack::simulation::plan_steps;

fn chain(len: usize) -> StageGraph {
    let defs = (0..len).map(|i| {
        StageDefinition::new(format!("s{i}"), format!("Stage {i}"))
            .in_progress(format!("Running {i}..."))
            .complete(format!("Done {i}"))
            .outgoing(format!("edge {i}"))
    });
    StageGraphBuilder::new("bench")
        .stages(defs)
        .and_then(StageGraphBuilder::build)
        .expect("benchmark graph is valid")
}

fn planning_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_steps");
    for len in [5, 50, 500] {
        let graph = chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &graph, |b, graph| {
            b.iter(|| black_box(plan_steps(graph)));
        });
    }
    group.finish();
}

fn apply_benchmark(c: &mut Criterion) {
    let template = reference_pipeline();
    let steps = plan_steps(&template);

    c.bench_function("apply_reference_run", |b| {
        b.iter(|| {
            let mut graph = template.clone();
            for batch in &steps {
                graph.apply(batch).expect("planned batches resolve");
            }
            black_box(graph.revision())
        });
    });

    c.bench_function("render_reference_snapshot", |b| {
        let snapshot = template.snapshot();
        b.iter(|| black_box(render_diagram(&snapshot)));
    });
}

criterion_group!(benches, planning_benchmark, apply_benchmark);
criterion_main!(benches);
