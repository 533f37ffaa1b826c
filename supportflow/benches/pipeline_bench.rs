//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use supportflow::prelude::*;
use supportflow::testing::{sample_request, support_workflow};

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    let agent = PipelineAgent::with_builtins(
        support_workflow(),
        Arc::new(InMemoryKnowledgeBase::sample()),
        SupportflowConfig::default(),
    );

    c.bench_function("support_workflow_run", |b| {
        b.iter(|| {
            let state = runtime.block_on(agent.run(black_box(sample_request()))).unwrap();
            black_box(state)
        })
    });

    let knowledge_base = InMemoryKnowledgeBase::sample();
    c.bench_function("knowledge_base_rank", |b| {
        b.iter(|| black_box(knowledge_base.rank(black_box("Where is my order? It is delayed"), 3)))
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
