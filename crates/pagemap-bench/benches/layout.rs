use criterion::{Criterion, criterion_group, criterion_main};
use pagemap_bench::util;
use pagemap_graph::{
    DisplayMode, LayoutOptions, OrphanStyle, StackExpansion, TreeLayouter, compute_layout,
};
use std::hint::black_box;

fn bench_layout_stacked_site(c: &mut Criterion) {
    let model = util::synthetic_site(20, 50).unwrap();
    let expanded = StackExpansion::new();

    c.bench_function("layout_1000_pages_stacked", |b| {
        b.iter(|| {
            let result = compute_layout(
                black_box(&model),
                DisplayMode::Compact,
                &expanded,
                LayoutOptions::default(),
            );
            black_box(result);
        })
    });
}

fn bench_layout_expanded_site(c: &mut Criterion) {
    let model = util::synthetic_site(20, 50).unwrap();
    let expanded: StackExpansion = model
        .root()
        .children
        .iter()
        .map(|section| section.id.clone())
        .collect();
    let layouter = TreeLayouter {
        options: LayoutOptions {
            orphan_style: OrphanStyle::Subdomain,
            ..LayoutOptions::default()
        },
        ..TreeLayouter::default()
    };

    c.bench_function("layout_1000_pages_expanded", |b| {
        b.iter(|| {
            let result = layouter.execute(black_box(&model), DisplayMode::Thumbnail, &expanded);
            black_box(result);
        })
    });
}

fn bench_layout_deep_chain(c: &mut Criterion) {
    let model = util::synthetic_chain(TreeLayouter::MAX_LAYOUT_DEPTH * 2).unwrap();
    let expanded = StackExpansion::new();

    c.bench_function("layout_deep_chain", |b| {
        b.iter(|| {
            let result = compute_layout(
                black_box(&model),
                DisplayMode::Compact,
                &expanded,
                LayoutOptions::default(),
            );
            black_box(result);
        })
    });
}

criterion_group!(
    benches,
    bench_layout_stacked_site,
    bench_layout_expanded_site,
    bench_layout_deep_chain
);
criterion_main!(benches);
