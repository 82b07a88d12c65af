//! Benchmarks for markdown to HTML rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markpad::render::render_markdown;

fn sample(sections: usize) -> String {
    (0..sections)
        .map(|i| {
            format!(
                "**Section {i}** has _emphasis_, `code`, ~~old~~ and a [link](https://example.com/{i}).\n\
                 ```rust\nfn f{i}() -> u32 {{ {i} }}\n```\n<raw & \"quoted\">\n"
            )
        })
        .collect()
}

fn bench_render_markdown(c: &mut Criterion) {
    let small = sample(4);
    let large = sample(400);

    c.bench_function("render_markdown_small", |b| {
        b.iter(|| render_markdown(black_box(&small)));
    });
    c.bench_function("render_markdown_large", |b| {
        b.iter(|| render_markdown(black_box(&large)));
    });
}

criterion_group!(benches, bench_render_markdown);
criterion_main!(benches);
