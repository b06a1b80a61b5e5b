use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};

fn benchmark_parser(c: &mut Criterion) {
    let sources = [
        ("Simple", "a = 1\nf(a)\n"),
        (
            "Medium",
            r#"
f = (a, @b = 1) ->
  if a then b else c
  for x in list when x > 1
    g(x)
  h(y) for y, i in [1, 2, 3]
  a ?= @b
"#,
        ),
    ];

    let mut group = c.benchmark_group("Parser Benchmark");

    for (name, source) in sources {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_code", name), &source, |b, &source| {
            b.iter(|| black_box(decoct_parse::parse(source)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
