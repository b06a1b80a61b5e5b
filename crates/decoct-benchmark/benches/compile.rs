use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use decoct_patch::{CompileOptions, Stage, compile};

static PROGRAM: &str = r#"
total = 0
add = (@value, step = 1) ->
  total = total + step
  @value
for key, value of object when value isnt null
  add(value)
f(x) for x in [1, 2, 3] when x > 1
g(x) if x and not y
result = if total > 2 then "many" else "few"
cache ?= []
"#;

fn benchmark_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.throughput(Throughput::Bytes(PROGRAM.len() as u64));

    for stage in [Stage::Normalize, Stage::Main] {
        let options = CompileOptions { stage };
        group.bench_with_input(BenchmarkId::new("stage", stage), &options, |b, options| {
            b.iter(|| match compile(PROGRAM, options) {
                Ok(output) => black_box(output),
                Err(error) => panic!("{error}"),
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_compile);
criterion_main!(benches);
