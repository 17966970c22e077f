use criterion::{criterion_group, criterion_main, Criterion};
use retro::Regex;
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("match", |b| {
        b.iter(|| {
            let re = Regex::new("[0123456789]+").unwrap();
            let _result = re.find(black_box("Price: $123"));
        })
    });

    c.bench_function("complex match", |b| {
        b.iter(|| {
            let d = "[0123456789]";
            let re = Regex::new(format!("({d}{{1,2}})/({d}{{1,2}})/({d}{{4,4}})")).unwrap();
            let _result = re.find(black_box("Born on 12/25/1990 and graduated on 5/15/2012"));
        })
    });

    c.bench_function("prefix match", |b| {
        let re = Regex::new("(ab|cd)*ef").unwrap();
        b.iter(|| re.is_match(black_box("abcdabcdabcdef")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
