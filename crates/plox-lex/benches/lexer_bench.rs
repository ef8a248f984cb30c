//! Lexer throughput benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plox_lex::tokenize;
use plox_util::Handler;

fn sample_program() -> String {
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!(
            "fun work_{i}(n) {{\n    var total = 0;\n    while (n > 0) {{\n        total = total + n * 2.5;\n        n = n - 1;\n    }}\n    return total;\n}}\nprint work_{i}(10);\n"
        ));
    }
    source
}

fn bench_tokenize(c: &mut Criterion) {
    let source = sample_program();
    c.bench_function("tokenize_sample_program", |b| {
        b.iter(|| {
            let handler = Handler::new();
            let tokens = tokenize(black_box(&source), &handler);
            black_box(tokens.len())
        })
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
