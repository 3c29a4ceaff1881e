use criterion::{black_box, criterion_group, criterion_main, Criterion};

use recallkit_core::parser::{parse_recall, parse_session_str};

fn bench_session_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_parsing");

    let small = generate_session_toml(8);
    let medium = generate_session_toml(40);
    let large = generate_session_toml(200);

    for (name, content) in [("8_trials", &small), ("40_trials", &medium), ("200_trials", &large)] {
        group.bench_function(name, |b| {
            b.iter(|| parse_session_str(black_box(content), black_box("bench.toml".as_ref())))
        });
    }

    group.finish();
}

fn bench_recall_parsing(c: &mut Criterion) {
    c.bench_function("parse_recall", |b| {
        b.iter(|| parse_recall(black_box("B C - F _ H J")))
    });
}

fn generate_session_toml(n: usize) -> String {
    let mut s = String::new();
    s.push_str(
        r#"[session]
participant = "bench"
experiment = "chunking"
"#,
    );
    for i in 0..n {
        let (condition, original, recalled, chunk) = if i % 2 == 0 {
            ("chunkable", "FBIKRTM", "FBIKR-M", "\nchunk = \"FBI\"")
        } else {
            ("random", "KRTBCDF", "KRT-CD", "")
        };
        s.push_str(&format!(
            r#"
[[trials]]
number = {num}
condition = "{condition}"
original = "{original}"
recalled = "{recalled}"{chunk}
"#,
            num = i + 1,
        ));
    }
    s
}

criterion_group!(benches, bench_session_parsing, bench_recall_parsing);
criterion_main!(benches);
