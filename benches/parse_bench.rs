use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use time_tracer::parsing::LogParser;

/// A year of synthetic day blocks with a handful of intervals each.
fn build_large_log(days: usize) -> String {
    let projects = [
        "study_math",
        "study_english_words",
        "exercise_cardio_run",
        "recreation_bilibili",
        "sleep_night",
    ];
    let mut log = String::new();
    for day in 0..days {
        log.push_str(&format!("Date: 2025-{:02}-{:02}\n", day % 12 + 1, day % 28 + 1));
        log.push_str("Status: True\nGetup: 07:00\n");
        for (index, project) in projects.iter().enumerate() {
            let start = 8 + index * 2;
            log.push_str(&format!("{start:02}:00~{:02}:30{project}\n", start + 1));
        }
    }
    log
}

fn bench_parse_content(c: &mut Criterion) {
    let content = build_large_log(365);
    c.bench_function("parse_year_of_logs", |b| {
        b.iter(|| {
            let mut parser = LogParser::new(&HashMap::new());
            parser.parse_content(black_box(&content));
            parser.commit_all();
            black_box(parser.records.len())
        });
    });
}

criterion_group!(benches, bench_parse_content);
criterion_main!(benches);
