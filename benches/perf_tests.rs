use criterion::{black_box, criterion_group, criterion_main, Criterion};
use bytelog::{
    info, Buffer, ConsoleEncoder, Core, Discard, Encoder, Entry, EntryCaller, Field, Flags,
    JsonEncoder, Level, Logger, TimeFlags, WriteCore,
};
use chrono::{SecondsFormat, Utc};
use std::fs::File;
use std::sync::Arc;
use tempfile::tempdir;

const QUOTE_INPUT: &str = "Fran & Freddie's Diner\t<tasty@example.com>";

fn sample_fields() -> Vec<Field> {
    vec![
        Field::new("int", 100),
        Field::new("str", "ok"),
        Field::new("latency", std::time::Duration::from_micros(1250)),
        Field::new("ratio", 0.75),
        Field::new("tags", vec!["a", "b", "c"]),
    ]
}

fn bench_append_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("Time Formatting");
    let now = Utc::now();

    group.bench_function("append_time_rfc3339_nano", |b| {
        let mut buf = Buffer::with_capacity(64);
        b.iter(|| {
            buf.reset();
            buf.append_time(black_box(&now), TimeFlags::RFC3339_NANO);
            black_box(buf.len())
        });
    });

    group.bench_function("chrono_to_rfc3339", |b| {
        b.iter(|| black_box(now.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
    });

    group.finish();
}

fn bench_quote(c: &mut Criterion) {
    let mut group = c.benchmark_group("Quoting");

    group.bench_function("append_quote", |b| {
        let mut buf = Buffer::with_capacity(128);
        b.iter(|| {
            buf.reset();
            buf.append_quote(black_box(QUOTE_INPUT));
            black_box(buf.len())
        });
    });

    group.bench_function("append_html_quote", |b| {
        let mut buf = Buffer::with_capacity(128);
        b.iter(|| {
            buf.reset();
            buf.append_html_quote(black_box(QUOTE_INPUT));
            black_box(buf.len())
        });
    });

    group.bench_function("serde_json_to_string", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(QUOTE_INPUT)).unwrap()));
    });

    group.finish();
}

fn bench_encoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("Encoders");
    let fields = sample_fields();
    let context = [Field::new("instance", 9000)];
    let caller = EntryCaller {
        defined: true,
        file: "bytelog/perf_tests.rs",
        line: 30,
    };
    let entry = Entry::new(Level::INFO, "info message")
        .with_caller(caller)
        .with_context(&context)
        .with_fields(&fields);

    let console = ConsoleEncoder::new(Flags::STD | Flags::MICROSECONDS | Flags::SHORT_FILE);
    group.bench_function("console", |b| {
        let mut buf = Buffer::with_capacity(512);
        b.iter(|| {
            buf.reset();
            console.encode(&mut buf, black_box(&entry)).unwrap();
            black_box(buf.len())
        });
    });

    let json = JsonEncoder::new(Flags::SHORT_FILE);
    group.bench_function("json", |b| {
        let mut buf = Buffer::with_capacity(512);
        b.iter(|| {
            buf.reset();
            json.encode(&mut buf, black_box(&entry)).unwrap();
            black_box(buf.len())
        });
    });

    group.finish();
}

fn bench_logger(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logger");
    let fields = sample_fields();

    let core = WriteCore::new(JsonEncoder::new(Flags::SHORT_FILE), Discard, Level::INFO);
    let logger = Logger::new(Arc::new(core)).named("bench").with_caller(true);

    group.bench_function("json_to_discard", |b| {
        b.iter(|| logger.info(black_box("request served"), &fields));
    });

    group.bench_function("disabled_level", |b| {
        b.iter(|| logger.debug(black_box("never written"), &fields));
    });

    group.bench_function("macro_with_args", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            info!(logger, "iteration={} of {}", i, "bench"; "even" => i % 2 == 0);
        });
    });

    group.sample_size(10); // Fewer samples due to I/O operations
    group.bench_function("json_to_file", |b| {
        let dir = tempdir().unwrap();
        let file = File::create(dir.path().join("bench.log")).unwrap();
        let core = WriteCore::new(JsonEncoder::new(Flags::SHORT_FILE), file, Level::INFO);
        b.iter(|| core.write(&Entry::new(Level::INFO, "to disk").with_fields(&fields)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_append_time, bench_quote, bench_encoders, bench_logger);
criterion_main!(benches);
