use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use csv_ndjson::convert::RowConverter;
use csv_ndjson::io_utils::{self, InputFormat};
use csv_ndjson::schema::{Schema, SchemaField, SchemaType};
use csv_ndjson::stats::FieldStatistics;
use csv_ndjson::writer::{LineWriter, LineWriterOptions};
use encoding_rs::UTF_8;
use tempfile::TempDir;

fn generate_events(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("events.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "id,user-id,amount,status").expect("header");
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "",
        };
        let amount = if i % 50 == 0 {
            "n/a".to_string()
        } else {
            format!("{}.{}", i % 500, i % 10)
        };
        writeln!(file, "{i},{},{amount},{status}", i % 97).expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_schema() -> Schema {
    Schema::from_fields([
        SchemaField {
            name: "id".into(),
            field_type: SchemaType::Integer,
        },
        SchemaField {
            name: "user-id".into(),
            field_type: SchemaType::String,
        },
        SchemaField {
            name: "amount".into(),
            field_type: SchemaType::Float,
        },
    ])
    .expect("schema")
}

fn convert_all(csv_path: &PathBuf, schema: Option<&Schema>) -> usize {
    let mut reader =
        io_utils::open_csv_reader_from_path(csv_path, InputFormat::Csv, b',').expect("reader");
    let converter = RowConverter::from_reader(&mut reader, 0, UTF_8).expect("converter");
    let mut reader =
        io_utils::open_csv_reader_from_path(csv_path, InputFormat::Csv, b',').expect("reader");
    let mut stats = FieldStatistics::new();
    let mut writer = LineWriter::new(
        io::sink(),
        &converter,
        schema,
        &mut stats,
        UTF_8,
        LineWriterOptions {
            progress_every: 0,
            ..LineWriterOptions::default()
        },
    );
    for record in reader.byte_records() {
        writer.write_result(record).expect("row");
    }
    writer.rows_written()
}

fn row_pipeline(c: &mut Criterion) {
    let (_dir, csv_path) = generate_events(20_000);
    let schema = bench_schema();
    let mut group = c.benchmark_group("row_pipeline");
    group.sample_size(20);
    group.bench_function("without_schema", |b| {
        b.iter_batched(
            || csv_path.clone(),
            |path| convert_all(&path, None),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("with_schema", |b| {
        b.iter_batched(
            || csv_path.clone(),
            |path| convert_all(&path, Some(&schema)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, row_pipeline);
criterion_main!(benches);
