use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ConvertArgs,
    convert::RowConverter,
    io_utils::{self, LineSink},
    printable_delimiter,
    report::{ConversionReport, RunSummary},
    schema::Schema,
    stats::FieldStatistics,
    writer::{LineWriter, LineWriterOptions},
};

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let format = io_utils::check_input(&args.input)?;
    let delimiter = args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Converting '{}' -> {:?} (delimiter '{}', gzip {})",
        args.input.display(),
        args.output,
        printable_delimiter(delimiter),
        args.gzip
    );

    let schema = match &args.schema {
        Some(path) => {
            let schema = Schema::load(path, args.schema_name.as_deref())
                .with_context(|| format!("Loading schema from {path:?}"))?;
            info!("Loaded schema with {} field(s) from {path:?}", schema.len());
            Some(schema)
        }
        None => None,
    };

    // Kind inference consumes one pass over the input; rows are read again below.
    let converter = {
        let mut reader = io_utils::open_csv_reader_from_path(&args.input, format, delimiter)?;
        RowConverter::from_reader(&mut reader, args.sample_rows, encoding)
            .with_context(|| format!("Inferring column kinds for {:?}", args.input))?
    };
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, format, delimiter)?;

    let sink = LineSink::create(&args.output, args.gzip)?;
    let fix_keys = !args.keep_illegal_keys;
    let options = LineWriterOptions {
        fix_keys,
        progress_every: args.progress_every,
    };
    let mut stats = FieldStatistics::new();
    let mut writer = LineWriter::new(
        sink,
        &converter,
        schema.as_ref(),
        &mut stats,
        encoding,
        options,
    );
    for record in reader.byte_records() {
        writer.write_result(record)?;
    }
    let rows_written = writer.rows_written();
    let rows_skipped = writer.rows_skipped();
    writer
        .into_sink()
        .finish()
        .with_context(|| format!("Finishing output file {:?}", args.output))?;
    info!(
        "Wrote {rows_written} row(s) to {:?} ({rows_skipped} skipped)",
        args.output
    );

    let report = ConversionReport {
        schema: schema.as_ref(),
        stats: &stats,
        run: RunSummary {
            output: args.output.clone(),
            rows_written,
            rows_skipped,
            columns: converter.headers().len(),
            fix_keys,
        },
    };
    print!("{}", report.render());
    Ok(())
}

