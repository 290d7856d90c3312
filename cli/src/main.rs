//! chainetl — stream raw EVM event logs out of ClickHouse, decode them
//! against contract ABIs, and land the results in per-block files and/or a
//! warehouse table.
//!
//! ```text
//! chainetl --host warehouse --port 8123 --user etl --password ... \
//!          --database ethereum --blockrange 18000000-18001000 \
//!          --workers 8 --insert-decoded-logs --output-dir ./decoded
//! ```
//!
//! Exit codes: 0 on success, 1 on argument or runtime error.

use anyhow::{Context, Result};
use chainetl_clickhouse::{
    ClickHouseAbiResolver, ClickHouseConfig, ClickHouseLogSource, ClickHouseWriter, QueryConfig,
};
use chainetl_decode::DecoderOptions;
use chainetl_stream::{
    BatchingSink, BlockFileWriter, FileFormat, Pipeline, PipelineConfig, RunReport,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "chainetl",
    about = "Decode EVM event logs from a ClickHouse warehouse into analytics records",
    version
)]
struct Cli {
    /// ClickHouse host
    #[arg(long)]
    host: String,

    /// ClickHouse user
    #[arg(long)]
    user: String,

    /// ClickHouse password
    #[arg(long)]
    password: String,

    /// ClickHouse database
    #[arg(long)]
    database: String,

    /// ClickHouse HTTP port
    #[arg(long)]
    port: u16,

    /// Inclusive block range, e.g. 18000000-18001000
    #[arg(long, value_parser = parse_block_range)]
    blockrange: BlockRange,

    /// Decode worker threads per page
    #[arg(long, default_value_t = default_workers())]
    workers: usize,

    /// Rows fetched per source page
    #[arg(long, default_value_t = 25_000)]
    page_size: u64,

    /// Also insert decoded rows back into ClickHouse
    #[arg(long)]
    insert_decoded_logs: bool,

    /// Directory for per-block output files
    #[arg(long, default_value = "./decoded")]
    output_dir: PathBuf,

    /// Write JSON block files instead of Parquet
    #[arg(long)]
    json: bool,

    /// Log verbosity
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory of SQL template overrides
    #[arg(long)]
    sql_config_dir: Option<PathBuf>,

    /// Disable the best-effort decoding of events missing from the ABI
    #[arg(long)]
    no_unknown_event_fallback: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BlockRange {
    start: u64,
    end: u64,
}

fn parse_block_range(s: &str) -> Result<BlockRange, String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| "expected START-END".to_string())?;
    let start: u64 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start block '{start}'"))?;
    let end: u64 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end block '{end}'"))?;
    if start > end {
        return Err(format!("start block {start} is after end block {end}"));
    }
    Ok(BlockRange { start, end })
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn init_tracing(level: LogLevel, log_file: Option<&PathBuf>) -> Result<()> {
    let filter =
        EnvFilter::try_new(level.directive()).unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file '{}'", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

fn log_report(report: &RunReport) {
    let rate = if report.processed > 0 {
        100.0 * report.decoded as f64 / report.processed as f64
    } else {
        0.0
    };
    let decode_rate = format!("{rate:.1}%");
    tracing::info!(
        processed = report.processed,
        decoded = report.decoded,
        skipped = report.skipped,
        blocks = report.blocks,
        pages = report.pages,
        decode_rate = %decode_rate,
        "streaming log processing completed"
    );
    for sink in &report.sinks {
        tracing::info!(
            sink = %sink.name,
            written = sink.written,
            failed = sink.failed,
            "sink totals"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.log_file.as_ref())?;

    tracing::info!(
        host = %cli.host,
        port = cli.port,
        database = %cli.database,
        start_block = cli.blockrange.start,
        end_block = cli.blockrange.end,
        workers = cli.workers,
        page_size = cli.page_size,
        insert_decoded_logs = cli.insert_decoded_logs,
        output_dir = %cli.output_dir.display(),
        format = if cli.json { "json" } else { "parquet" },
        "chainetl starting"
    );

    let mut queries = match &cli.sql_config_dir {
        Some(dir) => QueryConfig::load_from_dir(dir),
        None => QueryConfig::default(),
    };
    queries.set_page_size(cli.page_size);

    let warehouse = ClickHouseConfig {
        host: cli.host,
        port: cli.port,
        user: cli.user,
        password: cli.password,
        database: cli.database,
        timeout_secs: 30,
    };

    let source = ClickHouseLogSource::new(&warehouse, queries.clone());
    source
        .test_connection()
        .await
        .context("ClickHouse connection test failed")?;
    tracing::info!(connection = %warehouse.connection_info(), "connected to ClickHouse");

    let resolver = ClickHouseAbiResolver::new(&warehouse, queries.clone());

    let config = PipelineConfig {
        start_block: cli.blockrange.start,
        end_block: cli.blockrange.end,
        page_size: queries.page_size(),
        workers: cli.workers.max(1),
        decoder_options: DecoderOptions {
            unknown_event_fallback: !cli.no_unknown_event_fallback,
            ..DecoderOptions::default()
        },
    };
    let mut pipeline = Pipeline::new(Arc::new(source), Arc::new(resolver), config);

    // One batch per thousand rows and worker keeps block files whole for
    // all but the densest blocks.
    let batch_size = 1_000 * cli.workers.max(1);
    let format = if cli.json {
        FileFormat::Json
    } else {
        FileFormat::Parquet
    };
    let file_writer =
        BlockFileWriter::new(&cli.output_dir, format).context("create output directory")?;
    pipeline.add_sink(Box::new(BatchingSink::new(file_writer, batch_size)));

    if cli.insert_decoded_logs {
        let writer = ClickHouseWriter::new(&warehouse, &queries);
        pipeline.add_sink(Box::new(BatchingSink::new(writer, batch_size)));
    }

    let report = pipeline.run().await.context("streaming decode failed")?;
    log_report(&report);
    Ok(())
}
