//! The streaming orchestrator.
//!
//! Pages are processed strictly one after another. Within a page, rows are
//! grouped by contract; a pool of OS threads pulls groups off a shared
//! cursor, parses the group's ABI once, decodes its rows in input order,
//! and emits records through a single lock held across every sink for one
//! record. Cross-group output order is unspecified; cross-page order
//! follows page order.
//!
//! Only source errors abort a run, and even then outstanding work is
//! drained and every sink is flushed first. ABI failures skip a group,
//! decode failures skip a row.

use crate::error::PipelineError;
use crate::progress::{ProgressObserver, ProgressSnapshot};
use crate::resolver::{AbiResolver, ContractAbiRecord};
use crate::sink::RecordSink;
use crate::source::{LogRow, LogSource, PageCursor};
use chainetl_abi::Abi;
use chainetl_decode::{DecodedRecord, DecoderOptions, LogDecoder, LogEntry};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Inclusive block range.
    pub start_block: u64,
    pub end_block: u64,
    /// Rows per source page.
    pub page_size: u64,
    /// Upper bound on decode threads per page; the effective pool is
    /// `min(workers, contract groups)`.
    pub workers: usize,
    pub decoder_options: DecoderOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            end_block: 0,
            page_size: 25_000,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            decoder_options: DecoderOptions::default(),
        }
    }
}

/// Per-page processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagePhase {
    Idle,
    AbiResolved,
    Dispatching,
    Draining,
    Complete,
}

impl fmt::Display for PagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PagePhase::Idle => "idle",
            PagePhase::AbiResolved => "abi-resolved",
            PagePhase::Dispatching => "dispatching",
            PagePhase::Draining => "draining",
            PagePhase::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Rows handed to workers (decoded or not).
    pub processed: u64,
    /// Rows decoded and emitted to the sinks.
    pub decoded: u64,
    /// `processed - decoded`: no ABI, or a row-level decode failure.
    pub skipped: u64,
    /// Distinct block numbers seen.
    pub blocks: u64,
    pub pages: u64,
    pub sinks: Vec<SinkReport>,
}

/// Per-sink totals; written and failed are independent counters.
#[derive(Debug, Clone)]
pub struct SinkReport {
    pub name: String,
    pub written: u64,
    pub failed: u64,
}

/// The streaming pipeline. See the module docs for the concurrency model.
pub struct Pipeline {
    source: Arc<dyn LogSource>,
    resolver: Arc<dyn AbiResolver>,
    sinks: Mutex<Vec<Box<dyn RecordSink>>>,
    config: PipelineConfig,
    progress: Option<Box<dyn ProgressObserver>>,
    processed: AtomicU64,
    decoded: AtomicU64,
    blocks: Mutex<BTreeSet<u64>>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn LogSource>,
        resolver: Arc<dyn AbiResolver>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            resolver,
            sinks: Mutex::new(Vec::new()),
            config,
            progress: None,
            processed: AtomicU64::new(0),
            decoded: AtomicU64::new(0),
            blocks: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn RecordSink>) {
        lock(&self.sinks).push(sink);
    }

    pub fn set_progress(&mut self, observer: Box<dyn ProgressObserver>) {
        self.progress = Some(observer);
    }

    /// Run the pipeline over the configured block range.
    ///
    /// Must be driven from a multi-threaded Tokio runtime: the per-page
    /// decode fan-out blocks in place while its worker threads run.
    pub async fn run(self) -> Result<RunReport, PipelineError> {
        if self.config.start_block > self.config.end_block {
            return Err(PipelineError::InvalidRange {
                start: self.config.start_block,
                end: self.config.end_block,
            });
        }

        tracing::info!(
            start_block = self.config.start_block,
            end_block = self.config.end_block,
            page_size = self.config.page_size,
            workers = self.config.workers,
            "starting streaming decode"
        );

        let mut cursor = PageCursor::new(self.config.start_block, self.config.page_size);
        let mut page_number = 0u64;

        loop {
            page_number += 1;
            let page = match self
                .source
                .select_logs(
                    cursor.start_block(),
                    self.config.end_block,
                    cursor.page_size(),
                    cursor.offset(),
                )
                .await
            {
                Ok(page) => page,
                Err(error) => {
                    tracing::error!(
                        page = page_number,
                        error = %error,
                        "source failed, flushing sinks and aborting"
                    );
                    self.flush_sinks();
                    return Err(PipelineError::Source(error));
                }
            };

            if page.is_empty() {
                page_number -= 1;
                break;
            }

            tracing::info!(page = page_number, rows = page.len(), "processing page");
            self.process_page(&page, page_number).await;
            self.report_progress(page_number);

            if !cursor.advance(&page) {
                break;
            }
        }

        self.flush_sinks();
        Ok(self.report(page_number))
    }

    /// Process one page: resolve ABIs once, group rows by contract, fan the
    /// groups out to the worker pool.
    async fn process_page(&self, page: &[LogRow], page_number: u64) {
        let mut phase = PagePhase::Idle;
        tracing::debug!(page = page_number, phase = %phase, "page accepted");

        self.note_blocks(page);

        let addresses: Vec<String> = page
            .iter()
            .map(|row| row.address.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let abis = match self.resolver.resolve_abis(&addresses).await {
            Ok(abis) => abis,
            Err(error) => {
                // The page completes with zero decoded records.
                tracing::warn!(
                    page = page_number,
                    error = %error,
                    "ABI resolution failed, page completes undecoded"
                );
                self.processed
                    .fetch_add(page.len() as u64, Ordering::Relaxed);
                return;
            }
        };
        phase = PagePhase::AbiResolved;
        tracing::debug!(
            page = page_number,
            contracts = addresses.len(),
            resolved = abis.len(),
            phase = %phase,
            "resolved contract ABIs"
        );

        let mut grouped: BTreeMap<&str, Vec<&LogRow>> = BTreeMap::new();
        for row in page {
            grouped.entry(row.address.as_str()).or_default().push(row);
        }
        let groups: Vec<(&str, Vec<&LogRow>)> = grouped.into_iter().collect();

        let worker_count = self.config.workers.max(1).min(groups.len());
        phase = PagePhase::Dispatching;
        tracing::debug!(
            page = page_number,
            groups = groups.len(),
            workers = worker_count,
            phase = %phase,
            "dispatching contract groups"
        );

        // Shared cursor over the group list; each group is processed
        // end-to-end by exactly one worker.
        let group_cursor = Mutex::new(0usize);
        let panicked = tokio::task::block_in_place(|| {
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..worker_count)
                    .map(|_| scope.spawn(|| self.worker_loop(&group_cursor, &groups, &abis)))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join())
                    .filter(|result| result.is_err())
                    .count()
            })
        });
        phase = PagePhase::Draining;
        if panicked > 0 {
            // Caught at join; the page still completes.
            tracing::error!(
                page = page_number,
                workers = panicked,
                phase = %phase,
                "worker panicked during page decode"
            );
        }

        phase = PagePhase::Complete;
        tracing::debug!(page = page_number, phase = %phase, "page complete");
    }

    /// Worker body: pull groups from the shared cursor until it runs dry.
    fn worker_loop(
        &self,
        group_cursor: &Mutex<usize>,
        groups: &[(&str, Vec<&LogRow>)],
        abis: &HashMap<String, ContractAbiRecord>,
    ) {
        loop {
            let index = {
                let mut cursor = lock(group_cursor);
                let index = *cursor;
                *cursor += 1;
                index
            };
            let Some((address, rows)) = groups.get(index) else {
                break;
            };

            let Some(contract) = abis.get(*address) else {
                tracing::debug!(
                    contract = address,
                    rows = rows.len(),
                    "no ABI for contract, skipping group"
                );
                self.processed.fetch_add(rows.len() as u64, Ordering::Relaxed);
                continue;
            };

            // One parse per contract group; the decoder shares it read-only.
            let abi = match Abi::parse_str(&contract.abi_json) {
                Ok(abi) => Arc::new(abi),
                Err(error) => {
                    tracing::warn!(
                        contract = address,
                        error = %error,
                        rows = rows.len(),
                        "ABI parse failed, skipping group"
                    );
                    self.processed.fetch_add(rows.len() as u64, Ordering::Relaxed);
                    continue;
                }
            };
            let decoder = LogDecoder::with_options(abi, self.config.decoder_options.clone());

            for row in rows {
                self.processed.fetch_add(1, Ordering::Relaxed);
                let entry = LogEntry {
                    topics: row
                        .topics
                        .iter()
                        .filter(|topic| !topic.is_empty())
                        .cloned()
                        .collect(),
                    data: row.data.clone(),
                };
                match decoder.decode(&entry) {
                    Ok(decoded) => {
                        let record = DecodedRecord::from_log(
                            row.transaction_hash.clone(),
                            row.block_number,
                            row.log_index,
                            row.address.clone(),
                            decoded,
                        );
                        self.emit(record);
                        self.decoded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(error) => {
                        tracing::debug!(
                            block = row.block_number,
                            log_index = row.log_index,
                            contract = address,
                            error = %error,
                            "row decode failed"
                        );
                    }
                }
            }
        }
    }

    /// One lock held across every sink's `write` for a record.
    fn emit(&self, record: DecodedRecord) {
        let mut sinks = lock(&self.sinks);
        for sink in sinks.iter_mut() {
            sink.write(record.clone());
        }
    }

    fn note_blocks(&self, page: &[LogRow]) {
        let mut blocks = lock(&self.blocks);
        for row in page {
            blocks.insert(row.block_number);
        }
    }

    fn flush_sinks(&self) {
        // Sinks may block on their own I/O; leave the async context first.
        tokio::task::block_in_place(|| {
            let mut sinks = lock(&self.sinks);
            for sink in sinks.iter_mut() {
                sink.flush();
            }
        });
    }

    fn report_progress(&self, page: u64) {
        let snapshot = ProgressSnapshot {
            page,
            processed: self.processed.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            blocks: lock(&self.blocks).len() as u64,
        };
        tracing::info!(
            page = snapshot.page,
            processed = snapshot.processed,
            decoded = snapshot.decoded,
            blocks = snapshot.blocks,
            "page drained"
        );
        if let Some(observer) = &self.progress {
            observer.on_page(snapshot);
        }
    }

    fn report(&self, pages: u64) -> RunReport {
        let processed = self.processed.load(Ordering::Relaxed);
        let decoded = self.decoded.load(Ordering::Relaxed);
        let sinks = lock(&self.sinks)
            .iter()
            .map(|sink| SinkReport {
                name: sink.name().to_string(),
                written: sink.total_written(),
                failed: sink.total_failed(),
            })
            .collect();
        RunReport {
            processed,
            decoded,
            skipped: processed.saturating_sub(decoded),
            blocks: lock(&self.blocks).len() as u64,
            pages,
            sinks,
        }
    }
}

/// Lock acquisition that survives a poisoned mutex: a panicking worker must
/// not wedge the rest of the page.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
