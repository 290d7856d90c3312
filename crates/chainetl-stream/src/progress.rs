//! Progress reporting hook for long runs.

/// Snapshot of the pipeline counters, taken after a page drains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressSnapshot {
    /// 1-based page number.
    pub page: u64,
    /// Rows handed to workers so far (decoded or not).
    pub processed: u64,
    /// Rows successfully decoded and emitted.
    pub decoded: u64,
    /// Distinct block numbers seen.
    pub blocks: u64,
}

/// Callback invoked by the pipeline once per completed page.
pub trait ProgressObserver: Send + Sync {
    fn on_page(&self, snapshot: ProgressSnapshot);
}

/// Blanket impl so closures can be used as observers.
impl<F: Fn(ProgressSnapshot) + Send + Sync> ProgressObserver for F {
    fn on_page(&self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}
