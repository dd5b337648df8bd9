/// The number of rows between two progress reports.
pub const PROGRESS_INTERVAL: usize = 1000;

/// Receives the number of processed rows from time to time.
pub trait ProgressSink {
    fn report(&mut self, rows: usize);
}

impl<F: FnMut(usize)> ProgressSink for F {
    fn report(&mut self, rows: usize) {
        self(rows);
    }
}

/// Logs progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn report(&mut self, rows: usize) {
        tracing::info!(rows, "Generating observations");
    }
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _rows: usize) {}
}
