//! Progress callbacks.

use std::path::Path;

use crate::report::DocumentReport;

/// Receives progress events from the pipeline.
///
/// Pages may finish out of order when pages run in parallel. Every method
/// has a no-op default.
pub trait ProgressObserver: Send + Sync {
    /// A document is about to be processed.
    fn document_started(&self, _input: Option<&Path>, _pages: u32) {}

    /// One page has been extracted, classified and translated.
    fn page_finished(&self, _page: u32) {}

    /// A document has been written.
    fn document_finished(&self, _report: &DocumentReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
