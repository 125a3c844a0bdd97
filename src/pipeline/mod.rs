//! Pipeline driver.
//!
//! A [`Pipeline`] sequences the stages for one document at a time:
//!
//! 1. extraction of every page's spans (an unreadable page yields an empty page)
//! 2. classification and translation per page, in parallel on a bounded pool
//! 3. composition in source page order
//! 4. writing the DOCX through a temporary file
//!
//! Batch runs iterate documents and keep going past failed files.

mod cancel;
mod driver;
mod options;
mod progress;

pub use cancel::CancellationToken;
pub use driver::{discover_pdfs, output_path_for, Pipeline};
pub use options::PipelineOptions;
pub use progress::{NoProgress, ProgressObserver};
