//! PDF parsing: loading documents and extracting positioned spans.

pub mod backend;
mod extractor;
mod fonts;
mod images;
mod options;

pub use backend::{ContentOp, LopdfBackend, PageGeometry, PdfValue};
pub use extractor::{Extractor, SpanIter};
pub use fonts::FontMetrics;
pub use images::decode_image_xobject;
pub use options::ExtractOptions;
