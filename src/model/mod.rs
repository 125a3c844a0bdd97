//! Data model shared by every pipeline stage.
//!
//! Spans come out of the extractor, blocks out of the classifier, and
//! translated blocks out of the translation gate. Every type here is plain
//! data: built once by one stage and read, never mutated, by the next.

mod block;
mod geometry;
mod page;
mod span;
pub mod text;

pub use block::{
    Alignment, Block, ImageBlock, ListItem, ListMarker, NumberPunctuation, NumberStyle, Table,
    TableCell, TextBlock,
};
pub use geometry::{BBox, Matrix};
pub use page::{
    Document, Page, TranslatedBlock, TranslatedPage, TranslatedText, TranslationOutcome,
};
pub use span::{FontDescriptor, ImageData, ImageSpan, Span, TextSpan};
