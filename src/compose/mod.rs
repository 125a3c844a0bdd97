//! Document composition: translated pages to a Word document.
//!
//! Composition runs in two steps. [`Composer`] walks translated pages in
//! order and lays their blocks out as a flat [`ComposedDocument`];
//! [`write_docx`] then serializes that outline with the chosen CJK font.

mod docx;
mod font;
mod layout;
mod options;
mod style;

pub use docx::{build_docx, write_docx};
pub use font::{family_for_path, FontAsset};
pub use layout::{
    ComposedDocument, Composer, DocElement, ImageElement, ListDefinition, ListFormat, PageLayout,
    ParagraphElement, EMU_PER_POINT, TWIPS_PER_POINT,
};
pub use options::{ComposeOptions, A4_HEIGHT, A4_WIDTH};
pub use style::StyleTier;

use crate::model::TranslatedPage;
use crate::report::Warning;

/// Compose every page at once. Returns the document and the warnings for
/// blocks that were skipped or deduplicated.
pub fn compose_pages<'a, I>(pages: I, options: &ComposeOptions) -> (ComposedDocument, Vec<Warning>)
where
    I: IntoIterator<Item = &'a TranslatedPage>,
{
    let mut composer = Composer::new(options);
    let mut warnings = Vec::new();
    for page in pages {
        warnings.extend(composer.compose_page(page));
    }
    (composer.finish(), warnings)
}
