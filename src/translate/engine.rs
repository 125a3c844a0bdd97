//! The translation engine seam.

use crate::error::Result;

use super::GenerationConfig;

/// An external machine-translation engine.
///
/// Implementations may fail or return degenerate output; the gate deals
/// with both. Calls must not depend on each other, since blocks are
/// translated in parallel.
pub trait Translator: Send + Sync {
    /// Translate `text` from the source to the target language.
    fn translate(&self, text: &str, config: &GenerationConfig) -> Result<String>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "engine"
    }
}

impl<F> Translator for F
where
    F: Fn(&str, &GenerationConfig) -> Result<String> + Send + Sync,
{
    fn translate(&self, text: &str, config: &GenerationConfig) -> Result<String> {
        self(text, config)
    }
}
