//! The translation gate: passthrough, engine call, quality check, retry,
//! fallback.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::TranslatedText;

use super::script::{contains_target_script, target_script_ratio};
use super::{GateOptions, GenerationConfig, Translator};

/// Tokens for engine calls in flight. A call hands its token back when the
/// engine returns, even if the gate gave up waiting long before.
#[derive(Clone)]
struct EngineSlots {
    give: Sender<()>,
    take: Receiver<()>,
    limit: usize,
}

impl EngineSlots {
    fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        let (give, take) = bounded(limit);
        for _ in 0..limit {
            let _ = give.send(());
        }
        Self { give, take, limit }
    }

    fn acquire(&self, timeout: Option<Duration>) -> Result<SlotGuard> {
        let taken = match timeout {
            Some(timeout) => self.take.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => Error::Timeout(timeout),
                RecvTimeoutError::Disconnected => slots_closed(),
            }),
            None => self.take.recv().map_err(|_| slots_closed()),
        };
        taken?;
        Ok(SlotGuard {
            give: self.give.clone(),
        })
    }
}

fn slots_closed() -> Error {
    Error::Translation("engine slots closed".to_string())
}

struct SlotGuard {
    give: Sender<()>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Never blocks: the channel holds exactly as many tokens as exist.
        let _ = self.give.send(());
    }
}

/// Decides per text whether to translate, and how to recover from a bad
/// answer.
///
/// The gate holds no mutable state, so one instance can serve every worker.
#[derive(Clone)]
pub struct TranslationGate {
    engine: Arc<dyn Translator>,
    generation: GenerationConfig,
    options: GateOptions,
    slots: Option<EngineSlots>,
}

impl TranslationGate {
    pub fn new(engine: Arc<dyn Translator>, generation: GenerationConfig, options: GateOptions) -> Self {
        Self {
            engine,
            generation,
            options,
            slots: None,
        }
    }

    /// Allow at most `limit` engine calls at once.
    ///
    /// A call counts until the engine returns, so calls the gate abandoned
    /// after a timeout still hold their place. Once every place is held by a
    /// hung call, new texts time out waiting for one and fall back.
    pub fn with_engine_limit(mut self, limit: usize) -> Self {
        self.slots = Some(EngineSlots::new(limit));
        self
    }

    /// Name the engine reports for itself.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Whether `text` would be sent to the engine.
    pub fn needs_translation(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        if self.options.skip_non_alphabetic && !text.chars().any(char::is_alphabetic) {
            return false;
        }
        target_script_ratio(text) < self.options.target_ratio_threshold
    }

    /// Translate one block's text.
    ///
    /// Never fails: engine errors, timeouts and degenerate answers are retried
    /// once with conservative settings and then fall back to the source text.
    pub fn process(&self, text: &str) -> TranslatedText {
        let source = collapse_whitespace(text);
        if !self.needs_translation(&source) {
            return TranslatedText::passthrough(source);
        }
        let query = fold_compatibility(&source);

        let first = match self.attempt(&query, &self.generation) {
            Ok(translation) => return TranslatedText::translated(translation),
            Err(e) => e,
        };
        log::debug!("Retrying after {}: {:?}", first, truncate(&source));

        let retry = self
            .generation
            .conservative(self.options.retry_temperature_factor);
        match self.attempt(&query, &retry) {
            Ok(translation) => TranslatedText::translated(translation),
            Err(e) => {
                log::warn!("Keeping original text ({}): {:?}", e, truncate(&source));
                TranslatedText::fallback(source, e.to_string())
            }
        }
    }

    fn attempt(&self, source: &str, config: &GenerationConfig) -> Result<String> {
        let candidate = self.call(source, config)?;
        let candidate = candidate.trim().to_string();
        self.check(source, &candidate)?;
        Ok(candidate)
    }

    fn acquire_slot(&self, timeout: Option<Duration>) -> Result<Option<SlotGuard>> {
        self.slots.as_ref().map(|slots| slots.acquire(timeout)).transpose()
    }

    /// Call the engine, bounded by the configured timeout. Waiting for an
    /// engine slot counts against the same timeout.
    fn call(&self, source: &str, config: &GenerationConfig) -> Result<String> {
        let Some(timeout) = self.options.call_timeout() else {
            let _slot = self.acquire_slot(None)?;
            return self.engine.translate(source, config);
        };
        let deadline = Instant::now() + timeout;
        let slot = self.acquire_slot(Some(timeout))?;

        let (tx, rx) = bounded(1);
        let engine = Arc::clone(&self.engine);
        let text = source.to_string();
        let config = config.clone();
        // A hung engine call keeps its thread and its slot; the gate stops
        // waiting for it.
        thread::Builder::new()
            .name("pdftrans-engine".to_string())
            .spawn(move || {
                let result = engine.translate(&text, &config);
                drop(slot);
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Translation(format!(
                "{} stopped without an answer",
                self.engine.name()
            ))),
        }
    }

    /// Reject degenerate answers.
    fn check(&self, source: &str, candidate: &str) -> Result<()> {
        if candidate.is_empty() {
            return Err(Error::Translation("empty output".to_string()));
        }
        if candidate == source {
            return Err(Error::Translation("output identical to input".to_string()));
        }

        let ratio = candidate.chars().count() as f32 / source.chars().count().max(1) as f32;
        if ratio > self.options.max_length_ratio || ratio < self.options.min_length_ratio {
            return Err(Error::Translation(format!("length ratio {:.2} out of bounds", ratio)));
        }
        if self.options.require_target_script && !contains_target_script(candidate) {
            return Err(Error::Translation("output has no target-script text".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for TranslationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationGate")
            .field("engine", &self.engine.name())
            .field("generation", &self.generation)
            .field("options", &self.options)
            .field("engine_limit", &self.slots.as_ref().map(|s| s.limit))
            .finish()
    }
}

/// Collapse line breaks and runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFKC-fold text sent to the engine (ligatures, fullwidth Latin).
pub fn fold_compatibility(text: &str) -> String {
    text.nfkc().collect()
}

fn truncate(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(MAX).collect();
        s.push('…');
        s
    }
}
