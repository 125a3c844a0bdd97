//! Pipeline options.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::ClassifierConfig;
use crate::compose::ComposeOptions;
use crate::error::{Error, Result};
use crate::parser::ExtractOptions;
use crate::translate::{GateOptions, GenerationConfig};

/// Every knob of a pipeline run, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub extract: ExtractOptions,
    pub classifier: ClassifierConfig,
    pub generation: GenerationConfig,
    pub gate: GateOptions,
    pub compose: ComposeOptions,

    /// Worker threads for page and block work; also the most engine calls
    /// in flight at once, including calls abandoned after a timeout
    pub concurrency: usize,

    /// Appended to the input file stem to name the output
    pub output_suffix: String,

    /// Classify and translate pages in parallel. Extraction is always
    /// sequential.
    pub parallel_pages: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            classifier: ClassifierConfig::default(),
            generation: GenerationConfig::default(),
            gate: GateOptions::default(),
            compose: ComposeOptions::default(),
            concurrency: default_concurrency(),
            output_suffix: "_translated".to_string(),
            parallel_pages: true,
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_gate(mut self, gate: GateOptions) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_compose(mut self, compose: ComposeOptions) -> Self {
        self.compose = compose;
        self
    }

    pub fn with_extract(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    /// Set the worker count (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Process pages one after another.
    pub fn sequential(mut self) -> Self {
        self.parallel_pages = false;
        self
    }

    /// Check every nested config.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.generation.validate()?;
        self.gate.validate()?;
        self.compose.validate()?;
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.output_suffix.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "output suffix {:?} must not contain a path separator",
                self.output_suffix
            )));
        }
        Ok(())
    }
}
