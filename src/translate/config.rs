//! Engine generation parameters and gate thresholds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the engine should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Let the caller decide once, before processing starts
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl Device {
    /// Replace `Auto` with a concrete device.
    pub fn resolve(self, gpu_available: bool) -> Device {
        match self {
            Device::Auto if gpu_available => Device::Gpu,
            Device::Auto => Device::Cpu,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Gpu => "gpu",
        }
    }
}

impl std::str::FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "gpu" | "cuda" => Ok(Device::Gpu),
            other => Err(Error::Config(format!("unknown device '{}'", other))),
        }
    }
}

/// Parameters handed to the translation engine with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum output length in tokens
    pub max_length: u32,
    /// Beam width
    pub num_beams: u32,
    /// Sampling temperature
    pub temperature: f32,
    pub do_sample: bool,
    pub length_penalty: f32,
    pub repetition_penalty: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub device: Device,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 256,
            num_beams: 25,
            temperature: 0.4,
            do_sample: false,
            length_penalty: 2.0,
            repetition_penalty: 2.5,
            top_k: 50,
            top_p: 0.6,
            device: Device::Auto,
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_num_beams(mut self, num_beams: u32) -> Self {
        self.num_beams = num_beams;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Settings for the single retry after a degenerate answer: a lower
    /// temperature and no sampling.
    pub fn conservative(&self, temperature_factor: f32) -> Self {
        Self {
            temperature: self.temperature * temperature_factor,
            do_sample: false,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(Error::Config("max_length must be at least 1".to_string()));
        }
        if self.num_beams == 0 {
            return Err(Error::Config("num_beams must be at least 1".to_string()));
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(Error::Config(format!(
                "temperature must not be negative, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Thresholds of the translation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateOptions {
    /// Text at or above this target-script ratio is passed through untranslated
    pub target_ratio_threshold: f32,

    /// Output/input character ratio below which an answer is degenerate
    pub min_length_ratio: f32,

    /// Output/input character ratio above which an answer is degenerate
    pub max_length_ratio: f32,

    /// Temperature multiplier for the retry
    pub retry_temperature_factor: f32,

    /// Per-call engine timeout in milliseconds; 0 disables the timeout
    pub call_timeout_ms: u64,

    /// Treat an answer without any target-script character as degenerate
    pub require_target_script: bool,

    /// Pass through text with no alphabetic characters (page numbers, figures)
    pub skip_non_alphabetic: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            target_ratio_threshold: 0.15,
            min_length_ratio: 0.1,
            max_length_ratio: 4.0,
            retry_temperature_factor: 0.5,
            call_timeout_ms: 30_000,
            require_target_script: true,
            skip_non_alphabetic: true,
        }
    }
}

impl GateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.target_ratio_threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_require_target_script(mut self, require: bool) -> Self {
        self.require_target_script = require;
        self
    }

    /// Engine timeout, or `None` when disabled.
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.target_ratio_threshold) {
            return Err(Error::Config(format!(
                "target_ratio_threshold must be within 0..=1, got {}",
                self.target_ratio_threshold
            )));
        }
        if !(self.min_length_ratio >= 0.0 && self.min_length_ratio < self.max_length_ratio) {
            return Err(Error::Config(format!(
                "length ratio bounds {}..{} are invalid",
                self.min_length_ratio, self.max_length_ratio
            )));
        }
        Ok(())
    }
}
