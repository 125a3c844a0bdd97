//! HTTP adapter for an external translation engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pdftrans::{Error, GenerationConfig, Translator};

/// Request body sent to the engine.
#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
    config: &'a GenerationConfig,
}

/// Expected response body.
#[derive(Deserialize)]
struct TranslateResponse {
    translation: String,
}

/// Engine reached over HTTP: POST `{text, source_lang, target_lang, config}`,
/// answer `{"translation": "..."}`.
pub struct HttpTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    source_lang: String,
    target_lang: String,
}

impl HttpTranslator {
    /// Build a client for `endpoint`. `timeout` bounds each HTTP exchange;
    /// the pipeline applies its own per-call timeout on top.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> pdftrans::Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("pdftrans/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            source_lang: "en".to_string(),
            target_lang: "zh".to_string(),
        })
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, config: &GenerationConfig) -> pdftrans::Result<String> {
        let request = TranslateRequest {
            text,
            source_lang: &self.source_lang,
            target_lang: &self.target_lang,
            config,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| Error::Translation(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Translation(format!(
                "engine answered {} for {}",
                status, self.endpoint
            )));
        }

        let body: TranslateResponse = response
            .json()
            .map_err(|e| Error::Translation(format!("malformed engine response: {}", e)))?;
        Ok(body.translation)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}
