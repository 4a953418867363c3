//! Generation backend configuration.
//!
//! Configuration is an explicit value injected at construction, never read
//! from ambient state inside the backend. `from_env` exists for binaries and
//! tests that want the conventional `DOSSIER_*` variables.

use std::env;
use std::time::Duration;

use dossier_core::defaults;

/// Configuration for an OpenAI-compatible generation backend.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// API key (None for local, unauthenticated endpoints).
    pub api_key: Option<String>,
    /// Model slug.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Cap on completion tokens.
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GENERATION_URL.to_string(),
            api_key: None,
            model: defaults::GENERATION_MODEL.to_string(),
            timeout: Duration::from_secs(defaults::GENERATION_TIMEOUT_SECS),
            max_tokens: defaults::GENERATION_MAX_TOKENS,
        }
    }
}

impl GenerationConfig {
    /// Build from `DOSSIER_GENERATION_URL`, `DOSSIER_GENERATION_API_KEY`,
    /// `DOSSIER_GENERATION_MODEL`, and `DOSSIER_GENERATION_TIMEOUT_SECS`,
    /// falling back to defaults.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: env::var("DOSSIER_GENERATION_URL").unwrap_or(base.base_url),
            api_key: env::var("DOSSIER_GENERATION_API_KEY").ok(),
            model: env::var("DOSSIER_GENERATION_MODEL").unwrap_or(base.model),
            timeout: env::var("DOSSIER_GENERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(base.timeout),
            max_tokens: base.max_tokens,
        }
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model slug.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
