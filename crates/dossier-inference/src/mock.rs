//! Mock generation backend for deterministic testing.
//!
//! Records every call so tests can assert on generation counts (the
//! customization reuse tests depend on "exactly one generation call"), and
//! supports fixed responses, per-input response mappings, and forced
//! failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dossier_core::{Error, GenerationBackend, Result};

/// A recorded generation call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Default)]
struct MockConfig {
    default_response: String,
    fixed_responses: HashMap<String, String>,
    fail_with: Option<String>,
}

/// Mock generation backend.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<Mutex<MockConfig>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGenerationBackend {
    /// Create a mock returning `"Mock response"` for everything.
    pub fn new() -> Self {
        let config = MockConfig {
            default_response: "Mock response".to_string(),
            ..Default::default()
        };
        Self {
            config: Arc::new(Mutex::new(config)),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response returned for unmapped prompts.
    pub fn with_fixed_response(self, response: impl Into<String>) -> Self {
        self.config.lock().unwrap().default_response = response.into();
        self
    }

    /// Map a specific prompt to a specific response.
    pub fn with_response_mapping(
        self,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.config
            .lock()
            .unwrap()
            .fixed_responses
            .insert(prompt.into(), response.into());
        self
    }

    /// Make every subsequent call fail with a `Generation` error.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.config.lock().unwrap().fail_with = Some(message.into());
    }

    /// Stop failing.
    pub fn recover(&self) {
        self.config.lock().unwrap().fail_with = None;
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of generation calls made.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.call_log.lock().unwrap().push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
        });

        let config = self.config.lock().unwrap();
        if let Some(message) = &config.fail_with {
            return Err(Error::Generation(message.clone()));
        }
        Ok(config
            .fixed_responses
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| config.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_fixed_response() {
        let mock = MockGenerationBackend::new().with_fixed_response("tailored output");
        assert_eq!(mock.generate("anything").await.unwrap(), "tailored output");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_response_mapping_wins() {
        let mock = MockGenerationBackend::new()
            .with_fixed_response("default")
            .with_response_mapping("special", "mapped");
        assert_eq!(mock.generate("special").await.unwrap(), "mapped");
        assert_eq!(mock.generate("other").await.unwrap(), "default");
    }

    #[tokio::test]
    async fn test_mock_failure_and_recovery() {
        let mock = MockGenerationBackend::new();
        mock.fail_with("quota exceeded");

        let err = mock.generate("x").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));

        mock.recover();
        assert!(mock.generate("x").await.is_ok());
        // Failed calls are still recorded.
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_records_system_context() {
        let mock = MockGenerationBackend::new();
        mock.generate_with_system("you are an editor", "rewrite")
            .await
            .unwrap();
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "you are an editor");
        assert_eq!(calls[0].prompt, "rewrite");
    }
}
