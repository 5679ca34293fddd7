//! HTTP transport for the reasoning oracle.
//!
//! The endpoint contract is deliberately thin: POST the prompt, read the
//! completion back as text. The adapter's defensive parser handles whatever
//! shape the completion takes.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use adhelm_oracle::{OracleError, ReasoningOracle};

const URL_VAR: &str = "ADHELM_ORACLE_URL";
const API_KEY_VAR: &str = "ADHELM_ORACLE_API_KEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the reasoning collaborator.
pub struct HttpOracle {
    endpoint: String,
    api_key: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
            agent,
        }
    }

    /// Build from the environment, once, at composition time.
    ///
    /// Missing credentials surface here as `MissingCredentials`; composition
    /// roots typically swap in `UnconfiguredOracle` on that error instead of
    /// re-checking the environment at request time.
    pub fn from_env() -> Result<Self, OracleError> {
        let endpoint = std::env::var(URL_VAR).map_err(|_| OracleError::MissingCredentials)?;
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| OracleError::MissingCredentials)?;
        Ok(Self::new(endpoint, api_key))
    }
}

impl ReasoningOracle for HttpOracle {
    fn request(&self, prompt: &str) -> Result<String, OracleError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .header("authorization", &format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .send_json(json!({ "prompt": prompt }))
            .map_err(|e| classify_transport_error(e, self.timeout))?;

        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| OracleError::Unavailable(format!("failed to read response body: {e}")))?;

        debug!(bytes = text.len(), "oracle response received");
        Ok(text)
    }
}

fn classify_transport_error(error: ureq::Error, timeout: Duration) -> OracleError {
    let msg = error.to_string();
    if msg.contains("timed out") || msg.contains("timeout") {
        OracleError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else {
        OracleError::Unavailable(msg)
    }
}
