use thiserror::Error;

/// Maximum response excerpt carried in a `Malformed` error.
const EXCERPT_LEN: usize = 160;

/// Failure of the reasoning-oracle collaborator.
///
/// All variants are recoverable at the call site by falling back to the
/// deterministic ruleset; none may abort an analysis cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Transport-level failure (network, non-2xx, connection refused).
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The collaborator did not answer within the configured window.
    #[error("oracle timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Credentials were absent at composition time. Permanent for the run:
    /// callers fall back without retrying.
    #[error("oracle credentials not configured")]
    MissingCredentials,

    /// The response carried no usable JSON decision set.
    #[error("malformed oracle response ({reason}); excerpt: {excerpt:?}")]
    Malformed { reason: String, excerpt: String },
}

impl OracleError {
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Self::Malformed {
            reason: reason.into(),
            excerpt: excerpt(raw),
        }
    }

    /// Whether retrying within the same run could possibly help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, OracleError::MissingCredentials)
    }
}

/// Bounded, char-safe excerpt of a raw response for diagnosis.
pub fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
