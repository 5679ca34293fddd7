//! Oracle strategies selected at composition time.
//!
//! Business logic never branches on "is the oracle real": the composition
//! root picks one of these (or the HTTP transport in infra) once, and the
//! controller only ever sees the `ReasoningOracle` trait.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::adapter::ReasoningOracle;
use crate::error::OracleError;

/// Deterministic development strategy.
///
/// Answers a well-formed, empty decision set, so every campaign is decided
/// by the deterministic ruleset. Useful when running the full pipeline
/// without a reasoning collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedOracle;

impl ReasoningOracle for SimulatedOracle {
    fn request(&self, _prompt: &str) -> Result<String, OracleError> {
        Ok(r#"{"decisions": [], "reallocation": null}"#.to_string())
    }
}

/// Composition-time stand-in for absent credentials.
///
/// Turns "no API key" into a constructor-time capability instead of a
/// runtime null-check: every request fails with `MissingCredentials`, which
/// the controller treats as a permanent fallback for the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredOracle;

impl ReasoningOracle for UnconfiguredOracle {
    fn request(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::MissingCredentials)
    }
}

/// Test double replaying queued responses in order.
///
/// Once the queue is empty, requests fail as unavailable.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<String, OracleError>>>,
}

impl ScriptedOracle {
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
        }
    }

    pub fn failing(error: OracleError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(error)])),
        }
    }

    pub fn push(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(response.into()));
    }
}

impl ReasoningOracle for ScriptedOracle {
    fn request(&self, _prompt: &str) -> Result<String, OracleError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_proposal;

    #[test]
    fn simulated_answer_is_well_formed_and_empty() {
        let raw = SimulatedOracle.request("ignored").unwrap();
        let proposal = parse_proposal(&raw).unwrap();
        assert!(proposal.decisions.is_empty());
    }

    #[test]
    fn unconfigured_always_reports_missing_credentials() {
        assert_eq!(
            UnconfiguredOracle.request("ignored").unwrap_err(),
            OracleError::MissingCredentials
        );
    }

    #[test]
    fn scripted_replays_in_order_then_runs_dry() {
        let oracle = ScriptedOracle::with_responses(["one", "two"]);
        assert_eq!(oracle.request("p").unwrap(), "one");
        assert_eq!(oracle.request("p").unwrap(), "two");
        assert!(matches!(
            oracle.request("p").unwrap_err(),
            OracleError::Unavailable(_)
        ));
    }
}
