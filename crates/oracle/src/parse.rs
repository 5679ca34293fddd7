//! Defensive decoding of oracle responses.
//!
//! The collaborator promises nothing about its output: prose, markdown
//! fences, or garbage are all possible. The contract here is to find the
//! first balanced JSON object embedded anywhere in the text and decode it
//! loosely; strict per-entry validation belongs to the merge boundary in
//! the budget controller.

use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// One proposed budget change, as the oracle phrased it.
///
/// Deliberately loosely typed (action as text, budget optional): entries
/// are validated individually at the merge boundary so one bad entry never
/// invalidates the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleDecision {
    pub campaign_id: String,
    pub action: String,
    #[serde(default)]
    pub new_budget: Option<f64>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// The oracle's full answer for a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleProposal {
    pub decisions: Vec<OracleDecision>,
    /// Narrative cross-channel reallocation suggestion, when offered.
    #[serde(default)]
    pub reallocation: Option<String>,
}

/// Extract the first balanced JSON object from `text`.
///
/// String- and escape-aware: braces inside string literals do not count.
pub fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Strip markdown code fences (```json ... ```) when the whole response is
/// one fenced block.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Decode a raw oracle response into a proposal.
pub fn parse_proposal(raw: &str) -> Result<OracleProposal, OracleError> {
    let candidate = strip_code_fences(raw);
    let json = extract_first_json_object(candidate)
        .ok_or_else(|| OracleError::malformed("no JSON object in response", raw))?;

    serde_json::from_str(json)
        .map_err(|e| OracleError::malformed(format!("decision set failed to decode: {e}"), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_embedded_in_prose() {
        let raw = r#"Here is my recommendation after reviewing the metrics:
{"decisions": [{"campaign_id": "a", "action": "SCALE", "new_budget": 150}]}
Let me know if you want a deeper breakdown."#;

        let proposal = parse_proposal(raw).unwrap();
        assert_eq!(proposal.decisions.len(), 1);
        assert_eq!(proposal.decisions[0].action, "SCALE");
        assert_eq!(proposal.decisions[0].new_budget, Some(150.0));
    }

    #[test]
    fn handles_nested_objects_and_braces_in_strings() {
        let raw = r#"{"decisions": [{"campaign_id": "a", "action": "PAUSE", "new_budget": 0, "rationale": "negative ROI {for weeks}"}], "reallocation": "move spend to search"}"#;

        let proposal = parse_proposal(raw).unwrap();
        assert_eq!(proposal.reallocation.as_deref(), Some("move spend to search"));
        assert_eq!(
            proposal.decisions[0].rationale.as_deref(),
            Some("negative ROI {for weeks}")
        );
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = "```json\n{\"decisions\": []}\n```";
        let proposal = parse_proposal(raw).unwrap();
        assert!(proposal.decisions.is_empty());
    }

    #[test]
    fn missing_json_reports_excerpt() {
        let err = parse_proposal("I would rather not commit to numbers today.").unwrap_err();
        match err {
            OracleError::Malformed { excerpt, .. } => {
                assert!(excerpt.contains("rather not"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_object_is_malformed() {
        assert!(parse_proposal(r#"{"decisions": [ "#).is_err());
    }

    #[test]
    fn schema_mismatch_is_malformed() {
        assert!(parse_proposal(r#"{"verdict": "ship it"}"#).is_err());
    }
}
