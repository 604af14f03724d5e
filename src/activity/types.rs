use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::github::ActivityError;

pub const GITHUB_SOURCE: &str = "github";
const FALLBACK_ERROR: &str = "Unable to fetch GitHub activity.";

/// Display-ready digest of the latest push. Every field is optional on its own; an empty
/// summary is still a valid value. Serialized with the names the portfolio page reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    #[serde(rename = "repo", skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityData {
    /// Always present on the wire; `null` when there is nothing to show.
    pub github: Option<ActivitySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEnvelope {
    pub data: ActivityData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    pub fetched_at: String,
}

impl ActivityEnvelope {
    /// Folds a fetch outcome into the response shape. Failures never escape: they become an
    /// entry under `errors` and leave `data.github` null.
    pub fn capture(outcome: Result<Option<ActivitySummary>, ActivityError>, now: DateTime<Utc>) -> Self {
        let mut errors = BTreeMap::new();
        let github = match outcome {
            Ok(summary) => summary,
            Err(err) => {
                errors.insert(GITHUB_SOURCE.to_string(), error_message(&err));
                None
            }
        };
        ActivityEnvelope {
            data: ActivityData { github },
            errors: if errors.is_empty() { None } else { Some(errors) },
            fetched_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn error_message(err: &ActivityError) -> String {
    message_or_fallback(&err.to_string())
}

fn message_or_fallback(msg: &str) -> String {
    if msg.trim().is_empty() { FALLBACK_ERROR.to_string() } else { msg.to_string() }
}
