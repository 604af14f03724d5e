use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub const PUSH_EVENT: &str = "PushEvent";

/// One entry of `/users/{handle}/events/public`. The feed is external and unversioned, so
/// every field is read leniently: missing or mistyped values become `None`.
#[derive(Debug, Default, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub repo: Option<EventRepo>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub payload: Option<PushPayload>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventRepo {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref", default, deserialize_with = "lenient")]
    pub git_ref: Option<String>,
    /// Kept raw so a single odd entry does not hide the others.
    #[serde(default, deserialize_with = "lenient")]
    pub commits: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PushCommit {
    #[serde(default, deserialize_with = "lenient")]
    pub sha: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

impl Event {
    pub fn is_push(&self) -> bool {
        self.kind.as_deref() == Some(PUSH_EVENT)
    }

    pub fn repo_name(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn git_ref(&self) -> Option<&str> {
        self.payload.as_ref().and_then(|p| p.git_ref.as_deref())
    }

    pub fn commits(&self) -> &[Value] {
        self.payload
            .as_ref()
            .and_then(|p| p.commits.as_deref())
            .unwrap_or_default()
    }
}

/// Splits a decoded body into events. Anything but an array yields no events, and array
/// entries that are not objects are dropped.
pub fn events_from_value(body: Value) -> Vec<Event> {
    let Value::Array(items) = body else { return Vec::new() };
    items
        .into_iter()
        .filter_map(from_object::<Event>)
        .collect()
}

/// Decodes a struct only from a JSON object. serde would otherwise fill struct fields
/// positionally from an array, turning `["PushEvent", ...]` into a push event.
pub fn from_object<T: DeserializeOwned>(raw: Value) -> Option<T> {
    if !raw.is_object() {
        return None;
    }
    serde_json::from_value(raw).ok()
}

fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(d)?;
    Ok(serde_json::from_value(raw).ok())
}

fn lenient_object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(d)?;
    Ok(from_object(raw))
}
