//! Reduces an events page to the latest push.
//!
//! Precondition: the feed lists events newest first and a push lists its commits oldest
//! first. The first push event is therefore the most recent one, and the last commit in it
//! is the head of that push. [`ordering_violation`] checks the first half of that contract.

use chrono::{DateTime, FixedOffset};

use crate::activity::types::ActivitySummary;
use crate::github::types::{from_object, Event, PushCommit};

const GITHUB_WEB: &str = "https://github.com";

pub fn latest_push(events: &[Event]) -> Option<&Event> {
    events.iter().find(|ev| ev.is_push())
}

pub fn latest_commit(event: &Event) -> PushCommit {
    event
        .commits()
        .last()
        .and_then(|c| from_object(c.clone()))
        .unwrap_or_default()
}

/// Last path segment of a ref: `refs/heads/feature-x` -> `feature-x`.
pub fn branch_name(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

pub fn commit_link(repo: Option<&str>, sha: Option<&str>) -> Option<String> {
    let repo = repo.filter(|r| !r.is_empty())?;
    match sha.filter(|s| !s.is_empty()) {
        Some(sha) => Some(format!("{GITHUB_WEB}/{repo}/commit/{sha}")),
        None => Some(format!("{GITHUB_WEB}/{repo}")),
    }
}

pub fn summarize(event: &Event) -> ActivitySummary {
    let commit = latest_commit(event);
    let repository = event.repo_name().map(str::to_string);
    ActivitySummary {
        link: commit_link(repository.as_deref(), commit.sha.as_deref()),
        repository,
        message: commit.message,
        branch: event.git_ref().map(|r| branch_name(r).to_string()),
        occurred_at: event.created_at.clone(),
    }
}

/// True when a push further down the page is newer than the first one, meaning the feed
/// was not newest-first. Timestamps that are not RFC 3339 are left out of the comparison.
pub fn ordering_violation(events: &[Event]) -> bool {
    let mut pushes = events.iter().filter(|ev| ev.is_push());
    let Some(first) = pushes.next().and_then(created_at) else { return false };
    pushes.filter_map(created_at).any(|later| later > first)
}

fn created_at(ev: &Event) -> Option<DateTime<FixedOffset>> {
    ev.created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
}
