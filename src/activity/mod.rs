use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tracing::Instrument;

use crate::config::ActivityConfig;
use crate::github::{ActivityError, EventSource, GithubClient};
use crate::github::types::events_from_value;
use crate::output::{config::OutputConfig, Emitter};
use crate::telemetry::{self};
use crate::telemetry::ops::activity::Phase as ActivityPhase;

pub mod select;
pub mod types;

use types::{ActivityEnvelope, ActivitySummary};

/// Finds the latest push for one account. Holds no per-request state, so a single instance
/// is shared by every request.
#[derive(Clone)]
pub struct ActivityFetcher {
    handle: Option<String>,
    source: Arc<dyn EventSource>,
}

impl ActivityFetcher {
    pub fn new(handle: Option<String>, source: Arc<dyn EventSource>) -> Self {
        Self { handle, source }
    }

    pub fn from_config(cfg: &ActivityConfig) -> Result<Self> {
        let client = GithubClient::new(cfg)?;
        Ok(Self::new(cfg.handle.clone(), Arc::new(client)))
    }

    /// `Ok(None)` covers every "nothing to show" case: no handle, an empty or
    /// non-array feed, no push event. Only a failed call is an error.
    pub async fn fetch_latest(&self) -> Result<Option<ActivitySummary>, ActivityError> {
        let log = telemetry::activity();
        let Some(handle) = self.handle.as_deref() else {
            log.debug("no handle configured; skipping fetch");
            return Ok(None);
        };

        let root = log.root_span_kv([("handle", handle.to_string())]);
        async {
            let body = self
                .source
                .public_events(handle)
                .instrument(log.span_kv(&ActivityPhase::Request, [("handle", handle.to_string())]))
                .await?;

            let events = {
                let _s = log.span(&ActivityPhase::Decode).entered();
                events_from_value(body)
            };
            log.debug(format!("decoded {} events", events.len()));

            let _s = log.span(&ActivityPhase::Select).entered();
            if select::ordering_violation(&events) {
                log.warn("events feed is not newest-first; using the first push event anyway");
            }
            let summary = select::latest_push(&events).map(select::summarize);
            log.summary(summary.as_ref());
            Ok::<_, ActivityError>(summary)
        }
        .instrument(root)
        .await
    }

    /// One request's worth of work: fetch once, fold any failure into the envelope.
    pub async fn envelope(&self) -> ActivityEnvelope {
        let outcome = self.fetch_latest().await;
        if let Err(err) = &outcome {
            telemetry::activity().warn_kv("activity fetch failed", [("error", err.to_string())]);
        }
        ActivityEnvelope::capture(outcome, Utc::now())
    }
}

/// live-activity fetch
#[derive(Args)]
pub struct FetchCmd {
    /// Account to query instead of GITHUB_USERNAME
    #[arg(long)]
    pub handle: Option<String>,
}

pub async fn run(mut cfg: ActivityConfig, args: FetchCmd) -> Result<()> {
    if let Some(handle) = args.handle {
        cfg.handle = Some(handle).filter(|h| !h.trim().is_empty());
    }
    let fetcher = ActivityFetcher::from_config(&cfg)?;
    let envelope = fetcher.envelope().await;

    let emitter = Emitter::from_env(OutputConfig::from_env(telemetry::config::json_mode()));
    emitter.emit(&envelope)?;
    Ok(())
}
