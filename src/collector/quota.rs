//! Subscription quota lookup against the OAuth usage endpoint.
//!
//! Failed lookups are remembered for the TTL like successful ones, so an
//! unreachable API costs one timeout per window rather than one per render.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::cache::Clock;
use crate::error::CollectError;

pub const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";
const OAUTH_BETA: &str = "oauth-2025-04-20";
const QUOTA_TIMEOUT: Duration = Duration::from_secs(3);
pub const QUOTA_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct QuotaUsage {
    /// Percentage of the five-hour window used, 0–100.
    pub utilization: f64,
    pub resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuotaState {
    Available(QuotaUsage),
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    five_hour: Option<UsageWindow>,
}

#[derive(Debug, Deserialize)]
struct UsageWindow {
    utilization: Option<f64>,
    resets_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(rename = "claudeAiOauth")]
    oauth: Option<OauthToken>,
}

#[derive(Debug, Deserialize)]
struct OauthToken {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Fetches quota for an access token.
pub type FetchFn = Box<dyn Fn(&str) -> QuotaState + Send + Sync>;

pub struct QuotaClient {
    credentials: Option<PathBuf>,
    fetch: FetchFn,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<(QuotaState, Instant)>>,
    flight: Mutex<()>,
}

impl QuotaClient {
    pub fn new(credentials: Option<PathBuf>, fetch: FetchFn, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            fetch,
            ttl,
            clock,
            slot: RwLock::new(None),
            flight: Mutex::new(()),
        }
    }

    /// `~/.claude/.credentials.json` against [`USAGE_URL`].
    pub fn system(clock: Arc<dyn Clock>) -> Self {
        let credentials = dirs::home_dir().map(|h| h.join(".claude").join(".credentials.json"));
        Self::new(
            credentials,
            Box::new(|token| fetch_usage(USAGE_URL, token)),
            QUOTA_TTL,
            clock,
        )
    }

    /// A client without credentials; every lookup reports them missing.
    #[cfg(test)]
    pub fn disabled(clock: Arc<dyn Clock>) -> Self {
        Self::new(None, Box::new(|_| QuotaState::Unavailable), QUOTA_TTL, clock)
    }

    /// Cached state within TTL, otherwise one fetch shared by concurrent
    /// callers. Missing credentials are an error and are not cached.
    pub fn state(&self) -> Result<QuotaState, CollectError> {
        let token = self
            .credentials
            .as_deref()
            .and_then(read_token)
            .ok_or(CollectError::Missing("credentials"))?;

        if let Some(state) = self.fresh() {
            return Ok(state);
        }
        let _flight = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = self.fresh() {
            return Ok(state);
        }

        let state = (self.fetch)(&token);
        if state == QuotaState::Unavailable {
            tracing::debug!("quota unavailable, retrying in {:?}", self.ttl);
        }
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) =
            Some((state.clone(), self.clock.now() + self.ttl));
        Ok(state)
    }

    fn fresh(&self) -> Option<QuotaState> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|(_, expires_at)| self.clock.now() < *expires_at)
            .map(|(state, _)| state.clone())
    }
}

/// Read the OAuth access token from a credentials file.
fn read_token(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    parse_token(&contents)
}

fn parse_token(contents: &str) -> Option<String> {
    let creds: Credentials = serde_json::from_str(contents).ok()?;
    creds
        .oauth?
        .access_token
        .filter(|t| !t.trim().is_empty())
}

/// GET the usage document. Timeouts, non-200 responses and undecodable
/// bodies all map to [`QuotaState::Unavailable`].
fn fetch_usage(url: &str, token: &str) -> QuotaState {
    let client = match reqwest::blocking::Client::builder()
        .timeout(QUOTA_TIMEOUT)
        .user_agent(concat!("ccline/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("quota client: {}", e);
            return QuotaState::Unavailable;
        }
    };

    let response = match client
        .get(url)
        .bearer_auth(token)
        .header("anthropic-beta", OAUTH_BETA)
        .send()
    {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("quota request failed: {}", e);
            return QuotaState::Unavailable;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("quota request returned {}", response.status());
        return QuotaState::Unavailable;
    }

    match response.text() {
        Ok(body) => parse_usage(&body),
        Err(e) => {
            tracing::debug!("quota body unreadable: {}", e);
            QuotaState::Unavailable
        }
    }
}

fn parse_usage(body: &str) -> QuotaState {
    let Ok(resp) = serde_json::from_str::<UsageResponse>(body) else {
        return QuotaState::Unavailable;
    };
    let Some(window) = resp.five_hour else {
        return QuotaState::Unavailable;
    };
    let Some(utilization) = window.utilization else {
        return QuotaState::Unavailable;
    };
    let resets_at = window
        .resets_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    QuotaState::Available(QuotaUsage {
        utilization,
        resets_at,
    })
}
