//! Background release check. The job is started before collection and read
//! once after rendering; a result that arrives later is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use serde::Deserialize;

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Handle to an in-flight update check.
pub struct UpdateJob {
    notice: Arc<RwLock<Option<String>>>,
    cancelled: Arc<AtomicBool>,
}

impl UpdateJob {
    /// Check `url` for a newer release than `current`. Without a URL the job
    /// never produces a notice.
    pub fn spawn(url: Option<String>, current: &str) -> Self {
        let current = current.to_string();
        match url {
            Some(url) => Self::spawn_with(move || {
                let latest = check_latest(&url)?;
                newer_version(&current, &latest).map(|v| notice(&v, &current))
            }),
            None => Self::idle(),
        }
    }

    /// Run `check` on a background thread.
    pub fn spawn_with<F>(check: F) -> Self
    where
        F: FnOnce() -> Option<String> + Send + 'static,
    {
        let job = Self::idle();
        let notice = job.notice.clone();
        let cancelled = job.cancelled.clone();
        let spawned = thread::Builder::new()
            .name("update-check".into())
            .spawn(move || {
                let result = check();
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                *notice.write().unwrap_or_else(PoisonError::into_inner) = result;
            });
        if let Err(e) = spawned {
            tracing::debug!("update check not started: {}", e);
        }
        job
    }

    fn idle() -> Self {
        Self {
            notice: Arc::new(RwLock::new(None)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop accepting results and return whatever has arrived.
    pub fn finish(self) -> Option<String> {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notice
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn notice(latest: &str, current: &str) -> String {
    format!("ccline {} available (current {})", latest, current)
}

/// Latest release tag from a `{"tag_name": "..."}` document.
fn check_latest(url: &str) -> Option<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(CHECK_TIMEOUT)
        .user_agent(concat!("ccline/", env!("CARGO_PKG_VERSION")))
        .build()
        .ok()?;
    let response = client.get(url).send().ok()?;
    if !response.status().is_success() {
        tracing::debug!("update check returned {}", response.status());
        return None;
    }
    let release: Release = response.json().ok()?;
    Some(release.tag_name)
}

/// The normalized `latest` version when it is strictly newer than `current`.
pub fn newer_version(current: &str, latest: &str) -> Option<String> {
    let current = semver::Version::parse(current.trim().trim_start_matches('v')).ok()?;
    let latest = semver::Version::parse(latest.trim().trim_start_matches('v')).ok()?;
    (latest > current).then(|| latest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_newer_version() {
        assert_eq!(newer_version("0.1.0", "v0.2.0").as_deref(), Some("0.2.0"));
        assert_eq!(newer_version("0.2.0", "v0.2.0"), None);
        assert_eq!(newer_version("1.0.0", "0.9.9"), None);
        assert_eq!(newer_version("1.0.0", "nightly"), None);
    }

    #[test]
    fn test_job_without_url_is_silent() {
        assert_eq!(UpdateJob::spawn(None, "0.1.0").finish(), None);
    }

    #[test]
    fn test_finished_job_returns_result() {
        let (tx, rx) = mpsc::channel();
        let job = UpdateJob::spawn_with(move || {
            let n = Some(notice("0.2.0", "0.1.0"));
            tx.send(()).unwrap();
            n
        });
        rx.recv().unwrap();
        // The write happens right after the send.
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(
            job.finish().as_deref(),
            Some("ccline 0.2.0 available (current 0.1.0)")
        );
    }

    #[test]
    fn test_late_result_is_dropped() {
        let (tx, rx) = mpsc::channel::<()>();
        let job = UpdateJob::spawn_with(move || {
            let _ = rx.recv_timeout(Duration::from_secs(5));
            Some("late".to_string())
        });
        assert_eq!(job.finish(), None);
        tx.send(()).unwrap();
    }
}
