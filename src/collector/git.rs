//! Git branch, working-tree status and upstream sync, fetched together.
//!
//! The three facts come from separate `git` invocations. On a cache miss
//! they run concurrently and are published as one [`GitSnapshot`]; callers
//! never see a mix of old and new values.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::cache::Clock;
use crate::error::CollectError;

/// Branch value for a repository without an identifiable branch.
pub const EMPTY_BRANCH: &str = "(empty)";

/// Upper bound on a single git subprocess.
const GIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared snapshot lifetime.
pub const GIT_TTL: Duration = Duration::from_secs(5);

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// Runs one `git` command. `None` covers spawn failure, non-zero exit and
/// timeout alike.
pub trait GitRunner: Send + Sync {
    fn run<'a>(&'a self, cwd: &'a Path, args: &'a [&'a str]) -> RunFuture<'a>;

    /// Whether a git binary exists at all.
    fn available(&self) -> bool {
        true
    }
}

/// The system `git`, located through `$PATH`.
pub struct GitCli {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl GitCli {
    pub fn discover() -> Self {
        Self {
            binary: which::which("git").ok(),
            timeout: GIT_TIMEOUT,
        }
    }
}

impl GitRunner for GitCli {
    fn available(&self) -> bool {
        self.binary.is_some()
    }

    fn run<'a>(&'a self, cwd: &'a Path, args: &'a [&'a str]) -> RunFuture<'a> {
        Box::pin(async move {
            let binary = self.binary.as_ref()?;
            let mut cmd = tokio::process::Command::new(binary);
            cmd.args(args)
                .current_dir(cwd)
                .env("GIT_OPTIONAL_LOCKS", "0")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            let child = match cmd.spawn() {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("git {} failed to spawn: {}", args.join(" "), e);
                    return None;
                }
            };

            let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    tracing::debug!("git {} failed: {}", args.join(" "), e);
                    return None;
                }
                Err(_) => {
                    // The child is killed on drop.
                    tracing::debug!("git {} timed out after {:?}", args.join(" "), self.timeout);
                    return None;
                }
            };

            if !output.status.success() {
                return None;
            }
            Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        })
    }
}

/// Working-tree change counts. Each porcelain entry is counted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub added: u32,
    pub modified: u32,
    pub deleted: u32,
}

impl GitStatus {
    pub fn total(&self) -> u32 {
        self.added + self.modified + self.deleted
    }

    #[cfg(test)]
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// `+<changed> ~<modified> -<deleted>`, zero parts omitted.
impl fmt::Display for GitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if self.total() > 0 {
            parts.push(format!("+{}", self.total()));
        }
        if self.modified > 0 {
            parts.push(format!("~{}", self.modified));
        }
        if self.deleted > 0 {
            parts.push(format!("-{}", self.deleted));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Commits ahead/behind the configured upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSync {
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
}

impl fmt::Display for RemoteSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.upstream.is_none() {
            return Ok(());
        }
        match (self.ahead, self.behind) {
            (0, 0) => Ok(()),
            (a, 0) => write!(f, "ahead {}", a),
            (0, b) => write!(f, "behind {}", b),
            (a, b) => write!(f, "ahead {} / behind {}", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSnapshot {
    pub cwd: PathBuf,
    pub branch: String,
    pub status: GitStatus,
    pub remote: RemoteSync,
    pub fetched_at: Instant,
}

/// Owner of the shared git snapshot and the runtime its fetches run on.
pub struct GitService {
    runner: Arc<dyn GitRunner>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    runtime: tokio::runtime::Runtime,
    snapshot: RwLock<Option<Arc<GitSnapshot>>>,
    flight: Mutex<()>,
}

impl GitService {
    pub fn new(
        runner: Arc<dyn GitRunner>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runner,
            ttl,
            clock,
            runtime,
            snapshot: RwLock::new(None),
            flight: Mutex::new(()),
        })
    }

    pub fn system(clock: Arc<dyn Clock>) -> std::io::Result<Self> {
        Self::new(Arc::new(GitCli::discover()), GIT_TTL, clock)
    }

    /// Current snapshot for `cwd`, fetching it if stale. Concurrent misses
    /// share one fetch.
    pub fn snapshot(&self, cwd: &str) -> Result<Arc<GitSnapshot>, CollectError> {
        if cwd.is_empty() {
            return Ok(Arc::new(GitSnapshot {
                cwd: PathBuf::new(),
                branch: String::new(),
                status: GitStatus::default(),
                remote: RemoteSync::default(),
                fetched_at: self.clock.now(),
            }));
        }
        if !self.runner.available() {
            return Err(CollectError::ToolMissing("git"));
        }

        let cwd = Path::new(cwd);
        if let Some(s) = self.fresh(cwd) {
            return Ok(s);
        }

        let _flight = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(s) = self.fresh(cwd) {
            return Ok(s);
        }

        let runner = self.runner.as_ref();
        let (branch, status, remote) = self.runtime.block_on(async {
            tokio::join!(
                resolve_branch(runner, cwd),
                read_status(runner, cwd),
                read_remote(runner, cwd),
            )
        });
        let snapshot = Arc::new(GitSnapshot {
            cwd: cwd.to_path_buf(),
            branch,
            status,
            remote,
            fetched_at: self.clock.now(),
        });
        tracing::trace!("git snapshot for {}: {:?}", cwd.display(), snapshot);

        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn fresh(&self, cwd: &Path) -> Option<Arc<GitSnapshot>> {
        let slot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|s| s.cwd == cwd && self.clock.now() < s.fetched_at + self.ttl)
            .cloned()
    }
}

/// Branch name, in order of preference:
/// named branch, detached commit, remote default of a commit-less clone,
/// [`EMPTY_BRANCH`] inside a repository, and `""` outside one.
async fn resolve_branch(runner: &dyn GitRunner, cwd: &Path) -> String {
    if let Some(full) = runner
        .run(cwd, &["rev-parse", "--symbolic-full-name", "HEAD"])
        .await
    {
        if let Some(name) = full.strip_prefix("refs/heads/").filter(|n| !n.is_empty()) {
            return name.to_string();
        }
    }

    if let Some(short) = runner.run(cwd, &["rev-parse", "--short", "HEAD"]).await {
        if !short.is_empty() && short != "HEAD" {
            return short;
        }
    }

    if runner.run(cwd, &["rev-parse", "--git-dir"]).await.is_none() {
        return String::new();
    }

    if let Some(remote_head) = runner
        .run(cwd, &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
        .await
    {
        if let Some((_, name)) = remote_head.split_once('/').filter(|(_, n)| !n.is_empty()) {
            return name.to_string();
        }
    }

    EMPTY_BRANCH.to_string()
}

async fn read_status(runner: &dyn GitRunner, cwd: &Path) -> GitStatus {
    runner
        .run(cwd, &["status", "--porcelain", "--untracked-files=normal"])
        .await
        .map(|out| parse_status(&out))
        .unwrap_or_default()
}

async fn read_remote(runner: &dyn GitRunner, cwd: &Path) -> RemoteSync {
    let Some(upstream) = runner
        .run(cwd, &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
        .await
        .filter(|u| !u.is_empty())
    else {
        return RemoteSync::default();
    };

    let (ahead, behind) = runner
        .run(cwd, &["rev-list", "--left-right", "--count", "HEAD...@{u}"])
        .await
        .and_then(|out| parse_left_right(&out))
        .unwrap_or((0, 0));

    RemoteSync {
        upstream: Some(upstream),
        ahead,
        behind,
    }
}

/// Count `git status --porcelain` entries.
///
/// `??` is added. A staged `A`/`M`/`D` in the first column decides the
/// entry; only when the first column is blank does the second column's
/// `M`/`D` count.
pub fn parse_status(porcelain: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in porcelain.lines() {
        let mut codes = line.chars();
        let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
            continue;
        };
        match (x, y) {
            ('?', '?') => status.added += 1,
            ('A', _) => status.added += 1,
            ('M', _) => status.modified += 1,
            ('D', _) => status.deleted += 1,
            (' ', 'M') => status.modified += 1,
            (' ', 'D') => status.deleted += 1,
            _ => {}
        }
    }
    status
}

/// Parse `rev-list --left-right --count` output: `<ahead>\t<behind>`.
pub fn parse_left_right(out: &str) -> Option<(u32, u32)> {
    let mut parts = out.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}
