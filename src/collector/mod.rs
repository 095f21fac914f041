//! Content collectors: one producer per displayable unit of data.
//!
//! A [`Collector`] pairs a [`ContentType`] with a cache TTL, an optionality
//! flag and a function over [`Sources`]. The [`cache::Manager`] owns the
//! cached values; the git and quota services own the shared snapshots
//! several collectors read from.

pub mod builtin;
pub mod cache;
pub mod git;
pub mod quota;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BarStyle, StatuslineConfig};
use crate::error::{CollectError, ConfigError};
use crate::input::Input;
use crate::transcript::Summary;

use cache::Clock;
use git::GitService;
use quota::QuotaClient;

/// Identifier of one independently cached unit of display data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    Folder,
    Model,
    TokenBar,
    TokenUsage,
    TokenPercent,
    GitBranch,
    GitStatus,
    GitRemote,
    MemoryFiles,
    Todo,
    Agents,
    SessionDuration,
    Cost,
    Version,
    OutputStyle,
    Clock,
    Quota,
    QuotaReset,
}

impl ContentType {
    pub const ALL: [ContentType; 18] = [
        ContentType::Folder,
        ContentType::Model,
        ContentType::TokenBar,
        ContentType::TokenUsage,
        ContentType::TokenPercent,
        ContentType::GitBranch,
        ContentType::GitStatus,
        ContentType::GitRemote,
        ContentType::MemoryFiles,
        ContentType::Todo,
        ContentType::Agents,
        ContentType::SessionDuration,
        ContentType::Cost,
        ContentType::Version,
        ContentType::OutputStyle,
        ContentType::Clock,
        ContentType::Quota,
        ContentType::QuotaReset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Folder => "folder",
            ContentType::Model => "model",
            ContentType::TokenBar => "token-bar",
            ContentType::TokenUsage => "token-usage",
            ContentType::TokenPercent => "token-percent",
            ContentType::GitBranch => "git-branch",
            ContentType::GitStatus => "git-status",
            ContentType::GitRemote => "git-remote",
            ContentType::MemoryFiles => "memory-files",
            ContentType::Todo => "todo",
            ContentType::Agents => "agents",
            ContentType::SessionDuration => "session-duration",
            ContentType::Cost => "cost",
            ContentType::Version => "version",
            ContentType::OutputStyle => "output-style",
            ContentType::Clock => "clock",
            ContentType::Quota => "quota",
            ContentType::QuotaReset => "quota-reset",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ContentType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownContentType(s.to_string()))
    }
}

/// Flattened `content type -> value` map produced by one collection sweep.
pub type ContentMap = BTreeMap<ContentType, String>;

/// Display knobs collectors need from the config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bar_style: BarStyle,
    pub bar_width: usize,
    pub time_format: String,
}

impl Settings {
    pub fn from_config(config: &StatuslineConfig) -> Self {
        Self {
            bar_style: config.bar_style,
            bar_width: config.bar_width,
            time_format: config.time_format.clone(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&StatuslineConfig::default())
    }
}

/// Long-lived services shared by collectors, owned by the manager.
pub struct Services {
    pub settings: Settings,
    pub git: GitService,
    pub quota: QuotaClient,
}

impl Services {
    /// Services backed by the real `git` binary and the quota API.
    pub fn system(config: &StatuslineConfig, clock: Arc<dyn Clock>) -> std::io::Result<Self> {
        Ok(Self {
            settings: Settings::from_config(config),
            git: GitService::system(clock.clone())?,
            quota: QuotaClient::system(clock),
        })
    }
}

/// Everything a collector may read during one render.
pub struct Sources<'a> {
    pub input: &'a Input,
    pub summary: &'a Summary,
    pub settings: &'a Settings,
    pub git: &'a GitService,
    pub quota: &'a QuotaClient,
}

pub type CollectFn = Box<dyn Fn(&Sources<'_>) -> Result<String, CollectError> + Send + Sync>;

pub struct Collector {
    content_type: ContentType,
    ttl: Duration,
    optional: bool,
    collect: CollectFn,
}

impl Collector {
    pub fn new<F>(content_type: ContentType, ttl: Duration, optional: bool, collect: F) -> Self
    where
        F: Fn(&Sources<'_>) -> Result<String, CollectError> + Send + Sync + 'static,
    {
        Self {
            content_type,
            ttl,
            optional,
            collect: Box::new(collect),
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Optional content may disappear from the display; mandatory content
    /// substitutes a default instead.
    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn collect(&self, sources: &Sources<'_>) -> Result<String, CollectError> {
        (self.collect)(sources)
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("content_type", &self.content_type)
            .field("ttl", &self.ttl)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Show/hide allow-list resolved from config names.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    show: Vec<ContentType>,
    hide: Vec<ContentType>,
}

impl Visibility {
    /// Unknown names are warned about and ignored.
    pub fn from_config(show: &[String], hide: &[String]) -> Self {
        Self {
            show: parse_types(show),
            hide: parse_types(hide),
        }
    }

    pub fn allows(&self, ty: ContentType) -> bool {
        (self.show.is_empty() || self.show.contains(&ty)) && !self.hide.contains(&ty)
    }
}

/// Parse content type names, warning about and dropping unknown ones.
pub fn parse_types(names: &[String]) -> Vec<ContentType> {
    names
        .iter()
        .filter_map(|n| match n.parse::<ContentType>() {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use cache::SystemClock;
    use git::GitRunner;

    /// Services with a scripted git runner and no quota credentials.
    pub fn services(git: Arc<dyn GitRunner>) -> Services {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Services {
            settings: Settings::default(),
            git: GitService::new(git, Duration::from_secs(5), clock.clone())
                .expect("runtime builds"),
            quota: QuotaClient::disabled(clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trips_names() {
        for ty in ContentType::ALL {
            assert_eq!(ty.as_str().parse::<ContentType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        assert!(matches!(
            "git_branch".parse::<ContentType>(),
            Err(ConfigError::UnknownContentType(_))
        ));
    }

    #[test]
    fn test_visibility_show_and_hide() {
        let vis = Visibility::from_config(
            &["folder".into(), "model".into(), "bogus".into()],
            &["model".into()],
        );
        assert!(vis.allows(ContentType::Folder));
        assert!(!vis.allows(ContentType::Model));
        assert!(!vis.allows(ContentType::GitBranch));

        let all = Visibility::from_config(&[], &["clock".into()]);
        assert!(all.allows(ContentType::GitBranch));
        assert!(!all.allows(ContentType::Clock));
    }
}
