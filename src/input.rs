//! Session payload piped on stdin for every status line tick.
//!
//! Every field is optional; the host may omit any of them.

use std::io::Read;

use serde::{Deserialize, Deserializer};

use crate::error::InputError;

/// Upper bound on the stdin payload.
const MAX_INPUT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Input {
    #[serde(deserialize_with = "null_as_default")]
    pub transcript_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cwd: String,
    #[serde(deserialize_with = "null_as_default")]
    pub model: ModelInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub workspace: Workspace,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub output_style: OutputStyle,
    pub cost: Option<CostInfo>,
    #[serde(deserialize_with = "null_as_default")]
    pub context_window: ContextWindow,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ModelInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Workspace {
    #[serde(deserialize_with = "null_as_default")]
    pub current_dir: String,
    #[serde(deserialize_with = "null_as_default")]
    pub project_dir: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OutputStyle {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CostInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub total_cost_usd: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_duration_ms: u64,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ContextWindow {
    #[serde(deserialize_with = "null_as_default")]
    pub total_input_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_output_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub context_window_size: u64,
    pub current_usage: Option<CurrentUsage>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CurrentUsage {
    #[serde(deserialize_with = "null_as_default")]
    pub input_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub output_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub cache_read_input_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub cache_creation_input_tokens: u64,
}

/// `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Input {
    /// Working directory for project-relative lookups. `workspace.current_dir`
    /// wins over the top-level `cwd`.
    pub fn working_dir(&self) -> &str {
        if self.workspace.current_dir.is_empty() {
            &self.cwd
        } else {
            &self.workspace.current_dir
        }
    }

    /// Project root, falling back to the working directory.
    pub fn project_dir(&self) -> &str {
        if self.workspace.project_dir.is_empty() {
            self.working_dir()
        } else {
            &self.workspace.project_dir
        }
    }
}

impl ContextWindow {
    /// Tokens currently occupying the context window.
    pub fn used_tokens(&self) -> u64 {
        match &self.current_usage {
            Some(u) => u
                .input_tokens
                .saturating_add(u.output_tokens)
                .saturating_add(u.cache_read_input_tokens)
                .saturating_add(u.cache_creation_input_tokens),
            None => self
                .total_input_tokens
                .saturating_add(self.total_output_tokens),
        }
    }
}

/// Read stdin and decode it. `Ok(None)` means the payload was empty.
pub fn read_stdin() -> Result<Option<Input>, InputError> {
    let mut buf = Vec::with_capacity(8192);
    std::io::stdin()
        .lock()
        .take(MAX_INPUT_BYTES)
        .read_to_end(&mut buf)?;
    decode(&buf)
}

/// Strip NUL bytes and decode. Whitespace-only payloads count as empty.
pub fn decode(raw: &[u8]) -> Result<Option<Input>, InputError> {
    let cleaned: Vec<u8> = raw.iter().copied().filter(|b| *b != 0).collect();
    if cleaned.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&cleaned)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let json = br#"{
            "cwd": "/work/app",
            "model": {"id": "claude-opus-4-5", "display_name": "Opus 4.5"},
            "context_window": {
                "context_window_size": 200000,
                "current_usage": {"input_tokens": 50000, "output_tokens": 5000, "cache_read_input_tokens": 0}
            }
        }"#;
        let input = decode(json).unwrap().unwrap();
        assert_eq!(input.model.display_name, "Opus 4.5");
        assert_eq!(input.context_window.context_window_size, 200000);
        assert_eq!(input.context_window.used_tokens(), 55000);
    }

    #[test]
    fn test_decode_strips_nul_bytes() {
        let mut raw = vec![0u8, 0u8];
        raw.extend_from_slice(br#"{"cwd":"/tmp"}"#);
        raw.push(0);
        let input = decode(&raw).unwrap().unwrap();
        assert_eq!(input.cwd, "/tmp");
    }

    #[test]
    fn test_decode_empty_after_stripping() {
        assert!(decode(b"").unwrap().is_none());
        assert!(decode(&[0, 0, 0]).unwrap().is_none());
        assert!(decode(b" \n\0").unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_is_error() {
        assert!(matches!(decode(b"not json"), Err(InputError::Json(_))));
    }

    #[test]
    fn test_used_tokens_falls_back_to_totals() {
        let window = ContextWindow {
            total_input_tokens: 1200,
            total_output_tokens: 300,
            ..Default::default()
        };
        assert_eq!(window.used_tokens(), 1500);
    }

    #[test]
    fn test_used_tokens_saturates() {
        let window = ContextWindow {
            total_input_tokens: u64::MAX,
            total_output_tokens: 1,
            current_usage: Some(CurrentUsage {
                input_tokens: u64::MAX - 1,
                output_tokens: 1,
                cache_read_input_tokens: 1,
                cache_creation_input_tokens: 1,
            }),
            ..Default::default()
        };
        assert_eq!(window.used_tokens(), u64::MAX);
        let totals = ContextWindow {
            current_usage: None,
            ..window
        };
        assert_eq!(totals.used_tokens(), u64::MAX);
    }

    #[test]
    fn test_decode_null_fields_as_defaults() {
        let json = br#"{
            "cwd": null,
            "model": {"id": null, "display_name": null},
            "workspace": null,
            "cost": null,
            "context_window": {"context_window_size": null, "current_usage": {"input_tokens": null, "output_tokens": 7}}
        }"#;
        let input = decode(json).unwrap().unwrap();
        assert_eq!(input.cwd, "");
        assert_eq!(input.model.id, "");
        assert_eq!(input.model.display_name, "");
        assert!(input.cost.is_none());
        assert_eq!(input.context_window.context_window_size, 0);
        assert_eq!(input.context_window.used_tokens(), 7);
    }

    #[test]
    fn test_working_dir_prefers_workspace() {
        let input = Input {
            cwd: "/a".into(),
            workspace: Workspace {
                current_dir: "/b".into(),
                project_dir: String::new(),
            },
            ..Default::default()
        };
        assert_eq!(input.working_dir(), "/b");
        assert_eq!(input.project_dir(), "/b");
    }
}
