//! Summary of the session transcript (JSONL, one event per line).
//!
//! Only the facts the status line renders are extracted: the latest todo
//! list, agents still running, and the first/last event timestamps.

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Status of a single todo item, as written by the `TodoWrite` tool.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Todo {
    pub content: String,
    pub status: TodoStatus,
    #[serde(default, rename = "activeForm")]
    pub active_form: Option<String>,
}

/// A sub-agent launched by the assistant whose result has not arrived yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningAgent {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Default, Clone)]
pub struct Summary {
    pub todos: Vec<Todo>,
    pub running_agents: Vec<RunningAgent>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl Summary {
    /// Parse the transcript at `path`. Missing or unreadable files yield an
    /// empty summary.
    pub fn load(path: &str) -> Summary {
        if path.is_empty() {
            return Summary::default();
        }
        match std::fs::File::open(Path::new(path)) {
            Ok(file) => Summary::from_reader(BufReader::new(file)),
            Err(e) => {
                tracing::debug!("transcript {} not readable: {}", path, e);
                Summary::default()
            }
        }
    }

    /// Parse JSONL events. Lines that are not JSON objects are skipped, and
    /// invalid UTF-8 is replaced rather than ending the scan.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Summary {
        let mut summary = Summary::default();
        // Launch order is kept so the display is stable.
        let mut pending: Vec<RunningAgent> = Vec::new();
        let mut finished: HashSet<String> = HashSet::new();

        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("transcript read stopped: {}", e);
                    break;
                }
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(val) = serde_json::from_str::<serde_json::Value>(line) else {
                continue;
            };

            if let Some(ts) = val
                .get("timestamp")
                .and_then(|t| t.as_str())
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            {
                let ts = ts.with_timezone(&Utc);
                if summary.started_at.is_none() {
                    summary.started_at = Some(ts);
                }
                summary.last_activity = Some(ts);
            }

            let Some(blocks) = val
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_array())
            else {
                continue;
            };

            for block in blocks {
                match block.get("type").and_then(|t| t.as_str()) {
                    Some("tool_use") => {
                        let name = block.get("name").and_then(|n| n.as_str()).unwrap_or("");
                        let id = block.get("id").and_then(|i| i.as_str()).unwrap_or("");
                        let input = block.get("input");
                        match name {
                            "TodoWrite" => {
                                if let Some(todos) = input
                                    .and_then(|i| i.get("todos"))
                                    .and_then(|t| serde_json::from_value::<Vec<Todo>>(t.clone()).ok())
                                {
                                    summary.todos = todos;
                                }
                            }
                            "Task" | "Agent" if !id.is_empty() => {
                                let description = input
                                    .and_then(|i| {
                                        i.get("description").or_else(|| i.get("subagent_type"))
                                    })
                                    .and_then(|d| d.as_str())
                                    .unwrap_or("agent")
                                    .to_string();
                                pending.push(RunningAgent {
                                    id: id.to_string(),
                                    description,
                                });
                            }
                            _ => {}
                        }
                    }
                    Some("tool_result") => {
                        if let Some(id) = block.get("tool_use_id").and_then(|i| i.as_str()) {
                            finished.insert(id.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        summary.running_agents = pending
            .into_iter()
            .filter(|a| !finished.contains(&a.id))
            .collect();
        summary
    }

    pub fn completed_todos(&self) -> usize {
        self.todos
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count()
    }

    /// The todo currently being worked on, if any.
    pub fn active_todo(&self) -> Option<&Todo> {
        self.todos
            .iter()
            .find(|t| t.status == TodoStatus::InProgress)
    }

    /// Seconds between the first and last transcript events.
    pub fn elapsed_secs(&self) -> Option<u64> {
        let (start, end) = (self.started_at?, self.last_activity?);
        Some((end - start).num_seconds().max(0) as u64)
    }
}
