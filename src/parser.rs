use crate::models::{ContentBlock, MessageRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Locates session JSONL files under a Claude directory.
pub struct SessionParser {
    claude_dir: PathBuf,
}

impl SessionParser {
    pub fn new(claude_dir: PathBuf) -> Self {
        Self { claude_dir }
    }

    /// Find the `count` most recently modified session files.
    pub fn find_recent_sessions(&self, count: usize) -> Result<Vec<PathBuf>> {
        let projects_dir = self.claude_dir.join("projects");

        if !projects_dir.exists() {
            anyhow::bail!(
                "Claude projects directory not found at {}",
                projects_dir.display()
            );
        }

        let mut files: Vec<(SystemTime, PathBuf)> = WalkDir::new(projects_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
            })
            .map(|entry| {
                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, entry.path().to_path_buf())
            })
            .collect();

        if files.is_empty() {
            anyhow::bail!(
                "No .jsonl session files found in {}",
                self.claude_dir.display()
            );
        }

        files.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(files.into_iter().take(count).map(|(_, path)| path).collect())
    }
}

/// Read one session file into normalized records.
///
/// The file content is decoded lossily so a few bad bytes from an aborted
/// session don't take the whole file down. Unparseable lines are skipped;
/// only failing to read the file itself is an error.
pub fn parse_session_file(path: &Path) -> Result<Vec<MessageRecord>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    Ok(content.lines().filter_map(parse_record_line).collect())
}

/// Parse one log line into a record, or `None` when the line is blank,
/// not valid JSON, or has no message object.
pub fn parse_record_line(line: &str) -> Option<MessageRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let entry: Value = serde_json::from_str(line).ok()?;
    let message = entry.get("message")?.as_object()?;

    let role = message
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let model = message
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let timestamp = entry
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let usage = message.get("usage");
    let input_tokens = usage_field(usage, "input_tokens");
    let output_tokens = usage_field(usage, "output_tokens");
    let cache_creation_tokens = usage_field(usage, "cache_creation_input_tokens");
    let cache_read_tokens = usage_field(usage, "cache_read_input_tokens");

    let blocks = parse_content_blocks(message.get("content"));
    let tool_use_count = blocks
        .iter()
        .filter(|b| matches!(b, ContentBlock::ToolUse))
        .count() as u64;
    let has_tool_result = blocks.iter().any(|b| matches!(b, ContentBlock::ToolResult));
    let has_user_text = blocks
        .iter()
        .any(|b| matches!(b, ContentBlock::Text(text) if !text.trim().is_empty()));

    let is_tool_result_only = role == "user" && has_tool_result && !has_user_text;

    Some(MessageRecord {
        role,
        model,
        timestamp,
        input_tokens,
        output_tokens,
        cache_creation_tokens,
        cache_read_tokens,
        tool_use_count,
        is_tool_result_only,
    })
}

fn usage_field(usage: Option<&Value>, field: &str) -> u64 {
    usage
        .and_then(|u| u.get(field))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// ISO-8601 with a Z suffix (or explicit offset); anything else is absent.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_content_blocks(content: Option<&Value>) -> Vec<ContentBlock> {
    match content {
        // Old format: content is a plain string
        Some(Value::String(text)) => vec![ContentBlock::Text(text.clone())],
        Some(Value::Array(items)) => items.iter().map(parse_content_block).collect(),
        _ => Vec::new(),
    }
}

fn parse_content_block(item: &Value) -> ContentBlock {
    match item.get("type").and_then(Value::as_str) {
        Some("tool_use") => ContentBlock::ToolUse,
        Some("tool_result") => ContentBlock::ToolResult,
        Some("text") => ContentBlock::Text(
            item.get("text")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        ),
        _ => ContentBlock::Unknown,
    }
}
