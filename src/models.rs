use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Content block within a message.
///
/// Session logs carry message content either as an array of typed blocks or
/// as a bare string. Block kinds we don't recognize are kept as `Unknown` and
/// ignored by the classification rules.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolUse,
    ToolResult,
    Unknown,
}

/// One normalized message extracted from a session log line.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    /// Role as recorded in the log (user, assistant, or anything else)
    pub role: String,
    /// Model identifier, empty when the log line carries none
    pub model: String,
    /// Message timestamp; absent when missing or unparseable
    pub timestamp: Option<DateTime<Utc>>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    /// Number of tool_use content blocks in this message
    pub tool_use_count: u64,
    /// True for user messages that only replay tool output (no real user text)
    pub is_tool_result_only: bool,
}

/// A context drop between two consecutive assistant turns.
///
/// Recorded when a turn's effective input falls below half of the previous
/// turn's, which is how auto-compaction shows up in the per-turn series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactionEvent {
    /// 1-based turn index of the smaller (later) turn
    pub turn: usize,
    pub before: u64,
    pub after: u64,
    pub reduction_pct: f64,
}

/// Estimated dollar cost of a session, split by token category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub input: f64,
    pub output: f64,
    pub cache_creation: f64,
    pub cache_read: f64,
    pub total: f64,
}

/// Complete metrics for one session, computed once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    /// Path to the JSONL file this session was read from
    pub file_path: PathBuf,
    /// Project label inferred from the containing directory name
    pub project: String,
    /// First non-empty model seen on an assistant message, or "unknown"
    pub model: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,

    pub total_input: u64,
    pub total_output: u64,
    pub total_cache_creation: u64,
    pub total_cache_read: u64,
    /// Context actually processed across the session: input + cache creation + cache read
    pub effective_input: u64,
    /// Share of input-side tokens served from cache, 0-100
    pub cache_hit_rate: f64,

    /// Number of assistant messages, i.e. API calls
    pub turn_count: usize,
    /// Effective input per assistant turn, in log order
    pub per_turn_effective: Vec<u64>,
    pub avg_effective_per_turn: f64,
    pub avg_output_per_turn: f64,

    pub first_effective: u64,
    pub mid_effective: u64,
    pub last_effective: u64,
    pub peak_effective: u64,
    /// 1-based turn of the peak, 0 when there are no turns
    pub peak_turn: usize,
    /// Peak effective input relative to the first turn's
    pub context_growth: f64,
    pub compaction_events: Vec<CompactionEvent>,

    pub total_tool_uses: u64,
    pub tool_to_turn: f64,

    pub costs: CostBreakdown,

    pub total_messages: usize,
    /// User messages with actual user text (tool-result replays excluded)
    pub user_messages: usize,
    pub tool_result_messages: usize,
    pub assistant_messages: usize,
}

impl SessionMetrics {
    /// Wall-clock span of the session, when both time bounds are known.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
