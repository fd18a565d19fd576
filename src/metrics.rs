use crate::models::{CompactionEvent, MessageRecord, SessionMetrics};
use crate::pricing;
use std::path::Path;

/// Fold a session's records into one immutable metrics value.
///
/// Token totals run over every record; the per-turn series and everything
/// derived from it (growth, peak, compaction, tool ratio) use assistant
/// records only, in the order they appear in the log.
pub fn aggregate_session(file_path: &Path, records: &[MessageRecord]) -> SessionMetrics {
    let project = file_path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let assistant: Vec<&MessageRecord> = records
        .iter()
        .filter(|r| r.role == "assistant")
        .collect();

    let started_at = records.iter().filter_map(|r| r.timestamp).min();
    let ended_at = records.iter().filter_map(|r| r.timestamp).max();

    let total_input: u64 = records.iter().map(|r| r.input_tokens).sum();
    let total_output: u64 = records.iter().map(|r| r.output_tokens).sum();
    let total_cache_creation: u64 = records.iter().map(|r| r.cache_creation_tokens).sum();
    let total_cache_read: u64 = records.iter().map(|r| r.cache_read_tokens).sum();
    let effective_input = total_input + total_cache_creation + total_cache_read;

    let cache_denominator = total_cache_read + total_cache_creation + total_input;
    let cache_hit_rate = if cache_denominator > 0 {
        total_cache_read as f64 / cache_denominator as f64 * 100.0
    } else {
        0.0
    };

    let per_turn_effective: Vec<u64> = assistant
        .iter()
        .map(|r| r.input_tokens + r.cache_creation_tokens + r.cache_read_tokens)
        .collect();
    let turn_count = assistant.len();

    let avg_effective_per_turn = if turn_count > 0 {
        effective_input as f64 / turn_count as f64
    } else {
        0.0
    };
    let assistant_output: u64 = assistant.iter().map(|r| r.output_tokens).sum();
    let avg_output_per_turn = if turn_count > 0 {
        assistant_output as f64 / turn_count as f64
    } else {
        0.0
    };

    let total_tool_uses: u64 = assistant.iter().map(|r| r.tool_use_count).sum();
    let tool_to_turn = if turn_count > 0 {
        total_tool_uses as f64 / turn_count as f64
    } else {
        0.0
    };

    let (first_effective, mid_effective, last_effective, peak_effective, peak_turn) =
        series_shape(&per_turn_effective);
    let context_growth = if first_effective > 0 {
        peak_effective as f64 / first_effective as f64
    } else {
        0.0
    };
    let compaction_events = detect_compactions(&per_turn_effective);

    let model = assistant
        .iter()
        .find(|r| !r.model.is_empty())
        .map(|r| r.model.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let tier = pricing::tier_for_model(&model);
    let costs = pricing::compute_costs(
        &tier,
        total_input,
        total_output,
        total_cache_creation,
        total_cache_read,
    );

    let user_messages = records
        .iter()
        .filter(|r| r.role == "user" && !r.is_tool_result_only)
        .count();
    let tool_result_messages = records
        .iter()
        .filter(|r| r.role == "user" && r.is_tool_result_only)
        .count();

    SessionMetrics {
        file_path: file_path.to_path_buf(),
        project,
        model,
        started_at,
        ended_at,
        total_input,
        total_output,
        total_cache_creation,
        total_cache_read,
        effective_input,
        cache_hit_rate,
        turn_count,
        per_turn_effective,
        avg_effective_per_turn,
        avg_output_per_turn,
        first_effective,
        mid_effective,
        last_effective,
        peak_effective,
        peak_turn,
        context_growth,
        compaction_events,
        total_tool_uses,
        tool_to_turn,
        costs,
        total_messages: records.len(),
        user_messages,
        tool_result_messages,
        assistant_messages: turn_count,
    }
}

/// First, middle, last, peak and 1-based peak turn of the series.
/// Peak ties resolve to the earliest turn.
fn series_shape(series: &[u64]) -> (u64, u64, u64, u64, usize) {
    if series.is_empty() {
        return (0, 0, 0, 0, 0);
    }

    let first = series[0];
    let mid = series[series.len() / 2];
    let last = series[series.len() - 1];

    let mut peak = first;
    let mut peak_turn = 1;
    for (i, &value) in series.iter().enumerate().skip(1) {
        if value > peak {
            peak = value;
            peak_turn = i + 1;
        }
    }

    (first, mid, last, peak, peak_turn)
}

/// Adjacent turns where context dropped below half the previous turn.
/// Exactly half does not qualify.
fn detect_compactions(series: &[u64]) -> Vec<CompactionEvent> {
    let mut events = Vec::new();
    for i in 1..series.len() {
        let before = series[i - 1];
        let after = series[i];
        if after * 2 < before {
            events.push(CompactionEvent {
                turn: i + 1,
                before,
                after,
                reduction_pct: (1.0 - after as f64 / before as f64) * 100.0,
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn assistant_turn(effective: u64, output: u64, tools: u64) -> MessageRecord {
        MessageRecord {
            role: "assistant".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            timestamp: None,
            input_tokens: effective,
            output_tokens: output,
            cache_creation_tokens: 0,
            cache_read_tokens: 0,
            tool_use_count: tools,
            is_tool_result_only: false,
        }
    }

    fn user_message() -> MessageRecord {
        MessageRecord {
            role: "user".to_string(),
            model: String::new(),
            timestamp: None,
            input_tokens: 0,
            output_tokens: 0,
            cache_creation_tokens: 0,
            cache_read_tokens: 0,
            tool_use_count: 0,
            is_tool_result_only: false,
        }
    }

    fn tool_result_message() -> MessageRecord {
        MessageRecord {
            is_tool_result_only: true,
            ..user_message()
        }
    }

    fn aggregate(records: &[MessageRecord]) -> SessionMetrics {
        aggregate_session(&PathBuf::from("/tmp/-home-user-demo/session.jsonl"), records)
    }

    #[test]
    fn test_effective_input_identity_and_cache_rate_bounds() {
        let mut record = assistant_turn(100, 10, 0);
        record.cache_creation_tokens = 300;
        record.cache_read_tokens = 600;
        let metrics = aggregate(&[record]);

        assert_eq!(metrics.effective_input, 100 + 300 + 600);
        assert_eq!(
            metrics.effective_input,
            metrics.total_input + metrics.total_cache_creation + metrics.total_cache_read
        );
        assert!((0.0..=100.0).contains(&metrics.cache_hit_rate));
        assert!((metrics.cache_hit_rate - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_cache_rate_zero_when_no_input_side_tokens() {
        let metrics = aggregate(&[assistant_turn(0, 500, 0)]);
        assert_eq!(metrics.cache_hit_rate, 0.0);
    }

    #[test]
    fn test_empty_session_yields_zeroed_metrics() {
        let metrics = aggregate(&[user_message()]);
        assert_eq!(metrics.turn_count, 0);
        assert!(metrics.per_turn_effective.is_empty());
        assert_eq!(metrics.first_effective, 0);
        assert_eq!(metrics.mid_effective, 0);
        assert_eq!(metrics.last_effective, 0);
        assert_eq!(metrics.peak_effective, 0);
        assert_eq!(metrics.peak_turn, 0);
        assert_eq!(metrics.context_growth, 0.0);
        assert_eq!(metrics.tool_to_turn, 0.0);
        assert_eq!(metrics.avg_output_per_turn, 0.0);
        assert!(metrics.compaction_events.is_empty());
        assert_eq!(metrics.model, "unknown");
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = vec![
            user_message(),
            assistant_turn(100, 20, 2),
            tool_result_message(),
            assistant_turn(400, 30, 1),
        ];
        let a = aggregate(&records);
        let b = aggregate(&records);
        assert_eq!(a, b);
    }

    #[test]
    fn test_turn_series_ignores_interleaved_user_records() {
        let spread = vec![
            user_message(),
            assistant_turn(100, 20, 2),
            tool_result_message(),
            tool_result_message(),
            assistant_turn(400, 30, 1),
            user_message(),
            assistant_turn(900, 10, 0),
        ];
        let packed = vec![
            assistant_turn(100, 20, 2),
            assistant_turn(400, 30, 1),
            assistant_turn(900, 10, 0),
            user_message(),
            user_message(),
            tool_result_message(),
            tool_result_message(),
        ];

        let a = aggregate(&spread);
        let b = aggregate(&packed);
        assert_eq!(a.turn_count, b.turn_count);
        assert_eq!(a.per_turn_effective, b.per_turn_effective);
        assert_eq!(a.peak_effective, b.peak_effective);
        assert_eq!(a.peak_turn, b.peak_turn);
        assert_eq!(a.context_growth, b.context_growth);
        assert_eq!(a.compaction_events, b.compaction_events);
        assert_eq!(a.tool_to_turn, b.tool_to_turn);
    }

    #[test]
    fn test_compaction_detected_below_half() {
        let metrics = aggregate(&[
            assistant_turn(100, 0, 0),
            assistant_turn(40, 0, 0),
            assistant_turn(200, 0, 0),
        ]);
        assert_eq!(metrics.compaction_events.len(), 1);
        let event = &metrics.compaction_events[0];
        assert_eq!(event.turn, 2);
        assert_eq!(event.before, 100);
        assert_eq!(event.after, 40);
        assert!((event.reduction_pct - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_exactly_half_is_not_compaction() {
        let metrics = aggregate(&[
            assistant_turn(100, 0, 0),
            assistant_turn(60, 0, 0),
            assistant_turn(200, 0, 0),
        ]);
        assert!(metrics.compaction_events.is_empty());

        let boundary = aggregate(&[assistant_turn(100, 0, 0), assistant_turn(50, 0, 0)]);
        assert!(boundary.compaction_events.is_empty());
    }

    #[test]
    fn test_growth_factor_uses_peak_over_first() {
        let metrics = aggregate(&[
            assistant_turn(10, 0, 0),
            assistant_turn(10, 0, 0),
            assistant_turn(50, 0, 0),
        ]);
        assert_eq!(metrics.peak_effective, 50);
        assert_eq!(metrics.peak_turn, 3);
        assert_eq!(metrics.context_growth, 5.0);
        assert_eq!(metrics.first_effective, 10);
        assert_eq!(metrics.mid_effective, 10);
        assert_eq!(metrics.last_effective, 50);
    }

    #[test]
    fn test_growth_zero_when_first_turn_empty() {
        let metrics = aggregate(&[assistant_turn(0, 0, 0), assistant_turn(500, 0, 0)]);
        assert_eq!(metrics.context_growth, 0.0);
    }

    #[test]
    fn test_peak_tie_resolves_to_earliest_turn() {
        let metrics = aggregate(&[
            assistant_turn(10, 0, 0),
            assistant_turn(70, 0, 0),
            assistant_turn(70, 0, 0),
        ]);
        assert_eq!(metrics.peak_turn, 2);
    }

    #[test]
    fn test_time_bounds_skip_absent_timestamps() {
        let ts = |s| Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, s).unwrap();
        let mut first = user_message();
        first.timestamp = Some(ts(0));
        let middle = assistant_turn(10, 1, 0);
        let mut last = assistant_turn(20, 1, 0);
        last.timestamp = Some(ts(30));

        let metrics = aggregate(&[first, middle, last]);
        assert_eq!(metrics.started_at, Some(ts(0)));
        assert_eq!(metrics.ended_at, Some(ts(30)));
        assert_eq!(metrics.duration().unwrap().num_seconds(), 30);

        let no_times = aggregate(&[user_message(), assistant_turn(10, 1, 0)]);
        assert!(no_times.started_at.is_none());
        assert!(no_times.duration().is_none());
    }

    #[test]
    fn test_model_is_first_nonempty_assistant_model() {
        let mut anonymous = assistant_turn(10, 1, 0);
        anonymous.model = String::new();
        let mut opus = assistant_turn(10, 1, 0);
        opus.model = "claude-opus-4-20250514".to_string();
        let mut sonnet = assistant_turn(10, 1, 0);
        sonnet.model = "claude-sonnet-4-20250514".to_string();

        let metrics = aggregate(&[anonymous, opus, sonnet]);
        assert_eq!(metrics.model, "claude-opus-4-20250514");
        // Opus tier: 10 input tokens * 3 turns at $15/M
        assert!((metrics.costs.input - 30.0 * 15.0 / 1_000_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_message_kind_counts() {
        let metrics = aggregate(&[
            user_message(),
            tool_result_message(),
            tool_result_message(),
            assistant_turn(10, 1, 0),
        ]);
        assert_eq!(metrics.total_messages, 4);
        assert_eq!(metrics.user_messages, 1);
        assert_eq!(metrics.tool_result_messages, 2);
        assert_eq!(metrics.assistant_messages, 1);
    }

    #[test]
    fn test_project_label_from_parent_directory() {
        let metrics = aggregate_session(
            &PathBuf::from("/home/u/.claude/projects/-home-u-myapp/abc.jsonl"),
            &[],
        );
        assert_eq!(metrics.project, "-home-u-myapp");
    }

    #[test]
    fn test_tool_ratio_over_assistant_turns_only() {
        let mut replay = tool_result_message();
        replay.tool_use_count = 7; // should not count toward the ratio
        let metrics = aggregate(&[
            assistant_turn(10, 1, 4),
            assistant_turn(10, 1, 2),
            replay,
        ]);
        assert_eq!(metrics.total_tool_uses, 6);
        assert_eq!(metrics.tool_to_turn, 3.0);
    }
}
