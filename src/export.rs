use crate::models::SessionMetrics;
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

pub fn export_sessions_to_csv(sessions: &[SessionMetrics], path: &Path) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(path)?);

    // Write header
    wtr.write_record([
        "Project",
        "File",
        "Model",
        "Started At",
        "Duration Seconds",
        "Effective Input",
        "Output Tokens",
        "Cache Hit Rate",
        "Turns",
        "Tool Calls",
        "Peak Context",
        "Growth Factor",
        "Compaction Events",
        "Cost USD",
    ])?;

    // Write data
    for metrics in sessions {
        wtr.write_record(&[
            metrics.project.clone(),
            metrics.file_path.display().to_string(),
            metrics.model.clone(),
            metrics
                .started_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            metrics
                .duration()
                .map(|d| d.num_seconds().to_string())
                .unwrap_or_default(),
            metrics.effective_input.to_string(),
            metrics.total_output.to_string(),
            format!("{:.2}", metrics.cache_hit_rate),
            metrics.turn_count.to_string(),
            metrics.total_tool_uses.to_string(),
            metrics.peak_effective.to_string(),
            format!("{:.2}", metrics.context_growth),
            metrics.compaction_events.len().to_string(),
            format!("{:.6}", metrics.costs.total),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::aggregate_session;
    use crate::models::MessageRecord;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_export_writes_header_and_rows() {
        let record = MessageRecord {
            role: "assistant".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            timestamp: None,
            input_tokens: 100,
            output_tokens: 50,
            cache_creation_tokens: 0,
            cache_read_tokens: 900,
            tool_use_count: 2,
            is_tool_result_only: false,
        };
        let metrics = aggregate_session(
            &Path::new("/tmp/-home-user-demo/session.jsonl").to_path_buf(),
            &[record],
        );

        let dir = tempdir().unwrap();
        let out = dir.path().join("sessions.csv");
        export_sessions_to_csv(&[metrics], &out).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("Project,File,Model"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("-home-user-demo,"));
        assert!(row.contains("claude-sonnet-4-20250514"));
        assert_eq!(lines.next(), None);
    }
}
