use crate::insights::{EfficiencyRanking, Finding, RankingReason};
use crate::models::SessionMetrics;
use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use colored::*;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde::Serialize;

pub fn print_analysis_header(session_count: usize) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    println!("{}", "═".repeat(80).bright_black());
    println!(
        "{}  {}",
        "📊 Claude Code Session Token Analysis".bright_blue().bold(),
        format!("Generated {}", timestamp).dimmed()
    );
    println!("{}", "═".repeat(80).bright_black());
    println!();
    println!(
        "  Analysing {} session(s)...",
        session_count.to_string().bright_blue().bold()
    );
}

pub fn print_session_report(index: usize, metrics: &SessionMetrics) {
    println!();
    println!("{}", "─".repeat(80).bright_black());
    println!(
        "{}",
        format!("📁 SESSION {}: {}", index + 1, metrics.project)
            .bright_green()
            .bold()
    );
    println!("{}", "─".repeat(80).bright_black());

    println!("  File:     {}", metrics.file_path.display());
    println!("  Model:    {}", metrics.model.bright_magenta());
    println!("  Start:    {}", format_timestamp(metrics.started_at));
    println!("  End:      {}", format_timestamp(metrics.ended_at));
    println!("  Duration: {}", format_duration(metrics.duration()));

    println!();
    println!("{}", "  💾 Token Summary".bright_yellow().bold());
    println!(
        "  Effective input:       {:>12}  (total context processed)",
        format_number(metrics.effective_input).bright_cyan()
    );
    println!(
        "    Cache read:          {:>12}  ({:.0}% hit rate)",
        format_number(metrics.total_cache_read),
        metrics.cache_hit_rate
    );
    println!(
        "    Cache creation:      {:>12}",
        format_number(metrics.total_cache_creation)
    );
    println!(
        "    Uncached input:      {:>12}",
        format_number(metrics.total_input)
    );
    println!(
        "  Output tokens:         {:>12}",
        format_number(metrics.total_output)
    );

    println!();
    println!("{}", "  💰 Estimated Cost".bright_yellow().bold());
    println!("  Cache read:            {:>12}", format_currency(metrics.costs.cache_read));
    println!(
        "  Cache creation:        {:>12}",
        format_currency(metrics.costs.cache_creation)
    );
    println!("  Uncached input:        {:>12}", format_currency(metrics.costs.input));
    println!("  Output:                {:>12}", format_currency(metrics.costs.output));
    println!(
        "  TOTAL:                 {:>12}",
        format_currency(metrics.costs.total).bright_green().bold()
    );

    println!();
    println!("{}", "  🔄 Turn Analysis".bright_yellow().bold());
    println!(
        "  Total messages:        {:>12}",
        format_number(metrics.total_messages as u64)
    );
    println!(
        "  User messages:         {:>12}",
        format_number(metrics.user_messages as u64)
    );
    println!(
        "  Tool result messages:  {:>12}",
        format_number(metrics.tool_result_messages as u64)
    );
    println!(
        "  Assistant turns:       {:>12}",
        format_number(metrics.turn_count as u64)
    );
    println!(
        "  Avg context/turn:      {:>12}",
        format_number(metrics.avg_effective_per_turn as u64)
    );
    println!(
        "  Avg output/turn:       {:>12}",
        format_number(metrics.avg_output_per_turn as u64)
    );

    println!();
    println!("{}", "  🔧 Tool Usage".bright_yellow().bold());
    println!(
        "  Total tool calls:      {:>12}",
        format_number(metrics.total_tool_uses)
    );
    println!("  Tool-to-turn ratio:    {:>12.1}", metrics.tool_to_turn);

    println!();
    println!("{}", "  📈 Context Growth".bright_yellow().bold());
    println!(
        "  First turn context:    {:>12}",
        format_number(metrics.first_effective)
    );
    println!(
        "  Mid turn context:      {:>12}",
        format_number(metrics.mid_effective)
    );
    println!(
        "  Last turn context:     {:>12}",
        format_number(metrics.last_effective)
    );
    println!(
        "  Peak context:          {:>12}  (turn {})",
        format_number(metrics.peak_effective),
        metrics.peak_turn
    );
    println!("  Peak growth factor:    {:>11.1}x", metrics.context_growth);

    if !metrics.compaction_events.is_empty() {
        println!();
        println!("{}", "  🗜️  Compaction Events".bright_yellow().bold());
        for event in &metrics.compaction_events {
            println!(
                "  Turn {:>3}: {:>10} → {:>10}  (-{:.0}%)",
                event.turn,
                format_number(event.before),
                format_number(event.after),
                event.reduction_pct
            );
        }
    }
}

pub fn print_comparison_table(sessions: &[SessionMetrics]) {
    println!();
    println!("{}", "═".repeat(80).bright_black());
    println!("{}", "📋 CROSS-SESSION COMPARISON".bright_green().bold());
    println!("{}", "═".repeat(80).bright_black());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Session").fg(Color::Cyan),
            Cell::new("Duration").fg(Color::Cyan),
            Cell::new("Eff.Input").fg(Color::Cyan),
            Cell::new("Output").fg(Color::Cyan),
            Cell::new("Cache%").fg(Color::Cyan),
            Cell::new("Turns").fg(Color::Cyan),
            Cell::new("Ctx/Turn").fg(Color::Cyan),
            Cell::new("Peak Ctx").fg(Color::Cyan),
            Cell::new("Growth").fg(Color::Cyan),
            Cell::new("Est.Cost").fg(Color::Cyan),
        ]);

    for metrics in sessions {
        let date = metrics
            .started_at
            .map(|t| t.format("%m/%d").to_string())
            .unwrap_or_else(|| "??/??".to_string());
        let label = format!("{} ({})", truncate_text(&metrics.project, 20), date);

        table.add_row(vec![
            Cell::new(label),
            Cell::new(format_duration(metrics.duration())),
            Cell::new(format_tokens(metrics.effective_input)).fg(Color::Magenta),
            Cell::new(format_tokens(metrics.total_output)).fg(Color::Blue),
            Cell::new(format!("{:.0}%", metrics.cache_hit_rate)).fg(Color::Yellow),
            Cell::new(metrics.turn_count.to_string()),
            Cell::new(format_tokens(metrics.avg_effective_per_turn as u64)),
            Cell::new(format_tokens(metrics.peak_effective)),
            Cell::new(format!("{:.1}x", metrics.context_growth)),
            Cell::new(format_currency(metrics.costs.total)).fg(Color::Green),
        ]);
    }

    println!("{}", table);
}

pub fn print_recommendations(
    sessions: &[SessionMetrics],
    findings: &[Vec<Finding>],
    ranking: Option<&EfficiencyRanking>,
) {
    println!();
    println!("{}", "═".repeat(80).bright_black());
    println!("{}", "💡 EFFICIENCY RECOMMENDATIONS".bright_green().bold());
    println!("{}", "═".repeat(80).bright_black());
    println!();

    let mut any = false;
    for (index, session_findings) in findings.iter().enumerate() {
        let metrics = &sessions[index];
        let label = format!("Session {} ({})", index + 1, metrics.project);
        for finding in session_findings {
            any = true;
            print_finding(&label, finding);
            println!();
        }
    }

    if !any {
        println!(
            "  {}",
            "All sessions look efficient! No specific concerns found.".green()
        );
        println!();
    }

    if let Some(ranking) = ranking {
        let winner = &sessions[ranking.index];
        println!(
            "  {} Session {} ({})",
            "🏆 MOST EFFICIENT SESSION:".bright_yellow().bold(),
            ranking.index + 1,
            winner.project.bright_cyan()
        );
        let reasons: Vec<String> = ranking.reasons.iter().map(describe_reason).collect();
        if !reasons.is_empty() {
            println!("    Why: {}", reasons.join(", "));
        }
        println!();
    }
}

fn print_finding(label: &str, finding: &Finding) {
    match finding {
        Finding::HighCost {
            total,
            driver,
            driver_cost,
        } => {
            println!(
                "  [{}] {} ({})",
                label,
                "HIGH ESTIMATED COST".red().bold(),
                format_currency(*total)
            );
            println!(
                "    Biggest cost driver: {} ({}).",
                driver.label(),
                format_currency(*driver_cost)
            );
            println!("    Consider:");
            println!("    - Use Sonnet for exploratory/routine work, Opus only for hard reasoning");
            println!("    - Use /compact before context exceeds 80K tokens");
            println!("    - Reduce turn count by batching instructions");
        }
        Finding::LowCacheHitRate { rate } => {
            println!(
                "  [{}] {} ({:.0}%)",
                label,
                "LOW CACHE HIT RATE".red().bold(),
                rate
            );
            println!("    Most input tokens are being processed fresh each turn. Consider:");
            println!("    - Review prompt structure for unnecessary variation");
            println!("    - Use /compact to reduce context size");
            println!("    - Check if large files are being re-read unnecessarily");
        }
        Finding::HighContextGrowth {
            factor,
            peak,
            peak_turn,
            compaction_turns,
        } => {
            println!(
                "  [{}] {} ({:.1}x peak)",
                label,
                "HIGH CONTEXT GROWTH".red().bold(),
                factor
            );
            println!(
                "    Context peaked at {} tokens (turn {}).",
                format_tokens(*peak),
                peak_turn
            );
            if !compaction_turns.is_empty() {
                let turns: Vec<String> =
                    compaction_turns.iter().map(|t| t.to_string()).collect();
                println!(
                    "    Note: auto-compaction occurred at turn(s) {} — context hit {} before compaction.",
                    turns.join(", "),
                    format_tokens(*peak)
                );
            }
            println!("    Consider:");
            println!("    - Use /compact proactively when context exceeds 60-80K tokens");
            println!("    - Break large tasks into smaller sessions");
            println!("    - Avoid reading very large files repeatedly");
        }
        Finding::HighTurnCount {
            turns,
            avg_effective_per_turn,
            cost_per_turn,
        } => {
            println!(
                "  [{}] {} ({} turns)",
                label,
                "HIGH TURN COUNT".red().bold(),
                turns
            );
            println!(
                "    Each turn re-sends the full context. At avg {} tokens/turn, that's ~{}/turn.",
                format_tokens(*avg_effective_per_turn as u64),
                format_currency(*cost_per_turn)
            );
            println!("    Consider:");
            println!("    - Batch multiple instructions into single messages");
            println!("    - Use sub-agents (Task tool) for multi-step work");
            println!("    - Split into separate sessions for distinct tasks");
        }
        Finding::HighToolRatio { ratio } => {
            println!(
                "  [{}] {} ({:.1})",
                label,
                "HIGH TOOL-TO-TURN RATIO".red().bold(),
                ratio
            );
            println!("    More than 3 tool calls per turn on average. Each tool result adds");
            println!("    to context size. Consider:");
            println!("    - Combine related operations where possible");
            println!("    - Use more targeted searches instead of broad exploration");
            println!("    - Delegate multi-step research to sub-agents");
        }
        Finding::HighOutputPerTurn { avg_output } => {
            println!(
                "  [{}] {} ({} tokens)",
                label,
                "HIGH AVG OUTPUT/TURN".red().bold(),
                format_number(*avg_output as u64)
            );
            println!("    Average output per turn exceeds 2000 tokens. These are expensive turns.");
            println!("    Consider:");
            println!("    - Request more concise responses");
            println!("    - Break complex outputs into focused steps");
            println!("    - Check if verbose explanations are being generated unnecessarily");
        }
        Finding::UncompactedContext { peak } => {
            println!(
                "  [{}] {}",
                label,
                "LARGE CONTEXT WITHOUT COMPACTION".red().bold()
            );
            println!(
                "    Context peaked at {} tokens and was never compacted.",
                format_tokens(*peak)
            );
            println!("    Use /compact when context exceeds 80K to avoid escalating costs.");
        }
    }
}

fn describe_reason(reason: &RankingReason) -> String {
    match reason {
        RankingReason::GoodCacheHitRate { rate } => {
            format!("good cache hit rate ({:.0}%)", rate)
        }
        RankingReason::ControlledContextGrowth { factor } => {
            format!("controlled context growth ({:.1}x)", factor)
        }
        RankingReason::ReasonableToolUsage { ratio } => {
            format!("reasonable tool usage ({:.1} per turn)", ratio)
        }
        RankingReason::LowCost { total } => format!("low cost ({})", format_currency(*total)),
    }
}

pub fn print_batch_summary(sessions: &[SessionMetrics]) {
    let total_effective: u64 = sessions.iter().map(|m| m.effective_input).sum();
    let total_output: u64 = sessions.iter().map(|m| m.total_output).sum();
    let total_turns: usize = sessions.iter().map(|m| m.turn_count).sum();
    let total_cost: f64 = sessions.iter().map(|m| m.costs.total).sum();

    println!("{}", "─".repeat(80).bright_black());
    println!(
        "  Total across all sessions: {} effective input, {} output, {} turns, ~{}",
        format_tokens(total_effective).bright_cyan(),
        format_tokens(total_output).bright_blue(),
        total_turns,
        format_currency(total_cost).bright_green()
    );
    println!("{}", "═".repeat(80).bright_black());
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    sessions: &'a [SessionMetrics],
    findings: &'a [Vec<Finding>],
    most_efficient: Option<&'a EfficiencyRanking>,
}

pub fn display_batch_json(
    sessions: &[SessionMetrics],
    findings: &[Vec<Finding>],
    ranking: Option<&EfficiencyRanking>,
) -> Result<()> {
    let output = BatchOutput {
        sessions,
        findings,
        most_efficient: ranking,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue(), message);
}

/// Abbreviated token count for tables: 1.2K, 3.4M.
fn format_tokens(num: u64) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

fn format_number(num: u64) -> String {
    if num == 0 {
        "0".to_string()
    } else {
        // Manual comma formatting since Rust doesn't support {:,} format
        let num_str = num.to_string();
        let chars: Vec<char> = num_str.chars().collect();
        let mut result = String::new();

        for (i, c) in chars.iter().enumerate() {
            if i > 0 && (chars.len() - i) % 3 == 0 {
                result.push(',');
            }
            result.push(*c);
        }

        result
    }
}

fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn format_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return "N/A".to_string();
    };

    let total_seconds = duration.num_seconds();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        text.to_string()
    } else {
        format!("{}...", &text[..max_len.saturating_sub(3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(0), "0");
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(1_500), "1.5K");
        assert_eq!(format_tokens(2_400_000), "2.4M");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(6.128), "$6.13");
        assert_eq!(format_currency(12.3), "$12.30");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(None), "N/A");
        assert_eq!(format_duration(Some(Duration::seconds(42))), "42s");
        assert_eq!(format_duration(Some(Duration::seconds(125))), "2m 5s");
        assert_eq!(format_duration(Some(Duration::seconds(3725))), "1h 2m 5s");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a-very-long-project-name", 10), "a-very-...");
        assert_eq!(truncate_text("", 10), "");
    }
}
