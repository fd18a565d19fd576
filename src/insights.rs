use crate::models::{CostBreakdown, SessionMetrics};
use serde::Serialize;

// Fixed trigger thresholds; strict comparisons throughout.
const HIGH_COST_USD: f64 = 5.0;
const LOW_CACHE_HIT_PCT: f64 = 50.0;
const HIGH_GROWTH_FACTOR: f64 = 5.0;
const HIGH_TURN_COUNT: usize = 60;
const HIGH_TOOL_RATIO: f64 = 3.0;
const HIGH_OUTPUT_PER_TURN: f64 = 2000.0;
const UNCOMPACTED_PEAK_TOKENS: u64 = 100_000;

// Qualifying thresholds for the most-efficient ranking reasons.
const RANKING_LOW_COST_USD: f64 = 10.0;

/// Token category singled out as the dominant cost driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    CacheCreation,
    CacheRead,
    Output,
    UncachedInput,
}

impl CostCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CostCategory::CacheCreation => "Cache creation",
            CostCategory::CacheRead => "Cache read",
            CostCategory::Output => "Output",
            CostCategory::UncachedInput => "Uncached input",
        }
    }
}

/// One flagged inefficiency, with the numbers that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Finding {
    HighCost {
        total: f64,
        driver: CostCategory,
        driver_cost: f64,
    },
    LowCacheHitRate {
        rate: f64,
    },
    HighContextGrowth {
        factor: f64,
        peak: u64,
        peak_turn: usize,
        compaction_turns: Vec<usize>,
    },
    HighTurnCount {
        turns: usize,
        avg_effective_per_turn: f64,
        cost_per_turn: f64,
    },
    HighToolRatio {
        ratio: f64,
    },
    HighOutputPerTurn {
        avg_output: f64,
    },
    UncompactedContext {
        peak: u64,
    },
}

/// Evaluate every trigger against one session. Triggers are independent;
/// a session can raise any subset.
pub fn session_findings(metrics: &SessionMetrics) -> Vec<Finding> {
    let mut findings = Vec::new();

    if metrics.costs.total > HIGH_COST_USD {
        let (driver, driver_cost) = biggest_cost_driver(&metrics.costs);
        findings.push(Finding::HighCost {
            total: metrics.costs.total,
            driver,
            driver_cost,
        });
    }

    if metrics.cache_hit_rate < LOW_CACHE_HIT_PCT {
        findings.push(Finding::LowCacheHitRate {
            rate: metrics.cache_hit_rate,
        });
    }

    if metrics.context_growth > HIGH_GROWTH_FACTOR {
        findings.push(Finding::HighContextGrowth {
            factor: metrics.context_growth,
            peak: metrics.peak_effective,
            peak_turn: metrics.peak_turn,
            compaction_turns: metrics.compaction_events.iter().map(|e| e.turn).collect(),
        });
    }

    if metrics.turn_count > HIGH_TURN_COUNT {
        findings.push(Finding::HighTurnCount {
            turns: metrics.turn_count,
            avg_effective_per_turn: metrics.avg_effective_per_turn,
            cost_per_turn: metrics.costs.total / metrics.turn_count as f64,
        });
    }

    if metrics.tool_to_turn > HIGH_TOOL_RATIO {
        findings.push(Finding::HighToolRatio {
            ratio: metrics.tool_to_turn,
        });
    }

    if metrics.avg_output_per_turn > HIGH_OUTPUT_PER_TURN {
        findings.push(Finding::HighOutputPerTurn {
            avg_output: metrics.avg_output_per_turn,
        });
    }

    if metrics.peak_effective > UNCOMPACTED_PEAK_TOKENS && metrics.compaction_events.is_empty() {
        findings.push(Finding::UncompactedContext {
            peak: metrics.peak_effective,
        });
    }

    findings
}

/// Largest of the four cost categories. Exact ties go to whichever comes
/// first in the (cache creation, cache read, output, uncached input) order.
fn biggest_cost_driver(costs: &CostBreakdown) -> (CostCategory, f64) {
    let candidates = [
        (CostCategory::CacheCreation, costs.cache_creation),
        (CostCategory::CacheRead, costs.cache_read),
        (CostCategory::Output, costs.output),
        (CostCategory::UncachedInput, costs.input),
    ];

    let mut best = candidates[0];
    for candidate in candidates.into_iter().skip(1) {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    best
}

/// Why the winning session qualified as most efficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RankingReason {
    GoodCacheHitRate { rate: f64 },
    ControlledContextGrowth { factor: f64 },
    ReasonableToolUsage { ratio: f64 },
    LowCost { total: f64 },
}

/// The most efficient session of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyRanking {
    /// 0-based position of the winner in the batch
    pub index: usize,
    pub score: f64,
    pub reasons: Vec<RankingReason>,
}

/// Composite efficiency score; higher is better. Cache performance is the
/// only positive term, capped penalties pull it down.
pub fn efficiency_score(metrics: &SessionMetrics) -> f64 {
    let cache_score = metrics.cache_hit_rate / 100.0;
    let growth_penalty = (metrics.context_growth / 10.0).min(1.0);
    let tool_penalty = (metrics.tool_to_turn / 5.0).min(1.0);
    let cost_penalty = (metrics.costs.total / 50.0).min(1.0);

    cache_score - growth_penalty * 0.3 - tool_penalty * 0.2 - cost_penalty * 0.3
}

/// Rank a batch and return the winner. Only meaningful for batches of two
/// or more; ties go to the earliest session in input order.
pub fn most_efficient(batch: &[SessionMetrics]) -> Option<EfficiencyRanking> {
    if batch.len() < 2 {
        return None;
    }

    let mut best_index = 0;
    let mut best_score = efficiency_score(&batch[0]);
    for (index, metrics) in batch.iter().enumerate().skip(1) {
        let score = efficiency_score(metrics);
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    let winner = &batch[best_index];
    let mut reasons = Vec::new();
    if winner.cache_hit_rate >= LOW_CACHE_HIT_PCT {
        reasons.push(RankingReason::GoodCacheHitRate {
            rate: winner.cache_hit_rate,
        });
    }
    if winner.context_growth <= HIGH_GROWTH_FACTOR {
        reasons.push(RankingReason::ControlledContextGrowth {
            factor: winner.context_growth,
        });
    }
    if winner.tool_to_turn <= HIGH_TOOL_RATIO {
        reasons.push(RankingReason::ReasonableToolUsage {
            ratio: winner.tool_to_turn,
        });
    }
    if winner.costs.total < RANKING_LOW_COST_USD {
        reasons.push(RankingReason::LowCost {
            total: winner.costs.total,
        });
    }

    Some(EfficiencyRanking {
        index: best_index,
        score: best_score,
        reasons,
    })
}
