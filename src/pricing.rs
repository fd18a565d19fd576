use crate::models::CostBreakdown;
use serde::Serialize;

/// Prices in dollars per million tokens for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceTier {
    pub input: f64,
    pub output: f64,
    pub cache_creation: f64,
    pub cache_read: f64,
}

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Family tiers tried in priority order. Model identifiers are matched by
/// substring, not exact name, so every dated variant of a family resolves to
/// the same tier.
const FAMILY_TIERS: &[(&str, PriceTier)] = &[
    (
        "opus",
        PriceTier {
            input: 15.0,
            output: 75.0,
            cache_creation: 18.75,
            cache_read: 1.875,
        },
    ),
    (
        "haiku",
        PriceTier {
            input: 0.80,
            output: 4.0,
            cache_creation: 1.0,
            cache_read: 0.08,
        },
    ),
];

/// Sonnet pricing doubles as the fallback for unrecognized models.
const DEFAULT_TIER: PriceTier = PriceTier {
    input: 3.0,
    output: 15.0,
    cache_creation: 3.75,
    cache_read: 0.30,
};

/// Resolve the price tier for a model identifier.
pub fn tier_for_model(model: &str) -> PriceTier {
    for (family, tier) in FAMILY_TIERS {
        if model.contains(family) {
            return *tier;
        }
    }
    DEFAULT_TIER
}

/// Price the four token categories and their sum for one session.
pub fn compute_costs(
    tier: &PriceTier,
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_tokens: u64,
    cache_read_tokens: u64,
) -> CostBreakdown {
    let input = input_tokens as f64 * tier.input / TOKENS_PER_MILLION;
    let output = output_tokens as f64 * tier.output / TOKENS_PER_MILLION;
    let cache_creation = cache_creation_tokens as f64 * tier.cache_creation / TOKENS_PER_MILLION;
    let cache_read = cache_read_tokens as f64 * tier.cache_read / TOKENS_PER_MILLION;

    CostBreakdown {
        input,
        output,
        cache_creation,
        cache_read,
        total: input + output + cache_creation + cache_read,
    }
}
