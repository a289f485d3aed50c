//! Experience-point rules.
//!
//! Two reward shapes:
//! - Lump: exercise, checklist and superset blocks earn their `xp_value`
//!   once, on completion, never when skipped
//! - Incremental: each finished countdown interval of a timed block earns
//!   `max(1, ceil(minutes * zone_rate))`; cards earn nothing

use crate::{Block, BlockOutcome, Interval, IntervalKind};

/// Zone keywords and their XP per minute, checked in order. First match wins.
const ZONE_RATES: &[(&[&str], u32)] = &[
    (&["push", "tempo", "threshold"], 12),
    (&["all out", "sprint", "max"], 20),
    (&["long run", "moderate"], 8),
];

/// Base/recovery rate when no keyword matches
pub const BASE_RATE: u32 = 5;

/// XP per minute for a zone or interval text (case-insensitive).
pub fn zone_rate(zone: &str) -> u32 {
    let zone = zone.to_lowercase();
    ZONE_RATES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| zone.contains(k)))
        .map(|(_, rate)| *rate)
        .unwrap_or(BASE_RATE)
}

/// XP for a finished interval. `None` for cards, which never award.
pub fn interval_award(interval: &Interval) -> Option<u32> {
    match interval.kind {
        IntervalKind::Card => None,
        IntervalKind::Countdown => {
            let rate = zone_rate(&interval.zone);
            // ceil(seconds / 60 * rate) in integers
            let scaled = u64::from(interval.seconds) * u64::from(rate);
            let award = scaled.div_ceil(60).max(1);
            Some(u32::try_from(award).unwrap_or(u32::MAX))
        }
    }
}

/// Lump XP for a block outcome. `None` when the block is skipped or is a timed block.
pub fn lump_award(block: &Block, outcome: &BlockOutcome) -> Option<u32> {
    if outcome.is_skipped() || !block.is_lump_reward() {
        return None;
    }
    Some(block.xp_value)
}
