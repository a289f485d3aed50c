//! Core domain types for the training session runner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Blocks and their four type-specific bodies
//! - Intervals for timed blocks
//! - Set records and block outcomes produced by runners
//! - Completion records handed to the persistence collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Section label used when a block does not name one
pub const DEFAULT_SECTION: &str = "General";

// ============================================================================
// Rep Targets
// ============================================================================

/// Rep target: either a plain count or free text such as `"8-10"` or `"AMRAP"`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

impl Reps {
    /// Numeric value recorded for a set.
    ///
    /// Text resolves to its leading integer (`"8-10"` is 8); text without
    /// leading digits resolves to 0.
    pub fn resolve(&self) -> u32 {
        match self {
            Reps::Count(n) => *n,
            Reps::Text(text) => {
                let digits: String = text
                    .trim_start()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().unwrap_or(0)
            }
        }
    }
}

impl fmt::Display for Reps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reps::Count(n) => write!(f, "{}", n),
            Reps::Text(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// Block Types
// ============================================================================

/// One schedulable unit of a day's protocol. Read-only for a session's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub name: String,
    #[serde(default = "default_section")]
    pub section: String,
    /// Lump reward for exercise, checklist and superset blocks
    #[serde(default)]
    pub xp_value: u32,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    #[serde(flatten)]
    pub kind: BlockKind,
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

/// Type-specific body of a block. Each variant has exactly one runner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Exercise(ExerciseSpec),
    Checklist(ChecklistSpec),
    Superset(SupersetSpec),
    Timed(TimedSpec),
}

/// Straight sets of a single exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSpec {
    pub sets: u32,
    #[serde(default)]
    pub reps_per_set: Option<Reps>,
    /// Per-set override of `reps_per_set`
    #[serde(default)]
    pub reps_list: Option<Vec<Reps>>,
    #[serde(default)]
    pub tips: Option<String>,
}

impl ExerciseSpec {
    /// Reps recorded for set `index`: per-set list, then scalar target, then 0.
    pub fn reps_for_set(&self, index: usize) -> u32 {
        self.reps_list
            .as_ref()
            .and_then(|list| list.get(index))
            .or(self.reps_per_set.as_ref())
            .map(Reps::resolve)
            .unwrap_or(0)
    }
}

/// Freeform list of labels and checkable items
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ChecklistSpec {
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChecklistItem {
    Subheading {
        text: String,
    },
    Header {
        text: String,
    },
    /// Checkable item. Non-empty `details` turn it into an expand/collapse
    /// disclosure instead of a checkbox.
    Item {
        text: String,
        #[serde(default)]
        details: Vec<String>,
    },
}

impl ChecklistItem {
    pub fn text(&self) -> &str {
        match self {
            ChecklistItem::Subheading { text }
            | ChecklistItem::Header { text }
            | ChecklistItem::Item { text, .. } => text,
        }
    }
}

/// Exercises performed back to back for a number of rounds
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SupersetSpec {
    /// Number of rounds
    pub sets: u32,
    pub exercises: Vec<SupersetExercise>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SupersetExercise {
    pub name: String,
    #[serde(default)]
    pub reps: Option<Reps>,
}

/// Ordered sequence of countdowns and instruction cards
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct TimedSpec {
    #[serde(default)]
    pub intervals: Vec<Interval>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Interval {
    #[serde(default)]
    pub seconds: u32,
    #[serde(default)]
    pub kind: IntervalKind,
    /// Training zone for countdowns, instruction text for cards
    #[serde(default, alias = "text")]
    pub zone: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// Ticks down from `seconds`
    #[default]
    Countdown,
    /// No duration; advances only on an explicit continue
    #[serde(alias = "instructional_card")]
    Card,
}

impl Block {
    /// Lowercase type tag, as written in protocol files
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            BlockKind::Exercise(_) => "exercise",
            BlockKind::Checklist(_) => "checklist",
            BlockKind::Superset(_) => "superset",
            BlockKind::Timed(_) => "timed",
        }
    }

    /// Whether the block earns its `xp_value` once on completion.
    ///
    /// Timed blocks earn per interval instead.
    pub fn is_lump_reward(&self) -> bool {
        !matches!(self.kind, BlockKind::Timed(_))
    }

    pub fn xp_category(&self) -> XpCategory {
        match self.kind {
            BlockKind::Exercise(_) => XpCategory::Strength,
            BlockKind::Checklist(_) => XpCategory::Checklist,
            BlockKind::Superset(_) => XpCategory::Superset,
            BlockKind::Timed(_) => XpCategory::Interval,
        }
    }
}

// ============================================================================
// Runner Results
// ============================================================================

/// Weight and reps captured for one completed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub weight: f64,
    pub reps: u32,
}

/// Parse user-entered weight text. Empty, invalid, negative or non-finite input is 0.
pub fn parse_weight(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(w) if w.is_finite() && w > 0.0 => w,
        _ => 0.0,
    }
}

/// Completed sets for one exercise, the structured completion payload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub name: String,
    pub sets: Vec<SetRecord>,
}

/// Terminal outcome a runner reports to the session
#[derive(Clone, Debug, PartialEq)]
pub enum BlockOutcome {
    Completed { payload: Option<Vec<ExerciseLog>> },
    Skipped,
}

impl BlockOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, BlockOutcome::Skipped)
    }
}

// ============================================================================
// Completion Records
// ============================================================================

/// Ledger category of an XP award
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum XpCategory {
    Strength,
    Checklist,
    Superset,
    Interval,
}

impl fmt::Display for XpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            XpCategory::Strength => "strength",
            XpCategory::Checklist => "checklist",
            XpCategory::Superset => "superset",
            XpCategory::Interval => "interval",
        };
        f.pad(name)
    }
}

/// One call to the history/XP sink: a completed lump block or a finished interval
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub label: String,
    pub details: String,
    pub xp: u32,
    pub category: XpCategory,
    #[serde(default)]
    pub payload: Option<Vec<ExerciseLog>>,
    pub recorded_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn new(
        user_id: impl Into<String>,
        label: impl Into<String>,
        details: impl Into<String>,
        xp: u32,
        category: XpCategory,
        payload: Option<Vec<ExerciseLog>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            label: label.into(),
            details: details.into(),
            xp,
            category,
            payload,
            recorded_at: Utc::now(),
        }
    }
}
