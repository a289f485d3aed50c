//! Built-in exercise display metadata and protocol sanity checks.
//!
//! The catalog is optional reference data: a name that is not listed simply
//! has no drill-down.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Display metadata for one exercise
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseInfo {
    pub name: String,
    pub cues: Vec<String>,
    pub reference_url: Option<String>,
}

/// Exercise metadata keyed by lowercase name
#[derive(Clone, Debug, Default)]
pub struct ExerciseCatalog {
    entries: HashMap<String, ExerciseInfo>,
}

impl ExerciseCatalog {
    pub fn insert(&mut self, info: ExerciseInfo) {
        self.entries.insert(info.name.to_lowercase(), info);
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&ExerciseInfo> {
        self.entries.get(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cached default catalog - built once and reused
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> = Lazy::new(build_default_catalog);

/// Reference to the cached built-in catalog
pub fn default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

/// Build the built-in catalog. Prefer [`default_catalog`] outside tests.
pub fn build_default_catalog() -> ExerciseCatalog {
    let mut catalog = ExerciseCatalog::default();

    let entries: &[(&str, &[&str], &str)] = &[
        (
            "Back Squat",
            &["Brace before you descend", "Knees track over toes"],
            "https://www.youtube.com/watch?v=ultWZbUMPL8",
        ),
        (
            "Deadlift",
            &["Bar over mid-foot", "Push the floor away"],
            "https://www.youtube.com/watch?v=op9kVnSso6Q",
        ),
        (
            "Bench Press",
            &["Shoulder blades pinned", "Touch low on the chest"],
            "https://www.youtube.com/watch?v=rT7DgCr-3pg",
        ),
        (
            "Overhead Press",
            &["Squeeze glutes", "Head through at lockout"],
            "https://www.youtube.com/watch?v=2yjwXTZQDDI",
        ),
        (
            "Pull-up",
            &["Start from a dead hang", "Chest to the bar"],
            "https://www.youtube.com/watch?v=eGo4IYlbE5g",
        ),
        (
            "Kettlebell Swing",
            &["Hinge, don't squat", "Snap the hips"],
            "https://www.youtube.com/watch?v=YSxHifyI6s8",
        ),
        (
            "Barbell Row",
            &["Flat back", "Pull to the lower ribs"],
            "https://www.youtube.com/watch?v=FWJR5Ve8bnQ",
        ),
        (
            "Romanian Deadlift",
            &["Soft knees", "Hips back until hamstrings load"],
            "https://www.youtube.com/watch?v=JCXUYuzwNrM",
        ),
    ];

    for (name, cues, url) in entries {
        catalog.insert(ExerciseInfo {
            name: (*name).to_string(),
            cues: cues.iter().map(|c| (*c).to_string()).collect(),
            reference_url: Some((*url).to_string()),
        });
    }

    catalog
}

/// Report suspicious protocol data. Nothing is rejected: runners cope with
/// all of it, these are warnings for whoever wrote the file.
pub fn validate_blocks(blocks: &[Block]) -> Vec<String> {
    let mut warnings = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        let at = format!("block {} ('{}')", index + 1, block.name);

        if block.name.trim().is_empty() {
            warnings.push(format!("block {} has an empty name", index + 1));
        }
        if block.section.trim().is_empty() {
            warnings.push(format!("{}: empty section label", at));
        }

        match &block.kind {
            BlockKind::Exercise(spec) => {
                if spec.sets == 0 {
                    warnings.push(format!("{}: exercise has zero sets", at));
                }
                if let Some(list) = &spec.reps_list {
                    if list.len() != spec.sets as usize {
                        warnings.push(format!(
                            "{}: reps_list has {} entries for {} sets",
                            at,
                            list.len(),
                            spec.sets
                        ));
                    }
                }
            }
            BlockKind::Checklist(spec) => {
                if spec.items.is_empty() {
                    warnings.push(format!("{}: checklist has no items", at));
                }
            }
            BlockKind::Superset(spec) => {
                if spec.sets == 0 {
                    warnings.push(format!("{}: superset has zero rounds", at));
                }
                if spec.exercises.is_empty() {
                    warnings.push(format!("{}: superset has no exercises", at));
                }
            }
            BlockKind::Timed(spec) => {
                if spec.intervals.is_empty() {
                    warnings.push(format!("{}: timed block has no intervals", at));
                }
                if block.xp_value > 0 {
                    warnings.push(format!(
                        "{}: xp_value is ignored on timed blocks (intervals earn XP)",
                        at
                    ));
                }
            }
        }
    }

    warnings
}
