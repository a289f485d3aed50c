//! Protocol loading: the ordered block list for a day.
//!
//! Protocols live as `<day>.toml` or `<day>.json` files in a directory.
//! A day without a file is not an error; it means no workout today.

use crate::{Block, Error, Result};
use chrono::{Datelike, Local, Weekday};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the session gets its blocks from
pub trait ProtocolSource {
    /// Blocks for `day` (today when `None`). Empty means no active workout.
    fn load_protocol(&self, day: Option<&str>) -> Result<Vec<Block>>;
}

/// On-disk protocol file format
#[derive(Debug, Deserialize)]
struct ProtocolFile {
    #[serde(default)]
    blocks: Vec<Block>,
}

/// Reads `<dir>/<day>.toml`, falling back to `<dir>/<day>.json`
#[derive(Clone, Debug)]
pub struct DirectoryProtocolSource {
    dir: PathBuf,
}

impl DirectoryProtocolSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Protocol names available in the directory, sorted.
    pub fn list_days(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut days: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "toml" || ext == "json")
            })
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        days.sort();
        days.dedup();
        Ok(days)
    }

    fn resolve(&self, day: &str) -> Option<PathBuf> {
        ["toml", "json"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", day, ext)))
            .find(|path| path.exists())
    }
}

impl ProtocolSource for DirectoryProtocolSource {
    fn load_protocol(&self, day: Option<&str>) -> Result<Vec<Block>> {
        let day = match day {
            Some(day) => normalize_day(day),
            None => weekday_name(Local::now().weekday()).to_string(),
        };

        match self.resolve(&day) {
            Some(path) => load_protocol_file(&path),
            None => {
                tracing::info!("No protocol for '{}' in {:?}", day, self.dir);
                Ok(Vec::new())
            }
        }
    }
}

/// Load one protocol file; the format is chosen by extension.
pub fn load_protocol_file(path: &Path) -> Result<Vec<Block>> {
    let contents = std::fs::read_to_string(path)?;

    let file: ProtocolFile = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents)?,
        Some("toml") => toml::from_str(&contents)?,
        other => {
            return Err(Error::Protocol(format!(
                "unsupported protocol format {:?} for {:?}",
                other.unwrap_or(""),
                path
            )))
        }
    };

    tracing::info!("Loaded {} block(s) from {:?}", file.blocks.len(), path);
    Ok(file.blocks)
}

/// Lowercase, trimmed; weekday abbreviations expand to full names.
fn normalize_day(day: &str) -> String {
    let day = day.trim().to_lowercase();
    match day.parse::<Weekday>() {
        Ok(weekday) => weekday_name(weekday).to_string(),
        Err(_) => day,
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockKind, IntervalKind, Reps};

    const MONDAY: &str = r#"
[[blocks]]
type = "checklist"
name = "Warm-up"
section = "Prep"
xp_value = 10
items = [
    { kind = "header", text = "Hips" },
    { kind = "item", text = "Leg swings" },
]

[[blocks]]
type = "exercise"
name = "Back Squat"
section = "Strength"
xp_value = 30
sets = 3
reps_per_set = 5
rest_seconds = 120

[[blocks]]
type = "superset"
name = "Accessories"
section = "Strength"
xp_value = 20
sets = 2
exercises = [
    { name = "Dips", reps = "8-10" },
    { name = "Chin-up", reps = 6 },
]

[[blocks]]
type = "timed"
name = "Finisher"
section = "Conditioning"
intervals = [
    { kind = "card", text = "Get on the bike" },
    { seconds = 30, zone = "sprint" },
    { seconds = 90, zone = "easy" },
]
"#;

    #[test]
    fn test_load_toml_protocol() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("monday.toml"), MONDAY).unwrap();

        let source = DirectoryProtocolSource::new(temp_dir.path());
        let blocks = source.load_protocol(Some("Mon")).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1].rest_seconds, Some(120));

        match &blocks[2].kind {
            BlockKind::Superset(spec) => {
                assert_eq!(spec.exercises[0].reps, Some(Reps::Text("8-10".into())));
                assert_eq!(spec.exercises[1].reps, Some(Reps::Count(6)));
            }
            other => panic!("Expected superset, got {:?}", other),
        }
        match &blocks[3].kind {
            BlockKind::Timed(spec) => {
                assert_eq!(spec.intervals[0].kind, IntervalKind::Card);
                assert_eq!(spec.intervals[1].kind, IntervalKind::Countdown);
                assert_eq!(spec.intervals[1].seconds, 30);
            }
            other => panic!("Expected timed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_json_protocol() {
        let temp_dir = tempfile::tempdir().unwrap();
        let json = r#"{"blocks": [
            {"type": "exercise", "name": "Bench Press", "sets": 2, "reps_list": [8, "6"]}
        ]}"#;
        std::fs::write(temp_dir.path().join("push.json"), json).unwrap();

        let blocks = DirectoryProtocolSource::new(temp_dir.path())
            .load_protocol(Some("push"))
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].section, "General");
    }

    #[test]
    fn test_missing_day_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocks = DirectoryProtocolSource::new(temp_dir.path())
            .load_protocol(Some("sunday"))
            .unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_malformed_protocol_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("broken.toml"), "[[blocks]]\ntype = \"yoga\"\n")
            .unwrap();

        let result = DirectoryProtocolSource::new(temp_dir.path()).load_protocol(Some("broken"));
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plan.yaml");
        std::fs::write(&path, "blocks: []").unwrap();
        assert!(matches!(load_protocol_file(&path), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_list_days() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("tuesday.toml"), "").unwrap();
        std::fs::write(temp_dir.path().join("monday.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let days = DirectoryProtocolSource::new(temp_dir.path()).list_days().unwrap();
        assert_eq!(days, vec!["monday", "tuesday"]);
    }

    #[test]
    fn test_normalize_day() {
        assert_eq!(normalize_day(" Wed "), "wednesday");
        assert_eq!(normalize_day("FRIDAY"), "friday");
        assert_eq!(normalize_day("deload-week"), "deload-week");
    }
}
