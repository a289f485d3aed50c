//! Completion history: recent records from the WAL and the CSV archive.
//!
//! Read-only reference data. Runners use it for "last time" drill-downs,
//! and a missing or unreadable history only hides that feature.

use crate::csv_rollup::CsvRow;
use crate::{CompletionRecord, ExerciseLog, Result, XpCategory};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for CompletionRecord {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let category = parse_category(&row.category)
            .ok_or_else(|| crate::Error::Other(format!("Unknown category: {}", row.category)))?;

        let payload = match row.payload.as_deref() {
            Some(json) if !json.is_empty() => Some(serde_json::from_str(json)?),
            _ => None,
        };

        Ok(CompletionRecord {
            id,
            user_id: row.user_id,
            label: row.label,
            details: row.details,
            xp: row.xp,
            category,
            payload,
            recorded_at,
        })
    }
}

fn parse_category(s: &str) -> Option<XpCategory> {
    match s {
        "strength" => Some(XpCategory::Strength),
        "checklist" => Some(XpCategory::Checklist),
        "superset" => Some(XpCategory::Superset),
        "interval" => Some(XpCategory::Interval),
        _ => None,
    }
}

/// Load records from the last `days` days from both WAL and CSV
///
/// Newest first, de-duplicated by id.
pub fn load_recent_records(
    wal_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<CompletionRecord>> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for record in crate::wal::read_records(wal_path)? {
            if record.recorded_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} records from WAL", records.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_records_from_csv(csv_path)? {
            if record.recorded_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} records from CSV", csv_count);
    }

    records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

    tracing::info!(
        "Loaded {} total records from last {} days",
        records.len(),
        days
    );

    Ok(records)
}

fn load_records_from_csv(path: &Path) -> Result<Vec<CompletionRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result.map_err(crate::Error::from).and_then(CompletionRecord::try_from) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping CSV row: {}", e),
        }
    }

    Ok(records)
}

/// Latest record per name, for drill-down lookups.
///
/// A record is filed under its label and under every exercise name in its
/// payload, so a superset member finds the superset it was last logged in.
#[derive(Clone, Debug, Default)]
pub struct HistoryIndex {
    latest: HashMap<String, CompletionRecord>,
}

impl HistoryIndex {
    /// Build from records in any order.
    pub fn from_records(records: impl IntoIterator<Item = CompletionRecord>) -> Self {
        let mut latest: HashMap<String, CompletionRecord> = HashMap::new();
        for record in records {
            let mut keys: Vec<String> = std::iter::once(record.label.as_str())
                .chain(record.payload.iter().flatten().map(|log| log.name.as_str()))
                .map(str::to_lowercase)
                .collect();
            keys.sort();
            keys.dedup();

            for key in keys {
                match latest.get(&key) {
                    Some(existing) if existing.recorded_at >= record.recorded_at => {}
                    _ => {
                        latest.insert(key, record.clone());
                    }
                }
            }
        }
        Self { latest }
    }

    /// Most recent record for a block or exercise name (case-insensitive).
    pub fn last_for(&self, name: &str) -> Option<&CompletionRecord> {
        self.latest.get(&name.to_lowercase())
    }

    /// Sets logged for `name` in its most recent record, if it has any.
    pub fn last_sets_for(&self, name: &str) -> Option<&ExerciseLog> {
        self.last_for(name)?
            .payload
            .iter()
            .flatten()
            .find(|log| log.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}
