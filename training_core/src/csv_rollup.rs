//! CSV rollup for archiving the completion log.
//!
//! Converts the WAL to CSV rows, syncs, then renames the WAL so nothing is
//! lost if the process dies halfway.

use crate::{CompletionRecord, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive. Payloads are stored as a JSON string column.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct CsvRow {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub details: String,
    pub xp: u32,
    pub category: String,
    pub payload: Option<String>,
    pub recorded_at: String,
}

impl TryFrom<&CompletionRecord> for CsvRow {
    type Error = crate::Error;

    fn try_from(record: &CompletionRecord) -> Result<Self> {
        let payload = match &record.payload {
            Some(logs) => Some(serde_json::to_string(logs)?),
            None => None,
        };
        Ok(CsvRow {
            id: record.id.to_string(),
            user_id: record.user_id.clone(),
            label: record.label.clone(),
            details: record.details.clone(),
            xp: record.xp,
            category: record.category.to_string(),
            payload,
            recorded_at: record.recorded_at.to_rfc3339(),
        })
    }
}

/// Roll up WAL records into CSV and archive the WAL
///
/// 1. Reads all records from the WAL
/// 2. Appends them to the CSV file (headers only when the file is new)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to `.wal.processed`
///
/// Returns the number of records archived.
pub fn rollup_to_csv(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_records(wal_path)?;

    if records.is_empty() {
        tracing::info!("No records in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(CsvRow::try_from(record)?)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} records to CSV", records.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Remove every `.processed` log in `dir`.
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CompletionSink;
    use crate::wal::JsonlSink;
    use crate::{ExerciseLog, SetRecord, XpCategory};
    use std::fs::File;

    fn record(label: &str) -> CompletionRecord {
        CompletionRecord::new(
            "tester",
            label,
            "Strength",
            20,
            XpCategory::Strength,
            Some(vec![ExerciseLog {
                name: label.into(),
                sets: vec![SetRecord { weight: 50.0, reps: 5 }],
            }]),
        )
    }

    #[test]
    fn test_rollup_creates_csv_and_archives_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("xp.wal");
        let csv_path = temp_dir.path().join("xp.csv");

        let mut sink = JsonlSink::new(&wal_path);
        for i in 0..3 {
            sink.record_completion(&record(&format!("lift {}", i))).unwrap();
        }

        assert_eq!(rollup_to_csv(&wal_path, &csv_path).unwrap(), 3);
        assert!(csv_path.exists());
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("id,user_id,label"));
    }

    #[test]
    fn test_rollup_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("xp.wal");
        let csv_path = temp_dir.path().join("xp.csv");

        JsonlSink::new(&wal_path).record_completion(&record("a")).unwrap();
        rollup_to_csv(&wal_path, &csv_path).unwrap();
        JsonlSink::new(&wal_path).record_completion(&record("b")).unwrap();
        rollup_to_csv(&wal_path, &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        File::create(&wal_path).unwrap();

        let count = rollup_to_csv(&wal_path, &temp_dir.path().join("xp.csv")).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_processed_logs() {
        let temp_dir = tempfile::tempdir().unwrap();
        File::create(temp_dir.path().join("s1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("s2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        assert_eq!(cleanup_processed_logs(temp_dir.path()).unwrap(), 2);
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
