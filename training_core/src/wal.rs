//! Completion log: one JSON record per line.
//!
//! Every append takes an exclusive `fs2` lock for the duration of one line and
//! every read takes a shared lock, so two `train` processes can share a log.
//! A line that does not parse (a torn write, a hand edit) is skipped.

use crate::sink::CompletionSink;
use crate::{CompletionRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Holds an advisory lock on a log file until dropped
struct LogLock<'a> {
    file: &'a File,
}

impl<'a> LogLock<'a> {
    fn exclusive(file: &'a File) -> Result<Self> {
        FileExt::lock_exclusive(file)?;
        Ok(Self { file })
    }

    fn shared(file: &'a File) -> Result<Self> {
        FileExt::lock_shared(file)?;
        Ok(Self { file })
    }
}

impl Drop for LogLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.file) {
            tracing::warn!("Failed to unlock completion log: {}", e);
        }
    }
}

/// Appends completion records to a JSONL log
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new().create(true).append(true).open(&self.path)?)
    }
}

impl CompletionSink for JsonlSink {
    fn record_completion(&mut self, record: &CompletionRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let file = self.open_for_append()?;
        let _lock = LogLock::exclusive(&file)?;
        // One write per line keeps concurrent appenders from interleaving
        (&file).write_all(&line)?;
        (&file).flush()?;

        tracing::debug!("Logged record {} ({} XP)", record.id, record.xp);
        Ok(())
    }
}

/// Every readable record in the log, in file order. A missing log is empty.
pub fn read_records(path: &Path) -> Result<Vec<CompletionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let _lock = LogLock::shared(&file)?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for (number, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CompletionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::warn!("{:?} line {}: unreadable record: {}", path, number + 1, e);
            }
        }
    }

    tracing::debug!(
        "Read {} records from {:?} ({} skipped)",
        records.len(),
        path,
        skipped
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseLog, SetRecord, XpCategory};

    fn create_test_record(label: &str, xp: u32) -> CompletionRecord {
        CompletionRecord::new("tester", label, "Strength", xp, XpCategory::Strength, None)
    }

    #[test]
    fn test_append_and_read_single_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let record = CompletionRecord::new(
            "tester",
            "Squat",
            "Strength",
            30,
            XpCategory::Strength,
            Some(vec![ExerciseLog {
                name: "Squat".into(),
                sets: vec![SetRecord { weight: 100.0, reps: 5 }],
            }]),
        );

        let mut sink = JsonlSink::new(&wal_path);
        sink.record_completion(&record).unwrap();

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], record);
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("a").join("b").join("xp.wal");

        let mut sink = JsonlSink::new(&wal_path);
        for i in 0..5 {
            sink.record_completion(&create_test_record(&format!("block {}", i), i))
                .unwrap();
        }

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[4].xp, 4);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let mut sink = JsonlSink::new(&wal_path);
        sink.record_completion(&create_test_record("ok", 10)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        sink.record_completion(&create_test_record("also ok", 5)).unwrap();

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_concurrent_appenders_keep_whole_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("shared.wal");

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let path = wal_path.clone();
                std::thread::spawn(move || {
                    let mut sink = JsonlSink::new(path);
                    for i in 0..25 {
                        sink.record_completion(&create_test_record(
                            &format!("writer {} record {}", writer, i),
                            1,
                        ))
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records.len(), 100);
    }

    #[test]
    fn test_read_missing_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_records(&temp_dir.path().join("nonexistent.wal")).unwrap();
        assert!(records.is_empty());
    }
}
