//! Collaborators the session reports to: the completion sink and the audio cue.
//!
//! Both are fire-and-forget from the session's point of view. A sink error
//! is logged and surfaced as a notice; it never undoes local bookkeeping.

use crate::{CompletionRecord, Error, Result};
use std::io::Write;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;

/// Destination for XP awards and completed-block payloads
pub trait CompletionSink {
    fn record_completion(&mut self, record: &CompletionRecord) -> Result<()>;

    /// Records that were accepted earlier but could not be stored.
    /// Sinks that fail synchronously never have any.
    fn take_failures(&mut self) -> Vec<SinkFailure> {
        Vec::new()
    }
}

impl<S: CompletionSink + ?Sized> CompletionSink for Box<S> {
    fn record_completion(&mut self, record: &CompletionRecord) -> Result<()> {
        (**self).record_completion(record)
    }

    fn take_failures(&mut self) -> Vec<SinkFailure> {
        (**self).take_failures()
    }
}

/// A write that failed after `record_completion` had already returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    pub label: String,
    pub xp: u32,
    pub reason: String,
}

/// What the writer thread did before it stopped
#[derive(Debug, Default)]
pub struct SinkReport {
    pub written: usize,
    /// Failures nobody had collected yet
    pub failures: Vec<SinkFailure>,
}

/// Audible cue for the last seconds of a countdown
pub trait AudioCue {
    fn play_cue(&mut self);
}

/// Rings the terminal bell on stderr
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play_cue(&mut self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

#[derive(Debug, Default)]
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn play_cue(&mut self) {}
}

/// Keeps records in memory. Can be switched to reject every call.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<CompletionRecord>,
    pub calls: usize,
    pub fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every record
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn total_xp(&self) -> u32 {
        self.records.iter().map(|r| r.xp).sum()
    }
}

impl CompletionSink for MemorySink {
    fn record_completion(&mut self, record: &CompletionRecord) -> Result<()> {
        self.calls += 1;
        if self.fail {
            return Err(Error::Sink("history store unavailable".into()));
        }
        self.records.push(record.clone());
        Ok(())
    }
}

/// Forwards records to a writer thread so the caller never waits on I/O.
///
/// Write errors come back over a second channel and are handed out by
/// [`CompletionSink::take_failures`]. Dropping the sink (or calling
/// [`BackgroundSink::finish`]) closes the queue and joins the writer after it
/// has drained every queued record.
pub struct BackgroundSink {
    tx: Option<Sender<CompletionRecord>>,
    failures: Receiver<SinkFailure>,
    handle: Option<JoinHandle<usize>>,
}

impl BackgroundSink {
    pub fn spawn<S>(mut inner: S) -> Self
    where
        S: CompletionSink + Send + 'static,
    {
        let (tx, rx) = channel::<CompletionRecord>();
        let (failure_tx, failures) = channel::<SinkFailure>();
        let handle = std::thread::spawn(move || {
            let mut written = 0;
            for record in rx {
                match inner.record_completion(&record) {
                    Ok(()) => written += 1,
                    Err(e) => {
                        tracing::warn!("Failed to record '{}': {}", record.label, e);
                        let _ = failure_tx.send(SinkFailure {
                            label: record.label,
                            xp: record.xp,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            written
        });

        Self {
            tx: Some(tx),
            failures,
            handle: Some(handle),
        }
    }

    /// Close the queue and wait for the writer.
    pub fn finish(mut self) -> SinkReport {
        let written = self.shutdown();
        SinkReport {
            written,
            failures: self.failures.try_iter().collect(),
        }
    }

    fn shutdown(&mut self) -> usize {
        self.tx.take();
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(written)) => written,
            Some(Err(_)) => {
                tracing::warn!("Completion writer thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl CompletionSink for BackgroundSink {
    fn record_completion(&mut self, record: &CompletionRecord) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::Sink("completion writer already stopped".into()))?;
        tx.send(record.clone())
            .map_err(|_| Error::Sink("completion writer stopped".into()))
    }

    fn take_failures(&mut self) -> Vec<SinkFailure> {
        self.failures.try_iter().collect()
    }
}

impl Drop for BackgroundSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::{read_records, JsonlSink};
    use crate::XpCategory;

    fn record(xp: u32) -> CompletionRecord {
        CompletionRecord::new("tester", "Intervals", "push", xp, XpCategory::Interval, None)
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::new();
        sink.record_completion(&record(6)).unwrap();
        sink.record_completion(&record(5)).unwrap();
        assert_eq!(sink.calls, 2);
        assert_eq!(sink.total_xp(), 11);
    }

    #[test]
    fn test_failing_sink_counts_calls() {
        let mut sink = MemorySink::failing();
        assert!(matches!(sink.record_completion(&record(6)), Err(Error::Sink(_))));
        assert_eq!(sink.calls, 1);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_background_sink_drains_on_finish() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("xp.wal");

        let mut sink = BackgroundSink::spawn(JsonlSink::new(&wal_path));
        for xp in 1..=4 {
            sink.record_completion(&record(xp)).unwrap();
        }
        let report = sink.finish();
        assert_eq!(report.written, 4);
        assert!(report.failures.is_empty());

        let records = read_records(&wal_path).unwrap();
        assert_eq!(records.iter().map(|r| r.xp).sum::<u32>(), 10);
    }

    #[test]
    fn test_background_sink_reports_failures_on_finish() {
        let mut sink = BackgroundSink::spawn(MemorySink::failing());
        sink.record_completion(&record(3)).unwrap();

        let report = sink.finish();
        assert_eq!(report.written, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "Intervals");
        assert_eq!(report.failures[0].xp, 3);
        assert!(report.failures[0].reason.contains("unavailable"));
    }

    #[test]
    fn test_background_sink_failures_can_be_taken_while_running() {
        let mut sink = BackgroundSink::spawn(MemorySink::failing());
        sink.record_completion(&record(4)).unwrap();

        let mut failures = Vec::new();
        for _ in 0..200 {
            failures.extend(sink.take_failures());
            if !failures.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(failures.len(), 1);
        assert!(sink.finish().failures.is_empty());
    }

    #[test]
    fn test_synchronous_sinks_have_no_late_failures() {
        let mut sink = MemorySink::failing();
        let _ = sink.record_completion(&record(1));
        assert!(sink.take_failures().is_empty());
    }
}
