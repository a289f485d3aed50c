//! Timed-interval runner.
//!
//! Walks the intervals in order. Countdowns tick down and finish on their own
//! (or on an explicit next); cards wait for continue. Each finished countdown
//! is reported with its XP before the pointer moves on, so a later skip of
//! the block never takes those awards back.

use super::RunnerSignal;
use crate::rest_timer::RestTimer;
use crate::{xp, BlockOutcome, Error, Interval, IntervalKind, Result};

#[derive(Debug, Clone)]
pub struct TimedRunner {
    intervals: Vec<Interval>,
    current: usize,
    countdown: RestTimer,
    finished: bool,
}

impl TimedRunner {
    pub fn new(intervals: Vec<Interval>, cue_seconds: u32) -> Self {
        Self {
            intervals,
            current: 0,
            countdown: RestTimer::new(cue_seconds),
            finished: false,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_interval(&self) -> Option<&Interval> {
        if self.finished {
            return None;
        }
        self.intervals.get(self.current)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The countdown of the current interval; `None` on cards.
    pub fn countdown(&self) -> Option<&RestTimer> {
        match self.current_interval()?.kind {
            IntervalKind::Countdown => Some(&self.countdown),
            IntervalKind::Card => None,
        }
    }

    pub(crate) fn countdown_mut(&mut self) -> Option<&mut RestTimer> {
        match self.current_interval()?.kind {
            IntervalKind::Countdown => Some(&mut self.countdown),
            IntervalKind::Card => None,
        }
    }

    /// Mount the first interval. With no intervals the block is complete at once.
    pub fn start(&mut self) -> Vec<RunnerSignal> {
        self.current = 0;
        self.finished = false;
        let mut signals = Vec::new();
        self.mount(&mut signals);
        signals
    }

    pub fn tick(&mut self) -> Vec<RunnerSignal> {
        let mut signals = Vec::new();
        if self.finished {
            return signals;
        }
        let Some(tick) = self.countdown_mut().and_then(|timer| timer.tick()) else {
            return signals;
        };

        if tick.cue {
            signals.push(RunnerSignal::Cue);
        }
        if tick.finished {
            self.finish_current(&mut signals);
            self.current += 1;
            self.mount(&mut signals);
        }
        signals
    }

    /// Explicit next (countdown) or continue (card).
    pub fn advance(&mut self) -> Result<Vec<RunnerSignal>> {
        if self.finished {
            return Err(Error::intent("all intervals are already finished"));
        }
        let mut signals = Vec::new();
        self.countdown.skip();
        self.finish_current(&mut signals);
        self.current += 1;
        self.mount(&mut signals);
        Ok(signals)
    }

    /// Start the interval at `current`. Zero-length countdowns finish in place
    /// and the pointer keeps moving.
    fn mount(&mut self, signals: &mut Vec<RunnerSignal>) {
        loop {
            let Some(interval) = self.intervals.get(self.current) else {
                self.finished = true;
                self.countdown.skip();
                tracing::debug!("Timed block finished after {} interval(s)", self.current);
                signals.push(RunnerSignal::Finished(BlockOutcome::Completed {
                    payload: None,
                }));
                return;
            };

            match interval.kind {
                IntervalKind::Card => {
                    self.countdown.skip();
                    return;
                }
                IntervalKind::Countdown => {
                    self.countdown.start(interval.seconds);
                    if !self.countdown.is_finished() {
                        return;
                    }
                    self.finish_current(signals);
                    self.current += 1;
                }
            }
        }
    }

    fn finish_current(&self, signals: &mut Vec<RunnerSignal>) {
        let Some(interval) = self.intervals.get(self.current) else {
            return;
        };
        if let Some(award) = xp::interval_award(interval) {
            tracing::debug!(
                "Interval {} ({}) finished: {} XP",
                self.current + 1,
                interval.zone,
                award
            );
            signals.push(RunnerSignal::IntervalFinished {
                index: self.current,
                interval: interval.clone(),
                award,
            });
        }
    }
}
