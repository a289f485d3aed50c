//! Block runners: one execution engine per block type.
//!
//! A runner owns exactly the state its block needs (set flags, weights,
//! its own timer) and reports back through [`RunnerSignal`]s. The session
//! keeps at most one runner alive; dropping it drops its timer.

mod checklist;
mod exercise;
mod superset;
mod timed;

pub use checklist::{ChecklistRunner, ItemState};
pub use exercise::ExerciseRunner;
pub use superset::SupersetRunner;
pub use timed::TimedRunner;

use crate::config::TimerConfig;
use crate::rest_timer::{RestTimer, Tick};
use crate::{Block, BlockKind, BlockOutcome, Error, Interval, Result};

/// Something the session has to act on after driving a runner
#[derive(Clone, Debug, PartialEq)]
pub enum RunnerSignal {
    /// Play the audible cue
    Cue,
    /// A countdown interval of a timed block finished and earned `award` XP
    IntervalFinished {
        index: usize,
        interval: Interval,
        award: u32,
    },
    /// The block reached a terminal outcome
    Finished(BlockOutcome),
}

#[derive(Debug, Clone)]
pub enum BlockRunner {
    Exercise(ExerciseRunner),
    Checklist(ChecklistRunner),
    Superset(SupersetRunner),
    Timed(TimedRunner),
}

impl BlockRunner {
    pub fn for_block(block: &Block, timers: &TimerConfig) -> Self {
        match &block.kind {
            BlockKind::Exercise(spec) => BlockRunner::Exercise(ExerciseRunner::new(
                &block.name,
                spec.clone(),
                block.rest_seconds.unwrap_or(timers.default_rest_seconds),
                timers.cue_seconds,
            )),
            BlockKind::Checklist(spec) => {
                BlockRunner::Checklist(ChecklistRunner::new(spec.items.clone()))
            }
            BlockKind::Superset(spec) => BlockRunner::Superset(SupersetRunner::new(
                spec.clone(),
                timers.superset_rest_seconds,
                timers.cue_seconds,
            )),
            BlockKind::Timed(spec) => {
                BlockRunner::Timed(TimedRunner::new(spec.intervals.clone(), timers.cue_seconds))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            BlockRunner::Exercise(_) => "exercise",
            BlockRunner::Checklist(_) => "checklist",
            BlockRunner::Superset(_) => "superset",
            BlockRunner::Timed(_) => "timed",
        }
    }

    /// Mount the runner. Only timed blocks do anything here: they start the
    /// first interval, or finish at once when there are no intervals.
    pub fn start(&mut self) -> Vec<RunnerSignal> {
        match self {
            BlockRunner::Timed(runner) => runner.start(),
            BlockRunner::Exercise(_) | BlockRunner::Checklist(_) | BlockRunner::Superset(_) => {
                Vec::new()
            }
        }
    }

    /// One second of wall time.
    pub fn tick(&mut self) -> Vec<RunnerSignal> {
        match self {
            BlockRunner::Exercise(runner) => rest_signals(runner.rest_mut().tick()),
            BlockRunner::Superset(runner) => rest_signals(runner.rest_mut().tick()),
            BlockRunner::Checklist(_) => Vec::new(),
            BlockRunner::Timed(runner) => runner.tick(),
        }
    }

    /// The completion action.
    pub fn complete(&mut self) -> Result<Vec<RunnerSignal>> {
        let outcome = match self {
            BlockRunner::Exercise(runner) => runner.complete()?,
            BlockRunner::Checklist(runner) => runner.complete(),
            BlockRunner::Superset(runner) => runner.complete()?,
            BlockRunner::Timed(runner) => return runner.advance(),
        };
        Ok(vec![RunnerSignal::Finished(outcome)])
    }

    /// Skip the whole block. Always available.
    pub fn skip(&mut self) -> Vec<RunnerSignal> {
        if let Some(timer) = self.timer_mut() {
            timer.skip();
        }
        vec![RunnerSignal::Finished(BlockOutcome::Skipped)]
    }

    /// Next/continue on a timed block.
    pub fn advance(&mut self) -> Result<Vec<RunnerSignal>> {
        match self {
            BlockRunner::Timed(runner) => runner.advance(),
            other => Err(not_supported(other, "advance to the next interval")),
        }
    }

    pub fn toggle_set(&mut self, set: usize) -> Result<()> {
        match self {
            BlockRunner::Exercise(runner) => runner.toggle_set(set),
            other => Err(not_supported(other, "toggle a set")),
        }
    }

    pub fn set_weight(&mut self, set: usize, text: &str) -> Result<()> {
        match self {
            BlockRunner::Exercise(runner) => runner.set_weight(set, text),
            other => Err(not_supported(other, "enter a set weight")),
        }
    }

    pub fn toggle_cell(&mut self, exercise: usize, round: usize) -> Result<()> {
        match self {
            BlockRunner::Superset(runner) => runner.toggle(exercise, round),
            other => Err(not_supported(other, "toggle a superset round")),
        }
    }

    pub fn set_cell_weight(&mut self, exercise: usize, round: usize, text: &str) -> Result<()> {
        match self {
            BlockRunner::Superset(runner) => runner.set_weight(exercise, round, text),
            other => Err(not_supported(other, "enter a round weight")),
        }
    }

    pub fn toggle_item(&mut self, item: usize) -> Result<()> {
        match self {
            BlockRunner::Checklist(runner) => runner.toggle_item(item),
            other => Err(not_supported(other, "toggle a checklist item")),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        let timer = self.controllable_timer("pause")?;
        if timer.pause() {
            Ok(())
        } else {
            Err(Error::intent("no running countdown to pause"))
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        let timer = self.controllable_timer("resume")?;
        if timer.resume() {
            Ok(())
        } else {
            Err(Error::intent("no paused countdown to resume"))
        }
    }

    /// Restart the rest countdown, or the current interval of a timed block.
    pub fn restart(&mut self) -> Result<()> {
        let timer = self.controllable_timer("restart")?;
        if timer.duration() == 0 {
            return Err(Error::intent("no countdown to restart"));
        }
        timer.restart();
        Ok(())
    }

    /// End the rest countdown early.
    pub fn skip_rest(&mut self) -> Result<()> {
        match self {
            BlockRunner::Exercise(runner) => skip_active(runner.rest_mut()),
            BlockRunner::Superset(runner) => skip_active(runner.rest_mut()),
            other => Err(not_supported(other, "skip a rest")),
        }
    }

    /// The countdown currently shown to the user, if any.
    pub fn timer(&self) -> Option<&RestTimer> {
        match self {
            BlockRunner::Exercise(runner) => Some(runner.rest()),
            BlockRunner::Superset(runner) => Some(runner.rest()),
            BlockRunner::Timed(runner) => runner.countdown(),
            BlockRunner::Checklist(_) => None,
        }
    }

    fn timer_mut(&mut self) -> Option<&mut RestTimer> {
        match self {
            BlockRunner::Exercise(runner) => Some(runner.rest_mut()),
            BlockRunner::Superset(runner) => Some(runner.rest_mut()),
            BlockRunner::Timed(runner) => runner.countdown_mut(),
            BlockRunner::Checklist(_) => None,
        }
    }

    fn controllable_timer(&mut self, action: &str) -> Result<&mut RestTimer> {
        let type_name = self.type_name();
        self.timer_mut().ok_or_else(|| {
            Error::intent(format!("cannot {} a countdown on a {} block here", action, type_name))
        })
    }
}

fn rest_signals(tick: Option<Tick>) -> Vec<RunnerSignal> {
    match tick {
        Some(tick) if tick.cue => vec![RunnerSignal::Cue],
        _ => Vec::new(),
    }
}

fn skip_active(timer: &mut RestTimer) -> Result<()> {
    if !timer.is_active() {
        return Err(Error::intent("no rest in progress"));
    }
    timer.skip();
    Ok(())
}

fn not_supported(runner: &BlockRunner, action: &str) -> Error {
    Error::intent(format!("cannot {} on a {} block", action, runner.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChecklistSpec, ExerciseSpec, IntervalKind, Reps, TimedSpec};

    fn exercise_block(sets: u32, rest: Option<u32>) -> Block {
        Block {
            name: "Bench Press".into(),
            section: "Strength".into(),
            xp_value: 20,
            rest_seconds: rest,
            kind: BlockKind::Exercise(ExerciseSpec {
                sets,
                reps_per_set: Some(Reps::Count(5)),
                reps_list: None,
                tips: None,
            }),
        }
    }

    #[test]
    fn test_runner_matches_block_type() {
        let timers = TimerConfig::default();
        let runner = BlockRunner::for_block(&exercise_block(3, None), &timers);
        assert_eq!(runner.type_name(), "exercise");

        let checklist = Block {
            kind: BlockKind::Checklist(ChecklistSpec::default()),
            ..exercise_block(1, None)
        };
        assert_eq!(BlockRunner::for_block(&checklist, &timers).type_name(), "checklist");
    }

    #[test]
    fn test_block_rest_overrides_default() {
        let timers = TimerConfig::default();
        let mut runner = BlockRunner::for_block(&exercise_block(3, Some(120)), &timers);
        runner.toggle_set(0).unwrap();
        assert_eq!(runner.timer().unwrap().remaining(), 120);
    }

    #[test]
    fn test_rest_tick_emits_cue_in_final_seconds() {
        let timers = TimerConfig::default();
        let mut runner = BlockRunner::for_block(&exercise_block(2, Some(6)), &timers);
        runner.toggle_set(0).unwrap();

        let cues: usize = (0..10).map(|_| runner.tick().len()).sum();
        assert_eq!(cues, 5);
    }

    #[test]
    fn test_wrong_intent_is_rejected() {
        let timers = TimerConfig::default();
        let mut runner = BlockRunner::for_block(&exercise_block(3, None), &timers);

        assert!(matches!(runner.toggle_item(0), Err(Error::InvalidIntent(_))));
        assert!(matches!(runner.advance(), Err(Error::InvalidIntent(_))));
        assert!(matches!(runner.skip_rest(), Err(Error::InvalidIntent(_))));
        assert!(matches!(runner.pause(), Err(Error::InvalidIntent(_))));
    }

    #[test]
    fn test_skip_stops_timer() {
        let timers = TimerConfig::default();
        let mut runner = BlockRunner::for_block(&exercise_block(3, None), &timers);
        runner.toggle_set(0).unwrap();
        assert!(runner.timer().unwrap().is_running());

        let signals = runner.skip();
        assert_eq!(signals, vec![RunnerSignal::Finished(BlockOutcome::Skipped)]);
        assert!(!runner.timer().unwrap().is_active());
    }

    #[test]
    fn test_timed_block_without_intervals_completes_on_start() {
        let timers = TimerConfig::default();
        let block = Block {
            kind: BlockKind::Timed(TimedSpec::default()),
            ..exercise_block(1, None)
        };
        let mut runner = BlockRunner::for_block(&block, &timers);
        assert_eq!(
            runner.start(),
            vec![RunnerSignal::Finished(BlockOutcome::Completed { payload: None })]
        );
    }

    #[test]
    fn test_card_cannot_be_paused() {
        let timers = TimerConfig::default();
        let block = Block {
            kind: BlockKind::Timed(TimedSpec {
                intervals: vec![Interval {
                    seconds: 0,
                    kind: IntervalKind::Card,
                    zone: "Set up the rower".into(),
                    note: None,
                }],
            }),
            ..exercise_block(1, None)
        };
        let mut runner = BlockRunner::for_block(&block, &timers);
        assert!(runner.start().is_empty());
        assert!(matches!(runner.pause(), Err(Error::InvalidIntent(_))));
        assert!(matches!(runner.restart(), Err(Error::InvalidIntent(_))));
    }
}
