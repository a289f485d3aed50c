//! Session state machine.
//!
//! Owns the block list, the completed/skipped bookkeeping, the hub/running
//! view and the single active runner. Every user intent and every timer tick
//! is applied synchronously; reporting to the sink happens alongside and its
//! failures never change local state.
//!
//! ## State Transitions
//!
//! ```text
//! Empty                       (no blocks; terminal)
//! Hub --select--> Running(i) --back--> Hub
//! Running(i) --done/skip--> Running(i+1)   same label at i+1
//!                        --> Hub           otherwise
//!                        --> AllComplete   every block done (terminal)
//! ```

use crate::catalog::{ExerciseCatalog, ExerciseInfo};
use crate::config::{Config, TimerConfig};
use crate::history::HistoryIndex;
use crate::rest_timer::format_clock;
use crate::runner::{BlockRunner, RunnerSignal};
use crate::section::{SectionIndex, SectionSummary};
use crate::sink::{AudioCue, CompletionSink, SilentCue};
use crate::{
    xp, Block, BlockOutcome, CompletionRecord, Error, ExerciseLog, Interval, Result, XpCategory,
};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum ViewState {
    /// The protocol has no blocks: nothing to run
    Empty,
    Hub,
    Running(usize),
    AllComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Non-blocking message for the host to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Reference data about an exercise, when any is available
#[derive(Debug, Clone, PartialEq)]
pub struct DrillDown {
    pub info: Option<ExerciseInfo>,
    pub last: Option<CompletionRecord>,
    /// Sets logged under this exact name in `last`
    pub last_sets: Option<ExerciseLog>,
}

pub struct SessionController<S: CompletionSink> {
    blocks: Vec<Block>,
    sections: SectionIndex,
    view: ViewState,
    runner: Option<BlockRunner>,
    completed: HashSet<usize>,
    skipped: HashSet<usize>,
    /// Blocks whose lump XP has been reported; guards re-runs
    awarded: HashSet<usize>,
    xp_awarded: u32,
    notices: Vec<Notice>,
    user_id: String,
    timers: TimerConfig,
    sink: S,
    cue: Box<dyn AudioCue>,
    catalog: Option<ExerciseCatalog>,
    history: Option<HistoryIndex>,
}

impl<S: CompletionSink> SessionController<S> {
    /// Start a session. Opens on the hub when blocks carry more than one
    /// section label, otherwise runs the first block straight away.
    pub fn new(blocks: Vec<Block>, config: &Config, sink: S) -> Self {
        let sections = SectionIndex::build(&blocks);
        let mut controller = Self {
            blocks,
            sections,
            view: ViewState::Empty,
            runner: None,
            completed: HashSet::new(),
            skipped: HashSet::new(),
            awarded: HashSet::new(),
            xp_awarded: 0,
            notices: Vec::new(),
            user_id: config.user.user_id.clone(),
            timers: config.timers.clone(),
            sink,
            cue: Box::new(SilentCue),
            catalog: None,
            history: None,
        };

        if controller.blocks.is_empty() {
            tracing::info!("Protocol is empty; no active workout");
        } else if controller.sections.len() > 1 {
            controller.view = ViewState::Hub;
            tracing::info!(
                "Session opened on hub with {} sections",
                controller.sections.len()
            );
        } else {
            controller.enter(0);
        }
        controller
    }

    pub fn with_cue(mut self, cue: Box<dyn AudioCue>) -> Self {
        self.cue = cue;
        self
    }

    pub fn with_catalog(mut self, catalog: ExerciseCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_history(mut self, history: HistoryIndex) -> Self {
        self.history = Some(history);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ViewState {
        self.view
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn current_block(&self) -> Option<(usize, &Block)> {
        match self.view {
            ViewState::Running(index) => self.blocks.get(index).map(|b| (index, b)),
            _ => None,
        }
    }

    pub fn runner(&self) -> Option<&BlockRunner> {
        self.runner.as_ref()
    }

    pub fn completed(&self) -> &HashSet<usize> {
        &self.completed
    }

    pub fn skipped(&self) -> &HashSet<usize> {
        &self.skipped
    }

    /// Completed or skipped
    pub fn is_done(&self, index: usize) -> bool {
        self.completed.contains(&index) || self.skipped.contains(&index)
    }

    pub fn done_indices(&self) -> HashSet<usize> {
        self.completed.union(&self.skipped).copied().collect()
    }

    pub fn sections(&self) -> &SectionIndex {
        &self.sections
    }

    pub fn section_summaries(&self) -> Vec<SectionSummary> {
        self.sections.summaries(&self.done_indices())
    }

    /// XP reported during this session, lump and interval awards together
    pub fn xp_awarded(&self) -> u32 {
        self.xp_awarded
    }

    /// Pending notices, including late failures from the sink.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.collect_sink_failures();
        std::mem::take(&mut self.notices)
    }

    /// Queue a rejected intent for the host to show. Errors other than
    /// rejections are queued as warnings.
    pub fn note_rejection(&mut self, error: &Error) {
        let (level, message) = match error {
            Error::InvalidIntent(msg) => (NoticeLevel::Info, msg.clone()),
            Error::UnknownSection(name) => (NoticeLevel::Info, format!("No section '{}'", name)),
            other => (NoticeLevel::Warning, other.to_string()),
        };
        tracing::debug!("Intent rejected: {}", message);
        self.notices.push(Notice { level, message });
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Catalog metadata and last logged record for a name. `None` when neither exists.
    pub fn drill_down(&self, name: &str) -> Option<DrillDown> {
        let info = self
            .catalog
            .as_ref()
            .and_then(|c| c.lookup(name))
            .cloned();
        let history = self.history.as_ref();
        let last = history.and_then(|h| h.last_for(name)).cloned();
        let last_sets = history.and_then(|h| h.last_sets_for(name)).cloned();

        if info.is_none() && last.is_none() {
            return None;
        }
        Some(DrillDown {
            info,
            last,
            last_sets,
        })
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Run a section from the hub: its first member not yet done, or its
    /// first member when everything is done.
    pub fn select_section(&mut self, name: &str) -> Result<()> {
        if self.view != ViewState::Hub {
            return Err(Error::intent(format!(
                "sections can only be chosen from the hub (state: {:?})",
                self.view
            )));
        }

        let done = self.done_indices();
        let entry = self
            .sections
            .get(name)
            .and_then(|section| section.entry_index(&done))
            .ok_or_else(|| Error::UnknownSection(name.to_string()))?;

        tracing::info!("Section '{}' selected, starting at block {}", name, entry);
        self.enter(entry);
        Ok(())
    }

    /// Leave the running block without finishing it. Bookkeeping is untouched.
    pub fn back_to_hub(&mut self) -> Result<()> {
        match self.view {
            ViewState::Running(index) => {
                self.runner = None;
                self.view = ViewState::Hub;
                tracing::info!("Left block {} for the hub", index);
                Ok(())
            }
            ViewState::Hub => Ok(()),
            ViewState::Empty | ViewState::AllComplete => Err(Error::intent(format!(
                "no hub in state {:?}",
                self.view
            ))),
        }
    }

    // ── Runner intents ───────────────────────────────────────────────

    /// One second of wall time. Only a running block has timers to move,
    /// but late sink failures are picked up in every state.
    pub fn tick(&mut self) {
        if let Ok((index, runner)) = self.active_runner() {
            let signals = runner.tick();
            self.apply(index, signals);
        }
        self.collect_sink_failures();
    }

    pub fn complete_block(&mut self) -> Result<()> {
        let (index, runner) = self.active_runner()?;
        let signals = runner.complete()?;
        self.apply(index, signals);
        Ok(())
    }

    pub fn skip_block(&mut self) -> Result<()> {
        let (index, runner) = self.active_runner()?;
        let signals = runner.skip();
        self.apply(index, signals);
        Ok(())
    }

    /// Next countdown or continue past a card on a timed block.
    pub fn advance_interval(&mut self) -> Result<()> {
        let (index, runner) = self.active_runner()?;
        let signals = runner.advance()?;
        self.apply(index, signals);
        Ok(())
    }

    pub fn toggle_set(&mut self, set: usize) -> Result<()> {
        self.active_runner()?.1.toggle_set(set)
    }

    pub fn set_weight(&mut self, set: usize, text: &str) -> Result<()> {
        self.active_runner()?.1.set_weight(set, text)
    }

    pub fn toggle_cell(&mut self, exercise: usize, round: usize) -> Result<()> {
        self.active_runner()?.1.toggle_cell(exercise, round)
    }

    pub fn set_cell_weight(&mut self, exercise: usize, round: usize, text: &str) -> Result<()> {
        self.active_runner()?.1.set_cell_weight(exercise, round, text)
    }

    pub fn toggle_item(&mut self, item: usize) -> Result<()> {
        self.active_runner()?.1.toggle_item(item)
    }

    pub fn pause(&mut self) -> Result<()> {
        self.active_runner()?.1.pause()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.active_runner()?.1.resume()
    }

    pub fn restart_timer(&mut self) -> Result<()> {
        self.active_runner()?.1.restart()
    }

    pub fn skip_rest(&mut self) -> Result<()> {
        self.active_runner()?.1.skip_rest()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn active_runner(&mut self) -> Result<(usize, &mut BlockRunner)> {
        match (self.view, self.runner.as_mut()) {
            (ViewState::Running(index), Some(runner)) => Ok((index, runner)),
            (view, _) => Err(Error::intent(format!("no block is running (state: {:?})", view))),
        }
    }

    fn enter(&mut self, index: usize) {
        let signals = self.mount(index);
        self.apply(index, signals);
    }

    /// Replace the runner with a fresh one for `index`. The old runner and
    /// its timer are dropped here.
    fn mount(&mut self, index: usize) -> Vec<RunnerSignal> {
        let block = &self.blocks[index];
        tracing::info!(
            "Running block {} '{}' ({})",
            index,
            block.name,
            block.type_name()
        );
        let mut runner = BlockRunner::for_block(block, &self.timers);
        let signals = runner.start();
        self.runner = Some(runner);
        self.view = ViewState::Running(index);
        signals
    }

    /// Act on runner signals. A finished block may mount the next one, whose
    /// own start signals are handled in the same loop.
    fn apply(&mut self, index: usize, signals: Vec<RunnerSignal>) {
        let mut pending = Some((index, signals));
        while let Some((index, signals)) = pending.take() {
            for signal in signals {
                match signal {
                    RunnerSignal::Cue => self.cue.play_cue(),
                    RunnerSignal::IntervalFinished {
                        index: interval_index,
                        interval,
                        award,
                    } => self.report_interval(index, interval_index, &interval, award),
                    RunnerSignal::Finished(outcome) => {
                        if let Some(next) = self.finish_block(index, outcome) {
                            pending = Some((next, self.mount(next)));
                        }
                        break;
                    }
                }
            }
        }
    }

    /// Bookkeeping for a terminal outcome, then pick where to go.
    fn finish_block(&mut self, index: usize, outcome: BlockOutcome) -> Option<usize> {
        self.runner = None;

        let award = xp::lump_award(&self.blocks[index], &outcome);
        match outcome {
            BlockOutcome::Skipped => {
                // A re-run that gets skipped keeps its earlier completion
                if !self.completed.contains(&index) {
                    self.skipped.insert(index);
                }
                tracing::info!("Block {} skipped", index);
            }
            BlockOutcome::Completed { payload } => {
                self.skipped.remove(&index);
                self.completed.insert(index);
                tracing::info!("Block {} completed", index);

                if let Some(amount) = award {
                    if self.awarded.insert(index) {
                        self.report_lump(index, amount, payload);
                    } else {
                        tracing::debug!("Block {} already awarded; re-run earns nothing", index);
                    }
                }
            }
        }
        debug_assert!(self.completed.is_disjoint(&self.skipped));

        if (0..self.blocks.len()).all(|i| self.is_done(i)) {
            self.view = ViewState::AllComplete;
            tracing::info!("All {} blocks done, {} XP", self.blocks.len(), self.xp_awarded);
            return None;
        }

        // Adjacency, not section membership: a later block with the same
        // label but a different one in between goes through the hub.
        let next = index + 1;
        match self.blocks.get(next) {
            Some(block) if block.section == self.blocks[index].section => Some(next),
            _ => {
                self.view = ViewState::Hub;
                None
            }
        }
    }

    fn report_lump(
        &mut self,
        index: usize,
        amount: u32,
        payload: Option<Vec<crate::ExerciseLog>>,
    ) {
        let block = &self.blocks[index];
        let record = CompletionRecord::new(
            self.user_id.clone(),
            block.name.clone(),
            block.section.clone(),
            amount,
            block.xp_category(),
            payload,
        );
        self.report(record);
    }

    fn report_interval(
        &mut self,
        block_index: usize,
        interval_index: usize,
        interval: &Interval,
        award: u32,
    ) {
        let block = &self.blocks[block_index];
        let details = format!(
            "interval {} · {} · {}",
            interval_index + 1,
            interval.zone,
            format_clock(interval.seconds)
        );
        let record = CompletionRecord::new(
            self.user_id.clone(),
            block.name.clone(),
            details,
            award,
            XpCategory::Interval,
            None,
        );
        self.report(record);
    }

    /// Local XP total moves first; the sink result only produces a notice.
    fn report(&mut self, record: CompletionRecord) {
        self.xp_awarded += record.xp;
        tracing::info!("+{} XP for '{}' ({})", record.xp, record.label, record.category);

        if let Err(e) = self.sink.record_completion(&record) {
            tracing::warn!("Failed to record XP for '{}': {}", record.label, e);
            self.notices.push(save_failed(record.xp, &record.label, &e.to_string()));
        }
        self.collect_sink_failures();
    }

    fn collect_sink_failures(&mut self) {
        for failure in self.sink.take_failures() {
            self.notices
                .push(save_failed(failure.xp, &failure.label, &failure.reason));
        }
    }
}

fn save_failed(xp: u32, label: &str, reason: &str) -> Notice {
    Notice {
        level: NoticeLevel::Warning,
        message: format!("Could not save {} XP for {}: {}", xp, label, reason),
    }
}
