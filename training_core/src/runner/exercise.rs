//! Straight-sets runner.

use crate::rest_timer::RestTimer;
use crate::{parse_weight, BlockOutcome, Error, ExerciseLog, ExerciseSpec, Result, SetRecord};

#[derive(Debug, Clone)]
pub struct ExerciseRunner {
    name: String,
    spec: ExerciseSpec,
    done: Vec<bool>,
    weights: Vec<String>,
    rest: RestTimer,
    rest_seconds: u32,
}

impl ExerciseRunner {
    pub fn new(name: &str, spec: ExerciseSpec, rest_seconds: u32, cue_seconds: u32) -> Self {
        let sets = spec.sets as usize;
        Self {
            name: name.to_string(),
            spec,
            done: vec![false; sets],
            weights: vec![String::new(); sets],
            rest: RestTimer::new(cue_seconds),
            rest_seconds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &ExerciseSpec {
        &self.spec
    }

    pub fn sets(&self) -> usize {
        self.done.len()
    }

    pub fn is_set_done(&self, set: usize) -> bool {
        self.done.get(set).copied().unwrap_or(false)
    }

    pub fn weight(&self, set: usize) -> Option<&str> {
        self.weights.get(set).map(String::as_str)
    }

    pub fn all_done(&self) -> bool {
        self.done.iter().all(|d| *d)
    }

    pub fn rest(&self) -> &RestTimer {
        &self.rest
    }

    pub(crate) fn rest_mut(&mut self) -> &mut RestTimer {
        &mut self.rest
    }

    /// Flip a set. Completing any set but the last starts the rest countdown;
    /// un-completing a set cancels it.
    pub fn toggle_set(&mut self, set: usize) -> Result<()> {
        let sets = self.done.len();
        let flag = self
            .done
            .get_mut(set)
            .ok_or_else(|| Error::intent(format!("set {} out of range (0..{})", set, sets)))?;
        *flag = !*flag;

        if *flag {
            if set + 1 < sets {
                self.rest.start(self.rest_seconds);
                tracing::debug!("{}: set {} done, resting {}s", self.name, set + 1, self.rest_seconds);
            }
        } else {
            self.rest.skip();
            tracing::debug!("{}: set {} reopened", self.name, set + 1);
        }
        Ok(())
    }

    pub fn set_weight(&mut self, set: usize, text: &str) -> Result<()> {
        let sets = self.weights.len();
        let slot = self
            .weights
            .get_mut(set)
            .ok_or_else(|| Error::intent(format!("set {} out of range (0..{})", set, sets)))?;
        *slot = text.to_string();
        Ok(())
    }

    /// Available once every set is done.
    pub fn complete(&mut self) -> Result<BlockOutcome> {
        if !self.all_done() {
            let remaining = self.done.iter().filter(|d| !**d).count();
            return Err(Error::intent(format!(
                "{} set(s) of {} still open",
                remaining, self.name
            )));
        }
        self.rest.skip();

        let sets = self
            .done
            .iter()
            .enumerate()
            .filter(|(_, done)| **done)
            .map(|(i, _)| SetRecord {
                weight: parse_weight(&self.weights[i]),
                reps: self.spec.reps_for_set(i),
            })
            .collect();

        Ok(BlockOutcome::Completed {
            payload: Some(vec![ExerciseLog {
                name: self.name.clone(),
                sets,
            }]),
        })
    }
}
