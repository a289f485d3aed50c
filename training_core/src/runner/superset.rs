//! Superset runner: every exercise once per round, shared rest between rounds.

use crate::rest_timer::RestTimer;
use crate::{
    parse_weight, BlockOutcome, Error, ExerciseLog, Reps, Result, SetRecord, SupersetSpec,
};

#[derive(Debug, Clone)]
pub struct SupersetRunner {
    spec: SupersetSpec,
    /// `[exercise][round]`
    done: Vec<Vec<bool>>,
    weights: Vec<Vec<String>>,
    rest: RestTimer,
    rest_seconds: u32,
}

impl SupersetRunner {
    pub fn new(spec: SupersetSpec, rest_seconds: u32, cue_seconds: u32) -> Self {
        let rounds = spec.sets as usize;
        let exercises = spec.exercises.len();
        Self {
            spec,
            done: vec![vec![false; rounds]; exercises],
            weights: vec![vec![String::new(); rounds]; exercises],
            rest: RestTimer::new(cue_seconds),
            rest_seconds,
        }
    }

    pub fn spec(&self) -> &SupersetSpec {
        &self.spec
    }

    pub fn rounds(&self) -> usize {
        self.spec.sets as usize
    }

    pub fn is_done(&self, exercise: usize, round: usize) -> bool {
        self.done
            .get(exercise)
            .and_then(|rounds| rounds.get(round))
            .copied()
            .unwrap_or(false)
    }

    pub fn weight(&self, exercise: usize, round: usize) -> Option<&str> {
        self.weights
            .get(exercise)
            .and_then(|rounds| rounds.get(round))
            .map(String::as_str)
    }

    /// Every exercise has this round marked.
    pub fn is_round_complete(&self, round: usize) -> bool {
        round < self.rounds() && self.done.iter().all(|rounds| rounds[round])
    }

    pub fn all_done(&self) -> bool {
        self.done.iter().all(|rounds| rounds.iter().all(|d| *d))
    }

    pub fn rest(&self) -> &RestTimer {
        &self.rest
    }

    pub(crate) fn rest_mut(&mut self) -> &mut RestTimer {
        &mut self.rest
    }

    /// Flip one cell. The toggle that completes a non-final round starts the rest.
    pub fn toggle(&mut self, exercise: usize, round: usize) -> Result<()> {
        self.check_cell(exercise, round)?;
        let marked = {
            let cell = &mut self.done[exercise][round];
            *cell = !*cell;
            *cell
        };

        if marked && self.is_round_complete(round) && round + 1 < self.rounds() {
            self.rest.start(self.rest_seconds);
            tracing::debug!(
                "Superset round {} complete, resting {}s",
                round + 1,
                self.rest_seconds
            );
        }
        Ok(())
    }

    pub fn set_weight(&mut self, exercise: usize, round: usize, text: &str) -> Result<()> {
        self.check_cell(exercise, round)?;
        self.weights[exercise][round] = text.to_string();
        Ok(())
    }

    /// Available once every cell is done. Payload is grouped by exercise.
    pub fn complete(&mut self) -> Result<BlockOutcome> {
        if !self.all_done() {
            return Err(Error::intent("superset has rounds still open"));
        }
        self.rest.skip();

        let logs = self
            .spec
            .exercises
            .iter()
            .enumerate()
            .map(|(e, exercise)| {
                let reps = exercise.reps.as_ref().map(Reps::resolve).unwrap_or(0);
                let sets = (0..self.rounds())
                    .filter(|r| self.done[e][*r])
                    .map(|r| SetRecord {
                        weight: parse_weight(&self.weights[e][r]),
                        reps,
                    })
                    .collect();
                ExerciseLog {
                    name: exercise.name.clone(),
                    sets,
                }
            })
            .collect();

        Ok(BlockOutcome::Completed {
            payload: Some(logs),
        })
    }

    fn check_cell(&self, exercise: usize, round: usize) -> Result<()> {
        if exercise >= self.done.len() || round >= self.rounds() {
            return Err(Error::intent(format!(
                "no exercise {} / round {} in this superset",
                exercise, round
            )));
        }
        Ok(())
    }
}
