//! Shared fixtures for ticker tests

use crate::TickerSettings;
use retick_core::{state_diff, Simulable, TickContext, TickInput};
use serde::{Deserialize, Serialize};

/// Test input: a held velocity plus a "jump" edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub velocity: f64,
    pub jump: bool,
    pub fail: bool,
}

impl TickInput for Move {
    fn with_deltas(&self, previous: &Self) -> Self {
        Self {
            jump: self.jump || previous.jump,
            ..self.clone()
        }
    }

    fn without_deltas(&self) -> Self {
        Self {
            jump: false,
            ..self.clone()
        }
    }
}

pub fn moving(velocity: f64) -> Move {
    Move {
        velocity,
        ..Default::default()
    }
}

pub fn jumping(velocity: f64) -> Move {
    Move {
        velocity,
        jump: true,
        fail: false,
    }
}

pub fn failing() -> Move {
    Move {
        fail: true,
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub position: f64,
    pub jumps: u32,
}

state_diff!(BodyState { position, jumps });

/// Everything the body saw in one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub ctx: TickContext,
    pub input: Move,
}

/// One-dimensional body integrating its velocity
#[derive(Debug, Default)]
pub struct Body {
    pub position: f64,
    pub jumps: u32,
    /// Instrumentation only, not part of the simulated state
    pub ticks: Vec<TickRecord>,
}

impl Simulable for Body {
    type Input = Move;
    type State = BodyState;
    type Error = String;

    fn make_state(&self) -> BodyState {
        BodyState {
            position: self.position,
            jumps: self.jumps,
        }
    }

    fn apply_state(&mut self, state: &BodyState) {
        self.position = state.position;
        self.jumps = state.jumps;
    }

    fn tick(&mut self, input: &Move, ctx: &TickContext) -> Result<(), String> {
        self.ticks.push(TickRecord {
            ctx: *ctx,
            input: input.clone(),
        });
        if input.fail {
            return Err(format!("refusing to step at t={}", ctx.time));
        }
        self.position += input.velocity * ctx.delta_time;
        if input.jump {
            self.jumps += 1;
        }
        Ok(())
    }
}

/// Time of the i-th input, computed the same way everywhere in the tests
pub fn t(i: u32) -> f64 {
    i as f64 * 0.1
}

pub fn settings() -> TickerSettings {
    TickerSettings {
        max_delta_time: 0.05,
        max_seek_iterations: 64,
        max_input_rate: 0.0,
        history_length: 10.0,
        always_reconcile: false,
        debug_log_reconciles: false,
    }
}
