//! The simulated runner

use retick_core::{state_diff, Simulable, TickContext, TickInput};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

const RUN_SPEED: f64 = 4.0;
const JUMP_SPEED: f64 = 5.0;
const GRAVITY: f64 = -9.8;

/// Player controls sampled once per fixed step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// Held run direction in `[-1, 1]`
    pub run: f64,
    /// Jump pressed since the last sample
    pub jump: bool,
}

impl TickInput for Controls {
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

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerState {
    pub x: f64,
    pub y: f64,
    pub vy: f64,
}

state_diff!(RunnerState { x, y, vy });

/// A runner on flat ground
#[derive(Debug, Default)]
pub struct Runner {
    pub x: f64,
    pub y: f64,
    pub vy: f64,
}

impl Runner {
    pub fn grounded(&self) -> bool {
        self.y <= 0.0
    }
}

impl Simulable for Runner {
    type Input = Controls;
    type State = RunnerState;
    type Error = Infallible;

    fn make_state(&self) -> RunnerState {
        RunnerState {
            x: self.x,
            y: self.y,
            vy: self.vy,
        }
    }

    fn apply_state(&mut self, state: &RunnerState) {
        self.x = state.x;
        self.y = state.y;
        self.vy = state.vy;
    }

    fn tick(&mut self, input: &Controls, ctx: &TickContext) -> Result<(), Infallible> {
        if input.jump && self.grounded() {
            self.vy = JUMP_SPEED;
        }
        self.vy += GRAVITY * ctx.delta_time;
        self.x += input.run.clamp(-1.0, 1.0) * RUN_SPEED * ctx.delta_time;
        self.y = (self.y + self.vy * ctx.delta_time).max(0.0);
        if self.grounded() {
            self.vy = 0.0;
        }
        Ok(())
    }
}
