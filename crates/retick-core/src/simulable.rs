//! Simulable entity contract
//!
//! A type that wants to be predicted and reconciled implements `Simulable`.
//! The rollback engine never looks inside the entity: it only snapshots it,
//! restores snapshots and advances it one step at a time.
//!
//! # Example
//!
//! ```rust
//! use retick_core::{Simulable, StateDiff, TickContext, TickInput};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Thrust {
//!     power: f64,
//!     boost_pressed: bool,
//! }
//!
//! impl TickInput for Thrust {
//!     fn with_deltas(&self, previous: &Self) -> Self {
//!         Self {
//!             boost_pressed: self.boost_pressed || previous.boost_pressed,
//!             ..self.clone()
//!         }
//!     }
//!
//!     fn without_deltas(&self) -> Self {
//!         Self {
//!             boost_pressed: false,
//!             ..self.clone()
//!         }
//!     }
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct ShipState {
//!     x: f64,
//! }
//!
//! impl StateDiff for ShipState {}
//!
//! struct Ship {
//!     x: f64,
//! }
//!
//! impl Simulable for Ship {
//!     type Input = Thrust;
//!     type State = ShipState;
//!     type Error = std::convert::Infallible;
//!
//!     fn make_state(&self) -> ShipState {
//!         ShipState { x: self.x }
//!     }
//!
//!     fn apply_state(&mut self, state: &ShipState) {
//!         self.x = state.x;
//!     }
//!
//!     fn tick(&mut self, input: &Thrust, ctx: &TickContext) -> Result<(), Self::Error> {
//!         self.x += input.power * ctx.delta_time;
//!         Ok(())
//!     }
//! }
//! ```

use crate::{Seconds, StateDiff};
use std::fmt;

/// Input consumed by a simulable entity
///
/// Inputs may carry edge-triggered fields ("jump pressed this frame") next to
/// held fields ("move left"). Edges must fire exactly once on the recorded
/// timeline, which the two methods below make possible.
pub trait TickInput: Clone + Default + fmt::Debug {
    /// Merge the edge-triggered fields of `previous` into this input.
    ///
    /// Used when an earlier input never made it into the history (for example
    /// because of input rate limiting), so its edges are not lost.
    fn with_deltas(&self, previous: &Self) -> Self;

    /// Strip edge-triggered fields, keeping only held state.
    ///
    /// Used when an input is held steady while extrapolating, so an edge that
    /// already happened is not fired again.
    fn without_deltas(&self) -> Self;
}

/// Explicit context handed to every simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Simulation time at the start of this step
    pub time: Seconds,
    /// Length of this step
    pub delta_time: Seconds,
    /// True when this step covers time that has not been simulated before.
    ///
    /// Replays of already-happened time pass `false`, letting the entity skip
    /// one-shot side effects such as sounds or particles.
    pub is_realtime: bool,
    /// True when this step consumes a complete recorded input interval and
    /// its result will become the confirmed state
    pub is_confirming: bool,
}

impl TickContext {
    /// Context for a single free-standing step (tests, tools)
    pub fn realtime(time: Seconds, delta_time: Seconds) -> Self {
        Self {
            time,
            delta_time,
            is_realtime: true,
            is_confirming: false,
        }
    }

    /// Simulation time at the end of this step
    pub fn end_time(&self) -> Seconds {
        self.time + self.delta_time
    }
}

/// An entity that can be predicted, rolled back and replayed.
///
/// `make_state` and `apply_state` must be exact inverses, and `tick` must be a
/// pure function of the current entity state, the input and the context.
pub trait Simulable {
    /// Input driving the entity
    type Input: TickInput;

    /// Snapshot of everything `tick` depends on
    type State: Clone + PartialEq + fmt::Debug + StateDiff;

    /// Error raised by a failed step
    type Error: fmt::Display;

    /// Snapshot the current simulation state.
    fn make_state(&self) -> Self::State;

    /// Restore a snapshot previously produced by `make_state`.
    fn apply_state(&mut self, state: &Self::State);

    /// Advance the entity by `ctx.delta_time` using `input`.
    fn tick(&mut self, input: &Self::Input, ctx: &TickContext) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Buttons {
        held: bool,
        pressed: bool,
    }

    impl TickInput for Buttons {
        fn with_deltas(&self, previous: &Self) -> Self {
            Self {
                held: self.held,
                pressed: self.pressed || previous.pressed,
            }
        }

        fn without_deltas(&self) -> Self {
            Self {
                held: self.held,
                pressed: false,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct CounterState(u32);

    impl StateDiff for CounterState {}

    struct Counter {
        presses: u32,
    }

    impl Simulable for Counter {
        type Input = Buttons;
        type State = CounterState;
        type Error = String;

        fn make_state(&self) -> CounterState {
            CounterState(self.presses)
        }

        fn apply_state(&mut self, state: &CounterState) {
            self.presses = state.0;
        }

        fn tick(&mut self, input: &Buttons, ctx: &TickContext) -> Result<(), String> {
            if ctx.delta_time < 0.0 {
                return Err("negative step".to_string());
            }
            if input.pressed {
                self.presses += 1;
            }
            Ok(())
        }
    }

    #[test]
    fn test_deltas() {
        let earlier = Buttons {
            held: false,
            pressed: true,
        };
        let now = Buttons {
            held: true,
            pressed: false,
        };

        let merged = now.with_deltas(&earlier);
        assert!(merged.held);
        assert!(merged.pressed);

        let steady = merged.without_deltas();
        assert!(steady.held);
        assert!(!steady.pressed);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut counter = Counter { presses: 0 };
        let snapshot = counter.make_state();

        let press = Buttons {
            held: false,
            pressed: true,
        };
        counter.tick(&press, &TickContext::realtime(0.0, 0.1)).unwrap();
        assert_eq!(counter.presses, 1);

        counter.apply_state(&snapshot);
        assert_eq!(counter.make_state(), CounterState(0));
    }

    #[test]
    fn test_tick_error() {
        let mut counter = Counter { presses: 0 };
        let result = counter.tick(&Buttons::default(), &TickContext::realtime(0.0, -1.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_context_end_time() {
        let ctx = TickContext::realtime(1.0, 0.25);
        assert_eq!(ctx.end_time(), 1.25);
        assert!(ctx.is_realtime);
        assert!(!ctx.is_confirming);
    }
}
