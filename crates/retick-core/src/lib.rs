//! Retick Core - Contracts shared by the retick rollback engine
//!
//! This crate provides the engine-agnostic pieces every other retick crate
//! builds on:
//! - Continuous simulation time (`Seconds`) and tolerance-based comparisons
//! - The `Simulable` entity contract (snapshot, restore, tick)
//! - The `TickInput` contract for edge-triggered input fields
//! - `TickContext`, the explicit per-step simulation context
//! - `StateDiff` and the `state_diff!` macro for reconciliation debugging
//!
//! ## Determinism
//!
//! Rollback only converges when replaying the same inputs from the same
//! snapshot yields bit-identical results. `Simulable::tick` therefore receives
//! everything it may depend on explicitly: its own state, the input and a
//! `TickContext`. Reading ambient global state from inside `tick` breaks
//! reconciliation.

mod diff;
mod error;
mod simulable;
pub mod time;

pub use diff::{format_diffs, FieldDiff, StateDiff};
pub use error::{Error, Result};
pub use simulable::{Simulable, TickContext, TickInput};
pub use time::{FixedStepClock, Seconds, TIME_TOLERANCE};
