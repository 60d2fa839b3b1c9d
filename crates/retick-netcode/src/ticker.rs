//! Rollback ticker
//!
//! The `Ticker` drives one simulated entity along a continuous timeline. It
//! records the inputs that drove the entity, the states that are known to be
//! correct and any scheduled events, and re-derives the present from the last
//! confirmed state on every seek:
//!
//! ```text
//!   confirmed                       playback
//!       │ full input intervals         │  extrapolation
//!  ─────●──────●──────●──────●─────────●────▶ time
//!      t0     t1     t2     t3      target
//!       └ replayed and confirmed ┘ └ held input, without deltas ┘
//! ```
//!
//! A step that consumes a complete recorded input interval becomes the new
//! confirmed state. Anything past the newest input is extrapolated and thrown
//! away on the next seek, so late inputs are picked up automatically.

use crate::event::{ScheduledEvents, TickerEvent};
use crate::{InputPack, TickerSettings};
use bitflags::bitflags;
use retick_core::time::{ensure_finite, same_time};
use retick_core::{Seconds, Simulable, TickContext, TickInput, TIME_TOLERANCE};
use retick_history::TimeIndexedHistory;
use std::fmt;
use tracing::{debug, trace, warn};

/// Backward jump in input time treated as a desync
pub const DESYNC_THRESHOLD: Seconds = 0.2;

bitflags! {
    /// Options for a single seek
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SeekFlags: u8 {
        /// Continue from the current state instead of the confirmed one,
        /// and don't confirm any step
        const DONT_CONFIRM = 0b0000_0001;
        /// Tick every step with edge-triggered input fields stripped
        const IGNORE_DELTAS = 0b0000_0010;
    }
}

/// How a seek ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekStatus {
    /// Playback reached the target normally
    #[default]
    Completed,
    /// `max_seek_iterations` ran out; playback jumped to the target
    IterationLimit,
    /// The entity failed a tick; playback jumped to the target
    TickFailed,
    /// The target was not a finite time; nothing happened
    InvalidTarget,
}

/// Summary of one seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekReport {
    /// Loop iterations used
    pub iterations: u32,
    /// Steps that produced a new confirmed state
    pub confirmed_steps: u32,
    /// How the seek ended
    pub status: SeekStatus,
}

impl SeekReport {
    /// Check if the seek completed without hitting a limit or failure
    pub fn is_complete(&self) -> bool {
        self.status == SeekStatus::Completed
    }
}

/// What the seek loop does next
enum StepPlan<I> {
    /// Nothing recorded covers playback time; jump to the first recorded input
    SkipTo(Seconds),
    /// Tick the entity
    Tick(Step<I>),
}

struct Step<I> {
    input: I,
    delta_time: Seconds,
    /// Exact time playback lands on after the step
    end: Seconds,
    /// The step consumes one complete recorded input interval
    full_interval: bool,
}

/// Rollback engine for one simulated entity
///
/// Generic over the entity type; the entity itself stays owned by the caller
/// and is passed into every driving call. Always pass the same entity to the
/// same ticker.
pub struct Ticker<S: Simulable> {
    /// Tuning knobs
    settings: TickerSettings,
    /// Time the entity currently represents (may be extrapolated)
    playback_time: Seconds,
    /// Time of `last_confirmed_state`
    confirmed_state_time: Seconds,
    /// Last state derived only from complete input intervals
    last_confirmed_state: S::State,
    /// Recorded inputs
    input_history: TimeIndexedHistory<S::Input>,
    /// Confirmed states, for comparing against authoritative snapshots
    state_history: TimeIndexedHistory<S::State>,
    /// Scheduled one-shot events
    event_history: TimeIndexedHistory<ScheduledEvents<S>>,
    /// Edges of rate-limited inputs, carried into the next recorded one
    pending_deltas: Option<S::Input>,
}

impl<S: Simulable> Ticker<S> {
    /// Create a ticker starting at time zero from the entity's current state
    pub fn new(sim: &S, settings: TickerSettings) -> Self {
        Self::with_start_time(sim, settings, 0.0)
    }

    /// Create a ticker starting at `start_time` from the entity's current state
    ///
    /// `settings` must pass `TickerSettings::validate`; only settings loaded
    /// with `TickerSettings::from_ron_str` are checked for you. Debug builds
    /// assert it here.
    pub fn with_start_time(sim: &S, settings: TickerSettings, start_time: Seconds) -> Self {
        debug_assert!(
            settings.validate().is_ok(),
            "invalid ticker settings: {settings:?}"
        );
        let state = sim.make_state();
        let mut state_history = TimeIndexedHistory::new();
        state_history.set(start_time, state.clone(), TIME_TOLERANCE);

        Self {
            settings,
            playback_time: start_time,
            confirmed_state_time: start_time,
            last_confirmed_state: state,
            input_history: TimeIndexedHistory::new(),
            state_history,
            event_history: TimeIndexedHistory::new(),
            pending_deltas: None,
        }
    }

    /// Record a local input at `time`
    ///
    /// A backward jump of more than `DESYNC_THRESHOLD` clears all history and
    /// restarts prediction from scratch. With `max_input_rate` set, inputs
    /// arriving too soon after the last recorded one are not stored; their
    /// edge-triggered fields are carried into the next recorded input.
    pub fn push_input(&mut self, input: S::Input, time: Seconds) {
        if let Err(error) = ensure_finite(time) {
            warn!(%error, "ignoring input");
            return;
        }

        if let Some(latest) = self.input_history.latest_time() {
            if time - latest < -DESYNC_THRESHOLD {
                warn!(time, latest, "input time jumped backwards, clearing history");
                self.clear_history();
            }
        }

        let latest = self.input_history.latest_time();
        let accepted = match (self.settings.min_input_interval(), latest) {
            (Some(interval), Some(latest)) => time - latest >= interval - TIME_TOLERANCE,
            _ => true,
        };

        let input = match self.pending_deltas.take() {
            Some(carried) => input.with_deltas(&carried),
            None => input,
        };

        if accepted {
            self.input_history.set(time, input, TIME_TOLERANCE);
        } else {
            trace!(time, "input rate limited, carrying its deltas");
            self.pending_deltas = Some(input);
        }

        self.prune_history();
    }

    /// Merge a remote owner's recent inputs into the history
    pub fn push_input_pack(&mut self, pack: InputPack<S::Input>) {
        let count = pack.len();
        for entry in pack {
            if !entry.time.is_finite() {
                warn!(time = entry.time, "dropping packed input with a non-finite timestamp");
                continue;
            }
            self.input_history.set(entry.time, entry.input, TIME_TOLERANCE);
        }
        trace!(count, "merged input pack");

        self.prune_history();
    }

    /// Pack the inputs recorded within `max_length` of the newest one
    pub fn make_input_pack(&self, max_length: Seconds) -> InputPack<S::Input> {
        InputPack::from_history(&self.input_history, max_length)
    }

    /// Mark the entity's current state as trustworthy at `playback_time`
    pub fn confirm_current_state(&mut self, sim: &S) {
        let state = sim.make_state();
        self.state_history
            .set(self.playback_time, state.clone(), TIME_TOLERANCE);
        self.last_confirmed_state = state;
        self.confirmed_state_time = self.playback_time;
    }

    /// Schedule a one-shot event at the current playback time
    ///
    /// Events already scheduled at exactly the same time are kept; all of them fire.
    pub fn call_event<F>(&mut self, event: F)
    where
        F: FnMut(&mut S, &TickContext) + Send + 'static,
    {
        let time = self.playback_time;
        let event: TickerEvent<S> = Box::new(event);
        match self
            .event_history
            .index_at(time, 0.0)
            .and_then(|index| self.event_history.value_at_mut(index))
        {
            Some(events) => events.merge(event),
            None => {
                self.event_history.insert(time, ScheduledEvents::new(event));
            }
        }
    }

    /// Advance the entity to `target_time`
    ///
    /// Unless `DONT_CONFIRM` is given, any extrapolation is discarded first and
    /// the entity is replayed from the last confirmed state. Steps starting at
    /// or after `realtime_playback_time` are flagged as realtime. Playback
    /// always ends exactly on the target, even when the iteration limit is
    /// hit or the entity fails a tick.
    pub fn seek(
        &mut self,
        sim: &mut S,
        target_time: Seconds,
        realtime_playback_time: Seconds,
        flags: SeekFlags,
    ) -> SeekReport {
        let mut report = SeekReport::default();
        if let Err(error) = ensure_finite(target_time) {
            warn!(%error, "refusing to seek");
            report.status = SeekStatus::InvalidTarget;
            return report;
        }

        let confirming = !flags.contains(SeekFlags::DONT_CONFIRM);
        let mut target_time = target_time;
        if confirming {
            sim.apply_state(&self.last_confirmed_state);
            self.playback_time = self.confirmed_state_time;
        }
        if target_time < self.confirmed_state_time {
            debug!(
                target_time,
                confirmed_state_time = self.confirmed_state_time,
                "seek target is behind the confirmed state"
            );
            target_time = self.confirmed_state_time;
        }

        while self.playback_time < target_time {
            if report.iterations >= self.settings.max_seek_iterations {
                warn!(
                    iterations = report.iterations,
                    playback_time = self.playback_time,
                    target_time,
                    "seek hit the iteration limit, jumping to target"
                );
                report.status = SeekStatus::IterationLimit;
                break;
            }
            report.iterations += 1;

            let step = match self.plan_step(target_time, flags) {
                StepPlan::SkipTo(time) => {
                    trace!(
                        from = self.playback_time,
                        to = time,
                        "no input recorded yet, skipping ahead"
                    );
                    // events in the skipped stretch still fire, without a tick
                    let ctx = TickContext {
                        time: self.playback_time,
                        delta_time: time - self.playback_time,
                        is_realtime: false,
                        is_confirming: false,
                    };
                    self.fire_events(sim, &ctx, time);
                    self.playback_time = time;
                    continue;
                }
                StepPlan::Tick(step) => step,
            };

            let start = self.playback_time;
            let is_confirming = step.full_interval && confirming;
            let ctx = TickContext {
                time: start,
                delta_time: step.delta_time,
                is_realtime: is_confirming && start + TIME_TOLERANCE >= realtime_playback_time,
                is_confirming,
            };

            self.fire_events(sim, &ctx, step.end);

            if let Err(error) = sim.tick(&step.input, &ctx) {
                warn!(%error, time = start, "entity tick failed, abandoning seek");
                report.status = SeekStatus::TickFailed;
                break;
            }

            self.playback_time = step.end;
            if is_confirming {
                self.confirm_current_state(sim);
                report.confirmed_steps += 1;
            }
        }

        self.playback_time = target_time;
        self.prune_history();

        report
    }

    /// Advance the entity by `delta_time` from the current playback time
    pub fn seek_by(
        &mut self,
        sim: &mut S,
        delta_time: Seconds,
        realtime_playback_time: Seconds,
    ) -> SeekReport {
        let target_time = self.playback_time + delta_time;
        self.seek(sim, target_time, realtime_playback_time, SeekFlags::empty())
    }

    /// Decide the next step of a seek towards `target_time`
    fn plan_step(&self, target_time: Seconds, flags: SeekFlags) -> StepPlan<S::Input> {
        let playback = self.playback_time;
        let remaining = target_time - playback;
        let max_delta = self.settings.max_delta_time;

        // extrapolation length, avoiding a sliver step right before the target
        let (delta_time, end) = if remaining <= max_delta + TIME_TOLERANCE {
            (remaining, target_time)
        } else {
            (max_delta, playback + max_delta)
        };

        let current = self
            .input_history
            .closest_index_before(playback, TIME_TOLERANCE)
            .and_then(|index| self.input_history.get(index).map(|item| (index, item)));

        let Some((index, current)) = current else {
            let first_input = self
                .input_history
                .closest_index_after(playback, TIME_TOLERANCE)
                .and_then(|index| self.input_history.time_at(index));
            if let Some(time) = first_input.filter(|time| *time < target_time) {
                return StepPlan::SkipTo(time);
            }

            let input = self
                .input_history
                .latest()
                .map(|item| item.value.without_deltas())
                .unwrap_or_default();
            return StepPlan::Tick(Step {
                input,
                delta_time,
                end,
                full_interval: false,
            });
        };

        let next_time = index
            .checked_sub(1)
            .and_then(|next| self.input_history.time_at(next));

        if let Some(next) = next_time {
            if same_time(playback, current.time, TIME_TOLERANCE) && next <= target_time {
                let input = if flags.contains(SeekFlags::IGNORE_DELTAS) {
                    current.value.without_deltas()
                } else {
                    current.value.clone()
                };
                // tick the recorded interval itself so every peer steps identically
                return StepPlan::Tick(Step {
                    input,
                    delta_time: next - current.time,
                    end: next,
                    full_interval: true,
                });
            }

            let gap = next - playback;
            if gap <= delta_time {
                return StepPlan::Tick(Step {
                    input: current.value.without_deltas(),
                    delta_time: gap,
                    end: next,
                    full_interval: false,
                });
            }
        }

        StepPlan::Tick(Step {
            input: current.value.without_deltas(),
            delta_time,
            end,
            full_interval: false,
        })
    }

    /// Fire the events scheduled in `[ctx.time, end)`
    fn fire_events(&mut self, sim: &mut S, ctx: &TickContext, end: Seconds) {
        for (time, events) in self.event_history.range_mut(ctx.time, end) {
            trace!(time, count = events.len(), "firing scheduled events");
            events.fire(sim, ctx);
        }
    }

    /// Drop history older than `history_length` behind playback
    ///
    /// The newest input always survives so extrapolation has something to hold.
    fn prune_history(&mut self) {
        let min_time = self.playback_time - self.settings.history_length;
        self.input_history.prune_keep_latest(min_time);
        self.state_history.prune(min_time);
        self.event_history.prune(min_time);
    }

    /// Forget all recorded inputs, states and events
    pub fn clear_history(&mut self) {
        self.input_history.clear();
        self.state_history.clear();
        self.event_history.clear();
        self.pending_deltas = None;
    }

    /// Restart the ticker at `time` from the entity's current state
    ///
    /// Used after teleports or respawns, where the previous timeline is void.
    pub fn reset(&mut self, sim: &S, time: Seconds) {
        self.clear_history();
        self.playback_time = time;
        self.confirm_current_state(sim);
    }

    /// Current playback time
    pub fn playback_time(&self) -> Seconds {
        self.playback_time
    }

    /// Time of the last confirmed state
    pub fn confirmed_state_time(&self) -> Seconds {
        self.confirmed_state_time
    }

    /// Last confirmed state
    pub fn last_confirmed_state(&self) -> &S::State {
        &self.last_confirmed_state
    }

    /// How far playback runs ahead of the confirmed state
    pub fn prediction_lag(&self) -> Seconds {
        self.playback_time - self.confirmed_state_time
    }

    /// Confirmed state recorded at `time`, if still kept
    pub fn recorded_state(&self, time: Seconds) -> Option<&S::State> {
        self.state_history
            .index_at(time, TIME_TOLERANCE)
            .and_then(|index| self.state_history.value_at(index))
    }

    /// Most recently recorded input
    pub fn latest_input(&self) -> Option<&S::Input> {
        self.input_history.latest().map(|item| &item.value)
    }

    /// Recorded inputs
    pub fn input_history(&self) -> &TimeIndexedHistory<S::Input> {
        &self.input_history
    }

    /// Confirmed states
    pub fn state_history(&self) -> &TimeIndexedHistory<S::State> {
        &self.state_history
    }

    /// Number of scheduled event callbacks
    pub fn scheduled_event_count(&self) -> usize {
        self.event_history.iter().map(|item| item.value.len()).sum()
    }

    /// Get the settings
    pub fn settings(&self) -> &TickerSettings {
        &self.settings
    }

    /// Get mutable access to the settings
    ///
    /// Changed values are not validated; keep them within what
    /// `TickerSettings::validate` accepts.
    pub fn settings_mut(&mut self) -> &mut TickerSettings {
        &mut self.settings
    }

    /// Replace the confirmed state and move playback onto it
    pub(crate) fn set_confirmed(&mut self, state: S::State, time: Seconds) {
        self.state_history.set(time, state.clone(), TIME_TOLERANCE);
        self.last_confirmed_state = state;
        self.confirmed_state_time = time;
        self.playback_time = time;
    }
}

impl<S: Simulable> fmt::Debug for Ticker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("playback_time", &self.playback_time)
            .field("confirmed_state_time", &self.confirmed_state_time)
            .field("last_confirmed_state", &self.last_confirmed_state)
            .field("inputs", &self.input_history.stats())
            .field("states", &self.state_history.stats())
            .field("events", &self.event_history.stats())
            .finish()
    }
}
