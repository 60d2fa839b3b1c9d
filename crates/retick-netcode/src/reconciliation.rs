//! Server reconciliation
//!
//! When an authoritative snapshot arrives for a past time, it is compared
//! with the state this ticker confirmed for that time. A mismatch means the
//! prediction diverged: the snapshot becomes the new confirmed state and the
//! entity is replayed from there up to where it was.
//!
//! ```text
//! Predicted:  ●──●──●──●──●──●   playback
//!                   │
//!          server says "wrong at t2"
//!                   ▼
//! Replayed:         ●──●──●──●   back at playback
//! ```

use crate::ticker::{SeekFlags, Ticker};
use retick_core::{format_diffs, Seconds, Simulable, StateDiff};
use tracing::{debug, info, warn};

impl<S: Simulable> Ticker<S> {
    /// Adopt an authoritative state at `time` if it differs from the prediction
    ///
    /// Returns `true` when the state was applied. In that case the entity now
    /// holds `state`, and both playback and confirmed time are `time`. When the
    /// state matches what was confirmed for `time` (and `always_reconcile` is
    /// off) nothing changes.
    pub fn rewind(&mut self, sim: &mut S, state: S::State, time: Seconds) -> bool {
        if !time.is_finite() {
            warn!(time, "ignoring authoritative state with a non-finite timestamp");
            return false;
        }

        let predicted = self.recorded_state(time);
        if !self.settings().always_reconcile && predicted == Some(&state) {
            debug!(time, "prediction matched authoritative state");
            return false;
        }

        match predicted {
            Some(predicted) if self.settings().debug_log_reconciles => {
                let diffs = predicted.diff(&state);
                info!(time, diff = %format_diffs(&diffs), "correcting prediction");
            }
            Some(_) => debug!(time, "correcting prediction"),
            None => debug!(time, "no prediction recorded, adopting authoritative state"),
        }

        sim.apply_state(&state);
        self.set_confirmed(state, time);
        true
    }

    /// Rewind to an authoritative state, then replay back to the present
    ///
    /// The present is whichever is later: the playback time before the call
    /// or `time` itself. Returns whether a correction happened.
    pub fn reconcile(&mut self, sim: &mut S, past_state: S::State, time: Seconds) -> bool {
        let original_time = self.playback_time();
        if !self.rewind(sim, past_state, time) {
            return false;
        }

        let report = self.seek(sim, original_time.max(time), original_time, SeekFlags::empty());
        if !report.is_complete() {
            warn!(status = ?report.status, "replay after reconciliation did not complete");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use approx::assert_relative_eq;
    use test_log::test;

    /// Ticker that predicted t(0)..t(5) with velocities 1..6
    fn predicted() -> (Body, Ticker<Body>) {
        let mut body = Body::default();
        let mut ticker = Ticker::new(&body, settings());
        for i in 0..=5 {
            ticker.push_input(moving(1.0 + i as f64), t(i));
        }
        ticker.seek(&mut body, t(5), t(5), SeekFlags::empty());
        (body, ticker)
    }

    #[test]
    fn test_matching_rewind_is_a_no_op() {
        let (mut body, mut ticker) = predicted();
        let state = ticker.recorded_state(t(2)).unwrap().clone();
        let before = body.make_state();

        assert!(!ticker.rewind(&mut body, state, t(2)));

        assert_eq!(body.make_state(), before);
        assert_eq!(ticker.playback_time(), t(5));
        assert_eq!(ticker.confirmed_state_time(), t(5));
    }

    #[test]
    fn test_diverged_rewind_applies_state() {
        let (mut body, mut ticker) = predicted();
        let state = BodyState {
            position: 9.0,
            jumps: 0,
        };

        assert!(ticker.rewind(&mut body, state.clone(), t(2)));

        assert_eq!(body.make_state(), state);
        assert_eq!(ticker.playback_time(), t(2));
        assert_eq!(ticker.confirmed_state_time(), t(2));
        assert_eq!(ticker.last_confirmed_state(), &state);
        assert_eq!(ticker.recorded_state(t(2)), Some(&state));
    }

    #[test]
    fn test_always_reconcile_forces_rewind() {
        let (mut body, mut ticker) = predicted();
        ticker.settings_mut().always_reconcile = true;
        let state = ticker.recorded_state(t(2)).unwrap().clone();

        assert!(ticker.rewind(&mut body, state, t(2)));
        assert_eq!(ticker.playback_time(), t(2));
    }

    #[test]
    fn test_rewind_without_prediction() {
        let (mut body, mut ticker) = predicted();
        let state = BodyState {
            position: 0.25,
            jumps: 0,
        };

        assert!(ticker.rewind(&mut body, state, 0.25));
        assert_eq!(ticker.confirmed_state_time(), 0.25);
    }

    #[test]
    fn test_rewind_rejects_non_finite_time() {
        let (mut body, mut ticker) = predicted();
        let state = body.make_state();
        assert!(!ticker.rewind(&mut body, state, f64::INFINITY));
        assert_eq!(ticker.playback_time(), t(5));
    }

    #[test]
    fn test_reconcile_with_matching_state_keeps_prediction() {
        let (mut body, mut ticker) = predicted();
        let before = body.make_state();
        let state = ticker.recorded_state(t(2)).unwrap().clone();

        assert!(!ticker.reconcile(&mut body, state, t(2)));

        assert_eq!(body.position.to_bits(), before.position.to_bits());
        assert_eq!(ticker.playback_time(), t(5));
    }

    #[test]
    fn test_forced_reconcile_converges_to_same_state() {
        let (mut body, mut ticker) = predicted();
        ticker.settings_mut().always_reconcile = true;
        let before = body.make_state();
        let state = ticker.recorded_state(t(2)).unwrap().clone();

        assert!(ticker.reconcile(&mut body, state, t(2)));

        assert_eq!(body.position.to_bits(), before.position.to_bits());
        assert_eq!(ticker.playback_time(), t(5));
        assert_eq!(ticker.confirmed_state_time(), t(5));
    }

    #[test]
    fn test_reconcile_replays_correction() {
        let (mut body, mut ticker) = predicted();
        assert_relative_eq!(body.position, 1.5, epsilon = 1e-9);

        let predicted_at_t2 = ticker.recorded_state(t(2)).unwrap().position;
        let state = BodyState {
            position: predicted_at_t2 + 1.0,
            jumps: 0,
        };

        assert!(ticker.reconcile(&mut body, state, t(2)));

        assert_relative_eq!(body.position, 2.5, epsilon = 1e-9);
        assert_eq!(ticker.playback_time(), t(5));
        assert_eq!(ticker.confirmed_state_time(), t(5));
    }

    #[test]
    fn test_reconcile_ahead_of_playback() {
        let (mut body, mut ticker) = predicted();
        let state = BodyState {
            position: 4.0,
            jumps: 2,
        };

        assert!(ticker.reconcile(&mut body, state.clone(), t(7)));

        assert_eq!(ticker.playback_time(), t(7));
        assert_eq!(body.make_state(), state);
    }

    #[test]
    fn test_reconcile_with_diff_logging() {
        let (mut body, mut ticker) = predicted();
        ticker.settings_mut().debug_log_reconciles = true;
        let state = BodyState {
            position: -1.0,
            jumps: 3,
        };

        assert!(ticker.reconcile(&mut body, state, t(3)));
        assert_eq!(body.jumps, 3);
        assert_eq!(ticker.playback_time(), t(5));
    }
}
