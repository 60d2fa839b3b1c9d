//! Scheduled one-shot events
//!
//! Events are callbacks pinned to a point on the simulation timeline. They run
//! whenever a seek steps across their timestamp, including replays, so they
//! must only mutate the entity deterministically.

use retick_core::TickContext;

/// Callback fired when playback crosses its timestamp
pub type TickerEvent<S> = Box<dyn FnMut(&mut S, &TickContext) + Send>;

/// All events scheduled at one timestamp, in scheduling order
pub struct ScheduledEvents<S> {
    callbacks: Vec<TickerEvent<S>>,
}

impl<S> ScheduledEvents<S> {
    /// Start a list with a single event
    pub fn new(event: TickerEvent<S>) -> Self {
        Self {
            callbacks: vec![event],
        }
    }

    /// Merge another event into this timestamp; both will fire
    pub fn merge(&mut self, event: TickerEvent<S>) {
        self.callbacks.push(event);
    }

    /// Fire every event in scheduling order
    pub fn fire(&mut self, sim: &mut S, ctx: &TickContext) {
        for callback in &mut self.callbacks {
            callback(sim, ctx);
        }
    }

    /// Number of merged events
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if no event is scheduled
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<S> std::fmt::Debug for ScheduledEvents<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledEvents")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fires_in_order() {
        let mut events: ScheduledEvents<Vec<&'static str>> =
            ScheduledEvents::new(Box::new(|log, _| log.push("first")));
        events.merge(Box::new(|log, _| log.push("second")));
        assert_eq!(events.len(), 2);

        let mut log = Vec::new();
        events.fire(&mut log, &TickContext::realtime(0.0, 0.1));
        assert_eq!(log, vec!["first", "second"]);

        // events stay scheduled and fire again on replay
        events.fire(&mut log, &TickContext::realtime(0.0, 0.1));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_event_sees_context() {
        let mut events: ScheduledEvents<f64> =
            ScheduledEvents::new(Box::new(|seen, ctx| *seen = ctx.time));

        let mut seen = 0.0;
        events.fire(&mut seen, &TickContext::realtime(2.5, 0.1));
        assert_eq!(seen, 2.5);
    }
}
