//! A one-way network link with fixed latency and periodic loss

use retick_core::Seconds;
use std::collections::VecDeque;

pub struct DelayedLink<T> {
    latency: Seconds,
    /// Every n-th message is dropped, 0 disables loss
    drop_every: usize,
    sent: usize,
    in_flight: VecDeque<(Seconds, T)>,
}

impl<T> DelayedLink<T> {
    pub fn new(latency: Seconds, drop_every: usize) -> Self {
        Self {
            latency,
            drop_every,
            sent: 0,
            in_flight: VecDeque::new(),
        }
    }

    /// Send a message at `now`; returns `false` if the link lost it
    pub fn send(&mut self, now: Seconds, message: T) -> bool {
        self.sent += 1;
        if self.drop_every > 0 && self.sent % self.drop_every == 0 {
            return false;
        }
        self.in_flight.push_back((now + self.latency, message));
        true
    }

    /// Take every message delivered by `now`, in sending order
    pub fn receive(&mut self, now: Seconds) -> Vec<T> {
        let mut delivered = Vec::new();
        while let Some((arrival, _)) = self.in_flight.front() {
            if *arrival > now {
                break;
            }
            if let Some((_, message)) = self.in_flight.pop_front() {
                delivered.push(message);
            }
        }
        delivered
    }
}
