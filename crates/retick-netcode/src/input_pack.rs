//! Input packs for network transmission
//!
//! An `InputPack` is a bounded trailing window of an input history. The owner
//! of an entity sends one with every update; the receiving side merges it into
//! its own history, so a lost packet is covered by the next one.

use crate::{Error, Result};
use retick_core::Seconds;
use retick_history::TimeIndexedHistory;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One recorded input inside a pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPackEntry<I> {
    /// When the input was recorded
    pub time: Seconds,
    /// The recorded input
    pub input: I,
}

/// A window of recorded inputs, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPack<I> {
    entries: Vec<InputPackEntry<I>>,
}

impl<I> InputPack<I> {
    /// Create an empty pack
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Extract the inputs recorded within `max_length` of the newest one.
    ///
    /// When the history covers less than `max_length`, every entry is taken.
    pub fn from_history(history: &TimeIndexedHistory<I>, max_length: Seconds) -> Self
    where
        I: Clone,
    {
        let Some(latest) = history.latest_time() else {
            return Self::new();
        };
        let entries = history
            .range(latest - max_length.max(0.0), Seconds::INFINITY)
            .map(|item| InputPackEntry {
                time: item.time,
                input: item.value.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Append an entry
    ///
    /// Entries are expected in ascending time order.
    pub fn push(&mut self, time: Seconds, input: I) {
        self.entries.push(InputPackEntry { time, input });
    }

    /// The entries, oldest first
    pub fn entries(&self) -> &[InputPackEntry<I>] {
        &self.entries
    }

    /// Iterate over the entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &InputPackEntry<I>> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pack is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the oldest entry
    pub fn start_time(&self) -> Option<Seconds> {
        self.entries.first().map(|entry| entry.time)
    }

    /// Time of the newest entry
    pub fn end_time(&self) -> Option<Seconds> {
        self.entries.last().map(|entry| entry.time)
    }
}

impl<I: Serialize> InputPack<I> {
    /// Encode the pack for transmission
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl<I: DeserializeOwned> InputPack<I> {
    /// Decode a pack received from the network
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl<I> Default for InputPack<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> IntoIterator for InputPack<I> {
    type Item = InputPackEntry<I>;
    type IntoIter = std::vec::IntoIter<InputPackEntry<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retick_core::TIME_TOLERANCE;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Stick {
        x: f32,
        fire: bool,
    }

    fn history() -> TimeIndexedHistory<Stick> {
        let mut history = TimeIndexedHistory::new();
        for i in 0..6 {
            let input = Stick {
                x: i as f32,
                fire: i % 2 == 0,
            };
            history.set(i as f64 * 0.1, input, TIME_TOLERANCE);
        }
        history
    }

    #[test]
    fn test_from_history_window() {
        let pack = InputPack::from_history(&history(), 0.25);

        let times: Vec<_> = pack.iter().map(|entry| entry.time).collect();
        assert_eq!(times.len(), 3);
        assert_eq!(pack.start_time(), Some(3.0 * 0.1));
        assert_eq!(pack.end_time(), Some(0.5));
        assert_eq!(pack.entries()[0].input.x, 3.0);
    }

    #[test]
    fn test_from_short_history_takes_everything() {
        let pack = InputPack::from_history(&history(), 10.0);
        assert_eq!(pack.len(), 6);
        assert_eq!(pack.start_time(), Some(0.0));
    }

    #[test]
    fn test_from_empty_history() {
        let pack = InputPack::from_history(&TimeIndexedHistory::<Stick>::new(), 1.0);
        assert!(pack.is_empty());
        assert_eq!(pack.start_time(), None);
    }

    #[test]
    fn test_encode_decode() {
        let pack = InputPack::from_history(&history(), 0.3);
        let bytes = pack.encode().unwrap();
        let decoded = InputPack::<Stick>::decode(&bytes).unwrap();
        assert_eq!(decoded, pack);
        // timestamps must survive bit-exact
        for (a, b) in decoded.iter().zip(pack.iter()) {
            assert_eq!(a.time.to_bits(), b.time.to_bits());
        }
    }

    #[test]
    fn test_decode_garbage() {
        let err = InputPack::<Stick>::decode(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_into_iter() {
        let mut pack = InputPack::new();
        pack.push(
            1.0,
            Stick {
                x: 0.5,
                fire: false,
            },
        );
        let entries: Vec<_> = pack.into_iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time, 1.0);
    }
}
