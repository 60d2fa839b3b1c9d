//! Retick History - Time-indexed history for real-time rollback
//!
//! This crate provides `TimeIndexedHistory<T>`, an ordered sequence of values
//! keyed by continuous simulation time. It stores recorded inputs, confirmed
//! states and scheduled events for the rollback engine.
//!
//! # Features
//!
//! - **Strict ordering**: entries are always strictly descending by time,
//!   index 0 is the most recent
//! - **Tolerance-based lookup**: timestamps within a tolerance are the same moment
//! - **Closest before/after queries**: binary searches over the ordered entries
//! - **Pruning**: drop everything older than a horizon
//!
//! # Example
//!
//! ```rust
//! use retick_core::TIME_TOLERANCE;
//! use retick_history::TimeIndexedHistory;
//!
//! let mut history = TimeIndexedHistory::new();
//! history.set(0.0, "idle", TIME_TOLERANCE);
//! history.set(0.1, "run", TIME_TOLERANCE);
//! history.set(0.2, "jump", TIME_TOLERANCE);
//!
//! // Most recent entry at or before t = 0.15
//! let index = history.closest_index_before(0.15, TIME_TOLERANCE).unwrap();
//! assert_eq!(history.value_at(index), Some(&"run"));
//!
//! // Forget everything older than t = 0.1
//! history.prune(0.1);
//! assert_eq!(history.len(), 2);
//! ```

use retick_core::{time::same_time, Seconds};

/// A value recorded at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem<T> {
    /// When the value was recorded
    pub time: Seconds,
    /// The recorded value
    pub value: T,
}

impl<T> HistoryItem<T> {
    /// Create a new history item
    pub fn new(time: Seconds, value: T) -> Self {
        Self { time, value }
    }
}

/// Ordered, time-keyed history
///
/// Entries are kept strictly descending by time: index 0 is the most recent
/// entry and the last index is the oldest surviving one.
#[derive(Debug, Clone)]
pub struct TimeIndexedHistory<T> {
    /// Entries, newest first
    items: Vec<HistoryItem<T>>,
}

impl<T> TimeIndexedHistory<T> {
    /// Create an empty history
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty history with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Set the value at `time`.
    ///
    /// If an entry within `tolerance` of `time` exists its value is replaced
    /// in place (its timestamp is kept); otherwise a new entry is inserted.
    /// Returns the index of the written entry. `time` must be finite.
    pub fn set(&mut self, time: Seconds, value: T, tolerance: Seconds) -> usize {
        debug_assert!(time.is_finite(), "history time must be finite, got {time}");
        match self.index_at(time, tolerance) {
            Some(index) => {
                self.items[index].value = value;
                index
            }
            None => self.insert(time, value),
        }
    }

    /// Insert a value, keeping the entries ordered.
    ///
    /// An entry with exactly the same timestamp is replaced so the ordering
    /// stays strict. Returns the index of the written entry. `time` must be
    /// finite.
    pub fn insert(&mut self, time: Seconds, value: T) -> usize {
        debug_assert!(time.is_finite(), "history time must be finite, got {time}");
        // first index whose entry is not newer than `time`
        let index = self.items.partition_point(|item| item.time > time);
        match self.items.get_mut(index) {
            Some(item) if item.time == time => item.value = value,
            _ => self.items.insert(index, HistoryItem::new(time, value)),
        }
        index
    }

    /// Index of the entry recorded at `time`, within `tolerance`.
    ///
    /// When several entries qualify the closest one wins.
    pub fn index_at(&self, time: Seconds, tolerance: Seconds) -> Option<usize> {
        let first = self.closest_index_before(time, tolerance)?;
        self.items[first..]
            .iter()
            .take_while(|item| same_time(item.time, time, tolerance))
            .enumerate()
            .min_by(|(_, a), (_, b)| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
            .map(|(offset, _)| first + offset)
    }

    /// Index of the most recent entry at or before `time` (within `tolerance`).
    ///
    /// Returns `None` when the history is empty or every entry is newer.
    pub fn closest_index_before(&self, time: Seconds, tolerance: Seconds) -> Option<usize> {
        let index = self
            .items
            .partition_point(|item| item.time > time + tolerance);
        (index < self.items.len()).then_some(index)
    }

    /// Index of the oldest entry at or after `time` (within `tolerance`).
    ///
    /// Returns `None` when the history is empty or every entry is older.
    pub fn closest_index_after(&self, time: Seconds, tolerance: Seconds) -> Option<usize> {
        let end = self
            .items
            .partition_point(|item| item.time >= time - tolerance);
        end.checked_sub(1)
    }

    /// Like `closest_index_before`, but falls back to the oldest surviving entry.
    ///
    /// Used when `time` predates everything kept after pruning, so playback
    /// can still start from *something*. Returns `None` only when empty.
    pub fn closest_index_before_or_earliest(
        &self,
        time: Seconds,
        tolerance: Seconds,
    ) -> Option<usize> {
        self.closest_index_before(time, tolerance)
            .or_else(|| self.items.len().checked_sub(1))
    }

    /// Remove all entries older than `min_time`.
    ///
    /// Entries at or after `min_time` are never removed.
    pub fn prune(&mut self, min_time: Seconds) {
        let keep = self.items.partition_point(|item| item.time >= min_time);
        self.items.truncate(keep);
    }

    /// Remove all entries older than `min_time`, except the most recent one.
    pub fn prune_keep_latest(&mut self, min_time: Seconds) {
        let keep = self.items.partition_point(|item| item.time >= min_time);
        self.items.truncate(keep.max(1));
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entry at `index` (0 = most recent)
    pub fn get(&self, index: usize) -> Option<&HistoryItem<T>> {
        self.items.get(index)
    }

    /// Timestamp of the entry at `index`
    pub fn time_at(&self, index: usize) -> Option<Seconds> {
        self.items.get(index).map(|item| item.time)
    }

    /// Value of the entry at `index`
    pub fn value_at(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|item| &item.value)
    }

    /// Mutable value of the entry at `index`
    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index).map(|item| &mut item.value)
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&HistoryItem<T>> {
        self.items.first()
    }

    /// Oldest surviving entry
    pub fn earliest(&self) -> Option<&HistoryItem<T>> {
        self.items.last()
    }

    /// Timestamp of the most recent entry
    pub fn latest_time(&self) -> Option<Seconds> {
        self.latest().map(|item| item.time)
    }

    /// Timestamp of the oldest surviving entry
    pub fn earliest_time(&self) -> Option<Seconds> {
        self.earliest().map(|item| item.time)
    }

    /// Iterate over the entries, newest first
    pub fn iter(&self) -> std::slice::Iter<'_, HistoryItem<T>> {
        self.items.iter()
    }

    /// Iterate over the entries, oldest first
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &HistoryItem<T>> {
        self.items.iter().rev()
    }

    /// Entries with `start <= time < end`, oldest first
    pub fn range(&self, start: Seconds, end: Seconds) -> impl Iterator<Item = &HistoryItem<T>> {
        let (newest, oldest) = self.range_bounds(start, end);
        self.items[newest..oldest].iter().rev()
    }

    /// Mutable values of the entries with `start <= time < end`, oldest first
    pub fn range_mut(
        &mut self,
        start: Seconds,
        end: Seconds,
    ) -> impl Iterator<Item = (Seconds, &mut T)> {
        let (newest, oldest) = self.range_bounds(start, end);
        self.items[newest..oldest]
            .iter_mut()
            .rev()
            .map(|item| (item.time, &mut item.value))
    }

    /// Slice bounds of the entries with `start <= time < end`
    fn range_bounds(&self, start: Seconds, end: Seconds) -> (usize, usize) {
        let newest = self.items.partition_point(|item| item.time >= end);
        let oldest = self.items.partition_point(|item| item.time >= start);
        (newest, oldest.max(newest))
    }

    /// Get statistics about the history
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            count: self.items.len(),
            oldest_time: self.earliest_time(),
            newest_time: self.latest_time(),
        }
    }
}

impl<T> Default for TimeIndexedHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a TimeIndexedHistory<T> {
    type Item = &'a HistoryItem<T>;
    type IntoIter = std::slice::Iter<'a, HistoryItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Statistics about a history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    /// Current number of entries
    pub count: usize,
    /// Oldest timestamp, if any
    pub oldest_time: Option<Seconds>,
    /// Newest timestamp, if any
    pub newest_time: Option<Seconds>,
}

impl HistoryStats {
    /// Time covered by the history (newest - oldest)
    pub fn span(&self) -> Seconds {
        match (self.oldest_time, self.newest_time) {
            (Some(oldest), Some(newest)) => newest - oldest,
            _ => 0.0,
        }
    }
}
