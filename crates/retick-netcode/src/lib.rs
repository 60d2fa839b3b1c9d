//! Retick Netcode - Deterministic rollback for networked entities
//!
//! This crate turns any `Simulable` entity into a predictable, rewindable one:
//!
//! - **Prediction**: record local inputs and extrapolate ahead of the network
//! - **Reconciliation**: adopt authoritative states and replay recorded inputs
//! - **Input Packs**: ship a trailing window of inputs to the remote side
//! - **Scheduled Events**: one-shot callbacks pinned to the timeline
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Ticker                              │
//! │  ┌───────────────┐   ┌───────────────┐   ┌────────────────┐  │
//! │  │ Input History │──▶│     Seek      │──▶│ State History  │  │
//! │  └───────────────┘   └───────────────┘   └────────────────┘  │
//! │     ▲        │              ▲  │                 │           │
//! │     │        ▼              │  ▼                 ▼           │
//! │  ┌──────┐ ┌──────┐   ┌───────────────┐   ┌────────────────┐  │
//! │  │ Push │ │ Pack │   │Event History  │   │    Rewind      │  │
//! │  └──────┘ └──────┘   └───────────────┘   └────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use retick_netcode::{SeekFlags, Ticker, TickerSettings};
//!
//! let settings = TickerSettings::from_ron_str(include_str!("ticker.ron"))?;
//! let mut ticker = Ticker::new(&player, settings);
//!
//! // Client loop
//! loop {
//!     // Record input and predict up to now
//!     ticker.push_input(read_controls(), now);
//!     ticker.seek(&mut player, now, previous_now, SeekFlags::empty());
//!     send(ticker.make_input_pack(0.5).encode()?);
//!
//!     // When the server state arrives, correct and replay
//!     if let Some((state, time)) = receive_server_state() {
//!         ticker.reconcile(&mut player, state, time);
//!     }
//! }
//! ```

mod error;
mod event;
mod input_pack;
mod reconciliation;
mod settings;
mod ticker;

#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};
pub use event::{ScheduledEvents, TickerEvent};
pub use input_pack::{InputPack, InputPackEntry};
pub use settings::TickerSettings;
pub use ticker::{SeekFlags, SeekReport, SeekStatus, Ticker, DESYNC_THRESHOLD};

// Re-export the contracts a ticker is generic over
pub use retick_core::{Seconds, Simulable, StateDiff, TickContext, TickInput, TIME_TOLERANCE};
pub use retick_history::TimeIndexedHistory;
