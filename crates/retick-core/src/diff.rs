//! Field-level state diffing for reconciliation logs
//!
//! When a prediction diverges from authoritative state it is useful to see
//! *which* fields diverged. `StateDiff` provides that as a statically typed
//! comparison; the `state_diff!` macro generates it from a field list.
//!
//! ```rust
//! use retick_core::{state_diff, StateDiff};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Body {
//!     position: (f64, f64),
//!     grounded: bool,
//! }
//!
//! state_diff!(Body { position, grounded });
//!
//! let predicted = Body { position: (0.0, 1.0), grounded: false };
//! let authoritative = Body { position: (0.0, 1.0), grounded: true };
//!
//! let diffs = predicted.diff(&authoritative);
//! assert_eq!(diffs.len(), 1);
//! assert_eq!(diffs[0].field, "grounded");
//! ```

use std::fmt;

/// One diverging field between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    /// Field name
    pub field: &'static str,
    /// Debug rendering of the locally predicted value
    pub predicted: String,
    /// Debug rendering of the authoritative value
    pub authoritative: String,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.field, self.predicted, self.authoritative
        )
    }
}

/// Statically typed field comparison between two snapshots.
///
/// The default implementation reports nothing, which is enough for states
/// that don't need detailed reconciliation logs.
pub trait StateDiff {
    /// List the fields where `self` (predicted) differs from `other` (authoritative).
    fn diff(&self, _other: &Self) -> Vec<FieldDiff> {
        Vec::new()
    }
}

/// Render a diff list on one line, e.g. for a log field
pub fn format_diffs(diffs: &[FieldDiff]) -> String {
    if diffs.is_empty() {
        return "<no field-level differences>".to_string();
    }
    diffs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Implement `StateDiff` for a struct from an explicit list of its fields.
///
/// Every listed field must implement `PartialEq` and `Debug`.
#[macro_export]
macro_rules! state_diff {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::StateDiff for $ty {
            fn diff(&self, other: &Self) -> ::std::vec::Vec<$crate::FieldDiff> {
                let mut diffs = ::std::vec::Vec::new();
                $(
                    if self.$field != other.$field {
                        diffs.push($crate::FieldDiff {
                            field: ::std::stringify!($field),
                            predicted: ::std::format!("{:?}", self.$field),
                            authoritative: ::std::format!("{:?}", other.$field),
                        });
                    }
                )+
                diffs
            }
        }
    };
}
