//! Where observers get their changes from.

use serde::{Deserialize, Serialize};

/// How a scheduler's observers detect changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStrategy {
    /// Keep a snapshot and diff against it on every check.
    #[default]
    Polling,
    /// Subscribe to mutation records and derive changes from them.
    Records,
}

/// The change-detection half of an observer.
///
/// `sync(true)` establishes a fresh baseline (discarding anything pending),
/// `sync(false)` adopts the state the last `check` saw. `check` never
/// mutates the baseline.
pub trait ChangeSource {
    type Change;

    fn sync(&mut self, hard: bool);

    /// The change since the baseline, if there is one.
    fn check(&mut self) -> Option<Self::Change>;

    /// Drops subscriptions and snapshots.
    fn disconnect(&mut self);
}
