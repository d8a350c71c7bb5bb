//! Observing the value at a dotted path.

use change_summary_model::{same_value, RecordQueue, Value};
use change_summary_path::Path;
use serde::Serialize;

use crate::error::{BoxError, ObserverError};
use crate::observed_set::ObservedSet;
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::source::{ChangeSource, ChangeStrategy};

/// The value at the path moved from `old_value` to `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathChange {
    pub value: Value,
    pub old_value: Value,
}

fn compare(value: &Value, old_value: &Value) -> Option<PathChange> {
    if same_value(value, old_value) {
        None
    } else {
        Some(PathChange {
            value: value.clone(),
            old_value: old_value.clone(),
        })
    }
}

/// Re-reads the path on every check.
#[derive(Debug)]
pub struct PollingPathSource {
    root: Value,
    path: Path,
    value: Value,
    old_value: Value,
}

impl PollingPathSource {
    pub fn new(root: Value, path: Path) -> Self {
        Self {
            root,
            path,
            value: Value::Undefined,
            old_value: Value::Undefined,
        }
    }
}

impl ChangeSource for PollingPathSource {
    type Change = PathChange;

    fn sync(&mut self, hard: bool) {
        if hard {
            self.value = self.path.get_value_from(&self.root);
        }
        self.old_value = self.value.clone();
    }

    fn check(&mut self) -> Option<PathChange> {
        self.value = self.path.get_value_from(&self.root);
        compare(&self.value, &self.old_value)
    }

    fn disconnect(&mut self) {
        self.root = Value::Undefined;
        self.value = Value::Undefined;
        self.old_value = Value::Undefined;
    }
}

/// Re-reads the path only after a container along it reported a mutation.
#[derive(Debug)]
pub struct RecordPathSource {
    root: Value,
    path: Path,
    observed: ObservedSet,
    value: Value,
    old_value: Value,
}

impl RecordPathSource {
    pub fn new(root: Value, path: Path) -> Self {
        Self {
            root,
            path,
            observed: ObservedSet::new(RecordQueue::new()),
            value: Value::Undefined,
            old_value: Value::Undefined,
        }
    }

    fn evaluate(&mut self) -> Value {
        self.observed.reset();
        let observed = &mut self.observed;
        let value = self
            .path
            .get_value_from_observed(&self.root, |container| observed.observe(container));
        self.observed.cleanup();
        self.observed.queue().clear();
        value
    }

    /// Containers the last evaluation read through.
    pub fn dependencies(&self) -> usize {
        self.observed.len()
    }
}

impl ChangeSource for RecordPathSource {
    type Change = PathChange;

    fn sync(&mut self, hard: bool) {
        if hard {
            self.value = self.evaluate();
        }
        self.old_value = self.value.clone();
    }

    fn check(&mut self) -> Option<PathChange> {
        if !self.observed.queue().is_empty() {
            self.value = self.evaluate();
        }
        compare(&self.value, &self.old_value)
    }

    fn disconnect(&mut self) {
        self.observed.clear();
        self.root = Value::Undefined;
        self.value = Value::Undefined;
        self.old_value = Value::Undefined;
    }
}

#[derive(Debug)]
pub enum PathSource {
    Polling(PollingPathSource),
    Records(RecordPathSource),
}

impl PathSource {
    pub fn new(strategy: ChangeStrategy, root: Value, path: Path) -> Self {
        match strategy {
            ChangeStrategy::Polling => PathSource::Polling(PollingPathSource::new(root, path)),
            ChangeStrategy::Records => PathSource::Records(RecordPathSource::new(root, path)),
        }
    }

    /// The value seen by the last sync or check.
    pub fn value(&self) -> &Value {
        match self {
            PathSource::Polling(source) => &source.value,
            PathSource::Records(source) => &source.value,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PathSource::Polling(source) => &source.path,
            PathSource::Records(source) => &source.path,
        }
    }
}

impl ChangeSource for PathSource {
    type Change = PathChange;

    fn sync(&mut self, hard: bool) {
        match self {
            PathSource::Polling(source) => source.sync(hard),
            PathSource::Records(source) => source.sync(hard),
        }
    }

    fn check(&mut self) -> Option<PathChange> {
        match self {
            PathSource::Polling(source) => source.check(),
            PathSource::Records(source) => source.check(),
        }
    }

    fn disconnect(&mut self) {
        match self {
            PathSource::Polling(source) => source.disconnect(),
            PathSource::Records(source) => source.disconnect(),
        }
    }
}

/// Observes `root.<path>`, reporting [`PathChange`]s. Values compare with
/// same-value semantics, so `NaN` is stable and `0`/`-0` differ.
pub type PathObserver = Observer<PathSource>;

impl Observer<PathSource> {
    /// # Errors
    ///
    /// Returns [`ObserverError::InvalidPath`] if `path` does not parse.
    pub fn new<F>(scheduler: &Scheduler, root: &Value, path: &str, callback: F) -> Result<Self, ObserverError>
    where
        F: FnMut(&PathChange, &Value) -> Result<(), BoxError> + 'static,
    {
        Self::with_token(scheduler, root, path, callback, Value::Undefined)
    }

    /// Like [`new`](Self::new); `token` is passed to every callback call.
    pub fn with_token<F>(
        scheduler: &Scheduler,
        root: &Value,
        path: &str,
        callback: F,
        token: Value,
    ) -> Result<Self, ObserverError>
    where
        F: FnMut(&PathChange, &Value) -> Result<(), BoxError> + 'static,
    {
        let path = scheduler.path(path)?;
        let source = PathSource::new(scheduler.strategy(), root.clone(), path);
        Ok(Observer::start(scheduler, source, Box::new(callback), token))
    }

    /// The current value at the path as of the last sync or check; the root
    /// itself for the empty path, `undefined` once closed.
    pub fn value(&self) -> Value {
        self.with_source(|source| source.value().clone())
    }

    pub fn path(&self) -> Path {
        self.with_source(|source| source.path().clone())
    }
}
