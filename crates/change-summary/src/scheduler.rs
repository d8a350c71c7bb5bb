//! The microtask checkpoint driver.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use change_summary_path::{Path, PathCache, PathError};
use tracing::{debug, trace, warn};

use crate::config::{CycleLimitPolicy, SchedulerConfig};
use crate::error::{CallbackError, CheckpointError};
use crate::observer::Observe;
use crate::source::ChangeStrategy;

/// What a checkpoint (or a single observer's `deliver`) did.
#[derive(Debug, Default)]
pub struct CheckpointReport {
    /// Passes run.
    pub cycles: usize,
    /// Callback invocations.
    pub reports: usize,
    pub failures: Vec<CallbackError>,
    /// Stopped at the cycle cap while observers were still changing.
    pub cycle_limit_reached: bool,
    /// The call was made while a checkpoint was already running and did
    /// nothing.
    pub nested: bool,
}

impl CheckpointReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// `true` when nothing was reported.
    pub fn is_quiet(&self) -> bool {
        self.reports == 0
    }
}

struct SchedulerInner {
    config: SchedulerConfig,
    observers: RefCell<Vec<Weak<dyn Observe>>>,
    paths: RefCell<PathCache>,
    running: Cell<bool>,
    next_id: Cell<u64>,
}

/// Owns the set of observers that checkpoints visit.
///
/// Cloning yields another handle to the same scheduler.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use change_summary::{ArrayObserver, Scheduler, Splice};
/// use change_summary_model::Value;
///
/// let scheduler = Scheduler::default();
/// let arr = Value::array([1, 2, 3]);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = seen.clone();
/// let _observer = ArrayObserver::new(&scheduler, &arr, move |splices: &Vec<Splice>, _| {
///     sink.borrow_mut().push(splices.clone());
///     Ok(())
/// })
/// .unwrap();
///
/// arr.as_array().unwrap().splice(1, 1, vec![Value::from(9), Value::from(9)]);
/// let report = scheduler.perform_microtask_checkpoint().unwrap();
///
/// assert_eq!(report.reports, 1);
/// assert_eq!(*seen.borrow(), vec![vec![Splice::new(1, vec![Value::from(2)], 2)]]);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

/// Clears the running flag even if a callback panics.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let paths = PathCache::new(config.path_cache_capacity);
        Self {
            inner: Rc::new(SchedulerInner {
                config,
                observers: RefCell::new(Vec::new()),
                paths: RefCell::new(paths),
                running: Cell::new(false),
                next_id: Cell::new(1),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn strategy(&self) -> ChangeStrategy {
        self.inner.config.strategy
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Parses `path` through the scheduler's path cache.
    pub fn path(&self, path: &str) -> Result<Path, PathError> {
        self.inner.paths.borrow_mut().get(path)
    }

    pub(crate) fn next_observer_id(&self) -> u64 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        id
    }

    /// Adds `observer` after every registered one, dropping entries whose
    /// observer is gone.
    pub(crate) fn register(&self, observer: &Rc<dyn Observe>) {
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|weak| weak.strong_count() > 0);
        observers.push(Rc::downgrade(observer));
    }

    /// Registry entries, including closed observers not yet pruned.
    pub fn registered_len(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Observers that are alive and not closed.
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|observer| !observer.is_closed())
            .count()
    }

    /// Forgets every registered observer. They keep working through their
    /// own `deliver` but are no longer visited by checkpoints.
    pub fn clear_observers(&self) {
        self.inner.observers.borrow_mut().clear();
    }

    /// Drives every live observer through check and report until a full
    /// pass reports nothing, or the configured cycle cap is reached.
    ///
    /// Observers run in registration order. Ones registered during a pass
    /// are first visited by the next pass; ones closed during a pass are
    /// skipped from then on. An observer whose callback is running (because
    /// the checkpoint was started from inside its `deliver`) is left for
    /// that `deliver` and neither checked nor counted. Callback errors do
    /// not interrupt the pass and are collected into the report. A call made
    /// while a checkpoint is already running returns an empty report flagged
    /// `nested`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::CycleLimit`] when the cap is reached and
    /// the policy is [`CycleLimitPolicy::Error`].
    pub fn perform_microtask_checkpoint(&self) -> Result<CheckpointReport, CheckpointError> {
        let mut report = CheckpointReport::default();
        if self.inner.running.get() {
            trace!("checkpoint already running");
            report.nested = true;
            return Ok(report);
        }
        self.inner.running.set(true);
        let _guard = RunningGuard(&self.inner.running);

        let max_cycles = self.inner.config.cycle_cap();
        loop {
            report.cycles += 1;
            let to_check = std::mem::take(&mut *self.inner.observers.borrow_mut());
            let mut survivors = Vec::with_capacity(to_check.len());
            let mut any_changed = false;

            for weak in to_check {
                let Some(observer) = weak.upgrade() else {
                    continue;
                };
                if observer.is_closed() {
                    continue;
                }
                if observer.is_reporting() {
                    trace!(observer = observer.id(), "skipped while reporting");
                    survivors.push(weak);
                    continue;
                }
                if observer.check() {
                    any_changed = true;
                    report.reports += 1;
                    if let Err(err) = observer.report() {
                        report.failures.push(err);
                    }
                }
                survivors.push(weak);
            }

            {
                let mut observers = self.inner.observers.borrow_mut();
                survivors.append(&mut *observers);
                *observers = survivors;
            }

            if !any_changed {
                break;
            }
            if report.cycles >= max_cycles {
                report.cycle_limit_reached = true;
                break;
            }
        }

        debug!(
            cycles = report.cycles,
            reports = report.reports,
            failures = report.failures.len(),
            "checkpoint finished"
        );

        if report.cycle_limit_reached {
            match self.inner.config.cycle_limit {
                CycleLimitPolicy::Silent => {}
                CycleLimitPolicy::Warn => {
                    warn!(cycles = report.cycles, "checkpoint stopped at cycle limit");
                }
                CycleLimitPolicy::Error => {
                    warn!(cycles = report.cycles, "checkpoint stopped at cycle limit");
                    return Err(CheckpointError::CycleLimit {
                        cycles: report.cycles,
                        report,
                    });
                }
            }
        }
        Ok(report)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.inner.config)
            .field("observers", &self.inner.observers.borrow().len())
            .field("running", &self.inner.running.get())
            .finish()
    }
}
