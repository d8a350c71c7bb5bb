//! Observer lifecycle shared by every observer kind.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use change_summary_model::Value;
use tracing::{debug, error, trace, warn};

use crate::config::CycleLimitPolicy;
use crate::error::{BoxError, CallbackError};
use crate::scheduler::{CheckpointReport, Scheduler};
use crate::source::ChangeSource;

/// Boxed observer callback: receives the change and the observer's token.
pub type Callback<C> = Box<dyn FnMut(&C, &Value) -> Result<(), BoxError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Active,
    /// The callback is running.
    Reporting,
    Closed,
}

/// The object-safe face of an observer, as the scheduler sees it.
pub(crate) trait Observe {
    fn id(&self) -> u64;
    fn is_closed(&self) -> bool;
    /// Its callback is on the stack.
    fn is_reporting(&self) -> bool;
    fn check(&self) -> bool;
    fn report(&self) -> Result<(), CallbackError>;
}

struct ObserverInner<S: ChangeSource> {
    id: u64,
    state: Cell<ObserverState>,
    source: RefCell<S>,
    pending: RefCell<Option<S::Change>>,
    callback: RefCell<Callback<S::Change>>,
    token: Value,
    max_cycles: usize,
    cycle_limit: CycleLimitPolicy,
}

impl<S: ChangeSource> Observe for ObserverInner<S> {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_closed(&self) -> bool {
        self.state.get() == ObserverState::Closed
    }

    fn is_reporting(&self) -> bool {
        self.state.get() == ObserverState::Reporting
    }

    fn check(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        let change = self.source.borrow_mut().check();
        let changed = change.is_some();
        *self.pending.borrow_mut() = change;
        trace!(observer = self.id, changed, "checked");
        changed
    }

    fn report(&self) -> Result<(), CallbackError> {
        if self.state.get() != ObserverState::Active {
            return Ok(());
        }
        let Some(change) = self.pending.borrow_mut().take() else {
            return Ok(());
        };
        self.source.borrow_mut().sync(false);

        self.state.set(ObserverState::Reporting);
        let result = {
            let mut callback = self.callback.borrow_mut();
            (&mut *callback)(&change, &self.token)
        };
        if self.state.get() == ObserverState::Reporting {
            self.state.set(ObserverState::Active);
        }
        trace!(observer = self.id, ok = result.is_ok(), "reported");

        result.map_err(|source| {
            error!(observer = self.id, "observer callback failed: {}", source);
            CallbackError {
                observer: self.id,
                source,
            }
        })
    }
}

/// A shared handle to one observer.
///
/// Clones refer to the same observer. The scheduler only holds the observer
/// weakly, so dropping every handle takes it out of future checkpoints.
pub struct Observer<S: ChangeSource> {
    inner: Rc<ObserverInner<S>>,
}

impl<S: ChangeSource> Clone for Observer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> Observer<S>
where
    S: ChangeSource + 'static,
    S::Change: 'static,
{
    /// Takes the baseline and registers with `scheduler`.
    pub(crate) fn start(scheduler: &Scheduler, mut source: S, callback: Callback<S::Change>, token: Value) -> Self {
        source.sync(true);
        let config = scheduler.config();
        let inner = Rc::new(ObserverInner {
            id: scheduler.next_observer_id(),
            state: Cell::new(ObserverState::Active),
            source: RefCell::new(source),
            pending: RefCell::new(None),
            callback: RefCell::new(callback),
            token,
            max_cycles: config.cycle_cap(),
            cycle_limit: config.cycle_limit,
        });
        let erased: Rc<dyn Observe> = inner.clone();
        scheduler.register(&erased);
        debug!(observer = inner.id, "observer registered");
        Self { inner }
    }
}

impl<S: ChangeSource> Observer<S> {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn state(&self) -> ObserverState {
        self.inner.state.get()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn token(&self) -> &Value {
        &self.inner.token
    }

    /// Computes the change since the last report and keeps it for the next
    /// [`report`](Self::report). Never runs the callback.
    pub fn check(&self) -> bool {
        self.inner.check()
    }

    /// Adopts the state the last [`check`](Self::check) saw and hands its
    /// change to the callback. Does nothing without a pending change, or
    /// when called from the observer's own callback.
    ///
    /// # Errors
    ///
    /// Returns the callback's error; the observer stays active.
    pub fn report(&self) -> Result<(), CallbackError> {
        self.inner.report()
    }

    /// Runs check and report until the observer settles, at most the
    /// scheduler's cycle cap times.
    ///
    /// Hitting the cap only sets `cycle_limit_reached` and logs a warning,
    /// whatever the scheduler's [`CycleLimitPolicy`]; callers that want an
    /// error inspect the report. Called from the observer's own callback it
    /// returns an empty report flagged `nested`.
    pub fn deliver(&self) -> CheckpointReport {
        let mut report = CheckpointReport::default();
        match self.state() {
            ObserverState::Closed => return report,
            ObserverState::Reporting => {
                report.nested = true;
                return report;
            }
            ObserverState::Active => {}
        }
        while report.cycles < self.inner.max_cycles && self.inner.check() {
            report.cycles += 1;
            report.reports += 1;
            if let Err(err) = self.inner.report() {
                report.failures.push(err);
            }
        }
        if report.cycles >= self.inner.max_cycles {
            report.cycle_limit_reached = true;
            if self.inner.cycle_limit != CycleLimitPolicy::Silent {
                warn!(observer = self.inner.id, cycles = report.cycles, "deliver stopped at cycle limit");
            }
        }
        report
    }

    /// Forgets pending changes and takes a fresh baseline without running
    /// the callback.
    pub fn reset(&self) {
        if self.is_closed() {
            return;
        }
        self.inner.pending.borrow_mut().take();
        self.inner.source.borrow_mut().sync(true);
    }

    /// Unsubscribes and drops all snapshots. Closing is final.
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.inner.state.set(ObserverState::Closed);
        self.inner.pending.borrow_mut().take();
        self.inner.source.borrow_mut().disconnect();
        debug!(observer = self.inner.id, "observer closed");
    }

    /// Runs `f` against the change source.
    pub(crate) fn with_source<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.source.borrow())
    }
}

impl<S: ChangeSource> fmt::Debug for Observer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.get())
            .finish()
    }
}
