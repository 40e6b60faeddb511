// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update-cycle completion handles and update errors.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use core::fmt;

use bramble_property::ConvertError;

/// An error surfaced from an update pass.
///
/// Update errors never corrupt the scheduler: bookkeeping is cleared before
/// the error propagates, so the element stays usable and the next
/// `request_update` opens a fresh cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateError {
    /// Attribute conversion failed during the reflection step or the
    /// attribute bridge.
    Convert(ConvertError),
    /// A user hook failed.
    Hook {
        /// Which hook failed (`"update"`, `"first_updated"`, `"updated"`).
        hook: &'static str,
        /// What went wrong.
        message: String,
    },
}

impl UpdateError {
    /// Creates a hook failure.
    #[must_use]
    pub fn hook(hook: &'static str, message: impl Into<String>) -> Self {
        Self::Hook {
            hook,
            message: message.into(),
        }
    }
}

impl From<ConvertError> for UpdateError {
    fn from(e: ConvertError) -> Self {
        Self::Convert(e)
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convert(e) => write!(f, "update failed: {e}"),
            Self::Hook { hook, message } => write!(f, "{hook} hook failed: {message}"),
        }
    }
}

impl core::error::Error for UpdateError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Convert(e) => Some(e),
            Self::Hook { .. } => None,
        }
    }
}

/// The observable state of one update cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionState {
    /// The cycle is scheduled or in flight.
    Pending,
    /// The cycle settled: `true` for a committed update, `false` for one
    /// skipped by the `should_update` gate.
    Resolved(bool),
    /// The cycle failed; bookkeeping was cleared before the error surfaced.
    Failed(UpdateError),
}

/// A shared handle to one update cycle's outcome.
///
/// This is the promise-shaped half of `update_complete`: any number of
/// clones observe the same cycle, and observing never schedules work. A
/// handle resolves exactly once; a new request after settlement gets a new
/// handle.
///
/// # Example
///
/// ```rust
/// use bramble_element::{CompletionState, UpdateCompletion};
///
/// let completion = UpdateCompletion::pending();
/// let observer = completion.clone();
/// assert!(observer.is_pending());
///
/// completion.resolve(true);
/// assert_eq!(observer.state(), CompletionState::Resolved(true));
/// ```
#[derive(Clone, Debug)]
pub struct UpdateCompletion {
    state: Rc<RefCell<CompletionState>>,
}

impl UpdateCompletion {
    /// Creates a pending handle for a newly scheduled cycle.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            state: Rc::new(RefCell::new(CompletionState::Pending)),
        }
    }

    /// Creates an already-settled handle.
    #[must_use]
    pub fn resolved(committed: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(CompletionState::Resolved(committed))),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CompletionState {
        self.state.borrow().clone()
    }

    /// Returns `true` while the cycle has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), CompletionState::Pending)
    }

    /// Returns the resolution value, or `None` while pending or failed.
    #[must_use]
    pub fn resolved_value(&self) -> Option<bool> {
        match *self.state.borrow() {
            CompletionState::Resolved(committed) => Some(committed),
            _ => None,
        }
    }

    /// Settles the cycle.
    ///
    /// Settling an already-settled handle is a no-op; a cycle resolves once.
    pub fn resolve(&self, committed: bool) {
        let mut state = self.state.borrow_mut();
        if matches!(*state, CompletionState::Pending) {
            *state = CompletionState::Resolved(committed);
        }
    }

    /// Settles the cycle with a failure.
    pub fn fail(&self, error: UpdateError) {
        let mut state = self.state.borrow_mut();
        if matches!(*state, CompletionState::Pending) {
            *state = CompletionState::Failed(error);
        }
    }
}
