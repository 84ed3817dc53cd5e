//! Dispatcher - routes inbound messages to handlers by address pattern
//!
//! Routes are kept in the order their pattern was first registered; handlers
//! within a route run in registration order. A failing or panicking handler is
//! logged and skipped, its siblings still run, and nothing propagates back to
//! the caller of `dispatch`.

mod args;

#[cfg(test)]
mod tests;

pub use args::{expect_i32, expect_str};

use crate::osc::{validate_pattern, Message, OscError, TypeTag, TypedValue};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Handler invoked with the argument list of a matched message
pub type Handler = Arc<dyn Fn(&[TypedValue]) -> Result<(), HandlerError> + Send + Sync>;

/// Observer that sees every inbound message before routing
pub type Tap = Arc<dyn Fn(&Message) + Send + Sync>;

/// Identity of a registered handler, used to unregister it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Error a handler returns when it cannot act on its arguments
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandlerError {
    #[error("missing argument {index} (expected '{expected}')")]
    MissingArgument { index: usize, expected: TypeTag },

    #[error("argument {index}: expected '{expected}', got '{actual}'")]
    WrongType {
        index: usize,
        expected: TypeTag,
        actual: TypeTag,
    },

    #[error("index {index} out of range for table of {len} entries")]
    OutOfRange { index: i64, len: usize },

    #[error("{0}")]
    Other(String),
}

/// Outcome of one `dispatch` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Patterns that matched the message address
    pub matched: usize,
    /// Handlers invoked (including failed ones)
    pub invoked: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

struct Route {
    pattern: String,
    handlers: Vec<(HandlerId, Handler)>,
}

/// Address-pattern routing table
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
    taps: Vec<Tap>,
    next_id: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a pattern
    ///
    /// Patterns must start with `/`; a segment of `*` matches any single
    /// address segment.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<HandlerId, OscError>
    where
        F: Fn(&[TypedValue]) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        validate_pattern(pattern)?;

        let id = HandlerId(self.next_id);
        self.next_id += 1;

        let handler: Handler = Arc::new(handler);
        match self.routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(route) => route.handlers.push((id, handler)),
            None => self.routes.push(Route {
                pattern: pattern.to_string(),
                handlers: vec![(id, handler)],
            }),
        }

        debug!(pattern, ?id, "Handler registered");
        Ok(id)
    }

    /// Remove a handler; unknown pattern or id is a no-op
    ///
    /// Returns whether a handler was removed.
    pub fn unregister(&mut self, pattern: &str, id: HandlerId) -> bool {
        let Some(pos) = self.routes.iter().position(|r| r.pattern == pattern) else {
            return false;
        };

        let route = &mut self.routes[pos];
        let before = route.handlers.len();
        route.handlers.retain(|(hid, _)| *hid != id);
        let removed = route.handlers.len() != before;

        if route.handlers.is_empty() {
            self.routes.remove(pos);
        }
        if removed {
            debug!(pattern, ?id, "Handler unregistered");
        }
        removed
    }

    /// Add an observer that sees every inbound message, matched or not
    pub fn tap<F>(&mut self, tap: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.taps.push(Arc::new(tap));
    }

    /// Route a message to every handler whose pattern matches its address
    ///
    /// Unmatched messages are dropped silently.
    pub fn dispatch(&self, message: &Message) -> DispatchReport {
        for tap in &self.taps {
            if catch_unwind(AssertUnwindSafe(|| tap(message))).is_err() {
                warn!(address = message.address(), "Message tap panicked");
            }
        }

        let mut report = DispatchReport::default();

        for route in self.routes.iter().filter(|r| message.matches(&r.pattern)) {
            report.matched += 1;

            for (id, handler) in &route.handlers {
                report.invoked += 1;

                let outcome = catch_unwind(AssertUnwindSafe(|| handler(message.args())));
                let reason = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => e.to_string(),
                    Err(panic) => panic_reason(panic.as_ref()),
                };

                report.failed += 1;
                let failure = OscError::HandlerFailure {
                    pattern: route.pattern.clone(),
                    reason,
                };
                warn!(address = message.address(), ?id, "{}", failure);
            }
        }

        if report.matched == 0 {
            trace!(address = message.address(), "No handler for address, dropped");
        }

        report
    }

    /// Registered patterns in routing order
    pub fn patterns(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.pattern.as_str()).collect()
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.routes.iter().map(|r| r.handlers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("patterns", &self.patterns())
            .field("handlers", &self.len())
            .field("taps", &self.taps.len())
            .finish()
    }
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
