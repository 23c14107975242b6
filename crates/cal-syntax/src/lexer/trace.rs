//! Per-token trace callbacks.
//!
//! A trace callback observes every produced token. It may fail synchronously
//! (an `Err` return or a panic) or asynchronously (a [`TraceTicket`] that
//! resolves to an error later). Either way the lexer keeps scanning: the
//! callback is disabled for the remainder of the current session, one warning
//! is logged, and the next `tokenize()` call re-enables it.
//!
//! Sessions make deferred failures safe: a ticket carries the session id it
//! was attached under, and a failure arriving after that session ended is
//! discarded without side effects. Instances are isolated; disabling the
//! callback on one lexer never affects another, even when the underlying
//! function object is shared.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

use crate::token::Token;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TraceError(pub String);

impl TraceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Synchronous result of a trace callback.
pub enum TraceOutcome {
    /// The callback is done with this token.
    Done,
    /// The callback will complete later; the lexer polls the ticket without
    /// ever blocking on it.
    Deferred(TraceTicket),
}

/// Completion handle for a deferred trace observation.
pub struct TraceTicket {
    receiver: Receiver<Result<(), TraceError>>,
}

impl TraceTicket {
    /// Creates a ticket and the sender used to complete it, typically from
    /// another thread.
    pub fn pending() -> (Sender<Result<(), TraceError>>, TraceTicket) {
        let (tx, rx) = channel();
        (tx, TraceTicket { receiver: rx })
    }

    fn poll(&self) -> TicketState {
        match self.receiver.try_recv() {
            Ok(Ok(())) => TicketState::Resolved,
            Ok(Err(e)) => TicketState::Failed(e),
            Err(TryRecvError::Empty) => TicketState::Pending,
            // A dropped sender without a verdict counts as resolved; there is
            // nothing left that could fail.
            Err(TryRecvError::Disconnected) => TicketState::Resolved,
        }
    }
}

enum TicketState {
    Pending,
    Resolved,
    Failed(TraceError),
}

pub type TraceCallback = Box<dyn FnMut(&Token) -> Result<TraceOutcome, TraceError>>;

pub(super) struct TraceState {
    callback: Option<TraceCallback>,
    session: u64,
    disabled: bool,
    warned: bool,
    pending: Vec<(u64, TraceTicket)>,
}

impl TraceState {
    pub fn new(callback: Option<TraceCallback>) -> Self {
        Self {
            callback,
            session: 0,
            disabled: false,
            warned: false,
            pending: Vec::new(),
        }
    }

    /// Starts a new session: bumps the id, re-enables the callback, and drops
    /// tickets from earlier sessions so their failures stay unobservable.
    pub fn begin_session(&mut self) {
        self.session += 1;
        self.disabled = false;
        self.warned = false;
        self.pending.retain(|(sid, _)| *sid == self.session);
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn observe(&mut self, token: &Token) {
        self.poll_pending();
        if self.disabled {
            return;
        }
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(|| callback(token))) {
            Ok(Ok(TraceOutcome::Done)) => {}
            Ok(Ok(TraceOutcome::Deferred(ticket))) => {
                self.pending.push((self.session, ticket));
            }
            Ok(Err(error)) => self.fail(&error.0),
            Err(_) => self.fail("callback panicked"),
        }
    }

    /// Drains deferred completions at session end. Unresolved tickets stay
    /// registered; once the next session begins they become stale and are
    /// dropped unread.
    pub fn end_session(&mut self) {
        self.poll_pending();
    }

    fn poll_pending(&mut self) {
        let current = self.session;
        let mut failure: Option<TraceError> = None;
        self.pending.retain(|(sid, ticket)| match ticket.poll() {
            TicketState::Pending => true,
            TicketState::Resolved => false,
            TicketState::Failed(error) => {
                if *sid == current && failure.is_none() {
                    failure = Some(error);
                }
                false
            }
        });
        if let Some(error) = failure {
            self.fail(&error.0);
        }
    }

    fn fail(&mut self, message: &str) {
        if !self.warned {
            log::warn!("trace callback failed, disabled for this session: {message}");
            self.warned = true;
        }
        self.disabled = true;
    }

    #[cfg(test)]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}
