//! IDLE (RFC 2177).
//!
//! The driver sends `IDLE` and, once the server answers `+`, keeps
//! receiving with receive timeouts suppressed. Every untagged response goes
//! to a callback; when it returns `false`, or when any task calls
//! [`IdleHandle::done`], `DONE` is written exactly once and the command
//! ends with the server's tagged status.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Notify, watch};

use crate::command::ImapString;
use crate::parser::{Response, TaggedStatus};
use crate::transaction::{CommandKind, ContinuationReply, Exchange, ResultCode};
use crate::Result;

/// Where an IDLE command stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// Sent, waiting for the server to accept.
    Pending,
    /// The server accepted; updates are streaming.
    Idling,
    /// The command has ended.
    Finished,
}

/// State shared between an IDLE command and its handles.
#[derive(Debug)]
pub struct IdleSignal {
    done: AtomicBool,
    notify: Notify,
    state: watch::Sender<IdleState>,
}

impl IdleSignal {
    fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            notify: Notify::new(),
            state: watch::Sender::new(IdleState::Pending),
        }
    }

    /// Requests DONE. Returns true for the single call that wins.
    fn request_done(&self) -> bool {
        let won = self
            .done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.notify.notify_one();
        }
        won
    }

    /// Resolves once DONE has been requested.
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }

    fn publish(&self, state: IdleState) {
        self.state.send_replace(state);
    }
}

/// Controls a running IDLE command from another task.
#[derive(Debug, Clone)]
pub struct IdleHandle {
    signal: Arc<IdleSignal>,
}

impl IdleHandle {
    /// Asks the command to send DONE.
    ///
    /// Safe to call from any task any number of times; returns true only
    /// for the first call.
    pub fn done(&self) -> bool {
        self.signal.request_done()
    }

    /// Returns true once DONE has been requested.
    #[must_use]
    pub fn is_done_requested(&self) -> bool {
        self.signal.done.load(Ordering::Acquire)
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> IdleState {
        *self.signal.state.borrow()
    }

    /// Waits until the server has accepted IDLE or the command has ended.
    pub async fn wait_started(&self) -> IdleState {
        let mut rx = self.signal.state.subscribe();
        rx.wait_for(|state| *state != IdleState::Pending)
            .await
            .map_or(IdleState::Finished, |state| *state)
    }
}

/// IDLE command.
pub struct Idle<F> {
    keep_idling: F,
    signal: Arc<IdleSignal>,
}

impl<F> Idle<F>
where
    F: FnMut(&Response) -> bool + Send,
{
    /// Creates an IDLE command and a handle to end it.
    ///
    /// `keep_idling` sees every untagged response; returning `false`
    /// requests DONE.
    pub fn new(keep_idling: F) -> (Self, IdleHandle) {
        let signal = Arc::new(IdleSignal::new());
        let handle = IdleHandle {
            signal: Arc::clone(&signal),
        };
        (
            Self {
                keep_idling,
                signal,
            },
            handle,
        )
    }
}

impl<F> std::fmt::Debug for Idle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Idle")
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

impl<F> Exchange for Idle<F>
where
    F: FnMut(&Response) -> bool + Send,
{
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Idle
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn on_untagged(&mut self, response: &Response) -> Result<()> {
        if !(self.keep_idling)(response) && self.signal.request_done() {
            tracing::debug!("IDLE callback requested DONE");
        }
        Ok(())
    }

    fn on_continuation(&mut self, _text: &str) -> Result<ContinuationReply> {
        self.signal.publish(IdleState::Idling);
        Ok(ContinuationReply::Idle)
    }

    fn idle_signal(&self) -> Option<Arc<IdleSignal>> {
        Some(Arc::clone(&self.signal))
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, _code: ResultCode) {
        self.signal.publish(IdleState::Finished);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_done_wins_once() {
        let (_idle, handle) = Idle::new(|_: &Response| true);
        assert!(!handle.is_done_requested());
        assert!(handle.done());
        assert!(!handle.clone().done());
        assert!(handle.is_done_requested());
    }

    #[tokio::test]
    async fn test_wait_started() {
        let (mut idle, handle) = Idle::new(|_: &Response| true);
        assert_eq!(handle.state(), IdleState::Pending);

        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.wait_started().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(
            idle.on_continuation("idling").unwrap(),
            ContinuationReply::Idle
        );
        assert_eq!(waiter.await.unwrap(), IdleState::Idling);

        idle.on_finish(ResultCode::Ok);
        assert_eq!(handle.state(), IdleState::Finished);
        assert_eq!(handle.wait_started().await, IdleState::Finished);
    }

    #[test]
    fn test_callback_requests_done() {
        let mut seen = 0;
        let (mut idle, handle) = Idle::new(move |_: &Response| {
            seen += 1;
            seen < 2
        });
        let exists = crate::parser::ResponseReceiver::new()
            .receive_line(b"* 4 EXISTS\r\n")
            .unwrap()
            .unwrap();
        idle.on_untagged(&exists).unwrap();
        assert!(!handle.is_done_requested());
        idle.on_untagged(&exists).unwrap();
        assert!(handle.is_done_requested());
    }
}
