//! In-process endpoints.
//!
//! A [`pipe`] yields a connected receive end and send end. Send ends are
//! cheap to clone and may be used from any thread; the receive end is owned
//! by a single consumer. Messages arrive in the order a single sender sent
//! them.

use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::errors::TransportError;
use crate::message::Message;

/// Creates a connected endpoint pair.
#[must_use]
pub fn pipe() -> (Receiver, Sender) {
    let (tx, rx) = mpsc::channel();
    (
        Receiver {
            inner: rx,
            pending: VecDeque::new(),
        },
        Sender { inner: tx },
    )
}

/// Send end of an endpoint.
#[derive(Debug, Clone)]
pub struct Sender {
    inner: mpsc::Sender<Message>,
}

impl Sender {
    /// Delivers a message to the receive end.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the receive end is gone; the
    /// message is dropped.
    pub fn send(&self, message: Message) -> Result<(), TransportError> {
        let verb = message.verb;
        self.inner
            .send(message)
            .map_err(|_| TransportError::Closed { verb })
    }
}

/// Why a receive ended without a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    /// The deadline elapsed first.
    #[error("timed out waiting for a message")]
    Timeout,
    /// Every send end has been dropped.
    #[error("endpoint closed")]
    Closed,
}

/// Receive end of an endpoint.
///
/// Messages that arrive while a request is waiting for its terminal reply
/// are held back and returned first by later receives.
#[derive(Debug)]
pub struct Receiver {
    inner: mpsc::Receiver<Message>,
    pending: VecDeque<Message>,
}

impl Receiver {
    /// Blocks until a message arrives; `None` once every sender is gone.
    pub fn recv(&mut self) -> Option<Message> {
        self.pending
            .pop_front()
            .or_else(|| self.inner.recv().ok())
    }

    /// Blocks for at most `timeout` waiting for a message.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::Timeout`] when nothing arrived in time and
    /// [`RecvError::Closed`] when every sender is gone.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Message, RecvError> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(message);
        }
        self.inner.recv_timeout(timeout).map_err(map_timeout)
    }

    /// Number of held-back messages.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for an `Ack` or `Error`, holding back anything else.
    pub(crate) fn recv_terminal(&mut self, timeout: Option<Duration>) -> Result<Message, RecvError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let message = match deadline {
                None => self.inner.recv().map_err(|_| RecvError::Closed)?,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    self.inner.recv_timeout(remaining).map_err(map_timeout)?
                }
            };
            if message.verb.is_terminal() {
                return Ok(message);
            }
            self.pending.push_back(message);
        }
    }
}

impl Iterator for Receiver {
    type Item = Message;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

fn map_timeout(error: RecvTimeoutError) -> RecvError {
    match error {
        RecvTimeoutError::Timeout => RecvError::Timeout,
        RecvTimeoutError::Disconnected => RecvError::Closed,
    }
}
