//! Destinations for progress lines and backend events.

use std::io::{self, Write};
use std::process;
use std::sync::{Mutex, PoisonError};

/// Receives diagnostic output for the lifetime of one session.
pub trait EventSink: Send + Sync {
    /// Records a progress or log line.
    fn log(&self, line: &str);

    /// Records a fatal backend condition. The production sink ends the
    /// process.
    fn fatal(&self, message: &str);
}

/// Writes events to standard error and exits on fatal events.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl EventSink for StderrSink {
    fn log(&self, line: &str) {
        let _ = writeln!(io::stderr().lock(), "{line}");
    }

    fn fatal(&self, message: &str) {
        let _ = writeln!(io::stderr().lock(), "Fatal: {message}");
        process::exit(1);
    }
}

/// A recorded sink event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A [`EventSink::log`] line.
    Log(String),
    /// A [`EventSink::fatal`] message.
    Fatal(String),
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    /// Snapshot of the events so far.
    #[must_use]
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logged lines so far, without fatal events.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Log(line) => Some(line),
                SinkEvent::Fatal(_) => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl EventSink for RecordingSink {
    fn log(&self, line: &str) {
        self.push(SinkEvent::Log(line.to_owned()));
    }

    fn fatal(&self, message: &str) {
        self.push(SinkEvent::Fatal(message.to_owned()));
    }
}
