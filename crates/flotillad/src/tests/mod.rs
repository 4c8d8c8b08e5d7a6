//! Test suites for the flotilla daemon.

mod support;
