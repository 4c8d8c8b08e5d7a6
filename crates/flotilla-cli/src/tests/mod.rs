//! Test suites for the flotilla CLI.

mod support;
