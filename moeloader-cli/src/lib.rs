//! Command line front-end: argument parsing, progress display and the commands themselves.
pub mod cli;
pub mod error;
pub mod progress_bars;
