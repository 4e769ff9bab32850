//! A taiko drum sequencer and metronome.
//!
//! [`session::Session`] owns the pattern, transport settings and scheduler;
//! [`engine`] runs it on a thread against the wall clock and [`repl`] drives
//! it from the terminal.

pub mod audio;
pub mod console;
pub mod engine;
pub mod model;
pub mod playback;
pub mod repl;
pub mod session;
pub mod storage;
pub mod ui;
