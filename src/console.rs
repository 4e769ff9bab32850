//! Log messages for the REPL.
//!
//! The engine thread plays, loads samples and writes the pattern library
//! while rustyline owns the terminal, so messages go to subscribers instead.
//! The REPL subscribes before the engine starts and prints each message above
//! the prompt. Without a subscriber (`--list`, tests) only warnings and
//! errors reach stderr.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    /// Prefix shown before the message, if any.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Level::Info => None,
            Level::Warn => Some("warning"),
            Level::Error => Some("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub text: String,
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
static SUBSCRIBERS: Lazy<Mutex<Vec<(usize, Sender<LogMessage>)>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// A subscription to console log messages.
///
/// Dropping this value unsubscribes it.
pub struct Subscription {
    id: usize,
    rx: Receiver<LogMessage>,
}

impl Subscription {
    pub fn drain(&self) -> Vec<LogMessage> {
        self.rx.try_iter().collect()
    }

    /// Blocks until the next message.
    pub fn recv(&self) -> Option<LogMessage> {
        self.rx.recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut subs = SUBSCRIBERS.lock().unwrap();
        subs.retain(|(id, _)| *id != self.id);
    }
}

pub fn subscribe() -> Subscription {
    let (tx, rx) = mpsc::channel();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    SUBSCRIBERS.lock().unwrap().push((id, tx));
    Subscription { id, rx }
}

pub fn info(msg: impl Into<String>) {
    publish(Level::Info, msg.into());
}

pub fn warn(msg: impl Into<String>) {
    publish(Level::Warn, msg.into());
}

pub fn error(msg: impl Into<String>) {
    publish(Level::Error, msg.into());
}

fn publish(level: Level, text: String) {
    let message = LogMessage { level, text };

    let mut subs = SUBSCRIBERS.lock().unwrap();
    // A closed REPL printer unsubscribes itself here.
    subs.retain(|(_, tx)| tx.send(message.clone()).is_ok());
    if subs.is_empty() {
        if let Some(prefix) = message.level.prefix() {
            eprintln!("{}: {}", prefix, message.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_receives_each_level() {
        let sub = subscribe();
        info("loaded kane");
        warn("hello");
        error("device gone");

        let msgs = sub.drain();
        assert!(msgs.iter().any(|m| m.level == Level::Info && m.text == "loaded kane"));
        assert!(msgs.iter().any(|m| m.level == Level::Warn && m.text == "hello"));
        assert!(msgs.iter().any(|m| m.level == Level::Error && m.text == "device gone"));
    }

    #[test]
    fn only_problems_carry_a_prefix() {
        assert_eq!(Level::Info.prefix(), None);
        assert_eq!(Level::Warn.prefix(), Some("warning"));
        assert_eq!(Level::Error.prefix(), Some("error"));
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let first = subscribe();
        let id = first.id;
        drop(first);
        let subs = SUBSCRIBERS.lock().unwrap();
        assert!(subs.iter().all(|(sid, _)| *sid != id));
    }
}
