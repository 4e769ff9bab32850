//! Runs a [`Session`] on its own thread against the wall clock.
//!
//! The thread sleeps in `recv_timeout` until either the next tick is due or a
//! request arrives, so the session itself stays single-threaded.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};

use crate::audio::AudioSink;
use crate::session::{Command, Session, Snapshot};
use crate::ui::UiHooks;

pub enum Request {
    Run(Command),
    Snapshot(Sender<Snapshot>),
    Shutdown,
}

pub struct EngineHandle {
    tx: Sender<Request>,
    thread: Option<JoinHandle<()>>,
}

/// Starts the engine thread.
///
/// The session is built on that thread, so audio outputs that cannot move
/// between threads are fine.
pub fn spawn<A, U, F>(build: F) -> Result<EngineHandle>
where
    A: AudioSink + 'static,
    U: UiHooks + 'static,
    F: FnOnce() -> Session<A, U> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Request>();
    let thread = thread::Builder::new()
        .name("taiko-engine".into())
        .spawn(move || {
            let mut session = build();
            let origin = Instant::now();
            loop {
                let request = match session.next_deadline() {
                    Some(deadline) => {
                        let wait = deadline.saturating_sub(origin.elapsed());
                        match rx.recv_timeout(wait) {
                            Ok(request) => Some(request),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    None => match rx.recv() {
                        Ok(request) => Some(request),
                        Err(_) => break,
                    },
                };

                session.advance_clock(origin.elapsed());
                match request {
                    None => {}
                    Some(Request::Run(command)) => session.apply(command),
                    Some(Request::Snapshot(reply)) => {
                        let _ = reply.send(session.snapshot());
                    }
                    Some(Request::Shutdown) => break,
                }
            }
            session.stop();
        })
        .context("starting engine thread")?;
    Ok(EngineHandle { tx, thread: Some(thread) })
}

impl EngineHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Request::Run(command))
            .map_err(|_| anyhow!("engine is not running"))
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(Request::Snapshot(reply))
            .map_err(|_| anyhow!("engine is not running"))?;
        rx.recv().context("engine stopped before replying")
    }

    /// Stops playback and waits for the thread to finish.
    pub fn shutdown(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| anyhow!("engine thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
