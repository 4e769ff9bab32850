//! The self-rescheduling tick loop.
//!
//! Every tick plays the voices on the current step, reports the position,
//! and arms exactly one follow-up timer. Stopping cancels that timer, so a
//! restart can never leave two tick chains running.

use std::fmt;
use std::time::Duration;

use crate::audio::timing::step_duration;
use crate::audio::AudioSink;
use crate::model::config::PlaybackConfig;
use crate::model::store::PatternStore;
use crate::model::transport::{TransportState, BEATS_PER_BAR};
use crate::ui::UiHooks;

pub mod timer;

use timer::{TimerHandle, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
        })
    }
}

/// What a tick reads and writes outside the scheduler itself.
pub struct TickContext<'a> {
    pub store: &'a PatternStore,
    pub config: &'a PlaybackConfig,
    pub audio: &'a mut dyn AudioSink,
    pub ui: &'a mut dyn UiHooks,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    state: PlaybackState,
    transport: TransportState,
    timers: TimerQueue,
    pending: Option<TimerHandle>,
    ticks: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// The position the next tick will play.
    pub fn transport(&self) -> TransportState {
        self.transport
    }

    /// Ticks played since the last `start`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Scheduled ticks not yet fired. Never more than one.
    pub fn pending_ticks(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Begins playback from bar 1, step 1. Ignored while already playing.
    ///
    /// The first tick plays immediately; the rest are timer driven.
    pub fn start(&mut self, cx: &mut TickContext<'_>) {
        if self.is_playing() {
            return;
        }
        self.state = PlaybackState::Playing;
        self.transport = TransportState::start();
        self.ticks = 0;
        cx.ui.on_playback_state_changed(PlaybackState::Playing);
        self.tick(cx);
    }

    /// Ends playback and cancels the pending tick. Idempotent.
    pub fn stop(&mut self, ui: &mut dyn UiHooks) {
        if !self.is_playing() {
            return;
        }
        self.state = PlaybackState::Stopped;
        if let Some(handle) = self.pending.take() {
            self.timers.cancel(handle);
        }
        self.transport.step = 0;
        ui.on_playback_state_changed(PlaybackState::Stopped);
    }

    /// Stops and starts again so new timing takes effect on a fresh chain.
    /// Does nothing while stopped.
    pub fn restart(&mut self, cx: &mut TickContext<'_>) {
        if self.is_playing() {
            self.stop(cx.ui);
            self.start(cx);
        }
    }

    /// Fires every tick due at `now`, then moves the clock to `now`.
    ///
    /// A tick that is a whole step or more overdue plays once and the chain
    /// continues from `now`; the backlog is dropped.
    pub fn fire_due(&mut self, now: Duration, cx: &mut TickContext<'_>) {
        while let Some(handle) = self.timers.pop_due(now) {
            // Only the handle armed by the latest tick may run.
            if self.pending != Some(handle) {
                continue;
            }
            self.pending = None;
            let late = now.saturating_sub(self.timers.now());
            let wait = step_duration(cx.config.tempo, self.transport.step, cx.config.feel);
            if late >= wait {
                self.timers.advance(now);
            }
            self.tick(cx);
        }
        self.timers.advance(now);
    }

    fn tick(&mut self, cx: &mut TickContext<'_>) {
        if cx.config.is_finished(self.transport.bar) {
            self.stop(cx.ui);
            return;
        }

        let store = cx.store;
        let position = self.transport;
        for voice in store.pattern().active_at(position.step) {
            let settings = store.settings(voice);
            cx.audio.play(voice, settings.pitch, settings.volume);
        }
        cx.ui.on_transport_advanced(position);
        self.ticks += 1;

        // The wait after a step belongs to that step: long after even steps
        // under swing.
        let wait = step_duration(cx.config.tempo, position.step, cx.config.feel);
        self.transport = position.advance(store.steps_per_bar(), BEATS_PER_BAR);
        self.pending = Some(self.timers.schedule(wait));
    }
}
