//! Session hooks for the terminal.
//!
//! Everything goes through the console logger, so output from the engine
//! thread lands above the prompt instead of inside it.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::console;
use crate::console::Level;
use crate::model::transport::TransportState;
use crate::playback::PlaybackState;
use crate::ui::{Notice, UiHooks};

static LIVE_VIEW: AtomicBool = AtomicBool::new(false);

pub fn set_live_view(on: bool) {
    LIVE_VIEW.store(on, Ordering::SeqCst);
}

pub fn live_view_enabled() -> bool {
    LIVE_VIEW.load(Ordering::SeqCst)
}

#[derive(Debug, Default)]
pub struct ConsoleUi {
    last_beat: Option<(u32, usize)>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UiHooks for ConsoleUi {
    /// Prints the beat indicator once per beat while live view is on.
    fn on_transport_advanced(&mut self, position: TransportState) {
        let beat = (position.bar, position.beat);
        if self.last_beat == Some(beat) {
            return;
        }
        self.last_beat = Some(beat);
        if live_view_enabled() {
            console::info(format!("[live] {}", position));
        }
    }

    fn on_playback_state_changed(&mut self, state: PlaybackState) {
        self.last_beat = None;
        match state {
            PlaybackState::Playing => console::info("Playing..."),
            PlaybackState::Stopped => console::info("Stopped"),
        }
    }

    fn on_notice(&mut self, notice: Notice) {
        match notice.level {
            Level::Error => console::error(notice.text),
            Level::Warn => console::warn(notice.text),
            Level::Info => console::info(notice.text),
        }
    }
}
