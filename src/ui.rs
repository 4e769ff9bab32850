//! Hooks the session calls to keep a front end in sync.
//!
//! The session only pushes state out through these; it never reads anything
//! back from the front end.

use crate::console::Level;
use crate::model::time_signature::TimeSignature;
use crate::model::transport::TransportState;
use crate::model::voice::Voice;
use crate::playback::PlaybackState;

/// A short, transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: Level::Info, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: Level::Error, text: text.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

pub trait UiHooks {
    fn on_step_toggled(&mut self, _voice: Voice, _step: usize, _active: bool) {}

    /// Called once per tick with the position that is sounding.
    fn on_transport_advanced(&mut self, _position: TransportState) {}

    /// `Stopped` also means the transport display should be cleared.
    fn on_playback_state_changed(&mut self, _state: PlaybackState) {}

    fn on_grid_regenerated(&mut self, _time_signature: TimeSignature, _steps_per_bar: usize) {}

    fn on_notice(&mut self, _notice: Notice) {}
}

/// Ignores every hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUi;

impl UiHooks for NoUi {}
