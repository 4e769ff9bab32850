//! Terminal styling for REPL output.

use crate::console::Level;
use crate::playback::PlaybackState;

pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";

pub const ICON_PLAY: &str = "▶";
pub const ICON_STOP: &str = "■";

/// Prompt showing tempo and transport state, e.g. `120 ▶ › `.
pub fn format_prompt(tempo: u32, state: PlaybackState) -> String {
    let icon = match state {
        PlaybackState::Playing => ICON_PLAY,
        PlaybackState::Stopped => ICON_STOP,
    };
    format!("{} {} › ", tempo, icon)
}

/// One log line as printed above the prompt.
pub fn log_line(level: Level, text: &str) -> String {
    let Some(prefix) = level.prefix() else {
        return text.to_string();
    };
    let color = if level == Level::Error { RED } else { YELLOW };
    format!("{}{}:{} {}", color, prefix, RESET, text)
}

pub fn highlight(cell: char) -> String {
    format!("{}{}{}", GREEN, cell, RESET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_reflects_transport() {
        assert_eq!(format_prompt(120, PlaybackState::Playing), "120 ▶ › ");
        assert_eq!(format_prompt(95, PlaybackState::Stopped), "95 ■ › ");
    }

    #[test]
    fn errors_are_prefixed() {
        assert!(log_line(Level::Error, "boom").ends_with(" boom"));
        assert!(log_line(Level::Error, "boom").contains("error:"));
        assert_eq!(log_line(Level::Info, "Stopped"), "Stopped");
    }
}
