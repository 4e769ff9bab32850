use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest pitch offset a voice accepts, in semitones.
pub const PITCH_MIN: i8 = -5;
/// Highest pitch offset a voice accepts, in semitones.
pub const PITCH_MAX: i8 = 5;
/// Semitones moved by one pitch adjustment.
pub const PITCH_STEP: i8 = 1;

pub const VOLUME_MIN: u8 = 0;
pub const VOLUME_MAX: u8 = 150;
pub const VOLUME_STEP: u8 = 10;
pub const VOLUME_DEFAULT: u8 = 100;

/// A percussion instrument track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Nagado,
    Odaiko,
    Shime,
    #[serde(alias = "click")]
    Kiai,
    Chappa,
    Kane,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Nagado,
        Voice::Odaiko,
        Voice::Shime,
        Voice::Kiai,
        Voice::Chappa,
        Voice::Kane,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Voice::Nagado => "nagado",
            Voice::Odaiko => "odaiko",
            Voice::Shime => "shime",
            Voice::Kiai => "kiai",
            Voice::Chappa => "chappa",
            Voice::Kane => "kane",
        }
    }

    /// Display label used in grid rows ("Nagado").
    pub fn label(self) -> &'static str {
        match self {
            Voice::Nagado => "Nagado",
            Voice::Odaiko => "Odaiko",
            Voice::Shime => "Shime",
            Voice::Kiai => "Kiai",
            Voice::Chappa => "Chappa",
            Voice::Kane => "Kane",
        }
    }

    /// Default sample file names searched in the samples directory, in order.
    pub fn sample_file_names(self) -> &'static [&'static str] {
        match self {
            Voice::Nagado => &["Nagado.wav"],
            Voice::Odaiko => &["Odaiko.wav"],
            Voice::Shime => &["Shime.wav"],
            Voice::Kiai => &["Kiai.wav", "Click.wav"],
            Voice::Chappa => &["Chappa.wav"],
            Voice::Kane => &["Kane.wav"],
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown voice '{0}' (expected one of nagado, odaiko, shime, kiai, chappa, kane)")]
pub struct ParseVoiceError(pub String);

impl FromStr for Voice {
    type Err = ParseVoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nagado" => Ok(Voice::Nagado),
            "odaiko" => Ok(Voice::Odaiko),
            "shime" => Ok(Voice::Shime),
            "kiai" | "click" => Ok(Voice::Kiai),
            "chappa" => Ok(Voice::Chappa),
            "kane" => Ok(Voice::Kane),
            _ => Err(ParseVoiceError(s.to_string())),
        }
    }
}

/// Direction of a pitch or volume adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "+" => Ok(Direction::Up),
            "down" | "-" => Ok(Direction::Down),
            _ => anyhow::bail!("direction must be up or down"),
        }
    }
}

/// Per-voice playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSettings {
    /// Semitones, within [`PITCH_MIN`, `PITCH_MAX`].
    pub pitch: i8,
    /// Percent, within [`VOLUME_MIN`, `VOLUME_MAX`].
    pub volume: u8,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self { pitch: 0, volume: VOLUME_DEFAULT }
    }
}

impl VoiceSettings {
    /// Pitch after one adjustment, or `None` when it would leave the range.
    pub fn nudged_pitch(&self, direction: Direction) -> Option<i8> {
        let next = match direction {
            Direction::Up => self.pitch.checked_add(PITCH_STEP)?,
            Direction::Down => self.pitch.checked_sub(PITCH_STEP)?,
        };
        (PITCH_MIN..=PITCH_MAX).contains(&next).then_some(next)
    }

    /// Volume after one adjustment, or `None` when it would leave the range.
    pub fn nudged_volume(&self, direction: Direction) -> Option<u8> {
        let next = match direction {
            Direction::Up => self.volume.checked_add(VOLUME_STEP)?,
            Direction::Down => self.volume.checked_sub(VOLUME_STEP)?,
        };
        (VOLUME_MIN..=VOLUME_MAX).contains(&next).then_some(next)
    }
}
