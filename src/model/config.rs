use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::time_signature::TimeSignature;

pub const TEMPO_MIN: u32 = 40;
pub const TEMPO_MAX: u32 = 240;
pub const TEMPO_DEFAULT: u32 = 120;
pub const LOOP_COUNT_DEFAULT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhythmFeel {
    #[default]
    Regular,
    Swing,
}

impl RhythmFeel {
    pub fn as_str(self) -> &'static str {
        match self {
            RhythmFeel::Regular => "regular",
            RhythmFeel::Swing => "swing",
        }
    }
}

impl fmt::Display for RhythmFeel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RhythmFeel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" | "straight" => Ok(RhythmFeel::Regular),
            "swing" => Ok(RhythmFeel::Swing),
            _ => anyhow::bail!("rhythm feel must be regular or swing"),
        }
    }
}

/// Transport settings read by the scheduler on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub tempo: u32,
    pub feel: RhythmFeel,
    pub looping: bool,
    /// Bars to play when `looping` is off.
    pub loop_count: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tempo: TEMPO_DEFAULT,
            feel: RhythmFeel::Regular,
            looping: true,
            loop_count: LOOP_COUNT_DEFAULT,
        }
    }
}

impl PlaybackConfig {
    /// Whether playback should end before playing anything in `bar`.
    pub fn is_finished(&self, bar: u32) -> bool {
        !self.looping && bar >= self.loop_count
    }
}

/// Startup settings, stored as YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tempo: u32,
    pub rhythm_feel: RhythmFeel,
    pub looping: bool,
    pub loop_count: u32,
    pub time_signature: TimeSignature,
    pub samples_dir: PathBuf,
    pub library_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let playback = PlaybackConfig::default();
        Self {
            tempo: playback.tempo,
            rhythm_feel: playback.feel,
            looping: playback.looping,
            loop_count: playback.loop_count,
            time_signature: TimeSignature::default(),
            samples_dir: PathBuf::from("split_sounds"),
            library_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Playback settings with out-of-range values pulled back to defaults.
    pub fn playback(&self) -> PlaybackConfig {
        let defaults = PlaybackConfig::default();
        PlaybackConfig {
            tempo: if (TEMPO_MIN..=TEMPO_MAX).contains(&self.tempo) {
                self.tempo
            } else {
                defaults.tempo
            },
            feel: self.rhythm_feel,
            looping: self.looping,
            loop_count: if self.loop_count > 0 { self.loop_count } else { defaults.loop_count },
        }
    }

    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.tempo = playback.tempo;
        self.rhythm_feel = playback.feel;
        self.looping = playback.looping;
        self.loop_count = playback.loop_count;
        self
    }
}
