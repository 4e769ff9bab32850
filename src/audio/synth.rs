//! Fallback tones for voices without a sample.

use std::f32::consts::PI;
use std::time::Duration;

use rodio::Source;

use crate::model::voice::Voice;

pub const SYNTH_SAMPLE_RATE: u32 = 44_100;

/// Gain at the attack.
const ENVELOPE_START: f32 = 0.3;
/// Gain reached at the end of the tone.
const ENVELOPE_END: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

impl Waveform {
    /// One cycle, `phase` in [0, 1).
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneProfile {
    pub frequency: f32,
    /// Seconds.
    pub duration: f32,
    pub waveform: Waveform,
}

impl ToneProfile {
    pub fn for_voice(voice: Voice) -> Self {
        let (frequency, duration, waveform) = match voice {
            Voice::Nagado => (200.0, 0.3, Waveform::Sine),
            Voice::Odaiko => (100.0, 0.5, Waveform::Sine),
            Voice::Shime => (400.0, 0.15, Waveform::Sine),
            Voice::Kiai => (600.0, 0.2, Waveform::Square),
            Voice::Chappa => (2000.0, 0.1, Waveform::Square),
            Voice::Kane => (1500.0, 0.25, Waveform::Triangle),
        };
        Self { frequency, duration, waveform }
    }
}

/// A mono one-shot with an exponential decay from 0.3 to 0.01.
pub struct Tone {
    profile: ToneProfile,
    sample_rate: u32,
    index: u32,
    total: u32,
}

impl Tone {
    pub fn new(profile: ToneProfile, sample_rate: u32) -> Self {
        let total = (profile.duration * sample_rate as f32).round() as u32;
        Self { profile, sample_rate, index: 0, total }
    }

    pub fn for_voice(voice: Voice) -> Self {
        Self::new(ToneProfile::for_voice(voice), SYNTH_SAMPLE_RATE)
    }

    fn envelope(&self, t: f32) -> f32 {
        let progress = (t / self.profile.duration).clamp(0.0, 1.0);
        ENVELOPE_START * (ENVELOPE_END / ENVELOPE_START).powf(progress)
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.total {
            return None;
        }
        let t = self.index as f32 / self.sample_rate as f32;
        let phase = (t * self.profile.frequency).fract();
        self.index += 1;
        Some(self.profile.waveform.sample(phase) * self.envelope(t))
    }
}

impl Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total - self.index) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(self.profile.duration))
    }
}
