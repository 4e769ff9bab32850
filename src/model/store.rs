use super::pattern::Pattern;
use super::time_signature::TimeSignature;
use super::voice::{Direction, Voice, VoiceSettings};

/// The editable pattern: step rows, meter, and per-voice pitch and volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternStore {
    pattern: Pattern,
    time_signature: TimeSignature,
    voices: [VoiceSettings; Voice::COUNT],
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new(TimeSignature::default())
    }
}

impl PatternStore {
    pub fn new(time_signature: TimeSignature) -> Self {
        Self {
            pattern: Pattern::new(time_signature.steps_per_bar()),
            time_signature,
            voices: [VoiceSettings::default(); Voice::COUNT],
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn steps_per_bar(&self) -> usize {
        self.time_signature.steps_per_bar()
    }

    pub fn settings(&self, voice: Voice) -> VoiceSettings {
        self.voices[voice.index()]
    }

    pub fn all_settings(&self) -> [VoiceSettings; Voice::COUNT] {
        self.voices
    }

    /// Flips a step. Returns the new state, or `None` if `step` is outside the bar.
    pub fn toggle_step(&mut self, voice: Voice, step: usize) -> Option<bool> {
        self.pattern.toggle(voice, step)
    }

    /// Switches meter and discards every row; old hits are not resampled.
    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.pattern = Pattern::new(time_signature.steps_per_bar());
    }

    /// Replaces the rows, fitting them to the current bar length.
    pub fn replace_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern.resized(self.steps_per_bar());
    }

    pub fn clear_all(&mut self) {
        self.pattern.set_all(false);
    }

    pub fn fill_all(&mut self) {
        self.pattern.set_all(true);
    }

    /// Moves a voice one semitone. Out-of-range requests change nothing and
    /// return `None`.
    pub fn adjust_pitch(&mut self, voice: Voice, direction: Direction) -> Option<i8> {
        let slot = &mut self.voices[voice.index()];
        let next = slot.nudged_pitch(direction)?;
        slot.pitch = next;
        Some(next)
    }

    /// Moves a voice ten volume points; same rejection rule as pitch.
    pub fn adjust_volume(&mut self, voice: Voice, direction: Direction) -> Option<u8> {
        let slot = &mut self.voices[voice.index()];
        let next = slot.nudged_volume(direction)?;
        slot.volume = next;
        Some(next)
    }

    pub fn reset_all_pitch(&mut self) {
        for slot in &mut self.voices {
            slot.pitch = 0;
        }
    }

    pub fn reset_all_volume(&mut self) {
        for slot in &mut self.voices {
            slot.volume = VoiceSettings::default().volume;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::voice::{PITCH_MAX, VOLUME_MAX};

    #[test]
    fn time_signature_change_clears_rows_at_new_length() {
        let mut store = PatternStore::default();
        store.fill_all();
        for sig in [TimeSignature::ThreeFour, TimeSignature::SixEight, TimeSignature::FourFour] {
            store.fill_all();
            store.set_time_signature(sig);
            assert_eq!(store.pattern().steps(), sig.steps_per_bar());
            for v in Voice::ALL {
                assert_eq!(store.pattern().row(v).len(), sig.steps_per_bar());
            }
            assert!(store.pattern().is_empty());
        }
    }

    #[test]
    fn toggle_out_of_bounds_is_a_no_op() {
        let mut store = PatternStore::new(TimeSignature::ThreeFour);
        assert_eq!(store.toggle_step(Voice::Odaiko, 12), None);
        assert!(store.pattern().is_empty());
        assert_eq!(store.toggle_step(Voice::Odaiko, 11), Some(true));
    }

    #[test]
    fn clear_and_fill_cover_every_cell() {
        let mut store = PatternStore::default();
        store.fill_all();
        for v in Voice::ALL {
            assert!(store.pattern().row(v).iter().all(|&on| on));
        }
        store.clear_all();
        assert!(store.pattern().is_empty());
    }

    #[test]
    fn pitch_is_rejected_past_the_top() {
        let mut store = PatternStore::default();
        for _ in 0..5 {
            assert!(store.adjust_pitch(Voice::Kane, Direction::Up).is_some());
        }
        assert_eq!(store.settings(Voice::Kane).pitch, PITCH_MAX);
        assert_eq!(store.adjust_pitch(Voice::Kane, Direction::Up), None);
        assert_eq!(store.settings(Voice::Kane).pitch, PITCH_MAX);
    }

    #[test]
    fn volume_is_rejected_below_zero() {
        let mut store = PatternStore::default();
        for _ in 0..10 {
            store.adjust_volume(Voice::Shime, Direction::Down);
        }
        assert_eq!(store.settings(Voice::Shime).volume, 0);
        assert_eq!(store.adjust_volume(Voice::Shime, Direction::Down), None);
        assert_eq!(store.settings(Voice::Shime).volume, 0);
    }

    #[test]
    fn resets_restore_defaults_for_every_voice() {
        let mut store = PatternStore::default();
        for v in Voice::ALL {
            store.adjust_pitch(v, Direction::Down);
            store.adjust_volume(v, Direction::Up);
        }
        store.reset_all_pitch();
        store.reset_all_volume();
        for v in Voice::ALL {
            assert_eq!(store.settings(v), VoiceSettings::default());
        }
        for _ in 0..5 {
            store.adjust_volume(Voice::Kane, Direction::Up);
        }
        assert_eq!(store.settings(Voice::Kane).volume, VOLUME_MAX);
    }
}
