use std::time::Duration;

use crate::model::config::RhythmFeel;

/// Steps per quarter note. Step length depends only on tempo, never on the
/// meter, so 12-step bars run at the same step rate as 16-step bars.
pub const STEPS_PER_QUARTER: u32 = 4;

/// Stretch applied to even steps under swing.
pub const SWING_LONG: f64 = 1.2;
/// Squeeze applied to odd steps under swing. `SWING_LONG + SWING_SHORT == 2`.
pub const SWING_SHORT: f64 = 0.8;

/// Gain applied to samples at 100% volume.
pub const SAMPLE_HEADROOM: f32 = 0.7;

// --- Step timing (pure, testable) ---
pub fn base_step_period(tempo: u32) -> Duration {
    secs_to_duration(60.0 / tempo.max(1) as f64 / STEPS_PER_QUARTER as f64)
}

/// Time until the step after `step`, given the feel.
pub fn step_duration(tempo: u32, step: usize, feel: RhythmFeel) -> Duration {
    let base = base_step_period(tempo);
    match feel {
        RhythmFeel::Regular => base,
        RhythmFeel::Swing => {
            // Even steps lead each pair.
            let factor = if step % 2 == 0 { SWING_LONG } else { SWING_SHORT };
            secs_to_duration(base.as_secs_f64() * factor)
        }
    }
}

/// Rounds to the nearest nanosecond, so 0.125 * 1.2 lands on 150ms exactly.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::from_nanos((secs * 1e9).round() as u64)
}

pub fn pitch_semitones_to_speed(semi: i32) -> f32 {
    2f32.powf(semi as f32 / 12.0)
}

/// Linear sample gain for a volume percentage.
pub fn volume_to_gain(volume_percent: u8) -> f32 {
    SAMPLE_HEADROOM * volume_percent as f32 / 100.0
}
