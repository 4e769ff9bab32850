use std::fmt;

/// Beats in every bar, whatever the meter.
pub const BEATS_PER_BAR: usize = 4;

/// Playback position. `step` counts ticks within the bar and `beat` is
/// derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportState {
    pub bar: u32,
    pub beat: usize,
    pub step: usize,
}

impl TransportState {
    pub fn start() -> Self {
        Self::default()
    }

    /// The position one tick later.
    ///
    /// The step wraps at `steps_per_bar` and the bar increments on the wrap.
    /// Beats span `steps_per_bar / beats_per_bar` steps, so a 12-step bar in
    /// four beats uses three steps per beat.
    #[must_use]
    pub fn advance(self, steps_per_bar: usize, beats_per_bar: usize) -> Self {
        let steps_per_bar = steps_per_bar.max(1);
        let beats_per_bar = beats_per_bar.clamp(1, steps_per_bar);
        let step = (self.step + 1) % steps_per_bar;
        let bar = if step == 0 { self.bar.saturating_add(1) } else { self.bar };
        let beat = step * beats_per_bar / steps_per_bar;
        Self { bar, beat, step }
    }
}

impl fmt::Display for TransportState {
    /// The beat indicator: one-based bar, beat and step.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bar {} | Beat {} | Step {}",
            self.bar + 1,
            self.beat + 1,
            self.step + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_pure() {
        let t = TransportState { bar: 1, beat: 2, step: 9 };
        assert_eq!(t.advance(16, 4), t.advance(16, 4));
        assert_eq!(t, TransportState { bar: 1, beat: 2, step: 9 });
    }

    #[test]
    fn full_bar_returns_to_start_step() {
        for steps in [12usize, 16] {
            let mut t = TransportState { bar: 0, beat: 1, step: 5 };
            for _ in 0..steps {
                t = t.advance(steps, BEATS_PER_BAR);
            }
            assert_eq!(t.step, 5);
            assert_eq!(t.bar, 1);
        }
    }

    #[test]
    fn beats_follow_quarter_groups_in_four_four() {
        let mut t = TransportState::start();
        let mut beats = vec![t.beat];
        for _ in 0..15 {
            t = t.advance(16, BEATS_PER_BAR);
            beats.push(t.beat);
        }
        assert_eq!(beats, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
        let next = t.advance(16, BEATS_PER_BAR);
        assert_eq!(next, TransportState { bar: 1, beat: 0, step: 0 });
    }

    #[test]
    fn twelve_step_bar_uses_three_steps_per_beat() {
        let mut t = TransportState::start();
        for _ in 0..3 {
            t = t.advance(12, BEATS_PER_BAR);
        }
        assert_eq!((t.beat, t.step), (1, 3));
        for _ in 0..9 {
            t = t.advance(12, BEATS_PER_BAR);
        }
        assert_eq!(t, TransportState { bar: 1, beat: 0, step: 0 });
    }

    #[test]
    fn indicator_is_one_based() {
        let t = TransportState { bar: 0, beat: 2, step: 10 };
        assert_eq!(t.to_string(), "Bar 1 | Beat 3 | Step 11");
    }
}
