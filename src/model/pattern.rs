use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::voice::Voice;

/// One bar of step flags per voice. Every row has the same length.
///
/// Serialized as a flat `{"nagado": [..], "odaiko": [..], ..}` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    steps: usize,
    rows: BTreeMap<Voice, Vec<bool>>,
}

impl Pattern {
    /// An all-rest pattern with `steps` steps for every voice.
    pub fn new(steps: usize) -> Self {
        Self::filled(steps, false)
    }

    fn filled(steps: usize, value: bool) -> Self {
        let rows = Voice::ALL.iter().map(|&v| (v, vec![value; steps])).collect();
        Self { steps, rows }
    }

    /// Builds a pattern from named rows, as found in stored data.
    ///
    /// Unknown voice names are returned in the second slot. Missing voices get
    /// an empty row, and all rows are padded or cut to the longest one.
    pub fn from_named_rows<I>(named: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (String, Vec<bool>)>,
    {
        let mut rows = BTreeMap::new();
        let mut unknown = Vec::new();
        for (name, row) in named {
            match name.parse::<Voice>() {
                Ok(voice) => {
                    rows.insert(voice, row);
                }
                Err(_) => unknown.push(name),
            }
        }
        let steps = rows.values().map(Vec::len).max().unwrap_or(0);
        let mut pattern = Self { steps, rows };
        pattern.normalize(steps);
        (pattern, unknown)
    }

    /// Pads or truncates every row to `steps`, adding rows for missing voices.
    pub fn resized(mut self, steps: usize) -> Self {
        self.normalize(steps);
        self
    }

    fn normalize(&mut self, steps: usize) {
        for voice in Voice::ALL {
            self.rows.entry(voice).or_default().resize(steps, false);
        }
        self.steps = steps;
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn row(&self, voice: Voice) -> &[bool] {
        self.rows.get(&voice).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_active(&self, voice: Voice, step: usize) -> bool {
        self.row(voice).get(step).copied().unwrap_or(false)
    }

    /// Flips one step and returns its new state, or `None` when out of bounds.
    pub fn toggle(&mut self, voice: Voice, step: usize) -> Option<bool> {
        let cell = self.rows.get_mut(&voice)?.get_mut(step)?;
        *cell = !*cell;
        Some(*cell)
    }

    pub fn set_all(&mut self, value: bool) {
        *self = Self::filled(self.steps, value);
    }

    /// Voices with a hit on `step`, in voice order.
    pub fn active_at(&self, step: usize) -> impl Iterator<Item = Voice> + '_ {
        Voice::ALL.into_iter().filter(move |&v| self.is_active(v, step))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|row| row.iter().all(|&on| !on))
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let named = BTreeMap::<String, Vec<bool>>::deserialize(deserializer)?;
        let (pattern, unknown) = Pattern::from_named_rows(named);
        if !unknown.is_empty() {
            crate::console::warn(format!(
                "ignoring unknown voices in stored pattern: {}",
                unknown.join(", ")
            ));
        }
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pattern_is_all_rests() {
        let p = Pattern::new(12);
        assert_eq!(p.steps(), 12);
        for v in Voice::ALL {
            assert_eq!(p.row(v), &[false; 12][..]);
        }
        assert!(p.is_empty());
    }

    #[test]
    fn toggle_flips_and_ignores_out_of_range() {
        let mut p = Pattern::new(16);
        assert_eq!(p.toggle(Voice::Kane, 3), Some(true));
        assert!(p.is_active(Voice::Kane, 3));
        assert_eq!(p.toggle(Voice::Kane, 3), Some(false));
        assert_eq!(p.toggle(Voice::Kane, 16), None);
        assert!(p.is_empty());
    }

    #[test]
    fn active_at_lists_voices_in_order() {
        let mut p = Pattern::new(4);
        p.toggle(Voice::Kane, 1);
        p.toggle(Voice::Nagado, 1);
        p.toggle(Voice::Shime, 2);
        let hits: Vec<Voice> = p.active_at(1).collect();
        assert_eq!(hits, vec![Voice::Nagado, Voice::Kane]);
    }

    #[test]
    fn named_rows_are_normalized() {
        let named = vec![
            ("nagado".to_string(), vec![true, false, true]),
            ("click".to_string(), vec![true]),
            ("bongo".to_string(), vec![true]),
        ];
        let (p, unknown) = Pattern::from_named_rows(named);
        assert_eq!(unknown, vec!["bongo".to_string()]);
        assert_eq!(p.steps(), 3);
        assert_eq!(p.row(Voice::Kiai), &[true, false, false][..]);
        assert_eq!(p.row(Voice::Odaiko), &[false, false, false][..]);
    }

    #[test]
    fn serializes_as_flat_voice_map() {
        let mut p = Pattern::new(2);
        p.toggle(Voice::Shime, 0);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["shime"], serde_json::json!([true, false]));
        assert_eq!(json["kiai"], serde_json::json!([false, false]));
        let back: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
