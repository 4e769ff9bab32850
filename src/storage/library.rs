//! Named patterns kept under one key of a [`KeyValueStore`].
//!
//! The whole map is read once on open and written back in full after every
//! change. Entries come in two shapes:
//!
//! ```json
//! { "groove": { "patterns": { "nagado": [true, false, ..], .. },
//!               "timeSignature": "3/4", "stepsPerBar": 12 },
//!   "old":    { "nagado": [true, false, ..], "odaiko": [..], .. } }
//! ```
//!
//! The second, legacy shape has no meter and is always read as 4/4.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kv::{KeyValueStore, StoreError};
use crate::model::pattern::Pattern;
use crate::model::time_signature::TimeSignature;
use crate::model::voice::Voice;

pub const STORAGE_KEY: &str = "taikoPatterns";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPattern {
    pub patterns: Pattern,
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Informational only; rows are fitted to `time_signature` on load.
    #[serde(default = "default_steps_per_bar")]
    pub steps_per_bar: usize,
}

fn default_steps_per_bar() -> usize {
    TimeSignature::default().steps_per_bar()
}

impl SavedPattern {
    pub fn new(pattern: Pattern, time_signature: TimeSignature) -> Self {
        Self {
            patterns: pattern,
            time_signature,
            steps_per_bar: time_signature.steps_per_bar(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub saved: SavedPattern,
    /// Stored without a meter.
    pub legacy: bool,
}

pub struct PatternLibrary {
    store: Box<dyn KeyValueStore>,
    /// Exactly what is written back, malformed entries included.
    raw: Map<String, Value>,
    entries: BTreeMap<String, LibraryEntry>,
}

impl PatternLibrary {
    pub fn open(store: Box<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let raw = match store.get(STORAGE_KEY)? {
            None => Map::new(),
            Some(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    crate::console::warn("saved patterns are unreadable; starting with an empty library");
                    Map::new()
                }
            },
        };

        let mut entries = BTreeMap::new();
        for (name, value) in &raw {
            match decode_entry(value) {
                Ok(entry) => {
                    entries.insert(name.clone(), entry);
                }
                Err(e) => crate::console::warn(format!("skipping saved pattern \"{}\": {}", name, e)),
            }
        }
        Ok(Self { store, raw, entries })
    }

    /// A library that starts empty, ignoring whatever `store` holds until
    /// the first write replaces it.
    pub fn empty(store: Box<dyn KeyValueStore>) -> Self {
        Self { store, raw: Map::new(), entries: BTreeMap::new() }
    }

    /// Stores `pattern` under `name`, replacing any entry with that name.
    ///
    /// Nothing changes in memory if the store rejects the write.
    pub fn save(
        &mut self,
        name: &str,
        pattern: &Pattern,
        time_signature: TimeSignature,
    ) -> Result<(), StoreError> {
        let saved = SavedPattern::new(pattern.clone(), time_signature);
        let value = serde_json::to_value(&saved)?;
        let previous = self.raw.insert(name.to_string(), value);
        if let Err(e) = self.flush() {
            match previous {
                Some(v) => self.raw.insert(name.to_string(), v),
                None => self.raw.remove(name),
            };
            return Err(e);
        }
        self.entries.insert(name.to_string(), LibraryEntry { saved, legacy: false });
        Ok(())
    }

    pub fn load(&self, name: &str) -> Option<&LibraryEntry> {
        self.entries.get(name)
    }

    /// Returns whether an entry was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool, StoreError> {
        let Some(previous) = self.raw.remove(name) else {
            return Ok(false);
        };
        if let Err(e) = self.flush() {
            self.raw.insert(name.to_string(), previous);
            return Err(e);
        }
        self.entries.remove(name);
        Ok(true)
    }

    /// Loadable names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let text = serde_json::to_string(&self.raw)?;
        self.store.set(STORAGE_KEY, &text)
    }
}

/// Tells the two stored shapes apart by looking for a bare array under a
/// voice key.
fn decode_entry(value: &Value) -> Result<LibraryEntry, serde_json::Error> {
    let legacy = value.as_object().is_some_and(|fields| {
        fields.iter().any(|(key, field)| field.is_array() && key.parse::<Voice>().is_ok())
    });
    if legacy {
        let pattern = Pattern::deserialize(value)?;
        return Ok(LibraryEntry {
            saved: SavedPattern::new(pattern, TimeSignature::FourFour),
            legacy: true,
        });
    }
    let saved = SavedPattern::deserialize(value)?;
    Ok(LibraryEntry { saved, legacy: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;

    fn open(store: MemoryStore) -> PatternLibrary {
        PatternLibrary::open(Box::new(store)).unwrap()
    }

    struct ReadOnly(MemoryStore);

    impl KeyValueStore for ReadOnly {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read only"),
            })
        }
    }

    #[test]
    fn save_then_load_keeps_rows_and_meter() {
        let mut lib = open(MemoryStore::new());
        let mut pattern = Pattern::new(12);
        pattern.toggle(Voice::Shime, 3);
        lib.save("waltz", &pattern, TimeSignature::ThreeFour).unwrap();

        let entry = lib.load("waltz").unwrap();
        assert!(!entry.legacy);
        assert_eq!(entry.saved.patterns, pattern);
        assert_eq!(entry.saved.time_signature, TimeSignature::ThreeFour);
        assert_eq!(entry.saved.steps_per_bar, 12);
    }

    #[test]
    fn legacy_entry_reads_as_four_four() {
        let raw = r#"{"old": {"nagado": [true, false, false, false], "click": [false, true]}}"#;
        let lib = open(MemoryStore::new().with_entry(STORAGE_KEY, raw));
        let entry = lib.load("old").unwrap();
        assert!(entry.legacy);
        assert_eq!(entry.saved.time_signature, TimeSignature::FourFour);
        assert!(entry.saved.patterns.is_active(Voice::Nagado, 0));
        assert!(entry.saved.patterns.is_active(Voice::Kiai, 1));
    }

    #[test]
    fn entry_without_meter_defaults_to_four_four() {
        let raw = r#"{"bare": {"patterns": {"kane": [true]}}}"#;
        let lib = open(MemoryStore::new().with_entry(STORAGE_KEY, raw));
        let entry = lib.load("bare").unwrap();
        assert!(!entry.legacy);
        assert_eq!(entry.saved.time_signature, TimeSignature::FourFour);
        assert_eq!(entry.saved.steps_per_bar, 16);
    }

    #[test]
    fn malformed_entries_are_skipped_but_kept() {
        let raw = r#"{"bad": {"patterns": 7}, "good": {"patterns": {}, "timeSignature": "6/8"}}"#;
        let mut lib = open(MemoryStore::new().with_entry(STORAGE_KEY, raw));
        assert_eq!(lib.names(), vec!["good".to_string()]);
        lib.save("new", &Pattern::new(16), TimeSignature::FourFour).unwrap();
        assert!(lib.raw.contains_key("bad"));
    }

    #[test]
    fn unreadable_blob_starts_empty() {
        let lib = open(MemoryStore::new().with_entry(STORAGE_KEY, "[1, 2"));
        assert!(lib.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let mut lib = open(MemoryStore::new());
        for name in ["zeta", "Alpha", "beta"] {
            lib.save(name, &Pattern::new(16), TimeSignature::FourFour).unwrap();
        }
        assert_eq!(lib.names(), vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let mut lib = open(MemoryStore::new());
        lib.save("a", &Pattern::new(16), TimeSignature::FourFour).unwrap();
        assert!(lib.delete("a").unwrap());
        assert!(!lib.delete("a").unwrap());
        assert!(lib.load("a").is_none());
    }

    #[test]
    fn failed_write_leaves_library_unchanged() {
        let mut lib = PatternLibrary::open(Box::new(ReadOnly(MemoryStore::new()))).unwrap();
        assert!(lib.save("x", &Pattern::new(16), TimeSignature::FourFour).is_err());
        assert!(!lib.contains("x"));
        assert!(lib.raw.is_empty());
    }
}
