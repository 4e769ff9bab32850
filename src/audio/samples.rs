use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rodio::Decoder;

use crate::model::voice::Voice;

/// Encoded sample data per voice. Voices without an entry use their tone.
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: HashMap<Voice, Arc<[u8]>>,
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks for each voice's default file in `dir`. Missing or broken files
    /// are logged and skipped.
    pub fn load_defaults(dir: &Path) -> Self {
        let mut bank = Self::new();
        for voice in Voice::ALL {
            let found = voice
                .sample_file_names()
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file());
            let Some(path) = found else {
                crate::console::info(format!(
                    "Default sound not found for {}: {}",
                    voice,
                    dir.join(voice.sample_file_names()[0]).display()
                ));
                continue;
            };
            match bank.load(voice, &path) {
                Ok(()) => crate::console::info(format!(
                    "Loaded default sound for {}: {}",
                    voice,
                    path.display()
                )),
                Err(e) => crate::console::warn(format!("{:#}", e)),
            }
        }
        bank
    }

    /// Reads and validates a sample. On failure the previous sample is kept.
    pub fn load(&mut self, voice: Voice, path: &Path) -> Result<()> {
        let bytes: Arc<[u8]> = std::fs::read(path)
            .with_context(|| format!("cannot open sample {}", path.display()))?
            .into();
        Decoder::new(Cursor::new(Arc::clone(&bytes)))
            .with_context(|| format!("cannot decode sample {}", path.display()))?;
        self.samples.insert(voice, bytes);
        Ok(())
    }

    pub fn get(&self, voice: Voice) -> Option<&Arc<[u8]>> {
        self.samples.get(&voice)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
