use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};

use crate::model::voice::Voice;

pub mod samples;
pub mod synth;
pub mod timing;

use samples::SampleBank;
use synth::Tone;
use timing::{pitch_semitones_to_speed, volume_to_gain};

/// Where triggered voices end up.
///
/// `play` is fire-and-forget and must be safe to call before
/// `ensure_ready`; such calls are dropped.
pub trait AudioSink {
    /// Opens the output device. Called once, on the first user command.
    fn ensure_ready(&mut self) -> Result<()> {
        Ok(())
    }

    fn play(&mut self, voice: Voice, pitch: i8, volume: u8);

    fn load_sample(&mut self, voice: Voice, _path: &Path) -> Result<()> {
        bail!("this output cannot load a sample for {}", voice)
    }
}

/// Discards everything. Used with `--no-audio`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&mut self, _voice: Voice, _pitch: i8, _volume: u8) {}
}

/// Plays samples through the default output device, falling back to a
/// synthesized tone for voices without one.
pub struct RodioSink {
    output: Option<(OutputStream, OutputStreamHandle)>,
    samples: SampleBank,
}

impl RodioSink {
    pub fn new(samples: SampleBank) -> Self {
        Self { output: None, samples }
    }
}

impl AudioSink for RodioSink {
    fn ensure_ready(&mut self) -> Result<()> {
        if self.output.is_none() {
            self.output = Some(OutputStream::try_default().context("opening audio output")?);
        }
        Ok(())
    }

    fn play(&mut self, voice: Voice, pitch: i8, volume: u8) {
        let Some((_, handle)) = &self.output else { return };
        let result = match self.samples.get(voice) {
            Some(bytes) => play_sample(handle, bytes, pitch, volume),
            None => handle
                .play_raw(Tone::for_voice(voice))
                .context("starting synthesized tone"),
        };
        if let Err(e) = result {
            crate::console::error(format!("audio error: {:#}", e));
        }
    }

    fn load_sample(&mut self, voice: Voice, path: &Path) -> Result<()> {
        self.samples.load(voice, path)
    }
}

fn play_sample(handle: &OutputStreamHandle, bytes: &Arc<[u8]>, pitch: i8, volume: u8) -> Result<()> {
    let decoded = Decoder::new(Cursor::new(Arc::clone(bytes))).context("decoding sample")?;
    let source = decoded
        .speed(pitch_semitones_to_speed(i32::from(pitch)))
        .amplify(volume_to_gain(volume))
        .convert_samples::<f32>();
    handle.play_raw(source).context("starting sample")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_before_ready_is_dropped() {
        let mut sink = RodioSink::new(SampleBank::new());
        // No device has been opened, so this must return quietly.
        sink.play(Voice::Kane, 0, 100);
        assert!(sink.output.is_none());
    }

    #[test]
    fn silent_sink_cannot_load_samples() {
        let mut sink = SilentSink;
        let err = sink.load_sample(Voice::Odaiko, Path::new("x.wav")).unwrap_err();
        assert!(err.to_string().contains("odaiko"));
    }
}
