//! The sequencer as one owned value: the pattern, transport settings,
//! scheduler and the collaborators they drive.
//!
//! Every user action is a [`Command`]. Invalid input never panics or returns
//! an error to the caller; it becomes an error [`Notice`] and leaves state
//! untouched.

use std::path::PathBuf;
use std::time::Duration;

use crate::audio::AudioSink;
use crate::model::config::{PlaybackConfig, RhythmFeel, TEMPO_MAX, TEMPO_MIN};
use crate::model::pattern::Pattern;
use crate::model::store::PatternStore;
use crate::model::time_signature::TimeSignature;
use crate::model::transport::TransportState;
use crate::model::voice::{Direction, Voice, VoiceSettings};
use crate::playback::{PlaybackState, Scheduler, TickContext};
use crate::storage::library::PatternLibrary;
use crate::ui::{Notice, UiHooks};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetTempo(u32),
    SetFeel(RhythmFeel),
    SetLooping(bool),
    SetLoopCount(u32),
    SetTimeSignature(TimeSignature),
    /// Zero-based step.
    ToggleStep { voice: Voice, step: usize },
    ClearAll,
    FillAll,
    AdjustPitch(Voice, Direction),
    AdjustVolume(Voice, Direction),
    ResetAllPitch,
    ResetAllVolume,
    Play,
    Stop,
    SavePattern(String),
    LoadPattern(String),
    DeletePattern(String),
    LoadSample(Voice, PathBuf),
}

/// A copy of everything a front end needs to draw the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pattern: Pattern,
    pub time_signature: TimeSignature,
    pub voices: [VoiceSettings; Voice::COUNT],
    pub config: PlaybackConfig,
    pub state: PlaybackState,
    /// Position of the next tick.
    pub transport: TransportState,
    pub saved: Vec<String>,
}

pub struct Session<A: AudioSink, U: UiHooks> {
    store: PatternStore,
    config: PlaybackConfig,
    scheduler: Scheduler,
    library: PatternLibrary,
    audio: A,
    ui: U,
    audio_woken: bool,
}

impl<A: AudioSink, U: UiHooks> Session<A, U> {
    pub fn new(
        store: PatternStore,
        config: PlaybackConfig,
        library: PatternLibrary,
        audio: A,
        ui: U,
    ) -> Self {
        Self {
            store,
            config,
            scheduler: Scheduler::new(),
            library,
            audio,
            ui,
            audio_woken: false,
        }
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn apply(&mut self, command: Command) {
        self.wake_audio();
        match command {
            Command::SetTempo(bpm) => self.set_tempo(bpm),
            Command::SetFeel(feel) => self.set_feel(feel),
            Command::SetLooping(on) => self.set_looping(on),
            Command::SetLoopCount(count) => self.set_loop_count(count),
            Command::SetTimeSignature(sig) => self.set_time_signature(sig),
            Command::ToggleStep { voice, step } => self.toggle_step(voice, step),
            Command::ClearAll => self.clear_all(),
            Command::FillAll => self.fill_all(),
            Command::AdjustPitch(voice, dir) => self.adjust_pitch(voice, dir),
            Command::AdjustVolume(voice, dir) => self.adjust_volume(voice, dir),
            Command::ResetAllPitch => self.reset_all_pitch(),
            Command::ResetAllVolume => self.reset_all_volume(),
            Command::Play => self.play(),
            Command::Stop => self.stop(),
            Command::SavePattern(name) => self.save_pattern(&name),
            Command::LoadPattern(name) => self.load_pattern(&name),
            Command::DeletePattern(name) => self.delete_pattern(&name),
            Command::LoadSample(voice, path) => self.load_sample(voice, path),
        }
    }

    /// Opens the audio device the first time the user does anything.
    fn wake_audio(&mut self) {
        if self.audio_woken {
            return;
        }
        self.audio_woken = true;
        if let Err(e) = self.audio.ensure_ready() {
            crate::console::error(format!("audio unavailable: {:#}", e));
        }
    }

    pub fn set_tempo(&mut self, bpm: u32) {
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&bpm) {
            self.notify(Notice::error(format!(
                "Tempo must be between {} and {} BPM",
                TEMPO_MIN, TEMPO_MAX
            )));
            return;
        }
        self.config.tempo = bpm;
        self.notify(Notice::info(format!("Tempo: {} BPM", bpm)));
        self.restart();
    }

    /// Takes effect from the next tick; no restart.
    pub fn set_feel(&mut self, feel: RhythmFeel) {
        self.config.feel = feel;
        self.notify(Notice::info(format!("Rhythm: {}", feel)));
    }

    /// Read by the next tick: turning looping off past the last bar stops
    /// playback there.
    pub fn set_looping(&mut self, on: bool) {
        self.config.looping = on;
        self.notify(Notice::info(format!("Loop: {}", if on { "on" } else { "off" })));
    }

    pub fn set_loop_count(&mut self, count: u32) {
        if count == 0 {
            self.notify(Notice::error("Loop count must be at least 1"));
            return;
        }
        self.config.loop_count = count;
        self.notify(Notice::info(format!("Loop count: {}", count)));
    }

    pub fn set_time_signature(&mut self, sig: TimeSignature) {
        self.switch_time_signature(sig);
        self.notify(Notice::info(format!("Time signature: {}", sig)));
        self.restart();
    }

    fn switch_time_signature(&mut self, sig: TimeSignature) {
        self.store.set_time_signature(sig);
        self.ui.on_grid_regenerated(sig, sig.steps_per_bar());
    }

    /// Flips one step. Turning a step on auditions the voice once.
    pub fn toggle_step(&mut self, voice: Voice, step: usize) {
        let Some(active) = self.store.toggle_step(voice, step) else {
            return;
        };
        self.ui.on_step_toggled(voice, step, active);
        if active {
            let settings = self.store.settings(voice);
            self.audio.play(voice, settings.pitch, settings.volume);
        }
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.refresh_grid();
        self.notify(Notice::info("All patterns cleared"));
    }

    pub fn fill_all(&mut self) {
        self.store.fill_all();
        self.refresh_grid();
        self.notify(Notice::info("All patterns filled"));
    }

    pub fn adjust_pitch(&mut self, voice: Voice, direction: Direction) {
        if let Some(pitch) = self.store.adjust_pitch(voice, direction) {
            let sign = if pitch > 0 { "+" } else { "" };
            self.notify(Notice::info(format!("{}: {}{} semitones", voice, sign, pitch)));
        }
    }

    pub fn adjust_volume(&mut self, voice: Voice, direction: Direction) {
        if let Some(volume) = self.store.adjust_volume(voice, direction) {
            self.notify(Notice::info(format!("{}: {}% volume", voice, volume)));
        }
    }

    pub fn reset_all_pitch(&mut self) {
        self.store.reset_all_pitch();
        self.notify(Notice::info("All pitch adjustments reset to 0"));
    }

    pub fn reset_all_volume(&mut self) {
        self.store.reset_all_volume();
        self.notify(Notice::info("All volume levels reset to 100%"));
    }

    pub fn play(&mut self) {
        let (scheduler, mut cx) = self.split();
        scheduler.start(&mut cx);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop(&mut self.ui);
    }

    fn restart(&mut self) {
        let (scheduler, mut cx) = self.split();
        scheduler.restart(&mut cx);
    }

    pub fn save_pattern(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.notify(Notice::error("Please enter a pattern name"));
            return;
        }
        let sig = self.store.time_signature();
        match self.library.save(name, self.store.pattern(), sig) {
            Ok(()) => self.notify(Notice::info(format!("Pattern \"{}\" saved ({})!", name, sig))),
            Err(e) => self.notify(Notice::error(format!("Could not save \"{}\": {}", name, e))),
        }
    }

    /// Restores a saved pattern, switching meter first when it differs.
    pub fn load_pattern(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.notify(Notice::error("Please select a pattern to load"));
            return;
        }
        let Some(entry) = self.library.load(name).cloned() else {
            self.notify(Notice::error(format!("Pattern \"{}\" not found", name)));
            return;
        };

        let sig = entry.saved.time_signature;
        let switched = sig != self.store.time_signature();
        if switched {
            self.switch_time_signature(sig);
        }
        self.store.replace_pattern(entry.saved.patterns);
        self.refresh_grid();

        let text = if entry.legacy {
            format!("Pattern \"{}\" loaded!", name)
        } else {
            format!("Pattern \"{}\" loaded ({})!", name, sig)
        };
        self.notify(Notice::info(text));
        if switched {
            self.restart();
        }
    }

    pub fn delete_pattern(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.notify(Notice::error("Please select a pattern to delete"));
            return;
        }
        match self.library.delete(name) {
            Ok(true) => self.notify(Notice::info(format!("Pattern \"{}\" deleted", name))),
            Ok(false) => self.notify(Notice::error(format!("Pattern \"{}\" not found", name))),
            Err(e) => self.notify(Notice::error(format!("Could not delete \"{}\": {}", name, e))),
        }
    }

    /// Replaces a voice's sound. On failure the previous sound stays.
    pub fn load_sample(&mut self, voice: Voice, path: PathBuf) {
        match self.audio.load_sample(voice, &path) {
            Ok(()) => self.notify(Notice::info(format!("{}: loaded {}", voice, path.display()))),
            Err(e) => self.notify(Notice::error(format!("{:#}", e))),
        }
    }

    /// Fires every tick due at `now` on the session's timeline.
    pub fn advance_clock(&mut self, now: Duration) {
        let (scheduler, mut cx) = self.split();
        scheduler.fire_due(now, &mut cx);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pattern: self.store.pattern().clone(),
            time_signature: self.store.time_signature(),
            voices: self.store.all_settings(),
            config: self.config,
            state: self.scheduler.state(),
            transport: self.scheduler.transport(),
            saved: self.library.names(),
        }
    }

    fn split(&mut self) -> (&mut Scheduler, TickContext<'_>) {
        let cx = TickContext {
            store: &self.store,
            config: &self.config,
            audio: &mut self.audio,
            ui: &mut self.ui,
        };
        (&mut self.scheduler, cx)
    }

    fn refresh_grid(&mut self) {
        let pattern = self.store.pattern();
        for voice in Voice::ALL {
            for (step, &active) in pattern.row(voice).iter().enumerate() {
                self.ui.on_step_toggled(voice, step, active);
            }
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.ui.on_notice(notice);
    }
}
