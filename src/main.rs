use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use taiko_metronome::audio::samples::SampleBank;
use taiko_metronome::audio::{AudioSink, RodioSink, SilentSink};
use taiko_metronome::console;
use taiko_metronome::engine::{self, EngineHandle};
use taiko_metronome::model::config::Settings;
use taiko_metronome::model::store::PatternStore;
use taiko_metronome::repl::{self, ConsoleUi};
use taiko_metronome::session::Session;
use taiko_metronome::storage::kv::{FileStore, MemoryStore};
use taiko_metronome::storage::library::PatternLibrary;
use taiko_metronome::storage::settings as settings_io;

const DEFAULT_CONFIG: &str = "taiko.yaml";

fn cli() -> Command {
    Command::new("taiko")
        .about("Taiko drum sequencer and metronome")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Read settings from a YAML file (default: taiko.yaml if present)"),
        )
        .arg(
            Arg::new("samples")
                .long("samples")
                .value_name("DIR")
                .help("Directory holding the default voice sounds"),
        )
        .arg(
            Arg::new("library")
                .long("library")
                .value_name("DIR")
                .help("Directory holding saved patterns"),
        )
        .arg(
            Arg::new("no-audio")
                .long("no-audio")
                .action(ArgAction::SetTrue)
                .help("Run without opening an audio device"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("Print saved pattern names and exit"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Reduce startup banner output"),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let mut settings = load_settings(matches.get_one::<String>("config").map(PathBuf::from));
    if let Some(dir) = matches.get_one::<String>("samples") {
        settings.samples_dir = PathBuf::from(dir);
    }
    if let Some(dir) = matches.get_one::<String>("library") {
        settings.library_dir = PathBuf::from(dir);
    }

    if matches.get_flag("list") {
        let library = PatternLibrary::open(Box::new(FileStore::new(&settings.library_dir)))
            .with_context(|| format!("reading saved patterns in {}", settings.library_dir.display()))?;
        if library.is_empty() {
            println!("no saved patterns");
        }
        for name in library.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Subscribe before the engine starts so its startup messages are kept.
    let logs = console::subscribe();
    let engine = start_engine(&settings, matches.get_flag("no-audio"))?;

    if !matches.get_flag("quiet") {
        let playback = settings.playback();
        println!(
            "TAIKO METRONOME | bpm: {} sig: {} feel: {} (type :help)",
            playback.tempo, settings.time_signature, playback.feel
        );
    }

    repl::run_repl(&engine, &settings, logs)?;
    engine.shutdown()
}

/// Explicit config must load; the implicit default may be absent.
fn load_settings(explicit: Option<PathBuf>) -> Settings {
    let path = match explicit {
        Some(path) => path,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.exists() {
                return Settings::default();
            }
            default
        }
    };
    match settings_io::open(&path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to open {}: {:#}\nUsing default settings.", path.display(), e);
            Settings::default()
        }
    }
}

fn start_engine(settings: &Settings, no_audio: bool) -> Result<EngineHandle> {
    let settings = settings.clone();
    if no_audio {
        engine::spawn(move || build_session(&settings, SilentSink))
    } else {
        engine::spawn(move || {
            let samples = SampleBank::load_defaults(&settings.samples_dir);
            build_session(&settings, RodioSink::new(samples))
        })
    }
}

fn build_session<A: AudioSink>(settings: &Settings, audio: A) -> Session<A, ConsoleUi> {
    Session::new(
        PatternStore::new(settings.time_signature),
        settings.playback(),
        open_library(&settings.library_dir),
        audio,
        ConsoleUi::new(),
    )
}

fn open_library(dir: &Path) -> PatternLibrary {
    match PatternLibrary::open(Box::new(FileStore::new(dir))) {
        Ok(library) => library,
        Err(e) => {
            console::error(format!("saved patterns unavailable, changes will not be kept: {}", e));
            PatternLibrary::empty(Box::new(MemoryStore::new()))
        }
    }
}
