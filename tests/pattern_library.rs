use std::fs;
use std::path::Path;

use taiko_metronome::audio::SilentSink;
use taiko_metronome::model::config::PlaybackConfig;
use taiko_metronome::model::store::PatternStore;
use taiko_metronome::model::time_signature::TimeSignature;
use taiko_metronome::model::voice::Voice;
use taiko_metronome::session::{Command, Session};
use taiko_metronome::storage::kv::FileStore;
use taiko_metronome::storage::library::{PatternLibrary, STORAGE_KEY};
use taiko_metronome::ui::{Notice, UiHooks};

#[derive(Default)]
struct Notices(Vec<Notice>);

impl UiHooks for Notices {
    fn on_notice(&mut self, notice: Notice) {
        self.0.push(notice);
    }
}

fn session_in(dir: &Path) -> Session<SilentSink, Notices> {
    let library = PatternLibrary::open(Box::new(FileStore::new(dir))).expect("open library");
    Session::new(
        PatternStore::default(),
        PlaybackConfig::default(),
        library,
        SilentSink,
        Notices::default(),
    )
}

fn last_notice(s: &Session<SilentSink, Notices>) -> &str {
    &s.ui().0.last().expect("notice").text
}

#[test]
fn saved_pattern_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = session_in(dir.path());
    first.apply(Command::SetTimeSignature(TimeSignature::ThreeFour));
    first.apply(Command::ToggleStep { voice: Voice::Chappa, step: 11 });
    first.apply(Command::ToggleStep { voice: Voice::Nagado, step: 0 });
    first.apply(Command::SavePattern("matsuri".into()));
    let expected = first.store().pattern().clone();
    drop(first);

    let mut second = session_in(dir.path());
    assert_eq!(second.library().names(), vec!["matsuri".to_string()]);
    second.apply(Command::LoadPattern("matsuri".into()));
    assert_eq!(last_notice(&second), "Pattern \"matsuri\" loaded (3/4)!");
    assert_eq!(second.store().time_signature(), TimeSignature::ThreeFour);
    assert_eq!(second.store().pattern(), &expected);
}

#[test]
fn stored_json_uses_camel_case_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session_in(dir.path());
    s.apply(Command::SetTimeSignature(TimeSignature::SixEight));
    s.apply(Command::SavePattern("jig".into()));

    let text = fs::read_to_string(dir.path().join(format!("{}.json", STORAGE_KEY))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["jig"]["timeSignature"], "6/8");
    assert_eq!(json["jig"]["stepsPerBar"], 12);
    assert_eq!(json["jig"]["patterns"]["kane"].as_array().unwrap().len(), 12);
}

#[test]
fn legacy_file_loads_as_four_four_without_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = r#"{"old": {"nagado": [true, false, false, false, true],
                             "click": [false, true]}}"#;
    fs::write(dir.path().join("taikoPatterns.json"), legacy).unwrap();

    let mut s = session_in(dir.path());
    s.apply(Command::SetTimeSignature(TimeSignature::ThreeFour));
    s.apply(Command::LoadPattern("old".into()));

    assert_eq!(last_notice(&s), "Pattern \"old\" loaded!");
    assert_eq!(s.store().time_signature(), TimeSignature::FourFour);
    let pattern = s.store().pattern();
    assert_eq!(pattern.steps(), 16);
    assert!(pattern.is_active(Voice::Nagado, 4));
    assert!(pattern.is_active(Voice::Kiai, 1));
    assert!(!pattern.is_active(Voice::Kiai, 0));
}

#[test]
fn delete_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session_in(dir.path());
    s.apply(Command::SavePattern("a".into()));
    s.apply(Command::SavePattern("b".into()));
    s.apply(Command::DeletePattern("a".into()));
    assert_eq!(last_notice(&s), "Pattern \"a\" deleted");
    s.apply(Command::DeletePattern("a".into()));
    assert_eq!(last_notice(&s), "Pattern \"a\" not found");
    drop(s);

    let reopened = session_in(dir.path());
    assert_eq!(reopened.library().names(), vec!["b".to_string()]);
}

#[test]
fn saving_overwrites_same_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session_in(dir.path());
    s.apply(Command::SavePattern("groove".into()));
    s.apply(Command::FillAll);
    s.apply(Command::SavePattern("groove".into()));
    s.apply(Command::ClearAll);
    s.apply(Command::LoadPattern("groove".into()));
    assert_eq!(s.library().len(), 1);
    assert!(s.store().pattern().is_active(Voice::Shime, 7));
}
