use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use rustyline::{error::ReadlineError, history::DefaultHistory, Editor, ExternalPrinter};

use crate::console::Subscription;
use crate::engine::EngineHandle;
use crate::model::config::{RhythmFeel, Settings};
use crate::model::voice::{Direction, Voice};
use crate::playback::PlaybackState;
use crate::session::{Command, Snapshot};
use crate::storage::settings as settings_io;

mod completer;
pub mod live;
pub mod style;

use completer::TaikoHelper;
pub use live::ConsoleUi;

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplAction {
    Run(Command),
    Show,
    ListPatterns,
    SaveConfig(PathBuf),
    Help,
    Live(Option<bool>),
    Quit,
}

pub fn run_repl(engine: &EngineHandle, settings: &Settings, logs: Subscription) -> Result<()> {
    let helper = TaikoHelper::new(&settings.samples_dir);
    let mut rl = Editor::<TaikoHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(helper));

    // Background logs go through the external printer so they don't break the input line
    let printer: Option<PrinterFn> = match rl.create_external_printer() {
        Ok(mut pr) => Some(Box::new(move |s: String| {
            let _ = pr.print(s);
        })),
        Err(_) => None,
    };
    spawn_log_printer(logs, printer);

    loop {
        let prompt = match engine.snapshot() {
            Ok(snap) => style::format_prompt(snap.config.tempo, snap.state),
            Err(_) => "> ".to_string(),
        };
        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                match parse_line(&line) {
                    Ok(ReplAction::Quit) => {
                        println!("bye");
                        break;
                    }
                    Ok(action) => {
                        if let Err(e) = handle_action(engine, settings, action) {
                            eprintln!("error: {:#}", e);
                        }
                    }
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("bye");
                break;
            }
            Err(err) => {
                eprintln!("repl error: {}", err);
                break;
            }
        }
    }
    Ok(())
}

type PrinterFn = Box<dyn FnMut(String) + Send + 'static>;

/// Prints console messages as they arrive, for the rest of the process.
fn spawn_log_printer(logs: Subscription, mut printer: Option<PrinterFn>) {
    thread::spawn(move || {
        while let Some(message) = logs.recv() {
            let line = style::log_line(message.level, &message.text);
            match printer.as_mut() {
                Some(print) => print(line),
                None => println!("{}", line),
            }
        }
    });
}

fn handle_action(engine: &EngineHandle, settings: &Settings, action: ReplAction) -> Result<()> {
    match action {
        ReplAction::Run(command) => engine.send(command)?,
        ReplAction::Show => println!("{}", render_grid(&engine.snapshot()?)),
        ReplAction::ListPatterns => println!("{}", render_pattern_list(&engine.snapshot()?.saved)),
        ReplAction::SaveConfig(path) => {
            let snap = engine.snapshot()?;
            let mut current = settings.clone().with_playback(snap.config);
            current.time_signature = snap.time_signature;
            settings_io::save(&current, &path)?;
            println!("saved settings to {}", path.display());
        }
        ReplAction::Help => println!("{}", HELP),
        ReplAction::Live(None) => println!(
            "live view: {}",
            if live::live_view_enabled() { "on" } else { "off" }
        ),
        ReplAction::Live(Some(on)) => {
            live::set_live_view(on);
            println!("live view {}", if on { "on" } else { "off" });
        }
        ReplAction::Quit => {}
    }
    Ok(())
}

pub fn parse_line(line: &str) -> Result<ReplAction> {
    let l = line.trim();
    if let Some(rest) = l.strip_prefix(':') {
        return parse_meta(rest);
    }

    let words = shlex::split(l).ok_or_else(|| anyhow!("unbalanced quotes"))?;
    let Some((cmd, args)) = words.split_first() else {
        bail!("empty command");
    };

    let command = match cmd.as_str() {
        "bpm" => {
            let raw = arg(args, 0, "bpm <40-240>")?;
            Command::SetTempo(raw.parse::<u32>().with_context(|| format!("invalid tempo '{}'", raw))?)
        }
        "feel" => Command::SetFeel(arg(args, 0, "feel regular|swing")?.parse::<RhythmFeel>()?),
        "loop" => Command::SetLooping(parse_on_off(arg(args, 0, "loop on|off")?)?),
        "loops" => {
            let raw = arg(args, 0, "loops <count>")?;
            Command::SetLoopCount(raw.parse::<u32>().with_context(|| format!("invalid loop count '{}'", raw))?)
        }
        "sig" => Command::SetTimeSignature(arg(args, 0, "sig 4/4|3/4|6/8")?.parse()?),
        "toggle" => {
            let voice: Voice = arg(args, 0, "toggle <voice> <step>")?.parse()?;
            let raw = arg(args, 1, "toggle <voice> <step>")?;
            let step: usize = raw.parse().with_context(|| format!("invalid step '{}'", raw))?;
            if step == 0 {
                bail!("steps are numbered from 1");
            }
            Command::ToggleStep { voice, step: step - 1 }
        }
        "clear" => Command::ClearAll,
        "fill" => Command::FillAll,
        "pitch" | "volume" => {
            let usage = format!("{} <voice> up|down", cmd);
            let voice: Voice = arg(args, 0, &usage)?.parse()?;
            let direction: Direction = arg(args, 1, &usage)?.parse()?;
            if cmd.as_str() == "pitch" {
                Command::AdjustPitch(voice, direction)
            } else {
                Command::AdjustVolume(voice, direction)
            }
        }
        "reset" => match arg(args, 0, "reset pitch|volume")? {
            "pitch" => Command::ResetAllPitch,
            "volume" => Command::ResetAllVolume,
            other => bail!("cannot reset '{}' (expected pitch or volume)", other),
        },
        "play" => Command::Play,
        "stop" => Command::Stop,
        // Blank names go through so the session reports them.
        "save" => Command::SavePattern(args.join(" ")),
        "load" => Command::LoadPattern(args.join(" ")),
        "delete" => Command::DeletePattern(args.join(" ")),
        "sample" => {
            let voice: Voice = arg(args, 0, "sample <voice> \"path\"")?.parse()?;
            Command::LoadSample(voice, PathBuf::from(arg(args, 1, "sample <voice> \"path\"")?))
        }
        "show" => return Ok(ReplAction::Show),
        "patterns" => return Ok(ReplAction::ListPatterns),
        "config" => return Ok(ReplAction::SaveConfig(PathBuf::from(arg(args, 0, "config \"file.yaml\"")?))),
        other => bail!("unknown command '{}' (type :help)", other),
    };
    Ok(ReplAction::Run(command))
}

fn arg<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("usage: {}", usage))
}

fn parse_meta(meta: &str) -> Result<ReplAction> {
    match meta.trim() {
        "help" => Ok(ReplAction::Help),
        "q" | "quit" | "exit" => Ok(ReplAction::Quit),
        "live" => Ok(ReplAction::Live(None)),
        "live on" => Ok(ReplAction::Live(Some(true))),
        "live off" => Ok(ReplAction::Live(Some(false))),
        other => bail!("unknown meta command ':{}'", other),
    }
}

fn parse_on_off(raw: &str) -> Result<bool> {
    match raw {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => bail!("expected on or off"),
    }
}

/// The pattern grid, one row per voice.
///
/// `|` marks accented steps. While playing, the step that is sounding is
/// highlighted.
pub fn render_grid(snap: &Snapshot) -> String {
    let sig = snap.time_signature;
    let steps = snap.pattern.steps();
    let playhead = match snap.state {
        PlaybackState::Playing if steps > 0 => Some((snap.transport.step + steps - 1) % steps),
        _ => None,
    };

    let loop_label = if snap.config.looping {
        "loop on".to_string()
    } else {
        format!("{} bars", snap.config.loop_count)
    };
    let mut out = format!(
        "{} | {} BPM | {} | {} | {}\n",
        sig, snap.config.tempo, snap.config.feel, loop_label, snap.state
    );
    for voice in Voice::ALL {
        let mut cells = String::new();
        for (step, &hit) in snap.pattern.row(voice).iter().enumerate() {
            if sig.is_accent(step) {
                cells.push('|');
            }
            let ch = if hit { 'x' } else { '.' };
            if playhead == Some(step) {
                cells.push_str(&style::highlight(ch));
            } else {
                cells.push(ch);
            }
        }
        let settings = snap.voices[voice.index()];
        out.push_str(&format!(
            "{:<7}{}  {:+} st  {:>3}%\n",
            voice.label(),
            cells,
            settings.pitch,
            settings.volume
        ));
    }
    out.pop();
    out
}

fn render_pattern_list(names: &[String]) -> String {
    if names.is_empty() {
        "no saved patterns".to_string()
    } else {
        names.join("\n")
    }
}

const HELP: &str = r#"Commands:
  :help                  Show this help
  :q / :quit             Exit
  :live [on|off]         Print the beat indicator while playing

Transport:
  play | stop            Start/stop playback
  bpm <n>                Set tempo (40-240)
  feel regular|swing     Set rhythm feel
  loop on|off            Loop forever, or stop after `loops` bars
  loops <n>              Bars to play when looping is off
  sig 4/4|3/4|6/8        Set time signature (clears the grid)

Pattern:
  toggle <voice> <step>  Flip a step (steps start at 1)
  clear | fill           Clear or fill every step
  show                   Print the grid

Voices: nagado odaiko shime kiai chappa kane
  pitch <voice> up|down  Shift by a semitone (-5..+5)
  volume <voice> up|down Change by 10% (0-150%)
  reset pitch|volume     Reset every voice
  sample <voice> "path"  Use a sound file (Tab for autocomplete)

Library:
  save <name>            Save the pattern with its time signature
  load <name>            Load a saved pattern
  delete <name>          Delete a saved pattern
  patterns               List saved patterns
  config "file.yaml"     Write current settings
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::PlaybackConfig;
    use crate::model::pattern::Pattern;
    use crate::model::time_signature::TimeSignature;
    use crate::model::transport::TransportState;
    use crate::model::voice::VoiceSettings;

    fn run(line: &str) -> Command {
        match parse_line(line).unwrap() {
            ReplAction::Run(command) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn toggle_steps_are_one_based() {
        assert_eq!(run("toggle odaiko 1"), Command::ToggleStep { voice: Voice::Odaiko, step: 0 });
        assert_eq!(run("toggle click 16"), Command::ToggleStep { voice: Voice::Kiai, step: 15 });
        assert!(parse_line("toggle odaiko 0").is_err());
        assert!(parse_line("toggle taiko 1").is_err());
    }

    #[test]
    fn transport_commands_parse() {
        assert_eq!(run("bpm 140"), Command::SetTempo(140));
        assert_eq!(run("feel swing"), Command::SetFeel(RhythmFeel::Swing));
        assert_eq!(run("loop off"), Command::SetLooping(false));
        assert_eq!(run("loops 2"), Command::SetLoopCount(2));
        assert_eq!(run("sig 6/8"), Command::SetTimeSignature(TimeSignature::SixEight));
        assert!(parse_line("bpm fast").is_err());
        assert!(parse_line("sig 5/4").is_err());
    }

    #[test]
    fn voice_adjustments_parse() {
        assert_eq!(run("pitch kane up"), Command::AdjustPitch(Voice::Kane, Direction::Up));
        assert_eq!(run("volume shime down"), Command::AdjustVolume(Voice::Shime, Direction::Down));
        assert_eq!(run("reset volume"), Command::ResetAllVolume);
        assert!(parse_line("pitch kane sideways").is_err());
    }

    #[test]
    fn names_may_be_quoted_or_blank() {
        assert_eq!(run(r#"save "big drum""#), Command::SavePattern("big drum".into()));
        assert_eq!(run("load festival groove"), Command::LoadPattern("festival groove".into()));
        assert_eq!(run("delete"), Command::DeletePattern(String::new()));
        assert!(parse_line(r#"save "open"#).is_err());
    }

    #[test]
    fn meta_and_view_commands() {
        assert_eq!(parse_line(":q").unwrap(), ReplAction::Quit);
        assert_eq!(parse_line(":live on").unwrap(), ReplAction::Live(Some(true)));
        assert_eq!(parse_line("show").unwrap(), ReplAction::Show);
        assert_eq!(
            parse_line(r#"config "taiko.yaml""#).unwrap(),
            ReplAction::SaveConfig(PathBuf::from("taiko.yaml"))
        );
        assert!(parse_line("dance").is_err());
    }

    fn snapshot(sig: TimeSignature) -> Snapshot {
        Snapshot {
            pattern: Pattern::new(sig.steps_per_bar()),
            time_signature: sig,
            voices: [VoiceSettings::default(); Voice::COUNT],
            config: PlaybackConfig::default(),
            state: PlaybackState::Stopped,
            transport: TransportState::start(),
            saved: Vec::new(),
        }
    }

    #[test]
    fn grid_marks_hits_and_accents() {
        let mut snap = snapshot(TimeSignature::ThreeFour);
        snap.pattern.toggle(Voice::Nagado, 0);
        snap.pattern.toggle(Voice::Nagado, 4);
        snap.voices[Voice::Nagado.index()].pitch = -2;
        let grid = render_grid(&snap);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 1 + Voice::COUNT);
        assert_eq!(lines[0], "3/4 | 120 BPM | regular | loop on | stopped");
        assert_eq!(lines[1], "Nagado |x..|.x.|...|...  -2 st  100%");
        assert_eq!(lines[6], "Kane   |...|...|...|...  +0 st  100%");
    }

    #[test]
    fn grid_highlights_sounding_step() {
        let mut snap = snapshot(TimeSignature::SixEight);
        snap.state = PlaybackState::Playing;
        snap.transport.step = 3;
        let grid = render_grid(&snap);
        let odaiko = grid.lines().nth(2).unwrap();
        assert_eq!(odaiko, format!("Odaiko |..{}...|......  +0 st  100%", style::highlight('.')));
    }
}
