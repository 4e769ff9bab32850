//! Tab completion for the taiko REPL.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::path::Path;

use crate::model::time_signature::TimeSignature;
use crate::model::voice::Voice;

/// REPL helper providing command, argument and sample path completion.
pub struct TaikoHelper {
    /// Cached sample paths for fast lookup
    sample_cache: Vec<String>,
}

impl TaikoHelper {
    pub fn new(samples_dir: &Path) -> Self {
        Self { sample_cache: scan_samples_dir(samples_dir) }
    }
}

/// Scan the samples directory recursively and return all sample paths.
fn scan_samples_dir(dir: &Path) -> Vec<String> {
    let mut samples = Vec::new();
    if dir.is_dir() {
        collect_samples(dir, &mut samples);
    }
    samples.sort();
    samples
}

fn collect_samples(dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_samples(&path, out);
        } else if is_audio_file(&path) {
            if let Some(s) = path.to_str() {
                out.push(s.to_string());
            }
        }
    }
}

fn is_audio_file(path: &Path) -> bool {
    let Some(ext) = path.extension() else { return false };
    let ext = ext.to_string_lossy().to_lowercase();
    matches!(ext.as_str(), "wav" | "mp3")
}

/// Commands available in the REPL.
const COMMANDS: &[&str] = &[
    "bpm", "feel", "loop", "loops", "sig", "toggle", "clear", "fill",
    "pitch", "volume", "reset", "play", "stop", "save", "load", "delete",
    "patterns", "sample", "show", "config",
];

/// Meta commands (prefixed with :).
const META_COMMANDS: &[&str] = &[":help", ":q", ":quit", ":exit", ":live", ":live on", ":live off"];

const DIRECTIONS: &[&str] = &["up", "down"];

/// Candidates for argument `index` (1-based) of `command`.
fn argument_candidates(command: &str, index: usize) -> Vec<&'static str> {
    let voices = || -> Vec<&'static str> { Voice::ALL.iter().map(|v| v.as_str()).collect() };
    match (command, index) {
        ("toggle" | "pitch" | "volume" | "sample", 1) => voices(),
        ("pitch" | "volume", 2) => DIRECTIONS.to_vec(),
        ("feel", 1) => vec!["regular", "swing"],
        ("loop", 1) => vec!["on", "off"],
        ("reset", 1) => vec!["pitch", "volume"],
        ("sig", 1) => TimeSignature::ALL.iter().map(|s| s.as_str()).collect(),
        _ => Vec::new(),
    }
}

fn pairs<'a>(candidates: impl IntoIterator<Item = &'a str>, prefix: &str) -> Vec<Pair> {
    candidates
        .into_iter()
        .filter(|c| c.starts_with(prefix))
        .map(|c| Pair {
            display: c.to_string(),
            replacement: c.to_string(),
        })
        .collect()
}

impl Completer for TaikoHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_pos = &line[..pos];

        if line_to_pos.starts_with(':') {
            return Ok((0, pairs(META_COMMANDS.iter().copied(), line_to_pos)));
        }

        if let Some(sample_start) = find_sample_completion_start(line_to_pos) {
            let prefix = &line_to_pos[sample_start..];
            let matches: Vec<Pair> = self
                .sample_cache
                .iter()
                .filter(|path| path.starts_with(prefix) || path.contains(prefix))
                .map(|path| Pair {
                    display: path.clone(),
                    replacement: format!("\"{}\"", path),
                })
                .take(20)
                .collect();
            return Ok((sample_start, matches));
        }

        let words: Vec<&str> = line_to_pos.split_whitespace().collect();
        let completing_new_word = line_to_pos.ends_with(' ');
        if words.is_empty() || (words.len() == 1 && !completing_new_word) {
            let prefix = words.first().copied().unwrap_or("");
            return Ok((0, pairs(COMMANDS.iter().copied(), prefix)));
        }

        let (index, prefix) = if completing_new_word {
            (words.len(), "")
        } else {
            (words.len() - 1, words[words.len() - 1])
        };
        let start = pos - prefix.len();
        Ok((start, pairs(argument_candidates(words[0], index), prefix)))
    }
}

/// Find the start position of a sample path to complete.
/// Returns Some(pos) if we're inside a sample command's path argument.
fn find_sample_completion_start(line: &str) -> Option<usize> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.first().map(|p| p.to_lowercase()) != Some("sample".into()) {
        return None;
    }

    // Open quote with no closing quote after it
    if let Some(quote_pos) = line.rfind('"') {
        if line[..quote_pos].matches('"').count() % 2 == 0 {
            return Some(quote_pos + 1);
        }
    }

    // sample <voice> <partial_path>
    if parts.len() >= 3 && !line.ends_with(' ') {
        let last = parts[parts.len() - 1];
        if last.contains('/') {
            return line.rfind(last);
        }
    }

    None
}

impl Hinter for TaikoHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for TaikoHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        // Dim the hint
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }
}

impl Validator for TaikoHelper {}

impl Helper for TaikoHelper {}
