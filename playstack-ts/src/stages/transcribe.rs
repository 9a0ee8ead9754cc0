//! Transcriber: audio → MIDI via basic-pitch
//!
//! basic-pitch picks its own output name, so the stage looks for the known
//! naming patterns first and then for any MIDI file the run created, and
//! renames the result to `transcription.mid`.

use super::is_nonempty_file;
use playstack_common::{ToolError, ToolInvocation, ToolRunner};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Final MIDI file name inside the job directory
pub const MIDI_FILE: &str = "transcription.mid";

/// Transcription errors
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("Transcription failed: {0}")]
    Tool(#[from] ToolError),

    #[error("basic-pitch finished but no MIDI file was found in {0}")]
    MissingOutput(PathBuf),

    #[error("basic-pitch produced an empty MIDI file: {0}")]
    EmptyOutput(PathBuf),

    #[error("Transcription I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// basic-pitch wrapper
#[derive(Debug, Clone)]
pub struct Transcriber {
    program: String,
}

impl Transcriber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `basic-pitch <out_dir> <audio>`
    pub fn invocation(&self, audio: &Path, out_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program).arg(out_dir).arg(audio)
    }

    /// Transcribe `audio`, leaving `out_dir/transcription.mid`
    pub async fn transcribe(
        &self,
        runner: &dyn ToolRunner,
        audio: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf, TranscribeError> {
        let before = midi_files(out_dir)?;
        runner.run(&self.invocation(audio, out_dir)).await?;

        let found = find_output(out_dir, audio, &before)?
            .ok_or_else(|| TranscribeError::MissingOutput(out_dir.to_path_buf()))?;

        let midi_path = out_dir.join(MIDI_FILE);
        if found != midi_path {
            debug!(from = %found.display(), to = %midi_path.display(), "Renaming MIDI output");
            tokio::fs::rename(&found, &midi_path).await?;
        }
        if !is_nonempty_file(&midi_path).await {
            return Err(TranscribeError::EmptyOutput(midi_path));
        }

        info!(midi = %midi_path.display(), "MIDI ready");
        Ok(midi_path)
    }
}

fn is_midi(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
        .unwrap_or(false)
}

fn midi_files(dir: &Path) -> std::io::Result<HashSet<PathBuf>> {
    let mut files = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_midi(&path) {
            files.insert(path);
        }
    }
    Ok(files)
}

/// Locate the MIDI file a run produced
///
/// Known names first (`<stem>_basic_pitch.mid`, `<stem>.mid`,
/// `audio_basic_pitch.mid`, `audio.mid`), then the first new MIDI file in
/// name order.
fn find_output(
    dir: &Path,
    audio: &Path,
    before: &HashSet<PathBuf>,
) -> std::io::Result<Option<PathBuf>> {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let candidates = [
        format!("{}_basic_pitch.mid", stem),
        format!("{}.mid", stem),
        "audio_basic_pitch.mid".to_string(),
        "audio.mid".to_string(),
    ];
    for name in candidates {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    let mut new_files: Vec<PathBuf> = midi_files(dir)?
        .into_iter()
        .filter(|p| !before.contains(p))
        .collect();
    new_files.sort();
    Ok(new_files.into_iter().next())
}
