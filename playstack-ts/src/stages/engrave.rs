//! Score renderer: MIDI → `score.ly` → `score.pdf`

use super::is_nonempty_file;
use crate::notation::{midi_to_lilypond, NotationError, NotationOptions, NotationStats};
use playstack_common::{ToolError, ToolInvocation, ToolRunner};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Notation source file name inside the job directory
pub const SCORE_SOURCE_FILE: &str = "score.ly";
/// Output stem handed to lilypond's `-o`
pub const SCORE_STEM: &str = "score";
pub const SCORE_PDF_FILE: &str = "score.pdf";

/// Score rendering errors
#[derive(Debug, Error)]
pub enum EngraveError {
    #[error("Could not read MIDI file {path}: {source}")]
    ReadMidi {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Notation conversion failed: {0}")]
    Notation(#[from] NotationError),

    #[error("Engraving failed: {0}")]
    Tool(#[from] ToolError),

    #[error("lilypond finished but {0} is missing or empty")]
    MissingOutput(PathBuf),

    #[error("Score rendering I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files written by a successful render
#[derive(Debug, Clone)]
pub struct ScoreOutput {
    pub source: PathBuf,
    pub pdf: PathBuf,
    pub stats: NotationStats,
}

/// MIDI → notation source → lilypond
#[derive(Debug, Clone)]
pub struct ScoreRenderer {
    program: String,
    options: NotationOptions,
}

impl ScoreRenderer {
    pub fn new(program: impl Into<String>, options: NotationOptions) -> Self {
        Self {
            program: program.into(),
            options,
        }
    }

    /// `lilypond --pdf -o <dir>/score <dir>/score.ly`
    pub fn invocation(&self, out_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program)
            .arg("--pdf")
            .arg("-o")
            .arg(out_dir.join(SCORE_STEM))
            .arg(out_dir.join(SCORE_SOURCE_FILE))
    }

    /// Write `score.ly` for `midi` without engraving it
    pub async fn write_source(&self, midi: &Path, out_dir: &Path) -> Result<(PathBuf, NotationStats), EngraveError> {
        let bytes = tokio::fs::read(midi).await.map_err(|source| EngraveError::ReadMidi {
            path: midi.to_path_buf(),
            source,
        })?;
        let (source, stats) = midi_to_lilypond(&bytes, &self.options)?;
        let path = out_dir.join(SCORE_SOURCE_FILE);
        tokio::fs::write(&path, source).await?;
        info!(notes = stats.notes, bars = stats.bars, path = %path.display(), "Notation source written");
        Ok((path, stats))
    }

    pub async fn render(
        &self,
        runner: &dyn ToolRunner,
        midi: &Path,
        out_dir: &Path,
    ) -> Result<ScoreOutput, EngraveError> {
        let (source, stats) = self.write_source(midi, out_dir).await?;
        runner.run(&self.invocation(out_dir)).await?;

        let pdf = out_dir.join(SCORE_PDF_FILE);
        if !is_nonempty_file(&pdf).await {
            return Err(EngraveError::MissingOutput(pdf));
        }
        Ok(ScoreOutput { source, pdf, stats })
    }
}
