//! Audio renderer: MIDI + soundfont → WAV via FluidSynth

use super::is_nonempty_file;
use playstack_common::config::{DEFAULT_SOUNDFONT, SOUNDFONT_ENV};
use playstack_common::{ToolError, ToolInvocation, ToolRunner};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rendered audio file name inside the job directory
pub const RENDER_FILE: &str = "render.wav";

/// Synthesis errors
#[derive(Debug, Error)]
pub enum SynthError {
    /// Configuration problem, raised before fluidsynth runs
    #[error(
        "Sound-font not found at {}. Set {} or place {} in the working directory.",
        .0.display(),
        SOUNDFONT_ENV,
        DEFAULT_SOUNDFONT
    )]
    SoundfontMissing(PathBuf),

    #[error("Synthesis failed: {0}")]
    Tool(#[from] ToolError),

    #[error("fluidsynth finished but {0} is missing or empty")]
    MissingOutput(PathBuf),
}

impl SynthError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, SynthError::SoundfontMissing(_))
    }
}

/// fluidsynth wrapper
#[derive(Debug, Clone)]
pub struct AudioRenderer {
    program: String,
    soundfont: PathBuf,
    sample_rate: u32,
}

impl AudioRenderer {
    pub fn new(program: impl Into<String>, soundfont: PathBuf, sample_rate: u32) -> Self {
        Self {
            program: program.into(),
            soundfont,
            sample_rate,
        }
    }

    pub fn soundfont(&self) -> &Path {
        &self.soundfont
    }

    pub fn check_soundfont(&self) -> Result<(), SynthError> {
        if self.soundfont.is_file() {
            Ok(())
        } else {
            Err(SynthError::SoundfontMissing(self.soundfont.clone()))
        }
    }

    /// `fluidsynth -ni <sf2> <midi> -F <dir>/render.wav -r <rate>`
    pub fn invocation(&self, midi: &Path, out_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program)
            .arg("-ni")
            .arg(&self.soundfont)
            .arg(midi)
            .arg("-F")
            .arg(out_dir.join(RENDER_FILE))
            .arg("-r")
            .arg(self.sample_rate.to_string())
    }

    pub async fn render(
        &self,
        runner: &dyn ToolRunner,
        midi: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf, SynthError> {
        self.check_soundfont()?;
        runner.run(&self.invocation(midi, out_dir)).await?;

        let wav = out_dir.join(RENDER_FILE);
        if !is_nonempty_file(&wav).await {
            return Err(SynthError::MissingOutput(wav));
        }
        Ok(wav)
    }
}
