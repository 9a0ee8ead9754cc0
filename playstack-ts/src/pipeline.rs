//! Audio → MIDI → score → audio pipeline
//!
//! Stages run strictly in order inside one job directory; each stage's
//! output file is the next stage's input. The first failure halts the run
//! and is returned together with the stage report.

use crate::config::ServiceConfig;
use crate::notation::{NotationOptions, NotationStats};
use crate::stages::{
    AudioRenderer, EngraveError, ScoreRenderer, SynthError, TranscribeError, Transcriber,
};
use playstack_common::acquire::{
    AcceptedFormats, AcquireError, Downloader, InputAcquirer, InputSource,
};
use playstack_common::report::{run_stage, PipelineReport};
use playstack_common::ToolRunner;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Transcribe,
    Engrave,
    Synthesize,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Acquire, Stage::Transcribe, Stage::Engrave, Stage::Synthesize];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Acquire => "Input acquisition",
            Stage::Transcribe => "Transcription",
            Stage::Engrave => "Score rendering",
            Stage::Synthesize => "Audio rendering",
        }
    }

    fn labels() -> [&'static str; 4] {
        Self::ALL.map(|s| s.label())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error from whichever stage failed
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
    #[error(transparent)]
    Engrave(#[from] EngraveError),
    #[error(transparent)]
    Synthesize(#[from] SynthError),
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Acquire(_) => Stage::Acquire,
            StageError::Transcribe(_) => Stage::Transcribe,
            StageError::Engrave(_) => Stage::Engrave,
            StageError::Synthesize(_) => Stage::Synthesize,
        }
    }

    /// Bad user input; nothing downstream ran
    pub fn is_input_error(&self) -> bool {
        matches!(self, StageError::Acquire(e) if e.is_input_error())
    }

    /// Server misconfiguration (e.g. missing soundfont)
    pub fn is_config_error(&self) -> bool {
        matches!(self, StageError::Synthesize(e) if e.is_config_error())
    }

    /// Message for the user, with tool output where there is any
    pub fn user_detail(&self) -> String {
        match self {
            StageError::Acquire(e) => e.user_detail(),
            StageError::Transcribe(TranscribeError::Tool(tool))
            | StageError::Engrave(EngraveError::Tool(tool))
            | StageError::Synthesize(SynthError::Tool(tool)) => tool.detail(),
            other => other.to_string(),
        }
    }
}

/// A run that stopped at `stage`
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub error: StageError,
    pub report: PipelineReport,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Files produced by a successful run
#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    pub audio: PathBuf,
    pub midi: PathBuf,
    pub notation_source: PathBuf,
    pub pdf: PathBuf,
    pub wav: PathBuf,
    pub notation: NotationStats,
}

/// Successful run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub artifacts: PipelineArtifacts,
    pub report: PipelineReport,
}

/// Stage wiring for the transcribe service
pub struct Pipeline {
    runner: Arc<dyn ToolRunner>,
    acquirer: InputAcquirer,
    transcriber: Transcriber,
    score: ScoreRenderer,
    audio: AudioRenderer,
}

impl Pipeline {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        acquirer: InputAcquirer,
        transcriber: Transcriber,
        score: ScoreRenderer,
        audio: AudioRenderer,
    ) -> Self {
        Self {
            runner,
            acquirer,
            transcriber,
            score,
            audio,
        }
    }

    pub fn from_config(runner: Arc<dyn ToolRunner>, config: &ServiceConfig) -> Self {
        let tools = &config.tools;
        Self::new(
            runner,
            InputAcquirer::new(
                Downloader::from_config(tools),
                AcceptedFormats::new(&config.accepted_extensions),
            ),
            Transcriber::new(&tools.basic_pitch),
            ScoreRenderer::new(&tools.lilypond, NotationOptions::default()),
            AudioRenderer::new(&tools.fluidsynth, config.soundfont.clone(), config.sample_rate),
        )
    }

    pub fn accepted_formats(&self) -> &AcceptedFormats {
        &self.acquirer.formats
    }

    pub fn audio_renderer(&self) -> &AudioRenderer {
        &self.audio
    }

    /// Run every stage for `source` inside `dir`
    pub async fn run(&self, job_id: Uuid, source: &InputSource, dir: &Path) -> Result<PipelineRun, PipelineFailure> {
        info!(job_id = %job_id, input = %source.describe(), "Pipeline started");
        let mut report = PipelineReport::new(job_id, &Stage::labels());

        match self.run_stages(&mut report, source, dir).await {
            Ok(artifacts) => {
                info!(
                    job_id = %job_id,
                    elapsed_ms = report.total_elapsed_ms(),
                    notes = artifacts.notation.notes,
                    "Pipeline complete"
                );
                Ok(PipelineRun { artifacts, report })
            }
            Err(error) => Err(PipelineFailure {
                stage: error.stage(),
                error,
                report,
            }),
        }
    }

    async fn run_stages(
        &self,
        report: &mut PipelineReport,
        source: &InputSource,
        dir: &Path,
    ) -> Result<PipelineArtifacts, StageError> {
        let runner = self.runner.as_ref();

        let audio = run_stage(report, Stage::Acquire.label(), self.acquirer.acquire(runner, source, dir)).await?;
        let midi = run_stage(
            report,
            Stage::Transcribe.label(),
            self.transcriber.transcribe(runner, &audio.path, dir),
        )
        .await?;
        let score = run_stage(report, Stage::Engrave.label(), self.score.render(runner, &midi, dir)).await?;
        let wav = run_stage(report, Stage::Synthesize.label(), self.audio.render(runner, &midi, dir)).await?;

        Ok(PipelineArtifacts {
            audio: audio.path,
            midi,
            notation_source: score.source,
            pdf: score.pdf,
            wav,
            notation: score.stats,
        })
    }
}
