//! Acquire → remove vocals

use crate::config::ServiceConfig;
use crate::vocals::{VocalRemovalError, VocalRemover};
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    RemoveVocals,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Acquire => "Input acquisition",
            Stage::RemoveVocals => "Vocal removal",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    RemoveVocals(#[from] VocalRemovalError),
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Acquire(_) => Stage::Acquire,
            StageError::RemoveVocals(_) => Stage::RemoveVocals,
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, StageError::Acquire(e) if e.is_input_error())
    }

    pub fn user_detail(&self) -> String {
        match self {
            StageError::Acquire(e) => e.user_detail(),
            StageError::RemoveVocals(VocalRemovalError::Tool(tool)) => tool.detail(),
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

#[derive(Debug, Clone)]
pub struct InstrumentalRun {
    pub audio: PathBuf,
    pub instrumental: PathBuf,
    pub report: PipelineReport,
}

pub struct Pipeline {
    runner: Arc<dyn ToolRunner>,
    acquirer: InputAcquirer,
    remover: VocalRemover,
}

impl Pipeline {
    pub fn new(runner: Arc<dyn ToolRunner>, acquirer: InputAcquirer, remover: VocalRemover) -> Self {
        Self {
            runner,
            acquirer,
            remover,
        }
    }

    pub fn from_config(runner: Arc<dyn ToolRunner>, config: &ServiceConfig) -> Self {
        Self::new(
            runner,
            InputAcquirer::new(
                Downloader::from_config(&config.tools),
                AcceptedFormats::new(&config.accepted_extensions),
            ),
            VocalRemover::new(&config.tools.ffmpeg),
        )
    }

    pub fn accepted_formats(&self) -> &AcceptedFormats {
        &self.acquirer.formats
    }

    pub async fn run(&self, job_id: Uuid, source: &InputSource, dir: &Path) -> Result<InstrumentalRun, PipelineFailure> {
        info!(job_id = %job_id, input = %source.describe(), "Vocal removal started");
        let mut report = PipelineReport::new(job_id, &[Stage::Acquire.label(), Stage::RemoveVocals.label()]);

        match self.run_stages(&mut report, source, dir).await {
            Ok((audio, instrumental)) => Ok(InstrumentalRun {
                audio,
                instrumental,
                report,
            }),
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
    ) -> Result<(PathBuf, PathBuf), StageError> {
        let runner = self.runner.as_ref();
        let audio = run_stage(report, Stage::Acquire.label(), self.acquirer.acquire(runner, source, dir)).await?;
        let instrumental = run_stage(
            report,
            Stage::RemoveVocals.label(),
            self.remover.remove(runner, &audio.path, dir),
        )
        .await?;
        Ok((audio.path, instrumental))
    }
}
