//! Vocal remover: centre-channel cancellation via ffmpeg
//!
//! Vocals are usually mixed dead centre, so subtracting one stereo channel
//! from the other removes them (along with anything else panned centre).

use playstack_common::{ToolError, ToolInvocation, ToolRunner};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const INSTRUMENTAL_FILE: &str = "instrumental.wav";

/// Left minus right on both output channels
pub const CENTRE_CANCEL_FILTER: &str = "pan=stereo|c0=c0-c1|c1=c1-c0";

/// Vocal removal errors
#[derive(Debug, Error)]
pub enum VocalRemovalError {
    #[error("Vocal removal failed: {0}")]
    Tool(#[from] ToolError),

    #[error("ffmpeg finished but {0} is missing or empty")]
    MissingOutput(PathBuf),
}

/// ffmpeg wrapper
#[derive(Debug, Clone)]
pub struct VocalRemover {
    program: String,
}

impl VocalRemover {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `ffmpeg -y -i <input> -af <filter> <dir>/instrumental.wav`
    pub fn invocation(&self, input: &Path, out_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program)
            .args(["-y", "-i"])
            .arg(input)
            .args(["-af", CENTRE_CANCEL_FILTER])
            .arg(out_dir.join(INSTRUMENTAL_FILE))
    }

    pub async fn remove(
        &self,
        runner: &dyn ToolRunner,
        input: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf, VocalRemovalError> {
        runner.run(&self.invocation(input, out_dir)).await?;

        let output = out_dir.join(INSTRUMENTAL_FILE);
        let written = tokio::fs::metadata(&output)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !written {
            return Err(VocalRemovalError::MissingOutput(output));
        }
        info!(output = %output.display(), "Instrumental ready");
        Ok(output)
    }
}
