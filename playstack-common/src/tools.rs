//! External tool invocation
//!
//! Every substantive operation (download, transcription, engraving,
//! synthesis, vocal removal) runs as a child process. Stages describe the
//! call as a [`ToolInvocation`] and hand it to a [`ToolRunner`]; production
//! code uses [`SystemToolRunner`], tests substitute a scripted runner.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Tool execution errors
#[derive(Debug, Error)]
pub enum ToolError {
    /// Executable not found in PATH (or at the configured path)
    #[error("{program} not found. Is it installed and on PATH?")]
    NotFound { program: String },

    /// Process could not be started for another reason
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Process ran and exited unsuccessfully
    #[error("{program} failed (exit code {})", exit_code_label(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "terminated by signal".to_string(),
    }
}

impl ToolError {
    /// Executable the error refers to
    pub fn program(&self) -> &str {
        match self {
            ToolError::NotFound { program }
            | ToolError::Spawn { program, .. }
            | ToolError::Failed { program, .. } => program,
        }
    }

    /// Message plus captured output, for display to the user
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        if let ToolError::Failed { program, stdout, stderr, .. } = self {
            if !stdout.trim().is_empty() {
                message.push_str(&format!("\n\n--- {} STDOUT ---\n{}", program, stdout.trim()));
            }
            if !stderr.trim().is_empty() {
                message.push_str(&format!("\n\n--- {} STDERR ---\n{}", program, stderr.trim()));
            }
        }
        message
    }
}

/// One external command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Argument at `index` as a path (used by scripted runners in tests)
    pub fn arg_path(&self, index: usize) -> Option<PathBuf> {
        self.args.get(index).map(PathBuf::from)
    }

    /// Argument following `flag`, e.g. the value of `-o`
    pub fn value_after(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured output of a successful run
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands
///
/// Implementations return `Err(ToolError::Failed)` for a non-zero exit so
/// callers only ever see successful output.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        debug!(command = %invocation, "Running external tool");
        let started = Instant::now();

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound {
                    program: invocation.program.clone(),
                }
            } else {
                ToolError::Spawn {
                    program: invocation.program.clone(),
                    source: e,
                }
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            warn!(
                program = %invocation.program,
                code = ?output.status.code(),
                elapsed_ms,
                "External tool exited unsuccessfully"
            );
            return Err(ToolError::Failed {
                program: invocation.program.clone(),
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        debug!(program = %invocation.program, elapsed_ms, "External tool finished");
        Ok(ToolOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_after_finds_flag_argument() {
        let inv = ToolInvocation::new("fluidsynth")
            .arg("-ni")
            .arg("font.sf2")
            .arg("song.mid")
            .arg("-F")
            .arg("/tmp/out.wav");
        assert_eq!(inv.value_after("-F"), Some(OsStr::new("/tmp/out.wav")));
        assert_eq!(inv.value_after("-r"), None);
        assert_eq!(inv.to_string(), "fluidsynth -ni font.sf2 song.mid -F /tmp/out.wav");
    }

    #[test]
    fn failed_detail_includes_captured_streams() {
        let err = ToolError::Failed {
            program: "yt-dlp".to_string(),
            code: Some(1),
            stdout: "".to_string(),
            stderr: "ERROR: Video unavailable\n".to_string(),
        };
        let detail = err.detail();
        assert!(detail.starts_with("yt-dlp failed (exit code 1)"));
        assert!(detail.contains("--- yt-dlp STDERR ---\nERROR: Video unavailable"));
        assert!(!detail.contains("STDOUT"));
    }

    #[tokio::test]
    async fn missing_executable_reports_not_found() {
        let inv = ToolInvocation::new("playstack-definitely-not-installed-tool");
        let err = SystemToolRunner.run(&inv).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
        assert_eq!(err.program(), "playstack-definitely-not-installed-tool");
    }
}
