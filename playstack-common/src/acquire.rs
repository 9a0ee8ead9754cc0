//! Input acquisition
//!
//! Turns a user-supplied video URL or an uploaded file into a local audio
//! file inside the job directory. URL downloads are delegated to yt-dlp,
//! uploads are written unchanged after an extension check. Both paths
//! validate their input before any external tool runs.

use crate::config::ToolsConfig;
use crate::tools::{ToolError, ToolInvocation, ToolRunner};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name (without extension) for downloaded audio
pub const DOWNLOAD_STEM: &str = "audio";
/// File name (without extension) for uploaded audio
pub const UPLOAD_STEM: &str = "upload";

/// Input acquisition errors
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Neither URL nor file supplied
    #[error("Please provide a YouTube URL or upload a file.")]
    NoInput,

    /// URL failed the pre-download check
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Upload extension not in the accepted list
    #[error("Unsupported file type '{extension}'. Accepted: {accepted}")]
    UnsupportedExtension { extension: String, accepted: String },

    /// Upload with no content
    #[error("Uploaded file '{0}' is empty")]
    EmptyUpload(String),

    /// Downloader failed
    #[error("Download failed: {0}")]
    Download(#[from] ToolError),

    /// Downloader reported success but produced no file
    #[error("Downloader finished but {0} was not created")]
    MissingDownload(PathBuf),

    /// Writing the upload failed
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquireError {
    /// True when the user supplied bad input (HTTP 400 territory)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AcquireError::NoInput
                | AcquireError::InvalidUrl(_)
                | AcquireError::UnsupportedExtension { .. }
                | AcquireError::EmptyUpload(_)
        )
    }

    /// Message shown to the user; includes downloader output when present
    pub fn user_detail(&self) -> String {
        match self {
            AcquireError::Download(tool @ ToolError::Failed { .. }) => format!(
                "{}\nIs the link valid and yt-dlp installed?{}",
                tool,
                tool.detail()
                    .strip_prefix(&tool.to_string())
                    .unwrap_or_default()
            ),
            AcquireError::Download(tool) => tool.detail(),
            other => other.to_string(),
        }
    }
}

/// What the user submitted
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Video page URL handed to the downloader
    Url(String),
    /// Uploaded file as received
    Upload { file_name: String, bytes: Bytes },
}

impl InputSource {
    /// Pick the input from raw form fields; a non-blank URL wins
    pub fn from_form(url: Option<String>, upload: Option<(String, Bytes)>) -> Result<Self, AcquireError> {
        if let Some(url) = url {
            let url = url.trim();
            if !url.is_empty() {
                return Ok(InputSource::Url(url.to_string()));
            }
        }
        match upload {
            Some((file_name, bytes)) if !file_name.trim().is_empty() => {
                Ok(InputSource::Upload { file_name, bytes })
            }
            _ => Err(AcquireError::NoInput),
        }
    }

    /// Short label for logs
    pub fn describe(&self) -> String {
        match self {
            InputSource::Url(url) => format!("url {}", url),
            InputSource::Upload { file_name, bytes } => {
                format!("upload {} ({} bytes)", file_name, bytes.len())
            }
        }
    }
}

/// How the audio arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOrigin {
    Downloaded,
    Uploaded,
}

/// Local audio ready for the next stage
#[derive(Debug, Clone)]
pub struct AcquiredAudio {
    pub path: PathBuf,
    pub origin: AudioOrigin,
}

/// Upload extensions accepted by the service (lowercase, no dot)
#[derive(Debug, Clone)]
pub struct AcceptedFormats {
    extensions: Vec<String>,
}

impl AcceptedFormats {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Comma-separated list for messages and the form's `accept` attribute
    pub fn accept_attribute(&self) -> String {
        self.extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Validate a file name, returning its normalized extension
    pub fn check(&self, file_name: &str) -> Result<String, AcquireError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !extension.is_empty() && self.extensions.iter().any(|e| *e == extension) {
            Ok(extension)
        } else {
            Err(AcquireError::UnsupportedExtension {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    extension
                },
                accepted: self.extensions.join(", "),
            })
        }
    }
}

impl Default for AcceptedFormats {
    fn default() -> Self {
        Self::new(["mp3", "wav"])
    }
}

/// Reject URLs the downloader should never see
///
/// Only absolute http(s) URLs without whitespace are passed on. Anything
/// else (including strings starting with `-`) fails here, before a process
/// is spawned.
pub fn validate_url(url: &str) -> Result<(), AcquireError> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .ok_or_else(|| AcquireError::InvalidUrl(format!("'{}' is not an http(s) URL", url)))?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(AcquireError::InvalidUrl(format!("'{}' has no host", url)));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(AcquireError::InvalidUrl(format!(
            "'{}' contains whitespace",
            url
        )));
    }
    Ok(())
}

/// yt-dlp wrapper
#[derive(Debug, Clone)]
pub struct Downloader {
    program: String,
    extra_args: Vec<String>,
}

impl Downloader {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(tools.yt_dlp.clone(), tools.yt_dlp_extra_args.clone())
    }

    /// Where the extracted WAV lands in `dir`
    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join(format!("{}.wav", DOWNLOAD_STEM))
    }

    /// `yt-dlp [extra] -x --audio-format wav -o <dir>/audio.%(ext)s -- <url>`
    pub fn invocation(&self, url: &str, dir: &Path) -> ToolInvocation {
        let template = dir.join(format!("{}.%(ext)s", DOWNLOAD_STEM));
        ToolInvocation::new(&self.program)
            .args(&self.extra_args)
            .args(["-x", "--audio-format", "wav", "-o"])
            .arg(template)
            .arg("--")
            .arg(url)
    }

    /// Download and extract audio for `url` into `dir`
    pub async fn download(
        &self,
        runner: &dyn ToolRunner,
        url: &str,
        dir: &Path,
    ) -> Result<PathBuf, AcquireError> {
        validate_url(url)?;
        info!(url = %url, "Downloading audio");

        runner.run(&self.invocation(url.trim(), dir)).await?;

        let path = Self::output_path(dir);
        if !path.is_file() {
            return Err(AcquireError::MissingDownload(path));
        }
        Ok(path)
    }
}

/// Write an upload to `dir/upload.<ext>` after validating it
pub async fn save_upload(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
    formats: &AcceptedFormats,
) -> Result<PathBuf, AcquireError> {
    let extension = formats.check(file_name)?;
    if bytes.is_empty() {
        return Err(AcquireError::EmptyUpload(file_name.to_string()));
    }

    let path = dir.join(format!("{}.{}", UPLOAD_STEM, extension));
    tokio::fs::write(&path, bytes).await?;
    info!(file_name = %file_name, bytes = bytes.len(), path = %path.display(), "Stored upload");
    Ok(path)
}

/// Input acquirer: resolve any [`InputSource`] to local audio
#[derive(Debug, Clone)]
pub struct InputAcquirer {
    pub downloader: Downloader,
    pub formats: AcceptedFormats,
}

impl InputAcquirer {
    pub fn new(downloader: Downloader, formats: AcceptedFormats) -> Self {
        Self { downloader, formats }
    }

    pub async fn acquire(
        &self,
        runner: &dyn ToolRunner,
        source: &InputSource,
        dir: &Path,
    ) -> Result<AcquiredAudio, AcquireError> {
        match source {
            InputSource::Url(url) => Ok(AcquiredAudio {
                path: self.downloader.download(runner, url, dir).await?,
                origin: AudioOrigin::Downloaded,
            }),
            InputSource::Upload { file_name, bytes } => Ok(AcquiredAudio {
                path: save_upload(dir, file_name, bytes, &self.formats).await?,
                origin: AudioOrigin::Uploaded,
            }),
        }
    }
}
