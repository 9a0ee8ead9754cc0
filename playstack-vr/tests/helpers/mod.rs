//! Shared test fixtures for playstack-vr
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use playstack_common::{ToolError, ToolInvocation, ToolOutput, ToolRunner};
use playstack_vr::config::ServiceConfig;
use std::path::Path;
use std::sync::Mutex;

/// Fake yt-dlp and ffmpeg: record calls, write the expected outputs
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    /// Program that exits with status 1
    failing: Option<String>,
}

impl ScriptedRunner {
    pub fn failing(program: &str) -> Self {
        Self {
            failing: Some(program.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let program = invocation.program.clone();
        if self.failing.as_deref() == Some(program.as_str()) {
            return Err(ToolError::Failed {
                program,
                code: Some(1),
                stdout: String::new(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        match program.as_str() {
            "yt-dlp" => {
                let template = invocation.value_after("-o").unwrap().to_string_lossy().into_owned();
                std::fs::write(template.replace("%(ext)s", "wav"), b"RIFF downloaded").unwrap();
            }
            "ffmpeg" => {
                std::fs::write(invocation.args.last().unwrap(), b"RIFF instrumental").unwrap();
            }
            _ => return Err(ToolError::NotFound { program }),
        }
        Ok(ToolOutput::default())
    }
}

pub fn test_config(root: &Path) -> ServiceConfig {
    ServiceConfig {
        work_root: root.join("jobs"),
        ..ServiceConfig::default()
    }
}

pub const BOUNDARY: &str = "playstack-vr-boundary";

pub fn multipart_request(uri: &str, url: Option<&str>, file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(url) = url {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"url\"\r\n\r\n{}\r\n",
                BOUNDARY, url
            )
            .as_bytes(),
        );
    }
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
