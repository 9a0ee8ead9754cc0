//! Shared test fixtures: a scripted tool runner, config and request builders
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use playstack_common::{ToolError, ToolInvocation, ToolOutput, ToolRunner};
use playstack_ts::config::ServiceConfig;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stands in for the external tools: records each call and writes the
/// files the real tool would produce
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    failing: Option<(String, String)>,
    missing: Option<String>,
    hollow: Option<String>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `program` exits with status 1 and `stderr`
    pub fn failing(program: &str, stderr: &str) -> Self {
        Self {
            failing: Some((program.to_string(), stderr.to_string())),
            ..Self::default()
        }
    }

    /// `program` is not installed
    pub fn missing(program: &str) -> Self {
        Self {
            missing: Some(program.to_string()),
            ..Self::default()
        }
    }

    /// `program` exits 0 but leaves no usable output: yt-dlp writes
    /// nothing, basic-pitch writes a zero-byte MIDI file
    pub fn hollow(program: &str) -> Self {
        Self {
            hollow: Some(program.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let program = invocation.program.clone();

        if self.missing.as_deref() == Some(program.as_str()) {
            return Err(ToolError::NotFound { program });
        }
        if let Some((failing, stderr)) = &self.failing {
            if *failing == program {
                return Err(ToolError::Failed {
                    program,
                    code: Some(1),
                    stdout: String::new(),
                    stderr: stderr.clone(),
                });
            }
        }

        let hollow = self.hollow.as_deref() == Some(program.as_str());
        match program.as_str() {
            "yt-dlp" if hollow => {}
            "yt-dlp" => {
                let template = invocation.value_after("-o").unwrap().to_string_lossy().into_owned();
                std::fs::write(template.replace("%(ext)s", "wav"), b"RIFF downloaded").unwrap();
            }
            "basic-pitch" => {
                let out_dir = invocation.arg_path(0).unwrap();
                let audio = invocation.arg_path(1).unwrap();
                let stem = audio.file_stem().unwrap().to_string_lossy().into_owned();
                let midi = if hollow { Vec::new() } else { sample_midi() };
                std::fs::write(out_dir.join(format!("{}_basic_pitch.mid", stem)), midi).unwrap();
            }
            "lilypond" => {
                let stem = PathBuf::from(invocation.value_after("-o").unwrap());
                std::fs::write(stem.with_extension("pdf"), b"%PDF-1.4 engraved").unwrap();
            }
            "fluidsynth" => {
                std::fs::write(invocation.value_after("-F").unwrap(), b"RIFF rendered").unwrap();
            }
            "ffmpeg" => {
                let output = invocation.args.last().unwrap();
                std::fs::write(output, b"RIFF instrumental").unwrap();
            }
            _ => return Err(ToolError::NotFound { program }),
        }
        Ok(ToolOutput::default())
    }
}

/// Melody C-D-E-F over a held bass G, 480 ticks per quarter
pub fn sample_midi() -> Vec<u8> {
    let on = |delta: u32, key: u8| TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(90),
            },
        },
    };
    let off = |delta: u32, key: u8| TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        },
    };

    let track = vec![
        on(0, 43),
        on(0, 60),
        off(480, 60),
        on(0, 62),
        off(480, 62),
        on(0, 64),
        off(480, 64),
        on(0, 65),
        off(480, 65),
        off(0, 43),
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];
    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(480))),
        tracks: vec![track],
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

/// Config rooted in `root` with an existing soundfont
pub fn test_config(root: &Path) -> ServiceConfig {
    let soundfont = root.join("test.sf2");
    std::fs::write(&soundfont, b"sfbk").unwrap();
    ServiceConfig {
        work_root: root.join("jobs"),
        soundfont,
        ..ServiceConfig::default()
    }
}

pub const BOUNDARY: &str = "playstack-test-boundary";

/// multipart/form-data body with optional `url` and `file` fields
pub fn multipart_body(url: Option<&str>, file: Option<(&str, &[u8])>) -> Vec<u8> {
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
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
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
