//! Transcription endpoints
//!
//! `POST /transcribe` serves the HTML form, `POST /api/transcribe` the same
//! input as JSON. Both block until the pipeline finishes.

use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Response},
    routing::post,
    Json, Router,
};
use playstack_common::acquire::InputSource;
use playstack_common::form::Submission;
use playstack_common::jobs::{ArtifactKind, CompletedJob, JobDir, MIDI_ARTIFACT, PDF_ARTIFACT, WAV_ARTIFACT};
use playstack_common::report::PipelineReport;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use super::ui::{error_page, result_page};
use crate::notation::NotationStats;
use crate::{ApiError, ApiResult, AppState};

/// A finished job, ready to present
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub links: Vec<(ArtifactKind, String)>,
    pub report: PipelineReport,
    pub notation: NotationStats,
}

impl JobOutcome {
    pub fn link(&self, kind: ArtifactKind) -> Option<&str> {
        self.links
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, url)| url.as_str())
    }
}

/// JSON result of `POST /api/transcribe`
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub job_id: Uuid,
    /// Artifact key → download URL
    pub artifacts: BTreeMap<&'static str, String>,
    pub notes: usize,
    pub bars: u32,
    pub report: PipelineReport,
}

impl From<JobOutcome> for TranscribeResponse {
    fn from(outcome: JobOutcome) -> Self {
        Self {
            job_id: outcome.job_id,
            artifacts: outcome
                .links
                .into_iter()
                .map(|(kind, url)| (kind.key, url))
                .collect(),
            notes: outcome.notation.notes,
            bars: outcome.notation.bars,
            report: outcome.report,
        }
    }
}

/// Run the pipeline for one input in a fresh job directory
///
/// Waits for a free job slot first. On success the job moves into the
/// store; on failure its directory is deleted.
pub async fn run_job(state: &AppState, source: InputSource) -> ApiResult<JobOutcome> {
    let _permit = state
        .job_slots
        .acquire()
        .await
        .map_err(|_| ApiError::Internal("Job queue is closed".to_string()))?;

    let job = JobDir::create(&state.config.work_root)?;
    let job_id = job.id();

    match state.pipeline.run(job_id, &source, job.path()).await {
        Ok(run) => {
            let artifacts = run.artifacts;
            let links = state
                .jobs
                .insert(CompletedJob::new(
                    job,
                    vec![
                        (MIDI_ARTIFACT, artifacts.midi),
                        (PDF_ARTIFACT, artifacts.pdf),
                        (WAV_ARTIFACT, artifacts.wav),
                    ],
                ))
                .await;
            Ok(JobOutcome {
                job_id,
                links,
                report: run.report,
                notation: artifacts.notation,
            })
        }
        Err(failure) => {
            *state.last_error.write().await = Some(failure.to_string());
            Err(failure.into())
        }
    }
}

async fn submit(state: &AppState, multipart: Multipart) -> ApiResult<JobOutcome> {
    let submission = Submission::from_multipart(multipart).await?;
    let source = submission.into_source()?;
    info!(input = %source.describe(), "Transcription requested");
    run_job(state, source).await
}

/// POST /transcribe
pub async fn transcribe_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    match submit(&state, multipart).await {
        Ok(outcome) => Html(result_page(&outcome)).into_response(),
        Err(e) => (e.status_code(), Html(error_page(&e))).into_response(),
    }
}

/// POST /api/transcribe
pub async fn transcribe_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<TranscribeResponse>> {
    let outcome = submit(&state, multipart).await?;
    Ok(Json(outcome.into()))
}

/// Build transcription routes
pub fn transcribe_routes() -> Router<AppState> {
    Router::new()
        .route("/transcribe", post(transcribe_form))
        .route("/api/transcribe", post(transcribe_json))
}
