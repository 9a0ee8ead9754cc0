//! POST /instrumental: acquire audio, strip the centre channel

use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Response},
};
use playstack_common::acquire::InputSource;
use playstack_common::form::Submission;
use playstack_common::jobs::{CompletedJob, JobDir, WAV_ARTIFACT};
use playstack_common::report::PipelineReport;
use tracing::info;
use uuid::Uuid;

use super::ui::{error_page, result_page};
use crate::{ApiError, ApiResult, AppState};

/// A finished job, ready to present
#[derive(Debug, Clone)]
pub struct InstrumentalOutcome {
    pub job_id: Uuid,
    /// Download URL of the instrumental WAV
    pub wav_url: String,
    pub report: PipelineReport,
}

/// Run acquisition and vocal removal in a fresh job directory
pub async fn run_job(state: &AppState, source: InputSource) -> ApiResult<InstrumentalOutcome> {
    let _permit = state
        .job_slots
        .acquire()
        .await
        .map_err(|_| ApiError::Internal("Job queue is closed".to_string()))?;

    let job = JobDir::create(&state.config.work_root)?;
    let job_id = job.id();

    match state.pipeline.run(job_id, &source, job.path()).await {
        Ok(run) => {
            let links = state
                .jobs
                .insert(CompletedJob::new(job, vec![(WAV_ARTIFACT, run.instrumental)]))
                .await;
            let wav_url = links
                .into_iter()
                .next()
                .map(|(_, url)| url)
                .ok_or_else(|| ApiError::Internal("Job stored without artifacts".to_string()))?;
            Ok(InstrumentalOutcome {
                job_id,
                wav_url,
                report: run.report,
            })
        }
        Err(failure) => {
            *state.last_error.write().await = Some(failure.to_string());
            Err(failure.into())
        }
    }
}

async fn submit(state: &AppState, multipart: Multipart) -> ApiResult<InstrumentalOutcome> {
    let submission = Submission::from_multipart(multipart).await?;
    let source = submission.into_source()?;
    info!(input = %source.describe(), "Instrumental requested");
    run_job(state, source).await
}

/// POST /instrumental
pub async fn instrumental_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    match submit(&state, multipart).await {
        Ok(outcome) => Html(result_page(&outcome)).into_response(),
        Err(e) => (e.status_code(), Html(error_page(&e))).into_response(),
    }
}
