//! Per-run stage report
//!
//! Each pipeline run walks its stages in order: not started → running →
//! complete or failed. The report records every stage's outcome and timing
//! and is rendered on the result and error pages.

use crate::human_time::format_elapsed_ms;
use crate::ui::escape_html;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Stage lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    Running,
    Complete,
    Failed,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::NotStarted => "Not started",
            StageStatus::Running => "Running",
            StageStatus::Complete => "Complete",
            StageStatus::Failed => "Failed",
        }
    }

    /// CSS class used by the stage table
    pub fn css_class(&self) -> &'static str {
        match self {
            StageStatus::NotStarted => "status-not-started",
            StageStatus::Running => "status-running",
            StageStatus::Complete => "status-complete",
            StageStatus::Failed => "status-failed",
        }
    }
}

/// One stage's outcome
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: &'static str,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// Outcome of every stage of one run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub job_id: Uuid,
    pub stages: Vec<StageRecord>,
}

impl PipelineReport {
    /// All stages start as not started
    pub fn new(job_id: Uuid, stages: &[&'static str]) -> Self {
        Self {
            job_id,
            stages: stages
                .iter()
                .map(|&stage| StageRecord {
                    stage,
                    status: StageStatus::NotStarted,
                    elapsed_ms: None,
                })
                .collect(),
        }
    }

    fn record_mut(&mut self, stage: &str) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|r| r.stage == stage)
    }

    pub fn set(&mut self, stage: &str, status: StageStatus, elapsed_ms: Option<u64>) {
        if let Some(record) = self.record_mut(stage) {
            record.status = status;
            record.elapsed_ms = elapsed_ms;
        }
    }

    pub fn status(&self, stage: &str) -> Option<StageStatus> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| r.status)
    }

    /// First failed stage, if any
    pub fn failed_stage(&self) -> Option<&'static str> {
        self.stages
            .iter()
            .find(|r| r.status == StageStatus::Failed)
            .map(|r| r.stage)
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.stages.iter().filter_map(|r| r.elapsed_ms).sum()
    }

    /// `<table class="stages">` with one row per stage
    pub fn to_html_table(&self) -> String {
        let mut rows = String::new();
        for record in &self.stages {
            rows.push_str(&format!(
                "            <tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
                escape_html(record.stage),
                record.status.css_class(),
                record.status.label(),
                record.elapsed_ms.map(format_elapsed_ms).unwrap_or_default(),
            ));
        }
        format!(
            "        <table class=\"stages\">\n            <tr><th>Stage</th><th>Status</th><th>Time</th></tr>\n{}        </table>\n",
            rows
        )
    }
}

/// Run one stage, recording its status and timing in `report`
///
/// Logs start, completion and failure with `job_id`, `stage` and
/// `elapsed_ms` fields.
pub async fn run_stage<T, E, F>(report: &mut PipelineReport, stage: &'static str, work: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let job_id = report.job_id;
    report.set(stage, StageStatus::Running, None);
    info!(job_id = %job_id, stage, "Stage started");
    let started = Instant::now();

    let result = work.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => {
            report.set(stage, StageStatus::Complete, Some(elapsed_ms));
            info!(job_id = %job_id, stage, elapsed_ms, "Stage complete");
        }
        Err(e) => {
            report.set(stage, StageStatus::Failed, Some(elapsed_ms));
            warn!(job_id = %job_id, stage, elapsed_ms, error = %e, "Stage failed");
        }
    }
    result
}
