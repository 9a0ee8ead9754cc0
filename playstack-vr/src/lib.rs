//! playstack-vr: vocal remover web service
//!
//! Library interface, exposed for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod vocals;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use config::ServiceConfig;
use pipeline::Pipeline;
use playstack_common::jobs::{serve_artifact, JobStore};
use playstack_common::ui::{serve_stylesheet, BuildInfo};
use playstack_common::ToolRunner;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tower_http::trace::TraceLayer;

/// Build identity captured by build.rs
pub const BUILD_INFO: BuildInfo = BuildInfo {
    module: config::MODULE_NAME,
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GIT_HASH"),
    build_timestamp: env!("BUILD_TIMESTAMP"),
    build_profile: env!("BUILD_PROFILE"),
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub jobs: JobStore,
    pub job_slots: Arc<Semaphore>,
    pub config: Arc<ServiceConfig>,
    pub startup_time: DateTime<Utc>,
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: ServiceConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::from_config(runner, &config)),
            jobs: JobStore::new(config.retained_jobs),
            job_slots: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
            config: Arc::new(config),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

impl FromRef<AppState> for JobStore {
    fn from_ref(state: &AppState) -> Self {
        state.jobs.clone()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .route("/jobs/:job_id/:artifact", get(serve_artifact))
        .merge(api::health_routes())
        .route("/static/playstack.css", get(serve_stylesheet))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
