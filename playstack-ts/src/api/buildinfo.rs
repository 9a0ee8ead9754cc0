//! Build information API endpoint

use axum::response::Json;
use serde::Serialize;

use crate::BUILD_INFO;

/// Build information response
#[derive(Debug, Serialize)]
pub struct BuildInfoResponse {
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// GET /api/buildinfo
pub async fn get_build_info() -> Json<BuildInfoResponse> {
    Json(BuildInfoResponse {
        module: BUILD_INFO.module.to_string(),
        version: BUILD_INFO.version.to_string(),
        git_hash: BUILD_INFO.git_hash.to_string(),
        build_timestamp: BUILD_INFO.build_timestamp.to_string(),
        build_profile: BUILD_INFO.build_profile.to_string(),
    })
}
