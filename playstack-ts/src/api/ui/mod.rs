//! UI Routes - HTML pages for the transcription service
//!
//! - **Root Page** (`root`): input form
//! - **Result pages** (`result`): downloads, playback and the stage report,
//!   or the failing stage's error

use axum::{routing::get, Router};

use crate::AppState;

mod result;
mod root;

pub use result::{error_page, result_page};
use root::root_page;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(root_page))
}
