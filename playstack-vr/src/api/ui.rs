//! HTML pages for the vocal remover

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use playstack_common::form::{FILE_FIELD, URL_FIELD};
use playstack_common::ui::{escape_html, page, setup_help, SetupItem};

use super::instrumental::{instrumental_form, InstrumentalOutcome};
use crate::{ApiError, AppState, BUILD_INFO};

const TITLE: &str = "PlayStack Vocal Remover";
const SUBTITLE: &str = "Centre-channel cancellation for karaoke-style instrumentals";

/// GET /
pub async fn root_page(State(state): State<AppState>) -> Html<String> {
    let accept = state.pipeline.accepted_formats().accept_attribute();
    let body = format!(
        r#"        <form method="post" action="/instrumental" enctype="multipart/form-data">
            <div class="field">
                <label for="url">YouTube URL</label>
                <input type="url" id="url" name="{url_field}" placeholder="https://www.youtube.com/watch?v=...">
            </div>
            <div class="field">
                <label for="file">...or upload an audio file ({accept})</label>
                <input type="file" id="file" name="{file_field}" accept="{accept}">
            </div>
            <button type="submit">Remove vocals</button>
            <p class="hint">Works best on stereo mixes with centred vocals.</p>
        </form>
{help}"#,
        url_field = URL_FIELD,
        file_field = FILE_FIELD,
        accept = escape_html(&accept),
        help = setup_help(&requirements(&state)),
    );
    Html(page(&BUILD_INFO, TITLE, SUBTITLE, &body))
}

fn requirements(state: &AppState) -> Vec<SetupItem> {
    let tools = &state.config.tools;
    vec![
        SetupItem::new(
            "yt-dlp",
            format!("needed for YouTube links; pip install yt-dlp (runs `{}`)", tools.yt_dlp),
        ),
        SetupItem::new(
            "FFmpeg",
            format!(
                "vocal removal; brew install ffmpeg or apt install ffmpeg (runs `{}`)",
                tools.ffmpeg
            ),
        ),
    ]
}

pub fn result_page(outcome: &InstrumentalOutcome) -> String {
    let url = escape_html(&outcome.wav_url);
    let body = format!(
        r#"        <h2>Done</h2>
        <div class="field">
            <audio controls src="{url}?inline=true"></audio>
        </div>
        <div class="field">
            <a class="button" href="{url}" download>Download instrumental WAV</a>
        </div>
{table}        <p><a href="/">Process another</a></p>
"#,
        url = url,
        table = outcome.report.to_html_table(),
    );
    page(&BUILD_INFO, TITLE, SUBTITLE, &body)
}

pub fn error_page(error: &ApiError) -> String {
    let (heading, table) = match error {
        ApiError::Pipeline(failure) => (
            format!("{} failed", failure.stage),
            failure.report.to_html_table(),
        ),
        _ => ("Request failed".to_string(), String::new()),
    };
    let body = format!(
        r#"        <h2>{heading}</h2>
        <div class="error"><pre>{message}</pre></div>
{table}        <p><a href="/">Back</a></p>
"#,
        heading = escape_html(&heading),
        message = escape_html(&error.user_message()),
        table = table,
    );
    page(&BUILD_INFO, TITLE, SUBTITLE, &body)
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/instrumental", post(instrumental_form))
}
