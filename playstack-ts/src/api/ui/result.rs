//! Result and error pages for `POST /transcribe`

use playstack_common::jobs::{MIDI_ARTIFACT, PDF_ARTIFACT, WAV_ARTIFACT};
use playstack_common::ui::{escape_html, page};

use super::root::{SUBTITLE, TITLE};
use crate::api::transcribe::JobOutcome;
use crate::{ApiError, BUILD_INFO};

fn download_link(url: Option<&str>, label: &str) -> String {
    match url {
        Some(url) => format!(
            r#"<a class="button" href="{}" download>{}</a>"#,
            escape_html(url),
            label
        ),
        None => String::new(),
    }
}

/// Downloads, audio player and stage report
pub fn result_page(outcome: &JobOutcome) -> String {
    let player = match outcome.link(WAV_ARTIFACT) {
        Some(url) => format!(
            r#"<audio controls src="{}?inline=true"></audio>"#,
            escape_html(url)
        ),
        None => String::new(),
    };

    let body = format!(
        r#"        <h2>Done</h2>
        <p>{notes} notes over {bars} bars.</p>
        <div class="field">
            {midi}
            {pdf}
            {wav}
        </div>
        <div class="field">
            {player}
        </div>
{table}        <p><a href="/">Transcribe another</a></p>
"#,
        notes = outcome.notation.notes,
        bars = outcome.notation.bars,
        midi = download_link(outcome.link(MIDI_ARTIFACT), "Download MIDI"),
        pdf = download_link(outcome.link(PDF_ARTIFACT), "Download PDF score"),
        wav = download_link(outcome.link(WAV_ARTIFACT), "Download WAV"),
        player = player,
        table = outcome.report.to_html_table(),
    );
    page(&BUILD_INFO, TITLE, SUBTITLE, &body)
}

/// Failing stage, its message and the stage report
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
