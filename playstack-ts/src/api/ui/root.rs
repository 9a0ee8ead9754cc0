//! Root page handler - input form

use axum::extract::State;
use axum::response::Html;
use playstack_common::form::{FILE_FIELD, URL_FIELD};
use playstack_common::ui::{escape_html, page, setup_help, SetupItem};

use crate::{AppState, BUILD_INFO};

/// Page title shared by every page of this service
pub const TITLE: &str = "PlayStack Transcriber";
pub const SUBTITLE: &str = "Audio to MIDI, sheet music and an instrumental render";

/// GET /
pub async fn root_page(State(state): State<AppState>) -> Html<String> {
    let accept = state.pipeline.accepted_formats().accept_attribute();
    let body = format!(
        r#"        <form method="post" action="/transcribe" enctype="multipart/form-data">
            <div class="field">
                <label for="url">YouTube URL</label>
                <input type="url" id="url" name="{url_field}" placeholder="https://www.youtube.com/watch?v=...">
            </div>
            <div class="field">
                <label for="file">...or upload an audio file ({accept})</label>
                <input type="file" id="file" name="{file_field}" accept="{accept}">
            </div>
            <button type="submit">Transcribe</button>
            <p class="hint">If both are given the URL is used. Processing takes a few minutes; this page loads the results when done.</p>
        </form>
{help}"#,
        url_field = URL_FIELD,
        file_field = FILE_FIELD,
        accept = escape_html(&accept),
        help = setup_help(&requirements(&state)),
    );
    Html(page(&BUILD_INFO, TITLE, SUBTITLE, &body))
}

/// External tools and the soundfont, with the names this instance uses
fn requirements(state: &AppState) -> Vec<SetupItem> {
    let tools = &state.config.tools;
    let soundfont = &state.config.soundfont;
    let soundfont_state = if soundfont.is_file() { "found" } else { "missing" };
    vec![
        SetupItem::new(
            "yt-dlp",
            format!("needed for YouTube links; pip install yt-dlp (runs `{}`)", tools.yt_dlp),
        ),
        SetupItem::new(
            "basic-pitch",
            format!("audio to MIDI; pip install basic-pitch (runs `{}`)", tools.basic_pitch),
        ),
        SetupItem::new(
            "LilyPond",
            format!(
                "sheet music; brew install lilypond or apt install lilypond (runs `{}`)",
                tools.lilypond
            ),
        ),
        SetupItem::new(
            "FluidSynth",
            format!(
                "audio render; brew install fluidsynth or apt install fluidsynth (runs `{}`)",
                tools.fluidsynth
            ),
        ),
        SetupItem::new(
            "Soundfont",
            format!(
                "a General MIDI soundfont such as FluidR3_GM.sf2, set with SOUNDFONT_PATH or `soundfont` in the config (using {}, {})",
                soundfont.display(),
                soundfont_state
            ),
        ),
    ]
}
