//! Shared page shell for the PlayStack web UIs
//!
//! Pages are plain server-rendered HTML; the only shared asset is the
//! stylesheet embedded below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const PLAYSTACK_CSS: &str = include_str!("../static/playstack.css");

/// Build identification shown in every page header
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub module: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

impl BuildInfo {
    /// First 8 characters of the git hash (or all of it when shorter)
    pub fn short_hash(&self) -> &str {
        self.git_hash.get(..8).unwrap_or(self.git_hash)
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap page content in the shared header/layout
///
/// `body` is inserted as-is; callers escape any user-derived text.
pub fn page(build: &BuildInfo, title: &str, subtitle: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/playstack.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>{title}</h1>
                <p class="subtitle">{subtitle}</p>
            </div>
            <div class="header-right">
                <div class="build-info-line">{module} v{version}</div>
                <div class="build-info-line">{hash} ({profile})</div>
                <div class="build-info-line">{timestamp}</div>
            </div>
        </div>
    </header>
    <main class="content">
{body}
    </main>
</body>
</html>
"#,
        title = escape_html(title),
        subtitle = escape_html(subtitle),
        module = build.module,
        version = build.version,
        hash = build.short_hash(),
        profile = build.build_profile,
        timestamp = build.build_timestamp,
        body = body,
    )
}

/// One requirement listed in the setup help
#[derive(Debug, Clone)]
pub struct SetupItem {
    pub name: &'static str,
    pub note: String,
}

impl SetupItem {
    pub fn new(name: &'static str, note: impl Into<String>) -> Self {
        Self {
            name,
            note: note.into(),
        }
    }
}

/// Collapsible list of the external tools and files a service needs
pub fn setup_help(items: &[SetupItem]) -> String {
    let list: String = items
        .iter()
        .map(|item| {
            format!(
                "                <li><strong>{}</strong>: {}</li>\n",
                escape_html(item.name),
                escape_html(&item.note)
            )
        })
        .collect();
    format!(
        r#"        <details class="help">
            <summary>Setup help</summary>
            <ul>
{list}            </ul>
        </details>
"#,
        list = list,
    )
}

/// GET /static/playstack.css
pub async fn serve_stylesheet() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        PLAYSTACK_CSS,
    )
        .into_response()
}
