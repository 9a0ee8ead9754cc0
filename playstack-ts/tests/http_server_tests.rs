//! HTTP server & routing integration tests

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::{multipart_body, multipart_request, test_config, ScriptedRunner};
use http_body_util::BodyExt;
use playstack_ts::{build_router, AppState};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(root: &Path) -> (Router, AppState) {
    let state = AppState::new(test_config(root), Arc::new(ScriptedRunner::new()));
    (build_router(state.clone()), state)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn root_serves_input_form() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.contains("text/html"));

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains(r#"action="/transcribe""#));
    assert!(html.contains(r#"enctype="multipart/form-data""#));
    assert!(html.contains(r#"accept=".mp3,.wav""#));
    assert!(html.contains("playstack-ts"));
    assert!(html.contains("<summary>Setup help</summary>"));
    assert!(html.contains("FluidR3_GM.sf2"));
    assert!(html.contains("test.sf2, found"));
    for tool in ["yt-dlp", "basic-pitch", "LilyPond", "FluidSynth"] {
        assert!(html.contains(&format!("<strong>{}</strong>", tool)), "{}", tool);
    }
}

#[tokio::test]
async fn health_and_buildinfo_report_module() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let health = body_json(get(&app, "/health").await).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["module"], "playstack-ts");
    assert_eq!(health["free_job_slots"], 1);
    assert_eq!(health["retained_jobs"], 0);

    let build = body_json(get(&app, "/api/buildinfo").await).await;
    assert_eq!(build["version"], env!("CARGO_PKG_VERSION"));
    assert!(build["git_hash"].is_string());
}

#[tokio::test]
async fn stylesheet_is_served() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let response = get(&app, "/static/playstack.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/css");
}

#[tokio::test]
async fn json_transcription_returns_downloadable_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let (app, state) = test_app(root.path());

    let body = multipart_body(None, Some(("song.mp3", b"ID3 fake".as_slice())));
    let response = app
        .clone()
        .oneshot(multipart_request("/api/transcribe", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let job_id = json["job_id"].as_str().unwrap().to_string();
    assert_eq!(json["artifacts"]["midi"], format!("/jobs/{}/midi", job_id));
    assert_eq!(json["artifacts"]["pdf"], format!("/jobs/{}/pdf", job_id));
    assert_eq!(json["artifacts"]["wav"], format!("/jobs/{}/wav", job_id));
    assert_eq!(json["report"]["stages"].as_array().unwrap().len(), 4);
    assert_eq!(state.jobs.len().await, 1);

    let response = get(&app, &format!("/jobs/{}/pdf", job_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"score.pdf\""
    );
    assert_eq!(body_bytes(response).await, b"%PDF-1.4 engraved");

    let response = get(&app, &format!("/jobs/{}/wav?inline=true", job_id)).await;
    assert_eq!(
        response.headers()["content-disposition"],
        "inline; filename=\"instrumental.wav\""
    );
}

#[tokio::test]
async fn form_transcription_renders_result_page() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let body = multipart_body(None, Some(("song.wav", b"RIFF fake".as_slice())));
    let response = app
        .oneshot(multipart_request("/transcribe", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Download MIDI"));
    assert!(html.contains("Download PDF score"));
    assert!(html.contains("<audio controls"));
    assert_eq!(html.matches("status-complete").count(), 4);
}

#[tokio::test]
async fn empty_form_is_bad_request() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let response = app
        .oneshot(multipart_request("/api/transcribe", multipart_body(Some("  "), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INVALID_INPUT");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Please provide a YouTube URL or upload a file."));
}

#[tokio::test]
async fn input_errors_share_one_error_code() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let empty = app
        .clone()
        .oneshot(multipart_request("/api/transcribe", multipart_body(None, None)))
        .await
        .unwrap();
    let bad_url = app
        .oneshot(multipart_request(
            "/api/transcribe",
            multipart_body(Some("file:///etc/passwd"), None),
        ))
        .await
        .unwrap();

    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bad_url.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(empty).await["error"]["code"], "INVALID_INPUT");
    assert_eq!(body_json(bad_url).await["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.max_upload_bytes = 1024;
    let runner = Arc::new(ScriptedRunner::new());
    let app = build_router(AppState::new(config, runner.clone()));

    let audio = vec![0u8; 8 * 1024];
    let response = app
        .oneshot(multipart_request(
            "/api/transcribe",
            multipart_body(None, Some(("big.wav", audio.as_slice()))),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn invalid_url_renders_error_page_with_400() {
    let root = tempfile::tempdir().unwrap();
    let (app, state) = test_app(root.path());

    let body = multipart_body(Some("ftp://example.com/song.mp3"), Some(("song.mp3", b"ID3".as_slice())));
    let response = app
        .oneshot(multipart_request("/transcribe", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Input acquisition failed"));
    assert!(html.contains("status-failed"));
    assert!(state.jobs.is_empty().await);
    // Failed job directories are removed
    let leftover = std::fs::read_dir(&state.config.work_root).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn missing_soundfont_is_config_error() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.soundfont = root.path().join("absent.sf2");
    let state = AppState::new(config, Arc::new(ScriptedRunner::new()));
    let app = build_router(state.clone());

    let body = multipart_body(None, Some(("song.mp3", b"ID3 fake".as_slice())));
    let response = app
        .oneshot(multipart_request("/api/transcribe", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONFIG_ERROR");
    assert_eq!(json["error"]["stage"], "Audio rendering");
    assert_eq!(json["report"]["stages"][3]["status"], "failed");

    let health = body_json(get(&build_router(state), "/health").await).await;
    assert!(health["last_error"].as_str().unwrap().contains("Sound-font not found"));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = test_app(root.path());

    let response = get(&app, &format!("/jobs/{}/midi", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
