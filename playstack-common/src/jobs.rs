//! Per-request job directories and the completed job store
//!
//! Every request writes into its own temporary directory, so concurrent
//! requests never share file names. A finished job is handed to the
//! [`JobStore`], which keeps a bounded number of jobs available for
//! download; evicting a job (or dropping a failed one) deletes its
//! directory.

use crate::{Error, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Temporary directory owned by one request
///
/// Removed from disk when dropped.
#[derive(Debug)]
pub struct JobDir {
    id: Uuid,
    dir: TempDir,
}

impl JobDir {
    /// Create `<work_root>/job-<uuid>-XXXX`
    pub fn create(work_root: &FsPath) -> Result<Self> {
        std::fs::create_dir_all(work_root)?;
        let id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", id))
            .tempdir_in(work_root)?;
        debug!(job_id = %id, path = %dir.path().display(), "Created job directory");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &FsPath {
        self.dir.path()
    }
}

/// A downloadable output kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactKind {
    /// URL segment, e.g. `pdf`
    pub key: &'static str,
    /// Name offered to the browser
    pub download_name: &'static str,
    pub content_type: &'static str,
}

pub const MIDI_ARTIFACT: ArtifactKind = ArtifactKind {
    key: "midi",
    download_name: "instrumental.mid",
    content_type: "audio/midi",
};

pub const PDF_ARTIFACT: ArtifactKind = ArtifactKind {
    key: "pdf",
    download_name: "score.pdf",
    content_type: "application/pdf",
};

pub const WAV_ARTIFACT: ArtifactKind = ArtifactKind {
    key: "wav",
    download_name: "instrumental.wav",
    content_type: "audio/wav",
};

/// A job whose outputs are ready for download
#[derive(Debug)]
pub struct CompletedJob {
    dir: JobDir,
    artifacts: Vec<(ArtifactKind, PathBuf)>,
    pub completed_at: DateTime<Utc>,
}

impl CompletedJob {
    pub fn new(dir: JobDir, artifacts: Vec<(ArtifactKind, PathBuf)>) -> Self {
        Self {
            dir,
            artifacts,
            completed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.dir.id()
    }

    /// `/jobs/<id>/<key>` for each artifact
    pub fn links(&self) -> Vec<(ArtifactKind, String)> {
        self.artifacts
            .iter()
            .map(|(kind, _)| (*kind, artifact_url(self.id(), kind)))
            .collect()
    }

    fn artifact(&self, key: &str) -> Option<(ArtifactKind, PathBuf)> {
        self.artifacts
            .iter()
            .find(|(kind, _)| kind.key == key)
            .map(|(kind, path)| (*kind, path.clone()))
    }
}

/// Download URL for an artifact
pub fn artifact_url(job_id: Uuid, kind: &ArtifactKind) -> String {
    format!("/jobs/{}/{}", job_id, kind.key)
}

struct StoreInner {
    order: VecDeque<Uuid>,
    jobs: HashMap<Uuid, CompletedJob>,
}

/// Bounded store of completed jobs, oldest evicted first
#[derive(Clone)]
pub struct JobStore {
    capacity: usize,
    inner: Arc<RwLock<StoreInner>>,
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Arc::new(RwLock::new(StoreInner {
                order: VecDeque::new(),
                jobs: HashMap::new(),
            })),
        }
    }

    /// Keep a completed job; returns its download links
    pub async fn insert(&self, job: CompletedJob) -> Vec<(ArtifactKind, String)> {
        let links = job.links();
        let id = job.id();
        let mut inner = self.inner.write().await;
        inner.order.push_back(id);
        inner.jobs.insert(id, job);

        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.jobs.remove(&evicted);
                info!(job_id = %evicted, "Evicted job and deleted its files");
            }
        }
        links
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.inner.read().await.jobs.contains_key(&id)
    }

    /// Read an artifact's bytes
    pub async fn read_artifact(&self, id: Uuid, key: &str) -> Result<(ArtifactKind, Vec<u8>)> {
        let (kind, path) = {
            let inner = self.inner.read().await;
            let job = inner
                .jobs
                .get(&id)
                .ok_or_else(|| Error::NotFound(format!("Job {} not found or expired", id)))?;
            job.artifact(key)
                .ok_or_else(|| Error::NotFound(format!("Job {} has no '{}' artifact", id, key)))?
        };
        let bytes = tokio::fs::read(&path).await?;
        Ok((kind, bytes))
    }
}

/// Query string for artifact downloads
#[derive(Debug, Deserialize, Default)]
pub struct ArtifactQuery {
    /// Serve with `inline` disposition (audio player) instead of `attachment`
    #[serde(default)]
    pub inline: bool,
}

/// GET /jobs/:job_id/:artifact
///
/// Mounted by each service; its router state must provide the store via
/// `axum::extract::FromRef`.
pub async fn serve_artifact(
    State(store): State<JobStore>,
    Path((job_id, key)): Path<(Uuid, String)>,
    Query(query): Query<ArtifactQuery>,
) -> Response {
    match store.read_artifact(job_id, &key).await {
        Ok((kind, bytes)) => {
            let disposition = format!(
                "{}; filename=\"{}\"",
                if query.inline { "inline" } else { "attachment" },
                kind.download_name
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, kind.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(Error::NotFound(msg)) => (StatusCode::NOT_FOUND, msg).into_response(),
        Err(e) => {
            warn!(job_id = %job_id, artifact = %key, error = %e, "Artifact read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
