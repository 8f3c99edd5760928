use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to prepare artifact directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error on artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The kinds of file a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Voice,
    SceneImage(usize),
    SceneClip(usize),
    Sequence,
    Music,
    FinalVideo,
}

impl ArtifactKind {
    /// Deterministic file name for this kind within a run.
    pub fn file_name(&self, run_id: &str) -> String {
        match self {
            ArtifactKind::Voice => format!("voice_{}.mp3", run_id),
            ArtifactKind::SceneImage(i) => format!("scene_{}_{}.png", run_id, i),
            ArtifactKind::SceneClip(i) => format!("scene_raw_{}_{}.mp4", run_id, i),
            ArtifactKind::Sequence => format!("sequence_{}.mp4", run_id),
            ArtifactKind::Music => format!("music_{}.mp3", run_id),
            ArtifactKind::FinalVideo => format!("animated_{}.mp4", run_id),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Voice => write!(f, "voice"),
            ArtifactKind::SceneImage(i) => write!(f, "scene_image[{}]", i),
            ArtifactKind::SceneClip(i) => write!(f, "scene_clip[{}]", i),
            ArtifactKind::Sequence => write!(f, "sequence"),
            ArtifactKind::Music => write!(f, "music"),
            ArtifactKind::FinalVideo => write!(f, "final_video"),
        }
    }
}

/// Idempotency key of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub run_id: String,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(run_id: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            run_id: run_id.into(),
            kind,
        }
    }

    pub fn file_name(&self) -> String {
        self.kind.file_name(&self.run_id)
    }
}

/// Where an artifact lives on disk and how it is addressed publicly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub key: ArtifactKey,
    pub path: PathBuf,
    pub url: String,
}

/// File-backed artifact storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    public_base: String,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if missing.
    pub async fn prepare(&self) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ArtifactError::Prepare {
                path: self.root.clone(),
                source,
            })
    }

    /// Handle for a key, whether or not the file exists yet.
    pub fn handle(&self, key: ArtifactKey) -> ArtifactHandle {
        let file_name = key.file_name();
        ArtifactHandle {
            path: self.root.join(&file_name),
            url: format!("{}/{}", self.public_base, file_name),
            key,
        }
    }

    /// An artifact counts as present only when its file exists and is non-empty.
    pub async fn exists(&self, key: &ArtifactKey) -> Result<bool, ArtifactError> {
        let path = self.root.join(key.file_name());
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ArtifactError::Io { path, source }),
        }
    }

    /// Remove a partial or stale artifact. Missing files are fine.
    pub async fn discard(&self, key: &ArtifactKey) -> Result<(), ArtifactError> {
        let path = self.root.join(key.file_name());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArtifactError::Io { path, source }),
        }
    }
}
