//! Local-filesystem image asset manager.
//!
//! Uploads are validated as a whole batch (count, then type) before the first
//! byte hits disk, then written under one flat managed root with generated
//! names. A batch is handed out as [`AcceptedImages`], which removes its files
//! when dropped unless the caller commits it with [`AcceptedImages::into_refs`]
//! or a store write that may reference it is in flight.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use bazaar_core::ValidationError;
use bazaar_products::{ImageRef, MAX_IMAGES};

/// Extension / MIME type pairs accepted for uploads.
pub const DEFAULT_IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Asset manager configuration, passed explicitly at construction.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Managed root directory. Created on first write if absent.
    pub root: PathBuf,
    /// Most attachments accepted in one batch.
    pub max_count: usize,
    /// Allowed `(extension, mime type)` pairs, lowercase.
    pub allowed_types: Vec<(String, String)>,
    /// Upper bound on every single file operation.
    pub io_timeout: Duration,
}

impl AssetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    fn allows(&self, extension: &str, mime_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|(ext, mime)| ext == extension && mime == mime_type)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./uploads"),
            max_count: MAX_IMAGES,
            allowed_types: DEFAULT_IMAGE_TYPES
                .iter()
                .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
                .collect(),
            io_timeout: Duration::from_secs(5),
        }
    }
}

/// One uploaded attachment as buffered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttachment {
    pub original_name: String,
    pub declared_mime_type: String,
    pub content: Vec<u8>,
}

impl RawAttachment {
    pub fn new(
        original_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            declared_mime_type: declared_mime_type.into(),
            content: content.into(),
        }
    }

    /// Lowercased extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Declared MIME type without parameters, lowercased.
    fn essence_mime_type(&self) -> String {
        self.declared_mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("asset i/o failure: {0}")]
    Io(String),

    #[error("asset operation '{0}' timed out")]
    Timeout(&'static str),
}

/// Files written for one accepted upload batch.
///
/// Dropping an armed batch deletes its files synchronously.
#[derive(Debug, Default)]
pub struct AcceptedImages {
    refs: Vec<ImageRef>,
    paths: Vec<PathBuf>,
    armed: bool,
    in_flight: bool,
}

impl AcceptedImages {
    /// An empty batch, for requests without attachments.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn refs(&self) -> &[ImageRef] {
        &self.refs
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Disarm the guard and hand out the refs. The caller now owns the files.
    pub fn into_refs(mut self) -> Vec<ImageRef> {
        self.armed = false;
        self.paths.clear();
        std::mem::take(&mut self.refs)
    }

    /// Mark the batch as referenced by a store write whose outcome is not yet
    /// known. Dropped from here on, the files are kept and logged instead.
    pub fn mark_in_flight(&mut self) {
        self.in_flight = true;
    }

    fn track(&mut self, path: PathBuf) {
        self.armed = true;
        self.refs.push(ImageRef::local(path.to_string_lossy().into_owned()));
        self.paths.push(path);
    }
}

impl Drop for AcceptedImages {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.in_flight {
            for path in &self.paths {
                tracing::warn!(
                    path = %path.display(),
                    "dropped during store write; retaining upload for reconciliation"
                );
            }
            return;
        }
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::warn!(path = %path.display(), "discarded uncommitted upload"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to discard uncommitted upload"
                ),
            }
        }
    }
}

/// Accepts uploads and external URLs and deletes files it owns.
#[derive(Debug, Clone)]
pub struct ImageAssetManager {
    config: AssetConfig,
}

impl ImageAssetManager {
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Check count and type of a batch without touching disk.
    pub fn validate_uploads(&self, files: &[RawAttachment]) -> Result<(), ValidationError> {
        if files.len() > self.config.max_count {
            return Err(ValidationError::TooManyImages {
                count: files.len(),
                max: self.config.max_count,
            });
        }

        for file in files {
            let extension = file.extension().unwrap_or_default();
            if !self.config.allows(&extension, &file.essence_mime_type()) {
                return Err(ValidationError::InvalidImageType {
                    file_name: file.original_name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Check that every URL is a non-empty absolute http(s) URL with a host.
    pub fn validate_external_urls(&self, urls: &[String]) -> Result<(), ValidationError> {
        for raw in urls {
            let valid = url::Url::parse(raw.trim())
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
                .unwrap_or(false);
            if !valid {
                return Err(ValidationError::InvalidImageUrl { url: raw.clone() });
            }
        }
        Ok(())
    }

    /// Validate then persist a batch of uploads.
    ///
    /// Nothing is written if validation fails. A write failure mid-batch drops
    /// the partial batch, which removes the files already written.
    pub async fn accept_uploads(
        &self,
        files: Vec<RawAttachment>,
    ) -> Result<AcceptedImages, AssetError> {
        self.validate_uploads(&files)?;

        let mut accepted = AcceptedImages::empty();
        if files.is_empty() {
            return Ok(accepted);
        }

        self.timed("create_root", tokio::fs::create_dir_all(&self.config.root))
            .await?;

        for file in files {
            let extension = file.extension().unwrap_or_default();
            let path = self.config.root.join(generate_file_name(&extension));
            accepted.track(path.clone());
            self.timed("write_upload", write_new_file(path, file.content))
                .await?;
        }

        tracing::debug!(count = accepted.len(), "accepted image uploads");
        Ok(accepted)
    }

    /// Validate external URLs and turn them into non-local refs.
    pub fn accept_external_urls(&self, urls: Vec<String>) -> Result<Vec<ImageRef>, ValidationError> {
        self.validate_external_urls(&urls)?;
        Ok(urls
            .into_iter()
            .map(|u| ImageRef::external(u.trim().to_string()))
            .collect())
    }

    /// Delete the files behind every local ref. Returns how many were removed.
    ///
    /// Failures are logged, never returned. Refs pointing outside the managed
    /// root are skipped.
    pub async fn release(&self, refs: &[ImageRef]) -> usize {
        let mut released = 0;
        for image in refs.iter().filter(|r| r.is_local) {
            let Some(path) = self.managed_path(&image.url) else {
                tracing::warn!(url = %image.url, "refusing to release file outside managed root");
                continue;
            };
            match self.timed("release", tokio::fs::remove_file(&path)).await {
                Ok(()) => released += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to release image file"),
            }
        }
        released
    }

    /// Local refs first, then external ones.
    pub fn combine(local: Vec<ImageRef>, external: Vec<ImageRef>) -> Vec<ImageRef> {
        let mut images = local;
        images.extend(external);
        images
    }

    fn managed_path(&self, url: &str) -> Option<PathBuf> {
        let path = Path::new(url);
        let file_name = path.file_name()?;
        (path.parent()? == self.config.root.as_path()).then(|| self.config.root.join(file_name))
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = std::io::Result<T>>,
    ) -> Result<T, AssetError> {
        match tokio::time::timeout(self.config.io_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AssetError::Io(format!("{operation}: {e}"))),
            Err(_) => Err(AssetError::Timeout(operation)),
        }
    }
}

/// `{millis}-{uuid v7}.{ext}`; unique across concurrent writers.
fn generate_file_name(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::now_v7().simple(),
        extension
    )
}

async fn write_new_file(path: PathBuf, content: Vec<u8>) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    file.write_all(&content).await?;
    file.flush().await
}
