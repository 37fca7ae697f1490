//! services/site/src/adapters/uploads.rs
//!
//! Writes uploaded files to disk below the public directory so they can be
//! served back by the static file layer.

use async_trait::async_trait;
use meadowlark_core::domain::{StoredUpload, UploadedFile};
use meadowlark_core::ports::{PortError, PortResult, UploadService};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// How many `-<n>` suffixes are tried before giving up on a file name.
const MAX_NAME_ATTEMPTS: usize = 1000;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `UploadService` port on the local filesystem.
#[derive(Clone, Debug)]
pub struct DiskUploadStore {
    root: PathBuf,
    url_prefix: String,
}

impl DiskUploadStore {
    /// Files land in `<root>/<namespace>/` and are linked as
    /// `<url_prefix>/<namespace>/<file>`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Reduces a client-supplied name to its final path component.
fn safe_file_name(raw: &str) -> Option<String> {
    let name = Path::new(raw.rsplit(['/', '\\']).next().unwrap_or(raw))
        .file_name()?
        .to_str()?
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// `coast.jpg`, then `coast-1.jpg`, `coast-2.jpg`, ...
fn numbered_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    let path = Path::new(name);
    match (path.file_stem().and_then(|s| s.to_str()), path.extension().and_then(|e| e.to_str())) {
        (Some(stem), Some(ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, attempt, ext),
        _ => format!("{}-{}", name, attempt),
    }
}

/// Creates a file in `dir` that did not exist before, numbering the name
/// when it is taken. Returns the name used and the open file.
async fn create_unique(dir: &Path, name: &str) -> PortResult<(String, PathBuf, tokio::fs::File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = numbered_name(name, attempt);
        let path = dir.join(&candidate);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((candidate, path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(PortError::Unavailable(format!("{}: {}", path.display(), e))),
        }
    }
    Err(PortError::Unexpected(format!("no free file name for '{}'", name)))
}

//=========================================================================================
// `UploadService` Trait Implementation
//=========================================================================================

#[async_trait]
impl UploadService for DiskUploadStore {
    async fn store(
        &self,
        namespace: &str,
        files: Vec<UploadedFile>,
    ) -> PortResult<Vec<StoredUpload>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        if safe_file_name(namespace).as_deref() != Some(namespace) {
            return Err(PortError::Unexpected(format!(
                "invalid upload namespace '{}'",
                namespace
            )));
        }

        let dir = self.root.join(namespace);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortError::Unavailable(format!("{}: {}", dir.display(), e)))?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let name = safe_file_name(&file.file_name).ok_or_else(|| {
                PortError::Unexpected(format!("invalid upload file name '{}'", file.file_name))
            })?;
            let (name, path, mut out) = create_unique(&dir, &name).await?;
            out.write_all(&file.bytes)
                .await
                .map_err(|e| PortError::Unavailable(format!("{}: {}", path.display(), e)))?;
            out.flush()
                .await
                .map_err(|e| PortError::Unavailable(format!("{}: {}", path.display(), e)))?;
            debug!(path = %path.display(), size = file.bytes.len(), "stored upload");

            stored.push(StoredUpload {
                url: format!("{}/{}/{}", self.url_prefix, namespace, name),
                path: path.display().to_string(),
                size: file.bytes.len(),
                name,
            });
        }
        Ok(stored)
    }
}
