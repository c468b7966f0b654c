//! Scoped staging of an upload on disk.
//!
//! The incoming file is written to a [`NamedTempFile`] inside the configured
//! upload directory and streamed from there into the outbound webhook request.
//! The temp file is owned by [`ScopedUpload`], so it is removed when the value
//! is dropped: after a successful relay, after an upstream or transport error,
//! after a validation failure halfway through the body, or on panic.

use crate::error::RelayError;
use crate::upload::AcceptedType;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// An upload staged in a temporary file that is deleted on drop.
#[derive(Debug)]
pub struct ScopedUpload {
    temp: NamedTempFile,
    writer: Option<tokio::fs::File>,
    file_name: String,
    kind: AcceptedType,
    size: u64,
}

impl ScopedUpload {
    /// Create an empty staging file in `dir`, creating the directory if needed.
    pub async fn create(
        dir: &Path,
        file_name: impl Into<String>,
        kind: AcceptedType,
    ) -> Result<Self, RelayError> {
        let stage_err = |source: io::Error| RelayError::TempFile {
            dir: dir.to_path_buf(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(stage_err)?;

        let suffix = format!(".{}", kind.extension());
        let temp = tempfile::Builder::new()
            .prefix("marksheet-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(stage_err)?;
        let writer = temp.as_file().try_clone().map_err(stage_err)?;

        debug!("Staging upload at {}", temp.path().display());

        Ok(Self {
            temp,
            writer: Some(tokio::fs::File::from_std(writer)),
            file_name: file_name.into(),
            kind,
            size: 0,
        })
    }

    /// Stage an in-memory buffer in one go.
    pub async fn from_bytes(
        dir: &Path,
        file_name: impl Into<String>,
        kind: AcceptedType,
        bytes: &[u8],
    ) -> Result<Self, RelayError> {
        let mut upload = Self::create(dir, file_name, kind).await?;
        upload.append(bytes).await?;
        upload.finish().await?;
        Ok(upload)
    }

    /// Append a chunk of the incoming body.
    pub async fn append(&mut self, chunk: &[u8]) -> Result<(), RelayError> {
        let dir = self.dir();
        let writer = self.writer.as_mut().ok_or_else(|| RelayError::TempFile {
            dir: dir.clone(),
            source: io::Error::new(io::ErrorKind::Other, "upload already finished"),
        })?;
        writer
            .write_all(chunk)
            .await
            .map_err(|source| RelayError::TempFile { dir, source })?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the write handle. The file stays on disk until drop.
    pub async fn finish(&mut self) -> Result<(), RelayError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await.map_err(|source| RelayError::TempFile {
                dir: self.dir(),
                source,
            })?;
        }
        Ok(())
    }

    /// Open the staged bytes as a streaming request body.
    pub async fn body(&self) -> io::Result<reqwest::Body> {
        let file = tokio::fs::File::open(self.temp.path()).await?;
        Ok(reqwest::Body::from(file))
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// The filename the client uploaded under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> AcceptedType {
        self.kind
    }

    /// Bytes written so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn dir(&self) -> PathBuf {
        self.temp
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

impl Drop for ScopedUpload {
    fn drop(&mut self) {
        debug!("Releasing staged upload {}", self.temp.path().display());
    }
}
