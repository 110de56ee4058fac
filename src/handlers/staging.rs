/// Per-request staging directories for uploads and downloads
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use futures_util::Stream;
use tempfile::TempDir;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::warn;

/// Create a fresh directory under `base`, removed when the returned guard drops
pub fn staging_dir(base: &Path, prefix: &str) -> io::Result<TempDir> {
    tempfile::Builder::new().prefix(prefix).tempdir_in(base)
}

/// An uploaded file kept in its own staging directory until pushed
pub struct StagedUpload {
    pub filename: String,
    dir: TempDir,
}

impl StagedUpload {
    /// Create the staging directory and an empty file named `filename` in it
    pub async fn create(upload_dir: &Path, filename: &str) -> io::Result<(Self, File)> {
        let dir = staging_dir(upload_dir, "upload-")?;
        let file = File::create(dir.path().join(filename)).await?;
        let staged = Self {
            filename: filename.to_string(),
            dir,
        };
        Ok((staged, file))
    }

    pub fn local_path(&self) -> PathBuf {
        self.dir.path().join(&self.filename)
    }

    /// Delete the staged file and its directory
    pub fn discard(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }
}

/// File stream that owns its staging directory
struct StagedStream {
    inner: ReaderStream<File>,
    // dropped after `inner` so the file is closed first
    _staging: TempDir,
}

impl Stream for StagedStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Response body streaming `file`; `staging` is deleted once the body is dropped
pub fn streaming_body(file: File, staging: TempDir) -> Body {
    Body::from_stream(StagedStream {
        inner: ReaderStream::new(file),
        _staging: staging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn uploads_with_the_same_name_do_not_collide() {
        let base = tempfile::tempdir().unwrap();

        let (first, mut first_file) = StagedUpload::create(base.path(), "x.txt").await.unwrap();
        let (second, mut second_file) = StagedUpload::create(base.path(), "x.txt").await.unwrap();
        assert_ne!(first.local_path(), second.local_path());

        first_file.write_all(b"from alice").await.unwrap();
        second_file.write_all(b"from bob, longer").await.unwrap();
        first_file.flush().await.unwrap();
        second_file.flush().await.unwrap();
        drop(first_file);
        drop(second_file);

        second.discard();
        assert_eq!(std::fs::read(first.local_path()).unwrap(), b"from alice");
        assert_eq!(entries(base.path()), 1);

        first.discard();
        assert_eq!(entries(base.path()), 0);
    }

    #[tokio::test]
    async fn download_staging_is_removed_after_streaming() {
        let base = tempfile::tempdir().unwrap();
        let mut bodies = Vec::new();
        for content in ["report for a", "report for b"] {
            let staging = staging_dir(base.path(), "download-").unwrap();
            let path = staging.path().join("report.csv");
            std::fs::write(&path, content).unwrap();
            let file = File::open(&path).await.unwrap();
            bodies.push((content, streaming_body(file, staging)));
        }
        assert_eq!(entries(base.path()), 2);

        for (content, body) in bodies {
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], content.as_bytes());
        }
        assert_eq!(entries(base.path()), 0);
    }
}
