//! Recording files on local disk.
//!
//! The egress service writes MP4 files into a directory this service shares
//! (a mounted volume in deployment). Storage lists, deletes, and streams
//! those files; streaming honors HTTP `Range` headers so the browser's
//! `<video>` element can seek.
//!
//! File names arrive from URL path segments and are validated before any
//! filesystem access: names with path separators or `..` are treated as
//! nonexistent.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("recording not found")]
    NotFound,

    #[error("requested range not satisfiable")]
    Unsatisfiable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An inclusive byte window within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Resolve a `Range` header against a file.
    ///
    /// Semantics (matching the demo client's expectations):
    /// - no header, or a malformed one, selects the whole file;
    /// - `bytes=a-b` selects `a..=min(b, size-1)`;
    /// - `bytes=a-` selects at most `chunk_size` bytes from `a`;
    /// - a start at or past EOF, an inverted window, or an empty file is
    ///   unsatisfiable (`None`).
    pub fn resolve(header: Option<&str>, file_size: u64, chunk_size: u64) -> Option<ByteRange> {
        if file_size == 0 {
            return None;
        }

        let (start, end) = match header.and_then(parse_range_spec) {
            Some((start, Some(end))) => (start, end),
            Some((start, None)) => (start, start.saturating_add(chunk_size).saturating_sub(1)),
            None => (0, file_size - 1),
        };

        if start >= file_size || start > end {
            return None;
        }

        Some(ByteRange {
            start,
            end: end.min(file_size - 1),
        })
    }

    /// Number of bytes in the window.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A resolved range always spans at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value for this window of a `total`-byte file.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// Parse `bytes=a-b` / `bytes=a-` into (start, Option<end>).
fn parse_range_spec(header: &str) -> Option<(u64, Option<u64>)> {
    let spec = header.strip_prefix("bytes=")?;
    let (start_raw, end_raw) = spec.split_once('-')?;
    let start = start_raw.trim().parse().ok()?;
    let end = match end_raw.trim() {
        "" => None,
        raw => Some(raw.parse().ok()?),
    };
    Some((start, end))
}

/// An open recording file positioned at the start of the resolved window.
pub struct RecordingStream {
    pub range: ByteRange,
    pub file_size: u64,
    pub reader: tokio::io::Take<fs::File>,
}

/// Recording files under a single root directory.
#[derive(Debug, Clone)]
pub struct RecordingStorage {
    root: PathBuf,
    chunk_size: u64,
}

impl RecordingStorage {
    pub fn new(root: &Path, chunk_size: u64) -> Self {
        Self {
            root: root.to_path_buf(),
            chunk_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Reject names that could escape the root directory.
    fn resolve_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(StorageError::NotFound);
        }
        Ok(self.root.join(name))
    }

    /// Names of MP4 files under the root, optionally filtered by substring,
    /// sorted by name. A missing root directory is an empty listing.
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<String>, StorageError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".mp4") {
                continue;
            }
            if let Some(filter) = filter {
                if !name.contains(filter) {
                    continue;
                }
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Delete a recording. `Ok(false)` when the file does not exist.
    pub async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let path = match self.resolve_path(name) {
            Ok(path) => path,
            Err(_) => return Ok(false),
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Open a recording for byte-range streaming.
    pub async fn stream(
        &self,
        name: &str,
        range_header: Option<&str>,
    ) -> Result<RecordingStream, StorageError> {
        let path = self.resolve_path(name)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound)
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(StorageError::NotFound);
        }

        let file_size = metadata.len();
        let range = ByteRange::resolve(range_header, file_size, self.chunk_size)
            .ok_or(StorageError::Unsatisfiable)?;

        let mut file = fs::File::open(&path).await?;
        file.seek(SeekFrom::Start(range.start)).await?;

        Ok(RecordingStream {
            range,
            file_size,
            reader: file.take(range.len()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    // ------------------------------------------------------------------
    // ByteRange resolution
    // ------------------------------------------------------------------

    #[test]
    fn test_no_header_selects_whole_file() {
        let range = ByteRange::resolve(None, 100, 10).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn test_bounded_range() {
        let range = ByteRange::resolve(Some("bytes=10-19"), 100, 1024).unwrap();
        assert_eq!(range, ByteRange { start: 10, end: 19 });
        assert_eq!(range.content_range(100), "bytes 10-19/100");
    }

    #[test]
    fn test_end_clamped_to_file_size() {
        let range = ByteRange::resolve(Some("bytes=90-500"), 100, 1024).unwrap();
        assert_eq!(range, ByteRange { start: 90, end: 99 });
    }

    #[test]
    fn test_open_ended_range_limited_by_chunk_size() {
        let range = ByteRange::resolve(Some("bytes=10-"), 1000, 100).unwrap();
        assert_eq!(range, ByteRange { start: 10, end: 109 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn test_open_ended_range_clamped_at_eof() {
        let range = ByteRange::resolve(Some("bytes=950-"), 1000, 100).unwrap();
        assert_eq!(range, ByteRange { start: 950, end: 999 });
    }

    #[test]
    fn test_start_past_eof_is_unsatisfiable() {
        assert!(ByteRange::resolve(Some("bytes=100-"), 100, 10).is_none());
        assert!(ByteRange::resolve(Some("bytes=500-600"), 100, 10).is_none());
    }

    #[test]
    fn test_inverted_range_is_unsatisfiable() {
        assert!(ByteRange::resolve(Some("bytes=5-3"), 100, 10).is_none());
    }

    #[test]
    fn test_empty_file_is_unsatisfiable() {
        assert!(ByteRange::resolve(None, 0, 10).is_none());
        assert!(ByteRange::resolve(Some("bytes=0-"), 0, 10).is_none());
    }

    #[test]
    fn test_malformed_header_falls_back_to_whole_file() {
        assert_eq!(
            ByteRange::resolve(Some("bytes=abc"), 100, 10),
            Some(ByteRange { start: 0, end: 99 })
        );
        assert_eq!(
            ByteRange::resolve(Some("items=0-5"), 100, 10),
            Some(ByteRange { start: 0, end: 99 })
        );
        assert_eq!(
            ByteRange::resolve(Some("bytes=3-x"), 100, 10),
            Some(ByteRange { start: 0, end: 99 })
        );
    }

    // ------------------------------------------------------------------
    // Filesystem operations
    // ------------------------------------------------------------------

    async fn storage_with_files(files: &[(&str, &[u8])]) -> (tempfile::TempDir, RecordingStorage) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            tokio::fs::write(dir.path().join(name), contents).await.unwrap();
        }
        let storage = RecordingStorage::new(dir.path(), 1024);
        (dir, storage)
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let (_dir, storage) = storage_with_files(&[
            ("zoom-2.mp4", b"b"),
            ("demo-1.mp4", b"a"),
            ("notes.txt", b"x"),
        ])
        .await;

        let all = storage.list(None).await.unwrap();
        assert_eq!(all, vec!["demo-1.mp4", "zoom-2.mp4"]);

        let filtered = storage.list(Some("demo")).await.unwrap();
        assert_eq!(filtered, vec!["demo-1.mp4"]);

        let none = storage.list(Some("absent")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let storage = RecordingStorage::new(Path::new("/nonexistent/recordings"), 1024);
        assert!(storage.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, storage) = storage_with_files(&[("demo-1.mp4", b"a")]).await;

        assert!(storage.delete("demo-1.mp4").await.unwrap());
        assert!(!storage.delete("demo-1.mp4").await.unwrap());
        assert!(storage.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_traversal_names_are_rejected() {
        let (_dir, storage) = storage_with_files(&[("demo-1.mp4", b"a")]).await;

        assert!(!storage.delete("../demo-1.mp4").await.unwrap());
        assert!(!storage.delete("a/b.mp4").await.unwrap());
        assert!(matches!(
            storage.stream("..", None).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_stream_whole_file() {
        let (_dir, storage) = storage_with_files(&[("demo.mp4", b"0123456789")]).await;

        let mut stream = storage.stream("demo.mp4", None).await.unwrap();
        assert_eq!(stream.file_size, 10);
        assert_eq!(stream.range, ByteRange { start: 0, end: 9 });

        let mut contents = Vec::new();
        stream.reader.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"0123456789");
    }

    #[tokio::test]
    async fn test_stream_partial_window() {
        let (_dir, storage) = storage_with_files(&[("demo.mp4", b"0123456789")]).await;

        let mut stream = storage.stream("demo.mp4", Some("bytes=2-5")).await.unwrap();
        assert_eq!(stream.range, ByteRange { start: 2, end: 5 });
        assert_eq!(stream.range.content_range(10), "bytes 2-5/10");

        let mut contents = Vec::new();
        stream.reader.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"2345");
    }

    #[tokio::test]
    async fn test_stream_missing_file() {
        let (_dir, storage) = storage_with_files(&[]).await;
        assert!(matches!(
            storage.stream("absent.mp4", None).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_stream_range_past_eof() {
        let (_dir, storage) = storage_with_files(&[("demo.mp4", b"0123456789")]).await;
        assert!(matches!(
            storage.stream("demo.mp4", Some("bytes=100-")).await,
            Err(StorageError::Unsatisfiable)
        ));
    }

    #[tokio::test]
    async fn test_ensure_root_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recordings");
        let storage = RecordingStorage::new(&root, 1024);

        storage.ensure_root().await.unwrap();
        assert!(root.is_dir());

        // Idempotent
        storage.ensure_root().await.unwrap();
    }
}
