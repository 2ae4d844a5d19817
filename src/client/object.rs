//! Object payloads
//!
//! Upload sources for `put`, the lazy body returned by `get`, and the
//! flattened header map returned by `headers`.

use std::collections::BTreeMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Body, Response};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};

/// Object headers: lower-cased name -> values joined with ", "
pub type ObjectHeaders = BTreeMap<String, String>;

/// Where the body of a `put` comes from.
///
/// A path is opened by the client and closed once the upload finishes.
/// A handle stays owned by the caller; the upload starts at its current
/// position. The client reads through a duplicate of the handle, which
/// shares the OS file offset, and seeks it back to the starting position
/// once the upload finishes.
#[derive(Debug)]
pub enum ObjectSource<'a> {
    /// File to open for reading
    Path(PathBuf),
    /// Already-open file, read from its current position. Its offset is
    /// moved during the upload and restored afterwards.
    Handle(&'a File),
}

impl From<PathBuf> for ObjectSource<'_> {
    fn from(path: PathBuf) -> Self {
        ObjectSource::Path(path)
    }
}

impl From<&Path> for ObjectSource<'_> {
    fn from(path: &Path) -> Self {
        ObjectSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ObjectSource<'_> {
    fn from(path: &str) -> Self {
        ObjectSource::Path(PathBuf::from(path))
    }
}

impl From<String> for ObjectSource<'_> {
    fn from(path: String) -> Self {
        ObjectSource::Path(PathBuf::from(path))
    }
}

impl<'a> From<&'a File> for ObjectSource<'a> {
    fn from(file: &'a File) -> Self {
        ObjectSource::Handle(file)
    }
}

/// A resolved upload that can produce its body more than once
#[derive(Debug)]
pub(crate) struct Upload {
    file: File,
    start: u64,
    len: u64,
    /// Offset is shared with a caller's handle
    borrowed: bool,
}

impl Upload {
    /// Open or borrow the source and remember where the upload starts
    pub(crate) async fn open(source: &ObjectSource<'_>) -> Result<Self> {
        let mut file = match source {
            ObjectSource::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(Error::InvalidArgument("source path is empty".into()));
                }
                File::open(path).await?
            }
            ObjectSource::Handle(handle) => handle.try_clone().await?,
        };

        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(Error::InvalidArgument(match source {
                ObjectSource::Path(path) => format!("source {} is a directory", path.display()),
                ObjectSource::Handle(_) => "source handle is a directory".to_string(),
            }));
        }

        let start = file.seek(SeekFrom::Current(0)).await?;
        Ok(Self {
            file,
            start,
            len: metadata.len().saturating_sub(start),
            borrowed: matches!(source, ObjectSource::Handle(_)),
        })
    }

    /// Number of bytes the upload sends
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// A fresh request body reading from the upload's start offset
    pub(crate) async fn body(&self) -> std::io::Result<Body> {
        let mut reader = self.file.try_clone().await?;
        reader.seek(SeekFrom::Start(self.start)).await?;
        Ok(Body::wrap_stream(ReaderStream::new(reader)))
    }

    /// Put a borrowed handle's offset back where the upload started
    pub(crate) async fn restore_position(&mut self) -> std::io::Result<()> {
        if self.borrowed {
            self.file.seek(SeekFrom::Start(self.start)).await?;
        }
        Ok(())
    }
}

/// Body of a fetched object.
///
/// Finite and single-pass: every read consumes it.
#[derive(Debug)]
pub struct ObjectStream {
    response: Response,
}

impl ObjectStream {
    pub(crate) fn new(response: Response) -> Self {
        Self { response }
    }

    /// Content length announced by the server, if any
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Response headers of the GET
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Read the next chunk, `None` at end of body
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        self.response
            .chunk()
            .await
            .map_err(|e| Error::storage("get", e))
    }

    /// Read the whole body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        self.response
            .bytes()
            .await
            .map_err(|e| Error::storage("get", e))
    }

    /// Read the whole body as UTF-8 text
    pub async fn into_string(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Copy the body into `writer`, returning the number of bytes written
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Convert into a `Stream` of chunks
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send {
        self.response
            .bytes_stream()
            .map_err(|e| Error::storage("get", e))
    }
}

/// Flatten a header map, joining repeated headers with ", "
pub(crate) fn flatten_headers(headers: &HeaderMap) -> ObjectHeaders {
    let mut result = ObjectHeaders::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        result.insert(name.as_str().to_string(), joined);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flatten_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-A", HeaderValue::from_static("1"));
        headers.insert("x-b", HeaderValue::from_static("2"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["x-a"], "1");
        assert_eq!(flat["x-b"], "2");
    }

    #[test]
    fn test_flatten_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append("x-object-meta-tag", HeaderValue::from_static("red"));
        headers.append("x-object-meta-tag", HeaderValue::from_static("blue"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat["x-object-meta-tag"], "red, blue");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_path() {
        let err = Upload::open(&ObjectSource::from("")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Upload::open(&ObjectSource::from(dir.path())).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let err = Upload::open(&ObjectSource::from("/nonexistent/swiftstorage/source"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_upload_from_handle_starts_at_position() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"headerpayload").unwrap();

        let mut file = File::open(tmp.path()).await.unwrap();
        file.seek(SeekFrom::Start(6)).await.unwrap();

        let upload = Upload::open(&ObjectSource::from(&file)).await.unwrap();
        assert_eq!(upload.len(), 7);
    }

    #[tokio::test]
    async fn test_restore_position_after_body_read() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"headerpayload").unwrap();

        let mut file = File::open(tmp.path()).await.unwrap();
        file.seek(SeekFrom::Start(6)).await.unwrap();

        let mut upload = Upload::open(&ObjectSource::from(&file)).await.unwrap();
        drop(upload.body().await.unwrap());

        // Offset ends up at EOF once the body has been streamed
        file.seek(SeekFrom::End(0)).await.unwrap();
        upload.restore_position().await.unwrap();
        assert_eq!(file.seek(SeekFrom::Current(0)).await.unwrap(), 6);
    }
}
