//! Multipart upload spooling
//!
//! `may_minihttp` hands over the raw body and never looks inside it. For
//! `multipart/form-data` requests the engine layer splits the body with `multer` and
//! writes every file part to its own temporary file, producing the
//! [`FileDescriptor`]s the request adapter turns into uploaded files.

use super::FileDescriptor;
use bytes::Bytes;
use futures::executor::block_on;
use futures::{future, stream};
use multer::Multipart;
use std::convert::Infallible;
use std::io::{self, Write};
use std::sync::Arc;
use tempfile::TempPath;
use thiserror::Error;
use tracing::debug;

/// Prefix of spooled upload files in the temp directory.
const SPOOL_PREFIX: &str = "brrtr-upload-";

/// Errors produced while spooling a multipart body.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),
    #[error("failed to spool upload: {0}")]
    Io(#[from] io::Error),
}

impl From<UploadError> for io::Error {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Uploads written to disk for one request.
///
/// Each temp file is removed when the last clone of its handle drops, unless the
/// application moved it away first.
#[derive(Debug, Default)]
pub struct Spooled {
    pub files: Vec<FileDescriptor>,
    pub paths: Vec<Arc<TempPath>>,
}

/// `true` when the `content-type` value announces `multipart/form-data`.
pub fn is_form_data(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("multipart/form-data"))
}

/// Split a `multipart/form-data` body and spool its file parts.
///
/// Parts without a `filename` are plain form fields and are skipped.
///
/// # Errors
///
/// Returns [`UploadError::Multipart`] if the boundary is missing or the body is not
/// valid multipart, and [`UploadError::Io`] if a temp file cannot be written.
pub fn spool(content_type: &str, body: Bytes) -> Result<Spooled, UploadError> {
    let boundary = multer::parse_boundary(content_type)?;
    let source = stream::once(future::ready(Ok::<Bytes, Infallible>(body)));
    let mut multipart = Multipart::new(source, boundary);
    let mut spooled = Spooled::default();
    let mut field_count = 0usize;

    // The whole body is already in memory, so polling never waits.
    block_on(async {
        while let Some(mut field) = multipart.next_field().await? {
            field_count += 1;
            let Some(name) = field.file_name().map(str::to_string) else {
                continue;
            };
            let media_type = field
                .content_type()
                .map(ToString::to_string)
                .unwrap_or_default();

            let mut file = tempfile::Builder::new().prefix(SPOOL_PREFIX).tempfile()?;
            let mut size = 0u64;
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk)?;
                size += chunk.len() as u64;
            }

            file.flush()?;
            let path = file.into_temp_path();
            spooled.files.push(FileDescriptor {
                tmp_name: path.to_path_buf(),
                name,
                media_type,
                size,
                error: 0,
            });
            spooled.paths.push(Arc::new(path));
        }
        Ok::<(), UploadError>(())
    })?;

    debug!(
        field_count,
        file_count = spooled.files.len(),
        "Multipart body spooled"
    );
    Ok(spooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=AaB03x";

    fn body(parts: &[&str]) -> Bytes {
        let mut raw = String::new();
        for part in parts {
            raw.push_str("--AaB03x\r\n");
            raw.push_str(part);
            raw.push_str("\r\n");
        }
        raw.push_str("--AaB03x--");
        Bytes::from(raw)
    }

    #[test]
    fn test_is_form_data() {
        assert!(is_form_data("multipart/form-data; boundary=x"));
        assert!(is_form_data("Multipart/Form-Data;boundary=x"));
        assert!(!is_form_data("multipart/mixed; boundary=x"));
        assert!(!is_form_data("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_spool_file_parts_only() {
        let raw = body(&[
            "content-disposition: form-data; name=\"title\"\r\n\r\nhello",
            "content-disposition: form-data; name=\"doc\"; filename=\"doc.txt\"\r\n\
             content-type: text/plain\r\n\r\ndocument body",
        ]);
        let spooled = spool(CONTENT_TYPE, raw).unwrap();
        assert_eq!(spooled.files.len(), 1);
        assert_eq!(spooled.paths.len(), 1);

        let file = &spooled.files[0];
        assert_eq!(file.name, "doc.txt");
        assert_eq!(file.media_type, "text/plain");
        assert_eq!(file.size, 13);
        assert_eq!(file.error, 0);
        assert_eq!(std::fs::read(&file.tmp_name).unwrap(), b"document body");
    }

    #[test]
    fn test_temp_files_removed_on_drop() {
        let raw = body(&["content-disposition: form-data; name=\"f\"; filename=\"a.bin\"\r\n\r\nabc"]);
        let spooled = spool(CONTENT_TYPE, raw).unwrap();
        let path = spooled.files[0].tmp_name.clone();
        assert!(path.exists());
        drop(spooled);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_boundary() {
        let err = spool("multipart/form-data", Bytes::new()).unwrap_err();
        assert!(matches!(err, UploadError::Multipart(_)));
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }
}
