use super::Stream;
use crate::engine::FileDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Upload error code for a successful upload.
pub const UPLOAD_ERR_OK: i32 = 0;

/// A file received through a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    path: PathBuf,
    size: u64,
    error: i32,
    client_filename: Option<String>,
    client_media_type: Option<String>,
    moved: bool,
}

impl UploadedFile {
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        error: i32,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            size,
            error,
            client_filename,
            client_media_type,
            moved: false,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn error(&self) -> i32 {
        self.error
    }

    pub fn is_ok(&self) -> bool {
        self.error == UPLOAD_ERR_OK
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the uploaded content.
    ///
    /// # Errors
    ///
    /// Fails if the upload carries an error code, was already moved, or the
    /// temporary file cannot be opened.
    pub fn stream(&self) -> io::Result<Stream> {
        self.check_available()?;
        Stream::open(&self.path)
    }

    /// Move the upload to `target`. Only one move is allowed.
    ///
    /// # Errors
    ///
    /// Fails if the upload carries an error code, was already moved, or the
    /// file system refuses both the rename and the copy.
    pub fn move_to(&mut self, target: impl AsRef<Path>) -> io::Result<()> {
        self.check_available()?;
        let target = target.as_ref();
        if let Err(err) = fs::rename(&self.path, target) {
            // rename cannot cross devices
            debug!(error = %err, from = %self.path.display(), "Rename failed, copying upload");
            fs::copy(&self.path, target)?;
            fs::remove_file(&self.path)?;
        }
        self.moved = true;
        debug!(to = %target.display(), size = self.size, "Uploaded file moved");
        Ok(())
    }

    fn check_available(&self) -> io::Result<()> {
        if !self.is_ok() {
            return Err(io::Error::other(format!(
                "upload failed with error code {}",
                self.error
            )));
        }
        if self.moved {
            return Err(io::Error::other("uploaded file has already been moved"));
        }
        Ok(())
    }
}

impl From<&FileDescriptor> for UploadedFile {
    fn from(desc: &FileDescriptor) -> Self {
        Self::new(
            desc.tmp_name.clone(),
            desc.size,
            desc.error,
            Some(desc.name.clone()),
            Some(desc.media_type.clone()),
        )
    }
}
