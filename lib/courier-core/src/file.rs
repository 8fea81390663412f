//! File attachments for multipart bodies.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::multipart::{Part, guess_content_type};
use crate::{Error, Result};

/// A validated reference to a file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    path: PathBuf,
    content_type: String,
    display_name: String,
}

impl FileAttachment {
    /// Reference an existing regular file.
    ///
    /// The content type defaults to a guess from the file extension and the
    /// display name defaults to the file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `path` is not an existing regular file.
    pub fn new(
        path: impl Into<PathBuf>,
        content_type: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<Self> {
        let path = path.into();
        let is_file = std::fs::metadata(&path).is_ok_and(|meta| meta.is_file());
        if !is_file {
            return Err(Error::not_found(&path));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type.map_or_else(|| guess_content_type(&file_name), str::to_string);
        let display_name = display_name.map_or(file_name, str::to_string);

        Ok(Self {
            path,
            content_type,
            display_name,
        })
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content type sent with the file part.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// File name sent with the file part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Read the file contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file is gone, or [`Error::Io`] for
    /// other read failures.
    pub fn read(&self) -> Result<Bytes> {
        std::fs::read(&self.path).map(Bytes::from).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(&self.path)
            } else {
                Error::Io(err)
            }
        })
    }

    /// Build the multipart part for this file under the field `name`.
    ///
    /// # Errors
    ///
    /// Same as [`FileAttachment::read`].
    pub fn to_part(&self, name: impl Into<String>) -> Result<Part> {
        let data = self.read()?;
        Ok(Part::new(name, data)
            .with_filename(self.display_name.clone())
            .with_content_type(self.content_type.clone()))
    }
}
