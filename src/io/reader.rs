//! Document input.
//!
//! Small files are read directly; files of 1 MiB or more are memory mapped
//! before being decoded. When no path is given the document comes from
//! standard input.

// Memory mapping requires unsafe; the map is read-only and dropped before return
#![allow(unsafe_code)]

use crate::error::{Error, IoError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Size at which reads switch to memory mapping (1 MiB).
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Largest document accepted (256 MiB).
const MAX_DOCUMENT_SIZE: u64 = 256 * 1024 * 1024;

/// An opened document file.
///
/// # Examples
///
/// ```no_run
/// use precis::io::FileReader;
///
/// let reader = FileReader::open("article.html").unwrap();
/// let text = reader.read_to_string().unwrap();
/// ```
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    /// Opens a document for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be opened, or is
    /// larger than the accepted maximum.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(IoError::FileNotFound { path: path_str }.into());
        }

        let read_failed = |e: std::io::Error| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        };
        let file = File::open(path_ref).map_err(read_failed)?;
        let size = file.metadata().map_err(read_failed)?.len();

        if size > MAX_DOCUMENT_SIZE {
            return Err(IoError::ReadFailed {
                path: path_str,
                reason: format!("file too large: {size} bytes (max: {MAX_DOCUMENT_SIZE} bytes)"),
            }
            .into());
        }

        Ok(Self {
            file,
            size,
            path: path_str,
        })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if this file is read through a memory map.
    #[must_use]
    pub const fn uses_mmap(&self) -> bool {
        self.size >= MMAP_THRESHOLD
    }

    /// Reads the whole document as UTF-8.
    ///
    /// Mapped files are validated in place and copied once into the
    /// returned string; invalid input is rejected without being copied.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        if self.uses_mmap() {
            self.read_mapped()
        } else {
            self.read_direct()
        }
    }

    fn read_mapped(&self) -> Result<String> {
        // Safety: the mapping is read-only and does not outlive this call
        let mmap = unsafe {
            Mmap::map(&self.file).map_err(|e| IoError::MmapFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?
        };
        let text = std::str::from_utf8(&mmap).map_err(|e| self.invalid_utf8(e))?;
        Ok(text.to_owned())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_direct(&self) -> Result<String> {
        let mut file = &self.file;
        let mut buffer = Vec::with_capacity(self.size as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| IoError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        String::from_utf8(buffer).map_err(|e| self.invalid_utf8(e.utf8_error()))
    }

    fn invalid_utf8(&self, err: std::str::Utf8Error) -> Error {
        IoError::ReadFailed {
            path: self.path.clone(),
            reason: format!("invalid UTF-8: {err}"),
        }
        .into()
    }
}

/// Reads a document file to a string.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    FileReader::open(path)?.read_to_string()
}

/// Reads a document from `path`, or from standard input when `None`.
///
/// # Errors
///
/// Returns an error if the file or stdin cannot be read or is not valid
/// UTF-8.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => read_file(path),
        None => read_from(std::io::stdin().lock(), "<stdin>"),
    }
}

/// Reads a whole document from any reader.
///
/// # Errors
///
/// Returns an error if reading fails or the content is not valid UTF-8.
pub fn read_from<R: Read>(mut reader: R, name: &str) -> Result<String> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| IoError::ReadFailed {
            path: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(content)
}
