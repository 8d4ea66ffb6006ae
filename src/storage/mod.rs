//! Storage Layer
//!
//! Persists raw uploads on disk and resolves the configuration directory.

use anyhow::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::PlateError;

/// URL prefix under which stored uploads are served
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Characters escaped in a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "platereader", "PlateReader")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Extension after the last `.`, lowercased
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `filename` carries one of the allowed extensions
pub fn allowed_file(filename: &str, allowed: &[String]) -> bool {
    file_extension(filename)
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Final path component of a client supplied filename.
///
/// Both `/` and `\` separators are stripped; `.` and `..` are rejected.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}

/// URL a stored file is served from, with the filename percent-encoded
pub fn upload_url(filename: &str) -> String {
    format!("{}/{}", UPLOADS_ROUTE, utf8_percent_encode(filename, PATH_SEGMENT))
}

/// A file written by [`UploadStore::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Stored file name
    pub filename: String,
    /// Location on disk
    pub path: PathBuf,
    /// URL the file is served from
    pub url: String,
}

/// Directory of uploaded images, served back by filename
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PlateError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` unmodified; an existing file with the same name is replaced
    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<StoredUpload, PlateError> {
        let filename = sanitize_filename(filename).ok_or(PlateError::MissingFile)?;
        let path = self.dir.join(&filename);
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "Upload stored");

        Ok(StoredUpload {
            url: upload_url(&filename),
            filename,
            path,
        })
    }
}
