use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Extensions whose EXIF block is rewritten on placement.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// A media object as it appears inside a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMedia {
    /// Path relative to the export root
    pub uri: String,
    pub description: String,
    /// Upload time, epoch seconds
    pub creation_timestamp: Option<i64>,
    pub media_metadata: Option<MediaMetadata>,
    /// Copy bytes untouched even if the extension is an image type
    #[serde(skip)]
    pub preserve_content: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaMetadata {
    pub photo_metadata: Option<PhotoMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoMetadata {
    pub exif_data: Vec<ExifEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExifEntry {
    pub taken_timestamp: Option<i64>,
}

impl RawMedia {
    /// First `taken_timestamp` found in the nested EXIF list.
    pub fn taken_timestamp(&self) -> Option<i64> {
        self.media_metadata
            .as_ref()?
            .photo_metadata
            .as_ref()?
            .exif_data
            .iter()
            .find_map(|e| e.taken_timestamp)
            .filter(|ts| *ts >= 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Other,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        match lowercase_extension(path) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
            _ => MediaKind::Other,
        }
    }
}

/// Canonical, fully resolved description of one item to place.
#[derive(Debug, Clone)]
pub struct MediaRecord {
    /// Absolute (export root joined) source file
    pub source_path: PathBuf,
    pub description: String,
    pub creation_timestamp: i64,
    pub taken_timestamp: Option<i64>,
    /// `taken_timestamp` if present, else `creation_timestamp`
    pub resolved_timestamp: i64,
    pub destination_directory: PathBuf,
    pub kind: MediaKind,
}

pub(crate) fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
