use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::media::{MediaKind, MediaRecord, RawMedia};

/// Every in-export URI starts with this directory.
pub const EXPORT_ROOT_MARKER: &str = "your_facebook_activity";

/// (source path, destination directory) pairs written during this run.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    items: HashSet<(PathBuf, PathBuf)>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, source: &Path, destination_directory: &Path) -> bool {
        self.items
            .contains(&(source.to_path_buf(), destination_directory.to_path_buf()))
    }

    /// Returns false if the pair was already present.
    pub fn insert(&mut self, source: PathBuf, destination_directory: PathBuf) -> bool {
        self.items.insert((source, destination_directory))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// URI points outside the export
    ForeignUri,
    AlreadyProcessed,
}

#[derive(Debug)]
pub enum Resolution {
    Resolved(MediaRecord),
    Skipped(SkipReason),
}

/// Turn a manifest record into a [`MediaRecord`] bound for `destination_directory`.
///
/// Taken time from the photo's EXIF list wins over the upload time; a record
/// without either is stamped with the current time. Nothing is recorded in
/// `processed` here, the caller does that once the file is actually written.
pub fn resolve(
    raw: &RawMedia,
    destination_directory: &Path,
    export_root: &Path,
    processed: &ProcessedSet,
) -> Resolution {
    if !raw.uri.starts_with(EXPORT_ROOT_MARKER) {
        debug!("Skipped processing for irrelevant URI: {:?}", raw.uri);
        return Resolution::Skipped(SkipReason::ForeignUri);
    }

    let source_path = export_root.join(&raw.uri);
    let creation_timestamp = raw
        .creation_timestamp
        .filter(|ts| *ts >= 0)
        .unwrap_or_else(|| Utc::now().timestamp());
    let taken_timestamp = raw.taken_timestamp();
    let resolved_timestamp = taken_timestamp.unwrap_or(creation_timestamp);

    if processed.contains(&source_path, destination_directory) {
        debug!(
            "Skipping already processed item: (URI: {}, Directory: {})",
            raw.uri,
            destination_directory.display()
        );
        return Resolution::Skipped(SkipReason::AlreadyProcessed);
    }

    let kind = if raw.preserve_content {
        MediaKind::Other
    } else {
        MediaKind::from_path(&source_path)
    };

    Resolution::Resolved(MediaRecord {
        source_path,
        description: raw.description.clone(),
        creation_timestamp,
        taken_timestamp,
        resolved_timestamp,
        destination_directory: destination_directory.to_path_buf(),
        kind,
    })
}
