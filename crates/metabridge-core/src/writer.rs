use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, error, info, warn};

use crate::error::MetadataError;
use crate::exif_image::ExifImage;
use crate::media::{MediaKind, MediaRecord};
use crate::naming;

/// Outcome of placing one [`MediaRecord`] into its destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Image written with rewritten EXIF
    Written(PathBuf),
    /// Image could not be rewritten; the original bytes were copied instead
    FellBackToRawCopy(PathBuf),
    /// Non-image copied as-is
    Copied(PathBuf),
    Failed(String),
    DryRun,
}

impl Placement {
    /// Whether a file now exists at the destination.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Placement::Written(_) | Placement::FellBackToRawCopy(_) | Placement::Copied(_)
        )
    }
}

/// Copy `record` into its destination directory under a timestamp name,
/// rewriting EXIF for images and stamping atime/mtime with the resolved time.
pub fn place(record: &MediaRecord, dry_run: bool) -> Placement {
    if dry_run {
        let name = naming::destination_file_name(record.resolved_timestamp, &record.source_path)
            .unwrap_or_default();
        info!(
            "[Dry Run] Would process and save: {} -> {}",
            record.source_path.display(),
            record.destination_directory.join(name).display()
        );
        return Placement::DryRun;
    }

    if record.kind == MediaKind::Image {
        match write_image(record) {
            Ok(dest) => {
                debug!("Processed and saved image: {}", dest.display());
                return Placement::Written(dest);
            }
            Err(e) => {
                error!(
                    "Error processing image metadata for {}: {}",
                    record.source_path.display(),
                    e
                );
                warn!(
                    "Copying image without metadata changes into {}",
                    record.destination_directory.display()
                );
                return match copy_raw(record) {
                    Ok(dest) => Placement::FellBackToRawCopy(dest),
                    Err(reason) => Placement::Failed(reason),
                };
            }
        }
    }

    match copy_raw(record) {
        Ok(dest) => Placement::Copied(dest),
        Err(reason) => Placement::Failed(reason),
    }
}

fn destination_for(record: &MediaRecord) -> Option<PathBuf> {
    naming::unique_destination(
        &record.destination_directory,
        record.resolved_timestamp,
        &record.source_path,
    )
}

fn write_image(record: &MediaRecord) -> Result<PathBuf, MetadataError> {
    let dest = destination_for(record)
        .ok_or(MetadataError::InvalidTimestamp(record.resolved_timestamp))?;

    let mut image = ExifImage::open(&record.source_path)?;
    image.set_creation_timestamp(record.resolved_timestamp)?;
    image.set_description(&record.description);

    let saved = image
        .save(&dest)
        .and_then(|()| Ok(apply_timestamps(&dest, record.resolved_timestamp)?));
    if let Err(e) = saved {
        discard_partial(&dest);
        return Err(e);
    }
    Ok(dest)
}

/// Remove a half-written output so the fallback copy can take its name.
fn discard_partial(dest: &Path) {
    match fs::remove_file(dest) {
        Ok(()) => debug!("Removed partial output: {}", dest.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Unable to remove partial output {}: {}", dest.display(), e),
    }
}

fn try_copy(record: &MediaRecord) -> anyhow::Result<PathBuf> {
    let dest = destination_for(record).ok_or_else(|| {
        anyhow::anyhow!("timestamp {} is out of range", record.resolved_timestamp)
    })?;
    fs::create_dir_all(&record.destination_directory)?;
    fs::copy(&record.source_path, &dest)?;
    apply_timestamps(&dest, record.resolved_timestamp)?;
    Ok(dest)
}

/// Byte copy without touching content. Errors are logged here and returned as text.
fn copy_raw(record: &MediaRecord) -> Result<PathBuf, String> {
    match try_copy(record) {
        Ok(dest) => {
            debug!("Copied file to: {}", dest.display());
            Ok(dest)
        }
        Err(e) => {
            error!(
                "Error copying file {} into {}: {}",
                record.source_path.display(),
                record.destination_directory.display(),
                e
            );
            Err(e.to_string())
        }
    }
}

/// Set both access and modification time to `ts`.
pub fn apply_timestamps(path: &Path, ts: i64) -> std::io::Result<()> {
    let ft = FileTime::from_unix_time(ts, 0);
    filetime::set_file_times(path, ft, ft)?;
    debug!("Updated file timestamps for: {}", path.display());
    Ok(())
}
