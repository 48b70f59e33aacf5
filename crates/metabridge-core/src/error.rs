use std::path::PathBuf;

/// Failure while rewriting an image's embedded metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable image container: {0}")]
    Container(String),

    #[error("no EXIF-capable container recognised in {}", .0.display())]
    UnsupportedContainer(PathBuf),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}
