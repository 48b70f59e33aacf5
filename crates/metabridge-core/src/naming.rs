use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::media::lowercase_extension;

/// Timezone used to render destination file names.
pub const NAMING_TZ: Tz = chrono_tz::America::Los_Angeles;

const FILE_NAME_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

fn utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

/// `YYYY-MM-DD_HH.MM.SS` in [`NAMING_TZ`].
pub fn timestamp_stem(ts: i64) -> Option<String> {
    Some(utc(ts)?.with_timezone(&NAMING_TZ).format(FILE_NAME_FORMAT).to_string())
}

/// EXIF `DateTimeOriginal` value, rendered in UTC.
pub fn exif_datetime(ts: i64) -> Option<String> {
    Some(utc(ts)?.format(EXIF_DATETIME_FORMAT).to_string())
}

/// Timestamp stem plus the source's lower-cased extension.
pub fn destination_file_name(ts: i64, source: &Path) -> Option<String> {
    let stem = timestamp_stem(ts)?;
    Some(with_suffix(&stem, None, lowercase_extension(source).as_deref()))
}

fn with_suffix(stem: &str, counter: Option<u32>, ext: Option<&str>) -> String {
    let mut name = stem.to_string();
    if let Some(n) = counter {
        name.push_str(&format!("_{}", n));
    }
    if let Some(ext) = ext {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// `name` made safe to use as a single directory name: separators become `_`
/// and the `.`/`..` entries are replaced outright.
pub fn path_component(name: &str) -> String {
    let cleaned = name.replace(['/', '\\'], "_");
    match cleaned.as_str() {
        "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// First free path in `dir` for an item stamped `ts`: the plain name, then
/// `<stem>_1.<ext>`, `<stem>_2.<ext>`, ...
pub fn unique_destination(dir: &Path, ts: i64, source: &Path) -> Option<PathBuf> {
    let stem = timestamp_stem(ts)?;
    let ext = lowercase_extension(source);

    let base = dir.join(with_suffix(&stem, None, ext.as_deref()));
    if !base.exists() {
        return Some(base);
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(with_suffix(&stem, Some(counter), ext.as_deref()));
        if !candidate.exists() {
            debug!("Resolved filename conflict: {}", candidate.display());
            return Some(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_timestamp_stem_uses_pacific_time() {
        // 2023-11-14 22:13:20 UTC, PST in effect
        assert_eq!(timestamp_stem(1_700_000_000).unwrap(), "2023-11-14_14.13.20");
        // 2023-07-01 12:00:00 UTC, PDT in effect
        assert_eq!(timestamp_stem(1_688_212_800).unwrap(), "2023-07-01_05.00.00");
    }

    #[test]
    fn test_exif_datetime_is_utc() {
        assert_eq!(exif_datetime(1_700_000_000).unwrap(), "2023:11:14 22:13:20");
        assert_eq!(exif_datetime(0).unwrap(), "1970:01:01 00:00:00");
    }

    #[test]
    fn test_destination_file_name_lowercases_extension() {
        let name = destination_file_name(1_700_000_000, Path::new("x/IMG_1.JPG")).unwrap();
        assert_eq!(name, "2023-11-14_14.13.20.jpg");
        let name = destination_file_name(1_700_000_000, Path::new("x/README")).unwrap();
        assert_eq!(name, "2023-11-14_14.13.20");
    }

    #[test]
    fn test_unique_destination_suffixes() {
        let dir = tempdir().unwrap();
        let source = Path::new("your_facebook_activity/posts/media/a.JPG");

        let first = unique_destination(dir.path(), 1_700_000_000, source).unwrap();
        assert_eq!(first, dir.path().join("2023-11-14_14.13.20.jpg"));
        fs::write(&first, b"a").unwrap();

        let second = unique_destination(dir.path(), 1_700_000_000, source).unwrap();
        assert_eq!(second, dir.path().join("2023-11-14_14.13.20_1.jpg"));
        fs::write(&second, b"b").unwrap();

        let third = unique_destination(dir.path(), 1_700_000_000, source).unwrap();
        assert_eq!(third, dir.path().join("2023-11-14_14.13.20_2.jpg"));
    }

    #[test]
    fn test_path_component() {
        assert_eq!(path_component("Trip"), "Trip");
        assert_eq!(path_component("Summer 2023 / Italy"), "Summer 2023 _ Italy");
        assert_eq!(path_component("/etc"), "_etc");
        assert_eq!(path_component("..\\up"), ".._up");
        assert_eq!(path_component(".."), "_");
        assert_eq!(path_component(""), "");
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("2023-11-14_14.13.20"), b"a").unwrap();
        let next = unique_destination(dir.path(), 1_700_000_000, Path::new("README")).unwrap();
        assert_eq!(next, dir.path().join("2023-11-14_14.13.20_1"));
    }
}
