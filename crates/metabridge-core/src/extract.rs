use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::media::RawMedia;

/// Relative location of the stickers directory inside an export.
pub const STICKERS_URI_BASE: &str = "your_facebook_activity/posts/media/stickers_used";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlbumManifest {
    pub name: String,
    pub photos: Vec<Value>,
}

/// A post, story or reel: only its attachments matter here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Post {
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub data: Vec<AttachmentData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttachmentData {
    pub media: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UncategorizedManifest {
    pub other_photos_v2: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VideosManifest {
    pub videos_v2: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoriesManifest {
    pub archived_stories_v2: Vec<Post>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReelsManifest {
    pub lasso_videos_v2: Vec<Post>,
}

/// Validate a loaded document against its category shape.
///
/// The empty object produced by a failed load maps to the default silently;
/// any other mismatch is logged.
fn shape<T: DeserializeOwned + Default>(doc: Value, source: &Path) -> T {
    if doc.as_object().is_some_and(|o| o.is_empty()) {
        return T::default();
    }
    match serde_json::from_value(doc) {
        Ok(v) => v,
        Err(e) => {
            error!("Unexpected manifest layout in {}: {}", source.display(), e);
            T::default()
        }
    }
}

fn media(value: Value) -> Option<RawMedia> {
    match serde_json::from_value::<RawMedia>(value) {
        Ok(raw) => Some(raw),
        Err(e) => {
            debug!("Skipping malformed media entry: {}", e);
            None
        }
    }
}

fn attachment_media(posts: Vec<Post>) -> impl Iterator<Item = RawMedia> {
    posts
        .into_iter()
        .flat_map(|p| p.attachments)
        .flat_map(|a| a.data)
        .filter_map(|d| d.media)
        .filter_map(media)
}

/// Album name and its photos.
pub fn albums(doc: Value, source: &Path) -> (String, impl Iterator<Item = RawMedia>) {
    let album: AlbumManifest = shape(doc, source);
    (album.name, album.photos.into_iter().filter_map(media))
}

pub fn posts(doc: Value, source: &Path) -> impl Iterator<Item = RawMedia> {
    let posts: Vec<Post> = shape(doc, source);
    attachment_media(posts)
}

pub fn uncategorized(doc: Value, source: &Path) -> impl Iterator<Item = RawMedia> {
    let manifest: UncategorizedManifest = shape(doc, source);
    manifest.other_photos_v2.into_iter().filter_map(media)
}

pub fn videos(doc: Value, source: &Path) -> impl Iterator<Item = RawMedia> {
    let manifest: VideosManifest = shape(doc, source);
    manifest.videos_v2.into_iter().filter_map(media)
}

pub fn stories(doc: Value, source: &Path) -> impl Iterator<Item = RawMedia> {
    let manifest: StoriesManifest = shape(doc, source);
    attachment_media(manifest.archived_stories_v2)
}

pub fn reels(doc: Value, source: &Path) -> impl Iterator<Item = RawMedia> {
    let manifest: ReelsManifest = shape(doc, source);
    attachment_media(manifest.lasso_videos_v2)
}

/// Best-effort creation time: birth time where the platform records it,
/// modification time otherwise.
pub fn file_creation_timestamp(meta: &fs::Metadata) -> Option<i64> {
    let time = meta.created().or_else(|_| meta.modified()).ok()?;
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

/// One record per regular file in the export's stickers directory, sorted by name.
pub fn stickers(export_root: &Path) -> Vec<RawMedia> {
    let dir = export_root.join(STICKERS_URI_BASE);
    if !dir.is_dir() {
        warn!(
            "Stickers directory does not exist or is not a directory: {}",
            dir.display()
        );
        return Vec::new();
    }

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Unable to list stickers in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else {
            error!("Failed to stat sticker file: {}", entry.path().display());
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        records.push(RawMedia {
            uri: format!("{}/{}", STICKERS_URI_BASE, file_name),
            description: String::new(),
            creation_timestamp: file_creation_timestamp(&meta),
            media_metadata: None,
            preserve_content: true,
        });
    }
    records.sort_by(|a, b| a.uri.cmp(&b.uri));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn src() -> &'static Path {
        Path::new("manifest.json")
    }

    #[test]
    fn test_albums() {
        let doc = json!({
            "name": "Trip",
            "photos": [
                {"uri": "your_facebook_activity/posts/media/Trip/a.jpg", "creation_timestamp": 1700000000},
                {"uri": 42},
                {"uri": "your_facebook_activity/posts/media/Trip/b.jpg", "description": "beach"}
            ]
        });
        let (name, photos) = albums(doc, src());
        let photos: Vec<_> = photos.collect();
        assert_eq!(name, "Trip");
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].creation_timestamp, Some(1700000000));
        assert_eq!(photos[1].description, "beach");
    }

    #[test]
    fn test_posts_only_take_media_attachments() {
        let doc = json!([
            {
                "timestamp": 1,
                "attachments": [
                    {"data": [
                        {"media": {"uri": "your_facebook_activity/posts/media/p/a.jpg"}},
                        {"place": {"name": "Somewhere"}}
                    ]},
                    {"data": [{"media": {"uri": "your_facebook_activity/posts/media/p/b.mp4"}}]}
                ]
            },
            {"data": [{"post": "text only"}]}
        ]);
        let uris: Vec<_> = posts(doc, src()).map(|m| m.uri).collect();
        assert_eq!(
            uris,
            vec![
                "your_facebook_activity/posts/media/p/a.jpg",
                "your_facebook_activity/posts/media/p/b.mp4"
            ]
        );
    }

    #[test]
    fn test_stories_and_reels() {
        let story = json!({"archived_stories_v2": [
            {"attachments": [{"data": [{"media": {"uri": "your_facebook_activity/stories/s.mp4"}}]}]}
        ]});
        assert_eq!(stories(story, src()).count(), 1);

        let reel = json!({"lasso_videos_v2": [
            {"attachments": [{"data": [{"media": {"uri": "your_facebook_activity/short_videos/r.mp4"}}]}]}
        ]});
        assert_eq!(reels(reel, src()).count(), 1);
    }

    #[test]
    fn test_uncategorized_and_videos() {
        let doc = json!({"other_photos_v2": [{"uri": "your_facebook_activity/a.jpg"}]});
        assert_eq!(uncategorized(doc, src()).count(), 1);
        let doc = json!({"videos_v2": [{"uri": "your_facebook_activity/a.mp4"}, {"uri": "your_facebook_activity/b.mp4"}]});
        assert_eq!(videos(doc, src()).count(), 2);
    }

    #[test]
    fn test_failed_load_or_wrong_shape_yields_nothing() {
        assert_eq!(posts(json!({}), src()).count(), 0);
        assert_eq!(posts(json!({"unexpected": true}), src()).count(), 0);
        assert_eq!(videos(json!([1, 2, 3]), src()).count(), 0);
        let (name, photos) = albums(json!({}), src());
        assert_eq!(name, "");
        assert_eq!(photos.count(), 0);
    }

    #[test]
    fn test_stickers() {
        let root = tempdir().unwrap();
        let dir = root.path().join(STICKERS_URI_BASE);
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.png"), b"b").unwrap();
        fs::write(dir.join("a.png"), b"a").unwrap();

        let records = stickers(root.path());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uri, format!("{}/a.png", STICKERS_URI_BASE));
        assert!(records.iter().all(|r| r.preserve_content));
        assert!(records.iter().all(|r| r.creation_timestamp.is_some()));
        assert!(records.iter().all(|r| r.description.is_empty()));
    }

    #[test]
    fn test_missing_stickers_dir() {
        let root = tempdir().unwrap();
        assert!(stickers(root.path()).is_empty());
    }
}
