pub mod error;
pub mod exif_image;
pub mod extract;
pub mod manifest;
pub mod media;
pub mod naming;
pub mod resolve;
pub mod writer;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use media::RawMedia;
use resolve::{ProcessedSet, Resolution};

pub use error::MetadataError;

fn default_save_path() -> PathBuf {
    PathBuf::from("./processed/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Export root, the directory holding `your_facebook_activity`
    pub export_root: PathBuf,
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
    #[serde(default)]
    pub dry_run: bool,
}

/// Activity categories, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Posts,
    Albums,
    Uncategorized,
    Videos,
    Stories,
    Reels,
    Stickers,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Posts,
        Category::Albums,
        Category::Uncategorized,
        Category::Videos,
        Category::Stories,
        Category::Reels,
        Category::Stickers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Posts => "Post",
            Category::Albums => "Album",
            Category::Uncategorized => "Misc",
            Category::Videos => "Video",
            Category::Stories => "Story",
            Category::Reels => "Reel",
            Category::Stickers => "Sticker",
        }
    }

    /// Output subdirectory below the save path.
    pub fn subdirectory(self) -> &'static str {
        match self {
            Category::Posts => "posts",
            Category::Albums => "albums",
            Category::Uncategorized => "uncategorized_photos",
            Category::Videos => "videos",
            Category::Stories => "stories",
            Category::Reels => "reels",
            Category::Stickers => "stickers",
        }
    }

    /// Manifest glob relative to the export root; stickers have none.
    pub fn manifest_pattern(self) -> Option<&'static str> {
        match self {
            Category::Posts => {
                Some("your_facebook_activity/posts/your_posts__check_ins__photos_and_videos*.json")
            }
            Category::Albums => Some("your_facebook_activity/posts/album/*.json"),
            Category::Uncategorized => {
                Some("your_facebook_activity/posts/your_uncategorized_photos*.json")
            }
            Category::Videos => Some("your_facebook_activity/posts/your_videos*.json"),
            Category::Stories => Some("your_facebook_activity/stories/archived_stories*.json"),
            Category::Reels => Some("your_facebook_activity/short_videos/your_reels*.json"),
            Category::Stickers => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub processed: u64,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    pub categories: Vec<CategoryCount>,
    pub total_processed: u64,
}

/// State for one run: the options plus everything written so far.
#[derive(Debug)]
pub struct Session {
    options: ProcessOptions,
    processed: ProcessedSet,
}

impl Session {
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            options,
            processed: ProcessedSet::new(),
        }
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Resolve and place one item. Returns true if it was newly written.
    pub fn handle(&mut self, raw: &RawMedia, destination_directory: &Path) -> bool {
        let record = match resolve::resolve(
            raw,
            destination_directory,
            &self.options.export_root,
            &self.processed,
        ) {
            Resolution::Resolved(record) => record,
            Resolution::Skipped(_) => return false,
        };

        // Failures are already logged by the writer
        if !writer::place(&record, self.options.dry_run).is_success() {
            return false;
        }
        self.processed
            .insert(record.source_path, record.destination_directory)
    }

    fn manifests(&self, category: Category) -> Vec<PathBuf> {
        let Some(pattern) = category.manifest_pattern() else {
            return Vec::new();
        };
        // The root is a literal path; only the manifest part is a pattern
        let root = glob::Pattern::escape(&self.options.export_root.to_string_lossy());
        manifest::resolve(&Path::new(&root).join(pattern))
    }

    fn run_category(&mut self, category: Category) -> CategoryCount {
        let destination = self.options.save_path.join(category.subdirectory());
        let before = self.processed.len();

        if category == Category::Stickers {
            for raw in extract::stickers(&self.options.export_root) {
                self.handle(&raw, &destination);
            }
        }

        for path in self.manifests(category) {
            let doc = manifest::load(&path);
            match category {
                Category::Albums => {
                    let (name, photos) = extract::albums(doc, &path);
                    let album_dir = destination.join(naming::path_component(&name));
                    for raw in photos {
                        self.handle(&raw, &album_dir);
                    }
                }
                Category::Posts => self.handle_all(extract::posts(doc, &path), &destination),
                Category::Uncategorized => {
                    self.handle_all(extract::uncategorized(doc, &path), &destination)
                }
                Category::Videos => self.handle_all(extract::videos(doc, &path), &destination),
                Category::Stories => self.handle_all(extract::stories(doc, &path), &destination),
                Category::Reels => self.handle_all(extract::reels(doc, &path), &destination),
                Category::Stickers => {}
            }
        }

        let processed = (self.processed.len() - before) as u64;
        info!(
            "Processed {} {} Media Items in {}",
            processed,
            category.label(),
            destination.display()
        );
        CategoryCount {
            category,
            processed,
            destination,
        }
    }

    fn handle_all(&mut self, items: impl Iterator<Item = RawMedia>, destination: &Path) {
        for raw in items {
            self.handle(&raw, destination);
        }
    }
}

/// Run every category in order and report what was written.
pub fn process(options: &ProcessOptions) -> anyhow::Result<ProcessResult> {
    if !options.export_root.is_dir() {
        anyhow::bail!(
            "export root is not a directory: {}",
            options.export_root.display()
        );
    }

    info!("Starting Processing in {}.", options.export_root.display());
    if options.dry_run {
        info!("[Dry Run] Dry run mode enabled; no changes will be made.");
    }

    let mut session = Session::new(options.clone());
    let categories = Category::ALL
        .iter()
        .map(|&c| session.run_category(c))
        .collect();

    let total_processed = session.processed().len() as u64;
    info!("Done! Processed {} files.", total_processed);

    Ok(ProcessResult {
        categories,
        total_processed,
    })
}
