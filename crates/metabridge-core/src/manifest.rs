use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

fn is_json(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".json")
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand a directory, glob pattern or single file into the JSON files it names.
///
/// Never fails: unusable input is logged and yields an empty list.
pub fn resolve(search_path: &Path) -> Vec<PathBuf> {
    if search_path.is_dir() {
        let Ok(entries) = fs::read_dir(search_path) else {
            error!("Unable to list directory: {}", search_path.display());
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| is_json(p))
            .collect();
        files.sort();
        return files;
    }

    let pattern = search_path.to_string_lossy();
    if is_glob(&pattern) {
        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                error!("Invalid glob pattern {}: {}", pattern, e);
                return Vec::new();
            }
        };
        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Unreadable glob match: {}", e);
                    None
                }
            })
            .collect();
        if files.is_empty() {
            warn!("No files matched glob pattern: {}", pattern);
        }
        files.sort();
        return files;
    }

    if search_path.is_file() {
        if is_json(search_path) {
            return vec![search_path.to_path_buf()];
        }
        warn!("Provided file is not a JSON file: {}", search_path.display());
        return Vec::new();
    }

    error!("Invalid JSON path: {}", search_path.display());
    Vec::new()
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Parse one manifest. Read or parse failures give an empty object.
pub fn load(path: &Path) -> Value {
    match read_json(path) {
        Ok(doc) => {
            debug!("Loaded manifest {}", path.display());
            doc
        }
        Err(e) => {
            error!("Failed to read file {}: {}", path.display(), e);
            Value::Object(Map::new())
        }
    }
}
