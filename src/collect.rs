//! Candidate discovery and cache pruning.

use crate::cache::{cache_key, normalize_path, CacheStore};
use crate::constants::SUPPORTED_IMAGE_EXTENSIONS;
use crate::digest::digest_file;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Check if a file path names a PNG or JPEG image (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn collect_from_dir(dir: &Path, recursive: bool, images: &mut Vec<PathBuf>) {
    let walker = if recursive {
        WalkDir::new(dir).min_depth(1)
    } else {
        WalkDir::new(dir).min_depth(1).max_depth(1)
    };

    for entry in walker
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        match entry {
            Ok(entry) => {
                // `path().is_file()` follows symlinks, `file_type()` does not.
                if entry.path().is_file() && is_supported_image(entry.path()) {
                    images.push(entry.into_path());
                }
            }
            Err(e) => crate::verbose!("Skipping unreadable entry under {:?}: {}", dir, e),
        }
    }
}

/// Expands path arguments into the deduplicated list of candidate images.
///
/// Directories contribute the images directly inside them, or the whole
/// subtree when `recursive` is set. Files are kept when their extension is
/// supported. Arguments that do not exist are ignored. The first occurrence
/// of a path wins, so the order follows the arguments.
pub fn collect_images(inputs: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for input in inputs {
        let metadata = match fs::metadata(input) {
            Ok(metadata) => metadata,
            Err(_) => {
                crate::verbose!("Ignoring missing path {:?}", input);
                continue;
            }
        };

        if metadata.is_dir() {
            collect_from_dir(input, recursive, &mut found);
        } else if is_supported_image(input) {
            found.push(input.clone());
        }
    }

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|path| normalize_path(&path))
        .filter(|path| seen.insert(cache_key(path)))
        .collect()
}

/// Drops candidates whose current digest equals the cached one.
///
/// With `force` every candidate is kept. A candidate that cannot be hashed
/// is kept as well: it is treated as never processed.
pub fn prune_cached(candidates: Vec<PathBuf>, cache: &CacheStore, force: bool) -> Vec<PathBuf> {
    if force {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|path| {
            let Some(cached) = cache.digest_for(path) else {
                return true;
            };
            match digest_file(path) {
                Ok(current) => {
                    let changed = current != cached;
                    if !changed {
                        crate::verbose!("Unchanged since last run: {:?}", path);
                    }
                    changed
                }
                Err(e) => {
                    crate::verbose!("Could not hash {:?}, keeping it: {}", path, e);
                    true
                }
            }
        })
        .collect()
}
