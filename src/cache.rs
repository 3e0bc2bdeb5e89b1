//! Persistent path → digest map used to skip files that have not changed
//! since they were last compressed.

use crate::error::{CamlibError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Drops `.` components so `./a.png` and `a.png` name the same file.
pub fn normalize_path(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Key under which a file's digest is stored.
pub fn cache_key(path: &Path) -> String {
    normalize_path(path).to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStore {
    entries: BTreeMap<String, String>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store from disk. A missing, unreadable or malformed file
    /// yields an empty store.
    pub fn load(location: &Path) -> Self {
        match fs::read_to_string(location) {
            Ok(text) => Self::from_json(&text),
            Err(e) => {
                crate::verbose!("No cache loaded from {:?}: {}", location, e);
                Self::new()
            }
        }
    }

    /// Parses a JSON object of path → digest. Anything that is not an object
    /// gives an empty store; entries whose value is not a string are dropped.
    /// Keys are normalized like lookups, so `./a.png` and `a.png` collapse
    /// into one entry.
    pub fn from_json(text: &str) -> Self {
        let entries = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(map)) => map
                .into_iter()
                .filter_map(|(path, digest)| match digest {
                    serde_json::Value::String(digest) => {
                        Some((cache_key(Path::new(&path)), digest))
                    }
                    _ => None,
                })
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { entries }
    }

    pub fn digest_for(&self, path: &Path) -> Option<&str> {
        self.entries.get(&cache_key(path)).map(String::as_str)
    }

    /// Records the digest of bytes that are already on disk at `path`.
    pub fn record(&mut self, path: &Path, digest: String) {
        self.entries.insert(cache_key(path), digest);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the store as a tab-indented JSON object.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Rewrites the whole cache file. The new content is written to a
    /// temporary file in the same directory and renamed over the old one,
    /// so readers never observe a half-written cache.
    pub fn flush(&self, location: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match location.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let persist_err = |source: std::io::Error| CamlibError::CachePersist {
            path: location.to_path_buf(),
            source,
        };

        let mut staging = NamedTempFile::new_in(dir).map_err(persist_err)?;
        staging.write_all(json.as_bytes()).map_err(persist_err)?;
        staging.as_file().sync_all().map_err(persist_err)?;
        staging
            .persist(location)
            .map_err(|e| persist_err(e.error))?;

        crate::verbose!("Cache with {} entries written to {:?}", self.len(), location);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_key_strips_current_dir() {
        assert_eq!(cache_key(Path::new("./a.png")), "a.png");
        assert_eq!(cache_key(Path::new("a.png")), "a.png");
        assert_eq!(cache_key(Path::new("./img/./b.jpg")), cache_key(Path::new("img/b.jpg")));
        assert_eq!(cache_key(Path::new(".")), ".");
    }

    #[test]
    fn test_from_json_valid_map() {
        let store = CacheStore::from_json(r#"{"a.png": "abc", "b.jpg": "def"}"#);
        assert_eq!(store.len(), 2);
        assert_eq!(store.digest_for(Path::new("a.png")), Some("abc"));
        assert_eq!(store.digest_for(Path::new("./b.jpg")), Some("def"));
        assert_eq!(store.digest_for(Path::new("c.png")), None);
    }

    #[test]
    fn test_from_json_normalizes_dot_prefixed_keys() {
        let store = CacheStore::from_json(r#"{"./a.png": "abc", "./img/./b.jpg": "def"}"#);
        assert_eq!(store.digest_for(Path::new("a.png")), Some("abc"));
        assert_eq!(store.digest_for(Path::new("./a.png")), Some("abc"));
        assert_eq!(store.digest_for(Path::new("img/b.jpg")), Some("def"));

        let mut store = store;
        store.record(Path::new("./a.png"), "new".to_string());
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.to_json().unwrap(),
            "{\n\t\"a.png\": \"new\",\n\t\"img/b.jpg\": \"def\"\n}"
        );
    }

    #[test]
    fn test_from_json_merges_equivalent_keys() {
        let store = CacheStore::from_json(r#"{"./a.png": "old", "a.png": "abc"}"#);
        assert_eq!(store.len(), 1);
        assert!(store.digest_for(Path::new("a.png")).is_some());
    }

    #[test]
    fn test_from_json_non_map_is_empty() {
        assert!(CacheStore::from_json("[1, 2, 3]").is_empty());
        assert!(CacheStore::from_json("\"text\"").is_empty());
        assert!(CacheStore::from_json("42").is_empty());
        assert!(CacheStore::from_json("null").is_empty());
    }

    #[test]
    fn test_from_json_corrupt_is_empty() {
        assert!(CacheStore::from_json("{\"a.png\": ").is_empty());
        assert!(CacheStore::from_json("").is_empty());
    }

    #[test]
    fn test_from_json_drops_non_string_digests() {
        let store = CacheStore::from_json(r#"{"a.png": "abc", "b.png": 12, "c.png": null}"#);
        assert_eq!(store.len(), 1);
        assert_eq!(store.digest_for(Path::new("a.png")), Some("abc"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::load(&temp_dir.path().join("missing.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_overwrites() {
        let mut store = CacheStore::new();
        store.record(Path::new("./a.png"), "old".to_string());
        store.record(Path::new("a.png"), "new".to_string());
        assert_eq!(store.len(), 1);
        assert_eq!(store.digest_for(Path::new("a.png")), Some("new"));
    }

    #[test]
    fn test_to_json_uses_tabs() {
        let mut store = CacheStore::new();
        store.record(Path::new("a.png"), "abc".to_string());
        assert_eq!(store.to_json().unwrap(), "{\n\t\"a.png\": \"abc\"\n}");
        assert_eq!(CacheStore::new().to_json().unwrap(), "{}");
    }

    #[test]
    fn test_flush_overwrites_previous_content() {
        let temp_dir = TempDir::new().unwrap();
        let location = temp_dir.path().join("cache.json");
        fs::write(&location, "{\"stale.png\": \"000\", \"padding\": \"xxxxxxxxxxxxxxxx\"}").unwrap();

        let mut store = CacheStore::new();
        store.record(Path::new("a.png"), "abc".to_string());
        store.flush(&location).unwrap();

        let reloaded = CacheStore::load(&location);
        assert_eq!(reloaded, store);
        assert_eq!(reloaded.digest_for(Path::new("stale.png")), None);
    }

    #[test]
    fn test_flush_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let location = temp_dir.path().join("missing").join("cache.json");

        let result = CacheStore::new().flush(&location);
        assert!(matches!(result, Err(CamlibError::CachePersist { .. })));
    }
}
