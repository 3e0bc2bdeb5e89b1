#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use camlib::{ByteStream, CamlibError, CompressionService, ResizeDirective, Result, Savings, ShrinkOutcome};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const ORIGINAL_BYTES: &[u8] = b"original image bytes, long enough to shrink";
pub const COMPRESSED_BYTES: &[u8] = b"tiny image";

/// In-memory stand-in for the shrink service.
///
/// Every file shrinks to `COMPRESSED_BYTES` unless an outcome is scripted
/// for its file name.
pub struct FakeService {
    outcomes: HashMap<String, ShrinkOutcome>,
    unreachable: HashSet<String>,
    fail_fetch: bool,
    pub submitted: Mutex<Vec<PathBuf>>,
    pub fetched: Mutex<Vec<(String, Option<ResizeDirective>)>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            unreachable: HashSet::new(),
            fail_fetch: false,
            submitted: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_outcome(mut self, file_name: &str, outcome: ShrinkOutcome) -> Self {
        self.outcomes.insert(file_name.to_string(), outcome);
        self
    }

    pub fn with_no_response(mut self, file_name: &str) -> Self {
        self.unreachable.insert(file_name.to_string());
        self
    }

    pub fn with_failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn submitted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        names.sort();
        names
    }

    pub fn fetched(&self) -> Vec<(String, Option<ResizeDirective>)> {
        self.fetched.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[async_trait]
impl CompressionService for FakeService {
    async fn shrink(&self, path: &Path) -> Result<ShrinkOutcome> {
        self.submitted.lock().unwrap().push(path.to_path_buf());
        tokio::task::yield_now().await;

        let name = file_name(path);
        if self.unreachable.contains(&name) {
            return Err(CamlibError::Transport("connection refused".to_string()));
        }
        if let Some(outcome) = self.outcomes.get(&name) {
            return Ok(outcome.clone());
        }

        let input_size = fs::metadata(path)?.len();
        Ok(ShrinkOutcome::Success {
            savings: Savings {
                input_size,
                output_size: COMPRESSED_BYTES.len() as u64,
            },
            url: format!("https://fake.test/output/{}", name),
        })
    }

    async fn fetch(&self, url: &str, resize: Option<&ResizeDirective>) -> Result<ByteStream> {
        self.fetched
            .lock()
            .unwrap()
            .push((url.to_string(), resize.copied()));
        tokio::task::yield_now().await;

        if self.fail_fetch {
            return Err(CamlibError::Transport("HTTP 404".to_string()));
        }

        let (head, tail) = COMPRESSED_BYTES.split_at(COMPRESSED_BYTES.len() / 2);
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(head)),
            Ok(Bytes::from_static(tail)),
        ];
        Ok(stream::iter(chunks).boxed())
    }
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn write_image(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A directory with `a.png`, `b.jpg` and a non-image file.
pub fn create_test_image_files(dir: &Path) -> Vec<PathBuf> {
    let a = write_image(dir, "a.png", ORIGINAL_BYTES);
    let b = write_image(dir, "b.jpg", b"another original image, also long enough");
    write_image(dir, "notes.txt", b"not an image");
    vec![a, b]
}

pub fn write_cache(location: &Path, entries: &[(&Path, &str)]) {
    let map: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(path, digest)| {
            (
                path.to_string_lossy().into_owned(),
                serde_json::Value::String(digest.to_string()),
            )
        })
        .collect();
    fs::write(location, serde_json::Value::Object(map).to_string()).unwrap();
}
