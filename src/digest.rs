//! Content fingerprints used for change detection.

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Computes the MD5 digest of the file's current bytes as lower-case hex.
///
/// The file is read on every call; nothing is memoized, so a digest taken
/// after a write always reflects what is on disk at that moment.
pub fn digest_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}
