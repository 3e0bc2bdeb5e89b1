use crate::cli::Args;
use crate::constants::{
    CACHE_FILE_NAME, CREDENTIALS_FILE_NAME, DEFAULT_SHRINK_ENDPOINT, DRY_RUN_KEY, UNBOUNDED,
};
use crate::error::{CamlibError, Result};
use crate::service::ResizeDirective;
use std::fs;
use std::path::{Path, PathBuf};

/// Picks the API key: an explicit key first, then `<home>/.CamLib`.
/// Both are trimmed; an empty key counts as absent.
pub fn resolve_api_key(explicit: Option<&str>, home: Option<&Path>) -> Option<String> {
    let key = match explicit {
        Some(key) => key.trim().to_string(),
        None => {
            let file = home?.join(CREDENTIALS_FILE_NAME);
            fs::read_to_string(file).ok()?.trim().to_string()
        }
    };
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// `<home>/.camlib.cache.json`, or the current directory without a home.
pub fn default_cache_path(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) => home.join(CACHE_FILE_NAME),
        None => PathBuf::from(CACHE_FILE_NAME),
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub cache_path: PathBuf,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub resize: Option<ResizeDirective>,
    pub force: bool,
    pub dry_run: bool,
    /// Concurrency maximum; negative means unbounded.
    pub max: i64,
}

impl RunConfig {
    pub fn new(paths: Vec<PathBuf>, cache_path: PathBuf) -> Self {
        Self {
            paths,
            recursive: false,
            cache_path,
            api_key: None,
            endpoint: DEFAULT_SHRINK_ENDPOINT.to_string(),
            resize: None,
            force: false,
            dry_run: false,
            max: UNBOUNDED,
        }
    }

    pub fn from_args(args: Args) -> Self {
        let home = dirs::home_dir();
        let paths = if args.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.paths
        };

        Self {
            paths,
            recursive: args.recursive,
            cache_path: args
                .cache
                .unwrap_or_else(|| default_cache_path(home.as_deref())),
            api_key: resolve_api_key(args.key.as_deref(), home.as_deref()),
            endpoint: args.endpoint,
            resize: ResizeDirective::new(args.width, args.height),
            force: args.force,
            dry_run: args.dry_run,
            max: args.max,
        }
    }

    /// The key requests are signed with. A dry run sends nothing and needs none.
    pub fn api_key(&self) -> Result<String> {
        if self.dry_run {
            return Ok(DRY_RUN_KEY.to_string());
        }
        self.api_key.clone().ok_or(CamlibError::MissingApiKey)
    }
}
