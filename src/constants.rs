pub const DEFAULT_SHRINK_ENDPOINT: &str = "https://api.tinify.com/shrink";
pub const API_KEY_SIGNUP_URL: &str = "https://tinypng.com/developers";

/// Basic-auth user name the shrink service expects; the API key is the password.
pub const API_USER: &str = "api";

/// Status the shrink service answers with when a compression was created.
pub const SHRINK_CREATED_STATUS: u16 = 201;

pub const ERROR_CODE_QUOTA: &str = "TooManyRequests";
pub const ERROR_CODE_UNAUTHORIZED: &str = "Unauthorized";

pub const CREDENTIALS_FILE_NAME: &str = ".CamLib";
pub const CACHE_FILE_NAME: &str = ".camlib.cache.json";

/// Placeholder credential used when no request will ever be sent.
pub const DRY_RUN_KEY: &str = "dry-run-key";

/// Sentinel for "no concurrency maximum".
pub const UNBOUNDED: i64 = -1;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Prefix of the staging file a download is written to before it replaces the original.
pub const STAGING_PREFIX: &str = ".camlib-";

pub const PROGRESS_BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const SUCCESS_PREFIX: &str = "✔";
pub const FAILURE_PREFIX: &str = "✘";
pub const DRY_RUN_PREFIX: &str = "[DRY]";
pub const SUMMARY_PREFIX: &str = "📊";
