use crate::constants::{DEFAULT_SHRINK_ENDPOINT, UNBOUNDED};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "camlib",
    version,
    about = "Compress PNG and JPEG images in place through a remote shrink service",
    long_about = "camlib sends each PNG or JPEG image to a remote compression service and writes \
                  the smaller result back over the original. A content-hash cache remembers files \
                  that were already compressed so they are not sent again.",
    after_help = "EXAMPLES:\n  \
    camlib .\n  \
    camlib assets/img -r\n  \
    camlib assets/img/test.png --width 800\n  \
    camlib assets --dry-run -m 10"
)]
pub struct Args {
    #[arg(
        help = "Images or directories to compress (default: current directory)",
        value_name = "PATH"
    )]
    pub paths: Vec<PathBuf>,

    #[arg(short = 'r', long, help = "Walk given directories recursively")]
    pub recursive: bool,

    #[arg(
        short = 'k',
        long,
        help = "API key for the compression service",
        long_help = "API key for the compression service. \
                     Defaults to the contents of ~/.CamLib."
    )]
    pub key: Option<String>,

    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        help = "Cache map location (default: ~/.camlib.cache.json)"
    )]
    pub cache: Option<PathBuf>,

    #[arg(long, help = "Resize images to the given width in pixels")]
    pub width: Option<u32>,

    #[arg(long, help = "Resize images to the given height in pixels")]
    pub height: Option<u32>,

    #[arg(long, help = "Ignore the cache and recompress every image")]
    pub force: bool,

    #[arg(long, help = "Report what would be compressed without touching anything")]
    pub dry_run: bool,

    #[arg(
        short = 'm',
        long,
        default_value_t = UNBOUNDED,
        allow_negative_numbers = true,
        help = "Maximum number of images to process in this run (-1: no maximum)"
    )]
    pub max: i64,

    #[arg(short = 'q', long, help = "Only print errors")]
    pub quiet: bool,

    #[arg(long, help = "Print every processing step")]
    pub verbose: bool,

    #[arg(long, hide = true, default_value = DEFAULT_SHRINK_ENDPOINT)]
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["camlib"]);
        assert!(args.paths.is_empty());
        assert_eq!(args.max, -1);
        assert_eq!(args.endpoint, DEFAULT_SHRINK_ENDPOINT);
        assert!(!args.force && !args.dry_run && !args.recursive);
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "camlib", "-r", "-k", "secret", "-c", "/tmp/c.json", "--width", "800", "--force",
            "--dry-run", "-m", "3", "a", "b.png",
        ]);
        assert_eq!(args.paths, vec![PathBuf::from("a"), PathBuf::from("b.png")]);
        assert!(args.recursive && args.force && args.dry_run);
        assert_eq!(args.key.as_deref(), Some("secret"));
        assert_eq!(args.cache, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(args.width, Some(800));
        assert_eq!(args.height, None);
        assert_eq!(args.max, 3);
    }

    #[test]
    fn test_negative_max() {
        let args = Args::parse_from(["camlib", "--max", "-1"]);
        assert_eq!(args.max, -1);
    }

    #[test]
    fn test_rejects_non_numeric_width() {
        assert!(Args::try_parse_from(["camlib", "--width", "wide"]).is_err());
    }
}
