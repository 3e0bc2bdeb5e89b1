pub mod logger;

pub mod admission;
pub mod batch;
pub mod cache;
pub mod cli;
pub mod collect;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod report;
pub mod service;
pub mod utils;
pub mod worker;

pub use admission::Admission;
pub use batch::{run_batch, BatchRunner, InFlight, RunSummary};
pub use cache::{cache_key, CacheStore};
pub use collect::{collect_images, is_supported_image, prune_cached};
pub use config::RunConfig;
pub use digest::digest_file;
pub use error::{CamlibError, Result};
pub use service::{
    ByteStream, CompressionService, ResizeDirective, Savings, ShrinkClient, ShrinkOutcome,
};
pub use worker::{CompressionWorker, Failure, UnitOutcome};
