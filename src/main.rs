use anyhow::Context;
use camlib::cli::Args;
use camlib::{logger, run_batch, CamlibError, RunConfig};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    let config = RunConfig::from_args(args);
    let cache_path = config.cache_path.clone();

    camlib::info!("CamLib CLI");
    camlib::info!("v{}\n", env!("CARGO_PKG_VERSION"));

    match run_batch(config).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_precondition() => {
            camlib::error!("{}", e);
            if matches!(e, CamlibError::NoImagesFound) {
                camlib::warn!("Use the `--force` flag to force recompression...");
            }
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Batch run failed (cache: {:?})", cache_path)),
    }
}
