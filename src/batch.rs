use crate::admission::Admission;
use crate::cache::CacheStore;
use crate::collect::{collect_images, prune_cached};
use crate::config::RunConfig;
use crate::error::{CamlibError, Result};
use crate::report::Reporter;
use crate::service::{CompressionService, ShrinkClient};
use crate::worker::{CompressionWorker, UnitOutcome};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Count of remote calls and disk writes that have started but not settled.
///
/// Workers open an [`Operation`] around each upload and each download plus
/// write. The cache may only be written once this is back to zero, otherwise
/// a digest for a file still being written could be missing or stale.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
}

impl InFlight {
    pub fn start(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_drained(&self) -> bool {
        self.count() == 0
    }

    /// Starts an operation that finishes when the returned guard drops.
    pub fn begin(&self) -> Operation<'_> {
        self.start();
        Operation { in_flight: self }
    }
}

/// One outstanding operation on an [`InFlight`] counter.
#[must_use = "the operation finishes as soon as the guard is dropped"]
pub struct Operation<'a> {
    in_flight: &'a InFlight,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        self.in_flight.finish();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates left after the cache filter.
    pub found: usize,
    pub admitted: usize,
    /// Candidates refused by the concurrency maximum.
    pub over_limit: usize,
    pub compressed: usize,
    pub no_benefit: usize,
    pub failed: usize,
    pub bytes_saved: u64,
    pub dry_run: bool,
    pub cache_flushed: bool,
}

impl RunSummary {
    fn tally(&mut self, outcome: &UnitOutcome) {
        match outcome {
            UnitOutcome::Compressed { savings, .. } => {
                self.compressed += 1;
                self.bytes_saved += savings.bytes_saved();
            }
            UnitOutcome::NoBenefit { .. } => self.no_benefit += 1,
            UnitOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Writes the cache, refusing while any unit is still in flight.
fn checkpoint(in_flight: &InFlight, cache: &CacheStore, location: &Path) -> Result<()> {
    if !in_flight.is_drained() {
        return Err(CamlibError::UndrainedFlush(in_flight.count()));
    }
    cache.flush(location)
}

pub struct BatchRunner<S> {
    config: RunConfig,
    service: S,
}

impl<S: CompressionService> BatchRunner<S> {
    pub fn new(config: RunConfig, service: S) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Collects, filters and admits candidates, runs every admitted file
    /// through the service concurrently on the current task, and writes the
    /// cache once all of them have settled.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut cache = CacheStore::load(&self.config.cache_path);

        let candidates = collect_images(&self.config.paths, self.config.recursive);
        crate::verbose!("Collected {} candidate image(s)", candidates.len());
        let pending = prune_cached(candidates, &cache, self.config.force);
        if pending.is_empty() {
            return Err(CamlibError::NoImagesFound);
        }

        let found = pending.len();
        let (admitted, refused) = Admission::new(self.config.max).partition(pending);
        let mut summary = RunSummary {
            found,
            admitted: admitted.len(),
            over_limit: refused.len(),
            dry_run: self.config.dry_run,
            ..RunSummary::default()
        };

        let reporter = Reporter::new(admitted.len() as u64);
        reporter.found(found);
        for path in &refused {
            reporter.over_limit(path);
        }

        if self.config.dry_run {
            for path in &admitted {
                reporter.dry_run(path);
            }
            reporter.finish(&summary);
            return Ok(summary);
        }

        let in_flight = InFlight::default();
        let worker = CompressionWorker::new(&self.service, self.config.resize, &in_flight);
        let worker = &worker;
        let mut units = FuturesUnordered::new();
        for path in admitted {
            units.push(async move {
                let outcome = worker.process(&path).await;
                (path, outcome)
            });
        }

        while let Some((path, outcome)) = units.next().await {
            if let UnitOutcome::Compressed {
                digest: Some(digest),
                ..
            } = &outcome
            {
                cache.record(&path, digest.clone());
            }
            summary.tally(&outcome);
            reporter.outcome(&path, &outcome);
        }

        drop(units);
        checkpoint(&in_flight, &cache, &self.config.cache_path)?;
        summary.cache_flushed = true;
        reporter.finish(&summary);
        Ok(summary)
    }
}

/// Runs a batch against the remote shrink service.
///
/// Credentials are resolved first: outside of a dry run a missing key stops
/// the run before any file is touched.
pub async fn run_batch(config: RunConfig) -> Result<RunSummary> {
    let api_key = config.api_key()?;
    let client = ShrinkClient::new(config.endpoint.clone(), api_key)?;
    BatchRunner::new(config, client).run().await
}
