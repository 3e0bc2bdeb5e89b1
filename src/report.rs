//! Console output for a batch run.

use crate::batch::RunSummary;
use crate::constants::{DRY_RUN_PREFIX, PROGRESS_BAR_TEMPLATE, SUMMARY_PREFIX};
use crate::logger::is_quiet;
use crate::utils::format_file_size;
use crate::worker::UnitOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

pub struct Reporter {
    bar: ProgressBar,
}

impl Reporter {
    pub fn new(total: u64) -> Self {
        let bar = if is_quiet() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar
        };
        Self { bar }
    }

    pub fn found(&self, count: usize) {
        self.bar.suspend(|| {
            crate::success!(
                "Found {} image{}\n",
                count,
                if count == 1 { "" } else { "s" }
            );
            crate::info!("Processing...");
        });
    }

    pub fn over_limit(&self, path: &Path) {
        self.bar
            .suspend(|| crate::verbose!("Concurrency maximum reached, skipping `{}`", path.display()));
    }

    pub fn dry_run(&self, path: &Path) {
        self.bar
            .suspend(|| crate::info!("{} Would compress `{}`", DRY_RUN_PREFIX, path.display()));
        self.bar.inc(1);
    }

    pub fn outcome(&self, path: &Path, outcome: &UnitOutcome) {
        self.bar.suspend(|| match outcome {
            UnitOutcome::Compressed { savings, .. } => crate::success!(
                "Saved {} ({}%) for `{}`",
                format_file_size(savings.bytes_saved()),
                savings.percent_saved(),
                path.display()
            ),
            UnitOutcome::NoBenefit { .. } => {
                crate::warn!("Couldn't compress `{}` any further", path.display())
            }
            UnitOutcome::Failed(failure) => {
                crate::error!("Compression failed for `{}`: {}", path.display(), failure)
            }
        });
        self.bar.inc(1);
    }

    pub fn finish(&self, summary: &RunSummary) {
        self.bar.finish_and_clear();

        crate::info!("\n{} Batch Summary:", SUMMARY_PREFIX);
        if summary.dry_run {
            crate::info!("  🧪 Dry run: {} file(s) would be compressed", summary.admitted);
        } else {
            crate::info!("  ✅ Compressed: {}", summary.compressed);
            crate::info!("  ➖ Already optimal: {}", summary.no_benefit);
            crate::info!("  ❌ Failed: {}", summary.failed);
            crate::info!("  💾 Total saved: {}", format_file_size(summary.bytes_saved));
        }
        if summary.over_limit > 0 {
            crate::info!(
                "  ⏭️  Not attempted (over --max): {}",
                summary.over_limit
            );
        }
    }
}
