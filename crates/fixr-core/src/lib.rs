pub mod dispatch;
pub mod edited;
pub mod error;
pub mod filename;
pub mod image;
pub mod metadata;
pub mod scan;
pub mod sidecar;
pub mod video;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

pub use dispatch::{process_file, MediaKind, Outcome, ProcessContext};
pub use error::FixrError;
pub use metadata::MetadataRecord;
pub use scan::MediaType;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Directory containing exported media and their sidecar JSON files.
    pub directory: PathBuf,
    /// Resolve, parse and encode, but apply no change.
    pub dry_run: bool,
    pub media_type: MediaType,
    /// When set, modified copies land here and originals stay untouched.
    pub output_dir: Option<PathBuf>,
}

/// Aggregated outcome counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub total: u64,
    pub succeeded: u64,
    pub skipped_unsupported: u64,
    pub skipped_no_sidecar: u64,
    pub failed: u64,
    /// True when an interrupt stopped the run before all files were claimed.
    pub cancelled: bool,
}

/// Discover media files and run the per-file pipeline over them.
///
/// Files are processed in parallel; each file only touches its own sidecar
/// and output path, and the log/progress sinks serialize internally. The
/// cancel flag stops new files from being claimed, in-flight files finish.
pub fn process(options: &ProcessOptions, cancel: &AtomicBool) -> anyhow::Result<ProcessResult> {
    let files = scan::discover(&options.directory, options.media_type)?;
    log::info!(
        "Found {} media files under {}",
        files.len(),
        options.directory.display()
    );

    if let Some(out) = &options.output_dir {
        if !options.dry_run {
            std::fs::create_dir_all(out)?;
        }
    }

    let remuxer = video::FfmpegRemuxer::default();
    let ctx = ProcessContext {
        root: &options.directory,
        dry_run: options.dry_run,
        output_dir: options.output_dir.as_deref(),
        remuxer: &remuxer,
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} processing media")
            .unwrap(),
    );

    let outcomes: Vec<Option<Outcome>> = files
        .par_iter()
        .map(|path| {
            if cancel.load(Ordering::SeqCst) {
                return None;
            }
            let outcome = dispatch::process_file(path, &ctx);
            pb.inc(1);
            Some(outcome)
        })
        .collect();
    pb.finish_and_clear();

    let mut result = ProcessResult {
        total: files.len() as u64,
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            None => result.cancelled = true,
            Some(Outcome::Success) => result.succeeded += 1,
            Some(Outcome::SkippedUnsupportedFormat) => result.skipped_unsupported += 1,
            Some(Outcome::SkippedNoSidecar) => result.skipped_no_sidecar += 1,
            Some(Outcome::Failed(_)) => result.failed += 1,
        }
    }
    Ok(result)
}
