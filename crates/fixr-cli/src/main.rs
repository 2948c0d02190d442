use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use fixr_core::{process, MediaType, ProcessOptions};
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[derive(Parser)]
#[command(
    name = "fixr-rs",
    version,
    about = "Restore timestamp and GPS metadata to Takeout media files from their JSON sidecars"
)]
struct Cli {
    /// Directory containing exported media and sidecar JSON files
    directory: PathBuf,

    /// Run without applying changes
    #[arg(long)]
    dry_run: bool,

    /// Type of media files to process
    #[arg(long = "type", value_enum, default_value = "all")]
    media_type: MediaType,

    /// Directory to store log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Directory to save modified files; originals are modified in place if
    /// not specified
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.log_dir)?;
    let log_file = cli.log_dir.join(format!(
        "metadata_restore_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), File::create(&log_file)?),
    ];
    CombinedLogger::init(loggers)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            log::warn!("interrupt received, letting in-flight files finish");
            cancel.store(true, Ordering::SeqCst);
        })?;
    }

    log::info!("Starting metadata restoration in: {}", cli.directory.display());
    log::info!("Dry run: {}", cli.dry_run);

    let options = ProcessOptions {
        directory: cli.directory,
        dry_run: cli.dry_run,
        media_type: cli.media_type,
        output_dir: cli.output_dir,
    };
    let result = process(&options, &cancel)?;

    log::info!("Processing summary:");
    log::info!("Total files found: {}", result.total);
    log::info!("Successfully processed: {}", result.succeeded);
    log::info!("Skipped (no sidecar): {}", result.skipped_no_sidecar);
    log::info!("Skipped (unsupported format): {}", result.skipped_unsupported);
    log::info!("Failed: {}", result.failed);
    if result.cancelled {
        log::warn!("Interrupted before all files were processed");
    }
    if cli.dry_run {
        log::info!("This was a dry run - no changes were applied.");
    }

    Ok(())
}
