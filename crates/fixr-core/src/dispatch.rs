use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FixrError;
use crate::image;
use crate::metadata::MetadataRecord;
use crate::sidecar;
use crate::video::{self, Remuxer};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "heic", "png", "tif", "tiff"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "m4v"];

/// The format set is fixed and small, so dispatch is a closed enum rather
/// than open-ended handler polymorphism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Map a file extension to its handler category, case-insensitively.
pub fn kind_for(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Per-file result. Used for reporting and counting only; one file's outcome
/// never affects another's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    SkippedUnsupportedFormat,
    SkippedNoSidecar,
    Failed(String),
}

/// Shared, read-only state for the per-file pipeline.
pub struct ProcessContext<'a> {
    /// Scan root, used to mirror relative paths into `output_dir`.
    pub root: &'a Path,
    pub dry_run: bool,
    /// When set, metadata is written to a copy placed here and the source
    /// tree is left untouched.
    pub output_dir: Option<&'a Path>,
    pub remuxer: &'a dyn Remuxer,
}

/// Run the resolve -> parse -> write pipeline for one file.
///
/// Total: every error is converted into an `Outcome`, so one broken file can
/// never abort the batch.
pub fn process_file(path: &Path, ctx: &ProcessContext) -> Outcome {
    let Some(kind) = kind_for(path) else {
        log::warn!("unsupported format: {}", path.display());
        return Outcome::SkippedUnsupportedFormat;
    };

    let Some(sidecar_path) = sidecar::resolve_sidecar(path) else {
        log::warn!("no sidecar JSON found for {}", path.display());
        return Outcome::SkippedNoSidecar;
    };

    let payload = match fs::read(&sidecar_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return fail(path, format!("could not read sidecar {}: {e}", sidecar_path.display()))
        }
    };

    let record = match MetadataRecord::from_json_slice(&payload, &sidecar_path) {
        Ok(record) => record,
        Err(e) => return fail(path, e.to_string()),
    };

    let target = if let (Some(out), false) = (ctx.output_dir, ctx.dry_run) {
        match stage_copy(path, ctx.root, out) {
            Ok(staged) => staged,
            Err(e) => return fail(path, format!("could not stage copy: {e}")),
        }
    } else {
        path.to_path_buf()
    };

    let written = match kind {
        MediaKind::Image => image::write_image_metadata(&target, &record, ctx.dry_run),
        MediaKind::Video => video::write_video_metadata(&target, &record, ctx.dry_run, ctx.remuxer),
    };

    match written {
        Ok(()) => {
            log::info!("restored metadata for {}", path.display());
            Outcome::Success
        }
        Err(e) => fail(path, e.to_string()),
    }
}

fn fail(path: &Path, reason: String) -> Outcome {
    log::error!("failed to process {}: {reason}", path.display());
    Outcome::Failed(reason)
}

/// Copy the media file into the output directory, mirroring its path
/// relative to the scan root.
fn stage_copy(path: &Path, root: &Path, output_dir: &Path) -> Result<PathBuf, FixrError> {
    let rel = path
        .strip_prefix(root)
        .unwrap_or_else(|_| Path::new(path.file_name().unwrap_or(path.as_os_str())));
    let dest = output_dir.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &dest)?;
    Ok(dest)
}
