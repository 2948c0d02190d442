use std::path::{Path, PathBuf};

use crate::edited::strip_edited_suffix;
use crate::filename::normalize;

/// Find the sidecar JSON for a media file, trying the naming dialects the
/// export tool has been observed to use.
///
/// Candidate patterns are probed in a fixed priority order and the first one
/// that exists on disk wins. Cross-matching two different photos is worse
/// than reporting no match, so the order must not change:
///
/// 1. `{base}.json` (media extension dropped entirely)
/// 2. `{base}{ext}.json` (the common case)
/// 3. `{base}.{ext}({n}).json` (counter relocated after the extension)
/// 4. `{base}({n}){ext}.json` (counter kept before the extension)
///
/// If none exist, the same four patterns are retried with the base shortened
/// by one trailing character: the export clips long names to a fixed length
/// limit before deriving the sidecar name. If that also fails and the base
/// ends with `_n`, `{base minus "_n"}_.json` is probed last.
///
/// Returns `None` when nothing matches; a missing sidecar is a common,
/// expected outcome, not an error.
pub fn resolve_sidecar(media_path: &Path) -> Option<PathBuf> {
    let filename = media_path.file_name()?.to_str()?;
    let dir = media_path.parent().unwrap_or_else(|| Path::new(""));

    let name = normalize(filename);
    let base = match strip_edited_suffix(&name.base) {
        Some(original) => original,
        None => name.base,
    };

    if let Some(found) = probe_patterns(dir, &base, &name.extension, name.duplicate_index) {
        return Some(found);
    }

    // The export sometimes clips one character of the base before naming the
    // sidecar.
    if !base.is_empty() {
        let mut clipped = base.clone();
        clipped.pop();
        if let Some(found) = probe_patterns(dir, &clipped, &name.extension, name.duplicate_index) {
            return Some(found);
        }
    }

    // `_n` numeric-variant marker: the sidecar keeps a bare trailing
    // underscore instead.
    if let Some(prefix) = base.strip_suffix("_n") {
        let candidate = dir.join(format!("{prefix}_.json"));
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

fn probe_patterns(dir: &Path, base: &str, ext: &str, dup: Option<u32>) -> Option<PathBuf> {
    let bare_ext = ext.strip_prefix('.').unwrap_or(ext);

    let mut candidates = vec![
        format!("{base}.json"),
        format!("{base}{ext}.json"),
    ];
    if let Some(n) = dup {
        candidates.push(format!("{base}.{bare_ext}({n}).json"));
        candidates.push(format!("{base}({n}){ext}.json"));
    }

    for candidate in candidates {
        let path = dir.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }
    None
}
