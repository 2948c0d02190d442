use regex::Regex;
use std::sync::LazyLock;

static BASE_COUNTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)$").unwrap());
static EXT_COUNTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)").unwrap());

/// A media filename split into base name, extension and duplicate counter.
///
/// The export tool appends a `(n)` counter to disambiguate same-named files,
/// either before the extension (`IMG_4869(1).HEIC`) or after it
/// (`IMG_4869.HEIC(1)`). Both dialects normalize to the same parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub base: String,
    /// Extension including the leading dot, case preserved. Empty if the
    /// filename has none.
    pub extension: String,
    pub duplicate_index: Option<u32>,
}

/// Split a filename into `(base, extension, duplicate counter)`.
///
/// Pure and total: every string has exactly one normalization.
pub fn normalize(filename: &str) -> NormalizedName {
    let (base, ext) = split_extension(filename);

    // Counter before the extension: name(1).ext
    if let Some(caps) = BASE_COUNTER_RE.captures(base) {
        if let Ok(n) = caps[1].parse::<u32>() {
            let m = caps.get(0).unwrap();
            return NormalizedName {
                base: base[..m.start()].to_string(),
                extension: ext.to_string(),
                duplicate_index: Some(n),
            };
        }
    }

    // Counter after the extension: name.ext(1)
    if let Some(caps) = EXT_COUNTER_RE.captures(ext) {
        if let Ok(n) = caps[1].parse::<u32>() {
            let m = caps.get(0).unwrap();
            return NormalizedName {
                base: base.to_string(),
                extension: ext[..m.start()].to_string(),
                duplicate_index: Some(n),
            };
        }
    }

    NormalizedName {
        base: base.to_string(),
        extension: ext.to_string(),
        duplicate_index: None,
    }
}

/// Split at the last dot. A dot at position 0 marks a hidden file, not an
/// extension.
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    }
}
