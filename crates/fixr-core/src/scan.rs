use std::path::{Path, PathBuf};

use clap::ValueEnum;
use walkdir::WalkDir;

use crate::dispatch::{kind_for, MediaKind};

/// Which media category a run should touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaType {
    All,
    Images,
    Videos,
}

impl MediaType {
    pub fn includes(self, kind: MediaKind) -> bool {
        match self {
            MediaType::All => true,
            MediaType::Images => kind == MediaKind::Image,
            MediaType::Videos => kind == MediaKind::Video,
        }
    }
}

/// Recursively collect media files with a recognized extension, sorted for a
/// deterministic processing order.
pub fn discover(root: &Path, media_type: MediaType) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = kind_for(entry.path()) else {
            continue;
        };
        if media_type.includes(kind) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.jpg");
        touch(dir.path(), "a.MP4");
        touch(dir.path(), "a.jpg.json");
        touch(dir.path(), "notes.txt");

        let all = discover(dir.path(), MediaType::All).unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.MP4", "b.jpg"]);

        let images = discover(dir.path(), MediaType::Images).unwrap();
        assert_eq!(images.len(), 1);
        let videos = discover(dir.path(), MediaType::Videos).unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[test]
    fn test_discover_recurses() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "c.heic");

        let all = discover(dir.path(), MediaType::All).unwrap();
        assert_eq!(all.len(), 1);
    }
}
