use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::FixrError;
use crate::metadata::MetadataRecord;

/// Lossless container rewrite: copy streams byte-for-byte into `output`
/// while setting the given metadata tags.
pub trait Remuxer: Sync {
    fn remux(&self, input: &Path, output: &Path, tags: &[(String, String)]) -> Result<(), String>;
}

/// `ffmpeg -i INPUT -c copy -metadata k=v ... -y OUTPUT`.
///
/// The child is killed once the timeout expires; an unresponsive ffmpeg must
/// not stall the whole batch.
pub struct FfmpegRemuxer {
    pub timeout: Duration,
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(120) }
    }
}

impl Remuxer for FfmpegRemuxer {
    fn remux(&self, input: &Path, output: &Path, tags: &[(String, String)]) -> Result<(), String> {
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-i").arg(input).arg("-c").arg("copy");
        for (key, value) in tags {
            cmd.arg("-metadata").arg(format!("{key}={value}"));
        }
        cmd.arg("-y").arg(output);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| format!("failed to spawn ffmpeg: {e}"))?;

        // Drain stderr from a separate thread so a chatty child cannot fill
        // the pipe and block.
        let mut stderr = child.stderr.take();
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(ref mut err) = stderr {
                let _ = err.read_to_string(&mut buf);
            }
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = reader.join();
                        return Err(format!(
                            "ffmpeg timed out after {}s",
                            self.timeout.as_secs()
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return Err(format!("failed to wait for ffmpeg: {e}"));
                }
            }
        };

        let diagnostics = reader.join().unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(format!("ffmpeg exited with {status}: {}", diagnostics.trim()))
        }
    }
}

/// Removes the temporary remux output unless disarmed. The original video
/// must be the only thing left on disk on every failure path.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("could not remove temp file {}: {e}", self.path.display());
            }
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("fixr");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_temp{ext}"))
}

/// Inject `creation_time` and `location` container tags via a lossless
/// stream-copy remux, replacing the original atomically on success.
///
/// Nothing to add is success with no action. On any failure the original is
/// untouched and no temporary file remains.
pub fn write_video_metadata(
    path: &Path,
    record: &MetadataRecord,
    dry_run: bool,
    remuxer: &dyn Remuxer,
) -> Result<(), FixrError> {
    if dry_run {
        return Ok(());
    }

    let mut tags: Vec<(String, String)> = Vec::new();
    if let Some(creation) = record.iso8601_datetime() {
        tags.push(("creation_time".to_string(), creation));
    }
    if let Some((lat, lon)) = record.gps() {
        tags.push(("location".to_string(), format!("{lat},{lon}")));
    }
    if tags.is_empty() {
        log::debug!("no metadata to add for video {}", path.display());
        return Ok(());
    }

    let temp = temp_sibling(path);
    let guard = TempFileGuard::new(temp.clone());

    remuxer.remux(path, &temp, &tags).map_err(|reason| FixrError::Write {
        path: path.to_path_buf(),
        reason,
    })?;

    fs::rename(&temp, path).map_err(|e| FixrError::Write {
        path: path.to_path_buf(),
        reason: format!("could not replace original with remuxed file: {e}"),
    })?;
    guard.disarm();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    type Call = (PathBuf, PathBuf, Vec<(String, String)>);

    /// Records calls; writes `payload` to the output when `succeed`.
    struct MockRemuxer {
        calls: Mutex<Vec<Call>>,
        succeed: bool,
        create_output: bool,
    }

    impl MockRemuxer {
        fn new(succeed: bool, create_output: bool) -> Self {
            Self { calls: Mutex::new(Vec::new()), succeed, create_output }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Remuxer for MockRemuxer {
        fn remux(
            &self,
            input: &Path,
            output: &Path,
            tags: &[(String, String)],
        ) -> Result<(), String> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf(), tags.to_vec()));
            if self.create_output {
                fs::write(output, b"remuxed").unwrap();
            }
            if self.succeed {
                Ok(())
            } else {
                Err("mock ffmpeg failure".to_string())
            }
        }
    }

    fn full_record() -> MetadataRecord {
        MetadataRecord {
            timestamp: Some(1_600_000_000),
            latitude: Some(37.4219),
            longitude: Some(-122.084),
            ..Default::default()
        }
    }

    #[test]
    fn test_dry_run_invokes_nothing() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        fs::write(&video, b"original").unwrap();

        let remuxer = MockRemuxer::new(true, true);
        write_video_metadata(&video, &full_record(), true, &remuxer).unwrap();

        assert_eq!(remuxer.call_count(), 0);
        assert_eq!(fs::read(&video).unwrap(), b"original");
    }

    #[test]
    fn test_no_tags_is_success_without_invocation() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        fs::write(&video, b"original").unwrap();

        let remuxer = MockRemuxer::new(true, true);
        write_video_metadata(&video, &MetadataRecord::default(), false, &remuxer).unwrap();

        assert_eq!(remuxer.call_count(), 0);
        assert_eq!(fs::read(&video).unwrap(), b"original");
    }

    #[test]
    fn test_success_replaces_original_atomically() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        fs::write(&video, b"original").unwrap();

        let remuxer = MockRemuxer::new(true, true);
        write_video_metadata(&video, &full_record(), false, &remuxer).unwrap();

        assert_eq!(fs::read(&video).unwrap(), b"remuxed");
        assert!(!dir.path().join("clip_temp.mp4").exists());

        let calls = remuxer.calls.lock().unwrap();
        let (_, _, tags) = &calls[0];
        assert!(tags.iter().any(|(k, _)| k == "creation_time"));
        assert!(tags
            .iter()
            .any(|(k, v)| k == "location" && v == "37.4219,-122.084"));
    }

    #[test]
    fn test_failure_leaves_original_and_no_temp() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        fs::write(&video, b"original").unwrap();

        // The failing tool may or may not have produced partial output.
        for create_output in [false, true] {
            let remuxer = MockRemuxer::new(false, create_output);
            let err =
                write_video_metadata(&video, &full_record(), false, &remuxer).unwrap_err();
            assert!(matches!(err, FixrError::Write { .. }));
            assert_eq!(fs::read(&video).unwrap(), b"original");
            assert!(!dir.path().join("clip_temp.mp4").exists());
        }
    }

    #[test]
    fn test_temp_sibling_name() {
        assert_eq!(
            temp_sibling(Path::new("/a/clip.mp4")),
            PathBuf::from("/a/clip_temp.mp4")
        );
    }
}
