use std::path::Path;

use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;

use crate::error::FixrError;
use crate::metadata::MetadataRecord;

/// Write capture time and GPS data into an image's EXIF block.
///
/// Timestamp and GPS are independently optional; only present fields are
/// written, and a record with neither is a successful no-op. A dry run
/// builds the full tag set but never touches the file.
pub fn write_image_metadata(
    path: &Path,
    record: &MetadataRecord,
    dry_run: bool,
) -> Result<(), FixrError> {
    let Some(exif) = build_exif(record) else {
        log::debug!("no metadata to write for {}", path.display());
        return Ok(());
    };

    if dry_run {
        return Ok(());
    }

    exif.write_to_file(path).map_err(|e| FixrError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Build the EXIF block for a record, or `None` when there is nothing to
/// write.
fn build_exif(record: &MetadataRecord) -> Option<Metadata> {
    let mut exif = Metadata::new();
    let mut populated = false;

    if let Some(datetime) = record.exif_datetime() {
        exif.set_tag(ExifTag::ModifyDate(datetime.clone()));
        exif.set_tag(ExifTag::DateTimeOriginal(datetime));
        populated = true;
    }

    if let Some((lat, lon)) = record.gps() {
        let lat_ref = if lat >= 0.0 { "N" } else { "S" };
        let lon_ref = if lon >= 0.0 { "E" } else { "W" };
        exif.set_tag(ExifTag::GPSLatitudeRef(lat_ref.to_string()));
        exif.set_tag(ExifTag::GPSLatitude(decimal_to_dms(lat.abs())));
        exif.set_tag(ExifTag::GPSLongitudeRef(lon_ref.to_string()));
        exif.set_tag(ExifTag::GPSLongitude(decimal_to_dms(lon.abs())));

        if let Some(alt) = record.altitude {
            let alt_ref = if alt >= 0.0 { 0u8 } else { 1u8 };
            exif.set_tag(ExifTag::GPSAltitudeRef(vec![alt_ref]));
            exif.set_tag(ExifTag::GPSAltitude(vec![uR64 {
                nominator: (alt.abs() * 100.0) as u32,
                denominator: 100,
            }]));
        }
        populated = true;
    }

    populated.then_some(exif)
}

/// Convert absolute decimal degrees to EXIF degree/minute/second rationals.
///
/// Seconds carry hundredth precision with a denominator of 100. Each stage
/// truncates, never rounds.
fn decimal_to_dms(decimal: f64) -> Vec<uR64> {
    let degrees = decimal as u32;
    let minutes = ((decimal - f64::from(degrees)) * 60.0) as u32;
    let seconds_hundredths =
        (((decimal - f64::from(degrees)) * 60.0 - f64::from(minutes)) * 60.0 * 100.0) as u32;

    vec![
        uR64 { nominator: degrees, denominator: 1 },
        uR64 { nominator: minutes, denominator: 1 },
        uR64 { nominator: seconds_hundredths, denominator: 100 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn dms_to_decimal(dms: &[uR64]) -> f64 {
        f64::from(dms[0].nominator) / f64::from(dms[0].denominator)
            + f64::from(dms[1].nominator) / f64::from(dms[1].denominator) / 60.0
            + f64::from(dms[2].nominator) / f64::from(dms[2].denominator) / 3600.0
    }

    #[test]
    fn test_dms_truncates() {
        // 10.5 degrees = 10 deg 30 min 0.00 sec exactly
        let dms = decimal_to_dms(10.5);
        assert_eq!((dms[0].nominator, dms[0].denominator), (10, 1));
        assert_eq!((dms[1].nominator, dms[1].denominator), (30, 1));
        assert_eq!((dms[2].nominator, dms[2].denominator), (0, 100));
    }

    #[test]
    fn test_gps_round_trip() {
        // Tolerance: one hundredth-of-a-second truncation step plus float
        // slack on either coordinate.
        let tolerance = 2.0 / 360_000.0;
        for coord in [37.4219_f64, 122.084, 0.0001, 89.999999] {
            let back = dms_to_decimal(&decimal_to_dms(coord));
            assert!(
                (coord - back).abs() < tolerance,
                "{coord} -> {back} drifted more than a hundredth of a second"
            );
            assert!(back <= coord + 1e-12, "truncation must never overshoot");
        }
    }

    fn record_with_gps() -> MetadataRecord {
        MetadataRecord {
            timestamp: Some(1_600_000_000),
            latitude: Some(37.4219),
            longitude: Some(-122.084),
            altitude: Some(-3.2),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_exif_tags() {
        let exif = build_exif(&record_with_gps()).unwrap();
        let mut saw_date = false;
        let mut saw_lat_ref = false;
        let mut saw_lon_ref = false;
        let mut saw_alt_ref = false;
        for tag in &exif {
            match tag {
                ExifTag::DateTimeOriginal(_) => saw_date = true,
                ExifTag::GPSLatitudeRef(r) => {
                    saw_lat_ref = true;
                    assert!(r.starts_with('N'));
                }
                ExifTag::GPSLongitudeRef(r) => {
                    saw_lon_ref = true;
                    assert!(r.starts_with('W'));
                }
                ExifTag::GPSAltitudeRef(bytes) => {
                    saw_alt_ref = true;
                    // Negative altitude means below sea level.
                    assert_eq!(bytes.first(), Some(&1u8));
                }
                _ => {}
            }
        }
        assert!(saw_date && saw_lat_ref && saw_lon_ref && saw_alt_ref);
    }

    #[test]
    fn test_empty_record_builds_nothing() {
        assert!(build_exif(&MetadataRecord::default()).is_none());
    }

    #[test]
    fn test_dry_run_never_mutates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        write_image_metadata(&path, &record_with_gps(), true).unwrap();
        write_image_metadata(&path, &record_with_gps(), true).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"not really a jpeg");
    }

    #[test]
    fn test_nothing_to_write_is_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"untouched").unwrap();

        write_image_metadata(&path, &MetadataRecord::default(), false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"untouched");
    }
}
