use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FixrError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TakenTime {
    timestamp: Option<Timestamp>,
}

/// Export batches disagree on whether the epoch is a string or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Text(String),
    Seconds(i64),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeoData {
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
}

/// Metadata parsed from a sidecar JSON payload.
///
/// Every field is optional; a missing or wrong-shaped field is simply absent.
/// Latitude and longitude are kept only as a pair (a lone coordinate is
/// meaningless), and altitude only when the pair is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    /// Capture time as Unix epoch seconds (`photoTakenTime.timestamp`).
    pub timestamp: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl MetadataRecord {
    /// Parse a sidecar payload. Fails only when the payload is not
    /// well-formed JSON.
    pub fn from_json_slice(bytes: &[u8], path: &Path) -> Result<Self, FixrError> {
        let payload: Value =
            serde_json::from_slice(bytes).map_err(|e| FixrError::MalformedMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let timestamp = payload
            .get("photoTakenTime")
            .and_then(|v| serde_json::from_value::<TakenTime>(v.clone()).ok())
            .and_then(|t| t.timestamp)
            .and_then(|ts| match ts {
                Timestamp::Text(s) => s.trim().parse::<i64>().ok(),
                Timestamp::Seconds(n) => Some(n),
            });

        let geo = payload
            .get("geoData")
            .and_then(|v| serde_json::from_value::<GeoData>(v.clone()).ok())
            .unwrap_or_default();
        let (latitude, longitude, altitude) = match (geo.latitude, geo.longitude) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon), geo.altitude),
            _ => (None, None, None),
        };

        Ok(Self {
            timestamp,
            latitude,
            longitude,
            altitude,
            title: payload.get("title").and_then(|v| v.as_str()).map(String::from),
            description: payload
                .get("description")
                .and_then(|v| v.as_str())
                .map(String::from),
        })
    }

    /// Capture time as local naive datetime. EXIF datetimes carry no
    /// timezone, so the UTC epoch is rendered in local time.
    pub fn local_datetime(&self) -> Option<NaiveDateTime> {
        let utc = chrono::DateTime::from_timestamp(self.timestamp?, 0)?;
        Some(utc.with_timezone(&chrono::Local).naive_local())
    }

    /// Capture time in EXIF format, `YYYY:MM:DD HH:MM:SS`.
    pub fn exif_datetime(&self) -> Option<String> {
        Some(self.local_datetime()?.format("%Y:%m:%d %H:%M:%S").to_string())
    }

    /// Capture time as ISO-8601 local time, for container `creation_time`
    /// tags.
    pub fn iso8601_datetime(&self) -> Option<String> {
        Some(self.local_datetime()?.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    /// Both coordinates, or nothing.
    pub fn gps(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}
