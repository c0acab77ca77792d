//! Capture export.
//!
//! The capture document is the system's only persisted artifact: the
//! ordered reading sequence plus enough context (config, capture time,
//! schema version) for a consumer to interpret it without the session that
//! produced it. Serialized as JSON; filenames embed the capture timestamp
//! so repeated exports never collide.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::types::{SensorConfig, SensorReading};

/// Format version of the capture document.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write capture file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize capture document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Self-contained export of one capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDocument {
    pub schema_version: u32,
    /// Wall-clock capture time, RFC 3339 UTC.
    pub captured_at: String,
    pub config: SensorConfig,
    pub reading_count: usize,
    /// Readings in buffer order (event arrival order, timestamps
    /// non-decreasing).
    pub readings: Vec<SensorReading>,
}

impl CaptureDocument {
    pub fn new(config: SensorConfig, readings: Vec<SensorReading>, at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            captured_at: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            config,
            reading_count: readings.len(),
            readings,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Filename embedding the capture timestamp, e.g.
/// `capture-20260830T141503Z.json`.
pub fn capture_filename(at: DateTime<Utc>) -> String {
    format!("capture-{}.json", at.format("%Y%m%dT%H%M%SZ"))
}

/// Writes the capture document into `dir` and returns the file path.
pub fn write_capture(
    dir: &Path,
    config: SensorConfig,
    readings: Vec<SensorReading>,
    at: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(capture_filename(at));
    let document = CaptureDocument::new(config, readings, at);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.flush()?;
    info!(path = %path.display(), readings = document.reading_count, "capture exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Axes;
    use chrono::TimeZone;

    fn sample_readings() -> Vec<SensorReading> {
        vec![
            SensorReading {
                acceleration: Axes::new(1.0, 2.0, 3.0),
                angular_velocity: Axes::new(0.0, 0.1, 0.0),
                magnetometer: None,
                timestamp_ms: 0.0,
            },
            SensorReading {
                acceleration: Axes::new(1.0, 2.0, 3.0),
                angular_velocity: Axes::new(0.0, 0.0, 0.1),
                magnetometer: None,
                timestamp_ms: 16.0,
            },
        ]
    }

    fn capture_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 14, 15, 3).unwrap()
    }

    #[test]
    fn test_filename_embeds_capture_timestamp() {
        assert_eq!(
            capture_filename(capture_time()),
            "capture-20260830T141503Z.json"
        );
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = CaptureDocument::new(SensorConfig::default(), sample_readings(), capture_time());
        let json = doc.to_json().unwrap();
        let back: CaptureDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.reading_count, 2);
        assert_eq!(back.readings, doc.readings);
        assert_eq!(back.captured_at, "2026-08-30T14:15:03Z");
    }

    #[test]
    fn test_write_capture_creates_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_capture(
            dir.path(),
            SensorConfig::default(),
            sample_readings(),
            capture_time(),
        )
        .unwrap();

        assert!(path.exists());
        assert_eq!(path.parent(), Some(dir.path()));
        let back: CaptureDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.reading_count, 2);
    }
}
