//! CSV export of the recorded pose history.

use crate::{constants::EXPORT_FILE_PREFIX, pose_estimation::Pose, Error, Result};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Column layout of the exported table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvSchema {
    /// `Timestamp,Date,Roll,Pitch,Yaw` with an ISO-8601 date column
    #[default]
    Detailed,
    /// `Timestamp,Roll,Pitch,Yaw`
    Simple,
}

impl CsvSchema {
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::Detailed => "Timestamp,Date,Roll,Pitch,Yaw",
            Self::Simple => "Timestamp,Roll,Pitch,Yaw",
        }
    }
}

impl std::str::FromStr for CsvSchema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "detailed" => Ok(Self::Detailed),
            "simple" => Ok(Self::Simple),
            _ => Err(Error::ConfigError(format!("Unknown export schema: {s}"))),
        }
    }
}

/// Format with two decimals, rounding halves away from zero
///
/// Only binary representation error is absorbed: `1.005` (stored as
/// 1.00499...) prints as `1.01`, while `0.124999999995` still prints as `0.12`.
#[must_use]
pub fn format_fixed2(value: f64) -> String {
    let shifted = value * 100.0;
    let nudge = shifted.abs() * f64::EPSILON * 4.0;
    let mut rounded = (shifted + shifted.signum() * nudge).round() / 100.0;
    if rounded == 0.0 {
        // Avoid "-0.00"
        rounded = 0.0;
    }
    format!("{rounded:.2}")
}

/// ISO-8601 UTC rendering of an epoch-millisecond timestamp
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the timestamp is outside the calendar range
pub fn iso_timestamp(timestamp_ms: i64) -> Result<String> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| Error::InvalidInput(format!("Timestamp out of range: {timestamp_ms} ms")))
}

/// Serializes pose histories to CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryExporter {
    schema: CsvSchema,
}

impl HistoryExporter {
    #[must_use]
    pub fn new(schema: CsvSchema) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn schema(&self) -> CsvSchema {
        self.schema
    }

    fn row(&self, pose: &Pose) -> Result<String> {
        let angles = format!(
            "{},{},{}",
            format_fixed2(pose.roll),
            format_fixed2(pose.pitch),
            format_fixed2(pose.yaw)
        );
        Ok(match self.schema {
            CsvSchema::Detailed => format!("{},{},{}", pose.timestamp_ms, iso_timestamp(pose.timestamp_ms)?, angles),
            CsvSchema::Simple => format!("{},{}", pose.timestamp_ms, angles),
        })
    }

    /// Render the history as CSV text, one row per sample in recording order
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyHistory`] when there is nothing to export, or
    /// [`Error::InvalidInput`] when a detailed row has an unrepresentable timestamp
    pub fn export(&self, history: &[Pose]) -> Result<String> {
        if history.is_empty() {
            return Err(Error::EmptyHistory);
        }

        let mut out = String::with_capacity(32 + history.len() * 48);
        out.push_str(self.schema.header());
        out.push('\n');
        for pose in history {
            out.push_str(&self.row(pose)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the CSV into `dir` under a timestamped, unique file name
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The history is empty (no file is created)
    /// - The directory cannot be created or the file cannot be written
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P, history: &[Pose], now: DateTime<Utc>) -> Result<PathBuf> {
        let content = self.export(history)?;
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let stem = format!("{}_{}", EXPORT_FILE_PREFIX, now.format("%Y%m%d_%H%M%S_%3f"));
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{stem}.csv")
            } else {
                format!("{stem}-{attempt}.csv")
            };
            let path = dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    log::info!("Exported {} poses to {}", history.len(), path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
