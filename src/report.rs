// File: src/report.rs
use crate::config::TrackerConfig;
use crate::core::engine::TrackerMap;
use crate::core::types::{Hypothesis, TrackerName};
use crate::error::TactusError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// On-disk encoding of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Bincode,
}

impl ReportFormat {
    /// Picks the format from the file extension: `.json` or `.bin`.
    pub fn from_path(path: &Path) -> Result<Self, TactusError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ReportFormat::Json),
            Some("bin") => Ok(ReportFormat::Bincode),
            _ => Err(TactusError::UnknownReportFormat(path.display().to_string())),
        }
    }
}

/// Snapshot of one surviving tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerReport<C> {
    pub name: TrackerName,
    pub beta: Hypothesis,
    pub current: Hypothesis,
    pub confidence: Option<f64>,
    pub corrections: Vec<(usize, C)>,
    pub confidences: Vec<(usize, f64)>,
}

/// The outcome of a run. Trackers are ordered by descending confidence, then by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport<C> {
    pub config: TrackerConfig,
    pub onset_count: usize,
    pub trackers: Vec<TrackerReport<C>>,
}

impl<C: Clone> RunReport<C> {
    pub fn from_run(config: &TrackerConfig, onset_count: usize, trackers: &TrackerMap<'_, C>) -> Self {
        let mut trackers: Vec<TrackerReport<C>> = trackers
            .values()
            .map(|t| TrackerReport {
                name: t.name(),
                beta: t.beta(),
                current: t.current(),
                confidence: t.try_confidence(),
                corrections: t.corrections().to_vec(),
                confidences: t.confidences().to_vec(),
            })
            .collect();
        trackers.sort_by(|a, b| {
            let (ca, cb) = (a.confidence.unwrap_or(f64::MIN), b.confidence.unwrap_or(f64::MIN));
            cb.total_cmp(&ca).then(a.name.cmp(&b.name))
        });
        Self { config: config.clone(), onset_count, trackers }
    }
}

/// Writes the report atomically: the data goes to a temporary file next to
/// `path` which then replaces it.
pub fn save_report<C: Serialize>(report: &RunReport<C>, path: &Path) -> Result<(), TactusError> {
    let format = ReportFormat::from_path(path)?;
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        match format {
            ReportFormat::Json => serde_json::to_writer_pretty(&mut writer, report)?,
            ReportFormat::Bincode => bincode::serialize_into(&mut writer, report)?,
        }
        writer.flush()?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn load_report<C: DeserializeOwned>(path: &Path) -> Result<RunReport<C>, TactusError> {
    let format = ReportFormat::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);
    let report = match format {
        ReportFormat::Json => serde_json::from_reader(reader)?,
        ReportFormat::Bincode => bincode::deserialize_from(reader)?,
    };
    Ok(report)
}
