// File: src/onsets.rs
use crate::error::TactusError;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Reads onset times from a file. See [`parse_onsets`] for the accepted formats.
pub fn load_onsets(path: &Path) -> Result<Vec<f64>, TactusError> {
    let raw = fs::read_to_string(path)?;
    parse_onsets(&raw)
}

/// Parses onset times from either a JSON array of numbers or plain text with
/// numbers separated by whitespace or commas. In plain text, `#` starts a
/// comment that runs to the end of the line.
///
/// Decreasing values are accepted but logged.
pub fn parse_onsets(raw: &str) -> Result<Vec<f64>, TactusError> {
    let onsets = if raw.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<f64>>(raw)?
    } else {
        parse_plain(raw)?
    };

    if let Some(idx) = onsets.windows(2).position(|w| w[1] < w[0]) {
        warn!(index = idx + 1, "Onset times are not in increasing order");
    }
    Ok(onsets)
}

fn parse_plain(raw: &str) -> Result<Vec<f64>, TactusError> {
    let mut onsets = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("");
        for token in content.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let invalid = || TactusError::InvalidOnset { line: line_no + 1, value: token.to_string() };
            let value: f64 = token.parse().map_err(|_| invalid())?;
            if !value.is_finite() {
                return Err(invalid());
            }
            onsets.push(value);
        }
    }
    Ok(onsets)
}
