// File: src/error.rs

/// Errors from the surfaces around the tracking engine: configuration,
/// onset decoding and report persistence. The engine itself only forwards
/// its strategy's errors.
#[derive(Debug, thiserror::Error)]
pub enum TactusError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid onset {value:?} on line {line}")]
    InvalidOnset { line: usize, value: String },

    #[error("Unknown report format for {0}: expected a .json or .bin extension")]
    UnknownReportFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}
