use thiserror::Error;

/// Failures of the average/peak estimators.
///
/// Both variants mean "the metric cannot be computed from this input".
/// Callers building a larger summary should record the value as unknown
/// instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeartRateError {
    #[error("activity timeseries data is empty")]
    EmptyTimeseries,
    #[error("no valid heart rate data points found")]
    NoValidData,
}

impl HeartRateError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyTimeseries | Self::NoValidData)
    }

    /// Label used for the unavailable-metric counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyTimeseries => "empty_timeseries",
            Self::NoValidData => "no_valid_data",
        }
    }
}

/// Misuse of the threshold detector. None of these are retried or defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("timeseries cannot be nil")]
    MissingTimeseries,
    #[error("timeseries data is empty")]
    EmptyTimeseries,
    #[error("LT1 and LT2 must be specified")]
    MissingThresholds,
    #[error("LT2 must be greater than LT1 (LT1={lt1}, LT2={lt2})")]
    InvertedThresholds { lt1: u8, lt2: u8 },
}

/// Reading or writing an analysis profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to access profile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile parse error at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by the JSON facade and the Python bindings.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("parse error ({what}) at {path}: {message}")]
    Parse {
        what: &'static str,
        path: String,
        message: String,
    },
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error(transparent)]
    HeartRate(#[from] HeartRateError),
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AnalyzeError {
    pub(crate) fn parse(what: &'static str, err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self::Parse {
            what,
            path: err.path().to_string(),
            message: err.into_inner().to_string(),
        }
    }
}
