//! Heart-rate analysis for activity timeseries: average and peak estimators,
//! plus LT1/LT2 threshold period detection with smoothness scoring.

pub mod analyze;
pub mod error;
pub mod heart_rate;
pub mod metrics;
pub mod profile;
pub mod report;
pub mod thresholds;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use analyze::{
    analyze_activity, analyze_activity_json, analyze_activity_json_with, summarize_heart_rate,
    ActivityReport, HeartRateSummary,
};
pub use error::{AnalyzeError, HeartRateError, ProfileError, ThresholdError};
pub use heart_rate::{
    calculate_average_heart_rate, calculate_max_heart_rate, AvgHeartRateConfig, AvgHeartRateMethod,
    MaxHeartRateConfig, MaxHeartRateMethod, ValidityFilter,
};
pub use metrics::Metrics;
pub use profile::{load_profile, save_profile, AnalysisProfile};
pub use thresholds::{
    analyze_heart_rate_thresholds, ThresholdAnalysis, ThresholdConfig, ThresholdPeriod,
    ThresholdZone, ZoneSummary,
};
pub use types::{ActivityTimeseries, TimeseriesEntry};
