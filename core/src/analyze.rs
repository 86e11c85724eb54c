use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzeError, HeartRateError, ThresholdError};
use crate::heart_rate::{
    calculate_average_heart_rate, calculate_max_heart_rate, AvgHeartRateConfig, MaxHeartRateConfig,
};
use crate::metrics::{self, Metrics};
use crate::profile::AnalysisProfile;
use crate::thresholds::{analyze_heart_rate_thresholds, ThresholdAnalysis, ThresholdConfig};
use crate::types::ActivityTimeseries;

/// Average and peak with "could not compute" folded into `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    pub average: Option<f64>,
    pub peak: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub heart_rate: HeartRateSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdAnalysis>,
}

fn known<T>(result: Result<T, HeartRateError>, what: &str, metrics: &Metrics) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("{what} heart rate unavailable: {e}");
            metrics.record_unavailable(e.reason());
            None
        }
    }
}

pub fn summarize_heart_rate(
    timeseries: &ActivityTimeseries,
    profile: &AnalysisProfile,
    metrics: &Metrics,
) -> HeartRateSummary {
    metrics.record_analysis("average");
    let average = known(
        calculate_average_heart_rate(timeseries, &profile.average),
        "average",
        metrics,
    );
    metrics.record_analysis("peak");
    let peak = known(calculate_max_heart_rate(timeseries, &profile.peak), "peak", metrics);
    HeartRateSummary { average, peak }
}

fn thresholds_with(
    timeseries: &ActivityTimeseries,
    config: &ThresholdConfig,
    metrics: &Metrics,
) -> Result<ThresholdAnalysis, ThresholdError> {
    metrics.record_analysis("thresholds");
    let analysis = analyze_heart_rate_thresholds(timeseries, config)?;
    metrics.record_periods(&analysis);
    Ok(analysis)
}

/// Full report for one activity. Estimator failures become unknown values;
/// threshold misuse is returned as an error.
pub fn analyze_activity(
    timeseries: &ActivityTimeseries,
    profile: &AnalysisProfile,
    metrics: &Metrics,
) -> Result<ActivityReport, ThresholdError> {
    let heart_rate = summarize_heart_rate(timeseries, profile, metrics);
    let thresholds = profile
        .thresholds
        .as_ref()
        .map(|config| thresholds_with(timeseries, config, metrics))
        .transpose()?;

    Ok(ActivityReport { heart_rate, thresholds })
}

// ── JSON entry points ────────────────────────────────────────────────────────

fn parse<T: DeserializeOwned>(what: &'static str, json: &str) -> Result<T, AnalyzeError> {
    let mut de = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut de).map_err(|e| AnalyzeError::parse(what, e))
}

fn parse_or_default<T: DeserializeOwned + Default>(
    what: &'static str,
    json: Option<&str>,
) -> Result<T, AnalyzeError> {
    match json.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(s) => parse(what, s),
    }
}

/// JSON `null` is accepted and reported as a missing timeseries.
fn parse_timeseries(json: &str) -> Result<ActivityTimeseries, AnalyzeError> {
    parse::<Option<ActivityTimeseries>>("timeseries", json)?
        .ok_or(AnalyzeError::Threshold(ThresholdError::MissingTimeseries))
}

pub fn analyze_activity_json_with(
    timeseries_json: &str,
    profile_json: Option<&str>,
    metrics: &Metrics,
) -> Result<String, AnalyzeError> {
    let ts = parse_timeseries(timeseries_json)?;
    let profile: AnalysisProfile = parse_or_default("profile", profile_json)?;
    let report = analyze_activity(&ts, &profile, metrics)?;
    Ok(serde_json::to_string(&report)?)
}

pub fn analyze_activity_json(
    timeseries_json: &str,
    profile_json: Option<&str>,
) -> Result<String, AnalyzeError> {
    analyze_activity_json_with(timeseries_json, profile_json, metrics::global()?)
}

/// Average only; unlike the report, estimator errors are returned as-is.
pub fn average_heart_rate_json(
    timeseries_json: &str,
    config_json: Option<&str>,
) -> Result<f64, AnalyzeError> {
    let metrics = metrics::global()?;
    let ts = parse_timeseries(timeseries_json)?;
    let config: AvgHeartRateConfig = parse_or_default("average config", config_json)?;
    metrics.record_analysis("average");
    Ok(calculate_average_heart_rate(&ts, &config)?)
}

pub fn max_heart_rate_json(
    timeseries_json: &str,
    config_json: Option<&str>,
) -> Result<u8, AnalyzeError> {
    let metrics = metrics::global()?;
    let ts = parse_timeseries(timeseries_json)?;
    let config: MaxHeartRateConfig = parse_or_default("peak config", config_json)?;
    metrics.record_analysis("peak");
    Ok(calculate_max_heart_rate(&ts, &config)?)
}

pub fn analyze_thresholds_json(timeseries_json: &str, config_json: &str) -> Result<String, AnalyzeError> {
    let metrics = metrics::global()?;
    let ts = parse_timeseries(timeseries_json)?;
    let config: ThresholdConfig = parse("threshold config", config_json)?;
    let analysis = thresholds_with(&ts, &config, metrics)?;
    Ok(serde_json::to_string(&analysis)?)
}
