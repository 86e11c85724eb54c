use serde::{Deserialize, Serialize};

use crate::error::HeartRateError;
use crate::types::{ActivityTimeseries, TimeseriesEntry};

/// Fallback when no max heart rate is configured for zone weighting.
pub const DEFAULT_MAX_HEART_RATE: u8 = 220;
pub const DEFAULT_WINDOW_SECONDS: u32 = 30;
pub const DEFAULT_PERCENTILE: f64 = 95.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvgHeartRateMethod {
    Simple,
    #[default]
    TimeWeighted,
    ZoneWeighted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxHeartRateMethod {
    #[default]
    Peak,
    RollingWindow,
    Percentile,
}

/// Sample acceptance rules shared by every average and peak method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityFilter {
    pub exclude_zeros: bool,
    pub min_valid_rate: Option<u8>,
    pub max_valid_rate: Option<u8>,
}

impl ValidityFilter {
    pub fn accepts(&self, hr: u8) -> bool {
        if self.exclude_zeros && hr == 0 {
            return false;
        }
        if matches!(self.min_valid_rate, Some(min) if hr < min) {
            return false;
        }
        if matches!(self.max_valid_rate, Some(max) if hr > max) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvgHeartRateConfig {
    pub method: AvgHeartRateMethod,
    #[serde(flatten)]
    pub filter: ValidityFilter,
    /// Reference for zone weighting; unset or 0 falls back to 220.
    pub max_heart_rate: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxHeartRateConfig {
    pub method: MaxHeartRateMethod,
    #[serde(flatten)]
    pub filter: ValidityFilter,
    /// Rolling window length; unset falls back to 30 s.
    pub window_seconds: Option<u32>,
    /// 0–100; anything outside (0, 100] falls back to 95.
    pub percentile: f64,
}

/// Heart rate of an entry if it is present and passes the filter.
#[inline]
fn accepted_hr(entry: &TimeseriesEntry, filter: &ValidityFilter) -> Option<u8> {
    entry.heart_rate.filter(|hr| filter.accepts(*hr))
}

pub fn calculate_average_heart_rate(
    timeseries: &ActivityTimeseries,
    config: &AvgHeartRateConfig,
) -> Result<f64, HeartRateError> {
    if timeseries.data.is_empty() {
        return Err(HeartRateError::EmptyTimeseries);
    }
    log::debug!(
        "average heart rate: method={:?}, samples={}",
        config.method,
        timeseries.data.len()
    );

    match config.method {
        AvgHeartRateMethod::Simple => simple_average(&timeseries.data, &config.filter),
        AvgHeartRateMethod::TimeWeighted => time_weighted_average(&timeseries.data, &config.filter),
        AvgHeartRateMethod::ZoneWeighted => zone_weighted_average(
            &timeseries.data,
            &config.filter,
            config.max_heart_rate.unwrap_or(DEFAULT_MAX_HEART_RATE),
        ),
    }
}

pub fn calculate_max_heart_rate(
    timeseries: &ActivityTimeseries,
    config: &MaxHeartRateConfig,
) -> Result<u8, HeartRateError> {
    if timeseries.data.is_empty() {
        return Err(HeartRateError::EmptyTimeseries);
    }
    log::debug!(
        "max heart rate: method={:?}, samples={}",
        config.method,
        timeseries.data.len()
    );

    match config.method {
        MaxHeartRateMethod::Peak => peak(&timeseries.data, &config.filter),
        MaxHeartRateMethod::RollingWindow => rolling_window_max(
            &timeseries.data,
            &config.filter,
            config.window_seconds.unwrap_or(DEFAULT_WINDOW_SECONDS),
        ),
        MaxHeartRateMethod::Percentile => {
            percentile_max(&timeseries.data, &config.filter, config.percentile)
        }
    }
}

fn simple_average(data: &[TimeseriesEntry], filter: &ValidityFilter) -> Result<f64, HeartRateError> {
    let mut sum = 0u64;
    let mut cnt = 0u64;
    for hr in data.iter().filter_map(|e| accepted_hr(e, filter)) {
        sum += u64::from(hr);
        cnt += 1;
    }
    if cnt == 0 {
        return Err(HeartRateError::NoValidData);
    }
    Ok(sum as f64 / cnt as f64)
}

/// Weighted intervals `(hr(i), offset(i+1) - offset(i))` for every entry with
/// an accepted reading and a strictly later successor. The last entry never
/// yields an interval.
fn weighted_intervals<'a>(
    data: &'a [TimeseriesEntry],
    filter: &'a ValidityFilter,
) -> impl Iterator<Item = (u8, u32)> + 'a {
    data.windows(2).filter_map(move |pair| {
        let hr = accepted_hr(&pair[0], filter)?;
        let dt = pair[1].offset.checked_sub(pair[0].offset)?;
        (dt > 0).then_some((hr, dt))
    })
}

fn time_weighted_average(
    data: &[TimeseriesEntry],
    filter: &ValidityFilter,
) -> Result<f64, HeartRateError> {
    if data.len() < 2 {
        return simple_average(data, filter);
    }

    let mut weighted_sum = 0.0f64;
    let mut total_duration = 0u64;
    for (hr, dt) in weighted_intervals(data, filter) {
        weighted_sum += f64::from(hr) * f64::from(dt);
        total_duration += u64::from(dt);
    }

    if total_duration == 0 {
        return Err(HeartRateError::NoValidData);
    }
    Ok(weighted_sum / total_duration as f64)
}

fn zone_weighted_average(
    data: &[TimeseriesEntry],
    filter: &ValidityFilter,
    max_heart_rate: u8,
) -> Result<f64, HeartRateError> {
    if data.len() < 2 {
        return simple_average(data, filter);
    }

    let mut weighted_sum = 0.0f64;
    let mut total_weighted_duration = 0.0f64;
    for (hr, dt) in weighted_intervals(data, filter) {
        let w = zone_weight(hr, max_heart_rate);
        weighted_sum += f64::from(hr) * f64::from(dt) * w;
        total_weighted_duration += f64::from(dt) * w;
    }

    if total_weighted_duration == 0.0 {
        return Err(HeartRateError::NoValidData);
    }
    Ok(weighted_sum / total_weighted_duration)
}

/// Step weight by share of max heart rate: ≤60 % → 1 … >90 % → 5.
pub fn zone_weight(hr: u8, max_heart_rate: u8) -> f64 {
    let max_hr = if max_heart_rate == 0 { DEFAULT_MAX_HEART_RATE } else { max_heart_rate };
    let pct = f64::from(hr) / f64::from(max_hr);

    match pct {
        p if p <= 0.6 => 1.0,
        p if p <= 0.7 => 2.0,
        p if p <= 0.8 => 3.0,
        p if p <= 0.9 => 4.0,
        _ => 5.0,
    }
}

fn peak(data: &[TimeseriesEntry], filter: &ValidityFilter) -> Result<u8, HeartRateError> {
    data.iter()
        .filter_map(|e| accepted_hr(e, filter))
        .max()
        .ok_or(HeartRateError::NoValidData)
}

/// Highest per-window maximum, each window spanning `[offset(i), offset(i) + window)`.
fn rolling_window_max(
    data: &[TimeseriesEntry],
    filter: &ValidityFilter,
    window_seconds: u32,
) -> Result<u8, HeartRateError> {
    if data.len() < 2 {
        return peak(data, filter);
    }

    let mut overall: Option<u8> = None;
    for (i, start) in data.iter().enumerate() {
        let window_end = u64::from(start.offset) + u64::from(window_seconds);
        let window_max = data[i..]
            .iter()
            .take_while(|e| u64::from(e.offset) < window_end)
            .filter_map(|e| accepted_hr(e, filter))
            .max();

        overall = overall.max(window_max);
    }

    overall.ok_or(HeartRateError::NoValidData)
}

fn percentile_max(
    data: &[TimeseriesEntry],
    filter: &ValidityFilter,
    percentile: f64,
) -> Result<u8, HeartRateError> {
    let mut rates: Vec<u8> = data.iter().filter_map(|e| accepted_hr(e, filter)).collect();
    if rates.is_empty() {
        return Err(HeartRateError::NoValidData);
    }

    let pct = if percentile <= 0.0 || percentile > 100.0 || percentile.is_nan() {
        DEFAULT_PERCENTILE
    } else {
        percentile
    };

    rates.sort_unstable();

    let rank = (rates.len() - 1) as f64 * (pct / 100.0);
    let lower = rank.floor() as usize;
    let upper = lower + 1;
    if upper >= rates.len() {
        return Ok(rates[rates.len() - 1]);
    }

    let weight = rank - lower as f64;
    let value = f64::from(rates[lower]) * (1.0 - weight) + f64::from(rates[upper]) * weight;
    Ok((value + 0.5).floor() as u8)
}
