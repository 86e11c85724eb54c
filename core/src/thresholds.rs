//! LT1/LT2 threshold period detection.
//!
//! The series is cut into fixed-width buckets, each bucket is classified
//! against the two threshold bands, and runs of classified buckets are
//! stitched into periods. Short None gaps inside a run are tolerated; a gap of
//! `min_consecutive_buckets` Nones closes it.

use chrono::{DateTime, Duration, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::ThresholdError;
use crate::types::ActivityTimeseries;

pub const DEFAULT_BUCKET_SIZE_SECONDS: u32 = 10;
pub const DEFAULT_MIN_VALID_POINTS_PER_BUCKET: usize = 5;
pub const DEFAULT_THRESHOLD_TOLERANCE: f64 = 0.05;
pub const DEFAULT_LT1_OVERLAP_TOLERANCE: f64 = 0.05;
pub const DEFAULT_MIN_CONSECUTIVE_BUCKETS: usize = 5;
pub const DEFAULT_CONSECUTIVE_PERIOD_THRESHOLD: f64 = 0.90;

/// Threshold analysis settings. Zero means "unset" for every tunable and is
/// replaced by [`ThresholdConfig::with_defaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Aerobic threshold (bpm)
    pub lt1: Option<u8>,
    /// Lactate threshold (bpm)
    pub lt2: Option<u8>,

    pub bucket_size_seconds: u32,
    pub min_valid_points_per_bucket: usize,
    /// ± band around each threshold, 0.05 = ±5 %
    pub threshold_tolerance_percent: f64,
    /// Inside both bands, readings up to LT1 · (1 + this) stay LT1
    pub lt1_overlap_tolerance_percent: f64,
    pub min_consecutive_buckets: usize,
    /// Share of a run that must be one zone for it to become a period
    pub consecutive_period_threshold: f64,
}

impl ThresholdConfig {
    pub fn new(lt1: u8, lt2: u8) -> Self {
        Self {
            lt1: Some(lt1),
            lt2: Some(lt2),
            ..Default::default()
        }
    }

    pub fn with_defaults(&self) -> Self {
        let mut c = *self;
        if c.bucket_size_seconds == 0 {
            c.bucket_size_seconds = DEFAULT_BUCKET_SIZE_SECONDS;
        }
        if c.min_valid_points_per_bucket == 0 {
            c.min_valid_points_per_bucket = DEFAULT_MIN_VALID_POINTS_PER_BUCKET;
        }
        if c.threshold_tolerance_percent == 0.0 {
            c.threshold_tolerance_percent = DEFAULT_THRESHOLD_TOLERANCE;
        }
        if c.lt1_overlap_tolerance_percent == 0.0 {
            c.lt1_overlap_tolerance_percent = DEFAULT_LT1_OVERLAP_TOLERANCE;
        }
        if c.min_consecutive_buckets == 0 {
            c.min_consecutive_buckets = DEFAULT_MIN_CONSECUTIVE_BUCKETS;
        }
        if c.consecutive_period_threshold == 0.0 {
            c.consecutive_period_threshold = DEFAULT_CONSECUTIVE_PERIOD_THRESHOLD;
        }
        c
    }

    /// Both thresholds, with 0 treated as missing.
    fn thresholds(&self) -> Result<(u8, u8), ThresholdError> {
        match (self.lt1.filter(|v| *v > 0), self.lt2.filter(|v| *v > 0)) {
            (Some(lt1), Some(lt2)) if lt2 > lt1 => Ok((lt1, lt2)),
            (Some(lt1), Some(lt2)) => Err(ThresholdError::InvertedThresholds { lt1, lt2 }),
            _ => Err(ThresholdError::MissingThresholds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdZone {
    #[serde(rename = "LT1", alias = "lt1")]
    Lt1,
    #[serde(rename = "LT2", alias = "lt2")]
    Lt2,
}

impl ThresholdZone {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lt1 => "LT1",
            Self::Lt2 => "LT2",
        }
    }
}

/// A sustained stretch at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPeriod {
    pub zone: ThresholdZone,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: u32, // sek
    pub avg_hr: f64,
    pub min_hr: f64,
    pub max_hr: f64,
}

/// Per-zone totals and quality metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub time_seconds: u32,
    pub periods: usize,
    pub average_period_duration: u32,
    pub longest_period_duration: u32,
    /// 0–1, 1 = a single period covering all time in the zone
    pub smoothness_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAnalysis {
    pub lt1: ZoneSummary,
    pub lt2: ZoneSummary,
    /// Chronological
    pub periods: Vec<ThresholdPeriod>,
}

impl ThresholdAnalysis {
    pub fn zone(&self, zone: ThresholdZone) -> &ZoneSummary {
        match zone {
            ThresholdZone::Lt1 => &self.lt1,
            ThresholdZone::Lt2 => &self.lt2,
        }
    }

    fn zone_mut(&mut self, zone: ThresholdZone) -> &mut ZoneSummary {
        match zone {
            ThresholdZone::Lt1 => &mut self.lt1,
            ThresholdZone::Lt2 => &mut self.lt2,
        }
    }

    pub fn time_at(&self, zone: ThresholdZone) -> u32 {
        self.zone(zone).time_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bucket {
    index: usize,
    avg_hr: f64,
    valid: bool,
    zone: Option<ThresholdZone>,
}

pub fn analyze_heart_rate_thresholds(
    timeseries: &ActivityTimeseries,
    config: &ThresholdConfig,
) -> Result<ThresholdAnalysis, ThresholdError> {
    if timeseries.data.is_empty() {
        return Err(ThresholdError::EmptyTimeseries);
    }
    let (lt1, lt2) = config.thresholds()?;
    let config = config.with_defaults();

    let mut buckets = create_buckets(timeseries, &config);
    classify_buckets(&mut buckets, lt1, lt2, &config);

    let mut analysis = ThresholdAnalysis::default();
    for run in find_runs(&buckets, config.min_consecutive_buckets) {
        analyze_run(&buckets[run], &config, timeseries.start_time, &mut analysis);
    }
    summarize(&mut analysis);

    log::debug!(
        "threshold analysis: buckets={}, lt1={}s/{} periods, lt2={}s/{} periods",
        buckets.len(),
        analysis.lt1.time_seconds,
        analysis.lt1.periods,
        analysis.lt2.time_seconds,
        analysis.lt2.periods
    );
    Ok(analysis)
}

fn create_buckets(timeseries: &ActivityTimeseries, config: &ThresholdConfig) -> Vec<Bucket> {
    let size = config.bucket_size_seconds;
    let n = (timeseries.max_offset() / size) as usize + 1;

    let mut sums = vec![0.0f64; n];
    let mut counts = vec![0usize; n];
    for entry in &timeseries.data {
        let Some(hr) = entry.heart_rate else { continue };
        let idx = (entry.offset / size) as usize;
        if idx < n {
            sums[idx] += f64::from(hr);
            counts[idx] += 1;
        }
    }

    (0..n)
        .map(|index| {
            let valid = counts[index] >= config.min_valid_points_per_bucket;
            Bucket {
                index,
                avg_hr: if counts[index] > 0 { sums[index] / counts[index] as f64 } else { 0.0 },
                valid,
                zone: None,
            }
        })
        .collect()
}

fn classify_buckets(buckets: &mut [Bucket], lt1: u8, lt2: u8, config: &ThresholdConfig) {
    let tol = config.threshold_tolerance_percent;
    let (lt1, lt2) = (f64::from(lt1), f64::from(lt2));
    let lt1_band = lt1 * (1.0 - tol)..=lt1 * (1.0 + tol);
    let lt2_band = lt2 * (1.0 - tol)..=lt2 * (1.0 + tol);
    let lt1_overlap_upper = lt1 * (1.0 + config.lt1_overlap_tolerance_percent);

    for b in buckets.iter_mut() {
        if !b.valid {
            b.zone = None;
            continue;
        }
        b.zone = match (lt1_band.contains(&b.avg_hr), lt2_band.contains(&b.avg_hr)) {
            // overlapping bands favour the aerobic zone
            (true, true) if b.avg_hr <= lt1_overlap_upper => Some(ThresholdZone::Lt1),
            (true, true) => Some(ThresholdZone::Lt2),
            (true, false) => Some(ThresholdZone::Lt1),
            (false, true) => Some(ThresholdZone::Lt2),
            (false, false) => None,
        };
    }
}

/// Candidate runs as index ranges. A run starts at a classified bucket,
/// carries on through short None gaps and ends at the last classified bucket
/// before `min_gap` consecutive Nones (or the end of the series). Runs shorter
/// than `min_gap` buckets are dropped.
fn find_runs(buckets: &[Bucket], min_gap: usize) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut i = 0;

    while i < buckets.len() {
        while i < buckets.len() && buckets[i].zone.is_none() {
            i += 1;
        }
        if i >= buckets.len() {
            break;
        }

        let start = i;
        let mut last_classified = i;
        let mut consecutive_none = 0;
        while i < buckets.len() {
            if buckets[i].zone.is_none() {
                consecutive_none += 1;
                if consecutive_none >= min_gap {
                    break;
                }
            } else {
                consecutive_none = 0;
                last_classified = i;
            }
            i += 1;
        }

        let end = last_classified + 1;
        if end - start >= min_gap {
            runs.push(start..end);
        } else {
            log::debug!("dropping short run: buckets {start}..{end}");
        }

        if consecutive_none >= min_gap {
            i = end + min_gap;
        }
    }

    runs
}

fn zone_share(run: &[Bucket], zone: ThresholdZone) -> f64 {
    let n = run.iter().filter(|b| b.zone == Some(zone)).count();
    n as f64 / run.len() as f64
}

fn analyze_run(
    run: &[Bucket],
    config: &ThresholdConfig,
    start_time: DateTime<Utc>,
    analysis: &mut ThresholdAnalysis,
) {
    if run.iter().all(|b| b.zone.is_none()) {
        return;
    }

    for zone in [ThresholdZone::Lt1, ThresholdZone::Lt2] {
        if zone_share(run, zone) >= config.consecutive_period_threshold {
            add_period(run, zone, config, start_time, analysis);
            return;
        }
    }

    analyze_sub_runs(run, config, start_time, analysis);
}

/// Mixed run: split into maximal same-zone-or-None stretches and keep the
/// ones that are long and pure enough on their own.
fn analyze_sub_runs(
    run: &[Bucket],
    config: &ThresholdConfig,
    start_time: DateTime<Utc>,
    analysis: &mut ThresholdAnalysis,
) {
    let mut i = 0;
    while i < run.len() {
        let Some(zone) = run[i].zone else {
            i += 1;
            continue;
        };

        let start = i;
        while i < run.len() && run[i].zone.map_or(true, |z| z == zone) {
            i += 1;
        }

        let sub = &run[start..i];
        if sub.len() >= config.min_consecutive_buckets
            && zone_share(sub, zone) >= config.consecutive_period_threshold
        {
            add_period(sub, zone, config, start_time, analysis);
        }
    }
}

fn add_period(
    run: &[Bucket],
    zone: ThresholdZone,
    config: &ThresholdConfig,
    start_time: DateTime<Utc>,
    analysis: &mut ThresholdAnalysis,
) {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return;
    };

    let rates: Vec<f64> = run
        .iter()
        .filter(|b| b.valid && b.avg_hr > 0.0)
        .map(|b| b.avg_hr)
        .collect();
    let (Some(min_hr), Some(max_hr)) = (
        rates.iter().copied().map(OrderedFloat).min(),
        rates.iter().copied().map(OrderedFloat).max(),
    ) else {
        return;
    };
    let avg_hr = rates.iter().sum::<f64>() / rates.len() as f64;

    let size = i64::from(config.bucket_size_seconds);
    let duration = run.len() as u32 * config.bucket_size_seconds;
    let period = ThresholdPeriod {
        zone,
        start_time: start_time + Duration::seconds(first.index as i64 * size),
        end_time: start_time + Duration::seconds((last.index as i64 + 1) * size),
        duration,
        avg_hr,
        min_hr: min_hr.into_inner(),
        max_hr: max_hr.into_inner(),
    };
    log::debug!(
        "{} period: buckets {}..={}, {}s, avg {:.1} bpm",
        zone.label(),
        first.index,
        last.index,
        duration,
        avg_hr
    );

    let summary = analysis.zone_mut(zone);
    summary.time_seconds += duration;
    summary.periods += 1;
    analysis.periods.push(period);
}

fn summarize(analysis: &mut ThresholdAnalysis) {
    for zone in [ThresholdZone::Lt1, ThresholdZone::Lt2] {
        let durations: Vec<u32> = analysis
            .periods
            .iter()
            .filter(|p| p.zone == zone)
            .map(|p| p.duration)
            .collect();
        let summary = analysis.zone_mut(zone);
        if durations.is_empty() {
            continue;
        }

        let longest = durations.iter().copied().max().unwrap_or(0);
        summary.average_period_duration = durations.iter().sum::<u32>() / durations.len() as u32;
        summary.longest_period_duration = longest;
        summary.smoothness_score = smoothness_score(longest, summary.time_seconds, durations.len());
    }
}

/// Longest share of zone time, penalised by fragmentation:
/// `(longest / total) * (0.5 + 0.5 / count)`.
pub fn smoothness_score(longest: u32, total: u32, count: usize) -> f64 {
    if total == 0 || count == 0 {
        return 0.0;
    }
    let longest_ratio = f64::from(longest) / f64::from(total);
    longest_ratio * (0.5 + 0.5 / count as f64)
}
