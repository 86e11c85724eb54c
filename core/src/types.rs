use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One row of an activity timeseries. Every reading is independently optional;
/// `None` means "not recorded", which is not the same as a zero reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesEntry {
    #[serde(alias = "t")]
    pub offset: u32,             // sekunder fra start
    #[serde(default, alias = "hr", alias = "heartRate")]
    pub heart_rate: Option<u8>,  // bpm
    #[serde(default)]
    pub cadence: Option<u8>,     // rpm / spm
    #[serde(default)]
    pub distance: Option<u32>,   // meter
    #[serde(default, alias = "alt")]
    pub altitude: Option<u16>,   // meter
    #[serde(default)]
    pub velocity: Option<u16>,   // m/s
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
}

impl TimeseriesEntry {
    /// Entry carrying only a heart-rate reading.
    pub fn with_heart_rate(offset: u32, heart_rate: Option<u8>) -> Self {
        Self {
            offset,
            heart_rate,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.cadence.is_none()
            && self.distance.is_none()
            && self.altitude.is_none()
            && self.velocity.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    pub fn has_gps(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Offset-indexed samples of one activity. Entries are ordered by
/// non-decreasing offset; gaps between offsets are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTimeseries {
    #[serde(alias = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(default, alias = "samples")]
    pub data: Vec<TimeseriesEntry>,
}

impl ActivityTimeseries {
    pub fn new(start_time: DateTime<Utc>, data: Vec<TimeseriesEntry>) -> Self {
        Self { start_time, data }
    }

    /// Largest offset in the series, 0 when empty.
    pub fn max_offset(&self) -> u32 {
        self.data.iter().map(|e| e.offset).max().unwrap_or(0)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::seconds(i64::from(self.max_offset()))
    }

    pub fn elapsed_time(&self) -> Duration {
        self.end_time() - self.start_time
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
