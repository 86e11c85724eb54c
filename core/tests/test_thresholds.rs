// core/tests/test_thresholds.rs
use chrono::{DateTime, Duration, TimeZone, Utc};

use stride_core::{
    analyze_heart_rate_thresholds, ActivityTimeseries, ThresholdConfig, ThresholdError, ThresholdZone,
    TimeseriesEntry,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
}

/// 1 Hz series, one reading per second
fn series(rates: &[u8]) -> ActivityTimeseries {
    series_with_gaps(&rates.iter().map(|r| Some(*r)).collect::<Vec<_>>())
}

fn series_with_gaps(rates: &[Option<u8>]) -> ActivityTimeseries {
    let data = rates
        .iter()
        .enumerate()
        .map(|(i, hr)| TimeseriesEntry::with_heart_rate(i as u32, *hr))
        .collect();
    ActivityTimeseries::new(start(), data)
}

/// Concatenates `(seconds, bpm)` blocks.
fn blocks(parts: &[(usize, u8)]) -> Vec<u8> {
    parts
        .iter()
        .flat_map(|(secs, bpm)| std::iter::repeat(*bpm).take(*secs))
        .collect()
}

fn cfg() -> ThresholdConfig {
    ThresholdConfig::new(150, 170)
}

#[test]
fn invalid_inputs_are_rejected() {
    let empty = ActivityTimeseries::new(start(), vec![]);
    let err = analyze_heart_rate_thresholds(&empty, &cfg()).unwrap_err();
    assert_eq!(err, ThresholdError::EmptyTimeseries);
    assert!(err.to_string().contains("empty"));

    let one = series(&[150]);
    let missing_lt1 = ThresholdConfig {
        lt2: Some(170),
        ..Default::default()
    };
    let err = analyze_heart_rate_thresholds(&one, &missing_lt1).unwrap_err();
    assert_eq!(err, ThresholdError::MissingThresholds);
    assert!(err.to_string().contains("must be specified"));

    let zero_lt2 = ThresholdConfig {
        lt2: Some(0),
        ..ThresholdConfig::new(150, 170)
    };
    assert_eq!(
        analyze_heart_rate_thresholds(&one, &zero_lt2).unwrap_err(),
        ThresholdError::MissingThresholds
    );

    let err = analyze_heart_rate_thresholds(&one, &ThresholdConfig::new(170, 150)).unwrap_err();
    assert_eq!(err, ThresholdError::InvertedThresholds { lt1: 170, lt2: 150 });
    assert!(err.to_string().contains("must be greater"));

    let equal = analyze_heart_rate_thresholds(&one, &ThresholdConfig::new(160, 160));
    assert!(matches!(equal, Err(ThresholdError::InvertedThresholds { .. })));
}

#[test]
fn single_lt1_period() {
    let result = analyze_heart_rate_thresholds(&series(&[150; 60]), &cfg()).unwrap();

    assert_eq!(result.lt1.time_seconds, 60);
    assert_eq!(result.lt2.time_seconds, 0);
    assert_eq!(result.lt1.periods, 1);
    assert_eq!(result.lt2.periods, 0);

    assert_eq!(result.periods.len(), 1);
    let p = &result.periods[0];
    assert_eq!(p.zone, ThresholdZone::Lt1);
    assert_eq!(p.duration, 60);
    assert!((p.avg_hr - 150.0).abs() < 0.1);
    assert_eq!(p.start_time, start());
    assert_eq!(p.end_time, start() + Duration::seconds(60));

    assert_eq!(result.lt1.average_period_duration, 60);
    assert_eq!(result.lt1.longest_period_duration, 60);
    assert!((result.lt1.smoothness_score - 1.0).abs() < 0.01);
}

#[test]
fn single_lt2_period() {
    let result = analyze_heart_rate_thresholds(&series(&[170; 100]), &cfg()).unwrap();

    assert_eq!(result.lt1.time_seconds, 0);
    assert_eq!(result.lt2.time_seconds, 100);
    assert_eq!(result.lt1.periods, 0);
    assert_eq!(result.lt2.periods, 1);
    assert_eq!(result.lt2.average_period_duration, 100);
    assert_eq!(result.lt2.longest_period_duration, 100);
    assert!((result.lt2.smoothness_score - 1.0).abs() < 0.01);
}

#[test]
fn tolerance_band_edges() {
    // LT1 band at ±5 %: 142.5–157.5
    let at = |bpm: u8| {
        analyze_heart_rate_thresholds(&series(&[bpm; 60]), &cfg())
            .unwrap()
            .lt1
            .time_seconds
    };
    assert_eq!(at(142), 0, "142 bpm is below the LT1 band");
    assert_eq!(at(143), 60, "143 bpm is inside the LT1 band");
    assert_eq!(at(157), 60, "157 bpm is inside the LT1 band");
    assert_eq!(at(158), 0, "158 bpm is above the LT1 band");
}

#[test]
fn overlapping_bands_favour_lt1_up_to_the_overlap_boundary() {
    // LT1 142.5–157.5, LT2 152–168, LT1 + 5 % = 157.5
    let config = ThresholdConfig {
        threshold_tolerance_percent: 0.05,
        lt1_overlap_tolerance_percent: 0.05,
        ..ThresholdConfig::new(150, 160)
    };

    let r = analyze_heart_rate_thresholds(&series(&[155; 60]), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 60);
    assert_eq!(r.lt2.time_seconds, 0);

    let r = analyze_heart_rate_thresholds(&series(&[157; 60]), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 60);

    let r = analyze_heart_rate_thresholds(&series(&[158; 60]), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 0);
    assert_eq!(r.lt2.time_seconds, 60);
}

#[test]
fn runs_shorter_than_minimum_do_not_count() {
    let config = ThresholdConfig {
        min_consecutive_buckets: 5,
        ..cfg()
    };

    let short = blocks(&[(40, 150), (60, 120)]);
    let r = analyze_heart_rate_thresholds(&series(&short), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 0, "40 s is too short");
    assert!(r.periods.is_empty());

    let exact = blocks(&[(50, 150), (50, 120)]);
    let r = analyze_heart_rate_thresholds(&series(&exact), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 50, "50 s is long enough");
}

#[test]
fn gap_inside_a_run_is_stitched_but_edges_are_not() {
    let config = ThresholdConfig {
        min_consecutive_buckets: 4,
        consecutive_period_threshold: 0.90,
        ..cfg()
    };

    let middle = blocks(&[(50, 150), (10, 120), (40, 150)]);
    let r = analyze_heart_rate_thresholds(&series(&middle), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 100, "gap in the middle counts");
    assert_eq!(r.lt1.periods, 1);
    assert_eq!(r.periods[0].start_time, start());
    assert_eq!(r.periods[0].end_time, start() + Duration::seconds(100));

    let trailing = blocks(&[(90, 150), (10, 120)]);
    let r = analyze_heart_rate_thresholds(&series(&trailing), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 90, "gap at the end does not count");

    let leading = blocks(&[(10, 120), (90, 150)]);
    let r = analyze_heart_rate_thresholds(&series(&leading), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 90, "gap at the start does not count");
    assert_eq!(r.periods[0].start_time, start() + Duration::seconds(10));
}

#[test]
fn long_run_with_short_gap_becomes_one_period() {
    // 90 buckets at LT1 with a 10-bucket dip in the middle; the dip is
    // bridged because it is shorter than min_consecutive_buckets.
    let config = ThresholdConfig {
        min_consecutive_buckets: 11,
        ..cfg()
    };
    let hr = blocks(&[(450, 150), (100, 120), (450, 150)]);
    let r = analyze_heart_rate_thresholds(&series(&hr), &config).unwrap();
    assert_eq!(r.lt1.periods, 1);
    assert_eq!(r.lt1.time_seconds, 1000);
    assert_eq!(r.periods[0].end_time, start() + Duration::seconds(1000));
    assert!((r.lt1.smoothness_score - 1.0).abs() < 1e-9);
}

#[test]
fn separate_periods_are_counted_individually() {
    let config = ThresholdConfig {
        min_consecutive_buckets: 2,
        ..cfg()
    };
    let hr = blocks(&[(60, 150), (30, 120), (80, 150), (30, 120), (50, 170)]);
    let r = analyze_heart_rate_thresholds(&series(&hr), &config).unwrap();

    assert_eq!(r.lt1.time_seconds, 140);
    assert_eq!(r.lt2.time_seconds, 50);
    assert_eq!(r.lt1.periods, 2);
    assert_eq!(r.lt2.periods, 1);
    assert_eq!(r.periods.len(), 3);

    assert_eq!(r.lt1.average_period_duration, 70);
    assert_eq!(r.lt1.longest_period_duration, 80);
    assert!(r.lt1.smoothness_score < 1.0, "several periods lower smoothness");
    assert_eq!(r.lt2.average_period_duration, 50);
    assert_eq!(r.lt2.longest_period_duration, 50);

    // chronological order
    for pair in r.periods.windows(2) {
        assert!(pair[0].end_time <= pair[1].start_time);
    }
}

#[test]
fn one_sustained_effort_scores_smoother_than_three_bursts() {
    let smooth = analyze_heart_rate_thresholds(&series(&[170; 300]), &cfg()).unwrap();
    let spiky_hr = blocks(&[(100, 170), (100, 120), (100, 170), (100, 120), (100, 170)]);
    let spiky = analyze_heart_rate_thresholds(&series(&spiky_hr), &cfg()).unwrap();

    assert_eq!(smooth.lt2.time_seconds, spiky.lt2.time_seconds);
    assert!(smooth.lt2.smoothness_score > spiky.lt2.smoothness_score);
    assert!((smooth.lt2.smoothness_score - 1.0).abs() < 0.01);
    assert!(spiky.lt2.smoothness_score < 0.5);
    assert_eq!(smooth.lt2.periods, 1);
    assert_eq!(spiky.lt2.periods, 3);
}

#[test]
fn sparse_buckets_still_classify_with_enough_points() {
    let config = ThresholdConfig {
        min_valid_points_per_bucket: 5,
        ..cfg()
    };
    // 7 of every 10 seconds recorded
    let rates: Vec<Option<u8>> = (0..100).map(|i| (i % 10 < 7).then_some(150)).collect();
    let r = analyze_heart_rate_thresholds(&series_with_gaps(&rates), &config).unwrap();
    assert!(r.lt1.time_seconds > 0);
}

#[test]
fn bucket_with_too_few_points_is_skipped() {
    let config = ThresholdConfig {
        min_valid_points_per_bucket: 5,
        ..cfg()
    };
    let mut rates = vec![Some(150u8); 100];
    for r in rates.iter_mut().take(10).skip(3) {
        *r = None;
    }
    let r = analyze_heart_rate_thresholds(&series_with_gaps(&rates), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 90);
}

#[test]
fn lt1_to_lt2_transition_splits_into_two_periods() {
    let hr = blocks(&[(60, 150), (60, 170)]);
    let r = analyze_heart_rate_thresholds(&series(&hr), &cfg()).unwrap();

    assert_eq!(r.lt1.time_seconds, 60);
    assert_eq!(r.lt2.time_seconds, 60);
    assert_eq!(r.lt1.periods, 1);
    assert_eq!(r.lt2.periods, 1);

    assert_eq!(r.periods.len(), 2);
    assert_eq!(r.periods[0].zone, ThresholdZone::Lt1);
    assert_eq!(r.periods[1].zone, ThresholdZone::Lt2);
    assert_eq!(r.periods[0].start_time, start());
    assert_eq!(r.periods[0].end_time, start() + Duration::seconds(60));
    assert_eq!(r.periods[1].start_time, start() + Duration::seconds(60));
}

#[test]
fn mixed_sub_runs_below_minimum_are_dropped() {
    // 60 s LT1 then 30 s LT2: mixed run, the LT2 part is too short on its own
    let hr = blocks(&[(60, 150), (30, 170)]);
    let r = analyze_heart_rate_thresholds(&series(&hr), &cfg()).unwrap();
    assert_eq!(r.lt1.time_seconds, 60);
    assert_eq!(r.lt2.time_seconds, 0);
    assert_eq!(r.periods.len(), 1);
}

#[test]
fn period_statistics_come_from_bucket_averages() {
    let hr: Vec<u8> = (0..60).map(|i| 145 + (i % 11) as u8).collect();
    let r = analyze_heart_rate_thresholds(&series(&hr), &cfg()).unwrap();

    assert_eq!(r.periods.len(), 1);
    let p = &r.periods[0];
    assert!(p.avg_hr > 145.0 && p.avg_hr < 155.0);
    assert!(p.min_hr >= 145.0);
    assert!(p.max_hr <= 155.0);
    assert!(p.min_hr < p.avg_hr);
    assert!(p.max_hr > p.avg_hr);
}

#[test]
fn custom_bucket_size() {
    let config = ThresholdConfig {
        bucket_size_seconds: 5,
        threshold_tolerance_percent: 0.10,
        min_consecutive_buckets: 10,
        ..cfg()
    };
    let r = analyze_heart_rate_thresholds(&series(&[150; 50]), &config).unwrap();
    assert_eq!(r.lt1.time_seconds, 50);
    assert_eq!(r.lt1.periods, 1);
    assert_eq!(r.periods[0].duration % 5, 0);
}

#[test]
fn nothing_found_below_both_thresholds() {
    let r = analyze_heart_rate_thresholds(&series(&[120; 100]), &cfg()).unwrap();
    assert_eq!(r.lt1.time_seconds, 0);
    assert_eq!(r.lt2.time_seconds, 0);
    assert_eq!(r.lt1.periods, 0);
    assert_eq!(r.lt2.periods, 0);
    assert!(r.periods.is_empty());
    assert_eq!(r.lt1.smoothness_score, 0.0);
    assert_eq!(r.lt2.smoothness_score, 0.0);
}

#[test]
fn period_invariants_hold() {
    let hr = blocks(&[(70, 150), (20, 120), (130, 170), (60, 100), (55, 152)]);
    let config = ThresholdConfig {
        min_consecutive_buckets: 2,
        ..cfg()
    };
    let r = analyze_heart_rate_thresholds(&series(&hr), &config).unwrap();
    assert!(!r.periods.is_empty());
    for p in &r.periods {
        assert_eq!((p.end_time - p.start_time).num_seconds(), i64::from(p.duration));
        assert_eq!(p.duration % 10, 0);
        assert!(p.min_hr <= p.avg_hr && p.avg_hr <= p.max_hr);
    }
}

#[test]
fn repeated_analysis_is_identical() {
    let hr = blocks(&[(60, 150), (30, 120), (80, 170)]);
    let ts = series(&hr);
    let a = analyze_heart_rate_thresholds(&ts, &cfg()).unwrap();
    let b = analyze_heart_rate_thresholds(&ts, &cfg()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.lt1.smoothness_score.to_bits(), b.lt1.smoothness_score.to_bits());
}
