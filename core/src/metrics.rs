use once_cell::sync::OnceCell;
use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};

use crate::thresholds::{ThresholdAnalysis, ThresholdZone};

/// Counters for the analysis facade. The estimators and the detector never
/// touch these; only `analyze` records into them.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    analyses_total: IntCounterVec,
    unavailable_total: IntCounterVec,
    periods_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let analyses_total = IntCounterVec::new(
            Opts::new("stride_analyses_total", "Heart-rate analyses run, by kind"),
            &["kind"],
        )?;
        let unavailable_total = IntCounterVec::new(
            Opts::new(
                "stride_metric_unavailable_total",
                "Average/peak values reported as unknown, by reason",
            ),
            &["reason"],
        )?;
        let periods_total = IntCounterVec::new(
            Opts::new("stride_threshold_periods_total", "Threshold periods found, by zone"),
            &["zone"],
        )?;

        registry.register(Box::new(analyses_total.clone()))?;
        registry.register(Box::new(unavailable_total.clone()))?;
        registry.register(Box::new(periods_total.clone()))?;

        Ok(Self {
            registry,
            analyses_total,
            unavailable_total,
            periods_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_analysis(&self, kind: &str) {
        self.analyses_total.with_label_values(&[kind]).inc();
    }

    pub fn record_unavailable(&self, reason: &str) {
        self.unavailable_total.with_label_values(&[reason]).inc();
    }

    pub fn record_periods(&self, analysis: &ThresholdAnalysis) {
        for zone in [ThresholdZone::Lt1, ThresholdZone::Lt2] {
            let n = analysis.zone(zone).periods as u64;
            self.periods_total.with_label_values(&[zone.label()]).inc_by(n);
        }
    }

    pub fn analyses(&self, kind: &str) -> u64 {
        self.analyses_total.with_label_values(&[kind]).get()
    }

    pub fn unavailable(&self, reason: &str) -> u64 {
        self.unavailable_total.with_label_values(&[reason]).get()
    }

    pub fn periods(&self, zone: ThresholdZone) -> u64 {
        self.periods_total.with_label_values(&[zone.label()]).get()
    }

    /// Prometheus text exposition of all counters.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

static GLOBAL: OnceCell<Metrics> = OnceCell::new();

/// Process-wide metrics, created on first use.
pub fn global() -> prometheus::Result<&'static Metrics> {
    GLOBAL.get_or_try_init(Metrics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_render() {
        let m = Metrics::new().unwrap();
        assert_eq!(m.analyses("average"), 0);
        m.record_analysis("average");
        m.record_unavailable("no_valid_data");
        assert_eq!(m.analyses("average"), 1);
        assert_eq!(m.unavailable("no_valid_data"), 1);

        let text = m.render().unwrap();
        assert!(text.contains("stride_analyses_total"));
    }

    #[test]
    fn global_is_shared() {
        let a = global().unwrap() as *const Metrics;
        let b = global().unwrap() as *const Metrics;
        assert_eq!(a, b);
    }
}
