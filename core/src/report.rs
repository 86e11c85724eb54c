use std::fmt;

use crate::analyze::ActivityReport;
use crate::thresholds::{ThresholdAnalysis, ThresholdZone};

fn fmt_duration(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn write_zone(f: &mut fmt::Formatter<'_>, analysis: &ThresholdAnalysis, zone: ThresholdZone) -> fmt::Result {
    let s = analysis.zone(zone);
    writeln!(
        f,
        "{}: {} in {} period(s), longest {}, avg {}, smoothness {:.2}",
        zone.label(),
        fmt_duration(s.time_seconds),
        s.periods,
        fmt_duration(s.longest_period_duration),
        fmt_duration(s.average_period_duration),
        s.smoothness_score
    )
}

impl fmt::Display for ActivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Heart Rate Report ---")?;
        match self.heart_rate.average {
            Some(avg) => writeln!(f, "Avg HR: {avg:.1} bpm")?,
            None => writeln!(f, "Avg HR: n/a")?,
        }
        match self.heart_rate.peak {
            Some(max) => writeln!(f, "Max HR: {max} bpm")?,
            None => writeln!(f, "Max HR: n/a")?,
        }

        let Some(analysis) = &self.thresholds else {
            return Ok(());
        };
        write_zone(f, analysis, ThresholdZone::Lt1)?;
        write_zone(f, analysis, ThresholdZone::Lt2)?;
        for p in &analysis.periods {
            writeln!(
                f,
                "  {} {} → {} ({}) avg {:.1} [{:.1}–{:.1}]",
                p.zone.label(),
                p.start_time.format("%H:%M:%S"),
                p.end_time.format("%H:%M:%S"),
                fmt_duration(p.duration),
                p.avg_hr,
                p.min_hr,
                p.max_hr
            )?;
        }
        Ok(())
    }
}
