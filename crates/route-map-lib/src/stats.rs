//! Length and segment-count aggregation per activity

use crate::labels::{LabelSet, display_labels};
use crate::update::{Popup, PopupRow};
use std::collections::BTreeMap;

/// Synthetic bucket counting every matching route
pub const TOTAL_BUCKET: &str = "total";

/// Bucket for unclassified routes
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Buckets listed by a report, in this order
pub const REPORT_ORDER: [&str; 9] = [
    TOTAL_BUCKET,
    "trail",
    "offtrail",
    "bush",
    "road",
    "paddle",
    "crossing",
    "float",
    UNKNOWN_BUCKET,
];

const METERS_TO_MILES: f64 = 0.000621371;

/// Aggregate for one bucket
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityStats {
    pub length_m: f64,
    pub segments: usize,
}

/// Result of a statistics query
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsReport {
    /// Filter the report was computed with
    pub labels: LabelSet,
    buckets: BTreeMap<String, ActivityStats>,
}

impl StatsReport {
    /// Aggregate `(bucket, length)` samples, one per matching route
    ///
    /// Samples are sorted before summation, so the floating point result does
    /// not depend on the order the routes were visited in.
    pub(crate) fn from_samples(labels: LabelSet, mut samples: Vec<(&'static str, f64)>) -> Self {
        samples.sort_by(|a, b| a.0.cmp(b.0).then(a.1.total_cmp(&b.1)));

        let mut buckets: BTreeMap<String, ActivityStats> = BTreeMap::new();
        for (bucket, length) in &samples {
            let entry = buckets.entry((*bucket).to_string()).or_default();
            entry.length_m += length;
            entry.segments += 1;
        }

        if !samples.is_empty() {
            let mut lengths: Vec<f64> = samples.iter().map(|(_, l)| *l).collect();
            lengths.sort_by(f64::total_cmp);
            buckets.insert(
                TOTAL_BUCKET.to_string(),
                ActivityStats {
                    length_m: lengths.iter().sum(),
                    segments: lengths.len(),
                },
            );
        }

        Self { labels, buckets }
    }

    /// Stats of one bucket, zero when absent
    pub fn get(&self, bucket: &str) -> ActivityStats {
        self.buckets.get(bucket).copied().unwrap_or_default()
    }

    /// Every non-empty bucket, including activities outside [`REPORT_ORDER`]
    pub fn buckets(&self) -> &BTreeMap<String, ActivityStats> {
        &self.buckets
    }

    /// The fixed report rows, absent buckets as zero
    pub fn rows(&self) -> Vec<(&'static str, ActivityStats)> {
        REPORT_ORDER.iter().map(|b| (*b, self.get(b))).collect()
    }

    /// Popup summary listing only buckets that matched something
    pub fn to_popup(&self) -> Popup {
        let mut rows = vec![PopupRow::new("Labels", display_labels(&self.labels))];
        rows.extend(
            self.rows()
                .into_iter()
                .filter(|(_, stats)| stats.segments > 0)
                .map(|(bucket, stats)| {
                    PopupRow::new(
                        bucket,
                        format!("{} / {} segments", format_length(stats.length_m), stats.segments),
                    )
                }),
        );
        Popup {
            title: Some("Stats".to_string()),
            rows,
        }
    }
}

/// `X.X km / Y.Y mi`
pub fn format_length(length_m: f64) -> String {
    format!(
        "{:.1} km / {:.1} mi",
        length_m / 1000.0,
        length_m * METERS_TO_MILES
    )
}
