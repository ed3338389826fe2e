use std::fmt::Display;

use super::constants::GAP_BUCKET_EDGES;

const BUCKET_LABELS: [&str; 9] = [
    "0",
    "(0, 5)",
    "[5, 10)",
    "[10, 15)",
    "[15, 25)",
    "[25, 50)",
    "[50, 100)",
    "[100, 250)",
    "[250, inf)",
];

/// Histogram of gap magnitudes in samples.
///
/// Bucket 0 holds exact zeros, bucket 1 the open interval (0, 5), and the remaining buckets are
/// half open on the edges in GAP_BUCKET_EDGES. Negative values (overlaps) are kept apart, which
/// only ever happens for the signed histogram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapHistogram {
    pub buckets: [u64; 9],
    pub negative: u64,
}

impl GapHistogram {
    pub fn fill(&mut self, value: f64) {
        if value < 0.0 {
            self.negative += 1;
        } else if value == 0.0 {
            self.buckets[0] += 1;
        } else {
            let idx = GAP_BUCKET_EDGES
                .iter()
                .rposition(|edge| value >= *edge && *edge > 0.0)
                .map(|edge_idx| edge_idx + 1)
                .unwrap_or(1);
            self.buckets[idx] += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().sum::<u64>() + self.negative
    }
}

impl Display for GapHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative > 0 {
            writeln!(f, "  {:>12}: {}", "< 0", self.negative)?;
        }
        for (label, count) in BUCKET_LABELS.iter().zip(self.buckets.iter()) {
            writeln!(f, "  {:>12}: {}", label, count)?;
        }
        Ok(())
    }
}

/// Run-wide accumulator of merge events.
///
/// Owned by whoever drives the run and lent mutably to the reconciler; every file that needed
/// an intra-file merge increments `merged_files` once and appends one signed gap per internal
/// boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub merged_files: u64,
    pub gaps: Vec<f64>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one merged file and the gaps found inside it
    pub fn record_merge(&mut self, gaps: &[f64]) {
        self.merged_files += 1;
        self.gaps.extend_from_slice(gaps);
    }

    /// Fold the statistics of another run into this one
    pub fn absorb(&mut self, other: RunStatistics) {
        self.merged_files += other.merged_files;
        self.gaps.extend(other.gaps);
    }

    pub fn signed_histogram(&self) -> GapHistogram {
        let mut hist = GapHistogram::default();
        self.gaps.iter().for_each(|gap| hist.fill(*gap));
        hist
    }

    pub fn absolute_histogram(&self) -> GapHistogram {
        let mut hist = GapHistogram::default();
        self.gaps.iter().for_each(|gap| hist.fill(gap.abs()));
        hist
    }
}

impl Display for RunStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Files merged: {}", self.merged_files)?;
        writeln!(f, "Gaps recorded: {}", self.gaps.len())?;
        writeln!(f, "Gap histogram (signed, samples):")?;
        write!(f, "{}", self.signed_histogram())?;
        writeln!(f, "Gap histogram (absolute, samples):")?;
        write!(f, "{}", self.absolute_histogram())
    }
}
