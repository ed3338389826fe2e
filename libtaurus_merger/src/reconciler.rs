use super::constants::{DEFAULT_REFERENCE_RATE, MAX_INTERPOLATED_GAP_SECONDS, NANOS_PER_SECOND};
use super::error::ReconcileError;
use super::segment::WaveformSegment;
use super::stats::RunStatistics;

/// Reconciler turns the segments of a single file into one continuous segment.
///
/// Gaps between segments are filled by linear interpolation. Where segments overlap, the later
/// segment wins over the overlapped region, and a segment lying entirely inside the data already
/// merged is dropped. Gap sizes are reported in samples of the reference rate rather than the
/// rate of the data, so reports from stations with different rates stay comparable.
#[derive(Debug, Clone)]
pub struct Reconciler {
    reference_rate: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_RATE)
    }
}

impl Reconciler {
    pub fn new(reference_rate: f64) -> Self {
        Self { reference_rate }
    }

    pub fn reference_rate(&self) -> f64 {
        self.reference_rate
    }

    /// Signed distance from the last sample of `left` to the first sample of `right`, in samples
    /// of the reference rate
    pub fn gap_in_samples(&self, left: &WaveformSegment, right: &WaveformSegment) -> f64 {
        let delta = right.start_time - left.end_time();
        delta.whole_nanoseconds() as f64 * self.reference_rate / NANOS_PER_SECOND
    }

    /// Merge the segments of one file.
    ///
    /// A single segment is returned untouched and nothing is recorded. Otherwise one gap per
    /// adjacent pair (in the order given) is recorded and the merge counter goes up by one.
    pub fn reconcile(
        &self,
        segments: Vec<WaveformSegment>,
        stats: &mut RunStatistics,
    ) -> Result<WaveformSegment, ReconcileError> {
        let first = segments.first().ok_or(ReconcileError::Empty)?;
        for seg in segments.iter().skip(1) {
            if seg.sample_rate != first.sample_rate {
                return Err(ReconcileError::MismatchedSampleRate(
                    first.sample_rate,
                    seg.sample_rate,
                ));
            }
            if !seg.same_stream(first) {
                return Err(ReconcileError::MismatchedChannel(
                    first.seed_id(),
                    seg.seed_id(),
                ));
            }
        }

        if segments.len() == 1 {
            return segments.into_iter().next().ok_or(ReconcileError::Empty);
        }

        let gaps: Vec<f64> = segments
            .windows(2)
            .map(|pair| self.gap_in_samples(&pair[0], &pair[1]))
            .collect();
        log::info!(
            "Merging {} segments of {} with gaps (samples) {:?}",
            segments.len(),
            first.seed_id(),
            gaps
        );
        stats.record_merge(&gaps);

        let mut sorted = segments;
        sorted.sort_by_key(|seg| seg.start_time);
        let mut iter = sorted.into_iter();
        let merged = iter.next().ok_or(ReconcileError::Empty)?;
        merge_interpolate(merged, iter)
    }
}

/// Samples strictly between `left` and `right`, evenly spaced and rounded
fn interpolate(left: i32, right: i32, missing: usize) -> impl Iterator<Item = i32> {
    let step = (right as f64 - left as f64) / (missing as f64 + 1.0);
    (1..=missing).map(move |idx| (left as f64 + step * idx as f64).round() as i32)
}

/// Fold time-sorted segments into `merged`
fn merge_interpolate(
    mut merged: WaveformSegment,
    rest: impl Iterator<Item = WaveformSegment>,
) -> Result<WaveformSegment, ReconcileError> {
    let max_missing = (MAX_INTERPOLATED_GAP_SECONDS * merged.sample_rate) as usize;
    for next in rest {
        let offset = ((next.start_time - merged.start_time).whole_nanoseconds() as f64
            * merged.sample_rate
            / NANOS_PER_SECOND)
            .round() as i64;
        let current_len = merged.samples.len() as i64;

        if offset >= current_len {
            let missing = (offset - current_len) as usize;
            if missing > max_missing {
                return Err(ReconcileError::GapTooLarge(
                    merged.seed_id(),
                    missing as f64 / merged.sample_rate,
                ));
            }
            if missing > 0 {
                if let (Some(&left), Some(&right)) = (merged.samples.last(), next.samples.first()) {
                    merged.samples.extend(interpolate(left, right, missing));
                }
            }
            merged.samples.extend(next.samples);
        } else if offset + next.samples.len() as i64 <= current_len {
            log::warn!(
                "Dropping segment of {} starting {} which lies inside already merged data",
                next.seed_id(),
                next.start_time
            );
        } else {
            merged.samples.truncate(offset.max(0) as usize);
            merged.samples.extend(next.samples);
        }
    }

    Ok(merged)
}
