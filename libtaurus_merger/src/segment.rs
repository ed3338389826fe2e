use time::{Duration, OffsetDateTime};

use super::constants::NANOS_PER_SECOND;

/// A WaveformSegment is one contiguous run of samples at a constant sample rate.
///
/// Samples are raw digitizer counts. A single Taurus file can decode into several segments when
/// the recorder dropped or repeated data inside the hour.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSegment {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub start_time: OffsetDateTime,
    pub sample_rate: f64,
    pub samples: Vec<i32>,
}

impl WaveformSegment {
    pub fn new(
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
        start_time: OffsetDateTime,
        sample_rate: f64,
        samples: Vec<i32>,
    ) -> Self {
        Self {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
            start_time,
            sample_rate,
            samples,
        }
    }

    pub fn seed_id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Spacing between two samples
    pub fn sample_period(&self) -> Duration {
        if self.sample_rate > 0.0 {
            Duration::nanoseconds((NANOS_PER_SECOND / self.sample_rate).round() as i64)
        } else {
            Duration::ZERO
        }
    }

    /// Time of the sample at `index`
    pub fn time_of(&self, index: usize) -> OffsetDateTime {
        if self.sample_rate > 0.0 {
            let nanos = (index as f64 * NANOS_PER_SECOND / self.sample_rate).round() as i64;
            self.start_time + Duration::nanoseconds(nanos)
        } else {
            self.start_time
        }
    }

    /// Time of the last sample (not one past it)
    pub fn end_time(&self) -> OffsetDateTime {
        self.time_of(self.samples.len().saturating_sub(1))
    }

    /// Time one sample period after the last sample, where a continuation would begin
    pub fn next_time(&self) -> OffsetDateTime {
        self.time_of(self.samples.len())
    }

    pub fn same_stream(&self, other: &Self) -> bool {
        self.network == other.network
            && self.station == other.station
            && self.location == other.location
            && self.channel == other.channel
    }
}

/// The multi-channel container for one station hour, written as a single Centaur file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationStream {
    pub traces: Vec<WaveformSegment>,
}

impl StationStream {
    pub fn new(traces: Vec<WaveformSegment>) -> Self {
        Self { traces }
    }

    pub fn channels(&self) -> Vec<&str> {
        self.traces.iter().map(|t| t.channel.as_str()).collect()
    }
}
