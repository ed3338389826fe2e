use std::path::Path;

use super::error::MseedError;
use super::segment::{StationStream, WaveformSegment};

/// The storage seam of the merger: how waveform files are read and how merged streams are written.
///
/// MseedCodec is the implementation used for real data. Anything else implementing this trait can
/// stand in for it, which keeps the merging logic independent of the on-disk format.
pub trait WaveformCodec {
    /// Decode a file into its segments, in file order
    fn read_segments(&self, path: &Path) -> Result<Vec<WaveformSegment>, MseedError>;

    /// Serialize a stream to `path`, creating parent directories as needed
    fn write_stream(&self, stream: &StationStream, path: &Path) -> Result<(), MseedError>;
}
