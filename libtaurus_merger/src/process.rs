use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use super::assembler::{assemble, check_order};
use super::codec::WaveformCodec;
use super::config::Config;
use super::descriptor::FileDescriptor;
use super::error::ProcessorError;
use super::matcher::{match_triplets, Triplet};
use super::reconciler::Reconciler;
use super::scanner::{scan_directories, scan_files};
use super::stats::RunStatistics;
use super::worker_status::WorkerStatus;

/// Turn file paths into descriptors, skipping or failing on malformed names per the config
fn parse_descriptors(
    config: &Config,
    files: &[PathBuf],
) -> Result<Vec<FileDescriptor>, ProcessorError> {
    let mut descriptors = Vec::with_capacity(files.len());
    for file in files {
        match FileDescriptor::new(file) {
            Ok(desc) => descriptors.push(desc),
            Err(e) if config.skip_malformed => {
                log::warn!("Skipping {}: {e}", file.to_string_lossy());
            }
            Err(e) => return Err(ProcessorError::FormatError(e)),
        }
    }
    Ok(descriptors)
}

/// Read, reconcile, assemble, and write one triplet. Returns the path written.
///
/// The channel order is checked against the triplet before any file is read, so a bad order
/// never leaves a partial output behind.
pub fn merge_triplet<C: WaveformCodec>(
    config: &Config,
    triplet: &Triplet,
    input_dir: &Path,
    codec: &C,
    reconciler: &Reconciler,
    stats: &mut RunStatistics,
) -> Result<PathBuf, ProcessorError> {
    if let Some(order) = config.channel_order.as_deref() {
        let codes: Vec<char> = triplet.members.iter().map(|m| m.orientation()).collect();
        check_order(&codes, order, &triplet.anchor().seed_id)?;
    }

    let mut members = Vec::with_capacity(triplet.members.len());
    for member in triplet.members.iter() {
        let segments = codec.read_segments(&member.filepath)?;
        let trace = reconciler
            .reconcile(segments, stats)
            .map_err(|e| ProcessorError::ReconcileError(e, member.filepath.clone()))?;
        members.push((member.orientation(), trace));
    }

    let stream = assemble(members, config.channel_order.as_deref())?;
    let output_path = config.get_output_file_path(triplet.anchor(), input_dir);
    log::info!("Writing output file {}", output_path.to_string_lossy());
    codec.write_stream(&stream, &output_path)?;
    Ok(output_path)
}

/// Merge every triplet found in a single input directory. Returns the number of files written.
pub fn process_directory<C: WaveformCodec>(
    config: &Config,
    input_dir: &Path,
    codec: &C,
    reconciler: &Reconciler,
    stats: &mut RunStatistics,
) -> Result<usize, ProcessorError> {
    let listing = scan_files(input_dir, &config.input_suffix)?;
    log::info!(
        "Found {} files ({}) in {}",
        listing.files.len(),
        human_bytes::human_bytes(listing.total_size_bytes as f64),
        input_dir.to_string_lossy()
    );

    let descriptors = parse_descriptors(config, &listing.files)?;
    let matched = match_triplets(&descriptors);
    for lonely in matched.unmatched.iter() {
        log::warn!(
            "No cochannels found for {}, it will not be merged",
            lonely.filepath.to_string_lossy()
        );
    }

    let mut written = 0;
    for triplet in matched.triplets.iter() {
        merge_triplet(config, triplet, input_dir, codec, reconciler, stats)?;
        written += 1;
    }
    Ok(written)
}

/// The main loop of taurus_merger.
///
/// Validates the config, then merges each subdirectory of the input in turn, sending a status
/// after each one. Stops at the first error; files already written stay on disk. The statistics
/// of the whole run are returned for reporting.
pub fn process<C: WaveformCodec>(
    config: &Config,
    codec: &C,
    tx: &Sender<WorkerStatus>,
) -> Result<RunStatistics, ProcessorError> {
    config.validate()?;
    config.create_output_directory()?;

    let reconciler = Reconciler::new(config.reference_rate);
    let mut stats = RunStatistics::new();
    let directories = scan_directories(&config.input_path)?;
    let n_dirs = directories.len();
    tx.send(WorkerStatus::new(0.0, "", 0))?;

    for (idx, dir) in directories.iter().enumerate() {
        let dir_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        log::info!("Processing directory {}...", dir.to_string_lossy());
        let written = process_directory(config, dir, codec, &reconciler, &mut stats)?;
        log::info!("Finished directory {dir_name}, wrote {written} files.");
        tx.send(WorkerStatus::new(
            (idx + 1) as f32 / n_dirs as f32,
            &dir_name,
            written,
        ))?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssemblerError, ConfigError, FormatError, MseedError};
    use crate::mseed::MseedCodec;
    use crate::segment::{StationStream, WaveformSegment};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::mpsc;
    use time::macros::datetime;
    use time::Duration;

    /// Serves canned segments by file name and records writes in memory
    #[derive(Default)]
    struct MemoryCodec {
        inputs: HashMap<String, Vec<WaveformSegment>>,
        written: RefCell<Vec<(PathBuf, StationStream)>>,
    }

    impl WaveformCodec for MemoryCodec {
        fn read_segments(&self, path: &Path) -> Result<Vec<WaveformSegment>, MseedError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.inputs
                .get(&name)
                .cloned()
                .ok_or_else(|| MseedError::BadFilePath(path.to_path_buf()))
        }

        fn write_stream(&self, stream: &StationStream, path: &Path) -> Result<(), MseedError> {
            self.written
                .borrow_mut()
                .push((path.to_path_buf(), stream.clone()));
            Ok(())
        }
    }

    fn name(channel: &str) -> String {
        format!("XX.STA.00.{channel}_20200101_000000.seed")
    }

    fn trace(channel: &str, offset_ms: i64, samples: Vec<i32>) -> WaveformSegment {
        WaveformSegment::new(
            "XX",
            "STA",
            "00",
            channel,
            datetime!(2020-01-01 00:00:00 UTC) + Duration::milliseconds(offset_ms),
            250.0,
            samples,
        )
    }

    /// Input root with one subdirectory holding (empty) files with the given names
    fn input_tree(names: &[String]) -> (tempfile::TempDir, Config) {
        let root = tempfile::tempdir().unwrap();
        let day = root.path().join("input").join("day1");
        std::fs::create_dir_all(&day).unwrap();
        for name in names {
            std::fs::write(day.join(name), b"").unwrap();
        }
        let config = Config {
            input_path: root.path().join("input"),
            output_path: root.path().join("output"),
            ..Default::default()
        };
        (root, config)
    }

    fn codec_for(channels: &[&str]) -> MemoryCodec {
        let mut codec = MemoryCodec::default();
        for ch in channels {
            codec.inputs.insert(name(ch), vec![trace(ch, 0, vec![1, 2, 3])]);
        }
        codec
    }

    #[test]
    fn test_single_triplet_ordered() {
        let channels = ["HHN", "HHE", "HHZ"];
        let names: Vec<String> = channels.iter().map(|c| name(c)).collect();
        let (root, mut config) = input_tree(&names);
        config.channel_order = Some(String::from("ZNE"));
        let codec = codec_for(&channels);
        let (tx, rx) = mpsc::channel();

        let stats = process(&config, &codec, &tx).unwrap();
        assert_eq!(stats, RunStatistics::new());
        assert!(root.path().join("output").exists());

        let written = codec.written.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0].0,
            root.path()
                .join("output")
                .join("day1")
                .join("XX.STA.00.HH_20200101_000000.miniseed")
        );
        assert_eq!(written[0].1.channels(), vec!["HHZ", "HHN", "HHE"]);

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        let last = statuses.last().unwrap();
        assert_eq!(last.progress, 1.0);
        assert_eq!(last.directory, "day1");
        assert_eq!(last.files_written, 1);
    }

    #[test]
    fn test_discovery_order_without_channel_order() {
        let channels = ["HHN", "HHE", "HHZ"];
        let names: Vec<String> = channels.iter().map(|c| name(c)).collect();
        let (_root, config) = input_tree(&names);
        let codec = codec_for(&channels);
        let (tx, _rx) = mpsc::channel();
        process(&config, &codec, &tx).unwrap();

        // Discovery order is the directory scan order, so compare against the scan itself
        let listing = scan_files(&config.input_path.join("day1"), "seed").unwrap();
        let scanned: Vec<String> = listing
            .files
            .iter()
            .map(|f| FileDescriptor::new(f).unwrap().channel)
            .collect();
        let written = codec.written.borrow();
        assert_eq!(written[0].1.channels(), scanned);
    }

    #[test]
    fn test_missing_channel_fails_before_write() {
        let channels = ["HH1", "HH2", "HHZ"];
        let names: Vec<String> = channels.iter().map(|c| name(c)).collect();
        let (_root, mut config) = input_tree(&names);
        config.channel_order = Some(String::from("ZNE"));
        let codec = codec_for(&channels);
        let (tx, _rx) = mpsc::channel();

        let result = process(&config, &codec, &tx);
        assert!(matches!(
            result,
            Err(ProcessorError::AssemblerError(AssemblerError::MissingChannel(_, _)))
        ));
        assert!(codec.written.borrow().is_empty());
    }

    #[test]
    fn test_gap_recorded_once_per_file() {
        let channels = ["HHZ", "HHN", "HHE"];
        let names: Vec<String> = channels.iter().map(|c| name(c)).collect();
        let (_root, config) = input_tree(&names);
        let mut codec = codec_for(&channels);
        codec.inputs.insert(
            name("HHZ"),
            vec![
                trace("HHZ", 0, vec![0, 10]),
                trace("HHZ", 16, vec![40]),
                trace("HHZ", 28, vec![70]),
            ],
        );
        let (tx, _rx) = mpsc::channel();

        let stats = process(&config, &codec, &tx).unwrap();
        assert_eq!(stats.merged_files, 1);
        assert_eq!(stats.gaps, vec![3.0, 3.0]);

        let written = codec.written.borrow();
        let z = written[0]
            .1
            .traces
            .iter()
            .find(|t| t.channel == "HHZ")
            .unwrap();
        assert_eq!(z.samples, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn test_malformed_name_policy() {
        let mut names: Vec<String> = ["HHZ", "HHN", "HHE"].iter().map(|c| name(c)).collect();
        names.push(String::from("garbage.seed"));
        let (_root, mut config) = input_tree(&names);
        let codec = codec_for(&["HHZ", "HHN", "HHE"]);
        let (tx, _rx) = mpsc::channel();

        assert!(matches!(
            process(&config, &codec, &tx),
            Err(ProcessorError::FormatError(FormatError::BadFieldCount(_, 1)))
        ));

        config.skip_malformed = true;
        process(&config, &codec, &tx).unwrap();
        assert_eq!(codec.written.borrow().len(), 1);
    }

    #[test]
    fn test_structured_output_and_unmatched() {
        let names: Vec<String> = ["HHZ", "HHN"].iter().map(|c| name(c)).collect();
        let (root, mut config) = input_tree(&names);
        config.structured_output = true;
        let codec = codec_for(&["HHZ", "HHN"]);
        let (tx, _rx) = mpsc::channel();
        process(&config, &codec, &tx).unwrap();
        assert!(codec.written.borrow().is_empty());
        // Output root is created even when nothing is written
        assert!(root.path().join("output").exists());
    }

    #[test]
    fn test_missing_input_directory() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            input_path: root.path().join("nope"),
            output_path: root.path().join("out"),
            ..Default::default()
        };
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            process(&config, &MemoryCodec::default(), &tx),
            Err(ProcessorError::ConfigError(ConfigError::MissingInputDirectory(_)))
        ));
        assert!(!root.path().join("out").exists());
    }

    #[test]
    fn test_end_to_end_mseed() {
        let root = tempfile::tempdir().unwrap();
        let day = root.path().join("input").join("20200101");
        let codec = MseedCodec::new();
        let start = datetime!(2020-01-01 00:00:00 UTC);
        for ch in ["HHE", "HHZ", "HHN"] {
            let first = WaveformSegment::new("XX", "STA", "00", ch, start, 100.0, vec![5; 150]);
            let mut pieces = vec![first];
            if ch == "HHN" {
                // 2 seconds of missing data inside the hour
                let later = start + Duration::seconds(3);
                pieces.push(WaveformSegment::new("XX", "STA", "00", ch, later, 100.0, vec![9; 20]));
            }
            codec
                .write_stream(&StationStream::new(pieces), &day.join(name(ch)))
                .unwrap();
        }

        let config = Config {
            input_path: root.path().join("input"),
            output_path: root.path().join("output"),
            channel_order: Some(String::from("ZNE")),
            structured_output: true,
            reference_rate: 100.0,
            ..Default::default()
        };
        let (tx, _rx) = mpsc::channel();
        let stats = process(&config, &codec, &tx).unwrap();
        assert_eq!(stats.merged_files, 1);
        assert_eq!(stats.gaps, vec![151.0]);

        let out = root
            .path()
            .join("output/2020/01/01/XX.STA.00.HH_20200101_000000.miniseed");
        let traces = codec.read_segments(&out).unwrap();
        assert_eq!(traces.len(), 3);
        let channels: Vec<&str> = traces.iter().map(|t| t.channel.as_str()).collect();
        assert_eq!(channels, vec!["HHZ", "HHN", "HHE"]);
        assert_eq!(traces[0].samples.len(), 150);
        assert_eq!(traces[1].samples.len(), 320);
        assert_eq!(traces[1].samples[149], 5);
        assert_eq!(traces[1].samples[300], 9);
    }
}
