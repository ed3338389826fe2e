use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("File name {0} is not valid UTF-8")]
    NotUnicode(PathBuf),
    #[error("File name {0} has {1} '_' separated fields; expected 3")]
    BadFieldCount(String, usize),
    #[error("Seed id {0} has {1} '.' separated fields; expected 4")]
    BadSeedId(String, usize),
    #[error("Seed id {0} has an empty channel code")]
    EmptyChannel(String),
    #[error("Date field {0} is not an 8 digit YYYYMMDD value")]
    BadDate(String),
    #[error("Time field {0} is not a 6 digit HHMMSS value")]
    BadTime(String),
    #[error("Date {0} and time {1} do not form a valid UTC instant")]
    InvalidInstant(String, String),
}

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("Scanner failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Scanner could not open directory {0:?} because it does not exist")]
    BadFilePath(PathBuf),
}

#[derive(Debug, Error)]
pub enum MseedError {
    #[error("miniSEED codec failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open miniSEED file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("miniSEED record at byte {0} is truncated")]
    TruncatedRecord(usize),
    #[error("miniSEED record at byte {0} has no blockette 1000")]
    MissingBlockette1000(usize),
    #[error("miniSEED record at byte {0} has invalid record length exponent {1}")]
    BadRecordLength(usize, u8),
    #[error("miniSEED record at byte {0} has invalid start time")]
    BadStartTime(usize),
    #[error("Record at byte {0} is not a miniSEED data record (quality indicator {1:?})")]
    NotDataRecord(usize, char),
    #[error("miniSEED record at byte {0} contains an invalid Steim frame")]
    BadSteimFrame(usize),
    #[error("miniSEED record at byte {0} has unsupported data encoding {1}")]
    UnsupportedEncoding(usize, u8),
    #[error("miniSEED record at byte {0} declares {1} samples but only {2} could be decoded")]
    SampleCountMismatch(usize, usize, usize),
    #[error("Sample rate {0} cannot be expressed as a miniSEED rate factor/multiplier")]
    UnsupportedSampleRate(f64),
    #[error("Segment code {0} does not fit its miniSEED header field")]
    CodeTooLong(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("Reconciler was given a file with no waveform segments")]
    Empty,
    #[error("Reconciler found mixed sample rates in one file -- {0} Hz and {1} Hz")]
    MismatchedSampleRate(f64, f64),
    #[error("Reconciler found mixed channels in one file -- {0} and {1}")]
    MismatchedChannel(String, String),
    #[error("Reconciler refused to interpolate a gap of {1} s in {0}; the record times are likely corrupt")]
    GapTooLarge(String, f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("Channel order requested channel code '{0}' which is not present in the triplet for {1}")]
    MissingChannel(char, String),
    #[error("Assembler expected 3 channels but was given {0}")]
    WrongChannelCount(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("No {0} directory was given")]
    MissingPath(String),
    #[error("Input directory {0:?} does not exist")]
    MissingInputDirectory(PathBuf),
    #[error("Channel order {0:?} must be exactly 3 distinct channel codes")]
    BadChannelOrder(String),
    #[error("Reference rate {0} must be a positive, finite number of Hz")]
    BadReferenceRate(f64),
    #[error("Input suffix {0:?} must be exactly 4 characters")]
    BadInputSuffix(String),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Scanner error: {0}")]
    ScannerError(#[from] ScannerError),
    #[error("Processor failed due to malformed file name: {0}")]
    FormatError(#[from] FormatError),
    #[error("Processor failed while reconciling {1:?}: {0}")]
    ReconcileError(ReconcileError, PathBuf),
    #[error("Processor failed due to Assembler error: {0}")]
    AssemblerError(#[from] AssemblerError),
    #[error("Processor failed due to miniSEED error: {0}")]
    MseedError(#[from] MseedError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
