// File naming
pub const DEFAULT_INPUT_SUFFIX: &str = "seed";
pub const INPUT_SUFFIX_LENGTH: usize = 4;
pub const DEFAULT_OUTPUT_EXTENSION: &str = "miniseed";
pub const DATE_FIELD_LENGTH: usize = 8;
pub const TIME_FIELD_LENGTH: usize = 6;
pub const SEED_ID_FIELDS: usize = 4;
pub const FILE_NAME_FIELDS: usize = 3;

// Gap reporting was historically done at a fixed 250 Hz regardless of the data rate
pub const DEFAULT_REFERENCE_RATE: f64 = 250.0;

// Number of channels in a station group
pub const CHANNELS_PER_STATION: usize = 3;

// miniSEED 2 layout
pub const FIXED_HEADER_SIZE: usize = 48;
pub const BLOCKETTE_1000_TYPE: u16 = 1000;
pub const BLOCKETTE_1001_TYPE: u16 = 1001;
pub const BLOCKETTE_1000_SIZE: usize = 8;
pub const BLOCKETTE_1001_SIZE: usize = 8;
pub const WRITE_RECORD_EXPONENT: u8 = 9; // 2^9 = 512 bytes
pub const WRITE_RECORD_LENGTH: usize = 1 << WRITE_RECORD_EXPONENT as usize;
pub const WRITE_DATA_OFFSET: usize = 64;
pub const WRITE_SAMPLES_PER_RECORD: usize = (WRITE_RECORD_LENGTH - WRITE_DATA_OFFSET) / 4;
pub const MIN_RECORD_EXPONENT: u8 = 7;
pub const MAX_RECORD_EXPONENT: u8 = 16;
pub const STEIM_FRAME_SIZE: usize = 64;
pub const STEIM_WORDS_PER_FRAME: usize = 16;

// Data encodings (blockette 1000 field 3)
pub const ENCODING_INT16: u8 = 1;
pub const ENCODING_INT32: u8 = 3;
pub const ENCODING_STEIM1: u8 = 10;
pub const ENCODING_STEIM2: u8 = 11;

// BTIME fractional seconds are in units of 100 microseconds
pub const NANOS_PER_BTIME_TICK: i64 = 100_000;
pub const NANOS_PER_MICROSECOND: i64 = 1_000;
pub const NANOS_PER_SECOND: f64 = 1.0e9;

// Activity flag bit 1 is set once the time correction has been applied
pub const TIME_CORRECTION_APPLIED: u8 = 0x02;

// Longest gap filled by interpolation before a file is rejected as corrupt
pub const MAX_INTERPOLATED_GAP_SECONDS: f64 = 3600.0;

// Gap histogram bucket edges in samples, lower bound inclusive
pub const GAP_BUCKET_EDGES: [f64; 8] = [0.0, 5.0, 10.0, 15.0, 25.0, 50.0, 100.0, 250.0];
