//! miniSEED 2 reading and writing.
//!
//! Only the parts of SEED 2.4 needed for waveform files are handled: fixed length data records
//! with a blockette 1000, carrying INT16, INT32, Steim1, or Steim2 data. Records are written
//! big-endian, 512 bytes long, INT32 encoded.
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

use super::codec::WaveformCodec;
use super::constants::*;
use super::error::MseedError;
use super::segment::{StationStream, WaveformSegment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Big,
    Little,
}

impl Endian {
    fn u16(self, buf: &[u8]) -> u16 {
        match self {
            Self::Big => BigEndian::read_u16(buf),
            Self::Little => LittleEndian::read_u16(buf),
        }
    }

    fn i16(self, buf: &[u8]) -> i16 {
        match self {
            Self::Big => BigEndian::read_i16(buf),
            Self::Little => LittleEndian::read_i16(buf),
        }
    }

    fn u32(self, buf: &[u8]) -> u32 {
        match self {
            Self::Big => BigEndian::read_u32(buf),
            Self::Little => LittleEndian::read_u32(buf),
        }
    }

    fn i32(self, buf: &[u8]) -> i32 {
        match self {
            Self::Big => BigEndian::read_i32(buf),
            Self::Little => LittleEndian::read_i32(buf),
        }
    }
}

/// The parts of a data record header (fixed header + blockettes) needed to decode it
#[derive(Debug, Clone)]
struct RecordHeader {
    network: String,
    station: String,
    location: String,
    channel: String,
    start_time: OffsetDateTime,
    num_samples: usize,
    sample_rate: f64,
    data_offset: usize,
    record_length: usize,
    encoding: u8,
    data_endian: Endian,
}

fn header_code(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// SEED sample rate factor and multiplier to Hz
fn rate_from_factors(factor: i16, multiplier: i16) -> f64 {
    let f = factor as f64;
    let m = multiplier as f64;
    match (factor, multiplier) {
        (0, _) | (_, 0) => 0.0,
        (a, b) if a > 0 && b > 0 => f * m,
        (a, _) if a > 0 => -f / m,
        (_, b) if b > 0 => -m / f,
        _ => 1.0 / (f * m),
    }
}

/// Hz to SEED sample rate factor and multiplier
fn factors_from_rate(rate: f64) -> Result<(i16, i16), MseedError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(MseedError::UnsupportedSampleRate(rate));
    }
    let is_whole = |x: f64| (x - x.round()).abs() < 1.0e-9 && x.round() <= i16::MAX as f64;

    if rate < 1.0 && is_whole(1.0 / rate) {
        return Ok((-((1.0 / rate).round() as i16), 1));
    }
    for multiplier in [1_i16, 10, 100, 1000, 10000] {
        let factor = rate * multiplier as f64;
        if is_whole(factor) && factor.round() >= 1.0 {
            let multiplier = if multiplier == 1 { 1 } else { -multiplier };
            return Ok((factor.round() as i16, multiplier));
        }
    }
    Err(MseedError::UnsupportedSampleRate(rate))
}

fn parse_header(buffer: &[u8], offset: usize) -> Result<RecordHeader, MseedError> {
    let record = &buffer[offset..];
    if record.len() < FIXED_HEADER_SIZE {
        return Err(MseedError::TruncatedRecord(offset));
    }

    let quality = record[6] as char;
    if !matches!(quality, 'D' | 'R' | 'Q' | 'M') {
        return Err(MseedError::NotDataRecord(offset, quality));
    }

    // Header byte order is not flagged anywhere, so it is sniffed from the year and day
    let endian = {
        let year = BigEndian::read_u16(&record[20..22]);
        let doy = BigEndian::read_u16(&record[22..24]);
        if (1900..=2100).contains(&year) && (1..=366).contains(&doy) {
            Endian::Big
        } else {
            Endian::Little
        }
    };

    let year = endian.u16(&record[20..22]);
    let doy = endian.u16(&record[22..24]);
    let hour = record[24];
    let minute = record[25];
    let second = record[26];
    let fract = endian.u16(&record[28..30]);
    let num_samples = endian.u16(&record[30..32]) as usize;
    let factor = endian.i16(&record[32..34]);
    let multiplier = endian.i16(&record[34..36]);
    let activity_flags = record[36];
    let num_blockettes = record[39];
    let time_correction = endian.i32(&record[40..44]);
    let data_offset = endian.u16(&record[44..46]) as usize;
    let mut next_blockette = endian.u16(&record[46..48]) as usize;

    let mut b1000: Option<(u8, u8, u8)> = None;
    let mut microseconds: i64 = 0;
    for _ in 0..num_blockettes {
        if next_blockette == 0 {
            break;
        }
        if next_blockette + BLOCKETTE_1000_SIZE > record.len() {
            return Err(MseedError::TruncatedRecord(offset));
        }
        let blockette = &record[next_blockette..];
        match endian.u16(&blockette[0..2]) {
            BLOCKETTE_1000_TYPE => b1000 = Some((blockette[4], blockette[5], blockette[6])),
            BLOCKETTE_1001_TYPE => microseconds = blockette[5] as i8 as i64,
            _ => (),
        }
        next_blockette = endian.u16(&blockette[2..4]) as usize;
    }

    let (encoding, word_order, exponent) =
        b1000.ok_or(MseedError::MissingBlockette1000(offset))?;
    if !(MIN_RECORD_EXPONENT..=MAX_RECORD_EXPONENT).contains(&exponent) {
        return Err(MseedError::BadRecordLength(offset, exponent));
    }
    let record_length = 1_usize << exponent;
    if data_offset > record_length {
        return Err(MseedError::TruncatedRecord(offset));
    }

    let date = Date::from_ordinal_date(year as i32, doy)
        .map_err(|_| MseedError::BadStartTime(offset))?;
    let midnight = PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc();
    if hour > 23 || minute > 59 || second > 60 || fract > 9999 {
        return Err(MseedError::BadStartTime(offset));
    }
    let mut start_time = midnight
        + Duration::hours(hour as i64)
        + Duration::minutes(minute as i64)
        + Duration::seconds(second as i64)
        + Duration::nanoseconds(fract as i64 * NANOS_PER_BTIME_TICK + microseconds * 1000);
    if activity_flags & TIME_CORRECTION_APPLIED == 0 && time_correction != 0 {
        start_time += Duration::nanoseconds(time_correction as i64 * NANOS_PER_BTIME_TICK);
    }

    Ok(RecordHeader {
        network: header_code(&record[18..20]),
        station: header_code(&record[8..13]),
        location: header_code(&record[13..15]),
        channel: header_code(&record[15..18]),
        start_time,
        num_samples,
        sample_rate: rate_from_factors(factor, multiplier),
        data_offset,
        record_length,
        encoding,
        data_endian: if word_order == 0 {
            Endian::Little
        } else {
            Endian::Big
        },
    })
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    ((value << (32 - bits)) as i32) >> (32 - bits)
}

/// Split the low `count * bits` bits of a word into `count` signed differences, most significant first
fn unpack(word: u32, bits: u32, count: u32, diffs: &mut Vec<i32>) {
    let mask = (1_u32 << bits) - 1;
    for idx in 0..count {
        let shift = bits * (count - 1 - idx);
        diffs.push(sign_extend((word >> shift) & mask, bits));
    }
}

fn decode_steim(
    data: &[u8],
    num_samples: usize,
    endian: Endian,
    steim2: bool,
    offset: usize,
) -> Result<Vec<i32>, MseedError> {
    let mut diffs: Vec<i32> = Vec::with_capacity(num_samples);
    let mut first_sample: Option<i32> = None;

    for (frame_idx, frame) in data.chunks_exact(STEIM_FRAME_SIZE).enumerate() {
        if diffs.len() >= num_samples {
            break;
        }
        let control = endian.u32(&frame[0..4]);
        for word_idx in 1..STEIM_WORDS_PER_FRAME {
            let word = endian.u32(&frame[word_idx * 4..word_idx * 4 + 4]);
            // Words 1 and 2 of the first frame hold the forward and reverse integration constants
            if frame_idx == 0 && word_idx == 1 {
                first_sample = Some(word as i32);
                continue;
            } else if frame_idx == 0 && word_idx == 2 {
                continue;
            }
            let nibble = (control >> (30 - 2 * word_idx)) & 0b11;
            let dnib = word >> 30;
            match (nibble, steim2) {
                (0, _) => (),
                (1, _) => unpack(word, 8, 4, &mut diffs),
                (2, false) => unpack(word, 16, 2, &mut diffs),
                (3, false) => diffs.push(word as i32),
                (2, true) => match dnib {
                    1 => unpack(word, 30, 1, &mut diffs),
                    2 => unpack(word, 15, 2, &mut diffs),
                    3 => unpack(word, 10, 3, &mut diffs),
                    _ => return Err(MseedError::BadSteimFrame(offset)),
                },
                (3, true) => match dnib {
                    0 => unpack(word, 6, 5, &mut diffs),
                    1 => unpack(word, 5, 6, &mut diffs),
                    2 => unpack(word, 4, 7, &mut diffs),
                    _ => return Err(MseedError::BadSteimFrame(offset)),
                },
                _ => return Err(MseedError::BadSteimFrame(offset)),
            }
        }
    }

    let Some(first_sample) = first_sample else {
        return Err(MseedError::SampleCountMismatch(offset, num_samples, 0));
    };
    if diffs.len() < num_samples {
        return Err(MseedError::SampleCountMismatch(
            offset,
            num_samples,
            diffs.len(),
        ));
    }

    // The first difference is relative to the previous record and is not needed
    let mut samples = Vec::with_capacity(num_samples);
    let mut last = first_sample;
    samples.push(last);
    for diff in diffs.iter().skip(1).take(num_samples - 1) {
        last = last.wrapping_add(*diff);
        samples.push(last);
    }
    Ok(samples)
}

fn decode_samples(header: &RecordHeader, data: &[u8], offset: usize) -> Result<Vec<i32>, MseedError> {
    let endian = header.data_endian;
    let samples: Vec<i32> = match header.encoding {
        ENCODING_INT16 => data
            .chunks_exact(2)
            .take(header.num_samples)
            .map(|chunk| endian.i16(chunk) as i32)
            .collect(),
        ENCODING_INT32 => data
            .chunks_exact(4)
            .take(header.num_samples)
            .map(|chunk| endian.i32(chunk))
            .collect(),
        ENCODING_STEIM1 => decode_steim(data, header.num_samples, endian, false, offset)?,
        ENCODING_STEIM2 => decode_steim(data, header.num_samples, endian, true, offset)?,
        other => return Err(MseedError::UnsupportedEncoding(offset, other)),
    };
    if samples.len() != header.num_samples {
        return Err(MseedError::SampleCountMismatch(
            offset,
            header.num_samples,
            samples.len(),
        ));
    }
    Ok(samples)
}

/// Add a decoded record to the segment list, extending the last segment when the record continues it
fn append_record(segments: &mut Vec<WaveformSegment>, header: RecordHeader, samples: Vec<i32>) {
    let record = WaveformSegment::new(
        &header.network,
        &header.station,
        &header.location,
        &header.channel,
        header.start_time,
        header.sample_rate,
        samples,
    );
    if let Some(last) = segments.last_mut() {
        if last.same_stream(&record) && last.sample_rate == record.sample_rate {
            let drift = (record.start_time - last.next_time()).whole_nanoseconds() as f64;
            let tolerance = 0.5 * NANOS_PER_SECOND / record.sample_rate;
            if drift.abs() <= tolerance {
                last.samples.extend(record.samples);
                return;
            }
        }
    }
    segments.push(record);
}

fn pad_code(code: &str, width: usize) -> Result<Vec<u8>, MseedError> {
    if code.len() > width || !code.is_ascii() {
        return Err(MseedError::CodeTooLong(code.to_string()));
    }
    let mut bytes = code.as_bytes().to_vec();
    bytes.resize(width, b' ');
    Ok(bytes)
}

/// Split a start time into a BTIME (100 microsecond ticks) and the microsecond remainder carried
/// by blockette 1001. Anything below a microsecond is rounded away.
fn split_btime(time: OffsetDateTime) -> (OffsetDateTime, i8) {
    let nanos = time.nanosecond() as i64;
    let micros = (nanos + NANOS_PER_MICROSECOND / 2) / NANOS_PER_MICROSECOND;
    let time = time - Duration::nanoseconds(nanos)
        + Duration::nanoseconds(micros * NANOS_PER_MICROSECOND);

    let remainder = time.nanosecond() as i64 % NANOS_PER_BTIME_TICK;
    (
        time - Duration::nanoseconds(remainder),
        (remainder / NANOS_PER_MICROSECOND) as i8,
    )
}

/// Fixed header, blockette 1000 and blockette 1001 of a data record, padded to the data offset
#[allow(clippy::too_many_arguments)]
fn write_header(
    record: &mut Vec<u8>,
    trace: &WaveformSegment,
    start_time: OffsetDateTime,
    sequence: u32,
    num_samples: u16,
    factors: (i16, i16),
    encoding: u8,
    data_offset: usize,
) -> Result<(), MseedError> {
    let (start_time, microseconds) = split_btime(start_time);
    record.extend_from_slice(format!("{:06}", sequence).as_bytes());
    record.push(b'D');
    record.push(b' ');
    record.extend(pad_code(&trace.station, 5)?);
    record.extend(pad_code(&trace.location, 2)?);
    record.extend(pad_code(&trace.channel, 3)?);
    record.extend(pad_code(&trace.network, 2)?);
    record.write_u16::<BigEndian>(start_time.year() as u16)?;
    record.write_u16::<BigEndian>(start_time.ordinal())?;
    record.push(start_time.hour());
    record.push(start_time.minute());
    record.push(start_time.second());
    record.push(0);
    record.write_u16::<BigEndian>((start_time.nanosecond() as i64 / NANOS_PER_BTIME_TICK) as u16)?;
    record.write_u16::<BigEndian>(num_samples)?;
    record.write_i16::<BigEndian>(factors.0)?;
    record.write_i16::<BigEndian>(factors.1)?;
    record.push(0); // activity flags
    record.push(0); // io flags
    record.push(0); // data quality flags
    record.push(2); // number of blockettes
    record.write_i32::<BigEndian>(0)?; // time correction
    record.write_u16::<BigEndian>(data_offset as u16)?;
    record.write_u16::<BigEndian>(FIXED_HEADER_SIZE as u16)?;

    record.write_u16::<BigEndian>(BLOCKETTE_1000_TYPE)?;
    record.write_u16::<BigEndian>((FIXED_HEADER_SIZE + BLOCKETTE_1000_SIZE) as u16)?;
    record.push(encoding);
    record.push(1); // big endian
    record.push(WRITE_RECORD_EXPONENT);
    record.push(0);

    record.write_u16::<BigEndian>(BLOCKETTE_1001_TYPE)?;
    record.write_u16::<BigEndian>(0)?;
    record.push(0); // timing quality
    record.write_i8(microseconds)?;
    record.push(0);
    record.push(0); // frame count
    record.resize(data_offset, 0);
    Ok(())
}

/// Reads and writes miniSEED 2 files
#[derive(Debug, Clone, Copy, Default)]
pub struct MseedCodec;

impl MseedCodec {
    pub fn new() -> Self {
        Self
    }

    /// Decode every data record in a buffer into segments
    pub fn decode(&self, buffer: &[u8]) -> Result<Vec<WaveformSegment>, MseedError> {
        let mut segments: Vec<WaveformSegment> = Vec::new();
        let mut offset = 0;
        while offset < buffer.len() {
            let header = parse_header(buffer, offset)?;
            let end = offset + header.record_length;
            if end > buffer.len() {
                return Err(MseedError::TruncatedRecord(offset));
            }
            if header.num_samples > 0 && header.sample_rate > 0.0 {
                let samples = decode_samples(
                    &header,
                    &buffer[offset + header.data_offset..end],
                    offset,
                )?;
                append_record(&mut segments, header, samples);
            }
            offset = end;
        }
        Ok(segments)
    }

    /// Encode a stream as INT32 data records
    pub fn encode<W: Write>(&self, stream: &StationStream, mut writer: W) -> Result<(), MseedError> {
        let mut sequence: u32 = 1;
        for trace in stream.traces.iter() {
            let factors = factors_from_rate(trace.sample_rate)?;
            for (chunk_idx, chunk) in trace.samples.chunks(WRITE_SAMPLES_PER_RECORD).enumerate() {
                let mut record: Vec<u8> = Vec::with_capacity(WRITE_RECORD_LENGTH);
                write_header(
                    &mut record,
                    trace,
                    trace.time_of(chunk_idx * WRITE_SAMPLES_PER_RECORD),
                    sequence,
                    chunk.len() as u16,
                    factors,
                    ENCODING_INT32,
                    WRITE_DATA_OFFSET,
                )?;
                for sample in chunk {
                    record.write_i32::<BigEndian>(*sample)?;
                }
                record.resize(WRITE_RECORD_LENGTH, 0);
                writer.write_all(&record)?;
                sequence = sequence % 999_999 + 1;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

impl WaveformCodec for MseedCodec {
    fn read_segments(&self, path: &Path) -> Result<Vec<WaveformSegment>, MseedError> {
        if !path.exists() {
            return Err(MseedError::BadFilePath(path.to_path_buf()));
        }
        let buffer = std::fs::read(path)?;
        self.decode(&buffer)
    }

    fn write_stream(&self, stream: &StationStream, path: &Path) -> Result<(), MseedError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        self.encode(stream, writer)
    }
}
