use std::path::{Path, PathBuf};

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use super::constants::{DATE_FIELD_LENGTH, FILE_NAME_FIELDS, SEED_ID_FIELDS, TIME_FIELD_LENGTH};
use super::error::FormatError;

/// FileDescriptor is the identity of one Taurus input file, derived purely from its name.
///
/// Taurus names its files `<net>.<sta>.<loc>.<cha>_<YYYYMMDD>_<HHMMSS>.<ext>`, one file per
/// station, channel, and hour. The timestamp is the UTC instant of the date and time fields and is
/// the key used to find cochannels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub filepath: PathBuf,
    pub seed_id: String,
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub calendar_date: String,
    pub time_of_day: String,
    pub timestamp: OffsetDateTime,
}

impl FileDescriptor {
    /// Parse a descriptor from the path of a Taurus file. Only the file name is inspected.
    pub fn new(filepath: &Path) -> Result<Self, FormatError> {
        let file_name = filepath
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| FormatError::NotUnicode(filepath.to_path_buf()))?;

        let fields: Vec<&str> = file_name.split('_').collect();
        if fields.len() != FILE_NAME_FIELDS {
            return Err(FormatError::BadFieldCount(
                file_name.to_string(),
                fields.len(),
            ));
        }
        let seed_id = fields[0];
        let calendar_date = fields[1];
        // Drop the extension from the time of day
        let time_of_day = fields[2].split('.').next().unwrap_or_default();

        let codes: Vec<&str> = seed_id.split('.').collect();
        if codes.len() != SEED_ID_FIELDS {
            return Err(FormatError::BadSeedId(seed_id.to_string(), codes.len()));
        }
        if codes[3].is_empty() {
            return Err(FormatError::EmptyChannel(seed_id.to_string()));
        }

        let timestamp = parse_timestamp(calendar_date, time_of_day)?;

        Ok(Self {
            filepath: filepath.to_path_buf(),
            seed_id: seed_id.to_string(),
            network: codes[0].to_string(),
            station: codes[1].to_string(),
            location: codes[2].to_string(),
            channel: codes[3].to_string(),
            calendar_date: calendar_date.to_string(),
            time_of_day: time_of_day.to_string(),
            timestamp,
        })
    }

    /// The orientation code, i.e. the last character of the channel code (Z, N, E, ...)
    pub fn orientation(&self) -> char {
        // Channel is never empty after construction
        self.channel.chars().last().unwrap_or_default()
    }

    /// The channel code without its orientation character (HHZ -> HH)
    pub fn channel_stem(&self) -> &str {
        let cut = self
            .channel
            .char_indices()
            .last()
            .map(|(idx, _)| idx)
            .unwrap_or_default();
        &self.channel[..cut]
    }
}

fn parse_digits(field: &str, length: usize) -> Option<Vec<u32>> {
    if field.len() != length || !field.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    field.chars().map(|c| c.to_digit(10)).collect()
}

fn parse_timestamp(date: &str, time_of_day: &str) -> Result<OffsetDateTime, FormatError> {
    let d = parse_digits(date, DATE_FIELD_LENGTH)
        .ok_or_else(|| FormatError::BadDate(date.to_string()))?;
    let t = parse_digits(time_of_day, TIME_FIELD_LENGTH)
        .ok_or_else(|| FormatError::BadTime(time_of_day.to_string()))?;

    let year = (d[0] * 1000 + d[1] * 100 + d[2] * 10 + d[3]) as i32;
    let month = (d[4] * 10 + d[5]) as u8;
    let day = (d[6] * 10 + d[7]) as u8;
    let hour = (t[0] * 10 + t[1]) as u8;
    let minute = (t[2] * 10 + t[3]) as u8;
    let second = (t[4] * 10 + t[5]) as u8;

    let invalid = || FormatError::InvalidInstant(date.to_string(), time_of_day.to_string());
    let month = Month::try_from(month).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
    let time = Time::from_hms(hour, minute, second).map_err(|_| invalid())?;

    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}
