use fxhash::FxHashMap;

use super::constants::CHANNELS_PER_STATION;
use super::error::AssemblerError;
use super::segment::{StationStream, WaveformSegment};

/// Combine the reconciled members of a triplet into one station stream.
///
/// `members` pairs each trace with the orientation code (last character of the channel) of the
/// file it came from, in triplet discovery order. Without a channel order the stream keeps that
/// order. With one, the traces are laid out following the order string, and any character of the
/// order which has no matching member is an error.
pub fn assemble(
    members: Vec<(char, WaveformSegment)>,
    channel_order: Option<&str>,
) -> Result<StationStream, AssemblerError> {
    if members.len() != CHANNELS_PER_STATION {
        return Err(AssemblerError::WrongChannelCount(members.len()));
    }

    let Some(order) = channel_order else {
        return Ok(StationStream::new(
            members.into_iter().map(|(_, trace)| trace).collect(),
        ));
    };

    let station = members[0].1.seed_id();
    let mut by_code: FxHashMap<char, WaveformSegment> = members.into_iter().collect();
    let mut traces: Vec<WaveformSegment> = Vec::with_capacity(CHANNELS_PER_STATION);
    for code in order.chars() {
        match by_code.remove(&code) {
            Some(trace) => traces.push(trace),
            None => return Err(AssemblerError::MissingChannel(code, station)),
        }
    }
    Ok(StationStream::new(traces))
}

/// Check an order string against the orientation codes of a triplet without touching any data
pub fn check_order(codes: &[char], channel_order: &str, station: &str) -> Result<(), AssemblerError> {
    match channel_order.chars().find(|code| !codes.contains(code)) {
        Some(code) => Err(AssemblerError::MissingChannel(code, station.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn member(channel: &str) -> (char, WaveformSegment) {
        let trace = WaveformSegment::new(
            "XX",
            "STA",
            "00",
            channel,
            datetime!(2020-01-01 00:00:00 UTC),
            100.0,
            vec![1, 2, 3],
        );
        (channel.chars().last().unwrap(), trace)
    }

    #[test]
    fn test_discovery_order() {
        let stream = assemble(vec![member("HHN"), member("HHE"), member("HHZ")], None).unwrap();
        assert_eq!(stream.channels(), vec!["HHN", "HHE", "HHZ"]);
    }

    #[test]
    fn test_requested_order() {
        let stream =
            assemble(vec![member("HHN"), member("HHE"), member("HHZ")], Some("ZNE")).unwrap();
        assert_eq!(stream.channels(), vec!["HHZ", "HHN", "HHE"]);
    }

    #[test]
    fn test_missing_channel() {
        let result = assemble(vec![member("HH1"), member("HH2"), member("HHZ")], Some("ZNE"));
        assert_eq!(
            result,
            Err(AssemblerError::MissingChannel('N', String::from("XX.STA.00.HH1")))
        );
        assert!(check_order(&['1', '2', 'Z'], "ZNE", "XX.STA.00").is_err());
        assert!(check_order(&['E', 'N', 'Z'], "ZNE", "XX.STA.00").is_ok());
    }

    #[test]
    fn test_wrong_count() {
        assert_eq!(
            assemble(vec![member("HHZ")], None),
            Err(AssemblerError::WrongChannelCount(1))
        );
    }
}
