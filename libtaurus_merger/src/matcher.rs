use bit_set::BitSet;

use super::descriptor::FileDescriptor;

/// Three cochannel files: same timestamp, pairwise distinct channels, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet {
    pub members: [FileDescriptor; 3],
}

impl Triplet {
    /// The member discovered first; it names the output file
    pub fn anchor(&self) -> &FileDescriptor {
        &self.members[0]
    }
}

/// Result of matching a single directory
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub triplets: Vec<Triplet>,
    pub unmatched: Vec<FileDescriptor>,
}

fn is_cochannel(anchor: &FileDescriptor, other: &FileDescriptor) -> bool {
    anchor.timestamp == other.timestamp && anchor.channel != other.channel
}

/// Group the descriptors of one directory into triplets.
///
/// Greedy single pass in list order. Each not yet consumed descriptor becomes an anchor and is
/// consumed immediately; the first free cochannel and then the first free descriptor differing
/// from both channels complete the triplet. An anchor which cannot be completed stays consumed, so
/// it is reported as unmatched even if a later anchor could have used it. Grouping therefore
/// depends on the scan order of the directory, which must be preserved by the caller.
pub fn match_triplets(descriptors: &[FileDescriptor]) -> MatchResult {
    let mut consumed = BitSet::with_capacity(descriptors.len());
    let mut matched = BitSet::with_capacity(descriptors.len());
    let mut triplets: Vec<Triplet> = Vec::new();

    for (i, first) in descriptors.iter().enumerate() {
        if !consumed.insert(i) {
            continue;
        }

        let second = descriptors
            .iter()
            .enumerate()
            .find(|(j, d)| !consumed.contains(*j) && is_cochannel(first, d));
        let Some((j, second)) = second else {
            continue;
        };

        let third = descriptors.iter().enumerate().find(|(k, d)| {
            !consumed.contains(*k)
                && *k != j
                && is_cochannel(first, d)
                && second.channel != d.channel
        });
        let Some((k, third)) = third else {
            continue;
        };

        log::info!(
            "Matched cochannels {}, {}, {}",
            first.filepath.to_string_lossy(),
            second.filepath.to_string_lossy(),
            third.filepath.to_string_lossy()
        );
        consumed.insert(j);
        consumed.insert(k);
        matched.insert(i);
        matched.insert(j);
        matched.insert(k);
        triplets.push(Triplet {
            members: [first.clone(), second.clone(), third.clone()],
        });
    }

    let unmatched = descriptors
        .iter()
        .enumerate()
        .filter(|(idx, _)| !matched.contains(*idx))
        .map(|(_, d)| d.clone())
        .collect();

    MatchResult {
        triplets,
        unmatched,
    }
}
