//! Barcode mismatch tolerances. BCL Convert accepts reads whose index is
//! within `BarcodeMismatchesIndex1/2` errors of a sample's index; two samples
//! of a lane whose indexes are closer than `MINIMUM_HAMMING_DISTANCE` must not
//! tolerate any mismatch or reads would be assigned to either.

use crate::error::{ComparisonError, FormatError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MINIMUM_HAMMING_DISTANCE: usize = 2;
pub const DEFAULT_BARCODE_MISMATCHES: u8 = 1;
const NOT_APPLICABLE: &str = "na";

/// Mismatch tolerance of one index of a sample.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BarcodeMismatches {
    Allowed(u8),
    /// The sample has no index 2.
    NotApplicable,
}

impl Default for BarcodeMismatches {
    fn default() -> Self {
        BarcodeMismatches::Allowed(DEFAULT_BARCODE_MISMATCHES)
    }
}

impl fmt::Display for BarcodeMismatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarcodeMismatches::Allowed(n) => write!(f, "{n}"),
            BarcodeMismatches::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

impl FromStr for BarcodeMismatches {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            NOT_APPLICABLE => Ok(BarcodeMismatches::NotApplicable),
            "0" => Ok(BarcodeMismatches::Allowed(0)),
            "1" => Ok(BarcodeMismatches::Allowed(1)),
            "2" => Ok(BarcodeMismatches::Allowed(2)),
            other => Err(FormatError::InvalidField {
                section: "Data",
                field: "BarcodeMismatches".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Number of differing positions over the common prefix of `a` and `b`.
/// Bases past the end of the shorter sequence are not counted, so an 8 bp
/// index and its 10 bp padded form are at distance 0.
pub fn hamming_distance(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).filter(|(x, y)| x != y).count()
}

/// The indexes of one sample as seen by the other samples of its lane.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IndexPeer {
    pub sample_id: String,
    pub index: String,
    pub index2: String,
}

fn tolerance<'a>(
    sample_id: &str,
    sequence: &str,
    lane_samples: &'a [IndexPeer],
    peer_sequence: impl Fn(&'a IndexPeer) -> &'a str,
) -> Result<BarcodeMismatches, ComparisonError> {
    if lane_samples.is_empty() {
        return Err(ComparisonError {
            sample_id: sample_id.to_string(),
        });
    }
    let too_close = lane_samples
        .iter()
        .filter(|peer| peer.sample_id != sample_id)
        .any(|peer| hamming_distance(sequence, peer_sequence(peer)) < MINIMUM_HAMMING_DISTANCE);
    if too_close {
        Ok(BarcodeMismatches::Allowed(0))
    } else {
        Ok(BarcodeMismatches::default())
    }
}

/// Index 1 tolerance of `sample_id` against every sample of its lane.
/// `lane_samples` may include the sample itself, which is skipped.
pub fn barcode_mismatches_index1(
    sample_id: &str,
    index: &str,
    lane_samples: &[IndexPeer],
) -> Result<BarcodeMismatches, ComparisonError> {
    tolerance(sample_id, index, lane_samples, |peer| peer.index.as_str())
}

/// Index 2 tolerance, comparing index 2 sequences as they are stored.
pub fn barcode_mismatches_index2(
    sample_id: &str,
    index2: &str,
    lane_samples: &[IndexPeer],
) -> Result<BarcodeMismatches, ComparisonError> {
    if index2.is_empty() {
        if lane_samples.is_empty() {
            return Err(ComparisonError {
                sample_id: sample_id.to_string(),
            });
        }
        return Ok(BarcodeMismatches::NotApplicable);
    }
    tolerance(sample_id, index2, lane_samples, |peer| peer.index2.as_str())
}
