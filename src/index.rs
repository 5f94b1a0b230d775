// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Reference table of valid sample index sequences, and the sequence-level
//! operations applied to sample indexes: reverse complement, dual-index
//! detection and padding of 8 bp indexes to 10 bp.

use crate::error::{FormatError, SequenceError};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Separator between index 1 and index 2 in a raw dual index.
pub const INDEX_SEPARATOR: char = '-';

/// Appended to an 8 bp index 1 on a 10 cycle run.
pub const INDEX_ONE_PAD_SEQUENCE: &str = "AT";
/// Added to an 8 bp index 2 on a 10 cycle run.
pub const INDEX_TWO_PAD_SEQUENCE: &str = "AC";

pub const SHORT_SAMPLE_INDEX_LENGTH: usize = 8;
pub const LONG_SAMPLE_INDEX_LENGTH: usize = 10;

const UPPER_ACGT: &[u8; 4] = b"ACGT";

const PACKAGED_INDEXES: &str = include_str!("../resources/indexes.csv");

lazy_static! {
    static ref INDEX_TABLE: IndexTable = IndexTable::from_csv_str(PACKAGED_INDEXES)
        .unwrap_or_else(|e| panic!("packaged index table is invalid: {e}"));
}

/// One named sample index from the reference table. The sequence is either a
/// single index or a dual index written as `IDX1-IDX2`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct IndexEntry {
    pub name: String,
    pub sequence: String,
}

impl IndexEntry {
    pub fn is_dual_index(&self) -> bool {
        is_dual_index(&self.sequence)
    }
}

/// The set of sample indexes the lab may put on a flow cell.
#[derive(Clone, Debug, Default)]
pub struct IndexTable {
    entries: Vec<IndexEntry>,
}

impl IndexTable {
    /// Build a table from `name,sequence` CSV text with a header row. Every
    /// sequence is checked to contain only `ACGT` around the dual separator.
    pub fn from_csv_str(csv_text: &str) -> Result<IndexTable, FormatError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());
        let mut entries = Vec::new();
        for (row, record) in reader.deserialize::<IndexEntry>().enumerate() {
            let entry = record.map_err(|e| FormatError::InvalidField {
                section: "index table",
                field: format!("row {}", row + 1),
                value: e.to_string(),
            })?;
            for part in entry.sequence.split(INDEX_SEPARATOR) {
                if ensure_acgt(part).is_err() || part.is_empty() {
                    return Err(FormatError::InvalidField {
                        section: "index table",
                        field: entry.name.clone(),
                        value: entry.sequence.clone(),
                    });
                }
            }
            entries.push(entry);
        }
        Ok(IndexTable { entries })
    }

    /// The table packaged with the crate, parsed once on first use.
    pub fn packaged() -> &'static IndexTable {
        &INDEX_TABLE
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Reference indexes, optionally restricted to dual indexes.
    pub fn valid_indexes(&self, dual_indexes_only: bool) -> impl Iterator<Item = &IndexEntry> {
        self.entries
            .iter()
            .filter(move |e| !dual_indexes_only || e.is_dual_index())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check that `seq` contains only upper case `ACGT`, reporting the first
/// offending character otherwise.
pub fn ensure_acgt(seq: &str) -> Result<(), SequenceError> {
    match seq
        .char_indices()
        .find(|(_, c)| !c.is_ascii() || !UPPER_ACGT.contains(&(*c as u8)))
    {
        None => Ok(()),
        Some((position, invalid)) => Err(SequenceError {
            invalid,
            position,
            sequence: seq.to_string(),
        }),
    }
}

/// Reverse complement of an `ACGT` sequence.
pub fn reverse_complement(seq: &str) -> Result<String, SequenceError> {
    ensure_acgt(seq)?;
    let rc = bio::alphabets::dna::revcomp(seq.as_bytes());
    // ensure_acgt guarantees ASCII
    Ok(rc.into_iter().map(char::from).collect())
}

/// A dual index has exactly two non-empty parts around the separator.
pub fn is_dual_index(index: &str) -> bool {
    let mut parts = index.split(INDEX_SEPARATOR);
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(i1), Some(i2), None) if !i1.is_empty() && !i2.is_empty()
    )
}

/// Padding applies to an 8 bp index sequenced with 10 cycles, never otherwise.
pub fn needs_padding(index_length: usize, mandated_length: Option<u32>) -> bool {
    index_length == SHORT_SAMPLE_INDEX_LENGTH
        && mandated_length == Some(LONG_SAMPLE_INDEX_LENGTH as u32)
}

pub fn pad_index_one(index: &str) -> String {
    format!("{index}{INDEX_ONE_PAD_SEQUENCE}")
}

/// Index 2 is padded on the side that is read last: in front of a reverse
/// complemented index, behind a forward one.
pub fn pad_index_two(index: &str, reverse_complement: bool) -> String {
    if reverse_complement {
        format!("{INDEX_TWO_PAD_SEQUENCE}{index}")
    } else {
        format!("{index}{INDEX_TWO_PAD_SEQUENCE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ACCTCTGT").unwrap(), "ACAGAGGT");
        assert_eq!(reverse_complement("GCCAAGGT").unwrap(), "ACCTTGGC");
        assert_eq!(reverse_complement("").unwrap(), "");
    }

    #[test]
    fn test_reverse_complement_rejects_ambiguity_codes() {
        assert_eq!(
            reverse_complement("ACGNT"),
            Err(SequenceError {
                invalid: 'N',
                position: 3,
                sequence: "ACGNT".to_string(),
            })
        );
        assert!(reverse_complement("acgt").is_err());
    }

    proptest! {
        #[test]
        fn prop_test_reverse_complement_involution(seq in "[ACGT]{0, 24}") {
            let rc = reverse_complement(&seq).unwrap();
            prop_assert_eq!(rc.len(), seq.len());
            prop_assert_eq!(reverse_complement(&rc).unwrap(), seq);
        }

        #[test]
        fn prop_test_padding_is_gated(len in 0usize..16, mandated in 0u32..16) {
            let expected = len == 8 && mandated == 10;
            prop_assert_eq!(needs_padding(len, Some(mandated)), expected);
            prop_assert!(!needs_padding(len, None));
            if expected {
                let index = "A".repeat(len);
                prop_assert!(!needs_padding(pad_index_one(&index).len(), Some(mandated)));
            }
        }
    }

    #[test]
    fn test_is_dual_index() {
        assert!(is_dual_index("ACAGCAAG-GCCAAGGT"));
        assert!(!is_dual_index("ACAGCAAG"));
        assert!(!is_dual_index("ACAGCAAG-"));
        assert!(!is_dual_index("-GCCAAGGT"));
        assert!(!is_dual_index("A-C-G"));
    }

    #[test]
    fn test_padding() {
        assert_eq!(pad_index_one("ACAGCAAG"), "ACAGCAAGAT");
        assert_eq!(pad_index_two("ACCTTGGC", true), "ACACCTTGGC");
        assert_eq!(pad_index_two("GCCAAGGT", false), "GCCAAGGTAC");
    }

    #[test]
    fn test_packaged_table() {
        let table = IndexTable::packaged();
        assert!(!table.is_empty());
        assert!(table.valid_indexes(true).count() < table.len());
        assert!(table.valid_indexes(true).all(|e| e.is_dual_index()));
        let first = &table.entries()[0];
        assert!(!first.name.is_empty());
    }

    #[test]
    fn test_table_rejects_invalid_sequence() {
        let csv = "name,sequence\nbad (ACGTN-ACGT),ACGTN-ACGT\n";
        assert!(IndexTable::from_csv_str(csv).is_err());
        let csv = "name,sequence\nok (ACGT-ACGT),ACGT-ACGT\n";
        assert_eq!(IndexTable::from_csv_str(csv).unwrap().len(), 1);
    }
}
