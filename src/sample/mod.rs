// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Sample records, from the raw `(lane, sample id, index)` triple handed in by
//! the LIMS to the typed Data rows of a sample sheet.
//!
//! A sample moves through distinct types: `RawSampleIndex` ->
//! `SeparatedSample` -> one of the dialect records implementing
//! `SampleSheetRecord`. Override cycles and barcode mismatches only exist on
//! `BclConvertSample`, so they cannot be computed on an unseparated index.

pub mod barcode_mismatch;
pub mod bcl2fastq;
pub mod bcl_convert;
pub mod override_cycles;

use crate::convention::IndexSettings;
use crate::error::{FormatError, SampleSheetError, SequenceError};
use crate::index::{ensure_acgt, is_dual_index, IndexEntry, INDEX_SEPARATOR};
use crate::parameters::SheetParameters;
use crate::run_parameters::RunMetadata;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use bcl2fastq::Bcl2FastqSample;
pub use bcl_convert::BclConvertSample;

/// Project and name of the filler samples added for unused reference indexes.
pub const DUMMY_SAMPLE_PROJECT: &str = "indexcheck";
pub const DUMMY_SAMPLE_NAME: &str = "indexcheck";

lazy_static! {
    /// LIMS sample ids: three letters, three digits, then any alphanumerics.
    static ref SAMPLE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z]{3}\d{3}[A-Za-z0-9]*$").unwrap();
    /// Any id a demultiplexer accepts, filler samples included.
    static ref SHEET_SAMPLE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// A sample as requested for a lane, with its index still in raw
/// `IDX1-IDX2` (or single `IDX1`) form.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct RawSampleIndex {
    pub lane: u32,
    pub sample_id: String,
    pub sample_name: String,
    pub project: String,
    pub index: String,
}

impl RawSampleIndex {
    pub fn new(
        lane: u32,
        sample_id: impl Into<String>,
        index: impl Into<String>,
    ) -> Result<RawSampleIndex, FormatError> {
        let sample_id = sample_id.into();
        if lane == 0 {
            return Err(FormatError::InvalidLane {
                sample_id,
                value: lane.to_string(),
            });
        }
        if !SAMPLE_ID_REGEX.is_match(&sample_id) {
            return Err(FormatError::InvalidSampleId { sample_id });
        }
        Ok(RawSampleIndex {
            lane,
            sample_name: sample_id.clone(),
            sample_id,
            project: String::new(),
            index: index.into(),
        })
    }

    pub fn with_name_and_project(
        mut self,
        sample_name: impl Into<String>,
        project: impl Into<String>,
    ) -> RawSampleIndex {
        self.sample_name = sample_name.into();
        self.project = project.into();
        self
    }

    /// A filler sample occupying reference index `entry` in `lane`.
    pub fn dummy(lane: u32, entry: &IndexEntry) -> RawSampleIndex {
        RawSampleIndex {
            lane,
            sample_id: dummy_sample_id(&entry.name),
            sample_name: DUMMY_SAMPLE_NAME.to_string(),
            project: DUMMY_SAMPLE_PROJECT.to_string(),
            index: entry.sequence.clone(),
        }
    }

    pub fn is_dual_index(&self) -> bool {
        is_dual_index(&self.index)
    }

    pub fn is_dummy(&self) -> bool {
        self.project == DUMMY_SAMPLE_PROJECT
    }

    /// Split the raw index into index 1 and index 2. Index 2 is dropped on a
    /// single-index run.
    pub fn separate_indexes(
        self,
        is_single_index_run: bool,
    ) -> Result<SeparatedSample, SequenceError> {
        let (index, index2) = match self.index.split_once(INDEX_SEPARATOR) {
            Some((index, index2)) => (index.to_string(), index2.to_string()),
            None => (self.index.clone(), String::new()),
        };
        ensure_acgt(&index)?;
        ensure_acgt(&index2)?;
        let index2 = if is_single_index_run {
            String::new()
        } else {
            index2
        };
        Ok(SeparatedSample {
            lane: self.lane,
            sample_id: self.sample_id,
            sample_name: self.sample_name,
            project: self.project,
            index,
            index2,
        })
    }
}

/// Reference index names look like `A01 - D701-D501 (ATTACTCG-TATAGCCT)`.
pub fn dummy_sample_id(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '(' | ')' => '-',
            c => c,
        })
        .collect()
}

/// A sample whose index 1 and index 2 are stored apart, still in the
/// orientation they were ordered with.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SeparatedSample {
    pub lane: u32,
    pub sample_id: String,
    pub sample_name: String,
    pub project: String,
    pub index: String,
    /// Empty for single-indexed samples and on single-index runs.
    pub index2: String,
}

/// Run-wide inputs needed to turn a `SeparatedSample` into a sheet record.
#[derive(Clone, Copy, Debug)]
pub struct ProcessingContext<'a> {
    pub run: &'a RunMetadata,
    pub settings: IndexSettings,
    pub parameters: &'a SheetParameters,
}

/// One Data row of a sample sheet dialect.
pub trait SampleSheetRecord: Sized {
    /// Header row of the Data section, in column order.
    const DATA_COLUMNS: &'static [&'static str];

    /// Bring the indexes of `sample` into the form the demultiplexer expects.
    fn process_indexes(
        sample: SeparatedSample,
        context: &ProcessingContext<'_>,
    ) -> Result<Self, SampleSheetError>;

    fn lane(&self) -> u32;
    fn sample_id(&self) -> &str;
    fn index(&self) -> &str;
    fn index2(&self) -> &str;

    fn to_data_row(&self) -> Vec<String>;
    fn from_data_row(row: &[String]) -> Result<Self, FormatError>;
}

pub(crate) fn check_row_width(row: &[String], expected: usize) -> Result<(), FormatError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(FormatError::DataRowWidth {
            row: 0,
            found: row.len(),
            expected,
        })
    }
}

pub(crate) fn parse_sample_id(value: &str) -> Result<String, FormatError> {
    let sample_id = value.trim();
    if SHEET_SAMPLE_ID_REGEX.is_match(sample_id) {
        Ok(sample_id.to_string())
    } else {
        Err(FormatError::InvalidSampleId {
            sample_id: sample_id.to_string(),
        })
    }
}

pub(crate) fn parse_lane(sample_id: &str, value: &str) -> Result<u32, FormatError> {
    match value.trim().parse::<u32>() {
        Ok(lane) if lane > 0 => Ok(lane),
        _ => Err(FormatError::InvalidLane {
            sample_id: sample_id.to_string(),
            value: value.to_string(),
        }),
    }
}

pub(crate) fn parse_index(field: &str, value: &str) -> Result<String, FormatError> {
    let index = value.trim();
    ensure_acgt(index).map_err(|_| FormatError::InvalidField {
        section: "Data",
        field: field.to_string(),
        value: value.to_string(),
    })?;
    Ok(index.to_string())
}
