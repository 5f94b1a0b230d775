// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Error types raised while parsing run metadata, adapting sample indexes and
//! validating sample sheets. Nothing here is ever recovered from inside the
//! crate: a sheet with a single bad field must not reach the demultiplexer.

use crate::run_parameters::InstrumentFamily;

/// A required field of the run parameters document is missing or unparsable.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Could not parse the run parameters document: {0}")]
    Xml(#[from] serde_xml_rs::Error),

    #[error("Run parameters field '{field}' is missing for a {family} run")]
    MissingField {
        field: &'static str,
        family: InstrumentFamily,
    },

    #[error("Run parameters field '{field}' has an invalid value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Could not parse '{value}' as a dotted software version")]
    InvalidVersion { value: String },

    #[error(
        "Index read lengths differ (index 1: {index1_cycles} cycles, index 2: {index2_cycles} \
         cycles) on a {family} run, which only HiSeq2500 custom-index runs may do"
    )]
    AsymmetricIndexLength {
        index1_cycles: u32,
        index2_cycles: u32,
        family: InstrumentFamily,
    },
}

/// The run does not map onto a known index convention.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConventionError {
    #[error("Unknown reagent kit version '{code}', expected one of: {known}")]
    UnknownReagentKit { code: String, known: &'static str },

    #[error("Could not determine the instrument from the run parameters document")]
    UnrecognizedInstrument,

    #[error("A {family} run needs both a control software and a reagent kit version")]
    MissingVersions { family: InstrumentFamily },

    #[error("Unknown index settings '{name}' in the sample sheet header")]
    UnknownIndexSettings { name: String },
}

/// An index sequence contains a character outside of `ACGT`.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid character '{invalid}' at position {position} of index sequence '{sequence}'")]
pub struct SequenceError {
    pub invalid: char,
    pub position: usize,
    pub sequence: String,
}

/// Structural problems with a sample sheet or with the raw sample list.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Sample sheet is missing the {marker} section")]
    MissingSection { marker: &'static str },

    #[error("Sample sheet section {marker} is out of order, expected {expected}")]
    MisorderedSection {
        marker: &'static str,
        expected: &'static str,
    },

    #[error("Sample sheet [Reads] section is missing '{field}'")]
    MissingReadsField { field: &'static str },

    #[error("Sample sheet {section} field '{field}' has an invalid value '{value}'")]
    InvalidField {
        section: &'static str,
        field: String,
        value: String,
    },

    #[error("Sample sheet is missing the '{field}' row of the [Header] section")]
    MissingHeaderField { field: &'static str },

    #[error("Data section header is [{found}], expected [{expected}]")]
    DataHeaderMismatch { found: String, expected: String },

    #[error("Data row {row} has {found} columns, expected {expected}")]
    DataRowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Sample '{sample_id}' appears more than once in lane {lane}")]
    DuplicateSample { lane: u32, sample_id: String },

    #[error("Invalid sample id '{sample_id}'")]
    InvalidSampleId { sample_id: String },

    #[error("Invalid lane '{value}' for sample '{sample_id}'")]
    InvalidLane { sample_id: String, value: String },

    #[error("Sample sheet has no samples")]
    NoSamples,
}

/// An override cycles string disagrees with the run or with the sample's indexes.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum OverrideCyclesError {
    #[error("Sample {sample_id}: override cycles '{value}' must have four ';'-separated parts")]
    Malformed { sample_id: String, value: String },

    #[error("Sample {sample_id}: read cycles '{value}' do not match the run, expected '{expected}'")]
    Reads {
        sample_id: String,
        value: String,
        expected: String,
    },

    #[error("Sample {sample_id}: index 1 cycles '{value}' do not match index '{index}' on a {run_cycles} cycle run")]
    Index1 {
        sample_id: String,
        value: String,
        index: String,
        run_cycles: u32,
    },

    #[error("Sample {sample_id}: index 2 cycles '{value}' do not match index2 '{index2}' (run index 2 cycles: {run_cycles:?})")]
    Index2 {
        sample_id: String,
        value: String,
        index2: String,
        run_cycles: Option<u32>,
    },

    #[error("Sample {sample_id}: index '{index}' is longer than the {run_cycles} cycles of the run")]
    IndexTooLong {
        sample_id: String,
        index: String,
        run_cycles: u32,
    },
}

/// Barcode mismatches were resolved without any samples to compare against.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("No samples to compare against when resolving barcode mismatches for sample {sample_id}")]
pub struct ComparisonError {
    pub sample_id: String,
}

/// Outcome of validating a sample sheet, whoever authored it.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    OverrideCycles(#[from] OverrideCyclesError),
    #[error(transparent)]
    Convention(#[from] ConventionError),
}

/// Any failure while constructing a sample sheet.
#[derive(Debug, thiserror::Error)]
pub enum SampleSheetError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Convention(#[from] ConventionError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    OverrideCycles(#[from] OverrideCyclesError),
    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// The assembled sheet was rejected by the validator. This is a bug in the
    /// assembler, not a problem with the input.
    #[error("Constructed sample sheet failed validation: {0}")]
    SelfCheck(#[source] ValidationError),
}
