// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Validation of sample sheet text, whether written by `SheetAssembler` or by
//! hand. The dialect is detected from the Data section marker.

use super::override_cycles_validator::OverrideCyclesValidator;
use super::{
    Dialect, SampleSheet, SheetSection, BCL_CONVERT_DATA_MARKER, HEADER_MARKER, INDEX1_CYCLES,
    INDEX2_CYCLES, INDEX_SETTINGS, READ1_CYCLES, READ2_CYCLES, READS_MARKER,
};
use crate::convention::IndexSettings;
use crate::error::{FormatError, ValidationError};
use crate::sample::{Bcl2FastqSample, BclConvertSample, SampleSheetRecord};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read and index lengths declared in the `[Reads]` section.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct SheetCycles {
    pub read1_cycles: u32,
    pub read2_cycles: u32,
    pub index1_cycles: u32,
    /// `None` when the sheet declares no `Index2Cycles`.
    pub index2_cycles: Option<u32>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ValidatedSamples {
    Bcl2Fastq(Vec<Bcl2FastqSample>),
    BclConvert(Vec<BclConvertSample>),
}

impl ValidatedSamples {
    pub fn len(&self) -> usize {
        match self {
            ValidatedSamples::Bcl2Fastq(samples) => samples.len(),
            ValidatedSamples::BclConvert(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A sample sheet that passed every check.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ValidatedSheet {
    pub dialect: Dialect,
    pub cycles: SheetCycles,
    pub index_settings: Option<IndexSettings>,
    pub samples: ValidatedSamples,
}

pub struct SampleSheetValidator {
    sheet: SampleSheet,
}

fn positive_cycles(
    reads: &SheetSection,
    field: &'static str,
) -> Result<Option<u32>, FormatError> {
    match reads.field(field) {
        None => Ok(None),
        Some(value) => match value.parse::<u32>() {
            Ok(0) if field == INDEX2_CYCLES => Ok(None),
            Ok(cycles) if cycles > 0 => Ok(Some(cycles)),
            _ => Err(FormatError::InvalidField {
                section: READS_MARKER,
                field: field.to_string(),
                value: value.to_string(),
            }),
        },
    }
}

fn required_cycles(reads: &SheetSection, field: &'static str) -> Result<u32, FormatError> {
    positive_cycles(reads, field)?.ok_or(FormatError::MissingReadsField { field })
}

impl SampleSheetValidator {
    /// Validate `content`, the sheet as rows of cells.
    pub fn new(content: Vec<Vec<String>>) -> SampleSheetValidator {
        SampleSheetValidator {
            sheet: SampleSheet::from_rows(content),
        }
    }

    pub fn from_csv_str(text: &str) -> Result<SampleSheetValidator, FormatError> {
        Ok(SampleSheetValidator::new(SampleSheet::rows_from_csv_str(
            text,
        )?))
    }

    fn section(&self, marker: &'static str) -> Result<&SheetSection, FormatError> {
        self.sheet
            .section(marker)
            .ok_or(FormatError::MissingSection { marker })
    }

    /// Detect the dialect and require its four sections, in order, with
    /// nothing before the first one.
    pub fn validate_all_sections_present(&self) -> Result<Dialect, FormatError> {
        if let Some(row) = self.sheet.preamble.first() {
            return Err(FormatError::InvalidField {
                section: "sheet",
                field: "row 1".to_string(),
                value: row.join(","),
            });
        }
        let dialect = Dialect::detect(&self.sheet).ok_or(FormatError::MissingSection {
            marker: BCL_CONVERT_DATA_MARKER,
        })?;

        let mut previous: Option<(&'static str, usize)> = None;
        for marker in dialect.section_markers() {
            let position = self
                .sheet
                .sections
                .iter()
                .position(|s| s.marker == marker)
                .ok_or(FormatError::MissingSection { marker })?;
            if let Some((expected, previous_position)) = previous {
                if position < previous_position {
                    return Err(FormatError::MisorderedSection { marker, expected });
                }
            }
            previous = Some((marker, position));
        }
        debug!("validating {dialect} sample sheet");
        Ok(dialect)
    }

    /// Read and index cycles from `[Reads]`. `Index2Cycles` may be absent.
    pub fn set_cycles(&self) -> Result<SheetCycles, FormatError> {
        let reads = self.section(READS_MARKER)?;
        Ok(SheetCycles {
            read1_cycles: required_cycles(reads, READ1_CYCLES)?,
            read2_cycles: required_cycles(reads, READ2_CYCLES)?,
            index1_cycles: required_cycles(reads, INDEX1_CYCLES)?,
            index2_cycles: positive_cycles(reads, INDEX2_CYCLES)?,
        })
    }

    /// The `IndexSettings` row of `[Header]`, if present.
    pub fn index_settings(&self) -> Result<Option<IndexSettings>, ValidationError> {
        let header = self.section(HEADER_MARKER)?;
        match header.field(INDEX_SETTINGS) {
            None => Ok(None),
            Some(name) => Ok(Some(name.parse()?)),
        }
    }

    /// Parse every Data row into `R`. The header row must list the dialect's
    /// columns and no (lane, sample id) pair may repeat.
    pub fn validate_samples<R: SampleSheetRecord>(
        &self,
        dialect: Dialect,
    ) -> Result<Vec<R>, FormatError> {
        let data = self
            .sheet
            .section(dialect.data_marker())
            .ok_or(FormatError::MissingSection {
                marker: dialect.data_marker(),
            })?;
        let expected = R::DATA_COLUMNS;
        let (header, rows) = data.rows.split_first().ok_or(FormatError::NoSamples)?;
        let found: Vec<&str> = header.iter().map(|c| c.trim()).collect();
        if found.as_slice() != expected {
            return Err(FormatError::DataHeaderMismatch {
                found: found.join(","),
                expected: expected.join(","),
            });
        }
        if rows.is_empty() {
            return Err(FormatError::NoSamples);
        }

        let mut seen = HashSet::new();
        let mut samples = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected.len() {
                return Err(FormatError::DataRowWidth {
                    row: i + 1,
                    found: row.len(),
                    expected: expected.len(),
                });
            }
            let sample = R::from_data_row(row)?;
            if !seen.insert((sample.lane(), sample.sample_id().to_string())) {
                return Err(FormatError::DuplicateSample {
                    lane: sample.lane(),
                    sample_id: sample.sample_id().to_string(),
                });
            }
            samples.push(sample);
        }
        Ok(samples)
    }

    pub fn validate_override_cycles(
        &self,
        samples: &[BclConvertSample],
        cycles: SheetCycles,
        settings: IndexSettings,
    ) -> Result<(), ValidationError> {
        let validator = OverrideCyclesValidator::new(cycles, settings);
        for sample in samples {
            validator.validate(sample)?;
        }
        Ok(())
    }

    pub fn validate(self) -> Result<ValidatedSheet, ValidationError> {
        let dialect = self.validate_all_sections_present()?;
        let cycles = self.set_cycles()?;
        let index_settings = self.index_settings()?;

        let samples = match dialect {
            Dialect::Bcl2Fastq => ValidatedSamples::Bcl2Fastq(self.validate_samples(dialect)?),
            Dialect::BclConvert => {
                let settings = index_settings.ok_or(FormatError::MissingHeaderField {
                    field: INDEX_SETTINGS,
                })?;
                let samples = self.validate_samples(dialect)?;
                self.validate_override_cycles(&samples, cycles, settings)?;
                ValidatedSamples::BclConvert(samples)
            }
        };

        Ok(ValidatedSheet {
            dialect,
            cycles,
            index_settings,
            samples,
        })
    }
}
