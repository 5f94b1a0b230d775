// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Sectioned sample sheets: the two dialects, the in-memory sheet model and
//! its CSV text form.

pub mod assembler;
pub mod override_cycles_validator;
pub mod validator;

use crate::error::FormatError;
use crate::run_parameters::InstrumentFamily;
use crate::sample::{Bcl2FastqSample, BclConvertSample, SampleSheetRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use assembler::SheetAssembler;
pub use validator::{SampleSheetValidator, ValidatedSheet};

pub const HEADER_MARKER: &str = "[Header]";
pub const READS_MARKER: &str = "[Reads]";
pub const BCL2FASTQ_SETTINGS_MARKER: &str = "[Settings]";
pub const BCL2FASTQ_DATA_MARKER: &str = "[Data]";
pub const BCL_CONVERT_SETTINGS_MARKER: &str = "[BCLConvert_Settings]";
pub const BCL_CONVERT_DATA_MARKER: &str = "[BCLConvert_Data]";

pub const FILE_FORMAT_VERSION: &str = "FileFormatVersion";
pub const RUN_NAME: &str = "RunName";
pub const INSTRUMENT_PLATFORM: &str = "InstrumentPlatform";
pub const INDEX_SETTINGS: &str = "IndexSettings";

pub const READ1_CYCLES: &str = "Read1Cycles";
pub const READ2_CYCLES: &str = "Read2Cycles";
pub const INDEX1_CYCLES: &str = "Index1Cycles";
pub const INDEX2_CYCLES: &str = "Index2Cycles";

pub const SOFTWARE_VERSION: &str = "SoftwareVersion";
pub const FASTQ_COMPRESSION_FORMAT: &str = "FastqCompressionFormat";
pub const ADAPTER: &str = "Adapter";
pub const ADAPTER_READ_2: &str = "AdapterRead2";

/// Sample sheet layouts understood by the two demultiplexers.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Dialect {
    /// bcl2fastq: padded indexes, no override cycles.
    Bcl2Fastq,
    /// BCL Convert: natural length indexes masked with override cycles.
    BclConvert,
}

impl Dialect {
    /// The dialect each instrument generation is demultiplexed with.
    pub fn default_for(family: InstrumentFamily) -> Dialect {
        match family {
            InstrumentFamily::HiSeqX | InstrumentFamily::HiSeq2500 => Dialect::Bcl2Fastq,
            InstrumentFamily::NovaSeq6000 | InstrumentFamily::NovaSeqX => Dialect::BclConvert,
        }
    }

    /// Detect the dialect from the Data section marker of `sheet`.
    pub fn detect(sheet: &SampleSheet) -> Option<Dialect> {
        if sheet.section(BCL_CONVERT_DATA_MARKER).is_some() {
            Some(Dialect::BclConvert)
        } else if sheet.section(BCL2FASTQ_DATA_MARKER).is_some() {
            Some(Dialect::Bcl2Fastq)
        } else {
            None
        }
    }

    pub fn settings_marker(self) -> &'static str {
        match self {
            Dialect::Bcl2Fastq => BCL2FASTQ_SETTINGS_MARKER,
            Dialect::BclConvert => BCL_CONVERT_SETTINGS_MARKER,
        }
    }

    pub fn data_marker(self) -> &'static str {
        match self {
            Dialect::Bcl2Fastq => BCL2FASTQ_DATA_MARKER,
            Dialect::BclConvert => BCL_CONVERT_DATA_MARKER,
        }
    }

    /// Section markers in the order they must appear.
    pub fn section_markers(self) -> [&'static str; 4] {
        [
            HEADER_MARKER,
            READS_MARKER,
            self.settings_marker(),
            self.data_marker(),
        ]
    }

    pub fn data_columns(self) -> &'static [&'static str] {
        match self {
            Dialect::Bcl2Fastq => Bcl2FastqSample::DATA_COLUMNS,
            Dialect::BclConvert => BclConvertSample::DATA_COLUMNS,
        }
    }

    pub fn file_format_version(self) -> u32 {
        match self {
            Dialect::Bcl2Fastq => 1,
            Dialect::BclConvert => 2,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Bcl2Fastq => f.write_str("bcl2fastq"),
            Dialect::BclConvert => f.write_str("BCL Convert"),
        }
    }
}

/// A `[Marker]` row followed by the rows of the section.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SheetSection {
    pub marker: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetSection {
    pub fn new(marker: impl Into<String>) -> SheetSection {
        SheetSection {
            marker: marker.into(),
            rows: Vec::new(),
        }
    }

    /// Append a `key,value` row.
    pub fn push_field(&mut self, key: &str, value: impl ToString) {
        self.rows.push(vec![key.to_string(), value.to_string()]);
    }

    /// Value of the first `key,value` row with the given key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.first().map(|k| k.trim()) == Some(key))
            .map(|row| row.get(1).map_or("", |v| v.trim()))
    }
}

/// Returns the marker if `row` is a section marker: a bracketed first cell
/// with nothing after it.
fn marker_of(row: &[String]) -> Option<&str> {
    let first = row.first()?.trim();
    let is_marker = first.len() > 2
        && first.starts_with('[')
        && first.ends_with(']')
        && row[1..].iter().all(|cell| cell.trim().is_empty());
    if is_marker {
        Some(first)
    } else {
        None
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct SampleSheet {
    pub sections: Vec<SheetSection>,
    /// Rows found before the first section marker.
    pub preamble: Vec<Vec<String>>,
}

impl SampleSheet {
    pub fn new(sections: Vec<SheetSection>) -> SampleSheet {
        SampleSheet {
            sections,
            preamble: Vec::new(),
        }
    }

    /// Group rows into sections. Blank rows are dropped.
    pub fn from_rows(rows: Vec<Vec<String>>) -> SampleSheet {
        let mut sheet = SampleSheet::default();
        for row in rows {
            if is_blank(&row) {
                continue;
            }
            if let Some(marker) = marker_of(&row) {
                sheet.sections.push(SheetSection::new(marker));
                continue;
            }
            match sheet.sections.last_mut() {
                Some(section) => section.rows.push(row),
                None => sheet.preamble.push(row),
            }
        }
        sheet
    }

    /// Split comma separated text into rows of cells. Rows may differ in width.
    pub fn rows_from_csv_str(text: &str) -> Result<Vec<Vec<String>>, FormatError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        reader
            .records()
            .enumerate()
            .map(|(line, record)| {
                record
                    .map(|r| r.iter().map(str::to_string).collect())
                    .map_err(|e| FormatError::InvalidField {
                        section: "sheet",
                        field: format!("row {}", line + 1),
                        value: e.to_string(),
                    })
            })
            .collect()
    }

    pub fn from_csv_str(text: &str) -> Result<SampleSheet, FormatError> {
        Ok(SampleSheet::from_rows(SampleSheet::rows_from_csv_str(text)?))
    }

    pub fn section(&self, marker: &str) -> Option<&SheetSection> {
        self.sections.iter().find(|s| s.marker == marker)
    }

    /// The sheet as rows of cells, marker rows included.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let mut rows = self.preamble.clone();
        for section in &self.sections {
            rows.push(vec![section.marker.clone()]);
            rows.extend(section.rows.iter().cloned());
        }
        rows
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        for row in self.to_rows() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating sample sheet {}", path.display()))?;
        self.write_csv(std::io::BufWriter::new(file))
            .with_context(|| format!("writing sample sheet {}", path.display()))
    }
}
