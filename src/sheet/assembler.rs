// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Build a complete sample sheet for one flow cell from the run parameters and
//! the samples requested per lane.

use super::validator::SampleSheetValidator;
use super::{
    Dialect, SampleSheet, SheetSection, ADAPTER, ADAPTER_READ_2, FASTQ_COMPRESSION_FORMAT,
    FILE_FORMAT_VERSION, HEADER_MARKER, INDEX1_CYCLES, INDEX2_CYCLES, INDEX_SETTINGS,
    INSTRUMENT_PLATFORM, READ1_CYCLES, READ2_CYCLES, READS_MARKER, RUN_NAME, SOFTWARE_VERSION,
};
use crate::convention::IndexSettings;
use crate::error::{FormatError, SampleSheetError};
use crate::index::{IndexEntry, IndexTable, INDEX_SEPARATOR};
use crate::parameters::SheetParameters;
use crate::run_parameters::RunMetadata;
use crate::sample::barcode_mismatch::IndexPeer;
use crate::sample::{
    BclConvertSample, Bcl2FastqSample, ProcessingContext, RawSampleIndex, SampleSheetRecord,
};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// True if one of `a` and `b` is a prefix of the other.
fn prefix_match(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn split_index(index: &str) -> (&str, &str) {
    index.split_once(INDEX_SEPARATOR).unwrap_or((index, ""))
}

pub struct SheetAssembler<'a> {
    run: &'a RunMetadata,
    samples: Vec<RawSampleIndex>,
    dialect: Dialect,
    parameters: &'a SheetParameters,
    index_table: &'a IndexTable,
}

impl<'a> SheetAssembler<'a> {
    pub fn new(
        run: &'a RunMetadata,
        samples: Vec<RawSampleIndex>,
        dialect: Dialect,
        parameters: &'a SheetParameters,
    ) -> SheetAssembler<'a> {
        SheetAssembler {
            run,
            samples,
            dialect,
            parameters,
            index_table: IndexTable::packaged(),
        }
    }

    /// Draw filler samples from `index_table` instead of the packaged table.
    pub fn with_index_table(mut self, index_table: &'a IndexTable) -> SheetAssembler<'a> {
        self.index_table = index_table;
        self
    }

    /// Build, serialize and validate the sample sheet.
    pub fn construct(mut self) -> Result<SampleSheet, SampleSheetError> {
        info!(
            "constructing {} sample sheet for {} samples on a {} run",
            self.dialect,
            self.samples.len(),
            self.run.instrument_family
        );
        self.check_duplicates()?;
        if self.parameters.add_dummy_samples {
            self.add_dummy_samples();
        }
        self.remove_unwanted_samples();
        if self.samples.is_empty() {
            return Err(FormatError::NoSamples.into());
        }

        let settings = self.run.index_settings()?;
        let data = match self.dialect {
            Dialect::Bcl2Fastq => {
                let records: Vec<Bcl2FastqSample> = self.adapt_indexes(settings)?;
                data_section(self.dialect, &records)
            }
            Dialect::BclConvert => {
                let mut records: Vec<BclConvertSample> = self.adapt_indexes(settings)?;
                resolve_barcode_mismatches(&mut records)?;
                data_section(self.dialect, &records)
            }
        };

        let sheet = SampleSheet::new(vec![
            self.header_section(settings),
            self.reads_section(),
            self.settings_section(),
            data,
        ]);

        SampleSheetValidator::new(sheet.to_rows())
            .validate()
            .map_err(SampleSheetError::SelfCheck)?;
        Ok(sheet)
    }

    /// Reject repeated (lane, sample id) pairs.
    fn check_duplicates(&self) -> Result<(), FormatError> {
        let mut seen = HashSet::new();
        for sample in &self.samples {
            if !seen.insert((sample.lane, sample.sample_id.as_str())) {
                return Err(FormatError::DuplicateSample {
                    lane: sample.lane,
                    sample_id: sample.sample_id.clone(),
                });
            }
        }
        Ok(())
    }

    fn fits_run(&self, entry: &IndexEntry) -> bool {
        let (index, index2) = split_index(&entry.sequence);
        let index1_fits = index.len() <= self.run.index1_cycles as usize;
        let index2_fits = self
            .run
            .index2_cycles
            .map_or(true, |cycles| index2.len() <= cycles as usize);
        index1_fits && index2_fits
    }

    /// Fill every lane with a sample for each dual reference index that fits
    /// the run and is not already used in that lane. Reads assigned to these
    /// samples reveal index hopping and contamination.
    pub fn add_dummy_samples(&mut self) {
        let single_index = self.run.is_single_index();
        let is_used = |used: &[(String, String)], index: &str, index2: &str| {
            used.iter().any(|(u1, u2)| {
                prefix_match(u1, index) && (single_index || prefix_match(u2, index2))
            })
        };

        let lanes: Vec<u32> = self.samples.iter().map(|s| s.lane).unique().sorted().collect();
        let index_table = self.index_table;
        let candidates: Vec<&IndexEntry> = index_table
            .valid_indexes(true)
            .filter(|entry| self.fits_run(entry))
            .collect();

        let mut dummies = Vec::new();
        for lane in lanes {
            let mut used: Vec<(String, String)> = self
                .samples
                .iter()
                .filter(|s| s.lane == lane)
                .map(|s| {
                    let (index, index2) = split_index(&s.index);
                    (index.to_string(), index2.to_string())
                })
                .collect();
            let before = dummies.len();
            for entry in &candidates {
                let (index, index2) = split_index(&entry.sequence);
                if is_used(&used, index, index2) {
                    continue;
                }
                used.push((index.to_string(), index2.to_string()));
                dummies.push(RawSampleIndex::dummy(lane, entry));
            }
            debug!("lane {lane}: added {} dummy samples", dummies.len() - before);
        }
        info!("added {} dummy samples", dummies.len());
        self.samples.extend(dummies);
    }

    /// Drop samples without a dual index; they cannot be placed on a dual
    /// index flow cell next to other samples.
    pub fn remove_unwanted_samples(&mut self) {
        self.samples.retain(|sample| {
            let keep = sample.is_dual_index();
            if !keep {
                warn!(
                    "removing sample {} from lane {}: index '{}' is not a dual index",
                    sample.sample_id, sample.lane, sample.index
                );
            }
            keep
        });
    }

    /// Separate and adapt the indexes of every sample for the dialect `R`.
    fn adapt_indexes<R: SampleSheetRecord>(
        &self,
        settings: IndexSettings,
    ) -> Result<Vec<R>, SampleSheetError> {
        debug!("adapting indexes with {settings} index settings");
        let context = ProcessingContext {
            run: self.run,
            settings,
            parameters: self.parameters,
        };
        let single_index = self.run.is_single_index();
        self.samples
            .iter()
            .cloned()
            .map(|sample| {
                let separated = sample.separate_indexes(single_index)?;
                R::process_indexes(separated, &context)
            })
            .collect()
    }

    fn header_section(&self, settings: IndexSettings) -> SheetSection {
        let run_name = self
            .parameters
            .run_name
            .clone()
            .or_else(|| self.run.run_id.clone())
            .unwrap_or_default();
        let mut header = SheetSection::new(HEADER_MARKER);
        header.push_field(FILE_FORMAT_VERSION, self.dialect.file_format_version());
        header.push_field(RUN_NAME, run_name);
        header.push_field(INSTRUMENT_PLATFORM, self.run.instrument_family);
        header.push_field(INDEX_SETTINGS, settings);
        header
    }

    fn reads_section(&self) -> SheetSection {
        let mut reads = SheetSection::new(READS_MARKER);
        reads.push_field(READ1_CYCLES, self.run.read1_cycles);
        reads.push_field(READ2_CYCLES, self.run.read2_cycles);
        reads.push_field(INDEX1_CYCLES, self.run.index1_cycles);
        if let Some(index2_cycles) = self.run.index2_cycles {
            reads.push_field(INDEX2_CYCLES, index2_cycles);
        }
        reads
    }

    fn settings_section(&self) -> SheetSection {
        let mut settings = SheetSection::new(self.dialect.settings_marker());
        match self.dialect {
            Dialect::Bcl2Fastq => {
                settings.push_field(ADAPTER, &self.parameters.adapter_read_1);
                settings.push_field(ADAPTER_READ_2, &self.parameters.adapter_read_2);
            }
            Dialect::BclConvert => {
                settings.push_field(SOFTWARE_VERSION, &self.parameters.software_version);
                settings.push_field(
                    FASTQ_COMPRESSION_FORMAT,
                    &self.parameters.fastq_compression_format,
                );
            }
        }
        settings
    }
}

/// Resolve mismatch tolerances lane by lane against a snapshot of the lane.
fn resolve_barcode_mismatches(records: &mut [BclConvertSample]) -> Result<(), SampleSheetError> {
    let lanes: HashMap<u32, Vec<IndexPeer>> = records
        .iter()
        .map(|r| (r.lane, r.index_peer()))
        .into_group_map();
    for record in records.iter_mut() {
        let peers = lanes.get(&record.lane).map_or(&[][..], Vec::as_slice);
        record.update_barcode_mismatches(peers)?;
    }
    Ok(())
}

/// The Data section: column header, then one row per record ordered by lane.
fn data_section<R: SampleSheetRecord>(dialect: Dialect, records: &[R]) -> SheetSection {
    let mut data = SheetSection::new(dialect.data_marker());
    data.rows
        .push(R::DATA_COLUMNS.iter().map(|c| c.to_string()).collect());
    data.rows.extend(
        records
            .iter()
            .sorted_by_key(|r| r.lane())
            .map(|r| r.to_data_row()),
    );
    data
}
