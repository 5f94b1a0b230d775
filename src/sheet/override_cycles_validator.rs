// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Check that the `Override_Cycles` of every BCL Convert sample agrees with the
//! run's cycles and with the sample's own indexes.

use super::validator::SheetCycles;
use crate::convention::{IndexSettings, OverrideDirection};
use crate::error::OverrideCyclesError;
use crate::sample::override_cycles::{read_cycles_part, OVERRIDE_CYCLES_SEPARATOR};
use crate::sample::BclConvertSample;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FULL_INDEX: Regex = Regex::new(r"^I(\d+)$").unwrap();
    static ref INDEX_THEN_SKIP: Regex = Regex::new(r"^I(\d+)N(\d+)$").unwrap();
    static ref SKIP_THEN_INDEX: Regex = Regex::new(r"^N(\d+)I(\d+)$").unwrap();
    static ref SKIP_ONLY: Regex = Regex::new(r"^N(\d+)$").unwrap();
}

fn capture(re: &Regex, part: &str, group: usize) -> Option<u32> {
    re.captures(part)?.get(group)?.as_str().parse().ok()
}

/// Index cycles (`I`, `N`) written by an index part, or `None` if the part has
/// the wrong shape for `direction`.
fn index_part_cycles(part: &str, direction: OverrideDirection) -> Option<(u32, u32)> {
    if let Some(index) = capture(&FULL_INDEX, part, 1) {
        return Some((index, 0));
    }
    if let Some(skip) = capture(&SKIP_ONLY, part, 1) {
        return Some((0, skip));
    }
    match direction {
        OverrideDirection::Forward => Some((
            capture(&INDEX_THEN_SKIP, part, 1)?,
            capture(&INDEX_THEN_SKIP, part, 2)?,
        )),
        OverrideDirection::Reverse => Some((
            capture(&SKIP_THEN_INDEX, part, 2)?,
            capture(&SKIP_THEN_INDEX, part, 1)?,
        )),
    }
}

fn matches_index(part: &str, index: &str, run_cycles: u32, direction: OverrideDirection) -> bool {
    match index_part_cycles(part, direction) {
        Some((index_cycles, skipped)) => {
            index_cycles as usize == index.len()
                && index_cycles.checked_add(skipped) == Some(run_cycles)
        }
        None => false,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OverrideCyclesValidator {
    cycles: SheetCycles,
    index2_direction: OverrideDirection,
}

impl OverrideCyclesValidator {
    pub fn new(cycles: SheetCycles, settings: IndexSettings) -> OverrideCyclesValidator {
        OverrideCyclesValidator {
            cycles,
            index2_direction: settings.index2_override_direction(),
        }
    }

    pub fn validate(&self, sample: &BclConvertSample) -> Result<(), OverrideCyclesError> {
        let value = &sample.override_cycles;
        let parts: Vec<&str> = value.split(OVERRIDE_CYCLES_SEPARATOR).collect();
        let [read1, index1, index2, read2] = parts[..] else {
            return Err(OverrideCyclesError::Malformed {
                sample_id: sample.sample_id.clone(),
                value: value.clone(),
            });
        };
        self.validate_reads(sample, read1, read2)?;
        self.validate_index1(sample, index1)?;
        self.validate_index2(sample, index2)
    }

    fn validate_reads(
        &self,
        sample: &BclConvertSample,
        read1: &str,
        read2: &str,
    ) -> Result<(), OverrideCyclesError> {
        let expected1 = read_cycles_part(self.cycles.read1_cycles);
        let expected2 = read_cycles_part(self.cycles.read2_cycles);
        if read1 != expected1 || read2 != expected2 {
            return Err(OverrideCyclesError::Reads {
                sample_id: sample.sample_id.clone(),
                value: format!("{read1}{OVERRIDE_CYCLES_SEPARATOR}{read2}"),
                expected: format!("{expected1}{OVERRIDE_CYCLES_SEPARATOR}{expected2}"),
            });
        }
        Ok(())
    }

    /// Index 1 is always written index first.
    fn validate_index1(
        &self,
        sample: &BclConvertSample,
        part: &str,
    ) -> Result<(), OverrideCyclesError> {
        let run_cycles = self.cycles.index1_cycles;
        let valid = !sample.index.is_empty()
            && matches_index(part, &sample.index, run_cycles, OverrideDirection::Forward);
        if valid {
            Ok(())
        } else {
            Err(OverrideCyclesError::Index1 {
                sample_id: sample.sample_id.clone(),
                value: part.to_string(),
                index: sample.index.clone(),
                run_cycles,
            })
        }
    }

    /// Index 2 is empty on single-index runs, `N<n>` for a sample without
    /// index 2, and otherwise follows the direction of the index settings.
    fn validate_index2(
        &self,
        sample: &BclConvertSample,
        part: &str,
    ) -> Result<(), OverrideCyclesError> {
        let valid = match self.cycles.index2_cycles {
            None => part.is_empty() && sample.index2.is_empty(),
            Some(run_cycles) if sample.index2.is_empty() => {
                capture(&SKIP_ONLY, part, 1) == Some(run_cycles)
            }
            Some(run_cycles) => {
                matches_index(part, &sample.index2, run_cycles, self.index2_direction)
            }
        };
        if valid {
            Ok(())
        } else {
            Err(OverrideCyclesError::Index2 {
                sample_id: sample.sample_id.clone(),
                value: part.to_string(),
                index2: sample.index2.clone(),
                run_cycles: self.cycles.index2_cycles,
            })
        }
    }
}
