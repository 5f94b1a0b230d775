// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Deployment settings written into every sample sheet: adapters, software
//! version, legacy Data columns and whether filler samples are added.
//! Read from a TOML file; any missing key falls back to its default.

use crate::index::ensure_acgt;
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ADAPTER_READ_1: &str = "AGATCGGAAGAGCACACGTCTGAACTCCAGTCA";
pub const DEFAULT_ADAPTER_READ_2: &str = "AGATCGGAAGAGCGTCGTGTAGGGAAAGAGTGT";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SheetParameters {
    /// Adapter trimmed from read 1.
    pub adapter_read_1: String,
    /// Adapter trimmed from read 2.
    pub adapter_read_2: String,
    /// BCL Convert version declared in `[BCLConvert_Settings]`.
    pub software_version: String,
    pub fastq_compression_format: String,
    /// `SampleRef` column of the legacy Data section.
    pub sample_reference: String,
    /// `Recipe` column of the legacy Data section.
    pub recipe: String,
    /// `Operator` column of the legacy Data section.
    pub operator: String,
    /// Fill unused reference indexes of every lane with `indexcheck` samples.
    /// Enabled for whole genome runs, never for targeted panels.
    pub add_dummy_samples: bool,
    /// Written as `RunName`; defaults to the run id of the run parameters.
    pub run_name: Option<String>,
}

impl Default for SheetParameters {
    fn default() -> SheetParameters {
        SheetParameters {
            adapter_read_1: DEFAULT_ADAPTER_READ_1.to_string(),
            adapter_read_2: DEFAULT_ADAPTER_READ_2.to_string(),
            software_version: "4.1.7".to_string(),
            fastq_compression_format: "gzip".to_string(),
            sample_reference: "hg19".to_string(),
            recipe: "R1".to_string(),
            operator: "script".to_string(),
            add_dummy_samples: false,
            run_name: None,
        }
    }
}

impl SheetParameters {
    pub fn from_toml_str(s: &str) -> Result<SheetParameters> {
        let parameters: SheetParameters =
            toml::from_str(s).context("parsing sample sheet parameters")?;
        parameters.check()?;
        Ok(parameters)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<SheetParameters> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        SheetParameters::from_toml_str(&s).with_context(|| path.display().to_string())
    }

    /// Load `path` when it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<SheetParameters> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "could not find sample sheet parameters at {}, falling back to defaults",
                path.display()
            );
            Ok(SheetParameters::default())
        } else {
            SheetParameters::from_path(path)
        }
    }

    fn check(&self) -> Result<()> {
        ensure_acgt(&self.adapter_read_1).context("adapter_read_1")?;
        ensure_acgt(&self.adapter_read_2).context("adapter_read_2")?;
        for (key, value) in [
            ("software_version", &self.software_version),
            ("sample_reference", &self.sample_reference),
            ("operator", &self.operator),
            ("recipe", &self.recipe),
        ] {
            anyhow::ensure!(
                !value.contains(','),
                "{key} must not contain a comma: {value}"
            );
        }
        Ok(())
    }
}
