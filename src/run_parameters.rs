// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Parse the `RunParameters.xml` written by the sequencer into the cycle counts
//! and software/reagent versions that decide how sample indexes are written.

use crate::convention::IndexSettings;
use crate::error::{ConventionError, MetadataError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Instrument generations with distinct run parameter layouts and index conventions.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum InstrumentFamily {
    HiSeqX,
    HiSeq2500,
    NovaSeq6000,
    NovaSeqX,
}

impl fmt::Display for InstrumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstrumentFamily::HiSeqX => "HiSeqX",
            InstrumentFamily::HiSeq2500 => "HiSeq2500",
            InstrumentFamily::NovaSeq6000 => "NovaSeq6000",
            InstrumentFamily::NovaSeqX => "NovaSeqX",
        };
        f.write_str(name)
    }
}

/// A dotted numeric version such as `1.7.0`. Ordering is numeric per component
/// and ignores trailing zeros, so `1.5 == 1.5.0 < 1.7.0 < 1.7.10`.
#[derive(Clone, Debug)]
pub struct SoftwareVersion {
    raw: String,
    parts: Vec<u64>,
}

impl SoftwareVersion {
    fn significant_parts(&self) -> &[u64] {
        let end = self
            .parts
            .iter()
            .rposition(|&p| p != 0)
            .map_or(0, |i| i + 1);
        &self.parts[..end]
    }
}

impl FromStr for SoftwareVersion {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let numeric = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let parts = numeric
            .split('.')
            .map(str::parse::<u64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| MetadataError::InvalidVersion {
                value: s.to_string(),
            })?;
        Ok(SoftwareVersion {
            raw: trimmed.to_string(),
            parts,
        })
    }
}

impl PartialEq for SoftwareVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant_parts() == other.significant_parts()
    }
}

impl Eq for SoftwareVersion {}

impl PartialOrd for SoftwareVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SoftwareVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.significant_parts().cmp(other.significant_parts())
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Everything the sample sheet needs to know about one sequencing run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunMetadata {
    pub instrument_family: InstrumentFamily,
    pub read1_cycles: u32,
    pub read2_cycles: u32,
    pub index1_cycles: u32,
    /// `None` on single-index runs.
    pub index2_cycles: Option<u32>,
    pub control_software_version: Option<SoftwareVersion>,
    pub reagent_kit_version: Option<String>,
    pub run_id: Option<String>,
}

// Raw document layout. Every field is optional here; which ones are required
// depends on the instrument family and is checked in `RunMetadata::from_xml_str`.

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct RunParametersXml {
    #[serde(rename = "InstrumentType")]
    instrument_type: Option<String>,
    #[serde(rename = "Application")]
    application: Option<String>,
    #[serde(rename = "ApplicationVersion")]
    application_version: Option<String>,
    #[serde(rename = "SystemSuiteVersion")]
    system_suite_version: Option<String>,
    #[serde(rename = "RunId")]
    run_id: Option<String>,
    #[serde(rename = "Read1NumberOfCycles")]
    read1_number_of_cycles: Option<String>,
    #[serde(rename = "Read2NumberOfCycles")]
    read2_number_of_cycles: Option<String>,
    #[serde(rename = "IndexRead1NumberOfCycles")]
    index_read1_number_of_cycles: Option<String>,
    #[serde(rename = "IndexRead2NumberOfCycles")]
    index_read2_number_of_cycles: Option<String>,
    #[serde(rename = "RfidsInfo")]
    rfids_info: Option<RfidsInfo>,
    #[serde(rename = "Setup")]
    setup: Option<Setup>,
    #[serde(rename = "PlannedReads")]
    planned_reads: Option<PlannedReads>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct RfidsInfo {
    #[serde(rename = "SbsConsumableVersion")]
    sbs_consumable_version: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct Setup {
    #[serde(rename = "ApplicationName")]
    application_name: Option<String>,
    #[serde(rename = "ApplicationVersion")]
    application_version: Option<String>,
    #[serde(rename = "Flowcell")]
    flowcell: Option<String>,
    #[serde(rename = "RunID")]
    run_id: Option<String>,
    #[serde(rename = "Sbs")]
    sbs: Option<String>,
    #[serde(rename = "Read1")]
    read1: Option<String>,
    #[serde(rename = "Read2")]
    read2: Option<String>,
    #[serde(rename = "IndexRead1")]
    index_read1: Option<String>,
    #[serde(rename = "IndexRead2")]
    index_read2: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct PlannedReads {
    #[serde(rename = "Read")]
    reads: Vec<PlannedRead>,
}

#[derive(Deserialize, Debug)]
struct PlannedRead {
    #[serde(rename = "ReadName")]
    read_name: String,
    #[serde(rename = "Cycles")]
    cycles: String,
}

impl PlannedReads {
    fn cycles(&self, read_name: &str) -> Option<&String> {
        self.reads
            .iter()
            .find(|r| r.read_name == read_name)
            .map(|r| &r.cycles)
    }
}

impl RunParametersXml {
    fn instrument_family(&self) -> Result<InstrumentFamily, ConventionError> {
        if let Some(instrument) = self.instrument_type.as_deref().map(str::trim) {
            if instrument == "NovaSeqXPlus" || instrument == "NovaSeqX" {
                return Ok(InstrumentFamily::NovaSeqX);
            }
        }
        if self.application.as_deref().map(str::trim) == Some("NovaSeq Control Software") {
            return Ok(InstrumentFamily::NovaSeq6000);
        }
        if let Some(setup) = &self.setup {
            if setup
                .flowcell
                .as_deref()
                .is_some_and(|f| f.trim().starts_with("HiSeq X"))
            {
                return Ok(InstrumentFamily::HiSeqX);
            }
            if setup
                .application_name
                .as_deref()
                .is_some_and(|a| a.contains("HiSeq"))
            {
                return Ok(InstrumentFamily::HiSeq2500);
            }
        }
        Err(ConventionError::UnrecognizedInstrument)
    }
}

/// Parse a mandatory, strictly positive cycle count.
fn required_cycles(
    field: &'static str,
    value: Option<&String>,
    family: InstrumentFamily,
) -> Result<u32, MetadataError> {
    let value = value.ok_or(MetadataError::MissingField { field, family })?;
    match value.trim().parse::<u32>() {
        Ok(cycles) if cycles > 0 => Ok(cycles),
        _ => Err(MetadataError::InvalidField {
            field,
            value: value.clone(),
        }),
    }
}

/// Parse the optional index 2 cycle count. A declared count of 0 means the
/// instrument did not read index 2.
fn optional_cycles(
    field: &'static str,
    value: Option<&String>,
) -> Result<Option<u32>, MetadataError> {
    match value {
        None => Ok(None),
        Some(v) => match v.trim().parse::<u32>() {
            Ok(0) => Ok(None),
            Ok(cycles) => Ok(Some(cycles)),
            Err(_) => Err(MetadataError::InvalidField {
                field,
                value: v.clone(),
            }),
        },
    }
}

fn required_text(
    field: &'static str,
    value: Option<&String>,
    family: InstrumentFamily,
) -> Result<String, MetadataError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(MetadataError::MissingField { field, family }),
    }
}

fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RunMetadata {
    /// Parse the contents of a `RunParameters.xml` document.
    pub fn from_xml_str(xml: &str) -> Result<RunMetadata, crate::SampleSheetError> {
        let doc: RunParametersXml = serde_xml_rs::from_str(xml).map_err(MetadataError::from)?;
        let family = doc.instrument_family()?;

        let metadata = match family {
            InstrumentFamily::NovaSeqX => {
                let planned = doc.planned_reads.as_ref().ok_or(MetadataError::MissingField {
                    field: "PlannedReads",
                    family,
                })?;
                let control_software_version = optional_text(doc.system_suite_version.as_ref())
                    .map(|v| v.parse::<SoftwareVersion>())
                    .transpose()?;
                RunMetadata {
                    instrument_family: family,
                    read1_cycles: required_cycles("Read1", planned.cycles("Read1"), family)?,
                    read2_cycles: required_cycles("Read2", planned.cycles("Read2"), family)?,
                    index1_cycles: required_cycles("Index1", planned.cycles("Index1"), family)?,
                    index2_cycles: optional_cycles("Index2", planned.cycles("Index2"))?,
                    control_software_version,
                    reagent_kit_version: None,
                    run_id: optional_text(doc.run_id.as_ref()),
                }
            }
            InstrumentFamily::NovaSeq6000 => {
                let reagent_kit = doc
                    .rfids_info
                    .as_ref()
                    .and_then(|r| r.sbs_consumable_version.as_ref());
                RunMetadata {
                    instrument_family: family,
                    read1_cycles: required_cycles(
                        "Read1NumberOfCycles",
                        doc.read1_number_of_cycles.as_ref(),
                        family,
                    )?,
                    read2_cycles: required_cycles(
                        "Read2NumberOfCycles",
                        doc.read2_number_of_cycles.as_ref(),
                        family,
                    )?,
                    index1_cycles: required_cycles(
                        "IndexRead1NumberOfCycles",
                        doc.index_read1_number_of_cycles.as_ref(),
                        family,
                    )?,
                    index2_cycles: optional_cycles(
                        "IndexRead2NumberOfCycles",
                        doc.index_read2_number_of_cycles.as_ref(),
                    )?,
                    control_software_version: Some(
                        required_text("ApplicationVersion", doc.application_version.as_ref(), family)?
                            .parse::<SoftwareVersion>()?,
                    ),
                    reagent_kit_version: Some(required_text(
                        "RfidsInfo/SbsConsumableVersion",
                        reagent_kit,
                        family,
                    )?),
                    run_id: optional_text(doc.run_id.as_ref()),
                }
            }
            InstrumentFamily::HiSeqX | InstrumentFamily::HiSeq2500 => {
                let setup = doc.setup.as_ref().ok_or(MetadataError::MissingField {
                    field: "Setup",
                    family,
                })?;
                RunMetadata {
                    instrument_family: family,
                    read1_cycles: required_cycles("Setup/Read1", setup.read1.as_ref(), family)?,
                    read2_cycles: required_cycles("Setup/Read2", setup.read2.as_ref(), family)?,
                    index1_cycles: required_cycles(
                        "Setup/IndexRead1",
                        setup.index_read1.as_ref(),
                        family,
                    )?,
                    index2_cycles: optional_cycles(
                        "Setup/IndexRead2",
                        setup.index_read2.as_ref(),
                    )?,
                    control_software_version: Some(
                        required_text(
                            "Setup/ApplicationVersion",
                            setup.application_version.as_ref(),
                            family,
                        )?
                        .parse::<SoftwareVersion>()?,
                    ),
                    reagent_kit_version: optional_text(setup.sbs.as_ref()),
                    run_id: optional_text(setup.run_id.as_ref()),
                }
            }
        };

        log::debug!(
            "parsed {} run parameters: Y{};I{};I{:?};Y{}",
            metadata.instrument_family,
            metadata.read1_cycles,
            metadata.index1_cycles,
            metadata.index2_cycles,
            metadata.read2_cycles
        );
        Ok(metadata)
    }

    /// Read and parse a `RunParameters.xml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<RunMetadata> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("reading run parameters {}", path.display()))?;
        RunMetadata::from_xml_str(&xml)
            .with_context(|| format!("parsing run parameters {}", path.display()))
    }

    /// True if the run did not read a second index.
    pub fn is_single_index(&self) -> bool {
        self.index2_cycles.is_none()
    }

    /// Flow cell id taken from the run id (`<date>_<instrument>_<number>_<side><flowcell>`).
    pub fn flowcell_id(&self) -> Option<String> {
        let last = self.run_id.as_deref()?.rsplit('_').next()?;
        let flowcell = last
            .strip_prefix('A')
            .or_else(|| last.strip_prefix('B'))
            .unwrap_or(last);
        if flowcell.is_empty() {
            None
        } else {
            Some(flowcell.to_string())
        }
    }

    /// The index length shared by both index reads.
    pub fn index_length(&self) -> Result<u32, MetadataError> {
        match self.index2_cycles {
            None => Ok(self.index1_cycles),
            Some(index2_cycles) if index2_cycles == self.index1_cycles => Ok(self.index1_cycles),
            Some(index2_cycles) => Err(MetadataError::AsymmetricIndexLength {
                index1_cycles: self.index1_cycles,
                index2_cycles,
                family: self.instrument_family,
            }),
        }
    }

    /// The (index 1, index 2) lengths samples must be brought to. HiSeq2500
    /// custom-index runs may read the two indexes with different lengths; every
    /// other instrument must agree on a single index length.
    pub fn mandated_index_lengths(&self) -> Result<(u32, Option<u32>), MetadataError> {
        if self.instrument_family == InstrumentFamily::HiSeq2500 {
            return Ok((self.index1_cycles, self.index2_cycles));
        }
        let length = self.index_length()?;
        Ok((length, self.index2_cycles.map(|_| length)))
    }

    /// The index conventions implied by the instrument and its versions.
    pub fn index_settings(&self) -> Result<IndexSettings, ConventionError> {
        IndexSettings::for_run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SampleSheetError;
    use pretty_assertions::assert_eq;

    const NOVASEQ_6000: &str = "test/run_parameters/novaseq_6000.xml";
    const NOVASEQ_X: &str = "test/run_parameters/novaseq_x.xml";
    const HISEQ_X: &str = "test/run_parameters/hiseq_x.xml";
    const HISEQ_2500_CUSTOM: &str = "test/run_parameters/hiseq_2500_custom_index.xml";

    #[test]
    fn test_novaseq_6000() -> Result<()> {
        let run = RunMetadata::from_path(NOVASEQ_6000)?;
        assert_eq!(run.instrument_family, InstrumentFamily::NovaSeq6000);
        assert_eq!(run.read1_cycles, 151);
        assert_eq!(run.read2_cycles, 151);
        assert_eq!(run.index1_cycles, 10);
        assert_eq!(run.index2_cycles, Some(10));
        assert_eq!(run.reagent_kit_version.as_deref(), Some("3"));
        assert_eq!(run.control_software_version, Some("1.7.0".parse::<SoftwareVersion>()?));
        assert_eq!(run.index_length()?, 10);
        assert_eq!(run.flowcell_id().as_deref(), Some("HNGGJDSXY"));
        assert_eq!(run.index_settings()?, IndexSettings::NovaSeq6000Post15Kits);
        Ok(())
    }

    #[test]
    fn test_novaseq_x() -> Result<()> {
        let run = RunMetadata::from_path(NOVASEQ_X)?;
        assert_eq!(run.instrument_family, InstrumentFamily::NovaSeqX);
        assert_eq!(run.read1_cycles, 151);
        assert_eq!(run.read2_cycles, 151);
        assert_eq!(run.index1_cycles, 10);
        assert_eq!(run.index2_cycles, Some(10));
        assert_eq!(run.reagent_kit_version, None);
        assert_eq!(run.index_settings()?, IndexSettings::NovaSeqX);
        Ok(())
    }

    #[test]
    fn test_hiseq_x() -> Result<()> {
        let run = RunMetadata::from_path(HISEQ_X)?;
        assert_eq!(run.instrument_family, InstrumentFamily::HiSeqX);
        assert_eq!(run.index1_cycles, 8);
        assert_eq!(run.index2_cycles, Some(8));
        assert_eq!(run.index_length()?, 8);
        Ok(())
    }

    #[test]
    fn test_hiseq_2500_custom_index() -> Result<()> {
        let run = RunMetadata::from_path(HISEQ_2500_CUSTOM)?;
        assert_eq!(run.instrument_family, InstrumentFamily::HiSeq2500);
        assert_eq!(run.index1_cycles, 8);
        assert_eq!(run.index2_cycles, Some(6));
        assert!(matches!(
            run.index_length(),
            Err(MetadataError::AsymmetricIndexLength { .. })
        ));
        assert_eq!(run.mandated_index_lengths()?, (8, Some(6)));
        Ok(())
    }

    #[test]
    fn test_asymmetric_index_only_tolerated_on_hiseq_2500() {
        let run = RunMetadata {
            instrument_family: InstrumentFamily::NovaSeq6000,
            read1_cycles: 151,
            read2_cycles: 151,
            index1_cycles: 10,
            index2_cycles: Some(8),
            control_software_version: None,
            reagent_kit_version: None,
            run_id: None,
        };
        assert!(run.mandated_index_lengths().is_err());
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let xml = r#"<?xml version="1.0"?>
<RunParameters>
  <Application>NovaSeq Control Software</Application>
  <ApplicationVersion>1.7.0</ApplicationVersion>
  <RfidsInfo><SbsConsumableVersion>3</SbsConsumableVersion></RfidsInfo>
  <Read1NumberOfCycles>151</Read1NumberOfCycles>
  <IndexRead1NumberOfCycles>10</IndexRead1NumberOfCycles>
  <IndexRead2NumberOfCycles>10</IndexRead2NumberOfCycles>
</RunParameters>"#;
        match RunMetadata::from_xml_str(xml) {
            Err(SampleSheetError::Metadata(MetadataError::MissingField { field, .. })) => {
                assert_eq!(field, "Read2NumberOfCycles")
            }
            other => panic!("expected a missing field error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_index_novaseq() -> Result<(), SampleSheetError> {
        let xml = r#"<?xml version="1.0"?>
<RunParameters>
  <Application>NovaSeq Control Software</Application>
  <ApplicationVersion>1.6.0</ApplicationVersion>
  <RfidsInfo><SbsConsumableVersion>1</SbsConsumableVersion></RfidsInfo>
  <Read1NumberOfCycles>101</Read1NumberOfCycles>
  <Read2NumberOfCycles>101</Read2NumberOfCycles>
  <IndexRead1NumberOfCycles>8</IndexRead1NumberOfCycles>
  <IndexRead2NumberOfCycles>0</IndexRead2NumberOfCycles>
</RunParameters>"#;
        let run = RunMetadata::from_xml_str(xml)?;
        assert!(run.is_single_index());
        assert_eq!(run.index_length()?, 8);
        assert!(!run.index_settings()?.reverse_complement_index2());
        Ok(())
    }

    #[test]
    fn test_unrecognized_instrument() {
        let xml = r#"<RunParameters><Application>MiSeq Control Software</Application></RunParameters>"#;
        assert!(matches!(
            RunMetadata::from_xml_str(xml),
            Err(SampleSheetError::Convention(
                ConventionError::UnrecognizedInstrument
            ))
        ));
    }

    #[test]
    fn test_version_ordering() -> Result<(), MetadataError> {
        let v = |s: &str| s.parse::<SoftwareVersion>();
        assert!(v("1.7.0")? >= v("1.7.0")?);
        assert!(v("1.7.1")? > v("1.7.0")?);
        assert!(v("1.10.0")? > v("1.7.0")?);
        assert!(v("1.6.9")? < v("1.7")?);
        assert_eq!(v("1.5")?, v("1.5.0")?);
        assert!(v("v1.7.0.1234")? > v("1.7.0")?);
        assert!(v("1.7.x").is_err());
        Ok(())
    }
}
