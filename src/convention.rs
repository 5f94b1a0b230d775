// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Index conventions: whether index 2 has to be reverse complemented for a run,
//! and in which order index 2 override cycles are written.

use crate::error::ConventionError;
use crate::run_parameters::{InstrumentFamily, RunMetadata, SoftwareVersion};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref REVERSE_COMPLEMENT_SOFTWARE: SoftwareVersion = version("1.7.0");
    static ref REVERSE_COMPLEMENT_REAGENT_KIT: SoftwareVersion = version("1.5");
}

/// Reagent kit codes found in the run parameters, mapped to the kit version.
const REAGENT_KIT_VERSIONS: [(&str, &str); 2] = [("1", "1.0"), ("3", "1.5")];
const KNOWN_REAGENT_KITS: &str = "1, 3";

fn version(v: &str) -> SoftwareVersion {
    v.parse().unwrap()
}

fn reagent_kit_version(code: &str) -> Result<SoftwareVersion, ConventionError> {
    let code = code.trim();
    REAGENT_KIT_VERSIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, v)| version(v))
        .ok_or_else(|| ConventionError::UnknownReagentKit {
            code: code.to_string(),
            known: KNOWN_REAGENT_KITS,
        })
}

/// NovaSeq 6000 runs with control software 1.7.0 or later and v1.5 reagent
/// kits read index 2 on the reverse strand.
pub fn is_reverse_complement(
    control_software_version: &SoftwareVersion,
    reagent_kit_code: &str,
) -> Result<bool, ConventionError> {
    let reagent_kit = reagent_kit_version(reagent_kit_code)?;
    Ok(*control_software_version >= *REVERSE_COMPLEMENT_SOFTWARE
        && reagent_kit >= *REVERSE_COMPLEMENT_REAGENT_KIT)
}

/// Order of the `I` and `N` blocks of an index 2 override cycles part when the
/// sample index is shorter than the index read.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum OverrideDirection {
    /// `I8N2`
    Forward,
    /// `N2I8`
    Reverse,
}

/// How index 2 is written into the sample sheet. Written by name to the
/// `IndexSettings` row of the sheet header.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndexSettings {
    /// Index 2 as sequenced, override cycles `N2I8`.
    NovaSeqX,
    /// Index 2 reverse complemented, override cycles `N2I8`.
    NovaSeq6000Post15Kits,
    /// Index 2 as sequenced, override cycles `I8N2`.
    NoReverseComplements,
}

pub const NOVASEQ_X_INDEX_SETTINGS: IndexSettings = IndexSettings::NovaSeqX;
pub const NOVASEQ_6000_POST_1_5_KITS_INDEX_SETTINGS: IndexSettings =
    IndexSettings::NovaSeq6000Post15Kits;
pub const NO_REVERSE_COMPLEMENTS_INDEX_SETTINGS: IndexSettings =
    IndexSettings::NoReverseComplements;

const ALL_INDEX_SETTINGS: [IndexSettings; 3] = [
    IndexSettings::NovaSeqX,
    IndexSettings::NovaSeq6000Post15Kits,
    IndexSettings::NoReverseComplements,
];

impl IndexSettings {
    /// Decide the index settings of a run from its instrument and versions.
    pub fn for_run(run: &RunMetadata) -> Result<IndexSettings, ConventionError> {
        match run.instrument_family {
            InstrumentFamily::NovaSeqX => Ok(IndexSettings::NovaSeqX),
            InstrumentFamily::NovaSeq6000 => {
                let (software, reagent_kit) = match (
                    &run.control_software_version,
                    &run.reagent_kit_version,
                ) {
                    (Some(s), Some(r)) => (s, r),
                    _ => {
                        return Err(ConventionError::MissingVersions {
                            family: run.instrument_family,
                        })
                    }
                };
                if is_reverse_complement(software, reagent_kit)? {
                    Ok(IndexSettings::NovaSeq6000Post15Kits)
                } else {
                    Ok(IndexSettings::NoReverseComplements)
                }
            }
            InstrumentFamily::HiSeqX | InstrumentFamily::HiSeq2500 => {
                Ok(IndexSettings::NoReverseComplements)
            }
        }
    }

    pub fn reverse_complement_index2(self) -> bool {
        self == IndexSettings::NovaSeq6000Post15Kits
    }

    pub fn index2_override_direction(self) -> OverrideDirection {
        match self {
            IndexSettings::NovaSeqX | IndexSettings::NovaSeq6000Post15Kits => {
                OverrideDirection::Reverse
            }
            IndexSettings::NoReverseComplements => OverrideDirection::Forward,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexSettings::NovaSeqX => "NovaSeqX",
            IndexSettings::NovaSeq6000Post15Kits => "NovaSeq6000Post1.5Kits",
            IndexSettings::NoReverseComplements => "NoReverseComplements",
        }
    }
}

impl fmt::Display for IndexSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexSettings {
    type Err = ConventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_INDEX_SETTINGS
            .into_iter()
            .find(|settings| settings.name() == s.trim())
            .ok_or_else(|| ConventionError::UnknownIndexSettings {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use pretty_assertions::assert_eq;

    fn novaseq_6000(software: &str, reagent_kit: &str) -> RunMetadata {
        RunMetadata {
            instrument_family: InstrumentFamily::NovaSeq6000,
            read1_cycles: 151,
            read2_cycles: 151,
            index1_cycles: 10,
            index2_cycles: Some(10),
            control_software_version: Some(version(software)),
            reagent_kit_version: Some(reagent_kit.to_string()),
            run_id: None,
        }
    }

    #[test]
    fn test_reverse_complement_threshold() -> Result<(), MetadataError> {
        assert!(is_reverse_complement(&"1.7.0".parse()?, "3").unwrap());
        assert!(is_reverse_complement(&"1.7.2".parse()?, "3").unwrap());
        assert!(is_reverse_complement(&"1.10".parse()?, "3").unwrap());
        assert!(!is_reverse_complement(&"1.6.0".parse()?, "3").unwrap());
        assert!(!is_reverse_complement(&"1.7.0".parse()?, "1").unwrap());
        Ok(())
    }

    #[test]
    fn test_unknown_reagent_kit() -> Result<(), MetadataError> {
        assert_eq!(
            is_reverse_complement(&"1.7.0".parse()?, "2"),
            Err(ConventionError::UnknownReagentKit {
                code: "2".to_string(),
                known: KNOWN_REAGENT_KITS,
            })
        );
        Ok(())
    }

    #[test]
    fn test_settings_for_run() {
        assert_eq!(
            IndexSettings::for_run(&novaseq_6000("1.7.0", "3")),
            Ok(NOVASEQ_6000_POST_1_5_KITS_INDEX_SETTINGS)
        );
        assert_eq!(
            IndexSettings::for_run(&novaseq_6000("1.6.0", "3")),
            Ok(NO_REVERSE_COMPLEMENTS_INDEX_SETTINGS)
        );
        assert!(IndexSettings::for_run(&novaseq_6000("1.7.0", "5")).is_err());

        let mut run = novaseq_6000("1.7.0", "3");
        run.instrument_family = InstrumentFamily::NovaSeqX;
        assert_eq!(IndexSettings::for_run(&run), Ok(NOVASEQ_X_INDEX_SETTINGS));
        run.instrument_family = InstrumentFamily::HiSeqX;
        assert_eq!(
            IndexSettings::for_run(&run),
            Ok(NO_REVERSE_COMPLEMENTS_INDEX_SETTINGS)
        );
    }

    #[test]
    fn test_settings_names_round_trip() {
        for settings in ALL_INDEX_SETTINGS {
            assert_eq!(settings.name().parse::<IndexSettings>(), Ok(settings));
            assert_eq!(settings.to_string(), settings.name());
        }
        assert_eq!(
            NOVASEQ_6000_POST_1_5_KITS_INDEX_SETTINGS.name(),
            "NovaSeq6000Post1.5Kits"
        );
        assert!("Sideways".parse::<IndexSettings>().is_err());
    }

    #[test]
    fn test_settings_flags() {
        assert!(!IndexSettings::NovaSeqX.reverse_complement_index2());
        assert!(IndexSettings::NovaSeq6000Post15Kits.reverse_complement_index2());
        assert!(!IndexSettings::NoReverseComplements.reverse_complement_index2());
        assert_eq!(
            IndexSettings::NovaSeqX.index2_override_direction(),
            OverrideDirection::Reverse
        );
        assert_eq!(
            IndexSettings::NoReverseComplements.index2_override_direction(),
            OverrideDirection::Forward
        );
    }

    #[test]
    fn test_every_run_setting_has_a_header_name() {
        let runs = [
            novaseq_6000("1.7.0", "3"),
            novaseq_6000("1.6.0", "3"),
            novaseq_6000("1.7.0", "1"),
        ];
        for run in &runs {
            let settings = IndexSettings::for_run(run).unwrap();
            assert_eq!(settings.name().parse::<IndexSettings>(), Ok(settings));
        }
    }
}
