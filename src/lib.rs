// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Generate and validate Illumina sample sheets.
//!
//! `RunMetadata` is read from the `RunParameters.xml` of a sequencing run;
//! `SheetAssembler` turns it and the samples requested per lane into a
//! `SampleSheet` for bcl2fastq or BCL Convert, with index orientation,
//! padding, override cycles and mismatch tolerances adapted to the
//! instrument. `SampleSheetValidator` checks sheets from any source.

pub mod convention;
pub mod error;
pub mod index;
pub mod parameters;
pub mod run_parameters;
pub mod sample;
pub mod sheet;

pub use convention::IndexSettings;
pub use error::{SampleSheetError, ValidationError};
pub use index::IndexTable;
pub use parameters::SheetParameters;
pub use run_parameters::{InstrumentFamily, RunMetadata};
pub use sample::RawSampleIndex;
pub use sheet::{Dialect, SampleSheet, SampleSheetValidator, SheetAssembler, ValidatedSheet};

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sheet_from_run_parameters_file() -> Result<()> {
        let run = RunMetadata::from_path("test/run_parameters/novaseq_6000.xml")?;
        let parameters = SheetParameters::from_path("test/parameters.toml")?;
        let samples = vec![
            RawSampleIndex::new(1, "ACC123A1", "ACAGCAAG-GCCAAGGT")?,
            RawSampleIndex::new(1, "ACC123A2", "GTTCCAATAT-ACTGCTTAGC")?,
            RawSampleIndex::new(2, "ACC123A3", "ACAGCAAG-GCCAAGGT")?,
        ];
        let dialect = Dialect::default_for(run.instrument_family);
        let sheet = SheetAssembler::new(&run, samples, dialect, &parameters).construct()?;

        let text = sheet.to_csv_string()?;
        let validated = SampleSheetValidator::from_csv_str(&text)?.validate()?;
        assert_eq!(validated.dialect, Dialect::BclConvert);
        assert_eq!(
            validated.index_settings.map(|s| s.name()),
            Some("NovaSeq6000Post1.5Kits")
        );
        // every unused dual index of the packaged table, in both lanes
        assert!(validated.samples.len() > 3);
        Ok(())
    }
}
