//! Data rows of the BCL Convert sample sheet. Indexes keep their natural
//! length; unread cycles are masked through `Override_Cycles`.

use super::barcode_mismatch::{
    barcode_mismatches_index1, barcode_mismatches_index2, BarcodeMismatches, IndexPeer,
};
use super::override_cycles::override_cycles;
use super::{
    check_row_width, parse_index, parse_lane, parse_sample_id, ProcessingContext,
    SampleSheetRecord, SeparatedSample,
};
use crate::error::{ComparisonError, FormatError, SampleSheetError};
use crate::index::{ensure_acgt, reverse_complement};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct BclConvertSample {
    pub lane: u32,
    pub sample_id: String,
    pub index: String,
    pub index2: String,
    pub override_cycles: String,
    pub adapter_read_1: String,
    pub adapter_read_2: String,
    pub barcode_mismatches_index1: BarcodeMismatches,
    pub barcode_mismatches_index2: BarcodeMismatches,
}

impl BclConvertSample {
    pub fn index_peer(&self) -> IndexPeer {
        IndexPeer {
            sample_id: self.sample_id.clone(),
            index: self.index.clone(),
            index2: self.index2.clone(),
        }
    }

    /// Lower the mismatch tolerances to 0 wherever another sample of the lane
    /// is within reach. `lane_samples` is a snapshot of the whole lane and is
    /// not affected by updates to other samples.
    pub fn update_barcode_mismatches(
        &mut self,
        lane_samples: &[IndexPeer],
    ) -> Result<(), ComparisonError> {
        self.barcode_mismatches_index1 =
            barcode_mismatches_index1(&self.sample_id, &self.index, lane_samples)?;
        self.barcode_mismatches_index2 =
            barcode_mismatches_index2(&self.sample_id, &self.index2, lane_samples)?;
        Ok(())
    }
}

fn default_mismatches_index2(index2: &str) -> BarcodeMismatches {
    if index2.is_empty() {
        BarcodeMismatches::NotApplicable
    } else {
        BarcodeMismatches::default()
    }
}

impl SampleSheetRecord for BclConvertSample {
    const DATA_COLUMNS: &'static [&'static str] = &[
        "Lane",
        "Sample_ID",
        "Index",
        "Index2",
        "Override_Cycles",
        "Adapter_Read_1",
        "Adapter_Read_2",
        "BarcodeMismatchesIndex1",
        "BarcodeMismatchesIndex2",
    ];

    /// Reverse complement index 2 when the run reads it on the other strand,
    /// then derive the override cycles. Mismatch tolerances start at their
    /// defaults and are resolved once the whole lane is known.
    fn process_indexes(
        sample: SeparatedSample,
        context: &ProcessingContext<'_>,
    ) -> Result<Self, SampleSheetError> {
        // only HiSeq2500 custom-index runs may read indexes of different lengths
        context.run.mandated_index_lengths()?;
        let reverse = context.settings.reverse_complement_index2();
        let index2 = if reverse && !sample.index2.is_empty() {
            reverse_complement(&sample.index2)?
        } else {
            sample.index2
        };
        let override_cycles = override_cycles(
            context.run,
            &sample.sample_id,
            &sample.index,
            &index2,
            context.settings.index2_override_direction(),
        )?;

        Ok(BclConvertSample {
            lane: sample.lane,
            sample_id: sample.sample_id,
            barcode_mismatches_index1: BarcodeMismatches::default(),
            barcode_mismatches_index2: default_mismatches_index2(&index2),
            index: sample.index,
            index2,
            override_cycles,
            adapter_read_1: context.parameters.adapter_read_1.clone(),
            adapter_read_2: context.parameters.adapter_read_2.clone(),
        })
    }

    fn lane(&self) -> u32 {
        self.lane
    }

    fn sample_id(&self) -> &str {
        &self.sample_id
    }

    fn index(&self) -> &str {
        &self.index
    }

    fn index2(&self) -> &str {
        &self.index2
    }

    fn to_data_row(&self) -> Vec<String> {
        vec![
            self.lane.to_string(),
            self.sample_id.clone(),
            self.index.clone(),
            self.index2.clone(),
            self.override_cycles.clone(),
            self.adapter_read_1.clone(),
            self.adapter_read_2.clone(),
            self.barcode_mismatches_index1.to_string(),
            self.barcode_mismatches_index2.to_string(),
        ]
    }

    fn from_data_row(row: &[String]) -> Result<Self, FormatError> {
        check_row_width(row, Self::DATA_COLUMNS.len())?;
        let sample_id = parse_sample_id(&row[1])?;
        for (field, adapter) in [("Adapter_Read_1", &row[5]), ("Adapter_Read_2", &row[6])] {
            ensure_acgt(adapter.trim()).map_err(|_| FormatError::InvalidField {
                section: "Data",
                field: field.to_string(),
                value: adapter.clone(),
            })?;
        }
        Ok(BclConvertSample {
            lane: parse_lane(&sample_id, &row[0])?,
            index: parse_index("Index", &row[2])?,
            index2: parse_index("Index2", &row[3])?,
            override_cycles: row[4].trim().to_string(),
            adapter_read_1: row[5].trim().to_string(),
            adapter_read_2: row[6].trim().to_string(),
            barcode_mismatches_index1: row[7].parse()?,
            barcode_mismatches_index2: row[8].parse()?,
            sample_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::{
        IndexSettings, NOVASEQ_6000_POST_1_5_KITS_INDEX_SETTINGS, NOVASEQ_X_INDEX_SETTINGS,
        NO_REVERSE_COMPLEMENTS_INDEX_SETTINGS,
    };
    use crate::error::MetadataError;
    use crate::parameters::SheetParameters;
    use crate::run_parameters::{InstrumentFamily, RunMetadata};
    use crate::sample::RawSampleIndex;
    use pretty_assertions::assert_eq;

    fn run(index2_cycles: Option<u32>) -> RunMetadata {
        RunMetadata {
            instrument_family: InstrumentFamily::NovaSeq6000,
            read1_cycles: 151,
            read2_cycles: 151,
            index1_cycles: 10,
            index2_cycles,
            control_software_version: None,
            reagent_kit_version: None,
            run_id: None,
        }
    }

    fn process(
        run: &RunMetadata,
        settings: IndexSettings,
        sample_id: &str,
        raw_index: &str,
    ) -> Result<BclConvertSample, SampleSheetError> {
        let parameters = SheetParameters::default();
        let context = ProcessingContext {
            run,
            settings,
            parameters: &parameters,
        };
        let sample = RawSampleIndex::new(1, sample_id, raw_index)?
            .separate_indexes(run.is_single_index())?;
        BclConvertSample::process_indexes(sample, &context)
    }

    #[test]
    fn test_reverse_complement_without_padding() -> Result<(), SampleSheetError> {
        let sample = process(
            &run(Some(10)),
            NOVASEQ_6000_POST_1_5_KITS_INDEX_SETTINGS,
            "ACC123A1",
            "ACAGCAAG-GCCAAGGT",
        )?;
        assert_eq!(sample.index, "ACAGCAAG");
        assert_eq!(sample.index2, "ACCTTGGC");
        assert_eq!(sample.override_cycles, "Y151;I8N2;N2I8;Y151");
        assert_eq!(sample.barcode_mismatches_index1, BarcodeMismatches::Allowed(1));
        assert_eq!(sample.barcode_mismatches_index2, BarcodeMismatches::Allowed(1));
        Ok(())
    }

    #[test]
    fn test_novaseq_x_keeps_index2_orientation() -> Result<(), SampleSheetError> {
        let sample = process(
            &run(Some(10)),
            NOVASEQ_X_INDEX_SETTINGS,
            "ACC123A1",
            "ACAGCAAGAT-GCCAAGGTAC",
        )?;
        assert_eq!(sample.index2, "GCCAAGGTAC");
        assert_eq!(sample.override_cycles, "Y151;I10;I10;Y151");
        Ok(())
    }

    #[test]
    fn test_single_index_run() -> Result<(), SampleSheetError> {
        let sample = process(
            &run(None),
            NOVASEQ_X_INDEX_SETTINGS,
            "ACC123A1",
            "ACAGCAAG-GCCAAGGT",
        )?;
        assert_eq!(sample.index2, "");
        assert_eq!(sample.override_cycles, "Y151;I8N2;;Y151");
        assert_eq!(sample.barcode_mismatches_index2, BarcodeMismatches::NotApplicable);
        Ok(())
    }

    #[test]
    fn test_update_barcode_mismatches() -> Result<(), SampleSheetError> {
        let run = run(Some(10));
        let mut lane = vec![
            process(&run, NOVASEQ_X_INDEX_SETTINGS, "ACC123A1", "GATTACAA-CCCCCCCC")?,
            process(&run, NOVASEQ_X_INDEX_SETTINGS, "ACC123A2", "GATTACAC-TTTTTTTT")?,
            process(&run, NOVASEQ_X_INDEX_SETTINGS, "ACC123A3", "TTTTTTTT-GGGGGGGG")?,
        ];
        let peers: Vec<IndexPeer> = lane.iter().map(BclConvertSample::index_peer).collect();
        for sample in lane.iter_mut() {
            sample.update_barcode_mismatches(&peers)?;
        }
        let index1: Vec<_> = lane.iter().map(|s| s.barcode_mismatches_index1).collect();
        assert_eq!(
            index1,
            vec![
                BarcodeMismatches::Allowed(0),
                BarcodeMismatches::Allowed(0),
                BarcodeMismatches::Allowed(1)
            ]
        );
        assert!(lane
            .iter()
            .all(|s| s.barcode_mismatches_index2 == BarcodeMismatches::Allowed(1)));
        Ok(())
    }

    #[test]
    fn test_asymmetric_index_reads() -> Result<(), SampleSheetError> {
        let mut asymmetric = run(Some(8));
        assert!(matches!(
            process(
                &asymmetric,
                NOVASEQ_X_INDEX_SETTINGS,
                "ACC123A1",
                "ACAGCAAG-GCCAAGGT"
            ),
            Err(SampleSheetError::Metadata(
                MetadataError::AsymmetricIndexLength { .. }
            ))
        ));

        asymmetric.instrument_family = InstrumentFamily::HiSeq2500;
        let sample = process(
            &asymmetric,
            NO_REVERSE_COMPLEMENTS_INDEX_SETTINGS,
            "ACC123A1",
            "ACAGCAAG-GCCAAGGT",
        )?;
        assert_eq!(sample.override_cycles, "Y151;I8N2;I8;Y151");
        Ok(())
    }

    #[test]
    fn test_index_too_long_for_run() {
        assert!(matches!(
            process(
                &run(Some(10)),
                NOVASEQ_X_INDEX_SETTINGS,
                "ACC123A1",
                "ACAGCAAGATCG-GCCAAGGT"
            ),
            Err(SampleSheetError::OverrideCycles(_))
        ));
    }

    #[test]
    fn test_data_row() -> Result<(), SampleSheetError> {
        let sample = process(
            &run(Some(10)),
            NOVASEQ_6000_POST_1_5_KITS_INDEX_SETTINGS,
            "ACC123A1",
            "ACAGCAAG-GCCAAGGT",
        )?;
        let row = sample.to_data_row();
        assert_eq!(row[4], "Y151;I8N2;N2I8;Y151");
        assert_eq!(BclConvertSample::from_data_row(&row)?, sample);
        Ok(())
    }
}
