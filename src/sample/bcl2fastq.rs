//! Data rows of the legacy bcl2fastq sample sheet. Short indexes are padded to
//! the index read length, since bcl2fastq has no notion of masked cycles.

use super::{
    check_row_width, parse_index, parse_lane, parse_sample_id, ProcessingContext,
    SampleSheetRecord, SeparatedSample,
};
use crate::error::{FormatError, SampleSheetError};
use crate::index::{needs_padding, pad_index_one, pad_index_two, reverse_complement};
use serde::{Deserialize, Serialize};

const CONTROL: &str = "N";

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Bcl2FastqSample {
    pub flowcell_id: String,
    pub lane: u32,
    pub sample_id: String,
    pub sample_reference: String,
    pub index: String,
    pub index2: String,
    pub sample_name: String,
    pub control: String,
    pub recipe: String,
    pub operator: String,
    pub project: String,
}

impl SampleSheetRecord for Bcl2FastqSample {
    const DATA_COLUMNS: &'static [&'static str] = &[
        "FCID",
        "Lane",
        "Sample_ID",
        "SampleRef",
        "index",
        "index2",
        "SampleName",
        "Control",
        "Recipe",
        "Operator",
        "Sample_Project",
    ];

    /// Reverse complement index 2 when the run reads it on the other strand,
    /// then pad 8 bp indexes that are read with 10 cycles.
    fn process_indexes(
        sample: SeparatedSample,
        context: &ProcessingContext<'_>,
    ) -> Result<Self, SampleSheetError> {
        let (index1_length, index2_length) = context.run.mandated_index_lengths()?;
        let reverse = context.settings.reverse_complement_index2();

        let mut index = sample.index;
        let mut index2 = sample.index2;
        if reverse && !index2.is_empty() {
            index2 = reverse_complement(&index2)?;
        }
        if needs_padding(index.len(), Some(index1_length)) {
            index = pad_index_one(&index);
        }
        if needs_padding(index2.len(), index2_length) {
            index2 = pad_index_two(&index2, reverse);
        }

        Ok(Bcl2FastqSample {
            flowcell_id: context.run.flowcell_id().unwrap_or_default(),
            lane: sample.lane,
            sample_id: sample.sample_id,
            sample_reference: context.parameters.sample_reference.clone(),
            index,
            index2,
            sample_name: sample.sample_name,
            control: CONTROL.to_string(),
            recipe: context.parameters.recipe.clone(),
            operator: context.parameters.operator.clone(),
            project: sample.project,
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
            self.flowcell_id.clone(),
            self.lane.to_string(),
            self.sample_id.clone(),
            self.sample_reference.clone(),
            self.index.clone(),
            self.index2.clone(),
            self.sample_name.clone(),
            self.control.clone(),
            self.recipe.clone(),
            self.operator.clone(),
            self.project.clone(),
        ]
    }

    fn from_data_row(row: &[String]) -> Result<Self, FormatError> {
        check_row_width(row, Self::DATA_COLUMNS.len())?;
        let sample_id = parse_sample_id(&row[2])?;
        Ok(Bcl2FastqSample {
            flowcell_id: row[0].trim().to_string(),
            lane: parse_lane(&sample_id, &row[1])?,
            sample_reference: row[3].trim().to_string(),
            index: parse_index("index", &row[4])?,
            index2: parse_index("index2", &row[5])?,
            sample_name: row[6].trim().to_string(),
            control: row[7].trim().to_string(),
            recipe: row[8].trim().to_string(),
            operator: row[9].trim().to_string(),
            project: row[10].trim().to_string(),
            sample_id,
        })
    }
}
