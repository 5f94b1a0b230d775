//! Build the `Override_Cycles` value of a BCL Convert sample:
//! `Y<read1>;<index1>;<index2>;Y<read2>`, where an index shorter than its index
//! read is padded with `N` cycles on the side given by the index settings.

use crate::convention::OverrideDirection;
use crate::error::OverrideCyclesError;
use crate::run_parameters::RunMetadata;

pub const OVERRIDE_CYCLES_SEPARATOR: &str = ";";

pub fn read_cycles_part(cycles: u32) -> String {
    format!("Y{cycles}")
}

/// `I<n>` for a fully sequenced index, otherwise the `I` and `N` blocks in the
/// given order. A sample without an index is all `N`.
pub fn index_cycles_part(index_length: u32, run_cycles: u32, direction: OverrideDirection) -> String {
    let skipped = run_cycles - index_length;
    match (index_length, skipped) {
        (0, _) => format!("N{run_cycles}"),
        (_, 0) => format!("I{index_length}"),
        _ => match direction {
            OverrideDirection::Forward => format!("I{index_length}N{skipped}"),
            OverrideDirection::Reverse => format!("N{skipped}I{index_length}"),
        },
    }
}

fn checked_length(
    sample_id: &str,
    index: &str,
    run_cycles: u32,
) -> Result<u32, OverrideCyclesError> {
    match u32::try_from(index.len()) {
        Ok(len) if len <= run_cycles => Ok(len),
        _ => Err(OverrideCyclesError::IndexTooLong {
            sample_id: sample_id.to_string(),
            index: index.to_string(),
            run_cycles,
        }),
    }
}

/// Override cycles of one sample. Index 1 is always written forward; index 2
/// follows `index2_direction` and is left empty on single-index runs.
pub fn override_cycles(
    run: &RunMetadata,
    sample_id: &str,
    index: &str,
    index2: &str,
    index2_direction: OverrideDirection,
) -> Result<String, OverrideCyclesError> {
    let index1_length = checked_length(sample_id, index, run.index1_cycles)?;
    let index1_part = index_cycles_part(
        index1_length,
        run.index1_cycles,
        OverrideDirection::Forward,
    );

    let index2_part = match run.index2_cycles {
        None => String::new(),
        Some(run_cycles) => {
            let index2_length = checked_length(sample_id, index2, run_cycles)?;
            index_cycles_part(index2_length, run_cycles, index2_direction)
        }
    };

    Ok([
        read_cycles_part(run.read1_cycles),
        index1_part,
        index2_part,
        read_cycles_part(run.read2_cycles),
    ]
    .join(OVERRIDE_CYCLES_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_parameters::InstrumentFamily;
    use pretty_assertions::assert_eq;
    use proptest::{prop_assert_eq, proptest};

    fn run(index1_cycles: u32, index2_cycles: Option<u32>) -> RunMetadata {
        RunMetadata {
            instrument_family: InstrumentFamily::NovaSeq6000,
            read1_cycles: 151,
            read2_cycles: 151,
            index1_cycles,
            index2_cycles,
            control_software_version: None,
            reagent_kit_version: None,
            run_id: None,
        }
    }

    #[test]
    fn test_full_length_indexes() {
        assert_eq!(
            override_cycles(
                &run(10, Some(10)),
                "ACC123A1",
                "ACAGCAAGAT",
                "ACACCTTGGC",
                OverrideDirection::Reverse
            ),
            Ok("Y151;I10;I10;Y151".to_string())
        );
    }

    #[test]
    fn test_short_indexes() {
        assert_eq!(
            override_cycles(
                &run(10, Some(10)),
                "ACC123A1",
                "ACAGCAAG",
                "ACCTTGGC",
                OverrideDirection::Reverse
            ),
            Ok("Y151;I8N2;N2I8;Y151".to_string())
        );
        assert_eq!(
            override_cycles(
                &run(10, Some(10)),
                "ACC123A1",
                "ACAGCAAG",
                "GCCAAGGT",
                OverrideDirection::Forward
            ),
            Ok("Y151;I8N2;I8N2;Y151".to_string())
        );
    }

    #[test]
    fn test_single_index_run_and_sample() {
        assert_eq!(
            override_cycles(
                &run(8, None),
                "ACC123A1",
                "ACAGCAAG",
                "",
                OverrideDirection::Forward
            ),
            Ok("Y151;I8;;Y151".to_string())
        );
        assert_eq!(
            override_cycles(
                &run(8, Some(8)),
                "ACC123A1",
                "ACAGCAAG",
                "",
                OverrideDirection::Reverse
            ),
            Ok("Y151;I8;N8;Y151".to_string())
        );
    }

    #[test]
    fn test_index_longer_than_run() {
        assert!(matches!(
            override_cycles(
                &run(8, Some(8)),
                "ACC123A1",
                "ACAGCAAGAT",
                "ACAGCAAG",
                OverrideDirection::Forward
            ),
            Err(OverrideCyclesError::IndexTooLong { .. })
        ));
    }

    fn part_cycles(part: &str) -> u32 {
        part.split(|c: char| c.is_ascii_alphabetic())
            .filter(|n| !n.is_empty())
            .map(|n| n.parse::<u32>().unwrap())
            .sum()
    }

    proptest! {
        #[test]
        fn prop_test_parts_sum_to_run_cycles(
            index1_cycles in 1u32..=12,
            index2_cycles in 1u32..=12,
            index_len in 0usize..=12,
            index2_len in 0usize..=12,
            reverse in proptest::bool::ANY,
        ) {
            let index_len = index_len.min(index1_cycles as usize).max(1);
            let index2_len = index2_len.min(index2_cycles as usize);
            let direction = if reverse { OverrideDirection::Reverse } else { OverrideDirection::Forward };
            let oc = override_cycles(
                &run(index1_cycles, Some(index2_cycles)),
                "ACC123A1",
                &"A".repeat(index_len),
                &"C".repeat(index2_len),
                direction,
            ).unwrap();
            let parts: Vec<&str> = oc.split(OVERRIDE_CYCLES_SEPARATOR).collect();
            prop_assert_eq!(parts.len(), 4);
            prop_assert_eq!(part_cycles(parts[0]), 151);
            prop_assert_eq!(part_cycles(parts[1]), index1_cycles);
            prop_assert_eq!(part_cycles(parts[2]), index2_cycles);
            prop_assert_eq!(part_cycles(parts[3]), 151);
        }
    }
}
