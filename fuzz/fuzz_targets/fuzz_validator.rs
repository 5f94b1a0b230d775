#![no_main]
use libfuzzer_sys::fuzz_target;
use sample_sheet::sample::barcode_mismatch::hamming_distance;
use sample_sheet::{SampleSheet, SampleSheetValidator};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Arbitrary text must be rejected with an error, never a panic.
        if let Ok(validator) = SampleSheetValidator::from_csv_str(text) {
            let _ = validator.validate();
        }
        if let Ok(sheet) = SampleSheet::from_csv_str(text) {
            let rows = sheet.to_rows();
            assert_eq!(SampleSheet::from_rows(rows.clone()).to_rows(), rows);
        }
        let half = text.len() / 2;
        if text.is_char_boundary(half) {
            let (a, b) = text.split_at(half);
            assert_eq!(hamming_distance(a, b), hamming_distance(b, a));
        }
    }
});
