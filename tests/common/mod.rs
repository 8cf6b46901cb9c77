#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use quotesmith::QuoteInput;

pub fn sample_input() -> QuoteInput {
    QuoteInput {
        clinic_name: "Bright Dental".into(),
        contact_info: "02-555-0192 | bright-dental.example".into(),
        patient_name: "Kim Minjun".into(),
        issue_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        surgery_at: NaiveDate::from_ymd_opt(2026, 3, 20)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap(),
        sticker_price: 1_500_000,
        discount: 200_000,
        horizon_years: 15,
    }
}

pub fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// Fresh empty asset directory, unique per test.
pub fn temp_assets(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quotesmith-it-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Page count by media box entries: the renderer writes exactly one /MediaBox
/// per page and none elsewhere.
pub fn count_pages(bytes: &[u8]) -> usize {
    let needle = b"/MediaBox";
    bytes
        .windows(needle.len())
        .filter(|w| w == needle)
        .count()
}
