mod common;

use chrono::Duration;
use quotesmith::{AssetResolver, Error, compute, generate_quote_at};

#[test]
fn worked_examples_match_exactly() {
    let r = compute(1_500_000, 0, 20).unwrap();
    assert_eq!(r.net_price, 1_500_000);
    assert_eq!(r.daily_cost, 1_500_000.0 / 7300.0);

    let r = compute(1_500_000, 200_000, 15).unwrap();
    assert_eq!(r.net_price, 1_300_000);
    assert!((r.daily_cost - 237.442).abs() < 0.01);
}

#[test]
fn render_is_deterministic_for_a_fixed_timestamp() {
    let input = common::sample_input();
    let resolver = AssetResolver::new(common::temp_assets("determinism"));
    let ts = common::fixed_timestamp();

    let a = generate_quote_at(&input, &resolver, ts).unwrap();
    let b = generate_quote_at(&input, &resolver, ts).unwrap();
    assert_eq!(a.bytes, b.bytes);

    let c = generate_quote_at(&input, &resolver, ts + Duration::minutes(1)).unwrap();
    assert_ne!(a.bytes, c.bytes);
    // Only the embedded timestamp differs, so the size is unchanged.
    assert_eq!(a.bytes.len(), c.bytes.len());
}

#[test]
fn output_looks_like_a_pdf() {
    let input = common::sample_input();
    let resolver = AssetResolver::new(common::temp_assets("structure"));
    let doc = generate_quote_at(&input, &resolver, common::fixed_timestamp()).unwrap();

    assert!(doc.bytes.starts_with(b"%PDF-"));
    let tail = &doc.bytes[doc.bytes.len().saturating_sub(16)..];
    assert!(
        tail.windows(5).any(|w| w == b"%%EOF"),
        "missing trailer marker"
    );
    assert_eq!(common::count_pages(&doc.bytes), 1);
}

#[test]
fn suggested_filename_uses_clinic_and_patient() {
    let input = common::sample_input();
    let resolver = AssetResolver::new(common::temp_assets("filename"));
    let doc = generate_quote_at(&input, &resolver, common::fixed_timestamp()).unwrap();
    assert_eq!(doc.filename, "Bright_Dental_Estimate_Kim_Minjun.pdf");
}

#[test]
fn empty_patient_name_fails_before_any_bytes() {
    let mut input = common::sample_input();
    input.patient_name = "   ".into();
    let resolver = AssetResolver::new(common::temp_assets("nopatient"));
    match generate_quote_at(&input, &resolver, common::fixed_timestamp()) {
        Err(Error::MissingRequiredField(field)) => assert_eq!(field, "patient_name"),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("expected MissingRequiredField"),
    }
}

#[test]
fn empty_clinic_name_fails() {
    let mut input = common::sample_input();
    input.clinic_name = String::new();
    let resolver = AssetResolver::new(common::temp_assets("noclinic"));
    assert!(matches!(
        generate_quote_at(&input, &resolver, common::fixed_timestamp()),
        Err(Error::MissingRequiredField("clinic_name"))
    ));
}

#[test]
fn out_of_range_horizon_is_rejected() {
    let resolver = AssetResolver::new(common::temp_assets("horizon"));
    for horizon in [0, -5, 4, 31] {
        let mut input = common::sample_input();
        input.horizon_years = horizon;
        assert!(
            matches!(
                generate_quote_at(&input, &resolver, common::fixed_timestamp()),
                Err(Error::InvalidInput(_))
            ),
            "horizon {horizon} accepted"
        );
    }
}

#[test]
fn negative_net_price_renders_as_is() {
    let mut input = common::sample_input();
    input.sticker_price = 1_000_000;
    input.discount = 1_200_000;
    let resolver = AssetResolver::new(common::temp_assets("negative"));
    let doc = generate_quote_at(&input, &resolver, common::fixed_timestamp()).unwrap();
    assert!(!doc.bytes.is_empty());
}

#[test]
fn uncovered_glyphs_are_substituted_not_fatal() {
    let mut input = common::sample_input();
    input.patient_name = "\u{AE40}\u{BBFC}\u{C900}".into(); // 김민준
    let resolver = AssetResolver::new(common::temp_assets("hangul"));
    let doc = generate_quote_at(&input, &resolver, common::fixed_timestamp()).unwrap();
    assert!(doc.bytes.starts_with(b"%PDF-"));
}
