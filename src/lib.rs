mod assets;
mod builder;
mod error;
mod finance;
mod fonts;
mod layout;
mod model;
mod pdf;

pub use assets::AssetResolver;
pub use error::Error;
pub use finance::compute;
pub use model::{
    AssetKind, AssetRef, PageGeometry, QuoteInput, QuoteResult, RenderedDocument,
};

use std::path::Path;
use std::time::Instant;

use chrono::NaiveDateTime;

/// Generate the quote PDF, stamped with the current local time.
pub fn generate_quote(
    input: &QuoteInput,
    resolver: &AssetResolver,
) -> Result<RenderedDocument, Error> {
    generate_quote_at(input, resolver, chrono::Local::now().naive_local())
}

/// Generate the quote PDF with an explicit generation timestamp.
///
/// The timestamp is the only nondeterministic field of the output: two calls
/// with the same input, assets, and `generated_at` produce byte-identical
/// documents. Either the whole document is produced or an error is returned;
/// there are no partial byte streams.
pub fn generate_quote_at(
    input: &QuoteInput,
    resolver: &AssetResolver,
    generated_at: NaiveDateTime,
) -> Result<RenderedDocument, Error> {
    let t0 = Instant::now();

    validate(input)?;
    let result = finance::compute(input.sticker_price, input.discount, input.horizon_years)?;

    let geo = PageGeometry::a4();
    let blocks = builder::build(input, &result, resolver, &geo);
    let font = fonts::QuoteFont::load(
        resolver.resolve(assets::FONT).as_ref(),
        &fonts::used_chars(&blocks),
    );
    let t_build = t0.elapsed();

    let commands = layout::paginate(&blocks, &font, &geo)?;
    let t_layout = t0.elapsed();

    let bytes = pdf::render(&commands, &font, &geo, generated_at)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: build={:.1}ms, layout={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes)",
        t_build.as_secs_f64() * 1000.0,
        (t_layout - t_build).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(RenderedDocument {
        bytes,
        filename: suggested_filename(input),
    })
}

/// Generate the quote PDF and write it to `output`.
pub fn write_quote(
    input: &QuoteInput,
    resolver: &AssetResolver,
    output: &Path,
) -> Result<RenderedDocument, Error> {
    let doc = generate_quote(input, resolver)?;
    std::fs::write(output, &doc.bytes).map_err(Error::Io)?;
    Ok(doc)
}

/// Entry validation: required identity fields and the declared input domain.
/// Runs before any calculation or layout, so nothing partial is ever produced.
fn validate(input: &QuoteInput) -> Result<(), Error> {
    if input.clinic_name.trim().is_empty() {
        return Err(Error::MissingRequiredField("clinic_name"));
    }
    if input.patient_name.trim().is_empty() {
        return Err(Error::MissingRequiredField("patient_name"));
    }
    if input.sticker_price < 0 {
        return Err(Error::InvalidInput(format!(
            "sticker_price must be >= 0, got {}",
            input.sticker_price
        )));
    }
    if !(5..=30).contains(&input.horizon_years) {
        return Err(Error::InvalidInput(format!(
            "horizon_years must be in 5..=30, got {}",
            input.horizon_years
        )));
    }
    Ok(())
}

/// `"<clinic>_Estimate_<patient>.pdf"`, with whitespace collapsed to
/// underscores and path separators replaced so the suggestion is usable as a
/// filename.
fn suggested_filename(input: &QuoteInput) -> String {
    fn sanitize(s: &str) -> String {
        s.trim()
            .chars()
            .map(|c| match c {
                c if c.is_whitespace() => '_',
                '/' | '\\' => '-',
                c => c,
            })
            .collect()
    }
    format!(
        "{}_Estimate_{}.pdf",
        sanitize(&input.clinic_name),
        sanitize(&input.patient_name)
    )
}
