use crate::error::Error;
use crate::model::QuoteResult;

/// Days per year for amortization. Calendar-ignorant by design: the original
/// pitch math uses flat 365-day years, not leap-year-aware durations.
const DAYS_PER_YEAR: i64 = 365;

/// Net price and amortized daily cost for a quote.
///
/// `net_price = sticker_price - discount`, without clamping: a discount larger
/// than the sticker price yields a negative net price and flows through
/// unchanged. `daily_cost` keeps the exact quotient; display-time formatting
/// decides how to truncate it.
///
/// Defined for all `horizon_years > 0`. Non-positive horizons and inputs whose
/// arithmetic would overflow `i64` fail with [`Error::InvalidInput`]; the
/// entry-point validation additionally restricts the horizon to 5..=30.
pub fn compute(sticker_price: i64, discount: i64, horizon_years: i64) -> Result<QuoteResult, Error> {
    if horizon_years <= 0 {
        return Err(Error::InvalidInput(format!(
            "horizon_years must be positive, got {horizon_years}"
        )));
    }
    let net_price = sticker_price.checked_sub(discount).ok_or_else(|| {
        Error::InvalidInput(format!(
            "sticker_price {sticker_price} minus discount {discount} overflows"
        ))
    })?;
    let days = horizon_years.checked_mul(DAYS_PER_YEAR).ok_or_else(|| {
        Error::InvalidInput(format!("horizon_years {horizon_years} is too large"))
    })?;
    let daily_cost = net_price as f64 / days as f64;
    Ok(QuoteResult { net_price, daily_cost })
}
