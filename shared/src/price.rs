//! Money formatting helpers
//!
//! Amounts travel as integer minor units (cents). Formatting stays in
//! integer arithmetic so the printed price can never pick up float
//! rounding drift.

/// Format minor units as display currency text
///
/// ZAR uses the "R" symbol; any other currency is prefixed by its code.
///
/// # Examples
///
/// ```
/// use shared::price::format_minor_units;
///
/// assert_eq!(format_minor_units(15900, "ZAR"), "R159.00");
/// assert_eq!(format_minor_units(1250, "AED"), "AED12.50");
/// ```
pub fn format_minor_units(minor_units: i64, currency: &str) -> String {
    let symbol = currency_symbol(currency);
    let units = minor_units / 100;
    let cents = (minor_units % 100).abs();
    format!("{}{}.{:02}", symbol, units, cents)
}

fn currency_symbol(currency: &str) -> &str {
    match currency {
        "ZAR" => "R",
        other => other,
    }
}
