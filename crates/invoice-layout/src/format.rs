//! Display formatting for money, quantities, rates and dates

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round half-up to cents and format as `$1,234.50`
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Quantities print without trailing zeros: `2`, `1.5`
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

/// A rate in `0..=1` as a percentage: `0.07` becomes `7%`
pub fn format_percent(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{percent}%")
}

/// Format a date with a strftime pattern, falling back to ISO 8601
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return date.format("%Y-%m-%d").to_string();
    }
    date.format_with_items(items.into_iter()).to_string()
}
