//! Common utility functions for tax calculations.

use rust_decimal::Decimal;

/// Formats the integer part of `value` with `,` thousands separators.
///
/// Fractional digits are dropped, not rounded.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::format_thousands;
///
/// assert_eq!(format_thousands(dec!(0)), "0");
/// assert_eq!(format_thousands(dec!(150001)), "150,001");
/// assert_eq!(format_thousands(dec!(2000000.75)), "2,000,000");
/// assert_eq!(format_thousands(dec!(-1234567)), "-1,234,567");
/// ```
pub fn format_thousands(value: Decimal) -> String {
    let integer = value.trunc();
    let digits = integer.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if integer.is_sign_negative() && !integer.is_zero() {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `amount × rate / 100`, with `rate` given as a percentage. `None` if the
/// product does not fit in a `Decimal`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::percent_of;
///
/// assert_eq!(percent_of(dec!(290000), dec!(10)), Some(dec!(29000)));
/// assert_eq!(percent_of(dec!(440000), dec!(0)), Some(dec!(0)));
/// ```
pub fn percent_of(
    amount: Decimal,
    rate: Decimal,
) -> Option<Decimal> {
    amount.checked_mul(rate)?.checked_div(Decimal::ONE_HUNDRED)
}
