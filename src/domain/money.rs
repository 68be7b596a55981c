use std::fmt;

/// Monetary amounts are integer minor units (1.00 = 100).
pub type Money = i64;

/// Render minor units as `units.cc`.
/// Example: 1000 -> "10.00", -250 -> "-2.50"
pub fn format_money(amount: Money) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string into minor units.
/// Extra fractional digits past the second are truncated.
/// Example: "10" -> 1000, "10.5" -> 1050, "0.01" -> 1
pub fn parse_money(input: &str) -> Result<Money, ParseMoneyError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, fraction_str) = digits.split_once('.').unwrap_or((digits, ""));
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(ParseMoneyError::InvalidFormat);
    }

    let units: Money = if units_str.is_empty() {
        0
    } else {
        parse_digits(units_str)?
    };

    // Checked up front so the two-byte cut below lands on a char boundary.
    if !fraction_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseMoneyError::InvalidFormat);
    }
    let fraction: Money = match fraction_str.len() {
        0 => 0,
        1 => parse_digits(fraction_str)? * 10,
        _ => parse_digits(&fraction_str[..2])?,
    };

    let amount = units
        .checked_mul(100)
        .and_then(|minor| minor.checked_add(fraction))
        .ok_or(ParseMoneyError::Overflow)?;

    Ok(if negative { -amount } else { amount })
}

fn parse_digits(s: &str) -> Result<Money, ParseMoneyError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseMoneyError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseMoneyError::Overflow)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMoneyError::InvalidFormat => write!(f, "invalid money format"),
            ParseMoneyError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseMoneyError {}
