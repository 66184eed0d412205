//! Display helpers for amounts and ratios. Total over every `f64`, including NaN and
//! infinities, so formatting never fails on extreme input.

/// Whole-dollar amount with thousands separators: `$12,345`, `-$600`.
pub fn currency(amount: f64) -> String {
    let (negative, digits) = whole_dollars(amount);
    if negative {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Like [`currency`] but always signed: `+$10,000`, `-$2,500`.
pub fn signed_currency(amount: f64) -> String {
    let (negative, digits) = whole_dollars(amount);
    if negative {
        format!("-${digits}")
    } else {
        format!("+${digits}")
    }
}

/// Fraction rendered as a percentage with the given precision: `0.2499` -> `25.0%`.
pub fn percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

fn whole_dollars(amount: f64) -> (bool, String) {
    let rounded = amount.abs().round();
    // `as` saturates, NaN becomes 0
    let whole = rounded as u64;
    (amount < 0.0 && whole > 0, group_thousands(whole))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(currency(0.0), "$0");
        assert_eq!(currency(999.4), "$999");
        assert_eq!(currency(75_000.0), "$75,000");
        assert_eq!(currency(1_234_567.8), "$1,234,568");
        assert_eq!(currency(-60_000.0), "-$60,000");
    }

    #[test]
    fn signs_deltas() {
        assert_eq!(signed_currency(10_000.0), "+$10,000");
        assert_eq!(signed_currency(10_000.0 / 12.0), "+$833");
        assert_eq!(signed_currency(-2500.0), "-$2,500");
        assert_eq!(signed_currency(-0.2), "+$0");
    }

    #[test]
    fn tolerates_non_finite_amounts() {
        assert_eq!(currency(f64::NAN), "$0");
        assert!(currency(f64::INFINITY).starts_with('$'));
        assert_eq!(percent(0.2499, 1), "25.0%");
    }
}
