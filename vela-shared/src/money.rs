/// Formats an amount in cents as a USD string, e.g. `1234567` → `$12,345.67`.
pub fn format_usd(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let dollars = abs / 100;
    let remainder = abs % 100;

    let raw = dollars.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}.{:02}", grouped, remainder)
    } else {
        format!("${}.{:02}", grouped, remainder)
    }
}

/// Ceiling for any single price, quote or invoice total: $1bn.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// `amount * percent / 100`, rounded half-up to whole cents. Saturates
/// instead of overflowing.
pub fn percent_of(amount: i64, percent: u32) -> i64 {
    let scaled = (i128::from(amount) * i128::from(percent) + 50) / 100;
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(1234567), "$12,345.67");
        assert_eq!(format_usd(100_000_000), "$1,000,000.00");
        assert_eq!(format_usd(-2550), "-$25.50");
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        assert_eq!(percent_of(1000, 10), 100);
        assert_eq!(percent_of(999, 5), 50); // 49.95
        assert_eq!(percent_of(10_001, 25), 2500); // 2500.25
    }

    #[test]
    fn test_percent_of_large_amounts() {
        assert_eq!(percent_of(i64::MAX / 5, 10), (i64::MAX / 5 + 5) / 10);
        assert_eq!(percent_of(i64::MAX, 100), i64::MAX);
        assert_eq!(percent_of(i64::MAX, 200), i64::MAX);
    }
}
