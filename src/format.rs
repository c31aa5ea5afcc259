// Display helpers shared by the terminal UI and the web page

/// Format an amount as Brazilian reais: `R$ 1.234,56`
pub fn format_brl(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (integer, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    // -0.001 rounds to 0,00 and should not print a sign
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}R$ {},{}", sign, grouped, cents)
}

/// Parse an amount typed by a person: comma or dot as decimal separator.
///
/// Thousands separators are not accepted; `1.234,56` is rejected rather than
/// guessed.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || (trimmed.contains(',') && trimmed.contains('.')) {
        return None;
    }

    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(103.0927835), "R$ 103,09");
        assert_eq!(format_brl(1234.5), "R$ 1.234,50");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(-42.6), "-R$ 42,60");
        assert_eq!(format_brl(-0.001), "R$ 0,00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50"), Some(12.5));
        assert_eq!(parse_amount(" 12,50 "), Some(12.5));
        assert_eq!(parse_amount("100"), Some(100.0));
        assert_eq!(parse_amount("-3"), Some(-3.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1.234,56"), None);
        assert_eq!(parse_amount("inf"), None);
    }
}
