pub const ELLIPSIS: char = '…';

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_owned();
    }

    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

pub fn format_compact(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }

    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{value:.2}")
    }
}

/// Keeps the first `budget` characters and appends a single ellipsis when the
/// label is longer than that.
pub fn truncate_label(label: &str, budget: usize) -> String {
    let mut chars = label.chars();
    let head = chars.by_ref().take(budget).collect::<String>();
    if chars.next().is_some() {
        format!("{head}{ELLIPSIS}")
    } else {
        head
    }
}

pub fn truncate_address(address: &str, start_chars: usize, end_chars: usize) -> String {
    let length = address.chars().count();
    if length <= start_chars + end_chars {
        return address.to_owned();
    }

    let head = address.chars().take(start_chars).collect::<String>();
    let tail = address.chars().skip(length - end_chars).collect::<String>();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_label_keeps_short_labels() {
        assert_eq!(truncate_label("SUI / USDC", 12), "SUI / USDC");
        assert_eq!(truncate_label("ABCDEFGHIJKL", 12), "ABCDEFGHIJKL");
        assert_eq!(truncate_label("", 12), "");
    }

    #[test]
    fn truncate_label_appends_single_ellipsis() {
        let label = truncate_label("DEEP / WUSDC-LP", 12);
        assert_eq!(label, "DEEP / WUSDC…");
        assert_eq!(label.chars().count(), 13);
        assert_eq!(label.matches(ELLIPSIS).count(), 1);
    }

    #[test]
    fn truncate_label_counts_characters_not_bytes() {
        assert_eq!(truncate_label("ééééé", 3), "ééé…");
    }

    #[test]
    fn truncate_address_keeps_both_ends() {
        assert_eq!(truncate_address("0x1234567890abcdef", 6, 4), "0x1234...cdef");
        assert_eq!(truncate_address("0xabc", 6, 4), "0xabc");
    }

    #[test]
    fn format_currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(50_000_000.0), "$50,000,000.00");
        assert_eq!(format_currency(-12.5), "-$12.50");
        assert_eq!(format_currency(f64::NAN), "$0.00");
    }

    #[test]
    fn format_compact_picks_unit() {
        assert_eq!(format_compact(12.0), "12.00");
        assert_eq!(format_compact(1_500.0), "1.50K");
        assert_eq!(format_compact(2_000_000.0), "2.00M");
    }
}
