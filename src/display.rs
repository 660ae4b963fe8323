/// Formats a price with no decimals and comma thousands separators,
/// e.g. `format_currency(1500000.4, "PKR") == "PKR 1,500,000"`.
pub fn format_currency(value: f64, currency: &str) -> String {
    let digits = format!("{:.0}", value.abs());
    let sign = if value.is_sign_negative() && digits != "0" {
        "-"
    } else {
        ""
    };
    let amount = format!("{}{}", sign, group_thousands(&digits));

    if currency.is_empty() {
        amount
    } else {
        format!("{} {}", currency, amount)
    }
}

fn group_thousands(digits: &str) -> String {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
