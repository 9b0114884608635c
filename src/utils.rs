// src/utils.rs
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Format large numbers in a human-readable way
pub fn format_number(num: f64) -> String {
    if num >= 1_000_000_000.0 {
        format!("{:.2}B", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("{:.2}M", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.2}K", num / 1_000.0)
    } else {
        format!("{:.2}", num)
    }
}

/// Format a price with appropriate decimal places
pub fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.4}", price)
    } else if price >= 0.01 {
        format!("${:.6}", price)
    } else {
        format!("${:.8}", price)
    }
}

/// Percentages as people write them: `15`, `12.5`, `33.33`.
pub fn format_percent(pct: f64) -> String {
    match Decimal::from_f64(pct) {
        Some(d) => d.round_dp(2).normalize().to_string(),
        None => format!("{:.2}", pct),
    }
}

/// Whole dollars with thousands separators: `10000.0` -> `$10,000`.
pub fn format_usd_whole(amount: f64) -> String {
    let whole = amount.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

/// Validate Solana address format
pub fn is_valid_solana_address(address: &str) -> bool {
    // base58, 32 bytes once decoded
    address.len() >= 32
        && address.len() <= 44
        && bs58::decode(address)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false)
}

/// Validate Ethereum address format
pub fn is_valid_ethereum_address(address: &str) -> bool {
    // Ethereum addresses are 42 characters starting with 0x
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}
