//! Unit conversion between smallest denomination and display strings.
//!
//! Integer arithmetic only; `f64` loses precision past 2^53 wei.

/// Decimals of the native currency (wei per ether = 10^18)
pub const ETHER_DECIMALS: u32 = 18;

/// Format `value` with `decimals` fractional digits.
///
/// Trailing zeros are trimmed but at least one fractional digit is kept,
/// so one ether renders as `"1.0"`.
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return format!("{}.0", value);
    }

    // 10^39 does not fit in u128; every value is then purely fractional
    let (whole, fraction) = match 10u128.checked_pow(decimals) {
        Some(base) => (value / base, value % base),
        None => (0, value),
    };

    let mut fraction_str = format!("{:0width$}", fraction, width = decimals as usize);
    while fraction_str.len() > 1 && fraction_str.ends_with('0') {
        fraction_str.pop();
    }

    format!("{}.{}", whole, fraction_str)
}

/// Format a wei amount as ether
pub fn format_ether(wei: u128) -> String {
    format_units(wei, ETHER_DECIMALS)
}

/// Parse a JSON-RPC hex quantity (`0x1a`) into an integer
pub fn parse_quantity(hex_quantity: &str) -> Option<u128> {
    let digits = hex_quantity.strip_prefix("0x")?;
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, 16).ok()
}
