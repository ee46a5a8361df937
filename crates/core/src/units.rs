//! Amounts and decimal unit conversion

use crate::error::{CoreError, CoreResult};

/// Quantity in base units (wei for native currency, base units for tokens)
pub type Amount = u128;

/// Decimals used by the native currency and the default governance token
pub const DEFAULT_DECIMALS: u32 = 18;

/// One whole unit of an 18 decimal asset
pub const ETHER: Amount = 1_000_000_000_000_000_000;

/// `whole` units of an 18 decimal asset in base units
pub const fn ether(whole: u64) -> Amount {
    whole as Amount * ETHER
}

/// Convert a decimal string such as `"1.5"` into base units
pub fn parse_units(text: &str, decimals: u32) -> CoreResult<Amount> {
    let invalid = || CoreError::InvalidAmount(text.to_string());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if fraction.len() > decimals as usize
        || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
        || (whole.is_empty() && fraction.is_empty())
    {
        return Err(invalid());
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| invalid())?
    };
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction_units = if padded.is_empty() {
        0
    } else {
        padded.parse::<u128>().map_err(|_| invalid())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(invalid)
}

/// Render base units as a decimal string without trailing zeros
pub fn format_units(amount: Amount, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
