/// Deposit tokens represented by `shares` out of a pool of `pool_balance`
///
/// Formula: value = shares * pool_balance / total_shares, computed in u128.
///
/// # Returns
/// `None` when `total_shares` is zero or the result does not fit in u64
pub fn proportional_value(shares: u64, pool_balance: u64, total_shares: u64) -> Option<u64> {
    if total_shares == 0 {
        return None;
    }
    let value = (shares as u128)
        .checked_mul(pool_balance as u128)?
        .checked_div(total_shares as u128)?;
    u64::try_from(value).ok()
}

/// Formats raw token units as a decimal string with `decimals` fractional digits
///
/// Trailing fractional zeros are trimmed: `format_token_amount(1_500_000, 6)` is `"1.5"`.
pub fn format_token_amount(raw: u64, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let (int_part, frac_part) = match 10u128.checked_pow(decimals as u32) {
        Some(scale) => (raw as u128 / scale, raw as u128 % scale),
        None => (0, raw as u128),
    };

    if frac_part == 0 {
        return int_part.to_string();
    }
    let frac = format!("{:0width$}", frac_part, width = decimals as usize);
    format!("{}.{}", int_part, frac.trim_end_matches('0'))
}
