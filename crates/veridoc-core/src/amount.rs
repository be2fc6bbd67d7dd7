//! Reward-token amounts in integer base units.
//!
//! All escrow and payout arithmetic runs on `u128` base units (18 decimal
//! places, matching the native token) so that totals like `5.0 + 0.01`
//! are exact. Decimal strings appear only at the human edges.

use crate::error::CoreError;

/// Base-unit scale: 10^18 units per whole token.
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

const DECIMALS: usize = 18;

/// Parse a human-entered decimal token amount into base units.
///
/// Accepts `"5"`, `"5.0"`, `"0.01"`, `".5"`. Rejects empty input, more than
/// 18 fractional digits, and anything that is not plain decimal notation.
pub fn parse_amount(s: &str) -> Result<u128, CoreError> {
    let s = s.trim();
    if s.is_empty() || s == "." {
        return Err(CoreError::MalformedAmount(s.to_string()));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if frac.len() > DECIMALS
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(CoreError::MalformedAmount(s.to_string()));
    }

    let whole_units = if whole.is_empty() {
        0u128
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| CoreError::MalformedAmount(s.to_string()))?
            .checked_mul(UNITS_PER_TOKEN)
            .ok_or(CoreError::AmountOverflow)?
    };

    let frac_units = if frac.is_empty() {
        0u128
    } else {
        let scale = 10u128.pow((DECIMALS - frac.len()) as u32);
        frac.parse::<u128>()
            .map_err(|_| CoreError::MalformedAmount(s.to_string()))?
            * scale
    };

    whole_units
        .checked_add(frac_units)
        .ok_or(CoreError::AmountOverflow)
}

/// Format base units back into a decimal token string, trimming trailing
/// fractional zeros.
pub fn format_amount(units: u128) -> String {
    let whole = units / UNITS_PER_TOKEN;
    let frac = units % UNITS_PER_TOKEN;
    if frac == 0 {
        return format!("{whole}.0");
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Total value escrowed on task creation: validator reward pool plus the
/// fixed per-task issuer bonus.
pub fn escrow_total(reward_amount: u128, issuer_bonus: u128) -> Result<u128, CoreError> {
    reward_amount
        .checked_add(issuer_bonus)
        .ok_or(CoreError::AmountOverflow)
}

/// Breakdown of a finalised task's reward pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutSplit {
    /// Amount each validator receives.
    pub per_validator: u128,
    /// Platform fee taken off the pool before the split.
    pub platform_fee: u128,
    /// Integer-division dust left after the per-validator split; retained
    /// by the contract treasury alongside the fee.
    pub remainder: u128,
}

/// Split a reward pool across validators, net of a basis-point platform fee.
///
/// The fixed issuer bonus is not part of the pool and is routed whole to
/// the issuer by the contract; it never enters this split.
pub fn payout_split(
    pool: u128,
    validators: u32,
    fee_bps: u16,
) -> Result<PayoutSplit, CoreError> {
    if validators == 0 {
        return Err(CoreError::MalformedAmount("zero validators".to_string()));
    }
    let platform_fee = pool
        .checked_mul(fee_bps as u128)
        .ok_or(CoreError::AmountOverflow)?
        / 10_000;
    let net = pool - platform_fee;
    let per_validator = net / validators as u128;
    let remainder = net % validators as u128;
    Ok(PayoutSplit {
        per_validator,
        platform_fee,
        remainder,
    })
}
