//! Fee escalation across dispute and proposal rounds.

use arbiter_types::Amount;

/// Round-1 dispute fee: a tenth of the stake amount, never below the
/// configured floor and never above the stake amount itself.
pub fn base_dispute_fee(stake_amount: Amount, min_dispute_fee: Amount) -> Amount {
    (stake_amount / 10).max(min_dispute_fee).min(stake_amount)
}

/// Fee for `round` (1-based): `min(cap, base * 2^(round - 1))`.
pub fn round_fee(base: Amount, round: u32, cap: Amount) -> Amount {
    let doublings = round.saturating_sub(1);
    let fee = if doublings >= Amount::BITS {
        None
    } else {
        base.checked_mul(1 << doublings)
    };
    fee.unwrap_or(Amount::MAX).min(cap)
}
