use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub type Money = Decimal;

/// A loan balance at or below this is treated as paid off.
pub const BALANCE_EPSILON: Money = dec!(0.005);

/// Rounds to cents, halves away from zero.
pub fn round_money(amt: Money) -> Money {
    amt.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
