// Representative price selection for a unit-size bucket
use crate::model::Price;
use std::cmp::Ordering;

/// Ranks `p` against `c`; `Less` means `p` is the better representative.
/// Newer trade dates win, and on the same date the lower price wins.
pub fn representative_order(p: &Price, c: &Price) -> Ordering {
    c.trade_date
        .cmp(&p.trade_date)
        .then_with(|| p.low_trade_price.cmp(&c.low_trade_price))
}

/// Top entry of `prices` under [`representative_order`]. Full ties keep the
/// first entry seen.
pub fn select_representative(prices: &[Price]) -> Option<&Price> {
    prices.iter().min_by(|a, b| representative_order(a, b))
}
