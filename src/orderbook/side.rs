//! One side of a product book: an ordered map from price to level.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::gdax::types::Side;
use crate::orderbook::level::PriceLevel;

/// Price levels for one side, sorted by price.
///
/// BTreeMap keeps the keys ordered, so the best price is the last key for
/// bids and the first key for asks, and both lookups are logarithmic.
#[derive(Debug, Clone)]
pub struct SideBook {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Highest price for bids, lowest for asks; `None` when the side is empty.
    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// The level at the best price.
    pub fn best_level(&self) -> Option<(Decimal, &PriceLevel)> {
        match self.side {
            Side::Buy => self.levels.iter().next_back(),
            Side::Sell => self.levels.iter().next(),
        }
        .map(|(price, level)| (*price, level))
    }

    pub fn level(&self, price: &Decimal) -> Option<&PriceLevel> {
        self.levels.get(price)
    }

    pub fn level_mut(&mut self, price: &Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(price)
    }

    /// The level at `price`, creating an empty one if missing. The caller
    /// must leave it non-empty.
    pub fn ensure(&mut self, price: Decimal) -> &mut PriceLevel {
        self.levels.entry(price).or_default()
    }

    pub fn remove(&mut self, price: &Decimal) -> Option<PriceLevel> {
        self.levels.remove(price)
    }

    /// Levels in ascending price order, both sides.
    pub fn iter(&self) -> impl Iterator<Item = (&Decimal, &PriceLevel)> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::level::Order;
    use rust_decimal_macros::dec;

    fn seed(side: Side, prices: &[Decimal]) -> SideBook {
        let mut book = SideBook::new(side);
        for (i, price) in prices.iter().enumerate() {
            book.ensure(*price).append(Order {
                id: format!("o{i}"),
                side,
                price: *price,
                size: dec!(1),
            });
        }
        book
    }

    #[test]
    fn best_bid_is_max_key() {
        let book = seed(Side::Buy, &[dec!(2525.00), dec!(2595.70), dec!(2595.52)]);
        assert_eq!(book.best_price(), Some(dec!(2595.70)));
    }

    #[test]
    fn best_ask_is_min_key() {
        let book = seed(Side::Sell, &[dec!(2615.1), dec!(2596.74), dec!(2620.18)]);
        assert_eq!(book.best_price(), Some(dec!(2596.74)));
    }

    #[test]
    fn empty_side_has_no_best() {
        assert_eq!(SideBook::new(Side::Buy).best_price(), None);
        assert_eq!(SideBook::new(Side::Sell).best_level().map(|(p, _)| p), None);
    }

    #[test]
    fn ensure_reuses_existing_level() {
        let mut book = seed(Side::Sell, &[dec!(2620.18)]);
        book.ensure(dec!(2620.18)).append(Order {
            id: "late".to_string(),
            side: Side::Sell,
            price: dec!(2620.18),
            size: dec!(2),
        });
        assert_eq!(book.len(), 1);
        assert_eq!(book.level(&dec!(2620.18)).unwrap().len(), 2);
    }

    #[test]
    fn iteration_is_ascending_for_both_sides() {
        let bids = seed(Side::Buy, &[dec!(3), dec!(1), dec!(2)]);
        let prices: Vec<_> = bids.iter().map(|(price, _)| *price).collect();
        assert_eq!(prices, [dec!(1), dec!(2), dec!(3)]);

        let asks = seed(Side::Sell, &[dec!(3), dec!(1), dec!(2)]);
        let prices: Vec<_> = asks.iter().map(|(price, _)| *price).collect();
        assert_eq!(prices, [dec!(1), dec!(2), dec!(3)]);
    }

    #[test]
    fn remove_deletes_the_level() {
        let mut book = seed(Side::Sell, &[dec!(2596.74)]);
        assert!(book.remove(&dec!(2596.74)).is_some());
        assert!(book.is_empty());
        assert!(book.remove(&dec!(2596.74)).is_none());
    }
}
