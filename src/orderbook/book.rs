//! Per-product book: both sides plus the applied-sequence cursor.
//!
//! All mutation funnels through [`ProductBook::apply`], which enforces the
//! feed's sequence discipline before dispatching on the message kind:
//! a stale message (at or below the cursor) is discarded without effect,
//! a jump past `cursor + 1` reports a gap so the engine can rebuild from a
//! fresh snapshot, and only the exact successor mutates the book.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{GdaxError, Result};
use crate::gdax::types::{BookSnapshot, FeedMessage, Side, SnapshotOrder};
use crate::orderbook::level::{Order, PriceLevel};
use crate::orderbook::side::SideBook;

/// What [`ProductBook::apply`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The sequence advanced; the book reflects the message.
    Applied,
    /// Pre-snapshot residue or duplicate; ignored.
    Stale,
    /// Sequence jumped past the expected successor. The book was not
    /// touched and must be rebuilt from a fresh snapshot.
    Gap,
}

#[derive(Debug, Clone)]
pub struct ProductBook {
    product_id: String,
    bids: SideBook,
    asks: SideBook,
    /// Sequence of the most recently applied update, `None` until seeded.
    sequence: Option<u64>,
}

impl ProductBook {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            bids: SideBook::new(Side::Buy),
            asks: SideBook::new(Side::Sell),
            sequence: None,
        }
    }

    pub fn from_snapshot(product_id: impl Into<String>, snapshot: &BookSnapshot) -> Self {
        let mut book = Self::new(product_id);
        book.seed(snapshot);
        book
    }

    /// Inserts every snapshot row in listed order, which preserves time
    /// priority within a price, then moves the cursor to the snapshot's
    /// sequence. Expects an empty book.
    pub fn seed(&mut self, snapshot: &BookSnapshot) {
        for SnapshotOrder(price, size, id) in &snapshot.bids {
            self.add(Order {
                id: id.clone(),
                side: Side::Buy,
                price: *price,
                size: *size,
            });
        }
        for SnapshotOrder(price, size, id) in &snapshot.asks {
            self.add(Order {
                id: id.clone(),
                side: Side::Sell,
                price: *price,
                size: *size,
            });
        }
        self.sequence = Some(snapshot.sequence);
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    fn side(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Appends a resting order to its price level, creating the level if
    /// this is the first order at that price.
    pub fn add(&mut self, order: Order) {
        self.side_mut(order.side).ensure(order.price).append(order);
    }

    /// Removes one order, deleting its level if that was the last order.
    /// Unknown price or id is a no-op: the snapshot may simply not have
    /// contained the order.
    pub fn remove(&mut self, side: Side, price: Decimal, order_id: &str) {
        let book = self.side_mut(side);
        if let Some(level) = book.level_mut(&price) {
            level.remove_by_id(order_id);
            if level.is_empty() {
                book.remove(&price);
            }
        }
    }

    /// Consumes `size` from the maker at the head of the level.
    ///
    /// A missing level is ignored (the snapshot can pre-date the maker),
    /// but a maker that exists and is not at the head means our book has
    /// diverged from the exchange, which is fatal.
    pub fn execute_match(
        &mut self,
        side: Side,
        price: Decimal,
        maker_order_id: &str,
        size: Decimal,
    ) -> Result<()> {
        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let Some(level) = book.level_mut(&price) else {
            debug!(
                product_id = %self.product_id,
                price = %price,
                maker_order_id = %maker_order_id,
                "match at unknown level, ignoring"
            );
            return Ok(());
        };
        let Some(head) = level.head() else {
            return Ok(());
        };
        if head.id != maker_order_id {
            return Err(GdaxError::Integrity(format!(
                "match maker {maker_order_id} is not at the head of the {} level {price} \
                 for {}",
                side.as_str(),
                self.product_id,
            )));
        }
        level.decrement_head(size);
        if level.is_empty() {
            book.remove(&price);
        }
        Ok(())
    }

    /// Replaces the size of a resting order.
    ///
    /// A missing `price` means the order rests at the market price of its
    /// side (best bid for buys, best ask for sells); an empty side under
    /// that path is ignored, as is an order the book does not hold.
    pub fn change(&mut self, side: Side, price: Option<Decimal>, order_id: &str, new_size: Decimal) {
        let book = self.side_mut(side);
        let Some(price) = price.or_else(|| book.best_price()) else {
            return;
        };
        if let Some(level) = book.level_mut(&price) {
            level.update_size(order_id, new_size);
        }
    }

    /// Renders the book as a level-3 snapshot: `[price, size, id]` rows,
    /// both sides in ascending price order, time priority kept per level.
    /// Feeding the result to [`ProductBook::from_snapshot`] reproduces the
    /// book.
    pub fn snapshot(&self) -> BookSnapshot {
        fn render(side: &SideBook) -> Vec<SnapshotOrder> {
            side.iter()
                .flat_map(|(_, level)| level.iter())
                .map(|order| SnapshotOrder(order.price, order.size, order.id.clone()))
                .collect()
        }

        BookSnapshot {
            sequence: self.sequence.unwrap_or(0),
            bids: render(&self.bids),
            asks: render(&self.asks),
        }
    }

    pub fn best_bid_price(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    pub fn best_ask_price(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    pub fn level_at(&self, side: Side, price: Decimal) -> Option<&PriceLevel> {
        self.side(side).level(&price)
    }

    /// Total resting size at the side's best price.
    pub fn total_size_at_best(&self, side: Side) -> Option<Decimal> {
        self.side(side)
            .best_level()
            .map(|(_, level)| level.total_size())
    }

    /// Validates the message's sequence against the cursor, dispatches it,
    /// and advances the cursor. Only `Applied` mutates the book.
    pub fn apply(&mut self, message: &FeedMessage) -> Result<ApplyOutcome> {
        let Some(sequence) = message.sequence() else {
            return Err(GdaxError::Protocol(format!(
                "{} frame without a sequence",
                message.kind()
            )));
        };
        let Some(current) = self.sequence else {
            return Err(GdaxError::Integrity(format!(
                "book for {} was never seeded",
                self.product_id
            )));
        };

        if sequence <= current {
            debug!(
                product_id = %self.product_id,
                sequence,
                current,
                "stale message, ignoring"
            );
            return Ok(ApplyOutcome::Stale);
        }
        if sequence > current + 1 {
            warn!(
                product_id = %self.product_id,
                expected = current + 1,
                received = sequence,
                missing = sequence - current - 1,
                "sequence gap"
            );
            return Ok(ApplyOutcome::Gap);
        }

        self.dispatch(message)?;
        self.sequence = Some(sequence);
        Ok(ApplyOutcome::Applied)
    }

    fn dispatch(&mut self, message: &FeedMessage) -> Result<()> {
        match message {
            FeedMessage::Open {
                order_id,
                side,
                price,
                remaining_size,
                ..
            } => {
                self.add(Order {
                    id: order_id.clone(),
                    side: *side,
                    price: *price,
                    size: *remaining_size,
                });
            }
            FeedMessage::Done {
                order_id,
                side,
                price: Some(price),
                ..
            } => {
                self.remove(*side, *price, order_id);
            }
            // market-order close: nothing was resting
            FeedMessage::Done { .. } => {}
            FeedMessage::Match {
                maker_order_id,
                side,
                price,
                size,
                ..
            } => {
                self.execute_match(*side, *price, maker_order_id, *size)?;
            }
            FeedMessage::Change {
                new_funds: Some(_), ..
            } => {
                return Err(GdaxError::NotImplemented(
                    "change carrying new_funds (market order)",
                ));
            }
            FeedMessage::Change {
                order_id,
                side,
                price,
                new_size: Some(new_size),
                ..
            } => {
                self.change(*side, *price, order_id, *new_size);
            }
            FeedMessage::Change { .. } => {
                return Err(GdaxError::NotImplemented(
                    "change without new_size (market order)",
                ));
            }
            // pre-open and liveness frames advance the sequence only
            FeedMessage::Received { .. } | FeedMessage::Heartbeat { .. } => {}
            FeedMessage::Subscriptions { .. } | FeedMessage::Error { .. } => {
                return Err(GdaxError::Protocol(format!(
                    "{} frame routed to a product book",
                    message.kind()
                )));
            }
        }
        Ok(())
    }
}
