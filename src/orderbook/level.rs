//! Price level: the FIFO of resting orders at a single price.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::gdax::types::Side;

/// A resting limit order as tracked by the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Exchange-assigned identifier; opaque.
    pub id: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
}

/// All orders resting at one price on one side, in time priority.
///
/// Insertion order is arrival order; the head is the next maker at this
/// price. The owning [`SideBook`](crate::orderbook::SideBook) removes a
/// level in the same operation that empties it, so a level that exists is
/// never empty between messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the tail (loses time priority to everything resting).
    pub fn append(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Removes the first order with this id. Returns whether one was found.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        match self.orders.iter().position(|order| order.id == id) {
            Some(index) => {
                self.orders.remove(index);
                true
            }
            None => false,
        }
    }

    /// The order with time priority at this price.
    pub fn head(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Reduces the head's size, popping it when the size reaches zero.
    /// Silently does nothing on an empty level.
    pub fn decrement_head(&mut self, size: Decimal) {
        let Some(head) = self.orders.front_mut() else {
            return;
        };
        head.size -= size;
        if head.size.is_zero() {
            self.orders.pop_front();
        }
    }

    /// Replaces the size of the order with this id; no-op when absent.
    /// Queue position is kept, per the exchange's change semantics.
    pub fn update_size(&mut self, id: &str, new_size: Decimal) {
        if let Some(order) = self.orders.iter_mut().find(|order| order.id == id) {
            order.size = new_size;
        }
    }

    /// Total resting size at this price (the level's depth).
    pub fn total_size(&self) -> Decimal {
        self.orders.iter().map(|order| order.size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Orders in time priority, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
