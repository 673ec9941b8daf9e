//! Line items and the ordered cart state.

use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line item.
///
/// Quantities saturate here instead of overflowing.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// A product and how many of it the shopper wants.
///
/// Persisted and sent to the backend as `{"producto_id": .., "cantidad": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog identifier.
    #[serde(rename = "producto_id", alias = "productId", alias = "product_id")]
    pub product_id: ProductId,
    /// Always at least 1 while the item is in a cart.
    #[serde(rename = "cantidad", alias = "quantity")]
    pub quantity: i64,
}

impl LineItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// What a mutation did to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartChange {
    /// A line was inserted or its quantity increased.
    Added { product_id: ProductId, quantity: i64 },
    /// A line's quantity was set or decreased.
    QuantitySet { product_id: ProductId, quantity: i64 },
    /// A line was removed.
    Removed { product_id: ProductId },
    /// Every line was removed.
    Cleared,
    /// Contents were replaced from storage.
    Reloaded,
}

impl CartChange {
    /// The product the change concerns, if it concerns a single one.
    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            CartChange::Added { product_id, .. }
            | CartChange::QuantitySet { product_id, .. }
            | CartChange::Removed { product_id } => Some(product_id),
            CartChange::Cleared | CartChange::Reloaded => None,
        }
    }
}

/// Ordered line items, at most one per product.
///
/// Pure data: every mutator returns the effective change, or `None` when
/// the call left the cart untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    items: Vec<LineItem>,
}

/// Counters describing what [`CartState::from_persisted`] had to fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalization {
    /// Entries merged into an earlier line with the same product.
    pub merged: usize,
    /// Entries dropped for a blank id or a non-positive quantity.
    pub dropped: usize,
}

impl Normalization {
    pub fn is_clean(&self) -> bool {
        self.merged == 0 && self.dropped == 0
    }
}

impl CartState {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted entries.
    ///
    /// Duplicate products are merged into the first occurrence, and entries
    /// with a blank id or a non-positive quantity are dropped.
    pub fn from_persisted(entries: Vec<LineItem>) -> (Self, Normalization) {
        let mut state = Self::new();
        let mut report = Normalization::default();

        for entry in entries {
            if entry.product_id.is_blank() || entry.quantity <= 0 {
                report.dropped += 1;
                continue;
            }
            match state.position(&entry.product_id) {
                Some(idx) => {
                    let line = &mut state.items[idx];
                    line.quantity = saturate(line.quantity.saturating_add(entry.quantity));
                    report.merged += 1;
                }
                None => state.items.push(LineItem {
                    quantity: saturate(entry.quantity),
                    ..entry
                }),
            }
        }

        (state, report)
    }

    /// Add `quantity` to a product's line (negative values decrement).
    pub fn add(&mut self, product_id: &ProductId, quantity: i64) -> Option<CartChange> {
        if product_id.is_blank() {
            return None;
        }

        let Some(idx) = self.position(product_id) else {
            if quantity <= 0 {
                return None;
            }
            let quantity = saturate(quantity);
            self.items.push(LineItem::new(product_id.clone(), quantity));
            return Some(CartChange::Added {
                product_id: product_id.clone(),
                quantity,
            });
        };

        let current = self.items[idx].quantity;
        let next = current.saturating_add(quantity);
        if next <= 0 {
            self.items.remove(idx);
            return Some(CartChange::Removed {
                product_id: product_id.clone(),
            });
        }

        let next = saturate(next);
        if next == current {
            return None;
        }
        self.items[idx].quantity = next;
        if next > current {
            Some(CartChange::Added {
                product_id: product_id.clone(),
                quantity: next,
            })
        } else {
            Some(CartChange::QuantitySet {
                product_id: product_id.clone(),
                quantity: next,
            })
        }
    }

    /// Set a product's absolute quantity; `<= 0` removes the line.
    pub fn set(&mut self, product_id: &ProductId, quantity: i64) -> Option<CartChange> {
        if product_id.is_blank() {
            return None;
        }
        if quantity <= 0 {
            return self.remove(product_id);
        }

        let quantity = saturate(quantity);
        match self.position(product_id) {
            Some(idx) if self.items[idx].quantity == quantity => None,
            Some(idx) => {
                self.items[idx].quantity = quantity;
                Some(CartChange::QuantitySet {
                    product_id: product_id.clone(),
                    quantity,
                })
            }
            None => {
                self.items.push(LineItem::new(product_id.clone(), quantity));
                Some(CartChange::QuantitySet {
                    product_id: product_id.clone(),
                    quantity,
                })
            }
        }
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartChange> {
        let idx = self.position(product_id)?;
        self.items.remove(idx);
        Some(CartChange::Removed {
            product_id: product_id.clone(),
        })
    }

    /// Remove every line.
    pub fn clear(&mut self) -> Option<CartChange> {
        if self.items.is_empty() {
            return None;
        }
        self.items.clear();
        Some(CartChange::Cleared)
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Quantity of a product, zero when absent.
    pub fn quantity_of(&self, product_id: &ProductId) -> i64 {
        self.items
            .iter()
            .find(|i| &i.product_id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items
            .iter()
            .fold(0_i64, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Number of distinct products.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items.iter().position(|i| &i.product_id == product_id)
    }
}

fn saturate(quantity: i64) -> i64 {
    quantity.min(MAX_QUANTITY_PER_ITEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = CartState::new();
        assert_eq!(
            cart.add(&pid("p1"), 2),
            Some(CartChange::Added { product_id: pid("p1"), quantity: 2 })
        );
        cart.add(&pid("p1"), 3);
        assert_eq!(cart.quantity_of(&pid("p1")), 5);
        assert_eq!(cart.unique_item_count(), 1);
    }

    #[test]
    fn test_add_non_positive_to_absent_is_noop() {
        let mut cart = CartState::new();
        assert_eq!(cart.add(&pid("p1"), 0), None);
        assert_eq!(cart.add(&pid("p1"), -2), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_negative_removes_when_reaching_zero() {
        let mut cart = CartState::new();
        cart.add(&pid("p1"), 2);
        assert!(matches!(
            cart.add(&pid("p1"), -1),
            Some(CartChange::QuantitySet { quantity: 1, .. })
        ));
        assert!(matches!(cart.add(&pid("p1"), -5), Some(CartChange::Removed { .. })));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_twice_equals_set_to_sum() {
        let mut a = CartState::new();
        a.add(&pid("p1"), 2);
        a.add(&pid("p1"), 3);

        let mut b = CartState::new();
        b.set(&pid("p1"), 5);

        assert_eq!(a.items(), b.items());
    }

    #[test]
    fn test_negative_add_to_absent_is_not_carried() {
        // A decrement on an absent product is dropped, so it does not
        // offset a later increment.
        let mut a = CartState::new();
        a.add(&pid("p1"), -1);
        a.add(&pid("p1"), 3);
        assert_eq!(a.items(), &[LineItem::new("p1", 3)]);

        let mut b = CartState::new();
        b.set(&pid("p1"), 2);
        assert_ne!(a.items(), b.items());
    }

    #[test]
    fn test_set_zero_removes_and_is_idempotent() {
        let mut cart = CartState::new();
        cart.add(&pid("p1"), 2);
        assert!(cart.set(&pid("p1"), 0).is_some());
        assert!(cart.set(&pid("p1"), 0).is_none());
        assert!(cart.set(&pid("p1"), -3).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_same_quantity_is_noop() {
        let mut cart = CartState::new();
        cart.set(&pid("p1"), 4);
        assert_eq!(cart.set(&pid("p1"), 4), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = CartState::new();
        cart.add(&pid("p1"), 1);
        assert!(cart.remove(&pid("p1")).is_some());
        assert!(cart.remove(&pid("p1")).is_none());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = CartState::new();
        cart.add(&pid("c"), 1);
        cart.add(&pid("a"), 1);
        cart.add(&pid("b"), 1);
        cart.add(&pid("c"), 1);
        let ids: Vec<&str> = cart.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_quantity_saturates() {
        let mut cart = CartState::new();
        cart.add(&pid("p1"), MAX_QUANTITY_PER_ITEM - 1);
        cart.add(&pid("p1"), 10);
        assert_eq!(cart.quantity_of(&pid("p1")), MAX_QUANTITY_PER_ITEM);
        assert_eq!(cart.add(&pid("p1"), 1), None);

        cart.add(&pid("p2"), i64::MAX);
        assert_eq!(cart.quantity_of(&pid("p2")), MAX_QUANTITY_PER_ITEM);
    }

    #[test]
    fn test_blank_product_is_noop() {
        let mut cart = CartState::new();
        assert_eq!(cart.add(&pid("  "), 1), None);
        assert_eq!(cart.set(&pid(""), 1), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = CartState::new();
        assert_eq!(cart.clear(), None);
        cart.add(&pid("p1"), 1);
        cart.add(&pid("p2"), 1);
        assert_eq!(cart.clear(), Some(CartChange::Cleared));
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_from_persisted_normalizes() {
        let (cart, report) = CartState::from_persisted(vec![
            LineItem::new("p1", 2),
            LineItem::new("", 1),
            LineItem::new("p2", 0),
            LineItem::new("p1", 3),
            LineItem::new("p3", -1),
        ]);
        assert_eq!(cart.items(), &[LineItem::new("p1", 5)]);
        assert_eq!(report, Normalization { merged: 1, dropped: 3 });
        assert!(!report.is_clean());
    }

    #[test]
    fn test_line_item_wire_names() {
        let json = serde_json::to_string(&LineItem::new("p1", 2)).unwrap();
        assert_eq!(json, r#"{"producto_id":"p1","cantidad":2}"#);

        let item: LineItem = serde_json::from_str(r#"{"productId":"p9","quantity":4}"#).unwrap();
        assert_eq!(item, LineItem::new("p9", 4));
    }
}
