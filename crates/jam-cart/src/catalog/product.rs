//! Catalog products and caller-level stock checks.

use crate::cart::MAX_QUANTITY_PER_ITEM;
use crate::error::CartError;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A jam as the catalog describes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: Option<String>,
    /// Current unit price.
    pub price: Money,
    /// Units the seller can supply right now.
    pub stock: i64,
    /// Whether the listing is published.
    pub active: bool,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Main image.
    pub image_url: Option<String>,
}

impl Product {
    /// Check if the product can be bought at all.
    pub fn is_available(&self) -> bool {
        self.active && self.stock > 0
    }

    /// Largest quantity a single cart line may hold for this product.
    pub fn max_orderable(&self) -> i64 {
        if !self.active {
            return 0;
        }
        self.stock.clamp(0, MAX_QUANTITY_PER_ITEM)
    }

    /// Check that `requested` units can be supplied.
    pub fn check_quantity(&self, requested: i64) -> Result<(), CartError> {
        if requested <= 0 {
            return Err(CartError::Validation(format!(
                "quantity must be positive, got {}",
                requested
            )));
        }
        let available = self.max_orderable();
        if requested > available {
            return Err(CartError::InsufficientStock {
                product_id: self.id.to_string(),
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Check that adding `adding` units to the `in_cart` already held fits.
    pub fn check_additional(&self, in_cart: i64, adding: i64) -> Result<(), CartError> {
        if adding <= 0 {
            return Err(CartError::Validation(format!(
                "quantity must be positive, got {}",
                adding
            )));
        }
        self.check_quantity(in_cart.max(0).saturating_add(adding))
    }

    /// Bound a quantity picker value to what can be ordered.
    ///
    /// Returns 0 when the product cannot be ordered at all, otherwise a
    /// value in `1..=max_orderable()`.
    pub fn clamp_quantity(&self, requested: i64) -> i64 {
        let max = self.max_orderable();
        if max == 0 {
            return 0;
        }
        requested.clamp(1, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn jam(stock: i64, active: bool) -> Product {
        Product {
            id: ProductId::new("fresa-250"),
            name: "Mermelada de fresa".to_string(),
            description: None,
            price: Money::new(1250, Currency::USD),
            stock,
            active,
            sku: Some("MF-250".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_check_quantity() {
        let p = jam(3, true);
        assert!(p.check_quantity(3).is_ok());

        match p.check_quantity(4) {
            Err(CartError::InsufficientStock { requested, available, .. }) => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(p.check_quantity(0), Err(CartError::Validation(_))));
    }

    #[test]
    fn test_inactive_product_has_no_stock() {
        let p = jam(10, false);
        assert!(!p.is_available());
        assert_eq!(p.max_orderable(), 0);
        assert!(matches!(
            p.check_quantity(1),
            Err(CartError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn test_check_additional_counts_cart_quantity() {
        let p = jam(5, true);
        assert!(p.check_additional(3, 2).is_ok());
        assert!(p.check_additional(4, 2).is_err());
    }

    #[test]
    fn test_clamp_quantity() {
        let p = jam(4, true);
        assert_eq!(p.clamp_quantity(0), 1);
        assert_eq!(p.clamp_quantity(2), 2);
        assert_eq!(p.clamp_quantity(9), 4);
        assert_eq!(jam(0, true).clamp_quantity(3), 0);
    }
}
