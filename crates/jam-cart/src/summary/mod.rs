//! Cart summaries computed by the pricing backend.
//!
//! The client never prices anything itself: a [`SummaryRequest`] goes to a
//! [`PricingBackend`] and the returned [`CartSummary`] is shown as is.
//! [`SummaryTracker`] adds the bookkeeping a UI needs around that call.

mod tracker;

pub use tracker::{SummaryOutcome, SummaryTicket, SummaryTracker};

use crate::cart::LineItem;
use crate::error::CartError;
use crate::ids::{DiscountCode, ProductId, ZoneId};
use crate::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Input of a summary computation.
///
/// Serializes to the backend's `{items, zona_id?, codigo_descuento?}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub items: Vec<LineItem>,
    #[serde(rename = "zona_id", skip_serializing_if = "Option::is_none", default)]
    pub zone_id: Option<ZoneId>,
    #[serde(
        rename = "codigo_descuento",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub discount_code: Option<DiscountCode>,
}

impl SummaryRequest {
    /// Build a request; blank zone ids and discount codes count as absent.
    pub fn new(
        items: Vec<LineItem>,
        zone_id: Option<&ZoneId>,
        discount_code: Option<&DiscountCode>,
    ) -> Self {
        Self {
            items,
            zone_id: zone_id.and_then(|z| ZoneId::parse(z.as_str())),
            discount_code: discount_code.and_then(|c| DiscountCode::parse(c.as_str())),
        }
    }
}

/// Totals for a cart, in the store's base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub discount_amount: Money,
    pub final_total: Money,
    /// Item count as the backend saw it.
    pub item_count: Option<i64>,
    pub zone: Option<ZoneInfo>,
    pub discount: Option<DiscountInfo>,
    /// Per-line pricing detail; empty when the backend sends none.
    pub lines: Vec<SummaryLine>,
}

/// Delivery zone the shipping cost was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub zone_id: ZoneId,
    pub name: String,
    /// Free-form delivery estimate, e.g. "24-48 horas".
    pub estimated_delivery: Option<String>,
}

/// Discount the backend accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountInfo {
    pub code: DiscountCode,
    pub percentage: Option<f64>,
    pub description: Option<String>,
}

/// One priced line of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_subtotal: Money,
    pub stock_available: Option<i64>,
}

/// Result of a stock check over a set of line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReport {
    /// True when every item can be supplied.
    pub all_available: bool,
    /// Items the backend reported as short, with the quantity it flagged.
    pub out_of_stock: Vec<LineItem>,
    pub message: Option<String>,
}

/// Remote service that prices carts.
#[async_trait]
pub trait PricingBackend: Send + Sync {
    /// Compute subtotal, shipping, discount and total for a request.
    async fn compute_summary(&self, request: &SummaryRequest) -> Result<CartSummary, CartError>;

    /// Check that every item can be supplied in the requested quantity.
    async fn validate_stock(&self, items: &[LineItem]) -> Result<StockReport, CartError>;
}

/// Price `items` through `pricing`.
///
/// No local state is read or written, and there is no local fallback: a
/// backend failure is returned as is.
pub async fn compute_summary<P: PricingBackend + ?Sized>(
    pricing: &P,
    items: &[LineItem],
    zone_id: Option<&ZoneId>,
    discount_code: Option<&DiscountCode>,
) -> Result<CartSummary, CartError> {
    let request = SummaryRequest::new(items.to_vec(), zone_id, discount_code);
    tracing::debug!(
        lines = request.items.len(),
        zone = ?request.zone_id,
        code = ?request.discount_code,
        "requesting cart summary"
    );
    pricing.compute_summary(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use std::sync::Mutex;

    struct RecordingPricing {
        seen: Mutex<Vec<SummaryRequest>>,
    }

    #[async_trait]
    impl PricingBackend for RecordingPricing {
        async fn compute_summary(
            &self,
            request: &SummaryRequest,
        ) -> Result<CartSummary, CartError> {
            self.seen.lock().unwrap().push(request.clone());
            let usd = |c| Money::new(c, Currency::USD);
            Ok(CartSummary {
                subtotal: usd(4000),
                shipping_cost: usd(500),
                discount_amount: usd(400),
                final_total: usd(4100),
                item_count: Some(2),
                zone: None,
                discount: None,
                lines: Vec::new(),
            })
        }

        async fn validate_stock(&self, _items: &[LineItem]) -> Result<StockReport, CartError> {
            Ok(StockReport {
                all_available: true,
                out_of_stock: Vec::new(),
                message: None,
            })
        }
    }

    #[test]
    fn test_request_body_shape() {
        let request = SummaryRequest::new(
            vec![LineItem::new("p1", 2)],
            Some(&ZoneId::new("z1")),
            None,
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": [{"producto_id": "p1", "cantidad": 2}],
                "zona_id": "z1"
            })
        );
    }

    #[test]
    fn test_blank_zone_and_code_are_absent() {
        let request = SummaryRequest::new(
            Vec::new(),
            Some(&ZoneId::new("  ")),
            Some(&DiscountCode::new("")),
        );
        assert_eq!(request.zone_id, None);
        assert_eq!(request.discount_code, None);
    }

    #[tokio::test]
    async fn test_compute_summary_forwards_snapshot() {
        let pricing = RecordingPricing {
            seen: Mutex::new(Vec::new()),
        };
        let items = vec![LineItem::new("p1", 2)];
        let summary = compute_summary(&pricing, &items, None, Some(&DiscountCode::new("JAM10")))
            .await
            .unwrap();

        assert_eq!(summary.final_total, Money::new(4100, Currency::USD));
        let seen = pricing.seen.lock().unwrap();
        assert_eq!(seen[0].items, items);
        assert_eq!(seen[0].discount_code, Some(DiscountCode::new("JAM10")));
    }
}
