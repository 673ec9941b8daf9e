//! HTTP client for the marketplace backend.
//!
//! [`HttpCartApi`] implements [`PricingBackend`] and [`CatalogBackend`]
//! over a [`FetchClient`], plus the narrower cart endpoints (totals only,
//! shipping quote, discount quote) that a checkout page calls on its own.

mod wire;

pub use wire::{CartTotals, DiscountQuote, ShippingQuote};

use crate::cart::LineItem;
use crate::catalog::{CatalogBackend, Product, Zone};
use crate::error::CartError;
use crate::ids::{DiscountCode, ProductId, ZoneId};
use crate::money::{Currency, Money};
use crate::summary::{CartSummary, PricingBackend, StockReport, SummaryRequest};
use async_trait::async_trait;
use jam_data::{ClientRequestBuilder, FetchClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wire::{
    decode, WireDiscount, WireProduct, WireShipping, WireStockValidation, WireSummary,
    WireTotals, WireZoneList,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://proyect-mercado-backend.fly.dev/api";

#[derive(Serialize)]
struct ItemsBody<'a> {
    items: &'a [LineItem],
}

/// Backend client for pricing, stock and catalog lookups.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: FetchClient,
    currency: Currency,
}

impl HttpCartApi {
    /// Wrap a configured client. Amounts are read in USD unless
    /// [`with_currency`](Self::with_currency) says otherwise.
    pub fn new(client: FetchClient) -> Self {
        Self {
            client,
            currency: Currency::default(),
        }
    }

    /// Currency the backend's decimal amounts are expressed in.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// `POST /carrito/resumen-completo`
    pub async fn complete_summary(
        &self,
        request: &SummaryRequest,
    ) -> Result<CartSummary, CartError> {
        let req = self.client.post("/carrito/resumen-completo").json(request)?;
        let wire: WireSummary = self.fetch("cart summary", req).await?;
        let summary = wire.into_summary(self.currency)?;
        tracing::info!(
            lines = request.items.len(),
            total = %summary.final_total,
            "cart summary computed"
        );
        Ok(summary)
    }

    /// `POST /carrito/validar-stock`
    pub async fn check_stock(&self, items: &[LineItem]) -> Result<StockReport, CartError> {
        let req = self
            .client
            .post("/carrito/validar-stock")
            .json(&ItemsBody { items })?;
        let wire: WireStockValidation = self.fetch("stock validation", req).await?;
        wire.into_report()
    }

    /// `POST /carrito/calcular`: subtotal and total without shipping or
    /// discounts.
    pub async fn calculate_totals(&self, items: &[LineItem]) -> Result<CartTotals, CartError> {
        let req = self
            .client
            .post("/carrito/calcular")
            .json(&ItemsBody { items })?;
        let wire: WireTotals = self.fetch("cart totals", req).await?;
        wire.into_totals(self.currency)
    }

    /// `GET /carrito/calcular-envio`
    pub async fn shipping_quote(
        &self,
        subtotal: Money,
        zone_id: &ZoneId,
    ) -> Result<ShippingQuote, CartError> {
        let zone_id = require_present(zone_id.as_str(), "zone id")?;
        let req = self
            .client
            .get("/carrito/calcular-envio")
            .query("subtotal", subtotal.display_amount())
            .query("zona_id", zone_id);
        let wire: WireShipping = self.fetch("shipping quote", req).await?;
        wire.into_quote(self.currency)
    }

    /// `GET /carrito/calcular-descuentos`
    pub async fn discount_quote(
        &self,
        subtotal: Money,
        code: &DiscountCode,
    ) -> Result<DiscountQuote, CartError> {
        let code = require_present(code.as_str(), "discount code")?;
        let req = self
            .client
            .get("/carrito/calcular-descuentos")
            .query("subtotal", subtotal.display_amount())
            .query("codigo_descuento", code);
        let wire: WireDiscount = self.fetch("discount quote", req).await?;
        wire.into_quote(self.currency)
    }

    /// `GET /productos/{id}`
    pub async fn fetch_product(&self, id: &ProductId) -> Result<Product, CartError> {
        let id = require_present(id.as_str(), "product id")?;
        let req = self.client.get(format!("/productos/{}", path_segment(id)));
        let wire: WireProduct = self.fetch("product", req).await?;
        wire.into_product(self.currency)
    }

    /// `GET /zonas/activas`
    pub async fn fetch_active_zones(&self) -> Result<Vec<Zone>, CartError> {
        let req = self.client.get("/zonas/activas");
        let wire: WireZoneList = self.fetch("zones", req).await?;
        wire.into_active_zones(self.currency)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        what: &str,
        req: ClientRequestBuilder<'_>,
    ) -> Result<T, CartError> {
        let response = req
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| tracing::warn!(what, error = %e, "backend request failed"))?;
        decode(what, response.bytes())
    }
}

#[async_trait]
impl PricingBackend for HttpCartApi {
    async fn compute_summary(&self, request: &SummaryRequest) -> Result<CartSummary, CartError> {
        self.complete_summary(request).await
    }

    async fn validate_stock(&self, items: &[LineItem]) -> Result<StockReport, CartError> {
        self.check_stock(items).await
    }
}

#[async_trait]
impl CatalogBackend for HttpCartApi {
    async fn product(&self, id: &ProductId) -> Result<Product, CartError> {
        self.fetch_product(id).await
    }

    async fn active_zones(&self) -> Result<Vec<Zone>, CartError> {
        self.fetch_active_zones().await
    }
}

fn require_present<'a>(value: &'a str, what: &str) -> Result<&'a str, CartError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CartError::Validation(format!("{} is empty", what)));
    }
    Ok(trimmed)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("fresa-250"), "fresa-250");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(path_segment("ñ"), "%C3%B1");
    }

    #[test]
    fn test_items_body_shape() {
        let items = vec![LineItem::new("p1", 2)];
        let json = serde_json::to_value(ItemsBody { items: &items }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": [{"producto_id": "p1", "cantidad": 2}]})
        );
    }

    #[tokio::test]
    async fn test_blank_product_id_rejected_before_request() {
        let api = HttpCartApi::new(
            FetchClient::new()
                .unwrap()
                .with_base_url("http://127.0.0.1:9"),
        );
        assert_eq!(api.currency(), Currency::USD);
        let err = api.fetch_product(&ProductId::new(" ")).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }
}
