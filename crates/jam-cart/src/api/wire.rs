//! Backend payload schemas and their validation.
//!
//! The backend speaks Spanish snake_case and is loose about number types:
//! decimals may arrive as JSON numbers or numeric strings, and ids as
//! strings or integers. Everything is decoded here into explicit shapes and
//! checked before it reaches the domain types; anything else is rejected.

use crate::cart::LineItem;
use crate::catalog::{Product, Zone};
use crate::error::CartError;
use crate::ids::{DiscountCode, ProductId, ZoneId};
use crate::money::{Currency, Money};
use crate::summary::{CartSummary, DiscountInfo, StockReport, SummaryLine, ZoneInfo};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Decode a JSON body, mapping schema mismatches to `InvalidResponse`.
pub(crate) fn decode<T: DeserializeOwned>(what: &str, body: &[u8]) -> Result<T, CartError> {
    serde_json::from_slice(body)
        .map_err(|e| CartError::InvalidResponse(format!("{}: {}", what, e)))
}

/// A decimal that may be sent as a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    fn value(&self, field: &str) -> Result<f64, CartError> {
        let value = match self {
            Decimal::Number(n) => *n,
            Decimal::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                CartError::InvalidResponse(format!("{} is not a number: {:?}", field, s))
            })?,
        };
        if !value.is_finite() {
            return Err(CartError::InvalidResponse(format!("{} is not finite", field)));
        }
        Ok(value)
    }

    /// Convert to money, rejecting negative amounts.
    pub(crate) fn money(&self, field: &str, currency: Currency) -> Result<Money, CartError> {
        let value = self.value(field)?;
        if value < 0.0 {
            return Err(CartError::InvalidResponse(format!(
                "{} is negative: {}",
                field, value
            )));
        }
        Money::from_decimal(value, currency)
            .ok_or_else(|| CartError::InvalidResponse(format!("{} is out of range", field)))
    }
}

/// An identifier sent as a string or an integer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Text(String),
    Int(i64),
}

impl WireId {
    fn into_string(self, field: &str) -> Result<String, CartError> {
        let s = match self {
            WireId::Text(s) => s.trim().to_string(),
            WireId::Int(n) => n.to_string(),
        };
        if s.is_empty() {
            return Err(CartError::InvalidResponse(format!("{} is empty", field)));
        }
        Ok(s)
    }
}

fn non_negative(field: &str, value: i64) -> Result<i64, CartError> {
    if value < 0 {
        return Err(CartError::InvalidResponse(format!(
            "{} is negative: {}",
            field, value
        )));
    }
    Ok(value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSummary {
    subtotal: Decimal,
    #[serde(alias = "shippingCost")]
    costo_envio: Decimal,
    #[serde(alias = "discountAmount")]
    monto_descuento: Decimal,
    #[serde(alias = "finalTotal")]
    total: Decimal,
    #[serde(default, alias = "itemsCount")]
    items_count: Option<i64>,
    #[serde(default)]
    zona_info: Option<WireZoneInfo>,
    #[serde(default)]
    descuento_info: Option<WireDiscountInfo>,
    #[serde(default)]
    items_detalles: Option<Vec<WireSummaryLine>>,
}

#[derive(Debug, Deserialize)]
struct WireZoneInfo {
    zona_id: WireId,
    #[serde(default)]
    zona_nombre: Option<String>,
    #[serde(default)]
    tiempo_estimado: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDiscountInfo {
    codigo: String,
    #[serde(default)]
    porcentaje: Option<Decimal>,
    #[serde(default)]
    descripcion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSummaryLine {
    #[serde(alias = "productId")]
    producto_id: WireId,
    #[serde(default)]
    nombre: Option<String>,
    precio: Decimal,
    #[serde(alias = "quantity")]
    cantidad: i64,
    subtotal: Decimal,
    #[serde(default)]
    stock_disponible: Option<i64>,
}

impl WireSummary {
    pub(crate) fn into_summary(self, currency: Currency) -> Result<CartSummary, CartError> {
        let item_count = self
            .items_count
            .map(|n| non_negative("items_count", n))
            .transpose()?;

        let zone = match self.zona_info {
            Some(z) => Some(ZoneInfo {
                zone_id: ZoneId::new(z.zona_id.into_string("zona_info.zona_id")?),
                name: z.zona_nombre.unwrap_or_default(),
                estimated_delivery: non_blank(z.tiempo_estimado),
            }),
            None => None,
        };

        let discount = match self.descuento_info {
            Some(d) => {
                let percentage = d
                    .porcentaje
                    .map(|p| p.value("descuento_info.porcentaje"))
                    .transpose()?;
                Some(DiscountInfo {
                    code: DiscountCode::new(d.codigo),
                    percentage,
                    description: non_blank(d.descripcion),
                })
            }
            None => None,
        };

        let lines = self
            .items_detalles
            .unwrap_or_default()
            .into_iter()
            .map(|line| line.into_line(currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartSummary {
            subtotal: self.subtotal.money("subtotal", currency)?,
            shipping_cost: self.costo_envio.money("costo_envio", currency)?,
            discount_amount: self.monto_descuento.money("monto_descuento", currency)?,
            final_total: self.total.money("total", currency)?,
            item_count,
            zone,
            discount,
            lines,
        })
    }
}

impl WireSummaryLine {
    fn into_line(self, currency: Currency) -> Result<SummaryLine, CartError> {
        Ok(SummaryLine {
            product_id: ProductId::new(self.producto_id.into_string("items_detalles.producto_id")?),
            name: self.nombre.unwrap_or_default(),
            unit_price: self.precio.money("items_detalles.precio", currency)?,
            quantity: non_negative("items_detalles.cantidad", self.cantidad)?,
            line_subtotal: self.subtotal.money("items_detalles.subtotal", currency)?,
            stock_available: self
                .stock_disponible
                .map(|n| non_negative("items_detalles.stock_disponible", n))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireStockValidation {
    items_validos: bool,
    #[serde(default)]
    items_sin_stock: Vec<WireLineItem>,
    #[serde(default)]
    mensaje: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireLineItem {
    #[serde(alias = "productId")]
    producto_id: WireId,
    #[serde(alias = "quantity")]
    cantidad: i64,
}

impl WireStockValidation {
    pub(crate) fn into_report(self) -> Result<StockReport, CartError> {
        let out_of_stock = self
            .items_sin_stock
            .into_iter()
            .map(|i| {
                Ok(LineItem::new(
                    i.producto_id.into_string("items_sin_stock.producto_id")?,
                    i.cantidad,
                ))
            })
            .collect::<Result<Vec<_>, CartError>>()?;

        Ok(StockReport {
            all_available: self.items_validos && out_of_stock.is_empty(),
            out_of_stock,
            message: non_blank(self.mensaje),
        })
    }
}

/// Subtotal and total without shipping or discounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Money,
    pub total: Money,
    pub item_count: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTotals {
    subtotal: Decimal,
    total: Decimal,
    #[serde(alias = "itemsCount")]
    items_count: i64,
}

impl WireTotals {
    pub(crate) fn into_totals(self, currency: Currency) -> Result<CartTotals, CartError> {
        Ok(CartTotals {
            subtotal: self.subtotal.money("subtotal", currency)?,
            total: self.total.money("total", currency)?,
            item_count: non_negative("items_count", self.items_count)?,
        })
    }
}

/// Shipping cost for a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingQuote {
    pub cost: Money,
    pub zone_name: String,
    pub estimated_delivery: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireShipping {
    costo_envio: Decimal,
    #[serde(default)]
    zona_nombre: Option<String>,
    #[serde(default)]
    tiempo_estimado: Option<String>,
}

impl WireShipping {
    pub(crate) fn into_quote(self, currency: Currency) -> Result<ShippingQuote, CartError> {
        Ok(ShippingQuote {
            cost: self.costo_envio.money("costo_envio", currency)?,
            zone_name: self.zona_nombre.unwrap_or_default(),
            estimated_delivery: non_blank(self.tiempo_estimado),
        })
    }
}

/// Backend verdict on a discount code.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountQuote {
    pub valid: bool,
    pub amount: Money,
    pub percentage: f64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDiscount {
    codigo_valido: bool,
    #[serde(default)]
    monto_descuento: Option<Decimal>,
    #[serde(default)]
    porcentaje_descuento: Option<Decimal>,
    #[serde(default)]
    descripcion: Option<String>,
}

impl WireDiscount {
    pub(crate) fn into_quote(self, currency: Currency) -> Result<DiscountQuote, CartError> {
        let amount = match &self.monto_descuento {
            Some(d) => d.money("monto_descuento", currency)?,
            None => Money::zero(currency),
        };
        let percentage = match &self.porcentaje_descuento {
            Some(d) => d.value("porcentaje_descuento")?,
            None => 0.0,
        };
        Ok(DiscountQuote {
            valid: self.codigo_valido,
            amount,
            percentage,
            description: non_blank(self.descripcion),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireProduct {
    #[serde(alias = "id")]
    producto_id: WireId,
    nombre: String,
    #[serde(default)]
    descripcion: Option<String>,
    #[serde(alias = "precio")]
    precio_actual: Decimal,
    #[serde(alias = "stock")]
    cantidad_stock: i64,
    #[serde(default = "default_true")]
    esta_activo: bool,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    url_imagen_principal: Option<String>,
}

fn default_true() -> bool {
    true
}

impl WireProduct {
    pub(crate) fn into_product(self, currency: Currency) -> Result<Product, CartError> {
        Ok(Product {
            id: ProductId::new(self.producto_id.into_string("producto_id")?),
            name: self.nombre,
            description: non_blank(self.descripcion),
            price: self.precio_actual.money("precio_actual", currency)?,
            stock: non_negative("cantidad_stock", self.cantidad_stock)?,
            active: self.esta_activo,
            sku: non_blank(self.sku),
            image_url: non_blank(self.url_imagen_principal),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireZone {
    zona_id: WireId,
    nombre: String,
    tarifa_envio: Decimal,
    #[serde(default = "default_true")]
    esta_activa: bool,
}

impl WireZone {
    pub(crate) fn into_zone(self, currency: Currency) -> Result<Zone, CartError> {
        Ok(Zone {
            id: ZoneId::new(self.zona_id.into_string("zona_id")?),
            name: self.nombre,
            shipping_fee: self.tarifa_envio.money("tarifa_envio", currency)?,
            active: self.esta_activa,
        })
    }
}

/// Zone listings come either bare or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireZoneList {
    Bare(Vec<WireZone>),
    Wrapped {
        #[serde(alias = "data")]
        zonas: Vec<WireZone>,
    },
}

impl WireZoneList {
    /// Active zones only, in the order the backend listed them.
    pub(crate) fn into_active_zones(self, currency: Currency) -> Result<Vec<Zone>, CartError> {
        let zones = match self {
            WireZoneList::Bare(zones) => zones,
            WireZoneList::Wrapped { zonas } => zonas,
        };
        let mut active = Vec::with_capacity(zones.len());
        for zone in zones {
            let zone = zone.into_zone(currency)?;
            if zone.active {
                active.push(zone);
            }
        }
        Ok(active)
    }
}
