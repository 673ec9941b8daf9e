//! Shopping cart for the jamjar artisanal jam marketplace.
//!
//! This crate provides the client-side cart of the storefront:
//!
//! - **Cart**: ordered line items, persisted after every change, with
//!   synchronous change notifications
//! - **Summary**: totals delegated to the pricing backend, with stale
//!   response tracking
//! - **Catalog**: products and delivery zones, plus stock checks
//! - **Api**: the HTTP client for the marketplace backend
//!
//! Prices are never computed locally. The cart stores product ids and
//! quantities only; everything monetary comes from the backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use jam_cart::prelude::*;
//! use jam_data::FetchClient;
//! use jam_storage::FileBackend;
//!
//! let mut cart = CartStore::load(FileBackend::open("/var/lib/jamjar")?);
//! let _badge = cart.subscribe(|event| println!("{} items", event.item_count));
//!
//! cart.add_item(&ProductId::new("fresa-250"), 2);
//!
//! let api = HttpCartApi::new(FetchClient::new()?.with_base_url(DEFAULT_BASE_URL));
//! let summary = cart
//!     .compute_summary(&api, Some(&ZoneId::new("centro")), None)
//!     .await?;
//! println!("Total: {}", summary.final_total.display());
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod api;
pub mod cart;
pub mod catalog;
pub mod summary;

pub use error::CartError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CartError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{
        CartChange, CartEvent, CartStore, LineItem, Subscription, DEFAULT_STORAGE_KEY,
        MAX_QUANTITY_PER_ITEM,
    };

    // Summary
    pub use crate::summary::{
        CartSummary, PricingBackend, StockReport, SummaryOutcome, SummaryRequest,
        SummaryTracker,
    };

    // Catalog
    pub use crate::catalog::{CatalogBackend, Product, Zone};

    // Api
    pub use crate::api::{HttpCartApi, DEFAULT_BASE_URL};
}
