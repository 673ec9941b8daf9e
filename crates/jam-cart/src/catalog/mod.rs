//! Product catalog module.
//!
//! Read-only views of products and delivery zones, fetched from the
//! catalog backend.

mod product;
mod zone;

pub use product::Product;
pub use zone::Zone;

use crate::error::CartError;
use crate::ids::ProductId;
use async_trait::async_trait;

/// Remote catalog the storefront reads from.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Fetch a product by id.
    async fn product(&self, id: &ProductId) -> Result<Product, CartError>;

    /// List the zones currently accepting deliveries.
    async fn active_zones(&self) -> Result<Vec<Zone>, CartError>;
}
