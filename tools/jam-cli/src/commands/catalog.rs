//! Catalog lookups.

use anyhow::{bail, Result};
use jam_cart::catalog::CatalogBackend;
use jam_cart::ProductId;

use super::ProductArgs;
use crate::context::Context;
use crate::output::stock_badge;

/// Show one product.
pub async fn product(args: ProductArgs, ctx: &Context) -> Result<()> {
    let Some(id) = ProductId::parse(&args.id) else {
        bail!("Product id must not be empty");
    };

    let api = ctx.api()?;
    let spinner = ctx.output.spinner("Fetching product...");
    let product = api.product(&id).await;
    spinner.finish_and_clear();
    let product = product?;

    if ctx.output.is_json() {
        ctx.output.json(&product);
        return Ok(());
    }

    ctx.output.header(&product.name);
    ctx.output.kv("id", product.id.as_str());
    if let Some(sku) = &product.sku {
        ctx.output.kv("sku", sku);
    }
    ctx.output.kv("price", &product.price.display());
    ctx.output.kv("stock", &stock_badge(product.stock, product.active));
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        ctx.output.kv("description", description);
    }

    let cart = ctx.open_cart()?;
    let in_cart = cart.quantity_of(&id);
    if in_cart > 0 {
        ctx.output.kv("in cart", &in_cart.to_string());
    }
    Ok(())
}

/// List the delivery zones currently served.
pub async fn zones(ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let spinner = ctx.output.spinner("Fetching zones...");
    let zones = api.active_zones().await;
    spinner.finish_and_clear();
    let zones = zones?;

    if ctx.output.is_json() {
        ctx.output.json(&zones);
        return Ok(());
    }

    if zones.is_empty() {
        ctx.output.info("No active delivery zones");
        return Ok(());
    }

    ctx.output.header("Delivery Zones");
    let widths = [16, 24, 10];
    ctx.output.table_row(&["ZONE", "NAME", "SHIPPING"], &widths);
    for zone in &zones {
        let fee = zone.shipping_fee.display();
        ctx.output
            .table_row(&[zone.id.as_str(), zone.name.as_str(), fee.as_str()], &widths);
    }
    Ok(())
}
