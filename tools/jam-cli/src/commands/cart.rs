//! Local cart commands.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use jam_cart::cart::{CartEvent, CartStore, Subscription, MAX_QUANTITY_PER_ITEM};
use jam_cart::catalog::CatalogBackend;
use jam_cart::ProductId;
use jam_storage::FileBackend;

use super::{AddArgs, ClearArgs, RemoveArgs, SetArgs};
use crate::context::Context;

fn product_id(raw: &str) -> Result<ProductId> {
    match ProductId::parse(raw) {
        Some(id) => Ok(id),
        None => bail!("Product id must not be empty"),
    }
}

/// Report the storage state after a mutation.
fn finish(cart: &CartStore<FileBackend>, ctx: &Context) {
    if cart.persistence_degraded() {
        ctx.output
            .warn("Cart could not be saved; the change is lost when this command exits");
    }
}

/// Print the change event in JSON mode.
fn watch(cart: &CartStore<FileBackend>, ctx: &Context) -> Subscription {
    let output = ctx.output.clone();
    cart.subscribe(move |event: &CartEvent| {
        if output.is_json() {
            output.json(event);
        }
    })
}

/// Add units of a product.
pub async fn add(args: AddArgs, ctx: &Context) -> Result<()> {
    let id = product_id(&args.product)?;
    if args.quantity <= 0 {
        bail!("Quantity must be greater than zero");
    }

    let mut cart = ctx.open_cart()?;

    if args.check {
        let api = ctx.api()?;
        let spinner = ctx.output.spinner("Checking stock...");
        let product = api.product(&id).await;
        spinner.finish_and_clear();
        let product = product?;
        product.check_additional(cart.quantity_of(&id), args.quantity)?;
        ctx.output
            .debug(&format!("{} ({}): {} in stock", product.name, product.price, product.stock));
    }

    let _events = watch(&cart, ctx);
    let before = cart.quantity_of(&id);
    let after = cart.add_item(&id, args.quantity).unwrap_or(0);
    if after == before {
        ctx.output
            .warn(&format!("{} is already at the limit of {}", id, MAX_QUANTITY_PER_ITEM));
    } else {
        ctx.output
            .success(&format!("{} now has {} in the cart", id, after));
    }
    finish(&cart, ctx);
    Ok(())
}

/// Overwrite the quantity of a line.
pub async fn set(args: SetArgs, ctx: &Context) -> Result<()> {
    let id = product_id(&args.product)?;
    let mut cart = ctx.open_cart()?;
    let _events = watch(&cart, ctx);

    let had_line = cart.quantity_of(&id) > 0;
    match cart.set_quantity(&id, args.quantity) {
        Some(quantity) => ctx.output.success(&format!("{} set to {}", id, quantity)),
        None if had_line && args.quantity <= 0 => {
            ctx.output.success(&format!("Removed {}", id))
        }
        None => ctx.output.info("Cart unchanged"),
    }
    finish(&cart, ctx);
    Ok(())
}

/// Remove a line.
pub async fn remove(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let id = product_id(&args.product)?;
    let mut cart = ctx.open_cart()?;
    let _events = watch(&cart, ctx);

    if cart.remove_item(&id) {
        ctx.output.success(&format!("Removed {}", id));
    } else {
        ctx.output.info(&format!("{} is not in the cart", id));
    }
    finish(&cart, ctx);
    Ok(())
}

/// Empty the cart.
pub async fn clear(args: ClearArgs, ctx: &Context) -> Result<()> {
    let mut cart = ctx.open_cart()?;
    if cart.is_empty() {
        ctx.output.info("Cart is already empty");
        return Ok(());
    }

    if !args.yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove all {} items from the cart?",
                cart.item_count()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    let _events = watch(&cart, ctx);
    cart.clear();
    ctx.output.success("Cart cleared");
    finish(&cart, ctx);
    Ok(())
}

/// Show the cart's lines.
pub async fn list(ctx: &Context) -> Result<()> {
    let cart = ctx.open_cart()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "items": cart.items(),
            "item_count": cart.item_count(),
            "unique_items": cart.unique_item_count(),
        }));
        return Ok(());
    }

    if cart.is_empty() {
        ctx.output.info("Cart is empty");
        return Ok(());
    }

    ctx.output.header("Cart");
    let widths = [24, 8];
    ctx.output.table_row(&["PRODUCT", "QTY"], &widths);
    for item in cart.items() {
        let quantity = item.quantity.to_string();
        ctx.output
            .table_row(&[item.product_id.as_str(), quantity.as_str()], &widths);
    }
    ctx.output.info(&format!(
        "{} units across {} products",
        cart.item_count(),
        cart.unique_item_count()
    ));
    Ok(())
}

/// Print the badge count.
pub async fn count(ctx: &Context) -> Result<()> {
    let cart = ctx.open_cart()?;
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "item_count": cart.item_count() }));
    } else {
        println!("{}", cart.item_count());
    }
    Ok(())
}
