//! Backend-priced summary and stock commands.

use anyhow::Result;
use jam_cart::summary::{CartSummary, PricingBackend, SummaryOutcome, SummaryTracker};
use jam_cart::{CartError, DiscountCode, ZoneId};

use super::SummaryArgs;
use crate::context::Context;
use crate::output::format_money;

/// Ask the backend to price the cart.
pub async fn summary(args: SummaryArgs, ctx: &Context) -> Result<()> {
    let cart = ctx.open_cart()?;
    if cart.is_empty() {
        ctx.output.info("Cart is empty; nothing to price");
        return Ok(());
    }

    let zone = args.zone.as_deref().and_then(ZoneId::parse);
    let code = args.code.as_deref().and_then(DiscountCode::parse);
    let api = ctx.api()?;

    let mut tracker = SummaryTracker::new();
    let spinner = ctx.output.spinner("Computing summary...");
    let result = tracker
        .refresh(&cart, &api, zone.as_ref(), code.as_ref())
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(SummaryOutcome::Applied) => {}
        Ok(SummaryOutcome::Discarded) => {
            ctx.output.warn("Cart changed while the summary was computed");
            return Ok(());
        }
        Err(e) => return Err(with_hint(e)),
    }

    if let Some(summary) = tracker.summary() {
        if ctx.output.is_json() {
            ctx.output.json(summary);
        } else {
            print_summary(summary, ctx);
        }
    }
    Ok(())
}

/// Ask the backend whether every line can be fulfilled.
pub async fn validate(ctx: &Context) -> Result<()> {
    let cart = ctx.open_cart()?;
    if cart.is_empty() {
        ctx.output.info("Cart is empty");
        return Ok(());
    }

    let api = ctx.api()?;
    let spinner = ctx.output.spinner("Validating stock...");
    let report = api.validate_stock(&cart.items()).await;
    spinner.finish_and_clear();
    let report = report.map_err(with_hint)?;

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    if report.all_available {
        ctx.output.success("Every item is in stock");
        return Ok(());
    }

    ctx.output
        .warn(report.message.as_deref().unwrap_or("Some items are out of stock"));
    for item in &report.out_of_stock {
        ctx.output
            .list_item(&format!("{} (requested {})", item.product_id, item.quantity));
    }
    Ok(())
}

fn print_summary(summary: &CartSummary, ctx: &Context) {
    ctx.output.header("Order Summary");

    if !summary.lines.is_empty() {
        let widths = [28, 6, 12];
        for line in &summary.lines {
            let label = format!("{} x{}", line.name, line.quantity);
            let amount = line.line_subtotal.display();
            ctx.output
                .table_row(&[label.as_str(), "", amount.as_str()], &widths);
        }
        println!();
    }

    ctx.output.kv("Subtotal", &format_money(summary.subtotal));
    let shipping = match &summary.zone {
        Some(zone) => format!("{} ({})", format_money(summary.shipping_cost), zone.name),
        None => format_money(summary.shipping_cost),
    };
    ctx.output.kv("Shipping", &shipping);
    let discount = match &summary.discount {
        Some(d) => format!("-{} ({})", summary.discount_amount, d.code),
        None => format!("-{}", format_money(summary.discount_amount)),
    };
    ctx.output.kv("Discount", &discount);
    ctx.output.kv("Total", &summary.final_total.display());

    if let Some(eta) = summary.zone.as_ref().and_then(|z| z.estimated_delivery.as_deref()) {
        ctx.output.kv("Delivery", eta);
    }
}

fn with_hint(e: CartError) -> anyhow::Error {
    if e.is_retryable() {
        anyhow::Error::new(e).context("Pricing backend unavailable, try again shortly")
    } else {
        anyhow::Error::new(e)
    }
}
