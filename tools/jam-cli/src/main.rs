//! jam - command line cart for the jamjar marketplace.
//!
//! Commands:
//! - `jam add` / `jam set` / `jam remove` / `jam clear` - Edit the local cart
//! - `jam list` / `jam count` - Inspect the local cart
//! - `jam summary` - Price the cart on the backend
//! - `jam validate` - Check stock for every line
//! - `jam product` / `jam zones` - Catalog lookups
//! - `jam config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use commands::{AddArgs, ClearArgs, ConfigArgs, ProductArgs, RemoveArgs, SetArgs, SummaryArgs};
use config::LogFormat;

/// jam - Keep a jam cart and price it against the marketplace backend
#[derive(Parser)]
#[command(name = "jam")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add units of a product to the cart
    Add(AddArgs),

    /// Set the quantity of a product
    Set(SetArgs),

    /// Remove a product from the cart
    Remove(RemoveArgs),

    /// Empty the cart
    Clear(ClearArgs),

    /// List the cart's lines
    List,

    /// Print the total number of units
    Count,

    /// Compute the order summary on the backend
    Summary(SummaryArgs),

    /// Check stock for every line
    Validate,

    /// Show a catalog product
    Product(ProductArgs),

    /// List active delivery zones
    Zones,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Install the tracing subscriber; diagnostics go to stderr.
fn init_tracing(ctx: &context::Context, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| ctx.config.log.directive(verbose).into());

    let use_json = ctx.config.log.format == LogFormat::Json;
    let json_layer = use_json.then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!use_json).then(|| {
        fmt::layer()
            .with_target(verbose)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    init_tracing(&ctx, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Add(args) => commands::cart::add(args, &ctx).await,
        Commands::Set(args) => commands::cart::set(args, &ctx).await,
        Commands::Remove(args) => commands::cart::remove(args, &ctx).await,
        Commands::Clear(args) => commands::cart::clear(args, &ctx).await,
        Commands::List => commands::cart::list(&ctx).await,
        Commands::Count => commands::cart::count(&ctx).await,
        Commands::Summary(args) => commands::summary::summary(args, &ctx).await,
        Commands::Validate => commands::summary::validate(&ctx).await,
        Commands::Product(args) => commands::catalog::product(args, &ctx).await,
        Commands::Zones => commands::catalog::zones(&ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summary_flags() {
        let cli = Cli::try_parse_from(["jam", "--json", "summary", "-z", "Z1", "--code", "JAM10"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Summary(args) => {
                assert_eq!(args.zone.as_deref(), Some("Z1"));
                assert_eq!(args.code.as_deref(), Some("JAM10"));
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn test_parse_set_negative_quantity() {
        let cli = Cli::try_parse_from(["jam", "set", "fresa-250", "-1"]).unwrap();
        match cli.command {
            Commands::Set(args) => assert_eq!(args.quantity, -1),
            _ => panic!("expected set"),
        }
    }
}
