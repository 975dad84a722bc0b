//! CDR demo - resolve the happy-hour discount for a given context
//!
//! Usage:
//!     cdr-demo
//!     cdr-demo --mask happyHour --price 25
//!     cdr-demo --set time.hour=5 --set time.period=pm --json
//!
//! Set `RUST_LOG=cdr_core=debug` to see every engine event.

use std::sync::Arc;

use clap::Parser;
use cdr_core::{CDRError, Container, Criterion, FactoryInstantiator, Mask, Registry, TracingSink, Version};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cdr-demo")]
#[command(about = "Resolve the happy-hour discount for a context")]
#[command(version)]
struct Args {
    /// Masks to activate (repeatable)
    #[arg(short, long)]
    mask: Vec<String>,

    /// Circumstances as name=literal (repeatable)
    #[arg(short, long, value_parser = parse_circumstance)]
    set: Vec<(String, String)>,

    /// Price to discount
    #[arg(short, long, default_value_t = 10.0)]
    price: f64,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn parse_circumstance(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, literal)| (name.trim().to_string(), literal.trim().to_string()))
        .ok_or_else(|| format!("expected name=literal, got '{}'", raw))
}

trait Discount: Send + Sync {
    fn amount(&self, price: f64) -> f64;
}

struct NoDiscount;

impl Discount for NoDiscount {
    fn amount(&self, _price: f64) -> f64 {
        0.0
    }
}

struct HappyHourDiscount;

impl Discount for HappyHourDiscount {
    fn amount(&self, price: f64) -> f64 {
        price * 0.2
    }
}

fn build_container() -> Result<Container, CDRError> {
    let mut registry = Registry::new().with_sink(Arc::new(TracingSink));

    registry.register_mask(
        Mask::new("happyHour")
            .with_criterion(Criterion::equals("time.hour", 5)?)
            .with_criterion(Criterion::equals("time.period", "pm")?),
    )?;

    let discount = registry.register_dependency_of::<Box<dyn Discount>>("examples", "Discount", "Price reduction")?;
    registry.register_candidate(&discount, "NoDiscount", None, None)?;
    registry.register_candidate(&discount, "HappyHourDiscount", Some("happyHour"), Some(Version::new(1, 0, 0)))?;

    let factories = FactoryInstantiator::new()
        .with_factory("NoDiscount", || Box::new(NoDiscount) as Box<dyn Discount>)
        .with_factory("HappyHourDiscount", || Box::new(HappyHourDiscount) as Box<dyn Discount>);

    Ok(Container::new(registry, factories))
}

fn run(args: &Args) -> Result<(), CDRError> {
    let container = build_container()?;
    let mut ctx = container.new_context();

    for (name, literal) in &args.set {
        ctx.set_circumstance(name.as_str(), literal)?;
    }
    for mask in &args.mask {
        container.set_mask(&mut ctx, mask)?;
    }

    let resolution = container.resolve("examples", "Discount", &ctx)?;
    let discount = container.share_as::<Box<dyn Discount>>("examples", "Discount", &ctx)?;
    let amount = discount.amount(args.price);

    if args.json {
        let output = serde_json::json!({
            "resolution": resolution,
            "price": args.price,
            "discount": amount,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error serializing output: {}", e),
        }
    } else {
        println!("Candidate: {} (v{})", resolution.identifier, resolution.version);
        println!("Discount on {:.2}: {:.2}", args.price, amount);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdr_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        let response = e.to_error_response();
        if args.json {
            if let Ok(text) = serde_json::to_string_pretty(&response) {
                println!("{}", text);
            }
        } else {
            eprintln!("Error [{}]: {}", response.error.code, response.error.message);
        }
        std::process::exit(1);
    }
}
