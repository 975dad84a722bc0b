//! End-to-end happy hour scenario: one dependency, a fallback candidate and
//! a masked candidate that wins while the mask is active.

use std::sync::Arc;

use cdr_core::{
    Container, Criterion, EventType, FactoryInstantiator, Mask, MemorySink, Registry, Value, Version,
};

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

fn happy_hour_container(sink: Arc<MemorySink>) -> Container {
    let mut registry = Registry::new().with_sink(sink);
    registry
        .register_mask(
            Mask::new("happyHour")
                .with_criterion(Criterion::equals("time.hour", 5).expect("valid criterion"))
                .with_criterion(Criterion::equals("time.period", "pm").expect("valid criterion")),
        )
        .expect("Failed to register mask");

    let discount = registry
        .register_dependency_of::<Box<dyn Discount>>("examples", "Discount", "Price reduction")
        .expect("Failed to register dependency");
    registry
        .register_candidate(&discount, "NoDiscount", None, None)
        .expect("Failed to register fallback");
    registry
        .register_candidate(&discount, "HappyHourDiscount", Some("happyHour"), Some(Version::new(1, 0, 0)))
        .expect("Failed to register happy hour candidate");

    let factories = FactoryInstantiator::new()
        .with_factory("NoDiscount", || Box::new(NoDiscount) as Box<dyn Discount>)
        .with_factory("HappyHourDiscount", || Box::new(HappyHourDiscount) as Box<dyn Discount>);

    Container::new(registry, factories)
}

fn discount_on(container: &Container, ctx: &cdr_core::Context, price: f64) -> f64 {
    container
        .share_as::<Box<dyn Discount>>("examples", "Discount", ctx)
        .expect("Failed to resolve discount")
        .amount(price)
}

#[test]
fn test_no_discount_without_mask() {
    let container = happy_hour_container(Arc::new(MemorySink::new()));
    let ctx = container.new_context();

    assert_eq!(discount_on(&container, &ctx, 10.0), 0.0);
    assert_eq!(
        container.resolve("examples", "Discount", &ctx).unwrap().identifier,
        "NoDiscount"
    );
}

#[test]
fn test_discount_with_mask() {
    let container = happy_hour_container(Arc::new(MemorySink::new()));
    let mut ctx = container.new_context();

    container.set_mask(&mut ctx, "happyHour").expect("mask is registered");
    assert_eq!(ctx.get("time.hour"), Some(&Value::Number(5.0)));
    assert_eq!(discount_on(&container, &ctx, 10.0), 2.0);

    container.remove_mask(&mut ctx, "happyHour").expect("mask is registered");
    assert_eq!(discount_on(&container, &ctx, 10.0), 0.0);
}

#[test]
fn test_discount_from_literal_circumstances() {
    let container = happy_hour_container(Arc::new(MemorySink::new()));
    let mut ctx = container.new_context();

    ctx.set_circumstance("time.hour", "5").unwrap();
    ctx.set_circumstance("time.period", "pm").unwrap();
    assert_eq!(discount_on(&container, &ctx, 10.0), 2.0);

    // "5" typed as text never equals the number 5
    ctx.set_circumstance_as("time.hour", "5", cdr_core::ValueTag::Text).unwrap();
    assert_eq!(discount_on(&container, &ctx, 10.0), 0.0);
}

#[test]
fn test_mask_inside_scope() {
    let container = happy_hour_container(Arc::new(MemorySink::new()));
    let mut ctx = container.new_context();

    ctx.open_scope();
    container.set_mask(&mut ctx, "happyHour").unwrap();
    assert_eq!(discount_on(&container, &ctx, 25.0), 5.0);
    ctx.close_scope().unwrap();

    assert_eq!(discount_on(&container, &ctx, 25.0), 0.0);
}

#[test]
fn test_contexts_are_independent() {
    let container = happy_hour_container(Arc::new(MemorySink::new()));
    let mut happy = container.new_context();
    let regular = container.new_context();

    container.set_mask(&mut happy, "happyHour").unwrap();
    assert_eq!(discount_on(&container, &happy, 10.0), 2.0);
    assert_eq!(discount_on(&container, &regular, 10.0), 0.0);
}

#[test]
fn test_event_flow() {
    let sink = Arc::new(MemorySink::new());
    let container = happy_hour_container(sink.clone());
    let registration_events = sink.len();
    assert!(sink.events().iter().all(|e| e.event_type.is_registration_event()));

    let mut ctx = container.new_context();
    discount_on(&container, &ctx, 10.0);
    container.set_mask(&mut ctx, "happyHour").unwrap();
    discount_on(&container, &ctx, 10.0);
    discount_on(&container, &ctx, 10.0);

    let events: Vec<EventType> = sink.event_types().into_iter().skip(registration_events).collect();
    assert_eq!(
        events,
        vec![
            EventType::CandidateFound,
            EventType::InstanceCreated,
            EventType::MaskSet,
            EventType::CandidateFound,
            EventType::InstanceCreated,
            EventType::CandidateFound,
            EventType::InstanceShared,
        ]
    );

    let found = sink.events_of_type(EventType::CandidateFound);
    assert_eq!(found[0].payload_str("candidate"), Some("NoDiscount"));
    assert_eq!(found[1].payload_str("candidate"), Some("HappyHourDiscount"));
    assert_eq!(found[1].payload["matched"], 2);
}
