//! Domain layer: pricing rules, aggregates, value objects and events.
pub mod aggregates;
pub mod discount;
pub mod events;
pub mod value_objects;
