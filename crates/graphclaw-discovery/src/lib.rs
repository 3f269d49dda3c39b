//! graphclaw discovery - collect one scan's nodes into a validated, ordered batch

pub mod aggregator;
pub mod order;
pub mod wire;

pub use aggregator::{Batch, DiscoveryAggregator, Edge, Rejected};
pub use order::{class_rank, insertion_order};
pub use wire::{WireBatch, WireCustom, WireEntity, WireGeneric, WireHost, WirePort, WireService};
