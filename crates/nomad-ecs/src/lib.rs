//! Nomad ECS - Entity Component System
//!
//! Components of each type live in a fixed-capacity packed storage with O(1) attach,
//! detach (swap-remove) and lookup. Every entity carries a component mask; systems declare
//! a required mask and the [`World`] keeps each system's watch-list in sync as components
//! come and go.

mod component;
mod config;
mod entity;
mod error;
mod family;
mod mask;
mod registry;
mod system;
mod world;

pub use component::{Component, ComponentStorage, ErasedStorage};
pub use config::{EcsConfig, MAX_COMPONENTS_PER_TYPE, MAX_COMPONENT_FAMILIES};
pub use entity::{Entity, EntityRegistry};
pub use error::{EcsError, EcsResult};
pub use family::{ComponentFamily, FamilyRegistry};
pub use mask::ComponentMask;
pub use registry::StorageRegistry;
pub use system::{Signature, System, SystemContext, SystemId, WatchList};
pub use world::World;
