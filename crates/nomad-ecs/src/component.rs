use std::any::{type_name, Any};
use std::collections::HashMap;

use tracing::warn;

use crate::entity::Entity;
use crate::error::{EcsError, EcsResult};

/// Marker trait for types that can be stored as ECS components.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// Type-erased storage interface. Lets the world evict an entity from every storage
/// without knowing the concrete component types.
pub trait ErasedStorage: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drop the entity's component if present. Returns `true` if one was removed.
    fn evict(&mut self, entity: Entity) -> bool;
    fn contains(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
}

/// Fixed-capacity packed storage for a single component type.
///
/// Values live in `dense[0..len]` with no gaps. `entities[slot]` names the owner of each
/// slot and `slots` maps each owner back to its slot. Detaching swaps the tail into the
/// freed slot, so slot numbers are not stable across detaches.
pub struct ComponentStorage<T> {
    /// Packed component values.
    dense: Vec<T>,
    /// Owner of each dense slot.
    entities: Vec<Entity>,
    /// Entity → dense slot.
    slots: HashMap<Entity, usize>,
    capacity: usize,
}

impl<T: Component> ComponentStorage<T> {
    /// Allocate storage for exactly `capacity` components. It never grows.
    ///
    /// Fails with `CapacityExceeded` if the allocation cannot be made.
    pub fn new(capacity: usize) -> EcsResult<Self> {
        let mut storage = Self {
            dense: Vec::new(),
            entities: Vec::new(),
            slots: HashMap::new(),
            capacity,
        };
        let reserved = storage
            .dense
            .try_reserve_exact(capacity)
            .and_then(|()| storage.entities.try_reserve_exact(capacity))
            .and_then(|()| storage.slots.try_reserve(capacity));
        if let Err(err) = reserved {
            warn!(
                component = type_name::<T>(),
                capacity,
                %err,
                "could not allocate component storage"
            );
            return Err(EcsError::CapacityExceeded {
                component: type_name::<T>(),
                capacity,
            });
        }
        Ok(storage)
    }

    /// Append a component for `entity` at the tail and return its slot.
    pub fn attach(&mut self, entity: Entity, value: T) -> EcsResult<usize> {
        if self.slots.contains_key(&entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }
        if self.dense.len() >= self.capacity {
            warn!(
                component = type_name::<T>(),
                capacity = self.capacity,
                %entity,
                "component storage full"
            );
            return Err(EcsError::CapacityExceeded {
                component: type_name::<T>(),
                capacity: self.capacity,
            });
        }
        let slot = self.dense.len();
        self.dense.push(value);
        self.entities.push(entity);
        self.slots.insert(entity, slot);
        Ok(slot)
    }

    /// Remove and return the component for `entity`, moving the tail into its slot.
    pub fn detach(&mut self, entity: Entity) -> EcsResult<T> {
        let slot = self
            .slots
            .remove(&entity)
            .ok_or_else(|| self.missing(entity))?;

        let value = self.dense.swap_remove(slot);
        self.entities.swap_remove(slot);
        if let Some(&moved) = self.entities.get(slot) {
            self.slots.insert(moved, slot);
        }
        Ok(value)
    }

    pub fn get(&self, entity: Entity) -> EcsResult<&T> {
        match self.slots.get(&entity) {
            Some(&slot) => Ok(&self.dense[slot]),
            None => Err(self.missing(entity)),
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> EcsResult<&mut T> {
        match self.slots.get(&entity) {
            Some(&slot) => Ok(&mut self.dense[slot]),
            None => Err(self.missing(entity)),
        }
    }

    fn missing(&self, entity: Entity) -> EcsError {
        EcsError::MissingComponent {
            entity,
            component: type_name::<T>(),
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.slots.contains_key(&entity)
    }

    /// Current slot of `entity`, if it has one.
    pub fn slot_of(&self, entity: Entity) -> Option<usize> {
        self.slots.get(&entity).copied()
    }

    /// Owner of `slot`, if the slot is occupied.
    pub fn entity_at(&self, slot: usize) -> Option<Entity> {
        self.entities.get(slot).copied()
    }

    /// Iterate over all (entity, &component) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterate over all (entity, &mut component) pairs in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// The packed component values.
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Owners of the packed values, slot for slot.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn evict(&mut self, entity: Entity) -> bool {
        self.detach(entity).is_ok()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.slots.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }
}
