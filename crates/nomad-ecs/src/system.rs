use std::any::type_name;

use crate::component::{Component, ComponentStorage};
use crate::entity::Entity;
use crate::error::{EcsError, EcsResult};
use crate::family::{ComponentFamily, FamilyRegistry};
use crate::mask::ComponentMask;
use crate::registry::StorageRegistry;

type FamilyResolver = fn(&mut FamilyRegistry) -> EcsResult<ComponentFamily>;

/// The component types a system requires. Resolved once into a [`ComponentMask`] when the
/// system is added to a world.
#[derive(Default)]
pub struct Signature {
    resolvers: Vec<FamilyResolver>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component `T`.
    pub fn with<T: Component>(mut self) -> Self {
        self.resolvers.push(FamilyRegistry::get_or_register::<T>);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub(crate) fn resolve(&self, families: &mut FamilyRegistry) -> EcsResult<ComponentMask> {
        let mut mask = ComponentMask::with_width(families.max());
        for resolve in &self.resolvers {
            mask.set(resolve(families)?);
        }
        Ok(mask)
    }
}

/// A processor that runs over every entity holding its required components.
///
/// The world keeps the system's watch-list in sync with entity masks; the system only reads
/// it through the [`SystemContext`] handed to each hook.
pub trait System {
    /// Components an entity must hold to appear in this system's watch-list.
    fn signature(&self) -> Signature;

    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn init(&mut self, _ctx: &mut SystemContext<'_>) -> EcsResult<()> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, delta: f32) -> EcsResult<()>;

    fn render(&mut self, _ctx: &mut SystemContext<'_>) -> EcsResult<()> {
        Ok(())
    }
}

/// Handle returned by [`World::add_system`](crate::World::add_system).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) usize);

impl SystemId {
    /// Registration position of the system.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Entities currently matching a system, in the order they started matching.
#[derive(Debug, Default, Clone)]
pub struct WatchList {
    entities: Vec<Entity>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entity`. Returns `false` if it was already present.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Remove `entity` if present. Removing an absent entity is a no-op.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.entities.iter().position(|e| *e == entity) {
            Some(pos) => {
                self.entities.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// What a system may touch while one of its hooks runs: its own watch-list, and component
/// values. Entity masks and other systems are out of reach.
pub struct SystemContext<'w> {
    pub(crate) families: &'w FamilyRegistry,
    pub(crate) storages: &'w mut StorageRegistry,
    pub(crate) watched: &'w WatchList,
}

impl<'w> SystemContext<'w> {
    /// The entities this system currently acts on.
    pub fn entities(&self) -> &'w [Entity] {
        self.watched.as_slice()
    }

    pub fn unpack<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.families
            .get::<T>()
            .and_then(|family| self.storages.get::<T>(family))
            .ok_or_else(|| missing::<T>(entity))?
            .get(entity)
    }

    pub fn unpack_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        let family = self.families.get::<T>().ok_or_else(|| missing::<T>(entity))?;
        self.storages
            .get_mut::<T>(family)
            .ok_or_else(|| missing::<T>(entity))?
            .get_mut(entity)
    }

    /// The whole storage of `T`, for bulk iteration.
    pub fn components<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages.get::<T>(self.families.get::<T>()?)
    }

    pub fn components_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        let family = self.families.get::<T>()?;
        self.storages.get_mut::<T>(family)
    }
}

pub(crate) fn missing<T: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: type_name::<T>(),
    }
}
