use std::collections::HashMap;

use tracing::{debug, trace};

use crate::component::{Component, ComponentStorage};
use crate::config::EcsConfig;
use crate::entity::{Entity, EntityRegistry};
use crate::error::{EcsError, EcsResult};
use crate::family::{ComponentFamily, FamilyRegistry};
use crate::mask::ComponentMask;
use crate::registry::StorageRegistry;
use crate::system::{missing, System, SystemContext, SystemId, WatchList};

struct SystemEntry {
    system: Box<dyn System>,
    requirement: ComponentMask,
    watched: WatchList,
}

/// The central ECS container. Owns entities, component storages, entity masks and the
/// registered systems with their watch-lists.
pub struct World {
    config: EcsConfig,
    entities: EntityRegistry,
    families: FamilyRegistry,
    storages: StorageRegistry,
    masks: HashMap<Entity, ComponentMask>,
    systems: Vec<SystemEntry>,
    initialized: bool,
}

impl World {
    /// A world with the default configuration.
    pub fn new() -> Self {
        let config = EcsConfig::default();
        Self::build(config)
    }

    pub fn with_config(config: EcsConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EcsConfig) -> Self {
        debug!(
            capacity = config.max_components_per_type,
            families = config.max_component_families,
            "creating world"
        );
        Self {
            families: FamilyRegistry::new(config.max_component_families),
            config,
            entities: EntityRegistry::new(),
            storages: StorageRegistry::new(),
            masks: HashMap::new(),
            systems: Vec::new(),
            initialized: false,
        }
    }

    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    // ---- Entity management ----

    /// Create a new entity with no components.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self.entities.register()?;
        self.masks
            .insert(entity, ComponentMask::with_width(self.config.max_component_families));
        trace!(%entity, "created entity");
        Ok(entity)
    }

    /// Destroy an entity: evict all its components, drop it from every watch-list and
    /// retire its id.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        let mask = self
            .masks
            .remove(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let evicted = self.storages.evict_all(entity, &mask);
        for entry in &mut self.systems {
            entry.watched.remove(entity);
        }
        self.entities.retire(entity)?;
        trace!(%entity, evicted, "destroyed entity");
        Ok(())
    }

    /// Check whether an entity is alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The live component mask of an entity.
    pub fn mask_of(&self, entity: Entity) -> EcsResult<&ComponentMask> {
        self.masks
            .get(&entity)
            .ok_or(EcsError::UnknownEntity(entity))
    }

    // ---- Component management ----

    /// Register `T` ahead of first use, so family overflow surfaces at startup.
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentFamily> {
        self.families.get_or_register::<T>()
    }

    pub fn family_of<T: Component>(&self) -> Option<ComponentFamily> {
        self.families.get::<T>()
    }

    /// Attach a component to an entity. Fails if the entity already holds a `T`.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.live_mask(entity)?;
        let family = self.families.get_or_register::<T>()?;
        self.storages
            .get_or_create::<T>(family, self.config.max_components_per_type)?
            .attach(entity, component)?;

        let mask = self
            .masks
            .get_mut(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        let old = mask.clone();
        mask.set(family);
        propagate(&mut self.systems, entity, &old, mask);
        Ok(())
    }

    /// Detach a component from an entity and return it.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        self.live_mask(entity)?;
        let family = self
            .families
            .get::<T>()
            .ok_or_else(|| missing::<T>(entity))?;
        let component = self
            .storages
            .get_mut::<T>(family)
            .ok_or_else(|| missing::<T>(entity))?
            .detach(entity)?;

        let mask = self
            .masks
            .get_mut(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        let old = mask.clone();
        mask.clear(family);
        propagate(&mut self.systems, entity, &old, mask);
        Ok(component)
    }

    /// Check whether an entity has a component of the given type.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        match (self.masks.get(&entity), self.families.get::<T>()) {
            (Some(mask), Some(family)) => mask.contains(family),
            _ => false,
        }
    }

    /// Get an immutable reference to a component on an entity.
    pub fn unpack<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.live_mask(entity)?;
        self.storage::<T>()
            .ok_or_else(|| missing::<T>(entity))?
            .get(entity)
    }

    /// Get a mutable reference to a component on an entity.
    pub fn unpack_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.live_mask(entity)?;
        let family = self
            .families
            .get::<T>()
            .ok_or_else(|| missing::<T>(entity))?;
        self.storages
            .get_mut::<T>(family)
            .ok_or_else(|| missing::<T>(entity))?
            .get_mut(entity)
    }

    /// The storage of `T`, if any `T` was ever attached.
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages.get::<T>(self.families.get::<T>()?)
    }

    fn live_mask(&self, entity: Entity) -> EcsResult<&ComponentMask> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        self.mask_of(entity)
    }

    // ---- Systems ----

    /// Register a system. Its watch-list starts empty and fills as component changes
    /// occur; entities that already match are not picked up retroactively.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> EcsResult<SystemId> {
        if self.initialized {
            return Err(EcsError::AlreadyInitialized);
        }
        let requirement = system.signature().resolve(&mut self.families)?;
        let id = SystemId(self.systems.len());
        debug!(system = system.name(), requirement = ?requirement, "added system");
        self.systems.push(SystemEntry {
            system: Box::new(system),
            requirement,
            watched: WatchList::new(),
        });
        Ok(id)
    }

    /// Number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The entities a system is currently watching.
    pub fn watched(&self, id: SystemId) -> Option<&[Entity]> {
        self.systems.get(id.0).map(|entry| entry.watched.as_slice())
    }

    /// The requirement mask a system was registered with.
    pub fn requirement(&self, id: SystemId) -> Option<&ComponentMask> {
        self.systems.get(id.0).map(|entry| &entry.requirement)
    }

    // ---- Lifecycle ----

    /// Run every system's `init` hook. Must be called once, after all systems are added.
    pub fn initialize(&mut self) -> EcsResult<()> {
        if self.initialized {
            return Err(EcsError::AlreadyInitialized);
        }
        self.initialized = true;
        debug!(systems = self.systems.len(), "initializing world");
        self.dispatch(|system, ctx| system.init(ctx))
    }

    /// Advance game logic by `delta` seconds.
    pub fn update(&mut self, delta: f32) -> EcsResult<()> {
        if !self.initialized {
            return Err(EcsError::NotInitialized);
        }
        self.dispatch(|system, ctx| system.update(ctx, delta))
    }

    pub fn render(&mut self) -> EcsResult<()> {
        if !self.initialized {
            return Err(EcsError::NotInitialized);
        }
        self.dispatch(|system, ctx| system.render(ctx))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Call `hook` on each system in registration order, stopping at the first error.
    fn dispatch<F>(&mut self, mut hook: F) -> EcsResult<()>
    where
        F: FnMut(&mut dyn System, &mut SystemContext<'_>) -> EcsResult<()>,
    {
        for entry in &mut self.systems {
            let mut ctx = SystemContext {
                families: &self.families,
                storages: &mut self.storages,
                watched: &entry.watched,
            };
            hook(entry.system.as_mut(), &mut ctx)?;
        }
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Bring every watch-list in line with an entity's mask change.
fn propagate(systems: &mut [SystemEntry], entity: Entity, old: &ComponentMask, new: &ComponentMask) {
    for entry in systems {
        if new.became_matching(old, &entry.requirement) {
            entry.watched.insert(entity);
            trace!(%entity, system = entry.system.name(), "entity joined system");
        } else if new.became_non_matching(old, &entry.requirement) {
            entry.watched.remove(entity);
            trace!(%entity, system = entry.system.name(), "entity left system");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::Signature;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    /// Test system with a configurable requirement that records hook calls.
    struct Recorder {
        signature: fn() -> Signature,
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(label: &'static str, signature: fn() -> Signature) -> Self {
            Self {
                signature,
                label,
                log: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn sharing(mut self, log: &Arc<Mutex<Vec<String>>>) -> Self {
            self.log = log.clone();
            self
        }
    }

    impl System for Recorder {
        fn signature(&self) -> Signature {
            (self.signature)()
        }

        fn init(&mut self, _ctx: &mut SystemContext<'_>) -> EcsResult<()> {
            self.log.lock().unwrap().push(format!("{}:init", self.label));
            Ok(())
        }

        fn update(&mut self, ctx: &mut SystemContext<'_>, _delta: f32) -> EcsResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:update:{}", self.label, ctx.entities().len()));
            Ok(())
        }

        fn render(&mut self, _ctx: &mut SystemContext<'_>) -> EcsResult<()> {
            self.log.lock().unwrap().push(format!("{}:render", self.label));
            Ok(())
        }
    }

    fn positions() -> Signature {
        Signature::new().with::<Position>()
    }

    fn movers() -> Signature {
        Signature::new().with::<Position>().with::<Velocity>()
    }

    fn named() -> Signature {
        Signature::new().with::<Name>()
    }

    struct Movement;

    impl System for Movement {
        fn signature(&self) -> Signature {
            movers()
        }

        fn update(&mut self, ctx: &mut SystemContext<'_>, delta: f32) -> EcsResult<()> {
            for &entity in ctx.entities() {
                let dx = ctx.unpack::<Velocity>(entity)?.dx;
                ctx.unpack_mut::<Position>(entity)?.x += dx * delta;
            }
            Ok(())
        }
    }

    /// Halves every stored velocity, matched or not.
    struct Drag;

    impl System for Drag {
        fn signature(&self) -> Signature {
            Signature::new().with::<Velocity>()
        }

        fn update(&mut self, ctx: &mut SystemContext<'_>, _delta: f32) -> EcsResult<()> {
            if let Some(velocities) = ctx.components_mut::<Velocity>() {
                for (_, velocity) in velocities.iter_mut() {
                    velocity.dx *= 0.5;
                }
            }
            Ok(())
        }
    }

    /// Every system's watch-list equals the set of live entities matching its requirement.
    fn assert_watch_lists_consistent(world: &World) {
        for entry in &world.systems {
            let mut expected: Vec<Entity> = world
                .masks
                .iter()
                .filter(|(_, mask)| mask.matches(&entry.requirement))
                .map(|(entity, _)| *entity)
                .collect();
            expected.sort();
            let mut actual = entry.watched.as_slice().to_vec();
            actual.sort();
            assert_eq!(actual, expected, "watch-list of {}", entry.system.name());
        }
    }

    /// A mask bit is set exactly when the family's storage holds the entity.
    fn assert_masks_match_storage(world: &World) {
        for (entity, mask) in &world.masks {
            for index in 0..world.families.len() {
                let family = ComponentFamily::from_index(index);
                let stored = world
                    .storages
                    .erased(family)
                    .is_some_and(|storage| storage.contains(*entity));
                assert_eq!(mask.contains(family), stored, "{entity} family {index}");
            }
        }
    }

    #[test]
    fn attach_then_detach_updates_watch_list() {
        let mut world = World::new();
        let system = world.add_system(Recorder::new("pos", positions)).unwrap();
        let e1 = world.create_entity().unwrap();

        world.add_component(e1, Position { x: 0.0 }).unwrap();
        assert_eq!(world.watched(system), Some(&[e1][..]));
        assert_eq!(world.family_of::<Position>().unwrap().index(), 0);

        assert_eq!(world.remove_component::<Position>(e1), Ok(Position { x: 0.0 }));
        assert_eq!(world.watched(system), Some(&[][..]));
        assert!(matches!(
            world.unpack::<Position>(e1),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn duplicate_attach_rejected() {
        let mut world = World::new();
        let system = world.add_system(Recorder::new("pos", positions)).unwrap();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: 1.0 }).unwrap();

        let err = world.add_component(e, Position { x: 2.0 }).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { entity, .. } if entity == e));
        assert_eq!(world.unpack::<Position>(e), Ok(&Position { x: 1.0 }));
        assert_eq!(world.watched(system).unwrap().len(), 1);
        assert_eq!(world.storage::<Position>().unwrap().len(), 1);
    }

    #[test]
    fn detach_relocates_remaining_entity() {
        let mut world = World::new();
        let e1 = world.create_entity().unwrap();
        let e2 = world.create_entity().unwrap();
        let e3 = world.create_entity().unwrap();
        world.add_component(e1, Name("one".into())).unwrap();
        world.add_component(e2, Name("two".into())).unwrap();

        let e1_slot = world.storage::<Name>().unwrap().slot_of(e1).unwrap();
        world.remove_component::<Name>(e1).unwrap();

        let storage = world.storage::<Name>().unwrap();
        assert_eq!(storage.slot_of(e2), Some(e1_slot));
        assert_eq!(storage.entity_at(1), None);
        assert_eq!(world.unpack::<Name>(e2), Ok(&Name("two".into())));
        assert!(!world.has_component::<Name>(e3));
    }

    #[test]
    fn capacity_exceeded_leaves_state_untouched() {
        let config = EcsConfig {
            max_components_per_type: 3,
            ..Default::default()
        };
        let mut world = World::with_config(config).unwrap();
        let system = world.add_system(Recorder::new("pos", positions)).unwrap();

        let entities: Vec<_> = (0..4).map(|_| world.create_entity().unwrap()).collect();
        for &e in &entities[..3] {
            world.add_component(e, Position { x: 0.0 }).unwrap();
        }
        let err = world.add_component(entities[3], Position { x: 0.0 }).unwrap_err();
        assert!(matches!(err, EcsError::CapacityExceeded { capacity: 3, .. }));
        assert_eq!(world.storage::<Position>().unwrap().len(), 3);
        assert!(!world.has_component::<Position>(entities[3]));
        assert_eq!(world.watched(system).unwrap().len(), 3);
    }

    #[test]
    fn late_system_starts_empty() {
        let mut world = World::new();
        let e1 = world.create_entity().unwrap();
        let e2 = world.create_entity().unwrap();
        world.add_component(e1, Position { x: 0.0 }).unwrap();
        world.add_component(e2, Position { x: 0.0 }).unwrap();

        let system = world.add_system(Recorder::new("pos", positions)).unwrap();
        assert_eq!(world.watched(system), Some(&[][..]));

        // e1 already matched before this attach, so it is not a transition.
        world.add_component(e1, Name("late".into())).unwrap();
        assert_eq!(world.watched(system), Some(&[][..]));

        // Re-attaching Position is a fresh transition into the requirement.
        world.remove_component::<Position>(e2).unwrap();
        world.add_component(e2, Position { x: 1.0 }).unwrap();
        assert_eq!(world.watched(system), Some(&[e2][..]));
    }

    #[test]
    fn multi_component_requirement() {
        let mut world = World::new();
        let positional = world.add_system(Recorder::new("pos", positions)).unwrap();
        let moving = world.add_system(Recorder::new("move", movers)).unwrap();
        let e = world.create_entity().unwrap();

        world.add_component(e, Velocity { dx: 1.0 }).unwrap();
        assert!(world.watched(positional).unwrap().is_empty());
        assert!(world.watched(moving).unwrap().is_empty());

        world.add_component(e, Position { x: 0.0 }).unwrap();
        assert_eq!(world.watched(positional), Some(&[e][..]));
        assert_eq!(world.watched(moving), Some(&[e][..]));

        world.remove_component::<Velocity>(e).unwrap();
        assert_eq!(world.watched(positional), Some(&[e][..]));
        assert!(world.watched(moving).unwrap().is_empty());
        assert_eq!(world.requirement(moving).unwrap().count(), 2);
    }

    #[test]
    fn destroy_evicts_components_and_watchers() {
        let mut world = World::new();
        let system = world.add_system(Recorder::new("move", movers)).unwrap();
        let doomed = world.create_entity().unwrap();
        let survivor = world.create_entity().unwrap();
        for &e in &[doomed, survivor] {
            world.add_component(e, Position { x: e.id() as f32 }).unwrap();
            world.add_component(e, Velocity { dx: 0.0 }).unwrap();
        }

        world.destroy_entity(doomed).unwrap();
        assert!(!world.is_alive(doomed));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.watched(system), Some(&[survivor][..]));
        assert_eq!(world.storage::<Position>().unwrap().len(), 1);
        assert_eq!(world.storage::<Velocity>().unwrap().len(), 1);
        assert_eq!(world.unpack::<Position>(survivor), Ok(&Position { x: 1.0 }));

        assert_eq!(
            world.destroy_entity(doomed),
            Err(EcsError::UnknownEntity(doomed))
        );
        assert_eq!(
            world.add_component(doomed, Name("ghost".into())),
            Err(EcsError::UnknownEntity(doomed))
        );
        assert!(matches!(
            world.unpack::<Position>(doomed),
            Err(EcsError::UnknownEntity(_))
        ));
    }

    #[test]
    fn unknown_entity_rejected() {
        let mut world = World::new();
        let ghost = Entity::from_raw(99);
        assert_eq!(
            world.add_component(ghost, Position { x: 0.0 }),
            Err(EcsError::UnknownEntity(ghost))
        );
        assert_eq!(
            world.remove_component::<Position>(ghost),
            Err(EcsError::UnknownEntity(ghost))
        );
        assert!(world.mask_of(ghost).is_err());
        // The rejected attach must not register a family.
        assert_eq!(world.family_of::<Position>(), None);
    }

    #[test]
    fn remove_missing_component_is_error() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        assert!(matches!(
            world.remove_component::<Position>(e),
            Err(EcsError::MissingComponent { .. })
        ));
        world.add_component(e, Velocity { dx: 0.0 }).unwrap();
        world.register_component::<Position>().unwrap();
        assert!(matches!(
            world.remove_component::<Position>(e),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(world.has_component::<Velocity>(e));
    }

    #[test]
    fn family_overflow_is_fatal_for_registration() {
        let config = EcsConfig {
            max_component_families: 2,
            ..Default::default()
        };
        let mut world = World::with_config(config).unwrap();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: 0.0 }).unwrap();
        world.add_component(e, Velocity { dx: 0.0 }).unwrap();

        let err = world.add_component(e, Name("x".into())).unwrap_err();
        assert!(matches!(err, EcsError::FamilyOverflow { max: 2, .. }));
        assert_eq!(world.mask_of(e).unwrap().count(), 2);
        assert!(matches!(
            world.add_system(Recorder::new("named", named)),
            Err(EcsError::FamilyOverflow { .. })
        ));
        assert_eq!(world.system_count(), 0);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EcsConfig {
            max_components_per_type: 0,
            ..Default::default()
        };
        assert!(matches!(
            World::with_config(config),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_config_rejected() {
        let config = EcsConfig {
            max_components_per_type: i64::MAX as usize,
            max_component_families: 64,
        };
        assert!(matches!(
            World::with_config(config),
            Err(EcsError::InvalidConfig(_))
        ));

        let config = EcsConfig {
            max_components_per_type: 16,
            max_component_families: usize::MAX,
        };
        assert!(matches!(
            World::with_config(config),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn lifecycle_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut world = World::new();
        world.add_system(Recorder::new("a", positions).sharing(&log)).unwrap();
        world.add_system(Recorder::new("b", movers).sharing(&log)).unwrap();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: 0.0 }).unwrap();

        assert_eq!(world.update(0.1), Err(EcsError::NotInitialized));
        assert_eq!(world.render(), Err(EcsError::NotInitialized));

        world.initialize().unwrap();
        world.update(0.1).unwrap();
        world.render().unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:init", "b:init", "a:update:1", "b:update:0", "a:render", "b:render"]
        );

        assert_eq!(world.initialize(), Err(EcsError::AlreadyInitialized));
        assert!(matches!(
            world.add_system(Recorder::new("c", named)),
            Err(EcsError::AlreadyInitialized)
        ));
    }

    #[test]
    fn systems_mutate_components_through_context() {
        let mut world = World::new();
        world.add_system(Movement).unwrap();
        let mover = world.create_entity().unwrap();
        let still = world.create_entity().unwrap();
        world.add_component(mover, Position { x: 0.0 }).unwrap();
        world.add_component(mover, Velocity { dx: 2.0 }).unwrap();
        world.add_component(still, Position { x: 5.0 }).unwrap();

        world.initialize().unwrap();
        world.update(0.5).unwrap();
        world.update(0.5).unwrap();

        assert_eq!(world.unpack::<Position>(mover), Ok(&Position { x: 2.0 }));
        assert_eq!(world.unpack::<Position>(still), Ok(&Position { x: 5.0 }));

        world.unpack_mut::<Velocity>(mover).unwrap().dx = 0.0;
        world.update(1.0).unwrap();
        assert_eq!(world.unpack::<Position>(mover), Ok(&Position { x: 2.0 }));
    }

    #[test]
    fn systems_sweep_whole_storage_through_context() {
        let mut world = World::new();
        world.add_system(Drag).unwrap();
        world.add_system(Movement).unwrap();
        let mover = world.create_entity().unwrap();
        let drifter = world.create_entity().unwrap();
        world.add_component(mover, Position { x: 0.0 }).unwrap();
        world.add_component(mover, Velocity { dx: 4.0 }).unwrap();
        world.add_component(drifter, Velocity { dx: 8.0 }).unwrap();

        world.initialize().unwrap();
        world.update(1.0).unwrap();

        assert_eq!(world.unpack::<Velocity>(mover), Ok(&Velocity { dx: 2.0 }));
        assert_eq!(world.unpack::<Velocity>(drifter), Ok(&Velocity { dx: 4.0 }));
        // Drag runs first, so Movement sees the halved velocity.
        assert_eq!(world.unpack::<Position>(mover), Ok(&Position { x: 2.0 }));
    }

    #[test]
    fn random_churn_keeps_masks_and_watch_lists_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = EcsConfig {
            max_components_per_type: 24,
            max_component_families: 8,
        };
        let mut world = World::with_config(config).unwrap();
        world.add_system(Recorder::new("pos", positions)).unwrap();
        world.add_system(Recorder::new("move", movers)).unwrap();
        world.add_system(Recorder::new("named", named)).unwrap();

        let mut live: Vec<Entity> = Vec::new();
        for _ in 0..1_500 {
            if live.is_empty() || rng.gen_bool(0.1) {
                live.push(world.create_entity().unwrap());
                continue;
            }
            let entity = live[rng.gen_range(0..live.len())];
            let result = match rng.gen_range(0..7) {
                0 => world.add_component(entity, Position { x: 0.0 }),
                1 => world.add_component(entity, Velocity { dx: 1.0 }),
                2 => world.add_component(entity, Name("n".into())),
                3 => world.remove_component::<Position>(entity).map(drop),
                4 => world.remove_component::<Velocity>(entity).map(drop),
                5 => world.remove_component::<Name>(entity).map(drop),
                _ => {
                    live.retain(|e| *e != entity);
                    world.destroy_entity(entity)
                }
            };
            match result {
                Ok(())
                | Err(EcsError::DuplicateComponent { .. })
                | Err(EcsError::MissingComponent { .. })
                | Err(EcsError::CapacityExceeded { .. }) => {}
                Err(other) => panic!("unexpected error {other:?}"),
            }
            assert_masks_match_storage(&world);
            assert_watch_lists_consistent(&world);
        }
        assert_eq!(world.entity_count(), live.len());
    }
}
