use std::fmt;

use crate::error::{EcsError, EcsResult};

/// An opaque entity identity. Carries no data; ordered by id and hashable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(pub(crate) u32);

impl Entity {
    /// Create an entity from a raw id (mainly for testing).
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// The numeric id of this entity.
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues entity ids from a monotonic counter. Retired ids are never handed out again.
pub struct EntityRegistry {
    alive: Vec<bool>,
    len: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            alive: Vec::new(),
            len: 0,
        }
    }

    /// Issue the next id.
    pub fn register(&mut self) -> EcsResult<Entity> {
        let id = u32::try_from(self.alive.len()).map_err(|_| EcsError::EntityIdsExhausted)?;
        self.alive.push(true);
        self.len += 1;
        Ok(Entity(id))
    }

    /// Retire an entity. Fails if it was never issued or is already retired.
    pub fn retire(&mut self, entity: Entity) -> EcsResult<()> {
        match self.alive.get_mut(entity.0 as usize) {
            Some(alive) if *alive => {
                *alive = false;
                self.len -= 1;
                Ok(())
            }
            _ => Err(EcsError::UnknownEntity(entity)),
        }
    }

    /// Check if an entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.0 as usize).copied().unwrap_or(false)
    }

    /// Number of currently alive entities.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of ids issued so far, live or retired.
    pub fn issued(&self) -> usize {
        self.alive.len()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
