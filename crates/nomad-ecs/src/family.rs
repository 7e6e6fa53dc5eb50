use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::component::Component;
use crate::error::{EcsError, EcsResult};

/// Per-type index used for mask bits and storage table slots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentFamily(u32);

impl ComponentFamily {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Family({})", self.0)
    }
}

/// Assigns family ids to component types in first-touch order.
///
/// Owned by a single world, so ids are deterministic for a given registration order and
/// independent of any other world in the process.
pub struct FamilyRegistry {
    ids: HashMap<TypeId, ComponentFamily>,
    names: Vec<&'static str>,
    max: usize,
}

impl FamilyRegistry {
    pub fn new(max: usize) -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
            max,
        }
    }

    /// Look up the family of `T` without registering it.
    pub fn get<T: Component>(&self) -> Option<ComponentFamily> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Look up the family of `T`, assigning the next id if it has none yet.
    pub fn get_or_register<T: Component>(&mut self) -> EcsResult<ComponentFamily> {
        if let Some(family) = self.get::<T>() {
            return Ok(family);
        }
        if self.names.len() >= self.max {
            return Err(EcsError::FamilyOverflow {
                component: type_name::<T>(),
                max: self.max,
            });
        }
        let family = ComponentFamily::from_index(self.names.len());
        self.ids.insert(TypeId::of::<T>(), family);
        self.names.push(type_name::<T>());
        debug!(component = type_name::<T>(), family = family.index(), "registered component family");
        Ok(family)
    }

    /// Type name recorded for a family, for diagnostics.
    pub fn name(&self, family: ComponentFamily) -> Option<&'static str> {
        self.names.get(family.index()).copied()
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Maximum number of families, equal to the mask width.
    pub fn max(&self) -> usize {
        self.max
    }
}
