use std::any::type_name;

use tracing::debug;

use crate::component::{Component, ComponentStorage, ErasedStorage};
use crate::entity::Entity;
use crate::error::EcsResult;
use crate::family::ComponentFamily;
use crate::mask::ComponentMask;

/// Owns one storage per component family, created lazily on first attach.
pub struct StorageRegistry {
    storages: Vec<Option<Box<dyn ErasedStorage>>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self {
            storages: Vec::new(),
        }
    }

    /// The typed storage for `family`, creating it with `capacity` on first use.
    ///
    /// # Panics
    /// Panics if `family` was previously created for a different component type.
    pub fn get_or_create<T: Component>(
        &mut self,
        family: ComponentFamily,
        capacity: usize,
    ) -> EcsResult<&mut ComponentStorage<T>> {
        let index = family.index();
        if index >= self.storages.len() {
            self.storages.resize_with(index + 1, || None);
        }
        if self.storages[index].is_none() {
            let storage = ComponentStorage::<T>::new(capacity)?;
            debug!(component = type_name::<T>(), capacity, "created component storage");
            self.storages[index] = Some(Box::new(storage));
        }
        Ok(self
            .get_mut::<T>(family)
            .expect("component family bound to a different type"))
    }

    pub fn get<T: Component>(&self, family: ComponentFamily) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(family.index())?
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    pub fn get_mut<T: Component>(
        &mut self,
        family: ComponentFamily,
    ) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(family.index())?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }

    pub fn erased(&self, family: ComponentFamily) -> Option<&dyn ErasedStorage> {
        self.storages.get(family.index())?.as_deref()
    }

    pub fn erased_mut(&mut self, family: ComponentFamily) -> Option<&mut dyn ErasedStorage> {
        match self.storages.get_mut(family.index()) {
            Some(Some(storage)) => Some(storage.as_mut()),
            _ => None,
        }
    }

    /// Evict `entity` from the storage of every family set in `mask`.
    /// Returns the number of components removed.
    pub fn evict_all(&mut self, entity: Entity, mask: &ComponentMask) -> usize {
        let mut removed = 0;
        for family in mask.families() {
            if let Some(storage) = self.erased_mut(family) {
                if storage.evict(entity) {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Number of storages created so far.
    pub fn len(&self) -> usize {
        self.storages.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
