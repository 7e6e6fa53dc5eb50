use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Largest accepted `max_components_per_type`.
pub const MAX_COMPONENTS_PER_TYPE: usize = 1 << 20;
/// Largest accepted `max_component_families`.
pub const MAX_COMPONENT_FAMILIES: usize = 4096;

/// Fixed sizing for a [`World`](crate::World). Both limits are set once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Capacity of every component storage. Storages never grow past this.
    pub max_components_per_type: usize,
    /// Width of a component mask, i.e. the number of distinct component types.
    pub max_component_families: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_components_per_type: 1024,
            max_component_families: 64,
        }
    }
}

impl EcsConfig {
    /// Reject limits that could never hold a component, or that no allocation could satisfy.
    pub fn validate(&self) -> EcsResult<()> {
        check_limit(
            "max_components_per_type",
            self.max_components_per_type,
            MAX_COMPONENTS_PER_TYPE,
        )?;
        check_limit(
            "max_component_families",
            self.max_component_families,
            MAX_COMPONENT_FAMILIES,
        )
    }
}

fn check_limit(field: &str, value: usize, max: usize) -> EcsResult<()> {
    if value == 0 {
        return Err(EcsError::InvalidConfig(format!(
            "{field} must be greater than zero"
        )));
    }
    if value > max {
        return Err(EcsError::InvalidConfig(format!(
            "{field} is {value}, the limit is {max}"
        )));
    }
    Ok(())
}
