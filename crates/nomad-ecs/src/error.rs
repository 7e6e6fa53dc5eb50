use crate::entity::Entity;

/// Errors returned by world, storage and registry operations.
///
/// Every failure is reported before any entity, mask or watch-list state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("storage for {component} is full ({capacity} components)")]
    CapacityExceeded {
        component: &'static str,
        capacity: usize,
    },

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("unknown or destroyed entity {0}")]
    UnknownEntity(Entity),

    #[error("cannot register {component}: at most {max} component families are supported")]
    FamilyOverflow { component: &'static str, max: usize },

    #[error("invalid ECS configuration: {0}")]
    InvalidConfig(String),

    #[error("world has not been initialized")]
    NotInitialized,

    #[error("world is already initialized")]
    AlreadyInitialized,

    #[error("entity id space exhausted")]
    EntityIdsExhausted,
}

pub type EcsResult<T> = Result<T, EcsError>;
