// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Error types
//!
//! Store operations return [`EcsError`]. Only [`EcsError::AllocationFailure`]
//! is fatal; the other variants describe a single operation that was skipped
//! and are logged where they occur.

use crate::ecs::Entity;
use thiserror::Error;

/// Log target for data-integrity warnings
///
/// Integrity faults (a collision partner without `Mass`, a relation to a
/// vanished entity) are logged under this target so they can be filtered or
/// counted separately from ordinary warnings.
pub const INTEGRITY_TARGET: &str = "anomaloid_engine::integrity";

/// Errors raised by the entity store and the passes that run over it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The operation targeted an entity that has already been destroyed
    #[error("{0} has been destroyed")]
    UseAfterDestroy(Entity),

    /// A queried entity lacks a component the operation needs
    #[error("{entity} has no {component} component")]
    MissingComponent {
        /// Entity that was missing the component
        entity: Entity,
        /// Short type name of the missing component
        component: &'static str,
    },

    /// A relation points at an entity that is no longer alive
    #[error("relation refers to {entity}, which is no longer alive")]
    DanglingRelation {
        /// The vanished end of the relation
        entity: Entity,
    },

    /// The store cannot hand out another entity slot
    #[error("entity store exhausted: cannot allocate slot {requested}")]
    AllocationFailure {
        /// Number of slots the store would need to satisfy the request
        requested: usize,
    },
}

impl EcsError {
    /// Whether the error aborts the surrounding operation
    ///
    /// Non-fatal errors are handled by skipping the affected entity or pair.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EcsError::AllocationFailure { .. })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let entity = Entity::new(4, 1);
        assert_eq!(
            EcsError::UseAfterDestroy(entity).to_string(),
            "Entity(4, gen: 1) has been destroyed"
        );
        assert_eq!(
            EcsError::MissingComponent { entity, component: "Mass" }.to_string(),
            "Entity(4, gen: 1) has no Mass component"
        );
    }

    #[test]
    fn test_only_allocation_failure_is_fatal() {
        let entity = Entity::new(0, 0);
        assert!(EcsError::AllocationFailure { requested: 10 }.is_fatal());
        assert!(!EcsError::UseAfterDestroy(entity).is_fatal());
        assert!(!EcsError::DanglingRelation { entity }.is_fatal());
        assert!(!EcsError::MissingComponent { entity, component: "Mass" }.is_fatal());
    }
}
