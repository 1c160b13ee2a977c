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
//! Buffered structural mutations
//!
//! While a deferred scope is open, the world records structural writes here
//! instead of applying them. The buffer is replayed in recording order when
//! the outermost scope commits, or truncated back to a scope's starting mark
//! when that scope is discarded.

use crate::ecs::Entity;
use std::any::{Any, TypeId};
use std::fmt;

/// A single buffered mutation
pub(crate) enum Command {
    /// Make a reserved entity slot live
    Spawn(Entity),
    /// Attach or overwrite a component
    Insert {
        entity: Entity,
        component: TypeId,
        name: &'static str,
        value: Box<dyn Any + Send>,
    },
    /// Detach a component
    Remove { entity: Entity, component: TypeId },
    /// Destroy an entity with all its components and relations
    Destroy(Entity),
    /// Record a relation pair
    Relate {
        relation: TypeId,
        a: Entity,
        b: Entity,
    },
    /// Remove a relation pair
    Unrelate {
        relation: TypeId,
        a: Entity,
        b: Entity,
    },
    /// Remove every pair of one relation type
    ClearRelation(TypeId),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Spawn(entity) => write!(f, "Spawn({})", entity),
            Command::Insert { entity, name, .. } => write!(f, "Insert({}, {})", entity, name),
            Command::Remove { entity, .. } => write!(f, "Remove({})", entity),
            Command::Destroy(entity) => write!(f, "Destroy({})", entity),
            Command::Relate { a, b, .. } => write!(f, "Relate({}, {})", a, b),
            Command::Unrelate { a, b, .. } => write!(f, "Unrelate({}, {})", a, b),
            Command::ClearRelation(_) => write!(f, "ClearRelation"),
        }
    }
}

/// Position in the buffer at which a scope opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommandMark(usize);

impl CommandMark {
    pub(crate) fn position(self) -> usize {
        self.0
    }
}

/// Ordered log of buffered mutations
#[derive(Debug, Default)]
pub(crate) struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub(crate) fn new() -> Self {
        CommandBuffer {
            commands: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub(crate) fn mark(&self) -> CommandMark {
        CommandMark(self.commands.len())
    }

    pub(crate) fn len(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove and return everything recorded after `mark`
    pub(crate) fn split_off(&mut self, mark: CommandMark) -> Vec<Command> {
        let at = mark.0.min(self.commands.len());
        self.commands.split_off(at)
    }

    /// Remove and return every command, oldest first
    pub(crate) fn take_all(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
