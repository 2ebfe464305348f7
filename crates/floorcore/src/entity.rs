use std::collections::HashMap;

use crate::block::{HazardState, PhaseState, PortalState};
use crate::goal::GoalState;
use crate::item::ItemState;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Block,
    Button,
    Goal,
    Item,
    Hazard,
    Portal,
    Phase,
    Player,
}

impl EntityCategory {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Button => "button",
            Self::Goal => "goal",
            Self::Item => "item",
            Self::Hazard => "hazard",
            Self::Portal => "portal",
            Self::Phase => "phase",
            Self::Player => "player",
        }
    }
}

/// Per-category mutable state. The variant fixes the entity's category for
/// its whole lifetime; only the fields inside a variant ever change.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityState {
    Block,
    Button,
    Goal(GoalState),
    Item(ItemState),
    Hazard(HazardState),
    Portal(PortalState),
    Phase(PhaseState),
    Player,
}

impl EntityState {
    pub fn category(&self) -> EntityCategory {
        match self {
            Self::Block => EntityCategory::Block,
            Self::Button => EntityCategory::Button,
            Self::Goal(_) => EntityCategory::Goal,
            Self::Item(_) => EntityCategory::Item,
            Self::Hazard(_) => EntityCategory::Hazard,
            Self::Portal(_) => EntityCategory::Portal,
            Self::Phase(_) => EntityCategory::Phase,
            Self::Player => EntityCategory::Player,
        }
    }

    /// Restores the configured defaults captured at spawn time. Binding
    /// registrations (a portal's controlling button, a goal's gating
    /// buttons) survive: binding is per floor lifetime, not per reset.
    pub fn reset_to_defaults(&mut self) {
        match self {
            Self::Block | Self::Button | Self::Item(_) | Self::Player => {}
            Self::Goal(goal) => goal.reset_to_defaults(),
            Self::Hazard(hazard) => hazard.reset_to_defaults(),
            Self::Portal(portal) => portal.reset_to_defaults(),
            Self::Phase(phase) => phase.reset_to_defaults(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub tag: String,
    pub position: Vec2,
    origin: Vec2,
    state: EntityState,
}

impl Entity {
    pub fn category(&self) -> EntityCategory {
        self.state.category()
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    /// Crate-internal: the variant fixes the entity's category, so the
    /// enclosing `EntityState` is never handed out mutably across the
    /// crate boundary.
    pub(crate) fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Usability predicate checked by callers before dispatching an
    /// interaction. Locked portals and phased-out blocks are unusable;
    /// everything else, including a locked button, stays usable (a locked
    /// button swallows the interaction itself).
    pub fn usable_block(&self) -> bool {
        match &self.state {
            EntityState::Portal(portal) => !portal.locked,
            EntityState::Phase(phase) => phase.solid,
            _ => true,
        }
    }

    /// Restores the position captured at spawn. Callable any number of
    /// times, including before any mutation occurred.
    pub fn reset_asset(&mut self) {
        self.position = self.origin;
    }
}

/// Category-indexed entity registry. Every entity registers itself here at
/// spawn, so discovery is an indexed lookup instead of a scene-wide scan.
#[derive(Debug, Default)]
pub struct FloorWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    ids_by_category: HashMap<EntityCategory, Vec<EntityId>>,
}

impl FloorWorld {
    pub fn spawn(&mut self, position: Vec2, tag: impl Into<String>, state: EntityState) -> EntityId {
        let id = self.allocator.allocate();
        let category = state.category();
        self.entities.push(Entity {
            id,
            tag: tag.into(),
            position,
            origin: position,
            state,
        });
        self.ids_by_category.entry(category).or_default().push(id);
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(index) = self.entities.iter().position(|entity| entity.id == id) else {
            return false;
        };
        let category = self.entities[index].category();
        self.entities.remove(index);
        if let Some(ids) = self.ids_by_category.get_mut(&category) {
            ids.retain(|candidate| *candidate != id);
        }
        true
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// Live entity ids of one category, in spawn order.
    pub fn entities_in_category(&self, category: EntityCategory) -> &[EntityId] {
        self.ids_by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids of every live entity, in spawn order.
    pub fn live_entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| entity.id).collect()
    }
}
