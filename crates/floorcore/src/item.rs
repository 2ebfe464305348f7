use crate::entity::{EntityId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A collectible with no special effect.
    Plain,
    Key,
    Weapon,
}

impl ItemKind {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Key => "key",
            Self::Weapon => "weapon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemState {
    pub kind: ItemKind,
}

impl ItemState {
    pub fn new(kind: ItemKind) -> Self {
        Self { kind }
    }
}

/// Pickup destroys the item entity, so reset cannot restore it in place.
/// The floor controller keeps one spawn record per placed item and
/// re-instantiates consumed items from it during reset fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpawn {
    pub kind: ItemKind,
    pub tag: String,
    pub position: Vec2,
    pub live: Option<EntityId>,
}

/// Session-scoped count of live key items. Owned by the floor controller;
/// item creation and destruction report here, and "collect all keys"
/// objectives read it.
#[derive(Debug, Default)]
pub struct KeyLedger {
    live: u32,
}

impl KeyLedger {
    pub fn note_spawned(&mut self) {
        self.live = self.live.saturating_add(1);
    }

    pub fn note_destroyed(&mut self) {
        self.live = self.live.saturating_sub(1);
    }

    pub fn live_count(&self) -> u32 {
        self.live
    }

    pub fn all_collected(&self) -> bool {
        self.live == 0
    }
}
