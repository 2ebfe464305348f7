pub mod block;
pub mod button;
pub mod defs;
pub mod entity;
pub mod events;
pub mod floor;
pub mod goal;
pub mod item;

pub use block::{HazardState, PhaseState, PortalState};
pub use button::{listener, Button, ButtonListener, ButtonRole};
pub use defs::{
    build_floor, install_default_press_behavior, load_floor_def, parse_floor_def, DefError,
    FloorDef, PlacementDef, PlacementKindDef,
};
pub use entity::{Entity, EntityCategory, EntityId, EntityState, FloorWorld, Vec2};
pub use events::{FloorEvent, FloorEventBus, FloorEventCounts, FloorEventKind};
pub use floor::{Floor, FloorConfigError, FloorPhase, PlayerState};
pub use goal::{GoalState, ObjectiveKind};
pub use item::{ItemKind, ItemSpawn, ItemState, KeyLedger};
