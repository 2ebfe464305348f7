use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{HazardState, PhaseState, PortalState};
use crate::button::{listener, Button, ButtonRole};
use crate::entity::{EntityId, Vec2};
use crate::floor::Floor;
use crate::goal::ObjectiveKind;
use crate::item::ItemKind;

#[derive(Debug, Error)]
pub enum DefError {
    #[error("failed to read floor def '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse floor def json at {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate placement name '{name}'")]
    DuplicateName { name: String },
    #[error("portal '{portal}' links to unknown placement '{link}'")]
    UnknownLink { portal: String, link: String },
    #[error("portal '{portal}' links to non-portal placement '{link}'")]
    LinkNotPortal { portal: String, link: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDef {
    pub x: f32,
    pub y: f32,
}

impl PositionDef {
    fn to_vec2(self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDef {
    pub position: PositionDef,
    #[serde(default = "default_player_tag")]
    pub tag: String,
}

fn default_player_tag() -> String {
    "PlayerTag".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKindDef {
    ButtonGated,
    KeyGated,
    Free,
}

impl ObjectiveKindDef {
    fn to_objective_kind(self) -> ObjectiveKind {
        match self {
            Self::ButtonGated => ObjectiveKind::ButtonGated,
            Self::KeyGated => ObjectiveKind::KeyGated,
            Self::Free => ObjectiveKind::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKindDef {
    Plain,
    Key,
    Weapon,
}

impl ItemKindDef {
    fn to_item_kind(self) -> ItemKind {
        match self {
            Self::Plain => ItemKind::Plain,
            Self::Key => ItemKind::Key,
            Self::Weapon => ItemKind::Weapon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonRoleDef {
    Goal,
    Hazard,
    Phase,
    Portal,
}

impl ButtonRoleDef {
    fn to_button_role(self) -> ButtonRole {
        match self {
            Self::Goal => ButtonRole::Goal,
            Self::Hazard => ButtonRole::Hazard,
            Self::Phase => ButtonRole::Phase,
            Self::Portal => ButtonRole::Portal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKindDef {
    Block,
    Portal {
        #[serde(default = "default_true")]
        locked: bool,
        #[serde(default)]
        link: Option<String>,
    },
    Hazard {
        #[serde(default = "default_true")]
        armed: bool,
    },
    Phase {
        #[serde(default = "default_true")]
        solid: bool,
    },
    Goal {
        objective: ObjectiveKindDef,
    },
    Item {
        item: ItemKindDef,
    },
    Button {
        role: ButtonRoleDef,
        #[serde(default)]
        locked: bool,
        #[serde(default)]
        valid_tags: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDef {
    pub name: String,
    pub position: PositionDef,
    #[serde(default)]
    pub tag: String,
    pub kind: PlacementKindDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDef {
    pub name: String,
    #[serde(default)]
    pub player: Option<PlayerDef>,
    pub entities: Vec<PlacementDef>,
}

pub fn parse_floor_def(raw: &str) -> Result<FloorDef, DefError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, FloorDef>(&mut deserializer) {
        Ok(def) => Ok(def),
        Err(error) => {
            let path = error.path().to_string();
            let location = if path.is_empty() || path == "." {
                "document root".to_string()
            } else {
                path
            };
            Err(DefError::Parse {
                location,
                source: error.into_inner(),
            })
        }
    }
}

pub fn load_floor_def(path: &Path) -> Result<FloorDef, DefError> {
    let raw = fs::read_to_string(path).map_err(|source| DefError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_floor_def(&raw)
}

/// Wires the role's built-in press behavior as an ordinary listener:
/// portal buttons unlock, goal buttons enable, hazard buttons disarm,
/// phase buttons toggle solidity on every bound target.
pub fn install_default_press_behavior(floor: &mut Floor, button_id: EntityId) -> bool {
    let Some(button) = floor.button(button_id) else {
        return false;
    };
    let callback = match button.role() {
        ButtonRole::Portal => listener(move |floor: &mut Floor, _actor| {
            for target in floor.bound_targets(button_id) {
                floor.set_portal_locked(target, false);
            }
        }),
        ButtonRole::Goal => listener(move |floor: &mut Floor, _actor| {
            for target in floor.bound_targets(button_id) {
                floor.set_goal_usable(target, true);
            }
        }),
        ButtonRole::Hazard => listener(move |floor: &mut Floor, _actor| {
            for target in floor.bound_targets(button_id) {
                floor.set_hazard_armed(target, false);
            }
        }),
        ButtonRole::Phase => listener(move |floor: &mut Floor, _actor| {
            for target in floor.bound_targets(button_id) {
                floor.toggle_phase_solid(target);
            }
        }),
    };
    floor.add_listener(button_id, callback)
}

/// Builds a floor in Building phase from a definition; the caller runs
/// `activate_bindings` and `validate` afterwards.
pub fn build_floor(def: &FloorDef) -> Result<Floor, DefError> {
    let mut floor = Floor::new(def.name.clone());
    if let Some(player) = &def.player {
        let _ = floor.spawn_player(player.position.to_vec2(), player.tag.clone());
    }

    let mut ids_by_name: HashMap<String, EntityId> = HashMap::new();
    let mut portal_ids: HashSet<EntityId> = HashSet::new();
    let mut pending_links: Vec<(String, EntityId, String)> = Vec::new();

    for placement in &def.entities {
        if ids_by_name.contains_key(&placement.name) {
            return Err(DefError::DuplicateName {
                name: placement.name.clone(),
            });
        }
        let position = placement.position.to_vec2();
        let tag = placement.tag.clone();
        let spawned = match &placement.kind {
            PlacementKindDef::Block => floor.spawn_block(position, tag),
            PlacementKindDef::Portal { locked, link } => {
                let id = floor.spawn_portal(position, tag, PortalState::new(*locked));
                if let Some(id) = id {
                    portal_ids.insert(id);
                    if let Some(link) = link {
                        pending_links.push((placement.name.clone(), id, link.clone()));
                    }
                }
                id
            }
            PlacementKindDef::Hazard { armed } => {
                floor.spawn_hazard(position, tag, HazardState::new(*armed))
            }
            PlacementKindDef::Phase { solid } => {
                floor.spawn_phase_block(position, tag, PhaseState::new(*solid))
            }
            PlacementKindDef::Goal { objective } => {
                floor.spawn_goal(position, tag, objective.to_objective_kind())
            }
            PlacementKindDef::Item { item } => {
                floor.spawn_item(position, tag, item.to_item_kind())
            }
            PlacementKindDef::Button {
                role,
                locked,
                valid_tags,
            } => {
                let tags: HashSet<String> = valid_tags.iter().cloned().collect();
                let id = floor.spawn_button(
                    position,
                    tag,
                    Button::new(role.to_button_role(), *locked, tags),
                );
                if let Some(id) = id {
                    install_default_press_behavior(&mut floor, id);
                }
                id
            }
        };
        // The floor was created above and is still building, so placement
        // cannot be refused here.
        let Some(id) = spawned else { continue };
        ids_by_name.insert(placement.name.clone(), id);
    }

    for (portal_name, portal_id, link_name) in pending_links {
        let Some(link_id) = ids_by_name.get(&link_name).copied() else {
            return Err(DefError::UnknownLink {
                portal: portal_name,
                link: link_name,
            });
        };
        if !portal_ids.contains(&link_id) {
            return Err(DefError::LinkNotPortal {
                portal: portal_name,
                link: link_name,
            });
        }
        floor.set_portal_link(portal_id, link_id);
    }

    Ok(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityCategory;

    const SAMPLE_DEF: &str = r#"{
        "name": "sample",
        "player": { "position": { "x": 0.0, "y": 0.0 } },
        "entities": [
            { "name": "portal_in", "position": { "x": 1.0, "y": 0.0 }, "tag": "Portal",
              "kind": { "portal": { "locked": true, "link": "portal_out" } } },
            { "name": "portal_out", "position": { "x": 7.0, "y": 0.0 }, "tag": "Portal",
              "kind": { "portal": { "locked": true } } },
            { "name": "opener", "position": { "x": 2.0, "y": 2.0 }, "tag": "Button",
              "kind": { "button": { "role": "portal", "valid_tags": ["PlayerTag"] } } },
            { "name": "exit", "position": { "x": 9.0, "y": 0.0 }, "tag": "Goal",
              "kind": { "goal": { "objective": "key_gated" } } },
            { "name": "key", "position": { "x": 4.0, "y": 1.0 }, "tag": "Item",
              "kind": { "item": { "item": "key" } } }
        ]
    }"#;

    #[test]
    fn parse_reads_every_placement_kind() {
        let def = parse_floor_def(SAMPLE_DEF).expect("def");
        assert_eq!(def.name, "sample");
        assert_eq!(def.entities.len(), 5);
        assert_eq!(
            def.player.as_ref().expect("player").tag,
            "PlayerTag"
        );
        assert_eq!(
            def.entities[2].kind,
            PlacementKindDef::Button {
                role: ButtonRoleDef::Portal,
                locked: false,
                valid_tags: vec!["PlayerTag".to_string()],
            }
        );
    }

    #[test]
    fn parse_error_reports_the_offending_path() {
        let raw = r#"{ "name": "broken", "entities": [ { "name": "x",
            "position": { "x": "oops", "y": 0.0 }, "kind": "block" } ] }"#;
        let error = parse_floor_def(raw).expect_err("parse error");
        match error {
            DefError::Parse { location, .. } => {
                assert!(location.contains("entities"), "location: {location}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn build_floor_wires_default_press_behavior() {
        let def = parse_floor_def(SAMPLE_DEF).expect("def");
        let mut floor = build_floor(&def).expect("floor");
        floor.activate_bindings();
        floor.validate().expect("valid floor");

        let player = floor
            .world()
            .entities_in_category(EntityCategory::Player)[0];
        let buttons = floor
            .world()
            .entities_in_category(EntityCategory::Button)
            .to_vec();
        let portals = floor
            .world()
            .entities_in_category(EntityCategory::Portal)
            .to_vec();
        assert_eq!(floor.portal_locked(portals[0]), Some(true));

        floor.interact(buttons[0], player);
        assert_eq!(floor.portal_locked(portals[0]), Some(false));
        assert_eq!(floor.portal_locked(portals[1]), Some(false));

        // The linked portal carries the actor to its partner.
        floor.interact(portals[0], player);
        let carried = floor.world().find_entity(player).expect("player").position;
        assert_eq!(carried, Vec2 { x: 7.0, y: 0.0 });
    }

    #[test]
    fn hazard_and_phase_buttons_press_and_reset_per_role() {
        let raw = r#"{
            "name": "traps",
            "player": { "position": { "x": 0.0, "y": 0.0 } },
            "entities": [
                { "name": "spikes", "position": { "x": 3.0, "y": 0.0 }, "tag": "Hazard",
                  "kind": { "hazard": {} } },
                { "name": "breaker", "position": { "x": 3.0, "y": 1.0 }, "tag": "Button",
                  "kind": { "button": { "role": "hazard" } } },
                { "name": "bridge", "position": { "x": 5.0, "y": 0.0 }, "tag": "Phase",
                  "kind": { "phase": { "solid": false } } },
                { "name": "bridge_toggle", "position": { "x": 5.0, "y": 1.0 }, "tag": "Button",
                  "kind": { "button": { "role": "phase" } } }
            ]
        }"#;
        let def = parse_floor_def(raw).expect("def");
        let mut floor = build_floor(&def).expect("floor");
        floor.activate_bindings();
        floor.validate().expect("valid floor");

        let player = floor
            .world()
            .entities_in_category(EntityCategory::Player)[0];
        let buttons = floor
            .world()
            .entities_in_category(EntityCategory::Button)
            .to_vec();
        let spikes = floor
            .world()
            .entities_in_category(EntityCategory::Hazard)[0];
        let bridge = floor
            .world()
            .entities_in_category(EntityCategory::Phase)[0];

        assert_eq!(floor.hazard_armed(spikes), Some(true));
        floor.interact(buttons[0], player);
        assert_eq!(floor.hazard_armed(spikes), Some(false));

        assert_eq!(floor.phase_solid(bridge), Some(false));
        floor.interact(buttons[1], player);
        assert_eq!(floor.phase_solid(bridge), Some(true));
        floor.interact(buttons[1], player);
        assert_eq!(floor.phase_solid(bridge), Some(false));

        // Reset fan-out re-arms the hazard and re-solidifies the bridge,
        // overriding the bridge's configured intangible default.
        floor.reset_floor();
        assert_eq!(floor.hazard_armed(spikes), Some(true));
        assert_eq!(floor.phase_solid(bridge), Some(true));
    }

    #[test]
    fn build_floor_rejects_duplicate_names_and_bad_links() {
        let duplicate = FloorDef {
            name: "dup".to_string(),
            player: None,
            entities: vec![
                PlacementDef {
                    name: "twin".to_string(),
                    position: PositionDef { x: 0.0, y: 0.0 },
                    tag: String::new(),
                    kind: PlacementKindDef::Block,
                },
                PlacementDef {
                    name: "twin".to_string(),
                    position: PositionDef { x: 1.0, y: 0.0 },
                    tag: String::new(),
                    kind: PlacementKindDef::Block,
                },
            ],
        };
        assert!(matches!(
            build_floor(&duplicate),
            Err(DefError::DuplicateName { .. })
        ));

        let dangling = FloorDef {
            name: "dangling".to_string(),
            player: None,
            entities: vec![PlacementDef {
                name: "portal".to_string(),
                position: PositionDef { x: 0.0, y: 0.0 },
                tag: String::new(),
                kind: PlacementKindDef::Portal {
                    locked: false,
                    link: Some("nowhere".to_string()),
                },
            }],
        };
        assert!(matches!(
            build_floor(&dangling),
            Err(DefError::UnknownLink { .. })
        ));

        let miswired = FloorDef {
            name: "miswired".to_string(),
            player: None,
            entities: vec![
                PlacementDef {
                    name: "portal".to_string(),
                    position: PositionDef { x: 0.0, y: 0.0 },
                    tag: String::new(),
                    kind: PlacementKindDef::Portal {
                        locked: false,
                        link: Some("wall".to_string()),
                    },
                },
                PlacementDef {
                    name: "wall".to_string(),
                    position: PositionDef { x: 1.0, y: 0.0 },
                    tag: String::new(),
                    kind: PlacementKindDef::Block,
                },
            ],
        };
        assert!(matches!(
            build_floor(&miswired),
            Err(DefError::LinkNotPortal { .. })
        ));
    }

    #[test]
    fn load_floor_def_reads_from_disk_and_reports_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.floor.json");
        fs::write(&path, SAMPLE_DEF).expect("write def");

        let def = load_floor_def(&path).expect("def");
        assert_eq!(def.name, "sample");

        let missing = dir.path().join("missing.floor.json");
        assert!(matches!(
            load_floor_def(&missing),
            Err(DefError::Io { .. })
        ));
    }
}
