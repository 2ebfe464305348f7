use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::button::{Button, ButtonListener, ButtonRole};
use crate::entity::{EntityCategory, EntityId, EntityState, FloorWorld, Vec2};
use crate::events::{FloorEvent, FloorEventBus, FloorEventCounts};
use crate::goal::ObjectiveKind;
use crate::item::{ItemKind, ItemSpawn, ItemState, KeyLedger};

const CUE_BUTTON_HOVER: &str = "button_hover";
const CUE_BUTTON_SETTLE: &str = "button_settle";
const CUE_BUTTON_PRESS: &str = "button_press";
const CUE_ITEM_PICKUP: &str = "item_pickup";
const CUE_GOAL_OPEN: &str = "goal_open";
const CUE_GOAL_LOCKED: &str = "goal_locked";
const CUE_HAZARD_STRIKE: &str = "hazard_strike";
const CUE_PORTAL_WARP: &str = "portal_warp";
const CUE_KEYS_COMPLETE: &str = "keys_complete";

/// One-way lifecycle: every entity is placed while Building; the single
/// binding pass transitions to Active. Interactions, trigger events, and
/// resets are no-ops until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorPhase {
    Building,
    Active,
}

#[derive(Debug, Error)]
pub enum FloorConfigError {
    #[error("floor is still building; activate_bindings must run before validate")]
    NotActivated,
    #[error("button-gated goal {goal:?} has no goal button bound to it")]
    ButtonGatedGoalUnbound { goal: EntityId },
    #[error("floor has {count} player entities, expected at most one")]
    MultiplePlayers { count: usize },
    #[error("weapon item placed on a floor with no player")]
    WeaponWithoutPlayer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub entity: EntityId,
    pub attack_enabled: bool,
    inventory: Vec<ItemKind>,
}

impl PlayerState {
    fn new(entity: EntityId) -> Self {
        Self {
            entity,
            attack_enabled: true,
            inventory: Vec::new(),
        }
    }

    pub fn inventory(&self) -> &[ItemKind] {
        &self.inventory
    }

    pub fn holds(&self, kind: ItemKind) -> bool {
        self.inventory.contains(&kind)
    }

    fn give_item(&mut self, kind: ItemKind) {
        self.inventory.push(kind);
    }
}

/// The floor controller: entity registry, button machines, player session
/// state, key ledger, and the reset fan-out. The embedder feeds it trigger
/// and interact events and drains its event bus once per tick.
pub struct Floor {
    name: String,
    phase: FloorPhase,
    world: FloorWorld,
    buttons: BTreeMap<EntityId, Button>,
    player: Option<PlayerState>,
    key_ledger: KeyLedger,
    item_spawns: Vec<ItemSpawn>,
    events: FloorEventBus,
}

impl Floor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: FloorPhase::Building,
            world: FloorWorld::default(),
            buttons: BTreeMap::new(),
            player: None,
            key_ledger: KeyLedger::default(),
            item_spawns: Vec::new(),
            events: FloorEventBus::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> FloorPhase {
        self.phase
    }

    pub fn world(&self) -> &FloorWorld {
        &self.world
    }

    pub fn key_item_count(&self) -> u32 {
        self.key_ledger.live_count()
    }

    pub fn player(&self) -> Option<&PlayerState> {
        self.player.as_ref()
    }

    pub fn events(&self) -> &[FloorEvent] {
        self.events.pending()
    }

    pub fn take_events(&mut self) -> Vec<FloorEvent> {
        self.events.take_pending()
    }

    pub fn event_counts(&self) -> FloorEventCounts {
        self.events.counts()
    }

    // ----- placement -----

    /// Placement is a Building-phase operation: an entity spawned after
    /// activation would never be bound, so late spawns are refused.
    fn placement_guard(&self) -> Option<()> {
        if self.phase == FloorPhase::Building {
            Some(())
        } else {
            debug!(floor = self.name, "spawn after activation ignored");
            None
        }
    }

    pub fn spawn_block(&mut self, position: Vec2, tag: impl Into<String>) -> Option<EntityId> {
        self.placement_guard()?;
        Some(self.world.spawn(position, tag, EntityState::Block))
    }

    pub fn spawn_portal(
        &mut self,
        position: Vec2,
        tag: impl Into<String>,
        state: crate::block::PortalState,
    ) -> Option<EntityId> {
        self.placement_guard()?;
        Some(self.world.spawn(position, tag, EntityState::Portal(state)))
    }

    pub fn spawn_hazard(
        &mut self,
        position: Vec2,
        tag: impl Into<String>,
        state: crate::block::HazardState,
    ) -> Option<EntityId> {
        self.placement_guard()?;
        Some(self.world.spawn(position, tag, EntityState::Hazard(state)))
    }

    pub fn spawn_phase_block(
        &mut self,
        position: Vec2,
        tag: impl Into<String>,
        state: crate::block::PhaseState,
    ) -> Option<EntityId> {
        self.placement_guard()?;
        Some(self.world.spawn(position, tag, EntityState::Phase(state)))
    }

    pub fn spawn_goal(
        &mut self,
        position: Vec2,
        tag: impl Into<String>,
        objective: ObjectiveKind,
    ) -> Option<EntityId> {
        self.placement_guard()?;
        Some(self.world.spawn(
            position,
            tag,
            EntityState::Goal(crate::goal::GoalState::new(objective)),
        ))
    }

    pub fn spawn_item(
        &mut self,
        position: Vec2,
        tag: impl Into<String>,
        kind: ItemKind,
    ) -> Option<EntityId> {
        self.placement_guard()?;
        let tag = tag.into();
        let id = self
            .world
            .spawn(position, tag.clone(), EntityState::Item(ItemState::new(kind)));
        if kind == ItemKind::Key {
            self.key_ledger.note_spawned();
        }
        self.item_spawns.push(ItemSpawn {
            kind,
            tag,
            position,
            live: Some(id),
        });
        Some(id)
    }

    pub fn spawn_button(
        &mut self,
        position: Vec2,
        tag: impl Into<String>,
        button: Button,
    ) -> Option<EntityId> {
        self.placement_guard()?;
        let id = self.world.spawn(position, tag, EntityState::Button);
        self.buttons.insert(id, button);
        Some(id)
    }

    pub fn spawn_player(&mut self, position: Vec2, tag: impl Into<String>) -> Option<EntityId> {
        self.placement_guard()?;
        let id = self.world.spawn(position, tag, EntityState::Player);
        if self.player.is_none() {
            self.player = Some(PlayerState::new(id));
        }
        Some(id)
    }

    // ----- binding -----

    /// One-time discovery pass. Every button looks up the live entities of
    /// its role's category through the registry index, records them as
    /// bound targets in spawn order, and registers itself on each target
    /// that wants to know its controlling button. Guarded: a second call
    /// never re-scans and never duplicates registrations.
    pub fn activate_bindings(&mut self) {
        if self.phase != FloorPhase::Building {
            debug!(floor = self.name, "activate_bindings ignored, already active");
            return;
        }

        let button_ids: Vec<(EntityId, ButtonRole)> = self
            .buttons
            .iter()
            .map(|(id, button)| (*id, button.role()))
            .collect();
        for (button_id, role) in button_ids {
            let targets = self
                .world
                .entities_in_category(role.bind_category())
                .to_vec();
            if targets.is_empty() {
                warn!(
                    floor = self.name,
                    button = button_id.0,
                    role = role.as_token(),
                    "button bound zero targets"
                );
            }
            for target in &targets {
                let Some(entity) = self.world.find_entity_mut(*target) else {
                    continue;
                };
                match entity.state_mut() {
                    EntityState::Portal(portal) => {
                        if portal.controlling_button.is_none() {
                            portal.controlling_button = Some(button_id);
                        }
                    }
                    EntityState::Goal(goal) => goal.gating_buttons.push(button_id),
                    _ => {}
                }
            }
            if let Some(button) = self.buttons.get_mut(&button_id) {
                button.bind(targets);
            }
        }

        // Session invariants hold from activation onward.
        if self.weapon_item_present() {
            if let Some(player) = &mut self.player {
                player.attack_enabled = false;
            }
        }
        if self.key_ledger.all_collected() {
            self.set_key_gated_goals_usable(true);
        }

        self.phase = FloorPhase::Active;
        info!(
            floor = self.name,
            entities = self.world.entity_count(),
            buttons = self.buttons.len(),
            "floor bindings activated"
        );
    }

    /// Scene-validation pass for fatal configuration errors. Runtime
    /// invalid interactions stay silent no-ops; only wiring that can never
    /// work is surfaced here.
    pub fn validate(&self) -> Result<(), FloorConfigError> {
        if self.phase != FloorPhase::Active {
            return Err(FloorConfigError::NotActivated);
        }
        let player_count = self
            .world
            .entities_in_category(EntityCategory::Player)
            .len();
        if player_count > 1 {
            return Err(FloorConfigError::MultiplePlayers {
                count: player_count,
            });
        }
        if self.weapon_item_present() && self.player.is_none() {
            return Err(FloorConfigError::WeaponWithoutPlayer);
        }
        for entity in self.world.entities() {
            if let EntityState::Goal(goal) = entity.state() {
                if goal.objective == ObjectiveKind::ButtonGated && goal.gating_buttons.is_empty() {
                    return Err(FloorConfigError::ButtonGatedGoalUnbound { goal: entity.id });
                }
            }
        }
        Ok(())
    }

    // ----- button access -----

    pub fn button(&self, id: EntityId) -> Option<&Button> {
        self.buttons.get(&id)
    }

    pub fn button_mut(&mut self, id: EntityId) -> Option<&mut Button> {
        self.buttons.get_mut(&id)
    }

    pub fn bound_targets(&self, button: EntityId) -> Vec<EntityId> {
        self.buttons
            .get(&button)
            .map(|button| button.bound_targets().to_vec())
            .unwrap_or_default()
    }

    pub fn add_listener(&mut self, button: EntityId, listener: ButtonListener) -> bool {
        let Some(button) = self.buttons.get_mut(&button) else {
            return false;
        };
        button.add_listener(listener);
        true
    }

    pub fn remove_listener(&mut self, button: EntityId, handle: &ButtonListener) -> bool {
        self.buttons
            .get_mut(&button)
            .is_some_and(|button| button.remove_listener(handle))
    }

    // ----- targeted mutators, used by press listeners and the embedder -----

    pub fn set_portal_locked(&mut self, portal: EntityId, locked: bool) {
        if let Some(EntityState::Portal(state)) = self.state_mut(portal) {
            state.locked = locked;
        }
    }

    pub fn set_portal_link(&mut self, portal: EntityId, link: EntityId) {
        if let Some(EntityState::Portal(state)) = self.state_mut(portal) {
            state.link = Some(link);
        }
    }

    pub fn set_goal_usable(&mut self, goal: EntityId, usable: bool) {
        if let Some(EntityState::Goal(state)) = self.state_mut(goal) {
            state.set_usable(usable);
        }
    }

    pub fn set_hazard_armed(&mut self, hazard: EntityId, armed: bool) {
        if let Some(EntityState::Hazard(state)) = self.state_mut(hazard) {
            state.armed = armed;
        }
    }

    pub fn set_phase_solid(&mut self, phase: EntityId, solid: bool) {
        if let Some(EntityState::Phase(state)) = self.state_mut(phase) {
            state.solid = solid;
        }
    }

    pub fn toggle_phase_solid(&mut self, phase: EntityId) {
        if let Some(EntityState::Phase(state)) = self.state_mut(phase) {
            state.solid = !state.solid;
        }
    }

    pub fn portal_locked(&self, portal: EntityId) -> Option<bool> {
        match self.state(portal)? {
            EntityState::Portal(state) => Some(state.locked),
            _ => None,
        }
    }

    pub fn goal_usable(&self, goal: EntityId) -> Option<bool> {
        match self.state(goal)? {
            EntityState::Goal(state) => Some(state.usable),
            _ => None,
        }
    }

    pub fn hazard_armed(&self, hazard: EntityId) -> Option<bool> {
        match self.state(hazard)? {
            EntityState::Hazard(state) => Some(state.armed),
            _ => None,
        }
    }

    pub fn phase_solid(&self, phase: EntityId) -> Option<bool> {
        match self.state(phase)? {
            EntityState::Phase(state) => Some(state.solid),
            _ => None,
        }
    }

    // ----- trigger-volume seam -----

    /// Presentational only: hover cue when a valid actor overlaps the
    /// button's trigger volume. Never touches lock state or listeners.
    pub fn trigger_enter(&mut self, button: EntityId, actor: EntityId) {
        self.trigger_cue(button, actor, CUE_BUTTON_HOVER);
    }

    pub fn trigger_exit(&mut self, button: EntityId, actor: EntityId) {
        self.trigger_cue(button, actor, CUE_BUTTON_SETTLE);
    }

    fn trigger_cue(&mut self, button_id: EntityId, actor: EntityId, cue: &'static str) {
        if self.phase != FloorPhase::Active {
            debug!(floor = self.name, "trigger event before activation ignored");
            return;
        }
        let Some(actor_tag) = self.world.find_entity(actor).map(|entity| entity.tag.clone())
        else {
            return;
        };
        let Some(button) = self.buttons.get(&button_id) else {
            return;
        };
        if button.is_tag_valid(&actor_tag) {
            self.events.emit(FloorEvent::CueRequested {
                entity: button_id,
                cue,
            });
        }
    }

    // ----- interaction dispatch -----

    /// Entry point for the external trigger detector: `actor` touched
    /// `target`. Usability is checked here, once, before dispatch; the
    /// per-category handlers rely on that and do not re-check.
    pub fn interact(&mut self, target: EntityId, actor: EntityId) {
        if self.phase != FloorPhase::Active {
            debug!(floor = self.name, "interaction before activation ignored");
            return;
        }
        let Some(actor_entity) = self.world.find_entity(actor) else {
            return;
        };
        let actor_tag = actor_entity.tag.clone();
        let actor_is_player = actor_entity.category() == EntityCategory::Player;
        let Some(target_entity) = self.world.find_entity(target) else {
            return;
        };
        if !target_entity.usable_block() {
            debug!(
                floor = self.name,
                target = target.0,
                "interaction with unusable block ignored"
            );
            return;
        }

        match target_entity.category() {
            EntityCategory::Button => self.interact_button(target, actor, &actor_tag),
            EntityCategory::Item => self.interact_item(target, actor, actor_is_player),
            EntityCategory::Goal => {
                if actor_is_player {
                    let _ = self.try_enter_goal(target, actor);
                }
            }
            EntityCategory::Hazard => self.interact_hazard(target, actor, actor_is_player),
            EntityCategory::Portal => self.interact_portal(target, actor),
            EntityCategory::Block | EntityCategory::Phase | EntityCategory::Player => {}
        }
    }

    fn interact_button(&mut self, button_id: EntityId, actor: EntityId, actor_tag: &str) {
        let Some(button) = self.buttons.get(&button_id) else {
            return;
        };
        // Locked buttons swallow the interaction silently: no event, no
        // error. "Locked" is a gameplay state, not a fault.
        if button.locked() {
            return;
        }
        if !button.is_tag_valid(actor_tag) {
            return;
        }
        let snapshot = button.snapshot_listeners();

        self.events.emit(FloorEvent::CueRequested {
            entity: button_id,
            cue: CUE_BUTTON_PRESS,
        });
        self.events.emit(FloorEvent::ButtonPressed {
            button: button_id,
            actor,
        });
        for listener in snapshot {
            listener(self, actor);
        }
    }

    fn interact_item(&mut self, item_id: EntityId, actor: EntityId, actor_is_player: bool) {
        if !actor_is_player {
            return;
        }
        let Some(EntityState::Item(item)) = self.state(item_id) else {
            return;
        };
        let kind = item.kind;

        self.events.emit(FloorEvent::CueRequested {
            entity: item_id,
            cue: CUE_ITEM_PICKUP,
        });
        self.events.emit(FloorEvent::ItemCollected {
            item: item_id,
            kind,
            player: actor,
        });
        self.world.despawn(item_id);
        if let Some(spawn) = self
            .item_spawns
            .iter_mut()
            .find(|spawn| spawn.live == Some(item_id))
        {
            spawn.live = None;
        }

        if let Some(player) = &mut self.player {
            player.give_item(kind);
            if kind == ItemKind::Weapon {
                player.attack_enabled = true;
            }
        }
        if kind == ItemKind::Key {
            self.key_ledger.note_destroyed();
            if self.key_ledger.all_collected() {
                self.set_key_gated_goals_usable(true);
                self.events.emit(FloorEvent::CueRequested {
                    entity: item_id,
                    cue: CUE_KEYS_COMPLETE,
                });
            }
        }
    }

    fn interact_hazard(&mut self, hazard_id: EntityId, actor: EntityId, actor_is_player: bool) {
        if !actor_is_player {
            return;
        }
        let Some(EntityState::Hazard(hazard)) = self.state(hazard_id) else {
            return;
        };
        if !hazard.armed {
            return;
        }
        self.events.emit(FloorEvent::CueRequested {
            entity: hazard_id,
            cue: CUE_HAZARD_STRIKE,
        });
        self.events.emit(FloorEvent::PlayerDied {
            player: actor,
            hazard: hazard_id,
        });
    }

    fn interact_portal(&mut self, portal_id: EntityId, actor: EntityId) {
        let Some(EntityState::Portal(portal)) = self.state(portal_id) else {
            return;
        };
        let Some(link) = portal.link else {
            return;
        };
        let Some(destination) = self.world.find_entity(link).map(|entity| entity.position)
        else {
            return;
        };
        if let Some(actor_entity) = self.world.find_entity_mut(actor) {
            actor_entity.position = destination;
        }
        self.events.emit(FloorEvent::CueRequested {
            entity: portal_id,
            cue: CUE_PORTAL_WARP,
        });
        self.events.emit(FloorEvent::PortalTraversed {
            portal: portal_id,
            actor,
        });
    }

    /// Fresh evaluation of the goal's usable flag on every attempt;
    /// nothing is cached, since cooperating buttons may toggle it at any
    /// time.
    pub fn try_enter_goal(&mut self, goal_id: EntityId, player: EntityId) -> bool {
        if self.phase != FloorPhase::Active {
            return false;
        }
        let Some(EntityState::Goal(goal)) = self.state(goal_id) else {
            return false;
        };
        if goal.usable {
            self.events.emit(FloorEvent::CueRequested {
                entity: goal_id,
                cue: CUE_GOAL_OPEN,
            });
            self.events.emit(FloorEvent::GoalEntered {
                goal: goal_id,
                player,
            });
            self.events.emit(FloorEvent::FloorCompleted { goal: goal_id });
            true
        } else {
            self.events.emit(FloorEvent::CueRequested {
                entity: goal_id,
                cue: CUE_GOAL_LOCKED,
            });
            self.events.emit(FloorEvent::GoalRejected {
                goal: goal_id,
                player,
            });
            false
        }
    }

    // ----- reset protocol -----

    /// Floor-wide reset fan-out. Safe to call any number of times; every
    /// pass re-applies a default, so repetition is a no-op. Binding state
    /// is untouched: discovery is per floor lifetime, not per reset.
    pub fn reset_floor(&mut self) {
        if self.phase != FloorPhase::Active {
            warn!(floor = self.name, "reset before activation ignored");
            return;
        }

        // Pass 1: every entity back to its configured defaults, in spawn
        // order. Buttons re-apply their configured lock state too.
        for id in self.world.live_entity_ids() {
            if let Some(entity) = self.world.find_entity_mut(id) {
                entity.reset_asset();
                entity.state_mut().reset_to_defaults();
            }
        }
        for button in self.buttons.values_mut() {
            button.reset_to_defaults();
        }

        // Pass 2: button fan-out re-applies each role's default policy to
        // every bound target, regardless of the target's prior state.
        let fanouts: Vec<(ButtonRole, Vec<EntityId>)> = self
            .buttons
            .values()
            .map(|button| (button.role(), button.bound_targets().to_vec()))
            .collect();
        for (role, targets) in fanouts {
            for target in targets {
                let Some(entity) = self.world.find_entity_mut(target) else {
                    continue;
                };
                match (role, entity.state_mut()) {
                    (ButtonRole::Goal, EntityState::Goal(goal)) => goal.set_usable(false),
                    (ButtonRole::Portal, EntityState::Portal(portal)) => portal.locked = true,
                    (ButtonRole::Hazard, EntityState::Hazard(hazard)) => hazard.armed = true,
                    (ButtonRole::Phase, EntityState::Phase(phase)) => phase.solid = true,
                    _ => {}
                }
            }
        }

        // Pass 3: re-instantiate consumed items from their spawn records.
        for index in 0..self.item_spawns.len() {
            if self.item_spawns[index].live.is_some() {
                continue;
            }
            let (kind, tag, position) = {
                let spawn = &self.item_spawns[index];
                (spawn.kind, spawn.tag.clone(), spawn.position)
            };
            let id = self
                .world
                .spawn(position, tag, EntityState::Item(ItemState::new(kind)));
            if kind == ItemKind::Key {
                self.key_ledger.note_spawned();
            }
            self.item_spawns[index].live = Some(id);
        }

        // Pass 4: session state derived from the restored floor.
        let weapon_present = self.weapon_item_present();
        if let Some(player) = &mut self.player {
            player.inventory.clear();
            player.attack_enabled = !weapon_present;
        }
        let all_keys_collected = self.key_ledger.all_collected();
        self.set_key_gated_goals_usable(all_keys_collected);

        self.events.emit(FloorEvent::FloorWasReset);
        info!(floor = self.name, "floor reset");
    }

    // ----- helpers -----

    fn state(&self, id: EntityId) -> Option<&EntityState> {
        self.world.find_entity(id).map(|entity| entity.state())
    }

    fn state_mut(&mut self, id: EntityId) -> Option<&mut EntityState> {
        self.world.find_entity_mut(id).map(|entity| entity.state_mut())
    }

    fn weapon_item_present(&self) -> bool {
        self.item_spawns
            .iter()
            .any(|spawn| spawn.kind == ItemKind::Weapon && spawn.live.is_some())
    }

    fn set_key_gated_goals_usable(&mut self, usable: bool) {
        let goal_ids = self
            .world
            .entities_in_category(EntityCategory::Goal)
            .to_vec();
        for goal_id in goal_ids {
            if let Some(EntityState::Goal(goal)) = self.state_mut(goal_id) {
                if goal.objective == ObjectiveKind::KeyGated {
                    goal.set_usable(usable);
                }
            }
        }
    }
}
