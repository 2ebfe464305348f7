use std::collections::HashSet;
use std::rc::Rc;

use crate::entity::{EntityCategory, EntityId};
use crate::floor::Floor;

/// A press callback. Subscribers hold a clone of the `Rc` as their removal
/// handle; removal matches by reference identity, never by value.
pub type ButtonListener = Rc<dyn Fn(&mut Floor, EntityId)>;

pub fn listener(callback: impl Fn(&mut Floor, EntityId) + 'static) -> ButtonListener {
    Rc::new(callback)
}

/// Which category a button binds and which default policy its reset
/// fan-out re-applies to every bound target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    Goal,
    Hazard,
    Phase,
    Portal,
}

impl ButtonRole {
    pub fn bind_category(self) -> EntityCategory {
        match self {
            Self::Goal => EntityCategory::Goal,
            Self::Hazard => EntityCategory::Hazard,
            Self::Phase => EntityCategory::Phase,
            Self::Portal => EntityCategory::Portal,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Hazard => "hazard",
            Self::Phase => "phase",
            Self::Portal => "portal",
        }
    }
}

/// Button state machine. Binding is one-way and happens at most once per
/// floor lifetime; the lock toggle is independent of binding state.
pub struct Button {
    role: ButtonRole,
    valid_trigger_tags: HashSet<String>,
    locked: bool,
    default_locked: bool,
    bound: bool,
    bound_targets: Vec<EntityId>,
    listeners: Vec<ButtonListener>,
}

impl Button {
    pub fn new(role: ButtonRole, locked: bool, valid_trigger_tags: HashSet<String>) -> Self {
        Self {
            role,
            valid_trigger_tags,
            locked,
            default_locked: locked,
            bound: false,
            bound_targets: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn role(&self) -> ButtonRole {
        self.role
    }

    /// True iff the tag filter is empty or contains `tag`. Pure and
    /// evaluated fresh on every trigger and interact event.
    pub fn is_tag_valid(&self, tag: &str) -> bool {
        self.valid_trigger_tags.is_empty() || self.valid_trigger_tags.contains(tag)
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.set_locked(true);
    }

    pub fn unlock(&mut self) {
        self.set_locked(false);
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Records the discovered targets. Guarded: a second call never
    /// re-executes and never duplicates registrations.
    pub fn bind(&mut self, targets: Vec<EntityId>) -> bool {
        if self.bound {
            return false;
        }
        self.bound_targets = targets;
        self.bound = true;
        true
    }

    pub fn bound_targets(&self) -> &[EntityId] {
        &self.bound_targets
    }

    pub fn add_listener(&mut self, listener: ButtonListener) {
        self.listeners.push(listener);
    }

    /// Removes the first occurrence matching `handle` by reference
    /// identity. Removing an unregistered listener is a no-op.
    pub fn remove_listener(&mut self, handle: &ButtonListener) -> bool {
        let Some(index) = self
            .listeners
            .iter()
            .position(|candidate| Rc::ptr_eq(candidate, handle))
        else {
            return false;
        };
        self.listeners.remove(index);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Snapshot taken before dispatch so listeners may add or remove
    /// listeners without perturbing the in-flight invocation order.
    pub fn snapshot_listeners(&self) -> Vec<ButtonListener> {
        self.listeners.clone()
    }

    pub fn reset_to_defaults(&mut self) {
        self.locked = self.default_locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_tag_button() -> Button {
        Button::new(ButtonRole::Portal, false, HashSet::new())
    }

    fn player_only_button() -> Button {
        let mut tags = HashSet::new();
        tags.insert("PlayerTag".to_string());
        Button::new(ButtonRole::Portal, false, tags)
    }

    #[test]
    fn empty_tag_filter_matches_any_actor() {
        let button = any_tag_button();
        assert!(button.is_tag_valid("PlayerTag"));
        assert!(button.is_tag_valid("EnemyTag"));
        assert!(button.is_tag_valid(""));
    }

    #[test]
    fn tag_filter_matches_only_members() {
        let button = player_only_button();
        assert!(button.is_tag_valid("PlayerTag"));
        assert!(!button.is_tag_valid("EnemyTag"));
        assert!(!button.is_tag_valid(""));
    }

    #[test]
    fn lock_transitions_are_unvalidated_toggles() {
        let mut button = any_tag_button();
        assert!(!button.locked());
        button.lock();
        button.lock();
        assert!(button.locked());
        button.unlock();
        assert!(!button.locked());
        button.set_locked(true);
        assert!(button.locked());
    }

    #[test]
    fn bind_is_guarded_and_idempotent() {
        let mut button = any_tag_button();
        assert!(button.bind(vec![EntityId(1), EntityId(2)]));
        assert!(!button.bind(vec![EntityId(9)]));
        assert_eq!(button.bound_targets(), &[EntityId(1), EntityId(2)]);
    }

    #[test]
    fn remove_listener_matches_by_identity_and_removes_one_occurrence() {
        let mut button = any_tag_button();
        let first = listener(|_, _| {});
        let second = listener(|_, _| {});

        button.add_listener(first.clone());
        button.add_listener(second.clone());
        button.add_listener(first.clone());
        assert_eq!(button.listener_count(), 3);

        assert!(button.remove_listener(&first));
        assert_eq!(button.listener_count(), 2);
        assert!(button.remove_listener(&first));
        assert_eq!(button.listener_count(), 1);
        assert!(!button.remove_listener(&first));
    }

    #[test]
    fn removing_unregistered_listener_is_a_noop() {
        let mut button = any_tag_button();
        let registered = listener(|_, _| {});
        let stranger = listener(|_, _| {});
        button.add_listener(registered);

        assert!(!button.remove_listener(&stranger));
        assert_eq!(button.listener_count(), 1);
    }

    #[test]
    fn add_then_remove_restores_prior_listener_set() {
        let mut button = any_tag_button();
        let keeper = listener(|_, _| {});
        button.add_listener(keeper.clone());

        let transient = listener(|_, _| {});
        button.add_listener(transient.clone());
        assert!(button.remove_listener(&transient));

        assert_eq!(button.listener_count(), 1);
        assert!(Rc::ptr_eq(&button.snapshot_listeners()[0], &keeper));
    }

    #[test]
    fn reset_restores_configured_lock_state() {
        let mut tags = HashSet::new();
        tags.insert("PlayerTag".to_string());
        let mut button = Button::new(ButtonRole::Goal, true, tags);
        button.unlock();
        button.reset_to_defaults();
        assert!(button.locked());
    }
}
