use crate::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// Usable only after a cooperating goal button enables it.
    ButtonGated,
    /// Usable once every key item on the floor has been collected.
    KeyGated,
    /// Always usable.
    Free,
}

impl ObjectiveKind {
    pub fn default_usable(self) -> bool {
        matches!(self, Self::Free)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::ButtonGated => "button_gated",
            Self::KeyGated => "key_gated",
            Self::Free => "free",
        }
    }
}

/// Terminal entity a player attempts to enter. `gating_buttons` is filled
/// once during the binding pass and survives resets; `usable` is the only
/// field interactions and resets toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalState {
    pub objective: ObjectiveKind,
    pub usable: bool,
    pub gating_buttons: Vec<EntityId>,
}

impl GoalState {
    pub fn new(objective: ObjectiveKind) -> Self {
        Self {
            objective,
            usable: objective.default_usable(),
            gating_buttons: Vec::new(),
        }
    }

    pub fn set_usable(&mut self, usable: bool) {
        self.usable = usable;
    }

    pub fn reset_to_defaults(&mut self) {
        self.usable = self.objective.default_usable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_free_goals_start_usable() {
        assert!(GoalState::new(ObjectiveKind::Free).usable);
        assert!(!GoalState::new(ObjectiveKind::ButtonGated).usable);
        assert!(!GoalState::new(ObjectiveKind::KeyGated).usable);
    }

    #[test]
    fn reset_re_gates_but_keeps_binding_registrations() {
        let mut goal = GoalState::new(ObjectiveKind::ButtonGated);
        goal.gating_buttons.push(EntityId(4));
        goal.set_usable(true);

        goal.reset_to_defaults();
        assert!(!goal.usable);
        assert_eq!(goal.gating_buttons, vec![EntityId(4)]);
    }
}
