use crate::entity::EntityId;

/// A teleporter gate. `controlling_button` is written once during the
/// binding pass so the portal can answer "which button locks me" after a
/// reset; it is never cleared by resets.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalState {
    pub locked: bool,
    default_locked: bool,
    pub controlling_button: Option<EntityId>,
    pub link: Option<EntityId>,
}

impl PortalState {
    pub fn new(locked: bool) -> Self {
        Self {
            locked,
            default_locked: locked,
            controlling_button: None,
            link: None,
        }
    }

    pub fn default_locked(&self) -> bool {
        self.default_locked
    }

    pub fn reset_to_defaults(&mut self) {
        self.locked = self.default_locked;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardState {
    pub armed: bool,
    default_armed: bool,
}

impl HazardState {
    pub fn new(armed: bool) -> Self {
        Self {
            armed,
            default_armed: armed,
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.armed = self.default_armed;
    }
}

/// A block that can phase between solid and intangible. An intangible
/// phase block is unusable until a phase button solidifies it again.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    pub solid: bool,
    default_solid: bool,
}

impl PhaseState {
    pub fn new(solid: bool) -> Self {
        Self {
            solid,
            default_solid: solid,
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.solid = self.default_solid;
    }
}
