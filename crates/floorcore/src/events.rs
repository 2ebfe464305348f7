use crate::entity::EntityId;
use crate::item::ItemKind;

/// Outcomes the floor surfaces to its embedder. Cue requests are the
/// fire-and-forget seam toward the animation/audio collaborator; the
/// embedder drains the bus once per tick and plays whatever it finds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorEvent {
    CueRequested {
        entity: EntityId,
        cue: &'static str,
    },
    ButtonPressed {
        button: EntityId,
        actor: EntityId,
    },
    GoalEntered {
        goal: EntityId,
        player: EntityId,
    },
    GoalRejected {
        goal: EntityId,
        player: EntityId,
    },
    ItemCollected {
        item: EntityId,
        kind: ItemKind,
        player: EntityId,
    },
    PortalTraversed {
        portal: EntityId,
        actor: EntityId,
    },
    PlayerDied {
        player: EntityId,
        hazard: EntityId,
    },
    FloorCompleted {
        goal: EntityId,
    },
    FloorWasReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorEventKind {
    CueRequested,
    ButtonPressed,
    GoalEntered,
    GoalRejected,
    ItemCollected,
    PortalTraversed,
    PlayerDied,
    FloorCompleted,
    FloorWasReset,
}

impl FloorEvent {
    pub fn kind(&self) -> FloorEventKind {
        match self {
            Self::CueRequested { .. } => FloorEventKind::CueRequested,
            Self::ButtonPressed { .. } => FloorEventKind::ButtonPressed,
            Self::GoalEntered { .. } => FloorEventKind::GoalEntered,
            Self::GoalRejected { .. } => FloorEventKind::GoalRejected,
            Self::ItemCollected { .. } => FloorEventKind::ItemCollected,
            Self::PortalTraversed { .. } => FloorEventKind::PortalTraversed,
            Self::PlayerDied { .. } => FloorEventKind::PlayerDied,
            Self::FloorCompleted { .. } => FloorEventKind::FloorCompleted,
            Self::FloorWasReset => FloorEventKind::FloorWasReset,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloorEventCounts {
    pub total: u32,
    pub cue_requested: u32,
    pub button_pressed: u32,
    pub goal_entered: u32,
    pub goal_rejected: u32,
    pub item_collected: u32,
    pub portal_traversed: u32,
    pub player_died: u32,
    pub floor_completed: u32,
    pub floor_was_reset: u32,
}

impl FloorEventCounts {
    fn record(&mut self, kind: FloorEventKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            FloorEventKind::CueRequested => {
                self.cue_requested = self.cue_requested.saturating_add(1)
            }
            FloorEventKind::ButtonPressed => {
                self.button_pressed = self.button_pressed.saturating_add(1)
            }
            FloorEventKind::GoalEntered => self.goal_entered = self.goal_entered.saturating_add(1),
            FloorEventKind::GoalRejected => {
                self.goal_rejected = self.goal_rejected.saturating_add(1)
            }
            FloorEventKind::ItemCollected => {
                self.item_collected = self.item_collected.saturating_add(1)
            }
            FloorEventKind::PortalTraversed => {
                self.portal_traversed = self.portal_traversed.saturating_add(1)
            }
            FloorEventKind::PlayerDied => self.player_died = self.player_died.saturating_add(1),
            FloorEventKind::FloorCompleted => {
                self.floor_completed = self.floor_completed.saturating_add(1)
            }
            FloorEventKind::FloorWasReset => {
                self.floor_was_reset = self.floor_was_reset.saturating_add(1)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct FloorEventBus {
    pending: Vec<FloorEvent>,
    counts: FloorEventCounts,
}

impl FloorEventBus {
    pub fn emit(&mut self, event: FloorEvent) {
        self.counts.record(event.kind());
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[FloorEvent] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<FloorEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn counts(&self) -> FloorEventCounts {
        self.counts
    }
}
