//! Resolution events emitted while forwarding, for sound and UI cues.

use protocol::EntityId;
use serde::{Deserialize, Serialize};

/// Something that happened during collision resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolutionEvent {
    /// `entity` reversed direction off `other`.
    Bounced { entity: EntityId, other: EntityId },
    Consumed { winner: EntityId, loser: EntityId },
    /// `entity` ate a power pellet.
    PoweredUp { entity: EntityId },
    Spawned { entity: EntityId, line_id: u32 },
}

impl ResolutionEvent {
    /// True if `player` is a participant.
    pub fn involves(&self, player: &EntityId) -> bool {
        match self {
            Self::Bounced { entity, other } => entity == player || other == player,
            Self::Consumed { winner, loser } => winner == player || loser == player,
            Self::PoweredUp { entity } | Self::Spawned { entity, .. } => entity == player,
        }
    }
}

/// Where resolution events go during a forward pass.
#[derive(Debug, Default)]
pub struct EventSink {
    enabled: bool,
    focus: Option<EntityId>,
    events: Vec<ResolutionEvent>,
}

impl EventSink {
    pub fn new(enabled: bool, focus: Option<EntityId>) -> Self {
        Self {
            enabled,
            focus,
            events: Vec::new(),
        }
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: ResolutionEvent) {
        if !self.enabled {
            return;
        }
        if let Some(focus) = &self.focus {
            if !event.involves(focus) {
                return;
            }
        }
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<ResolutionEvent> {
        self.events
    }
}
