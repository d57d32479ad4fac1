//! Scene lifecycle: Provisional → Active → Completed, or Active → Expired.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::scene::Scene;

/// Lifecycle state of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneState {
    /// Built as a preview; not yet committed.
    Provisional,
    /// Offered to the player.
    Active,
    /// Resolved through its situations.
    Completed,
    /// Left unresolved past its expiration day.
    Expired,
}

impl SceneState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_transition_to(self, to: SceneState) -> bool {
        matches!(
            (self, to),
            (Self::Provisional, Self::Active)
                | (Self::Active, Self::Completed)
                | (Self::Active, Self::Expired)
        )
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional => write!(f, "provisional"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl Scene {
    /// Move the scene to a new state. Terminal states clear the current
    /// situation so nothing remains selectable.
    pub fn transition(&mut self, to: SceneState) -> Result<(), LifecycleError> {
        if !self.state.can_transition_to(to) {
            return Err(LifecycleError::InvalidTransition {
                scene: self.id,
                from: self.state,
                to,
            });
        }
        tracing::info!(
            target: "loomwright::lifecycle",
            scene = %self.id,
            template = %self.template_id,
            from = %self.state,
            to = %to,
            "scene.transition"
        );
        self.state = to;
        if to.is_terminal() {
            self.current_situation = None;
        }
        Ok(())
    }
}
