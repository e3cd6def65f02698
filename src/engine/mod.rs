//! Engine: the animation/pose core.
//!
//! Owns the single `CharacterState`, advances it on every tick, applies
//! discrete commands and renders the current pose into a `Scene`.
//!
//! The engine never schedules itself and never deals with terminals: the
//! host decides when to tick, the rasterizer decides how to draw.

pub mod pose;
pub mod scene;
pub mod state;

use tracing::debug;

use crate::types::{Scene, Viewport};
use scene::RenderPolicy;
use state::{Bounds, CharacterState, Tuning};

pub use state::Command;

/// On-screen debug text. Carries no gameplay meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub title: String,
    pub last_action: String,
    pub status: Option<String>,
}

impl Diagnostics {
    pub fn new(title: impl Into<String>) -> Self {
        Diagnostics {
            title: title.into(),
            last_action: "Waiting...".to_string(),
            status: None,
        }
    }
}

pub struct Engine {
    viewport: Viewport,
    bounds: Bounds,
    tuning: Tuning,
    policy: RenderPolicy,
    state: CharacterState,
    diagnostics: Diagnostics,
}

impl Engine {
    /// Create the engine once the view size is known.
    pub fn new(viewport: Viewport, tuning: Tuning, policy: RenderPolicy) -> Self {
        let bounds = Bounds::new(viewport, tuning.patrol_margin, policy.horizon_fraction);
        let state = CharacterState::spawn(&bounds, &tuning);
        Engine {
            viewport,
            bounds,
            tuning,
            policy,
            state,
            diagnostics: Diagnostics::new("StickWar"),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.diagnostics.title = title.into();
        self
    }

    /// Recompute the bounds for a new view size and respawn the character at
    /// the new center.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        debug!(
            width = viewport.width,
            height = viewport.height,
            "view resized"
        );
        self.viewport = viewport;
        self.bounds = Bounds::new(viewport, self.tuning.patrol_margin, self.policy.horizon_fraction);
        self.state = CharacterState::spawn(&self.bounds, &self.tuning);
    }

    pub fn tick(&mut self, dt: f32) {
        let outcome = self.state.tick(dt, &self.bounds, &self.tuning);
        if outcome.landed {
            debug!(x = self.state.position.x, "landed");
        }
        if let Some(kind) = outcome.expired {
            debug!(?kind, "action expired");
        }
    }

    pub fn apply(&mut self, command: Command) {
        if self.state.apply(command, &self.tuning) {
            debug!(?command, airborne = self.state.airborne, "command applied");
            self.diagnostics.last_action = command.label().to_string();
        } else {
            debug!(?command, "command ignored while airborne");
        }
    }

    /// Diagnostic side channel for the command source.
    pub fn set_status(&mut self, status: Option<String>) {
        self.diagnostics.status = status;
    }

    pub fn render(&self) -> Scene {
        scene::build(
            self.viewport,
            &self.bounds,
            &self.state,
            &self.diagnostics,
            &self.policy,
            self.tuning.figure_size,
        )
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(
            Viewport {
                width: 1120.0,
                height: 672.0,
            },
            Tuning::default(),
            RenderPolicy::default(),
        )
    }

    #[test]
    fn last_action_tracks_effective_commands() {
        let mut engine = engine();
        assert_eq!(engine.diagnostics().last_action, "Waiting...");

        engine.apply(Command::Jump);
        assert_eq!(engine.diagnostics().last_action, "JUMP!");

        engine.apply(Command::Shoot);
        engine.apply(Command::Jump);
        assert_eq!(engine.diagnostics().last_action, "SHOOT!");
    }

    #[test]
    fn status_is_only_set_from_outside() {
        let mut engine = engine();
        engine.apply(Command::Explode);
        engine.tick(1.0);
        assert_eq!(engine.diagnostics().status, None);

        engine.set_status(Some("Listening".into()));
        engine.tick(0.016);
        assert_eq!(engine.diagnostics().status.as_deref(), Some("Listening"));
    }

    #[test]
    fn resize_respawns_at_new_center() {
        let mut engine = engine();
        engine.apply(Command::Jump);
        engine.tick(0.3);

        engine.resize(Viewport {
            width: 800.0,
            height: 400.0,
        });
        let state = engine.state();
        assert_eq!(state.position.x, 400.0);
        assert_eq!(state.position.y, 200.0);
        assert!(!state.airborne);
        assert_eq!(engine.bounds().right, 700.0);
    }

    #[test]
    fn title_appears_in_scene() {
        let engine = engine().with_title("say: hop");
        let scene = engine.render();
        assert!(scene.ops.iter().any(|op| matches!(
            &op.primitive,
            crate::types::Primitive::Text { text, .. } if text == "say: hop"
        )));
    }
}
