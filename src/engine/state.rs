//! Character kinematics and the action-overlay state machine.
//!
//! Everything here is pure data plus total update functions. The engine
//! wraps these with logging and owns the single `CharacterState`.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Jump,
    Shoot,
    Explode,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Jump, Command::Shoot, Command::Explode];

    /// Label shown in the "last action" diagnostic.
    pub fn label(self) -> &'static str {
        match self {
            Command::Jump => "JUMP!",
            Command::Shoot => "SHOOT!",
            Command::Explode => "EXPLOSION!",
        }
    }
}

/// Engine constants. Defaults match the classic demo feel; all of them can
/// be overridden from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub patrol_speed: f32,
    pub patrol_margin: f32,
    pub clock_rate: f32,
    pub walk_rate: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub jump_duration: f32,
    pub jump_scale: f32,
    pub shoot_duration: f32,
    pub shoot_scale: f32,
    pub explode_duration: f32,
    pub explode_scale: f32,
    pub figure_size: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            patrol_speed: 200.0,
            patrol_margin: 100.0,
            clock_rate: 3.0,
            walk_rate: 3.0,
            gravity: 800.0,
            jump_velocity: -600.0,
            jump_duration: 0.5,
            jump_scale: 1.2,
            shoot_duration: 0.3,
            shoot_scale: 1.1,
            explode_duration: 0.8,
            explode_scale: 1.5,
            figure_size: 120.0,
        }
    }
}

impl Tuning {
    /// Duration (seconds) and emphasis scale of a command's overlay.
    pub fn profile(&self, command: Command) -> (f32, f32) {
        match command {
            Command::Jump => (self.jump_duration, self.jump_scale),
            Command::Shoot => (self.shoot_duration, self.shoot_scale),
            Command::Explode => (self.explode_duration, self.explode_scale),
        }
    }
}

/// Fixed geometry derived from the view size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    /// Largest y the character's anchor may reach.
    pub ground: f32,
    /// Ground/sky split of the background.
    pub horizon: f32,
}

impl Bounds {
    pub fn new(viewport: Viewport, margin: f32, horizon_fraction: f32) -> Self {
        let horizon = viewport.height * horizon_fraction;
        let (left, right) = if viewport.width > 2.0 * margin {
            (margin, viewport.width - margin)
        } else {
            (viewport.width / 2.0, viewport.width / 2.0)
        };
        Bounds {
            left,
            right,
            ground: horizon,
            horizon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveAction {
    pub kind: Command,
    /// Always > 0 while the action is stored.
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterState {
    pub position: Point,
    pub speed: f32,
    /// +1.0 walking right, -1.0 walking left.
    pub direction: f32,
    pub velocity_y: f32,
    pub airborne: bool,
    pub scale: f32,
    pub action: Option<ActiveAction>,
    pub clock: f32,
    pub walk_phase: f32,
}

/// Transitions that happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    pub landed: bool,
    pub expired: Option<Command>,
    pub turned: bool,
}

impl CharacterState {
    /// A character standing on the ground at the middle of the patrol range.
    pub fn spawn(bounds: &Bounds, tuning: &Tuning) -> Self {
        CharacterState {
            position: Point::new((bounds.left + bounds.right) / 2.0, bounds.ground),
            speed: tuning.patrol_speed,
            direction: 1.0,
            velocity_y: 0.0,
            airborne: false,
            scale: 1.0,
            action: None,
            clock: 0.0,
            walk_phase: 0.0,
        }
    }

    pub fn action_tag(&self) -> Option<Command> {
        self.action.map(|a| a.kind)
    }

    pub fn action_timer(&self) -> f32 {
        self.action.map_or(0.0, |a| a.remaining)
    }

    /// Advance the character by `dt` seconds. Negative or non-finite deltas
    /// count as zero.
    pub fn tick(&mut self, dt: f32, bounds: &Bounds, tuning: &Tuning) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if !dt.is_finite() || dt <= 0.0 {
            return outcome;
        }

        self.clock += dt * tuning.clock_rate;
        if self.action.is_none() {
            self.walk_phase += dt * tuning.walk_rate;
        }

        self.position.x += self.speed * self.direction * dt;
        if self.position.x >= bounds.right {
            self.position.x = bounds.right;
            outcome.turned = self.direction > 0.0;
            self.direction = -1.0;
        } else if self.position.x <= bounds.left {
            self.position.x = bounds.left;
            outcome.turned = self.direction < 0.0;
            self.direction = 1.0;
        }

        if self.airborne {
            self.position.y += self.velocity_y * dt;
            self.velocity_y += tuning.gravity * dt;
            if self.position.y >= bounds.ground {
                self.position.y = bounds.ground;
                self.airborne = false;
                self.velocity_y = 0.0;
                self.scale = 1.0;
                outcome.landed = true;
            }
        }

        if let Some(active) = &mut self.action {
            active.remaining -= dt;
            if active.remaining <= 0.0 {
                outcome.expired = Some(active.kind);
                self.action = None;
                if !self.airborne {
                    self.scale = 1.0;
                }
            }
        }

        outcome
    }

    /// Start `command`'s overlay. Returns false when the command was ignored
    /// (a jump while already airborne).
    pub fn apply(&mut self, command: Command, tuning: &Tuning) -> bool {
        if command == Command::Jump {
            if self.airborne {
                return false;
            }
            self.airborne = true;
            self.velocity_y = tuning.jump_velocity;
        }

        let (duration, scale) = tuning.profile(command);
        self.scale = scale;
        self.action = (duration > 0.0).then_some(ActiveAction {
            kind: command,
            remaining: duration,
        });
        true
    }
}
