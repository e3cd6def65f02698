//! Procedural stick-figure pose.
//!
//! Limbs are two-bone chains hung from the shoulder and hip anchors. Angles
//! are expressed as an *outward* rotation from straight down (0 hangs
//! vertically, π/2 points horizontally away from the body, π points up), so
//! left and right limbs share one table and differ only by their side sign.

use std::f32::consts::{FRAC_PI_2, PI};

use super::state::{CharacterState, Command};
use crate::types::Point;

const ARM_SPREAD: f32 = 0.6;
const ELBOW_BEND: f32 = 0.2;
const LEG_SPREAD: f32 = 0.45;
const KNEE_BEND: f32 = -0.15;

const WALK_SWING: f32 = 0.25;
const ARM_RAISE: f32 = 2.0;
const JUMP_TUCK: f32 = 0.6;
const EXPLODE_SHAKE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Angle sign turning an outward rotation into a screen angle.
    fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Root and joint rotations of one two-bone chain, both outward from the
/// previous segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainAngles {
    pub root: f32,
    pub bend: f32,
}

impl ChainAngles {
    fn offset(self, root: f32, bend: f32) -> Self {
        ChainAngles {
            root: self.root + root,
            bend: self.bend + bend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limb {
    pub root: Point,
    pub joint: Point,
    pub tip: Point,
}

impl Limb {
    fn chain(root: Point, upper: f32, lower: f32, side: Side, angles: ChainAngles) -> Self {
        let a1 = FRAC_PI_2 + side.sign() * angles.root;
        let a2 = a1 + side.sign() * angles.bend;
        let joint = root.polar(upper, a1);
        Limb {
            root,
            joint,
            tip: joint.polar(lower, a2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub head_center: Point,
    pub head_radius: f32,
    pub neck: Point,
    pub pelvis: Point,
    /// `[left, right]`
    pub arms: [Limb; 2],
    /// `[left, right]`
    pub legs: [Limb; 2],
}

/// Horizontal body shake in pixels. Not scaled with the figure.
pub fn wobble(state: &CharacterState) -> f32 {
    let t = state.clock;
    match state.action_tag() {
        None => t.sin() * 2.0,
        Some(Command::Jump) => (t * 10.0).sin() * 5.0,
        Some(Command::Shoot) => (t * 20.0).sin() * 3.0,
        Some(Command::Explode) => (t * 30.0).sin() * 8.0,
    }
}

/// Joint angles for `[left arm, right arm]` and `[left leg, right leg]`.
pub fn limb_angles(state: &CharacterState) -> ([ChainAngles; 2], [ChainAngles; 2]) {
    let arm = ChainAngles {
        root: ARM_SPREAD,
        bend: ELBOW_BEND,
    };
    let leg = ChainAngles {
        root: LEG_SPREAD,
        bend: KNEE_BEND,
    };

    match state.action_tag() {
        None => {
            // Legs swing along x in opposite phase; an x-swing towards +x is
            // an inward rotation on the left and an outward one on the right.
            let left = (state.walk_phase * 4.0).sin() * WALK_SWING;
            let right = (state.walk_phase * 4.0 + PI).sin() * WALK_SWING;
            (
                [arm.offset(right * 0.5, 0.0), arm.offset(-left * 0.5, 0.0)],
                [
                    leg.offset(-left, 0.2 * left.max(0.0)),
                    leg.offset(right, 0.2 * right.max(0.0)),
                ],
            )
        }
        Some(Command::Jump) => (
            [arm.offset(ARM_RAISE, -ELBOW_BEND), arm.offset(ARM_RAISE, -ELBOW_BEND)],
            [leg.offset(0.0, JUMP_TUCK), leg.offset(0.0, JUMP_TUCK)],
        ),
        Some(Command::Shoot) => (
            [arm, arm.offset(FRAC_PI_2 - ARM_SPREAD, -ELBOW_BEND)],
            [leg, leg],
        ),
        Some(Command::Explode) => {
            let shake = |phase: f32| (state.clock * 30.0 + phase).sin() * EXPLODE_SHAKE;
            (
                [
                    arm.offset(shake(0.0), shake(1.0)),
                    arm.offset(shake(PI), shake(2.0)),
                ],
                [
                    leg.offset(shake(FRAC_PI_2) * 0.5, shake(3.0) * 0.5),
                    leg.offset(shake(-FRAC_PI_2) * 0.5, shake(4.0) * 0.5),
                ],
            )
        }
    }
}

/// Build the pose for the character's current state. `base_size` is the
/// unscaled figure height in pixels.
pub fn compute(state: &CharacterState, base_size: f32) -> Pose {
    let size = base_size * state.scale;
    let x = state.position.x + wobble(state);
    let y = state.position.y;

    let shoulders = Point::new(x, y - size / 6.0);
    let hips = Point::new(x, y + size / 3.0);
    let (arm_upper, arm_lower) = (size / 8.0, size / 8.0);
    let (leg_upper, leg_lower) = (size * 0.15, size * 0.15);

    let ([left_arm, right_arm], [left_leg, right_leg]) = limb_angles(state);

    Pose {
        head_center: Point::new(x, y - size / 2.0),
        head_radius: size / 8.0,
        neck: Point::new(x, y - size / 3.0),
        pelvis: hips,
        arms: [
            Limb::chain(shoulders, arm_upper, arm_lower, Side::Left, left_arm),
            Limb::chain(shoulders, arm_upper, arm_lower, Side::Right, right_arm),
        ],
        legs: [
            Limb::chain(hips, leg_upper, leg_lower, Side::Left, left_leg),
            Limb::chain(hips, leg_upper, leg_lower, Side::Right, right_leg),
        ],
    }
}
