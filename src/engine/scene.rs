//! Scene construction: background, figure and HUD as draw primitives.
//!
//! A pure function of the engine state. Styles are built per primitive.

use serde::{Deserialize, Serialize};

use super::Diagnostics;
use super::pose::{self, Pose};
use super::state::{Bounds, CharacterState};
use crate::types::{Color, DrawOp, Point, Primitive, Scene, Stroke, Viewport};

const Z_BACKGROUND: i32 = 0;
const Z_SEPARATOR: i32 = 1;
const Z_FIGURE: i32 = 2;
const Z_HUD: i32 = 3;

const HUD_MARGIN: f32 = 20.0;

/// How the figure is colored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ColorPolicy {
    /// White in the dark upper half-plane, black at or below the horizon.
    HalfPlane,
    Fixed { color: Color },
}

impl ColorPolicy {
    pub fn figure_color(&self, y: f32, horizon: f32) -> Color {
        match self {
            ColorPolicy::HalfPlane => contrast_at(y, horizon),
            ColorPolicy::Fixed { color } => color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPolicy {
    pub color: ColorPolicy,
    /// Ground/sky split as a fraction of the view height.
    pub horizon_fraction: f32,
    pub stroke_width: f32,
    pub separator_width: f32,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        RenderPolicy {
            color: ColorPolicy::HalfPlane,
            horizon_fraction: 0.5,
            stroke_width: 8.0,
            separator_width: 4.0,
        }
    }
}

/// The color readable on the half-plane containing `y`.
fn contrast_at(y: f32, horizon: f32) -> Color {
    if y < horizon { Color::WHITE } else { Color::BLACK }
}

fn op(primitive: Primitive, z_order: i32) -> DrawOp {
    DrawOp { primitive, z_order }
}

/// Build the draw list for one frame.
pub fn build(
    viewport: Viewport,
    bounds: &Bounds,
    state: &CharacterState,
    diagnostics: &Diagnostics,
    policy: &RenderPolicy,
    figure_size: f32,
) -> Scene {
    let mut ops = Vec::with_capacity(24);

    background(viewport, bounds, policy, &mut ops);

    let stroke = Stroke {
        color: policy.color.figure_color(state.position.y, bounds.horizon),
        width: policy.stroke_width,
    };
    figure(&pose::compute(state, figure_size), &stroke, &mut ops);

    hud(viewport, bounds, diagnostics, &mut ops);

    Scene { viewport, ops }
}

fn background(viewport: Viewport, bounds: &Bounds, policy: &RenderPolicy, ops: &mut Vec<DrawOp>) {
    let h = bounds.horizon;
    ops.push(op(
        Primitive::FillRect {
            top_left: Point::new(0.0, 0.0),
            bottom_right: Point::new(viewport.width, h),
            color: Color::BLACK,
        },
        Z_BACKGROUND,
    ));
    ops.push(op(
        Primitive::FillRect {
            top_left: Point::new(0.0, h),
            bottom_right: Point::new(viewport.width, viewport.height),
            color: Color::WHITE,
        },
        Z_BACKGROUND,
    ));
    ops.push(op(
        Primitive::Line {
            from: Point::new(0.0, h),
            to: Point::new(viewport.width, h),
            stroke: Stroke {
                color: Color::GRAY,
                width: policy.separator_width,
            },
        },
        Z_SEPARATOR,
    ));
}

fn figure(pose: &Pose, stroke: &Stroke, ops: &mut Vec<DrawOp>) {
    let line = |from: Point, to: Point| {
        op(
            Primitive::Line {
                from,
                to,
                stroke: stroke.clone(),
            },
            Z_FIGURE,
        )
    };

    ops.push(op(
        Primitive::Circle {
            center: pose.head_center,
            radius: pose.head_radius,
            stroke: stroke.clone(),
        },
        Z_FIGURE,
    ));
    ops.push(line(pose.neck, pose.pelvis));
    for limb in pose.arms.iter().chain(pose.legs.iter()) {
        ops.push(line(limb.root, limb.joint));
        ops.push(line(limb.joint, limb.tip));
    }
}

fn hud(viewport: Viewport, bounds: &Bounds, diagnostics: &Diagnostics, ops: &mut Vec<DrawOp>) {
    let mut text = |y: f32, text: String| {
        ops.push(op(
            Primitive::Text {
                anchor: Point::new(HUD_MARGIN, y),
                text,
                color: contrast_at(y, bounds.horizon),
            },
            Z_HUD,
        ));
    };

    text(HUD_MARGIN, diagnostics.title.clone());
    if let Some(status) = &diagnostics.status {
        text(viewport.height - 4.0 * HUD_MARGIN, status.clone());
    }
    text(
        viewport.height - 2.0 * HUD_MARGIN,
        format!("Last action: {}", diagnostics.last_action),
    );
}
