//! Shared boundary types for StickWar.
//!
//! This module defines the two key data contracts:
//! - Engine → Rasterizer (in-memory): `Scene` containing `DrawOp`s of 2D primitives
//! - Rasterizer → Player (file): `Recording` containing terminal `Frame`s

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared style primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const BLACK: Color = Color::Named(NamedColor::Black);
    pub const WHITE: Color = Color::Named(NamedColor::White);
    pub const GRAY: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Terminal cell style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<Color>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dim: bool,
}

impl Style {
    pub fn is_default(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && !self.bold && !self.dim
    }
}

/// Per-draw stroke descriptor. Built fresh for every primitive, never shared
/// or mutated across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

// ---------------------------------------------------------------------------
// Engine → Rasterizer boundary (in-memory only, never serialized)
// ---------------------------------------------------------------------------

/// A point in view pixels. `y` grows downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// The point reached by walking `length` pixels from `self` along `angle`
    /// (radians, measured from +x towards +y).
    pub fn polar(self, length: f32, angle: f32) -> Point {
        Point {
            x: self.x + length * angle.cos(),
            y: self.y + length * angle.sin(),
        }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    FillRect {
        top_left: Point,
        bottom_right: Point,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f32,
        stroke: Stroke,
    },
    Text {
        anchor: Point,
        text: String,
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOp {
    pub primitive: Primitive,
    pub z_order: i32,
}

/// Size of the view the engine draws into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub viewport: Viewport,
    pub ops: Vec<DrawOp>,
}

// ---------------------------------------------------------------------------
// Rasterizer → Player boundary (serialized to the recording file)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalContract {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub ch: char,
    #[serde(default, skip_serializing_if = "Style::is_default")]
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}

pub type Grid = Vec<Vec<Cell>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Full { cells: Grid },
    Diff { changes: Vec<CellChange> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub frame_index: usize,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub contract: TerminalContract,
    pub tick_ms: u64,
    pub frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
}

impl Recording {
    /// Label of the latest marker at or before `frame_index`. Markers are
    /// stored in frame order.
    pub fn marker_at(&self, frame_index: usize) -> Option<&str> {
        self.markers
            .iter()
            .rev()
            .find(|m| m.frame_index <= frame_index)
            .map(|m| m.label.as_str())
    }
}
