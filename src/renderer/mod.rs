//! Renderer: the deterministic rasterizer.
//!
//! Takes `Scene`s (in-memory, from the engine) and produces terminal cell
//! grids, and from a run of scenes a `Recording` (serializable, for the
//! player).
//!
//! The renderer is pure and stateless. Given the same input, it always
//! produces the same output. It knows nothing about time, physics, or the
//! character.

use serde::{Deserialize, Serialize};

use crate::types::{
    Cell, CellChange, Color, Frame, Grid, Point, Primitive, Recording, Scene, Stroke,
    TerminalContract, Viewport,
};

const CELL_LIMIT: f32 = 4096.0;
const MAX_CIRCLE_SAMPLES: usize = 4096;

/// Size of one terminal cell in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellSize {
    pub width_px: f32,
    pub height_px: f32,
}

impl Default for CellSize {
    fn default() -> Self {
        CellSize {
            width_px: 14.0,
            height_px: 28.0,
        }
    }
}

impl CellSize {
    /// The pixel viewport covered by a terminal grid.
    pub fn viewport(&self, contract: TerminalContract) -> Viewport {
        Viewport {
            width: contract.width as f32 * self.width_px,
            height: contract.height as f32 * self.height_px,
        }
    }

    /// Cell containing `p`, clamped to `±CELL_LIMIT` so far-off points
    /// keep line walks short.
    fn cell_of(&self, p: Point) -> (i32, i32) {
        let clamp = |v: f32| v.floor().clamp(-CELL_LIMIT, CELL_LIMIT) as i32;
        (clamp(p.x / self.width_px), clamp(p.y / self.height_px))
    }
}

pub struct Renderer;

impl Renderer {
    /// Render a sequence of scenes into a recording.
    ///
    /// The first frame is always a full frame. Subsequent frames are diffs
    /// against the previous frame.
    pub fn render(
        scenes: &[Scene],
        contract: TerminalContract,
        cell: CellSize,
        tick_ms: u64,
    ) -> Recording {
        let mut frames = Vec::with_capacity(scenes.len());
        let mut prev_grid: Option<Grid> = None;

        for scene in scenes {
            let grid = Self::rasterize(scene, contract, cell);
            let frame = match &prev_grid {
                None => Frame::Full {
                    cells: grid.clone(),
                },
                Some(prev) => Frame::Diff {
                    changes: Self::diff(prev, &grid),
                },
            };
            frames.push(frame);
            prev_grid = Some(grid);
        }

        Recording {
            contract,
            tick_ms,
            frames,
            markers: Vec::new(),
        }
    }

    /// Rasterize a scene onto a fixed-size cell grid.
    ///
    /// Draw operations are sorted by z-order so that higher z values
    /// paint over lower ones; equal z values keep their scene order.
    pub fn rasterize(scene: &Scene, contract: TerminalContract, cell: CellSize) -> Grid {
        let mut canvas = Canvas::new(contract, cell);

        let mut ops: Vec<_> = scene.ops.iter().collect();
        ops.sort_by_key(|op| op.z_order);

        for op in ops {
            match &op.primitive {
                Primitive::FillRect {
                    top_left,
                    bottom_right,
                    color,
                } => canvas.fill_rect(*top_left, *bottom_right, color),
                Primitive::Line { from, to, stroke } => canvas.line(*from, *to, stroke),
                Primitive::Circle {
                    center,
                    radius,
                    stroke,
                } => canvas.circle(*center, *radius, stroke),
                Primitive::Text {
                    anchor,
                    text,
                    color,
                } => canvas.text(*anchor, text, color),
            }
        }

        canvas.grid
    }

    /// Compute a cell-level diff between two grids.
    pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }
}

/// Glyph for a segment direction. `heavy` picks the bold box-drawing variants
/// for axis-aligned strokes.
fn slope_glyph(dx: f32, dy: f32, heavy: bool) -> char {
    use std::f32::consts::PI;

    let mut angle = dy.atan2(dx);
    if angle < 0.0 {
        angle += PI;
    }
    let octant = (angle / (PI / 8.0)) as u32;
    match (octant, heavy) {
        (0 | 7 | 8, false) => '─',
        (0 | 7 | 8, true) => '━',
        (3 | 4, false) => '│',
        (3 | 4, true) => '┃',
        // y grows downwards: a positive slope runs top-left to bottom-right.
        (1 | 2, _) => '╲',
        _ => '╱',
    }
}

struct Canvas {
    grid: Grid,
    cell: CellSize,
}

impl Canvas {
    fn new(contract: TerminalContract, cell: CellSize) -> Self {
        let w = contract.width as usize;
        let h = contract.height as usize;
        Canvas {
            grid: vec![vec![Cell::default(); w]; h],
            cell,
        }
    }

    fn at(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get_mut(y as usize)?.get_mut(x as usize)
    }

    /// Paint a glyph in `color`, keeping the cell background.
    fn put(&mut self, x: i32, y: i32, ch: char, color: &Color) {
        if let Some(cell) = self.at(x, y) {
            cell.ch = ch;
            cell.style.fg = Some(color.clone());
        }
    }

    /// Cells whose centers fall inside the rect take its color as background.
    fn fill_rect(&mut self, top_left: Point, bottom_right: Point, color: &Color) {
        let (cw, ch) = (self.cell.width_px, self.cell.height_px);
        for (row, cells) in self.grid.iter_mut().enumerate() {
            let cy = (row as f32 + 0.5) * ch;
            if cy < top_left.y || cy >= bottom_right.y {
                continue;
            }
            for (col, cell) in cells.iter_mut().enumerate() {
                let cx = (col as f32 + 0.5) * cw;
                if cx < top_left.x || cx >= bottom_right.x {
                    continue;
                }
                *cell = Cell::default();
                cell.style.bg = Some(color.clone());
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let heavy = stroke.width * 2.0 >= self.cell.width_px;
        let glyph = slope_glyph(to.x - from.x, to.y - from.y, heavy);

        let (mut x0, mut y0) = self.cell.cell_of(from);
        let (x1, y1) = self.cell.cell_of(to);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x0, y0, glyph, &stroke.color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn circle(&mut self, center: Point, radius: f32, stroke: &Stroke) {
        if radius * 2.0 < self.cell.height_px {
            let (x, y) = self.cell.cell_of(center);
            self.put(x, y, 'O', &stroke.color);
            return;
        }

        let circumference = 2.0 * std::f32::consts::PI * radius;
        let samples = ((circumference / (self.cell.width_px / 2.0)).ceil() as usize)
            .clamp(16, MAX_CIRCLE_SAMPLES);
        for i in 0..samples {
            let angle = i as f32 / samples as f32 * std::f32::consts::TAU;
            let (x, y) = self.cell.cell_of(center.polar(radius, angle));
            self.put(x, y, 'o', &stroke.color);
        }
    }

    fn text(&mut self, anchor: Point, text: &str, color: &Color) {
        let (x, y) = self.cell.cell_of(anchor);
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i as i32, y, ch, color);
        }
    }
}
