//! Render frames and the surfaces that consume them.
//!
//! Rendering reads world state and never writes it back. The only thing
//! a render consumes is the last recorded shot.

use crate::{
    error::SimResult,
    geometry::{cell_center, Point, Rect},
    types::GridPos,
    world::World,
};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// The newest successful enemy shot, kept for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub shooter: GridPos,
    pub target: GridPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tint {
    White,
    Red,
}

/// A render-space primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Circle { center: Point, radius: f64, tint: Tint },
    Square { rect: Rect, tint: Tint },
    Line { from: Point, to: Point, tint: Tint },
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub cell_size: f64,
    pub actors: Vec<GridPos>,
    pub blocks: Vec<GridPos>,
    pub enemies: Vec<GridPos>,
    pub shot: Option<Shot>,
    pub shapes: Vec<Shape>,
}

/// Gap between a token's circle and its cell edge.
const TOKEN_MARGIN: f64 = 5.0;

impl Frame {
    pub fn capture(world: &World, cell_size: f64, shot: Option<Shot>) -> Self {
        let radius = (cell_size / 2.0 - TOKEN_MARGIN).max(0.0);
        let mut shapes = Vec::new();

        for actor in &world.actors {
            shapes.push(Shape::Circle {
                center: cell_center(actor.pos, cell_size),
                radius,
                tint: Tint::White,
            });
        }
        for &block in &world.blocks {
            shapes.push(Shape::Square {
                rect: Rect::of_cell(block, cell_size),
                tint: Tint::White,
            });
        }
        for &enemy in &world.enemies {
            shapes.push(Shape::Circle {
                center: cell_center(enemy, cell_size),
                radius,
                tint: Tint::Red,
            });
        }
        if let Some(shot) = shot {
            shapes.push(Shape::Line {
                from: cell_center(shot.shooter, cell_size),
                to: cell_center(shot.target, cell_size),
                tint: Tint::Red,
            });
        }

        Self {
            width: world.width,
            height: world.height,
            cell_size,
            actors: world.actor_positions(),
            blocks: world.blocks.clone(),
            enemies: world.enemies.clone(),
            shot,
            shapes,
        }
    }

    /// One text row per grid row: `A` actor, `#` block, `E` enemy, `.` empty.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = GridPos::new(x, y);
                let glyph = if self.actors.contains(&pos) {
                    'A'
                } else if self.blocks.contains(&pos) {
                    '#'
                } else if self.enemies.contains(&pos) {
                    'E'
                } else {
                    '.'
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        if let Some(shot) = self.shot {
            out.push_str(&format!("shot {} -> {}\n", shot.shooter, shot.target));
        }
        out
    }
}

/// An external display the environment can draw to.
pub trait RenderSurface {
    /// True once the display asked to close. The environment then
    /// detaches the surface permanently.
    fn poll_quit(&mut self) -> bool;

    fn draw(&mut self, frame: &Frame) -> SimResult<()>;

    /// Release the display.
    fn close(&mut self);
}

/// Writes each frame as a text grid.
pub struct TextSurface<W: Write> {
    out: W,
    frames_drawn: u64,
}

impl<W: Write> TextSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames_drawn: 0 }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSurface for TextSurface<W> {
    fn poll_quit(&mut self) -> bool {
        false
    }

    fn draw(&mut self, frame: &Frame) -> SimResult<()> {
        self.frames_drawn += 1;
        writeln!(self.out, "frame {}", self.frames_drawn)?;
        self.out.write_all(frame.to_text().as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.out.flush();
    }
}
