//! Falling rigid shapes: advance against constant fall speed, detect landing
//! against the floor or the settled stack, and commit landed cells.

use crate::game::{Block, BlockKind, CELL, COLS, ROWS, SCREEN_HEIGHT};
use crate::grid::Occupancy;

/// One cell of a falling shape: grid-unit offset from the shape's top-left
/// plus the kind it will settle as. Offset and kind travel together so the
/// two can never desynchronize under splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeCell {
    pub dx: i32,
    pub dy: i32,
    pub kind: BlockKind,
}

/// A rigid, possibly non-contiguous group of cells in free fall. Position is
/// the top-left corner in pixels; cells may sit above the visible grid while
/// the shape falls in.
#[derive(Debug, Clone)]
pub struct FallingShape {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub cells: Vec<ShapeCell>,
}

impl FallingShape {
    /// Grid column/row of the shape origin, floor-quantized so cells above
    /// the grid map to negative rows.
    pub fn origin_cell(&self) -> (i32, i32) {
        (
            (self.x / CELL as f32).floor() as i32,
            (self.y / CELL as f32).floor() as i32,
        )
    }
}

/// Advance every shape by `speed * dt` and land the ones that cross the
/// floor line or the top of a settled block beneath any of their cells
/// during this tick's displacement. Landing is tested against the pre-tick
/// occupancy snapshot; shapes are independent of each other.
pub fn advance(shapes: &mut Vec<FallingShape>, blocks: &mut Vec<Block>, dt: f32) {
    let occ = Occupancy::build(blocks);
    let mut airborne = Vec::with_capacity(shapes.len());

    for mut s in shapes.drain(..) {
        let new_y = s.y + s.speed * dt;
        let mut final_y = new_y;
        let mut landed = false;

        for cell in &s.cells {
            let old_bottom = s.y + ((cell.dy + 1) * CELL) as f32;
            let new_bottom = new_y + ((cell.dy + 1) * CELL) as f32;

            // Floor.
            if new_bottom >= SCREEN_HEIGHT as f32 {
                let cand = (SCREEN_HEIGHT - (cell.dy + 1) * CELL) as f32;
                if !landed || cand < final_y {
                    final_y = cand;
                    landed = true;
                }
            }

            // Settled block beneath this cell's column.
            let col = ((s.x + (cell.dx * CELL) as f32) / CELL as f32).floor() as i32;
            if col < 0 || col >= COLS {
                continue;
            }
            for row in 0..ROWS {
                if !occ.filled(row, col) {
                    continue;
                }
                let top = (row * CELL) as f32;
                if old_bottom <= top && new_bottom >= top {
                    let cand = top - ((cell.dy + 1) * CELL) as f32;
                    if !landed || cand < final_y {
                        final_y = cand;
                        landed = true;
                    }
                }
            }
        }

        if landed {
            // The smallest candidate y (first obstruction) is authoritative.
            s.y = final_y;
            let base_col = (s.x / CELL as f32).round() as i32;
            let base_row = (s.y / CELL as f32).round() as i32;
            for cell in &s.cells {
                let col = base_col + cell.dx;
                let row = base_row + cell.dy;
                // Off-grid cells are dropped without affecting siblings.
                if col >= 0 && col < COLS && row >= 0 && row < ROWS {
                    blocks.push(Block {
                        col,
                        row,
                        kind: cell.kind,
                    });
                }
            }
        } else {
            s.y = new_y;
            airborne.push(s);
        }
    }

    *shapes = airborne;
}
