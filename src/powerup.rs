//! Directional break abilities and powerup effects.
//!
//! Breaking a powerup block triggers its effect; the area-shaped effects
//! share one hit predicate so settled blocks and falling shape cells are
//! culled by identical rules.

use crate::game::{Block, BlockKind, COLS, ROWS};
use crate::shapes::FallingShape;

pub const ABILITY_COOLDOWN: f32 = 0.5;
pub const BOMB_RADIUS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDir {
    Left,
    Right,
    Up,
    Down,
}

impl BreakDir {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    /// The grid cell targeted from the given player cell.
    pub fn target(self, col: i32, row: i32) -> (i32, i32) {
        match self {
            Self::Left => (col - 1, row),
            Self::Right => (col + 1, row),
            Self::Up => (col, row - 1),
            Self::Down => (col, row + 1),
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Up => 2,
            Self::Down => 3,
        }
    }
}

/// Per-direction break cooldowns. Each direction recovers independently.
#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    remaining: [f32; 4],
}

impl Cooldowns {
    pub fn advance(&mut self, dt: f32) {
        for r in &mut self.remaining {
            *r = (*r - dt).max(0.0);
        }
    }

    pub fn remaining(&self, dir: BreakDir) -> f32 {
        self.remaining[dir.index()]
    }

    pub fn ready(&self, dir: BreakDir) -> bool {
        self.remaining[dir.index()] <= 0.0
    }

    pub fn arm(&mut self, dir: BreakDir) {
        self.remaining[dir.index()] = ABILITY_COOLDOWN;
    }
}

/// An area-shaped destruction region, centered where a powerup was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaEffect {
    Blast { col: i32, row: i32, radius: i32 },
    Row(i32),
    Col(i32),
}

impl AreaEffect {
    /// Whether the given grid cell is destroyed by this effect. Blast uses
    /// Chebyshev distance (a square region).
    pub fn hits(self, col: i32, row: i32) -> bool {
        match self {
            Self::Blast {
                col: c,
                row: r,
                radius,
            } => (col - c).abs() <= radius && (row - r).abs() <= radius,
            Self::Row(r) => row == r,
            Self::Col(c) => col == c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Area(AreaEffect),
    Freeze,
}

/// The effect triggered by breaking a block of the given kind at (col, row).
/// Normal blocks just vanish.
pub fn effect_for(kind: BlockKind, col: i32, row: i32) -> Option<Effect> {
    match kind {
        BlockKind::Normal => None,
        BlockKind::Bomb => Some(Effect::Area(AreaEffect::Blast {
            col,
            row,
            radius: BOMB_RADIUS,
        })),
        BlockKind::Freeze => Some(Effect::Freeze),
        BlockKind::LaserH => Some(Effect::Area(AreaEffect::Row(row))),
        BlockKind::LaserV => Some(Effect::Area(AreaEffect::Col(col))),
    }
}

/// Apply an area effect to settled blocks and falling shape cells alike.
/// Shapes that lose every cell are removed; partial losses keep the shape
/// rigid with its surviving offsets.
pub fn apply_area(effect: AreaEffect, blocks: &mut Vec<Block>, shapes: &mut Vec<FallingShape>) {
    blocks.retain(|b| !effect.hits(b.col, b.row));

    shapes.retain_mut(|s| {
        let (base_col, base_row) = s.origin_cell();
        s.cells
            .retain(|c| !effect.hits(base_col + c.dx, base_row + c.dy));
        !s.cells.is_empty()
    });
}

/// Every in-grid cell covered by an effect, for the flash overlay.
pub fn area_cells(effect: AreaEffect) -> Vec<(i32, i32)> {
    let mut cells = Vec::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            if effect.hits(col, row) {
                cells.push((col, row));
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::CELL;
    use crate::shapes::ShapeCell;

    #[test]
    fn test_blast_is_chebyshev() {
        let e = AreaEffect::Blast {
            col: 5,
            row: 5,
            radius: 2,
        };
        assert!(e.hits(5, 5));
        assert!(e.hits(3, 3));
        assert!(e.hits(7, 7));
        assert!(e.hits(3, 7));
        assert!(!e.hits(2, 5));
        assert!(!e.hits(5, 8));
    }

    #[test]
    fn test_bomb_blast_covers_eleven_cell_square() {
        let e = AreaEffect::Blast {
            col: 5,
            row: 5,
            radius: BOMB_RADIUS,
        };
        assert!(e.hits(0, 0));
        assert!(e.hits(10, 10));
        assert!(!e.hits(11, 5));
        assert!(!e.hits(5, 11));
        assert_eq!(area_cells(e).len(), 11 * 11);
    }

    #[test]
    fn test_row_and_col_effects() {
        assert!(AreaEffect::Row(4).hits(0, 4));
        assert!(AreaEffect::Row(4).hits(15, 4));
        assert!(!AreaEffect::Row(4).hits(4, 5));
        assert!(AreaEffect::Col(9).hits(9, 0));
        assert!(!AreaEffect::Col(9).hits(8, 0));
    }

    #[test]
    fn test_effect_for_each_kind() {
        assert_eq!(effect_for(BlockKind::Normal, 3, 3), None);
        assert_eq!(
            effect_for(BlockKind::Bomb, 3, 3),
            Some(Effect::Area(AreaEffect::Blast {
                col: 3,
                row: 3,
                radius: BOMB_RADIUS
            }))
        );
        assert_eq!(effect_for(BlockKind::Freeze, 3, 3), Some(Effect::Freeze));
        assert_eq!(
            effect_for(BlockKind::LaserH, 3, 7),
            Some(Effect::Area(AreaEffect::Row(7)))
        );
        assert_eq!(
            effect_for(BlockKind::LaserV, 3, 7),
            Some(Effect::Area(AreaEffect::Col(3)))
        );
    }

    #[test]
    fn test_apply_area_culls_blocks_and_shape_cells() {
        let mut blocks = vec![
            Block {
                col: 5,
                row: 5,
                kind: BlockKind::Normal,
            },
            Block {
                col: 14,
                row: 5,
                kind: BlockKind::Normal,
            },
        ];
        let mut shapes = vec![FallingShape {
            x: (3 * CELL) as f32,
            y: (4 * CELL) as f32,
            speed: 220.0,
            cells: vec![
                ShapeCell {
                    dx: 0,
                    dy: 0,
                    kind: BlockKind::Normal,
                },
                ShapeCell {
                    dx: 1,
                    dy: 0,
                    kind: BlockKind::Bomb,
                },
            ],
        }];
        apply_area(
            AreaEffect::Blast {
                col: 5,
                row: 5,
                radius: 1,
            },
            &mut blocks,
            &mut shapes,
        );
        // The blast box covers cols 4..=6 and rows 4..=6: the block at (5,5)
        // and the shape cell at (4,4) are destroyed; (14,5) and the shape
        // cell at (3,4) fail the predicate and survive.
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].col, 14);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].cells.len(), 1);
        assert_eq!(shapes[0].cells[0].dx, 0);
        assert_eq!(shapes[0].cells[0].kind, BlockKind::Normal);
    }

    #[test]
    fn test_emptied_shape_is_removed() {
        let mut blocks = Vec::new();
        let mut shapes = vec![FallingShape {
            x: (3 * CELL) as f32,
            y: (3 * CELL) as f32,
            speed: 220.0,
            cells: vec![ShapeCell {
                dx: 0,
                dy: 0,
                kind: BlockKind::Normal,
            }],
        }];
        apply_area(AreaEffect::Row(3), &mut blocks, &mut shapes);
        assert!(shapes.is_empty());
    }

    #[test]
    fn test_cooldown_per_direction() {
        let mut cd = Cooldowns::default();
        assert!(cd.ready(BreakDir::Left));
        cd.arm(BreakDir::Left);
        assert!(!cd.ready(BreakDir::Left));
        assert!(cd.ready(BreakDir::Right));
        cd.advance(ABILITY_COOLDOWN / 2.0);
        assert!(!cd.ready(BreakDir::Left));
        cd.advance(ABILITY_COOLDOWN);
        assert!(cd.ready(BreakDir::Left));
        assert_eq!(cd.remaining(BreakDir::Left), 0.0);
    }

    #[test]
    fn test_break_targets() {
        assert_eq!(BreakDir::Left.target(5, 5), (4, 5));
        assert_eq!(BreakDir::Right.target(5, 5), (6, 5));
        assert_eq!(BreakDir::Up.target(5, 5), (5, 4));
        assert_eq!(BreakDir::Down.target(5, 5), (5, 6));
    }
}
