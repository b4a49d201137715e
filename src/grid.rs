//! Grid consistency: the occupancy index, floating-cluster resolution, and
//! full-row clearing.
//!
//! The occupancy index is rebuilt on every query instead of maintained
//! incrementally: the block set changes structurally each tick (landings,
//! clears, abilities) and removals can shatter clusters in data-dependent
//! ways, so a fresh linear pass is the invariant-safe baseline.

use crate::game::{Block, BlockKind, CELL, COLS, PlayerSpan, ROWS};
use crate::shapes::{FallingShape, ShapeCell};
use std::collections::VecDeque;

/// Boolean occupancy plus kind lookup for the fixed grid, built in one pass.
/// Out-of-range blocks are skipped, never a fault.
pub struct Occupancy {
    filled: [[bool; COLS as usize]; ROWS as usize],
    kinds: [[BlockKind; COLS as usize]; ROWS as usize],
}

impl Occupancy {
    pub fn build(blocks: &[Block]) -> Self {
        let mut occ = Self {
            filled: [[false; COLS as usize]; ROWS as usize],
            kinds: [[BlockKind::Normal; COLS as usize]; ROWS as usize],
        };
        for b in blocks {
            if b.row >= 0 && b.row < ROWS && b.col >= 0 && b.col < COLS {
                occ.filled[b.row as usize][b.col as usize] = true;
                occ.kinds[b.row as usize][b.col as usize] = b.kind;
            }
        }
        occ
    }

    /// True when the cell holds a settled block; false off-grid.
    pub fn filled(&self, row: i32, col: i32) -> bool {
        row >= 0
            && row < ROWS
            && col >= 0
            && col < COLS
            && self.filled[row as usize][col as usize]
    }

    pub fn kind_at(&self, row: i32, col: i32) -> BlockKind {
        if row >= 0 && row < ROWS && col >= 0 && col < COLS {
            self.kinds[row as usize][col as usize]
        } else {
            BlockKind::Normal
        }
    }
}

/// Partition settled blocks into 4-connected clusters and convert every
/// unsupported cluster into one rigid falling shape at the ambient fall
/// speed. A cluster is supported when any of its cells sits in the bottom
/// row, rests on a settled block outside the cluster, or rests on the
/// player's cell span.
pub fn resolve_floating_clusters(
    blocks: &mut Vec<Block>,
    shapes: &mut Vec<FallingShape>,
    fall_speed: f32,
    player: &PlayerSpan,
) {
    if blocks.is_empty() {
        return;
    }

    let occ = Occupancy::build(blocks);
    let mut visited = [[false; COLS as usize]; ROWS as usize];
    let mut settled = Vec::with_capacity(blocks.len());

    for r0 in 0..ROWS {
        for c0 in 0..COLS {
            if !occ.filled(r0, c0) || visited[r0 as usize][c0 as usize] {
                continue;
            }

            let mut cluster: Vec<(i32, i32)> = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back((c0, r0));
            visited[r0 as usize][c0 as usize] = true;

            while let Some((c, r)) = queue.pop_front() {
                cluster.push((c, r));
                for (dc, dr) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    let (nc, nr) = (c + dc, r + dr);
                    if nc < 0 || nc >= COLS || nr < 0 || nr >= ROWS {
                        continue;
                    }
                    if !occ.filled(nr, nc) || visited[nr as usize][nc as usize] {
                        continue;
                    }
                    visited[nr as usize][nc as usize] = true;
                    queue.push_back((nc, nr));
                }
            }

            let supported = cluster.iter().any(|&(c, r)| {
                if r == ROWS - 1 {
                    return true;
                }
                let below = r + 1;
                if occ.filled(below, c) && !cluster.contains(&(c, below)) {
                    return true;
                }
                below >= player.top_row
                    && below <= player.bot_row
                    && c >= player.left_col
                    && c <= player.right_col
            });

            if supported {
                settled.extend(cluster.iter().map(|&(c, r)| Block {
                    col: c,
                    row: r,
                    kind: occ.kind_at(r, c),
                }));
            } else {
                let min_c = cluster.iter().map(|&(c, _)| c).min().unwrap_or(c0);
                let min_r = cluster.iter().map(|&(_, r)| r).min().unwrap_or(r0);
                let cells = cluster
                    .iter()
                    .map(|&(c, r)| ShapeCell {
                        dx: c - min_c,
                        dy: r - min_r,
                        kind: occ.kind_at(r, c),
                    })
                    .collect();
                shapes.push(FallingShape {
                    x: (min_c * CELL) as f32,
                    y: (min_r * CELL) as f32,
                    speed: fall_speed,
                    cells,
                });
            }
        }
    }

    *blocks = settled;
}

/// Remove every fully occupied row; each remaining block drops by the number
/// of cleared rows below it (larger row index). Returns the clear count.
pub fn clear_full_rows(blocks: &mut Vec<Block>) -> u32 {
    if blocks.is_empty() {
        return 0;
    }
    let occ = Occupancy::build(blocks);
    let full: Vec<i32> = (0..ROWS)
        .filter(|&r| (0..COLS).all(|c| occ.filled(r, c)))
        .collect();
    if full.is_empty() {
        return 0;
    }
    blocks.retain(|b| !full.contains(&b.row));
    for b in blocks.iter_mut() {
        let shift = full.iter().filter(|&&fr| fr > b.row).count() as i32;
        b.row += shift;
    }
    full.len() as u32
}
