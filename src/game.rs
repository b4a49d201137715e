//! Round state and the per-tick simulation pipeline: player kinematics,
//! shape spawning, ability dispatch, and the game-over lifecycle.

use crate::grid;
use crate::input::Intents;
use crate::powerup::{self, BreakDir, Cooldowns, Effect};
use crate::shapes::{self, FallingShape, ShapeCell};

/// Cell size in simulation pixels. The whole grid geometry derives from it.
pub const CELL: i32 = 30;
pub const SCREEN_WIDTH: i32 = 480;
pub const SCREEN_HEIGHT: i32 = 600;
pub const COLS: i32 = SCREEN_WIDTH / CELL;
pub const ROWS: i32 = SCREEN_HEIGHT / CELL;

pub const GRAVITY: f32 = 900.0;
pub const JUMP_VELOCITY: f32 = -430.0;
pub const PLAYER_SPEED: f32 = 220.0;
pub const SPAWN_INTERVAL: f32 = 0.75;
pub const BASE_FALL_SPEED: f32 = 220.0;
pub const MAX_EXTRA_FALL_SPEED: f32 = 60.0;
/// A powerup is guaranteed within this window; the random roll only applies
/// while the guarantee is not yet due.
pub const POWERUP_MAX_GAP: f32 = 15.0;
pub const POWERUP_CHANCE_PERCENT: u32 = 7;
pub const FREEZE_DURATION: f32 = 10.0;
pub const MAX_HIGH_SCORES: usize = 5;
/// Delta-time clamp: a stalled frame must not turn into a physics explosion.
pub const MAX_FRAME_DT: f32 = 0.05;

/// What a settled block (or falling cell) carries. Normal has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Normal,
    Bomb,
    Freeze,
    LaserH,
    LaserV,
}

impl BlockKind {
    pub fn is_powerup(self) -> bool {
        self != Self::Normal
    }
}

/// A settled, static grid cell occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub col: i32,
    pub row: i32,
    pub kind: BlockKind,
}

/// The player's current bounding cell span, used by the connectivity
/// resolver's player-support rule.
#[derive(Debug, Clone, Copy)]
pub struct PlayerSpan {
    pub left_col: i32,
    pub right_col: i32,
    pub top_row: i32,
    pub bot_row: i32,
}

/// One-cell actor with continuous pixel position.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl Player {
    pub const WIDTH: f32 = CELL as f32;
    pub const HEIGHT: f32 = CELL as f32;

    fn spawn() -> Self {
        Self {
            x: ((SCREEN_WIDTH - CELL) / 2) as f32,
            y: (SCREEN_HEIGHT - CELL - 10) as f32,
            vy: 0.0,
            on_ground: false,
        }
    }

    /// Grid column of the player's top-left corner.
    pub fn col(&self) -> i32 {
        (self.x / CELL as f32).floor() as i32
    }

    /// Grid row of the player's top-left corner.
    pub fn row(&self) -> i32 {
        (self.y / CELL as f32).floor() as i32
    }

    pub fn cell_span(&self) -> PlayerSpan {
        PlayerSpan {
            left_col: self.col(),
            right_col: ((self.x + Self::WIDTH - 1.0) / CELL as f32).floor() as i32,
            top_row: self.row(),
            bot_row: ((self.y + Self::HEIGHT - 1.0) / CELL as f32).floor() as i32,
        }
    }
}

fn rects_overlap(ax: f32, ay: f32, aw: f32, ah: f32, bx: f32, by: f32, bw: f32, bh: f32) -> bool {
    ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
}

/// Small LCG, good enough for shape and powerup rolls; seedable for
/// reproducible runs.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    fn next_rand(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        self.state >> 16
    }

    /// Uniform value in `0..n` (0 when n is 0).
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 { 0 } else { self.next_rand() % n }
    }
}

/// All round-scoped mutable state, owned by one logical tick and mutated in a
/// fixed order. `reset` is the single reinitialization entry point.
#[derive(Debug)]
pub struct GameState {
    pub blocks: Vec<Block>,
    pub shapes: Vec<FallingShape>,
    pub player: Player,
    pub cooldowns: Cooldowns,
    pub spawn_timer: f32,
    pub elapsed: f32,
    pub time_since_powerup: f32,
    pub freeze_timer: f32,
    pub game_over: bool,
    /// Descending survival times, truncated to [`MAX_HIGH_SCORES`].
    /// Survives restarts, unlike the rest of the round state.
    pub high_scores: Vec<f32>,
    /// Grid cells removed by area effects this tick, drained by the UI flash.
    effect_cells: Vec<(i32, i32)>,
    prev_jump: bool,
    rng: Rng,
}

impl GameState {
    pub fn new(seed: u32) -> Self {
        Self {
            blocks: Vec::new(),
            shapes: Vec::new(),
            player: Player::spawn(),
            cooldowns: Cooldowns::default(),
            spawn_timer: 0.0,
            elapsed: 0.0,
            time_since_powerup: 0.0,
            freeze_timer: 0.0,
            game_over: false,
            high_scores: Vec::new(),
            effect_cells: Vec::new(),
            prev_jump: false,
            rng: Rng::new(seed),
        }
    }

    /// Full round reinitialization; nothing except the high-score list and
    /// the RNG stream crosses rounds.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.shapes.clear();
        self.player = Player::spawn();
        self.cooldowns = Cooldowns::default();
        self.spawn_timer = 0.0;
        self.elapsed = 0.0;
        self.time_since_powerup = 0.0;
        self.freeze_timer = 0.0;
        self.game_over = false;
        self.effect_cells.clear();
        self.prev_jump = false;
    }

    /// Ambient fall speed: gentle ramp capped at +60 px/s.
    pub fn fall_speed(&self) -> f32 {
        BASE_FALL_SPEED + (self.elapsed * 5.0).min(MAX_EXTRA_FALL_SPEED)
    }

    pub fn frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    /// Cells removed by this tick's area effects, for the UI break flash.
    pub fn take_effect_cells(&mut self) -> Vec<(i32, i32)> {
        std::mem::take(&mut self.effect_cells)
    }

    /// One simulation tick. `dt` is clamped; `intents` is this tick's input
    /// snapshot. Order: timers, player, spawn, shapes, abilities, row clear,
    /// clusters, game-over check.
    pub fn update(&mut self, dt: f32, intents: &Intents) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        if self.game_over {
            if intents.restart {
                self.reset();
            }
            return;
        }

        self.elapsed += dt;
        self.time_since_powerup += dt;
        if self.freeze_timer > 0.0 {
            self.freeze_timer = (self.freeze_timer - dt).max(0.0);
        }
        self.cooldowns.advance(dt);
        let fall_speed = self.fall_speed();

        self.step_player(dt, intents);
        self.step_spawn(dt, fall_speed);
        if !self.frozen() {
            shapes::advance(&mut self.shapes, &mut self.blocks, dt);
        }
        self.resolve_abilities(intents);
        grid::clear_full_rows(&mut self.blocks);
        if !self.frozen() {
            grid::resolve_floating_clusters(
                &mut self.blocks,
                &mut self.shapes,
                fall_speed,
                &self.player.cell_span(),
            );
        }
        if self.blocks.iter().any(|b| b.row <= 0) {
            self.game_over = true;
            self.record_score();
        }
    }

    /// Axis-separated player integration: horizontal clamp + push-out, then
    /// gravity with floor clamp and top/underside block contacts, then an
    /// independent grounded re-derivation so a resting player is never
    /// denied a jump between collision ticks.
    fn step_player(&mut self, dt: f32, intents: &Intents) {
        let old_y = self.player.y;

        let mut vx = 0.0;
        if intents.left {
            vx -= PLAYER_SPEED;
        }
        if intents.right {
            vx += PLAYER_SPEED;
        }

        let mut new_x = (self.player.x + vx * dt).clamp(0.0, SCREEN_WIDTH as f32 - Player::WIDTH);
        for b in &self.blocks {
            let bx = (b.col * CELL) as f32;
            let by = (b.row * CELL) as f32;
            if rects_overlap(
                new_x,
                self.player.y,
                Player::WIDTH,
                Player::HEIGHT,
                bx,
                by,
                CELL as f32,
                CELL as f32,
            ) {
                if vx > 0.0 {
                    new_x = bx - Player::WIDTH;
                } else if vx < 0.0 {
                    new_x = bx + CELL as f32;
                }
            }
        }
        self.player.x = new_x;

        // Jump is edge-triggered and only from the ground.
        if intents.jump && !self.prev_jump && self.player.on_ground {
            self.player.vy = JUMP_VELOCITY;
            self.player.on_ground = false;
        }
        self.prev_jump = intents.jump;

        self.player.vy += GRAVITY * dt;
        let mut new_y = self.player.y + self.player.vy * dt;

        if new_y + Player::HEIGHT >= SCREEN_HEIGHT as f32 {
            new_y = SCREEN_HEIGHT as f32 - Player::HEIGHT;
            self.player.vy = 0.0;
        }

        for b in &self.blocks {
            let bx = (b.col * CELL) as f32;
            let by = (b.row * CELL) as f32;
            if !rects_overlap(
                self.player.x,
                new_y,
                Player::WIDTH,
                Player::HEIGHT,
                bx,
                by,
                CELL as f32,
                CELL as f32,
            ) {
                continue;
            }
            if self.player.vy > 0.0 && old_y + Player::HEIGHT <= by {
                // Landing on top.
                new_y = by - Player::HEIGHT;
                self.player.vy = 0.0;
            } else if self.player.vy < 0.0 && old_y >= by + CELL as f32 {
                // Hitting the underside.
                new_y = by + CELL as f32;
                self.player.vy = 0.0;
            }
        }
        self.player.y = new_y;

        // Grounded predicate, independent of the collision pass above.
        let foot = self.player.y + Player::HEIGHT;
        self.player.on_ground = if foot >= (SCREEN_HEIGHT - 1) as f32 {
            true
        } else {
            self.blocks.iter().any(|b| {
                let top = (b.row * CELL) as f32;
                let left = (b.col * CELL) as f32;
                (top - foot).abs() < 0.5
                    && self.player.x + Player::WIDTH > left
                    && self.player.x < left + CELL as f32
            })
        };
    }

    /// Spawn one of the five shape variants on a timer, entering from above
    /// the grid, with the powerup roll applied to a random cell.
    fn step_spawn(&mut self, dt: f32, fall_speed: f32) {
        self.spawn_timer += dt;
        if self.spawn_timer < SPAWN_INTERVAL {
            return;
        }
        self.spawn_timer = 0.0;

        let (w, h) = match self.rng.below(5) {
            0 => (1, 1),
            1 => (2, 1),
            2 => (4, 1),
            3 => (1, 2),
            _ => (1, 4),
        };
        let max_col = COLS - w;
        let col = if max_col > 0 {
            self.rng.below(max_col as u32 + 1) as i32
        } else {
            0
        };

        let mut cells = Vec::with_capacity((w * h) as usize);
        for dy in 0..h {
            for dx in 0..w {
                cells.push(ShapeCell {
                    dx,
                    dy,
                    kind: BlockKind::Normal,
                });
            }
        }

        // Guarantee check short-circuits the random roll.
        let make_powerup = self.time_since_powerup >= POWERUP_MAX_GAP
            || self.rng.below(100) < POWERUP_CHANCE_PERCENT;
        if make_powerup && !cells.is_empty() {
            let idx = self.rng.below(cells.len() as u32) as usize;
            cells[idx].kind = match self.rng.below(4) {
                0 => BlockKind::Bomb,
                1 => BlockKind::Freeze,
                2 => BlockKind::LaserH,
                _ => BlockKind::LaserV,
            };
            self.time_since_powerup = 0.0;
        }

        self.shapes.push(FallingShape {
            x: (col * CELL) as f32,
            y: -((h * CELL) as f32),
            speed: fall_speed,
            cells,
        });
    }

    /// Break the adjacent settled block per pressed direction, each gated on
    /// its own cooldown; non-Normal kinds trigger their effect at the break
    /// point. All four directions are honored within one tick.
    fn resolve_abilities(&mut self, intents: &Intents) {
        let p_col = self.player.col();
        let p_row = self.player.row();

        for dir in BreakDir::ALL {
            if !intents.breaking(dir) || !self.cooldowns.ready(dir) {
                continue;
            }
            let (tc, tr) = dir.target(p_col, p_row);
            if tc < 0 || tc >= COLS || tr < 0 || tr >= ROWS {
                continue;
            }
            let Some(idx) = self.blocks.iter().position(|b| b.col == tc && b.row == tr) else {
                continue;
            };
            let kind = self.blocks.swap_remove(idx).kind;
            self.cooldowns.arm(dir);
            self.effect_cells.push((tc, tr));

            match powerup::effect_for(kind, tc, tr) {
                Some(Effect::Freeze) => self.freeze_timer = FREEZE_DURATION,
                Some(Effect::Area(area)) => {
                    powerup::apply_area(area, &mut self.blocks, &mut self.shapes);
                    // Flash the whole affected region, not just occupied cells.
                    self.effect_cells.extend(powerup::area_cells(area));
                }
                None => {}
            }
        }
    }

    fn record_score(&mut self) {
        self.high_scores.push(self.elapsed);
        self.high_scores
            .sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        self.high_scores.truncate(MAX_HIGH_SCORES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(1)
    }

    fn idle() -> Intents {
        Intents::default()
    }

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(COLS, 16);
        assert_eq!(ROWS, 20);
    }

    #[test]
    fn test_fall_speed_ramp_is_capped() {
        let mut s = state();
        assert_eq!(s.fall_speed(), BASE_FALL_SPEED);
        s.elapsed = 6.0;
        assert_eq!(s.fall_speed(), BASE_FALL_SPEED + 30.0);
        s.elapsed = 1000.0;
        assert_eq!(s.fall_speed(), BASE_FALL_SPEED + MAX_EXTRA_FALL_SPEED);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut s = state();
        s.update(10.0, &idle());
        assert!(s.elapsed <= MAX_FRAME_DT);
    }

    #[test]
    fn test_player_lands_on_floor_and_is_grounded() {
        let mut s = state();
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        assert_eq!(s.player.y, SCREEN_HEIGHT as f32 - Player::HEIGHT);
        assert!(s.player.on_ground);
    }

    #[test]
    fn test_player_lands_on_block_top() {
        let mut s = state();
        // Drop from above the floor row so the crossing is seen.
        s.player.y = 450.0;
        let col = s.player.col();
        s.blocks.push(Block {
            col,
            row: ROWS - 1,
            kind: BlockKind::Normal,
        });
        s.blocks.push(Block {
            col: col + 1,
            row: ROWS - 1,
            kind: BlockKind::Normal,
        });
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        assert_eq!(s.player.y, ((ROWS - 1) * CELL) as f32 - Player::HEIGHT);
        assert!(s.player.on_ground);
    }

    #[test]
    fn test_jump_is_edge_triggered() {
        let mut s = state();
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        let held = Intents {
            jump: true,
            ..Intents::default()
        };
        s.step_player(0.02, &held);
        assert!(s.player.vy < 0.0);
        // Holding jump must not re-trigger after landing again.
        for _ in 0..120 {
            s.step_player(0.02, &held);
        }
        assert!(s.player.on_ground);
        assert_eq!(s.player.vy, 0.0);
    }

    #[test]
    fn test_horizontal_clamp_to_grid() {
        let mut s = state();
        let held = Intents {
            left: true,
            ..Intents::default()
        };
        for _ in 0..200 {
            s.step_player(0.02, &held);
        }
        assert_eq!(s.player.x, 0.0);
    }

    #[test]
    fn test_horizontal_pushback_against_block() {
        let mut s = state();
        // Settle on the floor; wall one cell to the right of the player.
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        let wall_col = s.player.col() + 2;
        s.blocks.push(Block {
            col: wall_col,
            row: ROWS - 1,
            kind: BlockKind::Normal,
        });
        let held = Intents {
            right: true,
            ..Intents::default()
        };
        for _ in 0..100 {
            s.step_player(0.02, &held);
        }
        assert_eq!(s.player.x, (wall_col * CELL) as f32 - Player::WIDTH);
    }

    #[test]
    fn test_spawn_timer_produces_shapes() {
        let mut s = state();
        s.step_spawn(SPAWN_INTERVAL, BASE_FALL_SPEED);
        assert_eq!(s.shapes.len(), 1);
        let spawned = &s.shapes[0];
        assert!(spawned.y < 0.0);
        assert_eq!(spawned.speed, BASE_FALL_SPEED);
        assert!(!spawned.cells.is_empty());
    }

    #[test]
    fn test_powerup_guaranteed_after_gap() {
        let mut s = state();
        s.time_since_powerup = POWERUP_MAX_GAP;
        s.step_spawn(SPAWN_INTERVAL, BASE_FALL_SPEED);
        let spawned = s.shapes.last().expect("shape spawned");
        assert!(spawned.cells.iter().any(|c| c.kind.is_powerup()));
        assert_eq!(s.time_since_powerup, 0.0);
    }

    #[test]
    fn test_break_respects_cooldown_but_directions_are_independent() {
        let mut s = state();
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        let (pc, pr) = (s.player.col(), s.player.row());
        for c in [pc - 1, pc + 1] {
            s.blocks.push(Block {
                col: c,
                row: pr,
                kind: BlockKind::Normal,
            });
        }
        let both = Intents {
            break_left: true,
            break_right: true,
            ..Intents::default()
        };
        s.resolve_abilities(&both);
        // Both directions fired in the same tick.
        assert!(!s.blocks.iter().any(|b| (b.col, b.row) == (pc - 1, pr)));
        assert!(!s.blocks.iter().any(|b| (b.col, b.row) == (pc + 1, pr)));
        // Left is cooling down: an adjacent block survives a second press.
        s.blocks.push(Block {
            col: pc - 1,
            row: pr,
            kind: BlockKind::Normal,
        });
        s.resolve_abilities(&both);
        assert!(s.blocks.iter().any(|b| (b.col, b.row) == (pc - 1, pr)));
        // After the cooldown elapses it breaks again.
        s.cooldowns.advance(1.0);
        s.resolve_abilities(&both);
        assert!(!s.blocks.iter().any(|b| (b.col, b.row) == (pc - 1, pr)));
    }

    #[test]
    fn test_breaking_bomb_flashes_whole_blast_area() {
        let mut s = state();
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        let (pc, pr) = (s.player.col(), s.player.row());
        s.blocks.push(Block {
            col: pc + 1,
            row: pr,
            kind: BlockKind::Bomb,
        });
        let brk = Intents {
            break_right: true,
            ..Intents::default()
        };
        s.resolve_abilities(&brk);
        let cells = s.take_effect_cells();
        // Every in-grid cell of the blast box flashes, occupied or not.
        assert!(cells.contains(&(pc + 1, pr)));
        assert!(cells.contains(&(pc + 1 - 5, pr - 5)));
        assert!(cells.contains(&(pc + 1 + 5, pr)));
        assert!(!cells.contains(&(pc + 1 + 6, pr)));
        // A second take yields nothing; the flash hand-off drains the list.
        assert!(s.take_effect_cells().is_empty());
    }

    #[test]
    fn test_freeze_powerup_sets_timer_and_gates_shapes() {
        let mut s = state();
        for _ in 0..60 {
            s.step_player(0.02, &idle());
        }
        let (pc, pr) = (s.player.col(), s.player.row());
        s.blocks.push(Block {
            col: pc + 1,
            row: pr,
            kind: BlockKind::Freeze,
        });
        let brk = Intents {
            break_right: true,
            ..Intents::default()
        };
        s.resolve_abilities(&brk);
        assert_eq!(s.freeze_timer, FREEZE_DURATION);
        // Frozen: a falling shape must not advance.
        s.shapes.push(FallingShape {
            x: 0.0,
            y: 60.0,
            speed: 100.0,
            cells: vec![ShapeCell {
                dx: 0,
                dy: 0,
                kind: BlockKind::Normal,
            }],
        });
        let y0 = s.shapes[0].y;
        s.update(0.02, &idle());
        assert_eq!(s.shapes[0].y, y0);
    }

    #[test]
    fn test_freeze_expiry_resumes_advance() {
        let mut s = state();
        s.freeze_timer = 0.03;
        s.shapes.push(FallingShape {
            x: 0.0,
            y: 60.0,
            speed: 100.0,
            cells: vec![ShapeCell {
                dx: 0,
                dy: 0,
                kind: BlockKind::Normal,
            }],
        });
        s.update(0.02, &idle());
        assert_eq!(s.shapes[0].y, 60.0);
        s.update(0.02, &idle());
        assert!(!s.frozen());
        let y_before = s.shapes[0].y;
        s.update(0.02, &idle());
        assert!(s.shapes[0].y > y_before);
    }

    #[test]
    fn test_game_over_is_monotonic_until_restart() {
        let mut s = state();
        // A floor-supported column reaching the top row.
        for row in 0..ROWS {
            s.blocks.push(Block {
                col: 0,
                row,
                kind: BlockKind::Normal,
            });
        }
        s.update(0.02, &idle());
        assert!(s.game_over);
        assert_eq!(s.high_scores.len(), 1);
        let snapshot_blocks = s.blocks.clone();
        let snapshot_player_y = s.player.y;
        for _ in 0..20 {
            s.update(0.02, &idle());
        }
        assert!(s.game_over);
        assert_eq!(s.blocks, snapshot_blocks);
        assert_eq!(s.player.y, snapshot_player_y);

        let restart = Intents {
            restart: true,
            ..Intents::default()
        };
        s.update(0.02, &restart);
        assert!(!s.game_over);
        assert!(s.blocks.is_empty());
        assert!(s.shapes.is_empty());
        // High scores survive the reset.
        assert_eq!(s.high_scores.len(), 1);
    }

    #[test]
    fn test_high_scores_sorted_descending_and_bounded() {
        let mut s = state();
        for t in [3.0, 7.0, 1.0, 9.0, 5.0, 6.0, 2.0] {
            s.elapsed = t;
            s.record_score();
        }
        assert_eq!(s.high_scores.len(), MAX_HIGH_SCORES);
        assert_eq!(s.high_scores, vec![9.0, 7.0, 6.0, 5.0, 3.0]);
    }
}
