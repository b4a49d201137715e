//! Layout and drawing: playfield, sidebar, break flash, game over overlay.

use crate::game::{BlockKind, CELL, COLS, FREEZE_DURATION, GameState, Player, ROWS};
use crate::powerup::{ABILITY_COOLDOWN, BreakDir};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each grid cell is 2 terminal columns wide and 1 row tall, which is close
/// to square in most fonts.
const CELL_W: u16 = 2;
const CELL_H: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the break flash fade (TachyonFX) in ms.
const BREAK_FLASH_MS: u32 = 350;

/// Playfield size in terminal cells including the border.
fn playfield_size() -> (u16, u16) {
    (COLS as u16 * CELL_W + 2, ROWS as u16 * CELL_H + 2)
}

/// Playfield inner rect (board only, no border); matches the draw layout.
fn playfield_board_rect(area: Rect) -> Rect {
    let (pw, ph) = playfield_size();
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    Rect {
        x: x + 1,
        y: y + 1,
        width: (COLS as u16 * CELL_W).min(area.width.saturating_sub(2)),
        height: (ROWS as u16 * CELL_H).min(area.height.saturating_sub(2)),
    }
}

/// Break flash effect: the cells destroyed by abilities fade from white back
/// to the board colours.
pub struct BreakFlash {
    effect: Option<Effect>,
    process_time: Option<Instant>,
    cells: Vec<(i32, i32)>,
}

impl BreakFlash {
    pub fn new() -> Self {
        Self {
            effect: None,
            process_time: None,
            cells: Vec::new(),
        }
    }

    /// Restart the flash over the given grid cells.
    pub fn trigger(&mut self, cells: Vec<(i32, i32)>) {
        if cells.is_empty() {
            return;
        }
        self.cells = cells;
        self.effect = None;
        self.process_time = None;
    }

    fn active(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Build (lazily) and process the fade over the flashed cells.
    fn apply(&mut self, frame: &mut Frame, theme: &Theme, area: Rect, now: Instant) {
        let board_rect = playfield_board_rect(area);
        let delta = self
            .process_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        self.process_time = Some(now);

        if self.effect.is_none() {
            let mut set = HashSet::new();
            for &(col, row) in &self.cells {
                let x0 = board_rect.x + col as u16 * CELL_W;
                let y0 = board_rect.y + row as u16 * CELL_H;
                for bx in x0..(x0 + CELL_W).min(board_rect.x + board_rect.width) {
                    for by in y0..(y0 + CELL_H).min(board_rect.y + board_rect.height) {
                        set.insert((bx, by));
                    }
                }
            }
            let filter =
                CellFilter::PositionFn(ref_count(move |pos: Position| set.contains(&(pos.x, pos.y))));
            let bg = theme.bg;
            let effect = fx::fade_to(bg, bg, (BREAK_FLASH_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board_rect);
            self.effect = Some(effect);
        }

        if let Some(effect) = &mut self.effect {
            frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
            if effect.done() {
                self.cells.clear();
                self.effect = None;
                self.process_time = None;
            }
        }
    }
}

impl Default for BreakFlash {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw the current frame: board + sidebar, the break flash when one is
/// running, and the game-over overlay on top once the run ends.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    flash: &mut BreakFlash,
    now: Instant,
    no_animation: bool,
) {
    let (pw, ph) = playfield_size();
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let active_area = vert_chunks[1];

    let (playfield_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(active_area);
        (inner[0], inner[1])
    };

    draw_playfield(frame, state, theme, playfield_area);
    draw_sidebar(frame, state, theme, sidebar_area);

    if flash.active() && !no_animation {
        flash.apply(frame, theme, area, now);
    }

    if state.game_over {
        draw_game_over(frame, state, theme, area);
    }
}

fn glyph_for(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Normal => "██",
        BlockKind::Bomb => "◎ ",
        BlockKind::Freeze => "❄ ",
        BlockKind::LaserH => "══",
        BlockKind::LaserV => "║ ",
    }
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title = if state.frozen() {
        format!(" blockdrop  {:6.1}s  FROZEN ", state.elapsed)
    } else {
        format!(" blockdrop  {:6.1}s ", state.elapsed)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: (COLS as u16 * CELL_W).min(inner.width),
        height: (ROWS as u16 * CELL_H).min(inner.height),
    };

    let buf = frame.buffer_mut();

    // Background.
    for row in 0..ROWS as u16 {
        for col in 0..COLS as u16 {
            let rx = board_rect.x + col * CELL_W;
            let ry = board_rect.y + row * CELL_H;
            if rx + 1 < board_rect.x + board_rect.width && ry < board_rect.y + board_rect.height {
                buf.set_string(rx, ry, "  ", Style::default().bg(theme.bg));
            }
        }
    }

    let mut put = |col: i32, row: i32, glyph: &str, color: Color| {
        if col < 0 || col >= COLS || row < 0 || row >= ROWS {
            return;
        }
        let rx = board_rect.x + col as u16 * CELL_W;
        let ry = board_rect.y + row as u16 * CELL_H;
        if rx + 1 < board_rect.x + board_rect.width && ry < board_rect.y + board_rect.height {
            buf.set_string(rx, ry, glyph, Style::default().fg(color).bg(theme.bg));
        }
    };

    for b in &state.blocks {
        put(b.col, b.row, glyph_for(b.kind), theme.block_color(b.kind));
    }

    // Falling shapes render at their quantized cell, powerup cells keep
    // their own glyph and colour.
    for s in &state.shapes {
        let (base_col, base_row) = s.origin_cell();
        for c in &s.cells {
            put(
                base_col + c.dx,
                base_row + c.dy,
                glyph_for(c.kind),
                theme.falling_color(c.kind),
            );
        }
    }

    put(
        state.player.col(),
        ((state.player.y + Player::HEIGHT - 1.0) / CELL as f32).floor() as i32,
        "▣ ",
        theme.player,
    );
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Abilities (border + 4 gauges + title)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Freeze (border + title + gauge)
            Constraint::Length(1), // gap
            Constraint::Length(8), // Best times
            Constraint::Length(1), // gap
            Constraint::Length(7), // Legend
        ])
        .split(area);

    // --- Abilities (own border): one cooldown gauge per direction ---
    let abilities_outer = chunks[0];
    let abilities_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let abilities_inner = abilities_block.inner(abilities_outer);
    abilities_block.render(abilities_outer, frame.buffer_mut());
    let ability_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(abilities_inner);
    Paragraph::new(Line::from(Span::styled("Break", title_style)))
        .render(ability_layout[0], frame.buffer_mut());
    let labels = [
        (BreakDir::Left, "←"),
        (BreakDir::Right, "→"),
        (BreakDir::Up, "↑"),
        (BreakDir::Down, "↓"),
    ];
    for (i, (dir, label)) in labels.iter().enumerate() {
        let row = ability_layout[i + 1];
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(2), Constraint::Fill(1)])
            .split(row);
        let remaining = state.cooldowns.remaining(*dir);
        let ready = remaining <= 0.0;
        let label_style = if ready {
            Style::default().fg(theme.title)
        } else {
            Style::default().fg(theme.inactive_fg)
        };
        Paragraph::new(Line::from(Span::styled(*label, label_style)))
            .render(split[0], frame.buffer_mut());
        let ratio = f64::from(1.0 - (remaining / ABILITY_COOLDOWN).clamp(0.0, 1.0));
        let bar_color = if ready { Color::Green } else { Color::Yellow };
        Gauge::default()
            .ratio(ratio)
            .gauge_style(Style::default().fg(bar_color).bg(theme.bg))
            .label("")
            .render(split[1], frame.buffer_mut());
    }

    // --- Freeze (own border): remaining freeze time ---
    let freeze_outer = chunks[2];
    let freeze_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let freeze_inner = freeze_block.inner(freeze_outer);
    freeze_block.render(freeze_outer, frame.buffer_mut());
    let freeze_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(freeze_inner);
    Paragraph::new(Line::from(Span::styled("Freeze", title_style)))
        .render(freeze_layout[0], frame.buffer_mut());
    let freeze_ratio = f64::from((state.freeze_timer / FREEZE_DURATION).clamp(0.0, 1.0));
    Gauge::default()
        .ratio(freeze_ratio)
        .gauge_style(Style::default().fg(theme.freeze).bg(theme.bg))
        .label("")
        .render(freeze_layout[1], frame.buffer_mut());

    // --- Best times (own border) ---
    let best_outer = chunks[4];
    let best_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let best_inner = best_block.inner(best_outer);
    best_block.render(best_outer, frame.buffer_mut());
    let mut best_lines = vec![Line::from(Span::styled("Best times", title_style))];
    if state.high_scores.is_empty() {
        best_lines.push(Line::from(Span::styled("-", fg_style)));
    } else {
        for (i, t) in state.high_scores.iter().enumerate() {
            best_lines.push(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), title_style),
                Span::styled(format!("{t:.2} s"), fg_style),
            ]));
        }
    }
    Paragraph::new(ratatui::text::Text::from(best_lines)).render(best_inner, frame.buffer_mut());

    // --- Legend (own border) ---
    let legend_outer = chunks[6];
    let legend_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let legend_inner = legend_block.inner(legend_outer);
    legend_block.render(legend_outer, frame.buffer_mut());
    let legend_lines = vec![
        Line::from(Span::styled("Powerups", title_style)),
        Line::from(vec![
            Span::styled("◎ ", Style::default().fg(theme.bomb)),
            Span::styled("bomb", fg_style),
        ]),
        Line::from(vec![
            Span::styled("❄ ", Style::default().fg(theme.freeze)),
            Span::styled("freeze", fg_style),
        ]),
        Line::from(vec![
            Span::styled("══ ", Style::default().fg(theme.laser_h)),
            Span::styled("row laser", fg_style),
        ]),
        Line::from(vec![
            Span::styled("║  ", Style::default().fg(theme.laser_v)),
            Span::styled("column laser", fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(legend_lines))
        .render(legend_inner, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup_w = 34u16;
    let popup_h = (10 + state.high_scores.len() as u16).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h,
    };
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Time: {:.2} s ", state.elapsed),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
    ];
    if !state.high_scores.is_empty() {
        lines.push(Line::from(Span::styled(
            " Best times ",
            Style::default().fg(theme.title).bold(),
        )));
        for (i, t) in state.high_scores.iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!(" {}. {t:.2} s ", i + 1),
                Style::default().fg(theme.main_fg),
            )));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        " R — Restart    Q — Quit ",
        Style::default().fg(theme.main_fg),
    )));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(
                " blockdrop ",
                Style::default().fg(theme.title),
            )),
    );
    p.render(popup, frame.buffer_mut());
}
