//! App: terminal init, main loop, event handling, score persistence.

use crate::game::GameState;
use crate::highscores;
use crate::input::{Action, HeldActions, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, BreakFlash};
use crate::Args;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

pub struct App {
    args: Args,
    theme: Theme,
    state: GameState,
    held: HeldActions,
    flash: BreakFlash,
    last_tick: Instant,
    /// True once the current round's final time has been written to disk.
    score_saved: bool,
}

impl App {
    pub fn new(args: Args, theme: Theme, seed: u32) -> Self {
        let mut state = GameState::new(seed);
        state.high_scores = highscores::load_high_scores();
        Self {
            args,
            theme,
            state,
            held: HeldActions::default(),
            flash: BreakFlash::new(),
            last_tick: Instant::now(),
            score_saved: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Attempt to enable enhanced keyboard for Release events
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        self.last_tick = Instant::now();
        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));

        loop {
            let now = Instant::now();
            let mut restart = false;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let action = key_to_action(key);
                        match key.kind {
                            KeyEventKind::Press | KeyEventKind::Repeat => {
                                match action {
                                    Action::Quit => return Ok(()),
                                    Action::Restart => restart = true,
                                    _ => self.held.press(action),
                                }
                            }
                            KeyEventKind::Release => self.held.release(action),
                        }
                    }
                }
            }

            let now = Instant::now();
            let dt = now.duration_since(self.last_tick).as_secs_f32();
            self.last_tick = now;

            let was_game_over = self.state.game_over;
            let intents = self.held.snapshot(restart);
            self.state.update(dt, &intents);

            if self.state.game_over && !was_game_over && !self.score_saved {
                // The run just ended; persist the updated best times. A failed
                // write must not kill the session.
                let _ = highscores::save_high_scores(&self.state.high_scores);
                self.score_saved = true;
            }
            if !self.state.game_over {
                self.score_saved = false;
            }

            let removed = self.state.take_effect_cells();
            if !removed.is_empty() {
                self.flash.trigger(removed);
            }

            terminal.draw(|f| {
                ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    f.area(),
                    &mut self.flash,
                    now,
                    self.args.no_animation,
                );
            })?;
        }
    }
}
