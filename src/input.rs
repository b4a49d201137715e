//! Key bindings and held-key tracking.
//!
//! Movement and breaking are held actions, so the mapping feeds a press or
//! release into [`HeldActions`]; one-shot actions (restart, quit) are edge
//! events handled by the app loop directly.

use crate::powerup::BreakDir;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    BreakLeft,
    BreakRight,
    BreakUp,
    BreakDown,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. WASD moves, space jumps, arrows break.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('r') if no_mod => Action::Restart,
        KeyCode::Char('a') if no_mod => Action::MoveLeft,
        KeyCode::Char('d') if no_mod => Action::MoveRight,
        KeyCode::Char('w') | KeyCode::Char(' ') if no_mod => Action::Jump,
        KeyCode::Left => Action::BreakLeft,
        KeyCode::Right => Action::BreakRight,
        KeyCode::Up => Action::BreakUp,
        KeyCode::Down => Action::BreakDown,
        _ => Action::None,
    }
}

/// The per-tick input snapshot consumed by the simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Intents {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub break_left: bool,
    pub break_right: bool,
    pub break_up: bool,
    pub break_down: bool,
    pub restart: bool,
}

impl Intents {
    pub fn breaking(&self, dir: BreakDir) -> bool {
        match dir {
            BreakDir::Left => self.break_left,
            BreakDir::Right => self.break_right,
            BreakDir::Up => self.break_up,
            BreakDir::Down => self.break_down,
        }
    }
}

/// Held-action state fed by key press/release events. Terminals without
/// release reporting degrade to press-only, which still registers each tick
/// because repeats arrive as presses.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeldActions {
    left: bool,
    right: bool,
    jump: bool,
    break_left: bool,
    break_right: bool,
    break_up: bool,
    break_down: bool,
}

impl HeldActions {
    pub fn set(&mut self, action: Action, held: bool) {
        match action {
            Action::MoveLeft => self.left = held,
            Action::MoveRight => self.right = held,
            Action::Jump => self.jump = held,
            Action::BreakLeft => self.break_left = held,
            Action::BreakRight => self.break_right = held,
            Action::BreakUp => self.break_up = held,
            Action::BreakDown => self.break_down = held,
            Action::Restart | Action::Quit | Action::None => {}
        }
    }

    pub fn press(&mut self, action: Action) {
        self.set(action, true);
    }

    pub fn release(&mut self, action: Action) {
        self.set(action, false);
    }

    /// Snapshot for one simulation tick; `restart` is layered on by the app
    /// loop since it is an edge event.
    pub fn snapshot(&self, restart: bool) -> Intents {
        Intents {
            left: self.left,
            right: self.right,
            jump: self.jump,
            break_left: self.break_left,
            break_right: self.break_right,
            break_up: self.break_up,
            break_down: self.break_down,
            restart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_movement_and_jump_bindings() {
        assert_eq!(key_to_action(key(KeyCode::Char('a'))), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('d'))), Action::MoveRight);
        assert_eq!(key_to_action(key(KeyCode::Char('w'))), Action::Jump);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Jump);
    }

    #[test]
    fn test_break_bindings_are_arrows() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::BreakLeft);
        assert_eq!(key_to_action(key(KeyCode::Right)), Action::BreakRight);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::BreakUp);
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::BreakDown);
    }

    #[test]
    fn test_quit_and_restart() {
        assert_eq!(key_to_action(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(key_to_action(key(KeyCode::Char('r'))), Action::Restart);
    }

    #[test]
    fn test_alt_modified_keys_ignored() {
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_held_actions_round_trip() {
        let mut held = HeldActions::default();
        held.press(Action::MoveLeft);
        held.press(Action::BreakUp);
        let i = held.snapshot(false);
        assert!(i.left && i.break_up);
        assert!(!i.right && !i.jump && !i.restart);
        held.release(Action::MoveLeft);
        assert!(!held.snapshot(false).left);
        assert!(held.snapshot(true).restart);
    }

    #[test]
    fn test_breaking_maps_directions() {
        let i = Intents {
            break_down: true,
            ..Intents::default()
        };
        assert!(i.breaking(BreakDir::Down));
        assert!(!i.breaking(BreakDir::Up));
        assert!(!i.breaking(BreakDir::Left));
    }
}
