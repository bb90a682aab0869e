//! Key bindings: arrows plus the classic w/z rotate pair.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
    Pause,
    Quit,
    None,
}

impl Action {
    /// Directional movement auto-repeats while held; rotation and hard drop
    /// fire once per press.
    pub fn repeats(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight)
    }
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('w') => Action::RotateCw,
        KeyCode::Char('z') => Action::RotateCcw,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Char(' ') => Action::HardDrop,
        _ => Action::None,
    }
}
