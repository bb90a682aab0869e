//! App: terminal init, main loop, frame clock and key handling.

use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::piece::Rotation;
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Delay before horizontal movement starts repeating when a key is held.
const MOVE_REPEAT_DELAY_MS: u64 = 100;
/// Time between repeated moves while holding.
const MOVE_REPEAT_INTERVAL_MS: u64 = 50;
/// Event poll timeout; caps the render rate at ~60 FPS.
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

pub struct App {
    args: Args,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    /// Previous frame timestamp; refreshed every loop pass so resuming from a
    /// pause or a transition never produces one giant delta.
    last_frame: Instant,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
}

/// Wall-clock entropy for runs that did not pin --seed.
fn entropy_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x1234_5678)
}

impl App {
    pub fn new(args: Args, theme: Theme) -> Result<Self> {
        let config = GameConfig {
            width: args.width,
            height: args.height,
            seed: args.seed.unwrap_or_else(entropy_seed),
        };
        let state = GameState::new(&config);
        Ok(Self {
            args,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            last_frame: Instant::now(),
            repeat_state: None,
            last_repeat_fire: None,
        })
    }

    /// Fully re-initialize the session: fresh state, no leftover repeat or
    /// clock carry-over. A pinned --seed replays the same piece sequence.
    fn reset_game(&mut self) {
        let config = GameConfig {
            width: self.args.width,
            height: self.args.height,
            seed: self.args.seed.unwrap_or_else(entropy_seed),
        };
        self.state = GameState::new(&config);
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_frame = Instant::now();
        self.repeat_state = None;
        self.last_repeat_fire = None;
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::MoveLeft => self.state.move_piece(-1),
            Action::MoveRight => self.state.move_piece(1),
            Action::RotateCw => self.state.rotate(Rotation::Clockwise),
            Action::RotateCcw => self.state.rotate(Rotation::CounterClockwise),
            Action::SoftDrop => self.state.soft_drop_start(),
            Action::HardDrop => {
                self.state.hard_drop();
                self.repeat_state = None;
            }
            Action::Pause | Action::Quit | Action::None => {}
        }
    }

    /// Held-key auto-shift: after the initial delay, re-fire the held movement
    /// at a fixed interval. Rotation and drops never reach here.
    fn tick_repeat(&mut self) {
        let now = Instant::now();
        let (action, first) = match self.repeat_state {
            Some(s) => s,
            None => return,
        };
        if !action.repeats() {
            return;
        }
        if now.duration_since(first) < Duration::from_millis(MOVE_REPEAT_DELAY_MS) {
            return;
        }
        let next =
            self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(MOVE_REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
                PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events are needed to stop soft drop and held movement.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.last_frame = Instant::now();
        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let delta_ms = now.duration_since(self.last_frame).as_millis() as u64;
            self.last_frame = now;

            if self.screen == Screen::Playing && !self.paused {
                self.state.tick(delta_ms);
                self.tick_repeat();
                if self.state.game_over {
                    self.enter_game_over();
                }
            }

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    f.area(),
                );
            })?;

            if event::poll(Duration::from_millis(FRAME_MS))? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn enter_game_over(&mut self) {
        self.screen = Screen::GameOver;
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.state.soft_drop_stop();
    }

    /// Handle one key event; returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let action = key_to_action(key);

        if key.kind != KeyEventKind::Press {
            if key.kind == KeyEventKind::Release {
                if self.repeat_state.map(|(a, _)| a) == Some(action) {
                    self.repeat_state = None;
                    self.last_repeat_fire = None;
                }
                if action == Action::SoftDrop {
                    self.state.soft_drop_stop();
                }
            }
            return false;
        }
        // OS repeats of an action we already auto-repeat are noise.
        if self.repeat_state.map(|(a, _)| a) == Some(action) {
            return false;
        }

        match self.screen {
            Screen::Playing => {
                if self.paused {
                    match action {
                        Action::Pause => self.paused = false,
                        Action::Quit => return true,
                        _ => {}
                    }
                } else {
                    match action {
                        Action::Quit => return true,
                        Action::Pause => {
                            self.paused = true;
                            self.state.soft_drop_stop();
                            self.repeat_state = None;
                            self.last_repeat_fire = None;
                        }
                        _ => {
                            self.apply_action(action);
                            if action.repeats() {
                                self.repeat_state = Some((action, Instant::now()));
                                self.last_repeat_fire = None;
                            }
                        }
                    }
                    if self.state.game_over {
                        self.enter_game_over();
                    }
                }
            }
            Screen::GameOver => {
                if action == Action::Quit {
                    return true;
                }
                if matches!(key.code, KeyCode::Char('r' | 'R')) {
                    self.reset_game();
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn app() -> App {
        let args = Args {
            width: 10,
            height: 20,
            theme: None,
            palette: crate::Palette::Normal,
            seed: Some(1),
        };
        App::new(args, Theme::default()).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            kind: KeyEventKind::Release,
            ..press(code)
        }
    }

    // Terminals without enhanced keyboard support deliver OS auto-repeat of a
    // held key as further Press events; they must not stack extra drops on
    // top of the fast gravity interval.
    #[test]
    fn test_down_key_os_repeat_drops_once() {
        let mut app = app();
        let y0 = app.state.player.y;
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Down));
        assert_eq!(app.state.player.y, y0 + 1);
        assert!(app.state.soft_drop_held);
        app.handle_key(release(KeyCode::Down));
        assert!(!app.state.soft_drop_held);
    }

    #[test]
    fn test_movement_press_sets_repeat_state() {
        let mut app = app();
        app.handle_key(press(KeyCode::Left));
        assert_eq!(app.repeat_state.map(|(a, _)| a), Some(Action::MoveLeft));
        app.handle_key(release(KeyCode::Left));
        assert_eq!(app.repeat_state, None);
    }
}
