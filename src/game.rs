//! Game state: arena, active piece, wall kicks, scoring, stages, drop clock.

use crate::GameConfig;
use crate::grid::Arena;
use crate::piece::{Matrix, PieceKind, PieceRng, Rotation, rotate_matrix};

/// Gravity interval at stage 1, in ms.
pub const BASE_DROP_INTERVAL_MS: u64 = 1000;
/// Interval reduction per stage advance.
pub const STAGE_SPEED_INCREASE_MS: u64 = 50;
/// Floor for the gravity interval.
pub const MIN_DROP_INTERVAL_MS: u64 = 100;
/// Gravity interval while the soft-drop key is held.
pub const FAST_DROP_INTERVAL_MS: u64 = 50;
/// Lines required to clear stage 1; each stage adds 2 more.
pub const INITIAL_LINES_PER_STAGE: u32 = 2;
/// Real-time length of the stage-clear announcement.
pub const STAGE_CLEAR_PAUSE_MS: u64 = 2000;

/// Points for clearing 1..=4+ rows at once, before the stage multiplier.
const CLEAR_POINTS: [u32; 5] = [0, 10, 30, 50, 100];

/// Lines needed to finish `stage`.
pub fn lines_required_for(stage: u32) -> u32 {
    INITIAL_LINES_PER_STAGE + stage.saturating_sub(1) * 2
}

/// Gravity interval for `stage`, clamped to the floor.
pub fn drop_interval_for(stage: u32) -> u64 {
    BASE_DROP_INTERVAL_MS
        .saturating_sub(u64::from(stage.saturating_sub(1)) * STAGE_SPEED_INCREASE_MS)
        .max(MIN_DROP_INTERVAL_MS)
}

/// The active piece: an owned shape copy plus its top-left arena position.
#[derive(Debug, Clone)]
pub struct Player {
    pub matrix: Matrix,
    pub x: i32,
    pub y: i32,
    pub score: u32,
}

/// Stage transition machine. `ClearPending` exists so the clear announcement
/// gets one drawn frame before the countdown starts; gravity is suspended in
/// every phase but `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Running,
    ClearPending,
    Paused { remaining_ms: u64 },
    Advancing,
}

/// One game session. Owns the arena, the single active piece, stage and clock
/// state; all mutation goes through its methods, so two sessions never share
/// anything.
#[derive(Debug)]
pub struct GameState {
    pub arena: Arena,
    pub player: Player,
    pub stage: u32,
    pub lines_cleared_stage: u32,
    pub lines_required: u32,
    pub drop_interval_ms: u64,
    pub phase: StagePhase,
    pub game_over: bool,
    pub soft_drop_held: bool,
    drop_accum_ms: u64,
    rng: PieceRng,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let mut state = Self {
            arena: Arena::new(config.width, config.height),
            player: Player {
                matrix: Vec::new(),
                x: 0,
                y: 0,
                score: 0,
            },
            stage: 1,
            lines_cleared_stage: 0,
            lines_required: lines_required_for(1),
            drop_interval_ms: drop_interval_for(1),
            phase: StagePhase::Running,
            game_over: false,
            soft_drop_held: false,
            drop_accum_ms: 0,
            rng: PieceRng::new(config.seed),
        };
        let first = state.rng.pick();
        state.spawn(first);
        state
    }

    /// True while player commands and gravity apply.
    fn accepting_input(&self) -> bool {
        !self.game_over && self.phase == StagePhase::Running
    }

    /// Replace the active piece with a freshly spawned `kind`, horizontally
    /// centred at the top. Returns false on game over (the fresh piece already
    /// collides); score and stage are left untouched for the host to read.
    fn spawn(&mut self, kind: PieceKind) -> bool {
        let matrix = kind.template();
        let shape_w = matrix[0].len() as i32;
        self.player.matrix = matrix;
        self.player.x = self.arena.width() as i32 / 2 - shape_w / 2;
        self.player.y = 0;
        if self
            .arena
            .collides(&self.player.matrix, self.player.x, self.player.y)
        {
            self.game_over = true;
            return false;
        }
        true
    }

    /// Spawn the next random piece, unless a stage transition is pending; the
    /// transition spawns on its own once the arena has been reset.
    fn spawn_next(&mut self) -> bool {
        if matches!(
            self.phase,
            StagePhase::ClearPending | StagePhase::Paused { .. }
        ) {
            return true;
        }
        let kind = self.rng.pick();
        self.spawn(kind)
    }

    /// Horizontal move; reverted if it collides.
    pub fn move_piece(&mut self, dx: i32) {
        if !self.accepting_input() {
            return;
        }
        self.player.x += dx;
        if self
            .arena
            .collides(&self.player.matrix, self.player.x, self.player.y)
        {
            self.player.x -= dx;
        }
    }

    /// Rotate the active piece, kicking horizontally off walls if needed.
    ///
    /// The probe alternates sign while growing: +1, -2, +3, -4, ... applied to
    /// x only. Once the magnitude exceeds ceil(shape_width / 2) + 1 the
    /// rotation is abandoned and both shape and position revert, so the piece
    /// is never left colliding.
    pub fn rotate(&mut self, dir: Rotation) {
        if !self.accepting_input() {
            return;
        }
        let original = self.player.matrix.clone();
        let initial_x = self.player.x;
        rotate_matrix(&mut self.player.matrix, dir);
        let limit = (self.player.matrix[0].len() as i32 + 1) / 2 + 1;
        let mut offset = 1;
        while self
            .arena
            .collides(&self.player.matrix, self.player.x, self.player.y)
        {
            self.player.x += offset;
            offset = -(offset + if offset > 0 { 1 } else { -1 });
            if offset.abs() > limit {
                self.player.matrix = original;
                self.player.x = initial_x;
                return;
            }
        }
    }

    /// One-step descent. A blocked step locks the piece (merge, sweep, score,
    /// next spawn). Either way the gravity accumulator restarts.
    pub fn soft_drop(&mut self) {
        if !self.accepting_input() {
            return;
        }
        self.player.y += 1;
        if self
            .arena
            .collides(&self.player.matrix, self.player.x, self.player.y)
        {
            self.player.y -= 1;
            self.lock_piece();
        }
        self.drop_accum_ms = 0;
    }

    /// Fall straight to rest, then lock.
    pub fn hard_drop(&mut self) {
        if !self.accepting_input() {
            return;
        }
        loop {
            self.player.y += 1;
            if self
                .arena
                .collides(&self.player.matrix, self.player.x, self.player.y)
            {
                self.player.y -= 1;
                break;
            }
        }
        self.lock_piece();
        self.drop_accum_ms = 0;
    }

    pub fn soft_drop_start(&mut self) {
        if !self.accepting_input() {
            return;
        }
        // OS auto-repeat re-delivers the press while the key is held; the
        // fast interval is already active, so only the first press steps.
        if self.soft_drop_held {
            return;
        }
        self.soft_drop_held = true;
        // One immediate step on press; holding rides the fast interval.
        self.soft_drop();
    }

    pub fn soft_drop_stop(&mut self) {
        self.soft_drop_held = false;
    }

    /// Merge the piece into the arena, sweep full rows, apply scoring and the
    /// stage-clear check, then request the next piece.
    fn lock_piece(&mut self) {
        for (sy, row) in self.player.matrix.iter().enumerate() {
            for (sx, &code) in row.iter().enumerate() {
                if code == 0 {
                    continue;
                }
                let ax = self.player.x + sx as i32;
                let ay = self.player.y + sy as i32;
                if ax >= 0 && ay >= 0 {
                    // set_cell drops anything past the far edges.
                    self.arena.set_cell(ax as usize, ay as usize, code);
                }
            }
        }
        let cleared = self.arena.clear_full_rows();
        if cleared > 0 {
            let points = CLEAR_POINTS[(cleared as usize).min(CLEAR_POINTS.len() - 1)];
            self.player.score += points * self.stage;
            self.lines_cleared_stage += cleared;
            if self.lines_cleared_stage >= self.lines_required && self.phase == StagePhase::Running
            {
                self.phase = StagePhase::ClearPending;
            }
        }
        self.spawn_next();
    }

    /// Advance elapsed time. Gravity accumulates only while `Running`; the
    /// accumulator resets to zero on each drop rather than carrying remainder,
    /// so a long stall never triggers a burst of catch-up drops. The other
    /// phases walk the stage transition: one announced frame, a counted 2 s
    /// pause, then the advance itself.
    pub fn tick(&mut self, delta_ms: u64) {
        if self.game_over {
            return;
        }
        match self.phase {
            StagePhase::Running => {
                self.drop_accum_ms += delta_ms;
                let interval = if self.soft_drop_held {
                    FAST_DROP_INTERVAL_MS
                } else {
                    self.drop_interval_ms
                };
                if self.drop_accum_ms > interval {
                    self.soft_drop();
                }
            }
            StagePhase::ClearPending => {
                self.phase = StagePhase::Paused {
                    remaining_ms: STAGE_CLEAR_PAUSE_MS,
                };
            }
            StagePhase::Paused { remaining_ms } => match remaining_ms.checked_sub(delta_ms) {
                Some(left) if left > 0 => {
                    self.phase = StagePhase::Paused { remaining_ms: left };
                }
                _ => {
                    self.phase = StagePhase::Advancing;
                    self.advance_stage();
                }
            },
            StagePhase::Advancing => {}
        }
    }

    /// Next stage: bump the number, recompute requirement and speed, wipe the
    /// arena, and resume with a fresh piece and a zeroed clock.
    fn advance_stage(&mut self) {
        self.stage += 1;
        self.lines_cleared_stage = 0;
        self.lines_required = lines_required_for(self.stage);
        self.drop_interval_ms = drop_interval_for(self.stage);
        self.arena.reset_all();
        self.drop_accum_ms = 0;
        self.soft_drop_held = false;
        let kind = self.rng.pick();
        if self.spawn(kind) {
            self.phase = StagePhase::Running;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            width: 10,
            height: 20,
            seed: 1,
        }
    }

    fn state_with_piece(kind: PieceKind) -> GameState {
        let mut state = GameState::new(&config());
        set_piece(&mut state, kind);
        state
    }

    fn set_piece(state: &mut GameState, kind: PieceKind) {
        state.player.matrix = kind.template();
        state.player.x = state.arena.width() as i32 / 2 - state.player.matrix[0].len() as i32 / 2;
        state.player.y = 0;
    }

    fn fill_row_except(state: &mut GameState, y: usize, gap_x: usize) {
        for x in 0..state.arena.width() {
            if x != gap_x {
                state.arena.set_cell(x, y, 1);
            }
        }
    }

    #[test]
    fn test_new_centres_first_piece() {
        let state = GameState::new(&config());
        assert_eq!(state.player.y, 0);
        let shape_w = state.player.matrix[0].len() as i32;
        assert_eq!(state.player.x, 5 - shape_w / 2);
        assert_eq!(state.stage, 1);
        assert_eq!(state.lines_required, 2);
        assert_eq!(state.drop_interval_ms, 1000);
    }

    #[test]
    fn test_move_reverts_at_wall() {
        let mut state = state_with_piece(PieceKind::O);
        state.player.x = 0;
        state.move_piece(-1);
        assert_eq!(state.player.x, 0);
        state.move_piece(1);
        assert_eq!(state.player.x, 1);
    }

    #[test]
    fn test_hard_drop_lands_on_floor_and_respawns() {
        let mut state = state_with_piece(PieceKind::O);
        state.hard_drop();
        // O is a full 2x2 at x=4: it rests on the bottom row.
        assert_eq!(state.arena.cell(4, 18), 2);
        assert_eq!(state.arena.cell(5, 18), 2);
        assert_eq!(state.arena.cell(4, 19), 2);
        assert_eq!(state.arena.cell(5, 19), 2);
        // A fresh piece is back at the top centre.
        assert_eq!(state.player.y, 0);
        assert!(!state.game_over);
    }

    #[test]
    fn test_vertical_i_fills_gap_and_clears_one_row() {
        let mut state = state_with_piece(PieceKind::I);
        fill_row_except(&mut state, 19, 7);
        state.player.x = 6; // template column sits at offset 1
        state.hard_drop();
        assert_eq!(state.lines_cleared_stage, 1);
        assert_eq!(state.player.score, 10);
        // The three leftover I cells shifted down one row.
        assert_eq!(state.arena.cell(7, 19), 5);
        assert_eq!(state.arena.cell(7, 18), 5);
        assert_eq!(state.arena.cell(7, 17), 5);
        assert_eq!(state.arena.cell(0, 19), 0, "swept row gone");
    }

    #[test]
    fn test_score_scales_with_stage() {
        let mut state = state_with_piece(PieceKind::I);
        state.stage = 3;
        state.lines_required = 6;
        fill_row_except(&mut state, 19, 7);
        state.player.x = 6;
        state.hard_drop();
        assert_eq!(state.player.score, 30, "1 row at stage 3 = 10 x 3");
    }

    #[test]
    fn test_quad_clear_scores_100_per_stage() {
        let mut state = state_with_piece(PieceKind::I);
        state.stage = 2;
        state.lines_required = 6;
        for y in 16..20 {
            fill_row_except(&mut state, y, 7);
        }
        state.player.x = 6;
        state.hard_drop();
        assert_eq!(state.player.score, 200);
        assert_eq!(state.lines_cleared_stage, 4);
    }

    #[test]
    fn test_stage_math() {
        assert_eq!(lines_required_for(1), 2);
        assert_eq!(lines_required_for(2), 4);
        assert_eq!(drop_interval_for(3), 900);
        assert_eq!(drop_interval_for(19), 100);
        assert_eq!(drop_interval_for(25), 100, "interval floors at 100ms");
    }

    #[test]
    fn test_rotate_reverts_when_no_kick_fits() {
        let mut state = state_with_piece(PieceKind::I);
        // Everything except one column is filled, so every kick offset fails.
        for y in 0..20 {
            for x in 0..10 {
                if x != 7 {
                    state.arena.set_cell(x, y, 1);
                }
            }
        }
        state.player.x = 6;
        let before_matrix = state.player.matrix.clone();
        let before_x = state.player.x;
        state.rotate(Rotation::Clockwise);
        assert_eq!(state.player.matrix, before_matrix, "shape reverted");
        assert_eq!(state.player.x, before_x, "position reverted");
    }

    #[test]
    fn test_rotate_kicks_off_left_wall() {
        let mut state = state_with_piece(PieceKind::I);
        // Vertical I hugging the left wall: the horizontal result pokes past
        // x=0 and has to kick right to fit.
        state.player.x = -1;
        state.player.y = 5;
        state.rotate(Rotation::Clockwise);
        assert!(
            !state
                .arena
                .collides(&state.player.matrix, state.player.x, state.player.y),
            "post-rotation placement is collision-free"
        );
    }

    #[test]
    fn test_spawn_collision_is_game_over() {
        let mut state = GameState::new(&config());
        let score_before = state.player.score;
        let stage_before = state.stage;
        for y in 0..2 {
            for x in 0..state.arena.width() {
                state.arena.set_cell(x, y, 1);
            }
        }
        assert!(!state.spawn_next());
        assert!(state.game_over);
        assert_eq!(state.player.score, score_before);
        assert_eq!(state.stage, stage_before);
        // Terminal: further commands are ignored.
        let x = state.player.x;
        state.move_piece(1);
        assert_eq!(state.player.x, x);
    }

    #[test]
    fn test_clock_accumulates_and_resets() {
        let mut state = state_with_piece(PieceKind::O);
        state.tick(600);
        assert_eq!(state.player.y, 0);
        state.tick(500);
        assert_eq!(state.player.y, 1, "accumulator passed the interval");
        state.tick(900);
        assert_eq!(state.player.y, 1, "reset to zero, no catch-up burst");
    }

    #[test]
    fn test_soft_drop_start_steps_once_while_held() {
        let mut state = state_with_piece(PieceKind::O);
        state.soft_drop_start();
        state.soft_drop_start();
        state.soft_drop_start();
        assert_eq!(state.player.y, 1, "repeated presses of a held key coalesce");
        assert!(state.soft_drop_held);
        state.soft_drop_stop();
        state.soft_drop_start();
        assert_eq!(state.player.y, 2, "a fresh press after release steps again");
    }

    #[test]
    fn test_clock_fast_interval_while_held() {
        let mut state = state_with_piece(PieceKind::O);
        state.soft_drop_held = true;
        state.tick(60);
        assert_eq!(state.player.y, 1);
    }

    #[test]
    fn test_stage_transition_sequence() {
        let mut state = state_with_piece(PieceKind::I);
        state.lines_required = 1;
        fill_row_except(&mut state, 19, 7);
        state.player.x = 6;
        state.hard_drop();
        assert_eq!(state.phase, StagePhase::ClearPending);
        // The first tick is the zero-delay handoff; no gravity applies.
        let y = state.player.y;
        state.tick(16);
        assert_eq!(state.player.y, y);
        assert_eq!(
            state.phase,
            StagePhase::Paused {
                remaining_ms: STAGE_CLEAR_PAUSE_MS
            }
        );
        state.tick(500);
        assert_eq!(state.phase, StagePhase::Paused { remaining_ms: 1500 });
        state.tick(1500);
        assert_eq!(state.phase, StagePhase::Running);
        assert_eq!(state.stage, 2);
        assert_eq!(state.lines_cleared_stage, 0);
        assert_eq!(state.lines_required, 4);
        assert_eq!(state.drop_interval_ms, 950);
        // Arena wiped, fresh piece at the top.
        assert!((0..20).all(|yy| (0..10).all(|xx| state.arena.cell(xx, yy) == 0)));
        assert_eq!(state.player.y, 0);
    }

    #[test]
    fn test_spawn_deferred_during_transition() {
        let mut state = state_with_piece(PieceKind::I);
        state.phase = StagePhase::ClearPending;
        let matrix = state.player.matrix.clone();
        assert!(state.spawn_next(), "still alive, spawn deferred");
        assert_eq!(state.player.matrix, matrix, "piece untouched");
    }
}
