//! Layout and drawing: playfield, sidebar, stage-clear announcement, game over.

use crate::app::Screen;
use crate::game::{GameState, StagePhase};
use crate::piece::PieceKind;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Each arena cell is drawn 2 terminal columns wide by 1 row tall, which is
/// close to square in most fonts.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 20;

/// Board size in terminal cells, border included.
fn board_pixel_size(state: &GameState) -> (u16, u16) {
    (
        state.arena.width() as u16 * CELL_WIDTH + 2,
        state.arena.height() as u16 + 2,
    )
}

/// Board outer rect (border included), centred with room for the sidebar.
fn board_rect(area: Rect, state: &GameState) -> Rect {
    let (bw, bh) = board_pixel_size(state);
    let total_w = bw + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(bh) / 2,
        width: bw.min(area.width),
        height: bh.min(area.height),
    }
}

/// Draw the current screen.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    area: Rect,
) {
    match screen {
        Screen::Playing => {
            draw_game(frame, state, theme, area);
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => draw_game_over(frame, state, theme, area),
    }
}

fn draw_game(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let outer = board_rect(area, state);
    let in_transition = matches!(
        state.phase,
        StagePhase::ClearPending | StagePhase::Paused { .. }
    );
    if in_transition {
        draw_stage_clear(frame, state, theme, outer);
    } else {
        draw_board(frame, state, theme, outer);
    }
    draw_sidebar(frame, state, theme, outer, area);
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, outer: Rect) {
    let w = state.arena.width();
    let h = state.arena.height();

    // Composite settled cells and the active piece into one code grid.
    let mut codes: Vec<Vec<u8>> = (0..h)
        .map(|y| (0..w).map(|x| state.arena.cell(x, y)).collect())
        .collect();
    for (sy, row) in state.player.matrix.iter().enumerate() {
        for (sx, &code) in row.iter().enumerate() {
            if code == 0 {
                continue;
            }
            let ax = state.player.x + sx as i32;
            let ay = state.player.y + sy as i32;
            if ax >= 0 && (ax as usize) < w && ay >= 0 && (ay as usize) < h {
                codes[ay as usize][ax as usize] = code;
            }
        }
    }

    let lines: Vec<Line> = codes
        .iter()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&code| {
                        let style = if code == 0 {
                            Style::default().bg(theme.bg)
                        } else {
                            // Codes other than 1..=7 cannot come out of the
                            // merge path; surface corruption instead of
                            // guessing a colour.
                            let kind = PieceKind::from_code(code).expect("corrupt arena cell");
                            Style::default().bg(theme.piece_color(kind.code()))
                        };
                        Span::styled("  ", style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let board = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(board, outer);
}

/// The stage-clear announcement replaces the board for the whole pause.
fn draw_stage_clear(frame: &mut Frame, state: &GameState, theme: &Theme, outer: Rect) {
    let cleared = state.stage;
    let mut lines: Vec<Line> = Vec::new();
    let mid = outer.height.saturating_sub(2) / 2;
    for _ in 0..mid.saturating_sub(1) {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        format!("Stage {cleared} Clear!"),
        Style::default().fg(theme.title).bold(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Starting Stage {}", cleared + 1),
        Style::default().fg(theme.main_fg),
    )));
    let announcement = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(announcement, outer);
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, outer: Rect, area: Rect) {
    let rect = Rect {
        x: (outer.x + outer.width + 1).min(area.x + area.width.saturating_sub(1)),
        y: outer.y,
        width: SIDEBAR_WIDTH.min((area.x + area.width).saturating_sub(outer.x + outer.width + 1)),
        height: outer.height,
    };
    if rect.width == 0 {
        return;
    }
    let label = Style::default().fg(theme.title);
    let value = Style::default().fg(theme.main_fg).bold();
    let dim = Style::default().fg(theme.border);
    let lines = vec![
        Line::from(Span::styled("stagetris", Style::default().fg(theme.title).bold())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Score  ", label),
            Span::styled(state.player.score.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Stage  ", label),
            Span::styled(state.stage.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Lines  ", label),
            Span::styled(
                format!("{} / {}", state.lines_cleared_stage, state.lines_required),
                value,
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("←/→  move", dim)),
        Line::from(Span::styled("↑/w  rotate cw", dim)),
        Line::from(Span::styled("z    rotate ccw", dim)),
        Line::from(Span::styled("↓    soft drop", dim)),
        Line::from(Span::styled("spc  hard drop", dim)),
        Line::from(Span::styled("p    pause", dim)),
        Line::from(Span::styled("q    quit", dim)),
    ];
    frame.render_widget(Paragraph::new(lines), rect);
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let w = 13u16;
    let h = 3u16;
    let rect = Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    let popup = Paragraph::new(Line::from(Span::styled(
        "Paused",
        Style::default().fg(theme.title).bold(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(Clear, rect);
    frame.render_widget(popup, rect);
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let w = 30u16;
    let h = 8u16;
    let rect = Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    let lines = vec![
        Line::from(Span::styled(
            "Game Over",
            Style::default().fg(theme.title).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Stage {}", state.stage),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!("Final Score {}", state.player.score),
            Style::default().fg(theme.main_fg).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "r restart   q quit",
            Style::default().fg(theme.border),
        )),
    ];
    let popup = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(Clear, rect);
    frame.render_widget(popup, rect);
}
