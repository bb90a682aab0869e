//! Stagetris — stage-based falling-block puzzle game in the terminal.

mod app;
mod game;
mod grid;
mod input;
mod piece;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options that define one game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    pub seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette)
        .unwrap_or_else(|_| theme::Theme::default_for_palette(args.palette));
    let mut app = App::new(args, theme)?;
    app.run()?;
    Ok(())
}

/// Stage-based falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stagetris",
    version,
    about = "Stage-based falling-block puzzle in the terminal. Clear the required lines to advance; every stage drops faster and asks for more.",
    long_about = "Stagetris is a terminal falling-block puzzle game.\n\n\
        Seven pieces fall into a 10x20 arena. Complete horizontal lines to score; clearing the \
        stage's required lines wipes the board and starts the next, faster stage.\n\n\
        CONTROLS:\n  Left/Right  Move       Up / w   Rotate CW   z       Rotate CCW\n  Down        Soft drop  Space    Hard drop   P       Pause   Q / Esc  Quit\n\n\
        Hold a movement key to keep the piece moving. Use --theme to load a btop-style theme file."
)]
pub struct Args {
    /// Arena width in cells. Minimum 4: a centred I-piece needs its full
    /// bounding box, and anything narrower is an instant game over.
    #[arg(long, default_value = "10", value_name = "COLS", value_parser = clap::value_parser!(u16).range(4..))]
    pub width: u16,

    /// Arena height in cells (minimum 4, the tallest piece bounding box).
    #[arg(long, default_value = "20", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(4..))]
    pub height: u16,

    /// Path to theme file (btop-style theme[key]="value"). Uses the classic palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Piece RNG seed; identical seeds replay the same piece sequence.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_reject_tiny_arena() {
        assert!(Args::try_parse_from(["stagetris", "--width", "1"]).is_err());
        assert!(Args::try_parse_from(["stagetris", "--height", "3"]).is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["stagetris"]).unwrap();
        assert_eq!(args.width, 10);
        assert_eq!(args.height, 20);
        assert_eq!(args.palette, Palette::Normal);
        assert!(args.seed.is_none());
    }
}
