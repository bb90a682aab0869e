//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece palette and UI colours, optionally loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours indexed by cell code 1..=7 (T, O, L, J, I, S, Z).
    pub pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Board border.
    pub border: Color,
    /// Text (score, stage, lines).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic_default()
    }
}

/// Theme file keys for the seven piece colours, in code order.
const PIECE_KEYS: [&str; 7] = [
    "piece_t", "piece_o", "piece_l", "piece_j", "piece_i", "piece_s", "piece_z",
];

impl Theme {
    /// The classic palette: the seven original piece colours on black.
    pub fn classic_default() -> Self {
        Self {
            pieces: [
                parse_hex("#FF0D72").unwrap(), // T
                parse_hex("#0DC2FF").unwrap(), // O
                parse_hex("#0DFF72").unwrap(), // L
                parse_hex("#F538FF").unwrap(), // J
                parse_hex("#FF8E0D").unwrap(), // I
                parse_hex("#FFE138").unwrap(), // S
                parse_hex("#3877FF").unwrap(), // Z
            ],
            bg: Color::Black,
            border: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic defaults if path is None or the file is missing.
    /// `palette` selects the colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded (or loading failed).
    pub fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::classic_default();
        t.apply_palette(palette);
        t
    }

    /// Override piece colours for high-contrast or colorblind variants.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                // Saturated primaries on a dark background.
                self.pieces = [
                    parse_hex("#FF0000").unwrap(),
                    parse_hex("#00FFFF").unwrap(),
                    parse_hex("#00FF00").unwrap(),
                    parse_hex("#FF00FF").unwrap(),
                    parse_hex("#FF8800").unwrap(),
                    parse_hex("#FFFF00").unwrap(),
                    parse_hex("#0088FF").unwrap(),
                ];
            }
            crate::Palette::Colorblind => {
                // Paul Tol bright scheme: distinguishable without red/green.
                self.pieces = [
                    parse_hex("#EE3377").unwrap(),
                    parse_hex("#66CCEE").unwrap(),
                    parse_hex("#009988").unwrap(),
                    parse_hex("#AA3377").unwrap(),
                    parse_hex("#EE7733").unwrap(),
                    parse_hex("#CCBB44").unwrap(),
                    parse_hex("#0077BB").unwrap(),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let defaults = Self::classic_default();
        let mut pieces = defaults.pieces;
        for (i, key) in PIECE_KEYS.iter().enumerate() {
            if let Some(c) = get(key) {
                pieces[i] = c;
            }
        }
        Self {
            pieces,
            bg: get("bg").unwrap_or(defaults.bg),
            border: get("border").unwrap_or(defaults.border),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
        }
    }

    /// Colour for a piece cell code (1..=7).
    #[inline]
    pub fn piece_color(&self, code: u8) -> Color {
        self.pieces[(code.saturating_sub(1) as usize) % 7]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let (r, g, b) = if s.len() == 6 {
        let r =
            u8::from_str_radix(&s[0..2], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let g =
            u8::from_str_radix(&s[2..4], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let b =
            u8::from_str_radix(&s[4..6], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        (r, g, b)
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let g = u8::from_str_radix(&s[1..2], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let b = u8::from_str_radix(&s[2..3], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        (r, g, b)
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#FF0D72").unwrap();
        assert!(matches!(c, Color::Rgb(0xFF, 0x0D, 0x72)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[piece_t]="#FF0D72""##);
        assert_eq!(map.get("piece_t"), Some(&"#FF0D72".to_string()));
    }

    #[test]
    fn test_default_for_palette_applies_variant() {
        let classic = Theme::classic_default();
        let hc = Theme::default_for_palette(crate::Palette::HighContrast);
        assert_ne!(hc.pieces, classic.pieces);
        let normal = Theme::default_for_palette(crate::Palette::Normal);
        assert_eq!(normal.pieces, classic.pieces);
    }

    #[test]
    fn test_piece_color_by_code() {
        let t = Theme::classic_default();
        assert_eq!(t.piece_color(1), t.pieces[0]);
        assert_eq!(t.piece_color(7), t.pieces[6]);
    }
}
