//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::BlockKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Settled normal blocks.
    pub block: Color,
    /// Blocks still falling.
    pub falling: Color,
    /// The player cell.
    pub player: Color,
    /// Powerup colours: bomb, freeze, horizontal laser, vertical laser.
    pub bomb: Color,
    pub freeze: Color,
    pub laser_h: Color,
    pub laser_v: Color,
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (timers, best times).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Inactive / secondary text (cooldowns still recovering).
    pub inactive_fg: Color,
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
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults: exact hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            block: parse_hex("#98C379").unwrap(),
            falling: parse_hex("#56B6C2").unwrap(),
            player: parse_hex("#E5C07B").unwrap(),
            bomb: parse_hex("#E06C75").unwrap(),
            freeze: parse_hex("#61AFEF").unwrap(),
            laser_h: parse_hex("#C678DD").unwrap(),
            laser_v: parse_hex("#D19A66").unwrap(),
            bg: parse_hex("#31353F").unwrap(),
            div_line: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
            inactive_fg: parse_hex("#5C6370").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or file is missing/invalid.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
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

    /// Default theme for a palette when no file is loaded.
    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override block (and powerup) colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.block = parse_hex("#00FF00").unwrap();
                self.falling = parse_hex("#00FFFF").unwrap();
                self.player = parse_hex("#FFFF00").unwrap();
                self.bomb = parse_hex("#FF0000").unwrap();
                self.freeze = parse_hex("#0088FF").unwrap();
                self.laser_h = parse_hex("#FF00FF").unwrap();
                self.laser_v = parse_hex("#FF8800").unwrap();
            }
            crate::Palette::Colorblind => {
                // Avoid red/green alone; glyphs already disambiguate powerups.
                self.block = parse_hex("#0077BB").unwrap();
                self.falling = parse_hex("#33BBEE").unwrap();
                self.player = parse_hex("#BBBB00").unwrap();
                self.bomb = parse_hex("#CC3311").unwrap();
                self.freeze = parse_hex("#009988").unwrap();
                self.laser_h = parse_hex("#EE3377").unwrap();
                self.laser_v = parse_hex("#EE7733").unwrap();
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        // Keys match onedark.theme; fallbacks are the same file's hex values.
        Self {
            block: get("mem_box")
                .or_else(|| get("cpu_start"))
                .unwrap_or_else(|| parse_hex("#98C379").unwrap()),
            falling: get("hi_fg")
                .or_else(|| get("proc_misc"))
                .unwrap_or_else(|| parse_hex("#56B6C2").unwrap()),
            player: get("title")
                .or_else(|| get("cpu_mid"))
                .unwrap_or_else(|| parse_hex("#E5C07B").unwrap()),
            bomb: get("cpu_end")
                .or_else(|| get("temp_end"))
                .unwrap_or_else(|| parse_hex("#E06C75").unwrap()),
            freeze: get("cpu_box").unwrap_or_else(|| parse_hex("#61AFEF").unwrap()),
            laser_h: get("net_box").unwrap_or_else(|| parse_hex("#C678DD").unwrap()),
            laser_v: get("proc_box").unwrap_or_else(|| parse_hex("#D19A66").unwrap()),
            bg: get("meter_bg").unwrap_or_else(|| parse_hex("#31353F").unwrap()),
            div_line: get("div_line").unwrap_or_else(|| parse_hex("#3F444F").unwrap()),
            main_fg: get("main_fg").unwrap_or_else(|| parse_hex("#ABB2BF").unwrap()),
            title: get("title").unwrap_or_else(|| parse_hex("#E5C07B").unwrap()),
            inactive_fg: get("inactive_fg").unwrap_or_else(|| parse_hex("#5C6370").unwrap()),
        }
    }

    /// Colour for a settled block of the given kind.
    #[inline]
    pub fn block_color(&self, kind: BlockKind) -> Color {
        match kind {
            BlockKind::Normal => self.block,
            BlockKind::Bomb => self.bomb,
            BlockKind::Freeze => self.freeze,
            BlockKind::LaserH => self.laser_h,
            BlockKind::LaserV => self.laser_v,
        }
    }

    /// Colour for a falling cell: powerups keep their colour, normal cells
    /// use the falling tint.
    #[inline]
    pub fn falling_color(&self, kind: BlockKind) -> Color {
        if kind.is_powerup() {
            self.block_color(kind)
        } else {
            self.falling
        }
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
