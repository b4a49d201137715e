//! blockdrop — falling-block survival game in the terminal.

mod app;
mod game;
mod grid;
mod highscores;
mod input;
mod powerup;
mod shapes;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use std::time::{SystemTime, UNIX_EPOCH};

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let seed = args.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0x5eed)
    });
    let mut app = App::new(args, theme, seed);
    app.run()?;
    Ok(())
}

/// Falling-block survival game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockdrop",
    version,
    about = "Falling-block survival in the terminal. Dodge the stack, break blocks, survive as long as you can.",
    long_about = "Blockdrop is a terminal survival game.\n\n\
        Shapes fall and settle into a stack. Move and jump to stay on top of it, and break \
        adjacent blocks to carve paths. Breaking a powerup block triggers it: bombs clear an \
        area, lasers clear a row or column, freeze stops everything for a while. The run ends \
        when the stack reaches the top row.\n\n\
        CONTROLS:\n  A / D       Move    W / Space  Jump\n  Arrow keys  Break the adjacent block in that direction\n  R           Restart after game over    Q / Esc    Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the break flash animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Seed for shape and powerup rolls (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,
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
