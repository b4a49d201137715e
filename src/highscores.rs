//! Persist best survival times to disk (XDG config or ~/.config/blockdrop).

use crate::game::MAX_HIGH_SCORES;
use anyhow::Result;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

const FILENAME: &str = "highscores";

/// Returns the path to the high scores file (config dir / blockdrop / highscores).
fn config_path() -> Result<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    Ok(base.join("blockdrop").join(FILENAME))
}

/// Load best times from disk, one per line, descending. Unparseable lines
/// are skipped; missing file yields an empty list.
pub fn load_high_scores() -> Vec<f32> {
    let path = match config_path() {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    let mut scores: Vec<f32> = BufReader::new(&content[..])
        .lines()
        .take(MAX_HIGH_SCORES)
        .filter_map(|line| line.ok()?.trim().parse::<f32>().ok())
        .filter(|t| t.is_finite() && *t >= 0.0)
        .collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

/// Save best times to disk. Creates config directory if needed.
pub fn save_high_scores(scores: &[f32]) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    for t in scores.iter().take(MAX_HIGH_SCORES) {
        writeln!(f, "{t:.2}")?;
    }
    Ok(())
}
