use std::{fs, path::Path};

use anchorfall_system_wave_generation::WaveTuning;
use anyhow::{Context, Result};

/// Reads a TOML tuning file; missing keys fall back to the built-in defaults.
pub(crate) fn load(path: &Path) -> Result<WaveTuning> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid tuning file {}", path.display()))
}

fn parse(contents: &str) -> Result<WaveTuning> {
    let tuning: WaveTuning = toml::from_str(contents).context("failed to parse TOML")?;
    tuning.validate()?;
    Ok(tuning)
}
