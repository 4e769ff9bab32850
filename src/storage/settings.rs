use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::config::Settings;

pub fn save(settings: &Settings, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let data = serde_yaml::to_string(settings)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

pub fn open(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let settings: Settings =
        serde_yaml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(settings)
}
