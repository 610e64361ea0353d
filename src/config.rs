use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// View controller configuration, loadable from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    /// Multisample antialiasing for the presented surface
    pub msaa: bool,
    /// Advisory display-link rate request
    pub preferred_fps: u32,
    /// Auto-pause when the application resigns foreground activity
    pub pause_on_will_resign_active: bool,
    /// Auto-resume when the application becomes active again
    pub resume_on_did_become_active: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            msaa: true,
            preferred_fps: 60,
            pause_on_will_resign_active: true,
            resume_on_did_become_active: true,
        }
    }
}

impl ViewConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading view config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing view config {}", path.display()))
    }
}
