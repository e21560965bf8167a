// <project_dir>/.stepbeat/config.json, read once on startup. A missing file
// means defaults; patterns themselves are never persisted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::SequencerError;
use crate::pipeline::export::{DEFAULT_KBPS, ExportFormat};
use crate::shared::{
    DEFAULT_BPM, DEFAULT_MASTER_VOLUME, DEFAULT_STEPS, MAX_BPM, MIN_BPM, RECORD_BLOCK_SIZE,
    TrackId,
};

pub const STEPBEAT_DIR: &str = ".stepbeat";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub dir: Option<PathBuf>, // None = the project dir
    pub kbps: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Mp3,
            dir: None,
            kbps: DEFAULT_KBPS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub steps: usize,
    pub tracks: Vec<TrackId>,
    pub bpm: u32,
    pub min_bpm: u32,
    pub max_bpm: u32,
    pub master_volume: f32,
    pub record_block_size: usize,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            tracks: TrackId::ALL.to_vec(),
            bpm: DEFAULT_BPM,
            min_bpm: MIN_BPM,
            max_bpm: MAX_BPM,
            master_volume: DEFAULT_MASTER_VOLUME,
            record_block_size: RECORD_BLOCK_SIZE,
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), SequencerError> {
        let invalid = |msg: String| Err(SequencerError::InvalidArgument(msg));
        if self.steps == 0 {
            return invalid("steps must be at least 1".into());
        }
        if self.tracks.is_empty() {
            return invalid("at least one track is required".into());
        }
        let unique: HashSet<TrackId> = self.tracks.iter().copied().collect();
        if unique.len() != self.tracks.len() {
            return invalid("tracks must not repeat".into());
        }
        if self.min_bpm == 0 || self.min_bpm > self.max_bpm {
            return invalid(format!("bad tempo range {}..={}", self.min_bpm, self.max_bpm));
        }
        if !(0.0..=1.0).contains(&self.master_volume) {
            return invalid(format!("master_volume {} outside 0..=1", self.master_volume));
        }
        if self.record_block_size == 0 {
            return invalid("record_block_size must be at least 1".into());
        }
        Ok(())
    }

    pub fn export_dir(&self, project_dir: &Path) -> PathBuf {
        self.export
            .dir
            .clone()
            .unwrap_or_else(|| project_dir.to_path_buf())
    }
}

fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(STEPBEAT_DIR).join(CONFIG_FILE)
}

pub fn load_config(project_dir: &Path) -> anyhow::Result<Config> {
    let path = config_file_path(project_dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

// Save the config, making the directory if it doesn't exist already
pub fn save_config(project_dir: &Path, config: &Config) -> anyhow::Result<()> {
    let path = config_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
