use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::counter::{SideStrategy, ThresholdConfig, DEFAULT_HYSTERESIS};
use crate::ingest::DEFAULT_FRAME_INTERVAL_MS;
use crate::session::SessionPlan;

const DEFAULT_SOURCE: &str = "stub://pushups";
const DEFAULT_FPS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
struct CounterConfigFile {
    counter: Option<CounterSectionFile>,
    ingest: Option<IngestSectionFile>,
    session: Option<SessionSectionFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CounterSectionFile {
    hysteresis: Option<f32>,
    side: Option<SideStrategy>,
}

#[derive(Debug, Deserialize, Default)]
struct IngestSectionFile {
    source: Option<String>,
    fps: Option<u32>,
    frame_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SessionSectionFile {
    reps_per_set: Option<u32>,
    sets: Option<u32>,
    rest_secs: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub hysteresis: f32,
    pub side: SideStrategy,
    pub ingest: IngestSettings,
    pub plan: Option<SessionPlan>,
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// `stub://…` or a local landmark recording.
    pub source: String,
    /// Frame rate of the synthetic source.
    pub fps: u32,
    /// Minimum spacing between analysed frames; 0 disables throttling.
    pub frame_interval_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            hysteresis: DEFAULT_HYSTERESIS,
            side: SideStrategy::default(),
            ingest: IngestSettings {
                source: DEFAULT_SOURCE.to_string(),
                fps: DEFAULT_FPS,
                frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            },
            plan: None,
        }
    }
}

impl CounterConfig {
    /// Load from `PUSHUP_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PUSHUP_CONFIG").ok();
        Self::load_with(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (if any), then apply env overrides.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validated counter thresholds.
    pub fn threshold(&self) -> Result<ThresholdConfig> {
        ThresholdConfig::new(self.hysteresis, self.side)
    }

    fn from_file(file: CounterConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let counter = file.counter.unwrap_or_default();
        let ingest = file.ingest.unwrap_or_default();
        let plan = match file.session {
            None => None,
            Some(session) => match (session.reps_per_set, session.sets) {
                (Some(reps), Some(sets)) => {
                    Some(SessionPlan::new(reps, sets, session.rest_secs.unwrap_or(0))?)
                }
                (None, None) => None,
                _ => {
                    return Err(anyhow!(
                        "session.reps_per_set and session.sets must be set together"
                    ))
                }
            },
        };
        Ok(Self {
            hysteresis: counter.hysteresis.unwrap_or(defaults.hysteresis),
            side: counter.side.unwrap_or(defaults.side),
            ingest: IngestSettings {
                source: ingest.source.unwrap_or(defaults.ingest.source),
                fps: ingest.fps.unwrap_or(defaults.ingest.fps),
                frame_interval_ms: ingest
                    .frame_interval_ms
                    .unwrap_or(defaults.ingest.frame_interval_ms),
            },
            plan,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(margin) = std::env::var("PUSHUP_HYSTERESIS") {
            self.hysteresis = margin
                .trim()
                .parse()
                .map_err(|_| anyhow!("PUSHUP_HYSTERESIS must be a number"))?;
        }
        if let Ok(side) = std::env::var("PUSHUP_SIDE") {
            if !side.trim().is_empty() {
                self.side = side.parse()?;
            }
        }
        if let Ok(interval) = std::env::var("PUSHUP_FRAME_INTERVAL_MS") {
            self.ingest.frame_interval_ms = interval.trim().parse().map_err(|_| {
                anyhow!("PUSHUP_FRAME_INTERVAL_MS must be an integer number of milliseconds")
            })?;
        }
        if let Ok(source) = std::env::var("PUSHUP_SOURCE") {
            if !source.trim().is_empty() {
                self.ingest.source = source.trim().to_string();
            }
        }
        if let Ok(fps) = std::env::var("PUSHUP_FPS") {
            self.ingest.fps = fps
                .trim()
                .parse()
                .map_err(|_| anyhow!("PUSHUP_FPS must be an integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.threshold()?;
        if self.ingest.fps == 0 {
            return Err(anyhow!("ingest fps must be greater than zero"));
        }
        if self.ingest.source.trim().is_empty() {
            return Err(anyhow!("ingest source must not be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CounterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg: CounterConfigFile = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
