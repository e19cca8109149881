use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Motion and tap tunables. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionCurveConfig {
    pub deadzone: i16,
    pub movement_cap: i16,
    pub curve_multiplier: f32,
    pub curve_exponent: f32,
    pub click_deadzone_radius: i16,
    pub min_click_ticks: u16,
    pub max_click_ticks: u16,
}

impl Default for MotionCurveConfig {
    fn default() -> Self {
        Self {
            deadzone: 1,
            movement_cap: 10,
            curve_multiplier: 3.0,
            curve_exponent: 1.4,
            click_deadzone_radius: 20,
            min_click_ticks: 0,
            max_click_ticks: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub poll_period_ms: u64,
    pub output_period_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 10,
            output_period_ms: 50,
        }
    }
}

impl SchedulerConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn output_period(&self) -> Duration {
        Duration::from_millis(self.output_period_ms)
    }

    /// Poll ticks per output tick, rounded down and never zero.
    pub fn polls_per_output(&self) -> u64 {
        (self.output_period_ms / self.poll_period_ms.max(1)).max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub motion: MotionCurveConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("motion.deadzone must not be negative (got {0})")]
    NegativeDeadzone(i16),
    #[error("motion.movement_cap ({cap}) must exceed motion.deadzone ({deadzone})")]
    CapNotAboveDeadzone { cap: i16, deadzone: i16 },
    #[error("motion.{field} must be a positive finite number (got {value})")]
    BadCurve { field: &'static str, value: f32 },
    #[error("motion.click_deadzone_radius must be positive (got {0})")]
    BadClickRadius(i16),
    #[error("motion.min_click_ticks ({min}) must be below motion.max_click_ticks ({max})")]
    EmptyClickWindow { min: u16, max: u16 },
    #[error("scheduler.{0} must be positive")]
    ZeroPeriod(&'static str),
    #[error("scheduler.output_period_ms ({output}) must not be shorter than poll_period_ms ({poll})")]
    OutputFasterThanPoll { poll: u64, output: u64 },
}

pub fn validate(s: &Settings) -> std::result::Result<(), ConfigError> {
    let m = &s.motion;
    if m.deadzone < 0 {
        return Err(ConfigError::NegativeDeadzone(m.deadzone));
    }
    if m.movement_cap <= m.deadzone {
        return Err(ConfigError::CapNotAboveDeadzone {
            cap: m.movement_cap,
            deadzone: m.deadzone,
        });
    }
    for (field, value) in [
        ("curve_multiplier", m.curve_multiplier),
        ("curve_exponent", m.curve_exponent),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::BadCurve { field, value });
        }
    }
    if m.click_deadzone_radius <= 0 {
        return Err(ConfigError::BadClickRadius(m.click_deadzone_radius));
    }
    if m.min_click_ticks >= m.max_click_ticks {
        return Err(ConfigError::EmptyClickWindow {
            min: m.min_click_ticks,
            max: m.max_click_ticks,
        });
    }

    let sch = &s.scheduler;
    if sch.poll_period_ms == 0 {
        return Err(ConfigError::ZeroPeriod("poll_period_ms"));
    }
    if sch.output_period_ms == 0 {
        return Err(ConfigError::ZeroPeriod("output_period_ms"));
    }
    if sch.output_period_ms < sch.poll_period_ms {
        return Err(ConfigError::OutputFasterThanPoll {
            poll: sch.poll_period_ms,
            output: sch.output_period_ms,
        });
    }
    Ok(())
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot resolve home directory"))?;
    Ok(dirs.home_dir().join(".config").join("irpoint"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

fn default_settings_text() -> &'static str {
    include_str!("../config/default.toml")
}

pub fn parse(txt: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(txt)?;
    validate(&settings)?;
    Ok(settings)
}

pub fn load(path: &Path) -> Result<Settings> {
    let txt = fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    parse(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
}

/// Loads `~/.config/irpoint/config.toml`, writing the bundled defaults there
/// first if the file does not exist yet.
pub fn load_or_install_default() -> Result<Settings> {
    let path = default_config_path()?;
    if !path.exists() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, default_settings_text())?;
        info!("installed default settings at {}", path.display());
    }
    load(&path)
}

pub fn resolve(explicit: Option<&Path>) -> Result<Settings> {
    let settings = match explicit {
        Some(p) => load(p)?,
        None => load_or_install_default()?,
    };
    info!(
        "settings: deadzone={} cap={} curve={}x^{} click_window=({}, {}) poll={}ms output={}ms",
        settings.motion.deadzone,
        settings.motion.movement_cap,
        settings.motion.curve_multiplier,
        settings.motion.curve_exponent,
        settings.motion.min_click_ticks,
        settings.motion.max_click_ticks,
        settings.scheduler.poll_period_ms,
        settings.scheduler.output_period_ms,
    );
    Ok(settings)
}
