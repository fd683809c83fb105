use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::dispatch::{WireFormat, DEFAULT_DRAIN_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
use crate::steer::{
    DEFAULT_BRIGHTNESS_MARGIN, DEFAULT_DEADBAND, DEFAULT_HYSTERESIS_BAND, DEFAULT_MIN_MASS,
    DEFAULT_MIN_MEAN_LUMA,
};

const DEFAULT_SOURCE_URL: &str = "stub://blue_target";
const DEFAULT_SOURCE_FPS: u32 = 30;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_STRATEGY: &str = "centroid";
const DEFAULT_DOWNSAMPLE: u32 = 1;
const DEFAULT_ACTUATOR_URL: &str = "stub://actuator";
const DEFAULT_TIMING_LOG_SECS: u64 = 5;

const KNOWN_STRATEGIES: &[&str] = &["centroid", "brightness"];

#[derive(Debug, Deserialize, Default)]
struct SteerdConfigFile {
    source: Option<SourceConfigFile>,
    strategy: Option<StrategyConfigFile>,
    actuator: Option<ActuatorConfigFile>,
    timing: Option<TimingConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct StrategyConfigFile {
    name: Option<String>,
    downsample: Option<u32>,
    min_mass: Option<u64>,
    deadband: Option<i64>,
    hysteresis_band: Option<i64>,
    min_mean_luma: Option<u64>,
    brightness_margin: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct ActuatorConfigFile {
    url: Option<String>,
    wire_format: Option<WireFormat>,
    queue_capacity: Option<usize>,
    timeout_ms: Option<u64>,
    drain_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TimingConfigFile {
    log_every_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SteerdConfig {
    pub source: SourceSettings,
    pub strategy: StrategySettings,
    pub actuator: ActuatorSettings,
    /// How often the daemon logs timing and dispatch counters.
    pub timing_log_every: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySettings {
    pub name: String,
    pub downsample: u32,
    pub min_mass: u64,
    pub deadband: i64,
    pub hysteresis_band: i64,
    pub min_mean_luma: u64,
    pub brightness_margin: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_STRATEGY.to_string(),
            downsample: DEFAULT_DOWNSAMPLE,
            min_mass: DEFAULT_MIN_MASS,
            deadband: DEFAULT_DEADBAND,
            hysteresis_band: DEFAULT_HYSTERESIS_BAND,
            min_mean_luma: DEFAULT_MIN_MEAN_LUMA,
            brightness_margin: DEFAULT_BRIGHTNESS_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorSettings {
    /// `http(s)://host[:port]` of the actuator, or `stub://name` to log only.
    pub url: String,
    pub wire_format: WireFormat,
    pub queue_capacity: usize,
    /// Per-send timeout. `None` leaves sends unbounded.
    pub timeout: Option<Duration>,
    /// How long teardown waits for queued commands to reach the actuator.
    pub drain_timeout: Duration,
}

impl ActuatorSettings {
    pub fn is_stub(&self) -> bool {
        self.url.starts_with("stub://")
    }
}

impl SteerdConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("STEER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SteerdConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        let strategy = file.strategy.unwrap_or_default();
        let actuator = file.actuator.unwrap_or_default();
        let defaults = StrategySettings::default();

        Self {
            source: SourceSettings {
                url: source
                    .url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                target_fps: source.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
                width: source.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
                height: source.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            },
            strategy: StrategySettings {
                name: strategy.name.unwrap_or(defaults.name),
                downsample: strategy.downsample.unwrap_or(defaults.downsample),
                min_mass: strategy.min_mass.unwrap_or(defaults.min_mass),
                deadband: strategy.deadband.unwrap_or(defaults.deadband),
                hysteresis_band: strategy.hysteresis_band.unwrap_or(defaults.hysteresis_band),
                min_mean_luma: strategy.min_mean_luma.unwrap_or(defaults.min_mean_luma),
                brightness_margin: strategy
                    .brightness_margin
                    .unwrap_or(defaults.brightness_margin),
            },
            actuator: ActuatorSettings {
                url: actuator
                    .url
                    .unwrap_or_else(|| DEFAULT_ACTUATOR_URL.to_string()),
                wire_format: actuator.wire_format.unwrap_or_default(),
                queue_capacity: actuator.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
                timeout: actuator.timeout_ms.map(Duration::from_millis),
                drain_timeout: actuator
                    .drain_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_DRAIN_TIMEOUT),
            },
            timing_log_every: Duration::from_secs(
                file.timing
                    .and_then(|timing| timing.log_every_secs)
                    .unwrap_or(DEFAULT_TIMING_LOG_SECS),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("STEER_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(name) = std::env::var("STEER_STRATEGY") {
            if !name.trim().is_empty() {
                self.strategy.name = name.trim().to_lowercase();
            }
        }
        if let Ok(factor) = std::env::var("STEER_DOWNSAMPLE") {
            self.strategy.downsample = factor
                .parse()
                .map_err(|_| anyhow!("STEER_DOWNSAMPLE must be a positive integer"))?;
        }
        if let Ok(url) = std::env::var("STEER_ACTUATOR_URL") {
            if !url.trim().is_empty() {
                self.actuator.url = url;
            }
        }
        if let Ok(format) = std::env::var("STEER_WIRE_FORMAT") {
            self.actuator.wire_format = format.parse()?;
        }
        if let Ok(capacity) = std::env::var("STEER_QUEUE_CAPACITY") {
            self.actuator.queue_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("STEER_QUEUE_CAPACITY must be a positive integer"))?;
        }
        if let Ok(timeout) = std::env::var("STEER_SEND_TIMEOUT_MS") {
            let millis: u64 = timeout.parse().map_err(|_| {
                anyhow!("STEER_SEND_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.actuator.timeout = Some(Duration::from_millis(millis));
        }
        if let Ok(timeout) = std::env::var("STEER_DRAIN_TIMEOUT_MS") {
            let millis: u64 = timeout.parse().map_err(|_| {
                anyhow!("STEER_DRAIN_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.actuator.drain_timeout = Duration::from_millis(millis);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        if !KNOWN_STRATEGIES.contains(&self.strategy.name.as_str()) {
            return Err(anyhow!(
                "unknown strategy '{}'; expected one of {}",
                self.strategy.name,
                KNOWN_STRATEGIES.join(", ")
            ));
        }
        if self.strategy.downsample == 0 {
            return Err(anyhow!("downsample must be at least 1"));
        }
        if self.strategy.deadband < 0 || self.strategy.hysteresis_band < self.strategy.deadband {
            return Err(anyhow!(
                "thresholds must satisfy 0 <= deadband <= hysteresis_band"
            ));
        }
        if !(0.0..=1.0).contains(&self.strategy.brightness_margin) {
            return Err(anyhow!("brightness_margin must be within 0..=1"));
        }
        if self.actuator.queue_capacity == 0 {
            return Err(anyhow!("actuator queue_capacity must be greater than zero"));
        }
        let url = self.actuator.url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("stub://"))
        {
            return Err(anyhow!(
                "actuator url '{}' must use http://, https:// or stub://",
                url
            ));
        }
        if self.actuator.timeout == Some(Duration::ZERO) {
            return Err(anyhow!("actuator timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SteerdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
