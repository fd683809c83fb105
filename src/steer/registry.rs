use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::config::StrategySettings;
use crate::steer::hysteresis::HysteresisThresholds;
use crate::steer::strategies::{BrightnessComparison, BrightnessThresholds, CentroidHysteresis};
use crate::steer::strategy::SteeringStrategy;

/// Registry of steering strategies, keyed by `SteeringStrategy::name`.
///
/// Strategies are owned by exactly one controller, so selection moves the
/// strategy out of the registry instead of sharing it.
pub struct StrategyRegistry {
    strategies: HashMap<String, Box<dyn SteeringStrategy>>,
    default_name: Option<String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            default_name: None,
        }
    }

    /// Registry holding both built-in strategies, tuned from `settings`, with
    /// `settings.name` as the default.
    pub fn builtin(settings: &StrategySettings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(
            CentroidHysteresis::new()
                .with_downsample(settings.downsample)
                .with_thresholds(HysteresisThresholds {
                    min_mass: settings.min_mass,
                    deadband: settings.deadband,
                    hysteresis_band: settings.hysteresis_band,
                }),
        );
        registry.register(
            BrightnessComparison::new()
                .with_downsample(settings.downsample)
                .with_thresholds(BrightnessThresholds {
                    min_mean_luma: settings.min_mean_luma,
                    margin: settings.brightness_margin,
                }),
        );
        registry.set_default(&settings.name)?;
        Ok(registry)
    }

    /// Register a strategy. The first registered strategy becomes the default.
    pub fn register<S: SteeringStrategy + 'static>(&mut self, strategy: S) {
        let name = strategy.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.strategies.insert(name, Box::new(strategy));
    }

    /// Set default strategy by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.strategies.contains_key(name) {
            return Err(anyhow!(
                "strategy '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            ));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Borrow a strategy by name.
    pub fn get(&self, name: &str) -> Option<&dyn SteeringStrategy> {
        self.strategies.get(name).map(|s| s.as_ref())
    }

    /// List registered strategies, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.keys().cloned().collect();
        names.sort();
        names
    }

    /// Move a strategy out of the registry.
    pub fn take(&mut self, name: &str) -> Result<Box<dyn SteeringStrategy>> {
        let strategy = self
            .strategies
            .remove(name)
            .ok_or_else(|| anyhow!("strategy '{}' not registered", name))?;
        if self.default_name.as_deref() == Some(name) {
            self.default_name = None;
        }
        Ok(strategy)
    }

    /// Move the default strategy out of the registry.
    pub fn take_default(&mut self) -> Result<Box<dyn SteeringStrategy>> {
        let name = self
            .default_name
            .clone()
            .ok_or_else(|| anyhow!("no default strategy registered"))?;
        self.take(&name)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
