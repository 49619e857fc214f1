use serde::Deserialize;

use crate::{ConfigError, PlanError, XYZData};

/// Machine constants. Feedrates are in units per minute, acceleration in units per second squared.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub steps_per_revolution: u32,
    pub steps_per_unit: f32,
    pub min_step_interval_us: u32,
    pub min_feedrate: f32,
    pub max_feedrate: f32,
    /// Modal feedrate used by G1 until the first `F` word.
    pub default_feedrate: f32,
    pub acceleration: f32,
    /// Velocity an axis can start at from rest without ramping.
    pub cruise_floor: f32,
    /// Limit sensors are queried every this many virtual steps.
    pub limit_poll_steps: u32,
    pub junction_blending: bool,
    pub invert_direction: XYZData<bool>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: 200,
            steps_per_unit: 1280.0,
            min_step_interval_us: 1,
            min_feedrate: 0.0001,
            max_feedrate: 1_000_000.0,
            default_feedrate: 600.0,
            acceleration: 100.0,
            cruise_floor: 300.0,
            limit_poll_steps: 1,
            junction_blending: false,
            invert_direction: Default::default(),
        }
    }
}

fn positive(value: f32, name: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(ConfigError::NotPositive(name)) }
}

impl MachineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.steps_per_revolution as f32, "steps_per_revolution")?;
        positive(self.steps_per_unit, "steps_per_unit")?;
        positive(self.min_step_interval_us as f32, "min_step_interval_us")?;
        positive(self.min_feedrate, "min_feedrate")?;
        positive(self.max_feedrate, "max_feedrate")?;
        positive(self.default_feedrate, "default_feedrate")?;
        positive(self.acceleration, "acceleration")?;
        positive(self.cruise_floor, "cruise_floor")?;
        positive(self.limit_poll_steps as f32, "limit_poll_steps")?;
        if self.min_feedrate > self.max_feedrate {
            return Err(ConfigError::FeedrateRange);
        }
        if self.default_feedrate < self.min_feedrate || self.default_feedrate > self.max_feedrate {
            return Err(ConfigError::DefaultFeedrate);
        }
        Ok(())
    }

    /// Rejects feedrates that are not positive and finite, clamps the rest into range.
    pub fn clamp_feedrate(&self, feedrate: f32) -> Result<f32, PlanError> {
        if !feedrate.is_finite() || feedrate <= 0.0 {
            return Err(PlanError::InvalidFeedrate);
        }
        let clamped = feedrate.clamp(self.min_feedrate, self.max_feedrate);
        if clamped != feedrate {
            tracing::warn!("feedrate {} clamped to {}", feedrate, clamped);
        }
        Ok(clamped)
    }
}
