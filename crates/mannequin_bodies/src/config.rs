//! # Allocation Budgets
//!
//! Stage pool sizes and cosmetic tuning, loaded from TOML.
//!
//! ```toml
//! pool_capacity = 40
//! active_heads_per_gender = 4
//!
//! [[stage]]
//! stage = 9
//! pool_capacity = 24
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use mannequin_shared::{
    BodyId, StageId, DEFAULT_ACTIVE_HEADS_PER_GENDER, DEFAULT_EYESPY_BODY,
    DEFAULT_EYESPY_HOVER_HEIGHT, DEFAULT_EYEWEAR_CHANCE, DEFAULT_MAX_HEIGHT_FACTOR,
    DEFAULT_MIN_HEIGHT_FACTOR, DEFAULT_POOL_CAPACITY, MAX_ACTIVE_HEADS_PER_GENDER,
    MAX_POOL_CAPACITY,
};

use crate::error::{BodyError, BodyResult};

/// Per-stage budget override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageOverride {
    /// Stage this override applies to.
    pub stage: StageId,
    /// Pool capacity for the stage.
    #[serde(default)]
    pub pool_capacity: Option<usize>,
    /// Active heads per gender for the stage.
    #[serde(default)]
    pub active_heads_per_gender: Option<usize>,
}

/// Budgets resolved for one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageBudget {
    /// Composed-model slots.
    pub pool_capacity: usize,
    /// Distinct heads of each gender in the rotation.
    pub active_heads_per_gender: usize,
}

/// Configuration for the body system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodiesConfig {
    /// Default composed-model slots per stage.
    pub pool_capacity: usize,
    /// Default distinct heads of each gender loaded per stage.
    pub active_heads_per_gender: usize,
    /// Probability an eligible character gets eyewear, in `[0, 1]`.
    pub eyewear_chance: f32,
    /// Lower bound of the height variation factor.
    pub min_height_factor: f32,
    /// Upper bound of the height variation factor.
    pub max_height_factor: f32,
    /// Body used for eyespy props.
    pub eyespy_body: BodyId,
    /// Height the eyespy hovers above its pad.
    pub eyespy_hover_height: f32,
    /// Stage-specific overrides.
    #[serde(rename = "stage")]
    pub stages: Vec<StageOverride>,
}

impl Default for BodiesConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            active_heads_per_gender: DEFAULT_ACTIVE_HEADS_PER_GENDER,
            eyewear_chance: DEFAULT_EYEWEAR_CHANCE,
            min_height_factor: DEFAULT_MIN_HEIGHT_FACTOR,
            max_height_factor: DEFAULT_MAX_HEIGHT_FACTOR,
            eyespy_body: DEFAULT_EYESPY_BODY,
            eyespy_hover_height: DEFAULT_EYESPY_HOVER_HEIGHT,
            stages: Vec::new(),
        }
    }
}

impl BodiesConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> BodyResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| BodyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> BodyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BodyError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> BodyResult<()> {
        if !(0.0..=1.0).contains(&self.eyewear_chance) {
            return Err(BodyError::InvalidConfig(format!(
                "eyewear_chance {} outside [0, 1]",
                self.eyewear_chance
            )));
        }
        if !(self.min_height_factor.is_finite() && self.max_height_factor.is_finite()) {
            return Err(BodyError::InvalidConfig(format!(
                "height factor range [{}, {}] must be finite",
                self.min_height_factor, self.max_height_factor
            )));
        }
        if !(self.min_height_factor > 0.0 && self.min_height_factor <= self.max_height_factor) {
            return Err(BodyError::InvalidConfig(format!(
                "height factor range [{}, {}] is empty or non-positive",
                self.min_height_factor, self.max_height_factor
            )));
        }
        check_budget(
            "pool_capacity",
            Some(self.pool_capacity),
            MAX_POOL_CAPACITY,
        )?;
        check_budget(
            "active_heads_per_gender",
            Some(self.active_heads_per_gender),
            MAX_ACTIVE_HEADS_PER_GENDER,
        )?;
        if !self.eyespy_hover_height.is_finite() {
            return Err(BodyError::InvalidConfig(
                "eyespy_hover_height must be finite".to_string(),
            ));
        }
        for (i, a) in self.stages.iter().enumerate() {
            check_budget("pool_capacity", a.pool_capacity, MAX_POOL_CAPACITY)?;
            check_budget(
                "active_heads_per_gender",
                a.active_heads_per_gender,
                MAX_ACTIVE_HEADS_PER_GENDER,
            )?;
            if self.stages[..i].iter().any(|b| b.stage == a.stage) {
                return Err(BodyError::InvalidConfig(format!(
                    "duplicate override for {}",
                    a.stage
                )));
            }
        }
        Ok(())
    }

    /// Resolves the budgets for `stage`.
    #[must_use]
    pub fn budget_for(&self, stage: StageId) -> StageBudget {
        let over = self.stages.iter().find(|o| o.stage == stage);
        StageBudget {
            pool_capacity: over
                .and_then(|o| o.pool_capacity)
                .unwrap_or(self.pool_capacity),
            active_heads_per_gender: over
                .and_then(|o| o.active_heads_per_gender)
                .unwrap_or(self.active_heads_per_gender),
        }
    }
}

fn check_budget(name: &str, value: Option<usize>, max: usize) -> BodyResult<()> {
    match value {
        Some(v) if v > max => Err(BodyError::InvalidConfig(format!(
            "{name} {v} exceeds the maximum of {max}"
        ))),
        _ => Ok(()),
    }
}
