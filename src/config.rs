//! Simulation configuration
//!
//! Loaded from JSON when the host provides one, otherwise defaults.

use serde::{Deserialize, Serialize};

use crate::consts::GRAVITY;

/// Physics sub-stepping presets
///
/// Large single steps destabilize contact resolution, so every visible frame
/// runs several fixed-size sub-steps instead of one step of the frame delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StepPreset {
    /// 5 sub-steps of 2 ms
    #[default]
    Stable,
    /// 2 sub-steps of 10 ms
    Light,
}

impl StepPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepPreset::Stable => "Stable",
            StepPreset::Light => "Light",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stable" | "rich" => Some(StepPreset::Stable),
            "light" | "simple" => Some(StepPreset::Light),
            _ => None,
        }
    }

    /// Number of physics steps per frame
    pub fn substeps(&self) -> u32 {
        match self {
            StepPreset::Stable => 5,
            StepPreset::Light => 2,
        }
    }

    /// Length of one physics step (seconds)
    pub fn substep_dt(&self) -> f32 {
        match self {
            StepPreset::Stable => 0.002,
            StepPreset::Light => 0.01,
        }
    }

    /// Simulated time covered by one frame (seconds)
    pub fn frame_time(&self) -> f32 {
        self.substeps() as f32 * self.substep_dt()
    }
}

/// World tuning shared by every level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Sub-stepping preset
    #[serde(default)]
    pub preset: StepPreset,
    /// Downward gravity (pixels/s²)
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Seed for idle animation timing
    #[serde(default)]
    pub seed: u64,
}

fn default_gravity() -> f32 {
    GRAVITY
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            preset: StepPreset::Stable,
            gravity: GRAVITY,
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Create a config from a step preset
    pub fn from_preset(preset: StepPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Parse a config, falling back to defaults on malformed input
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => {
                log::info!("Loaded simulation config");
                config
            }
            Err(e) => {
                log::warn!("Bad simulation config ({}), using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_step_budgets() {
        assert_eq!(StepPreset::Stable.substeps(), 5);
        assert!((StepPreset::Stable.substep_dt() - 0.002).abs() < f32::EPSILON);
        assert_eq!(StepPreset::Light.substeps(), 2);
        assert!((StepPreset::Light.frame_time() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in [StepPreset::Stable, StepPreset::Light] {
            assert_eq!(StepPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(StepPreset::from_str("simple"), Some(StepPreset::Light));
        assert_eq!(StepPreset::from_str("turbo"), None);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SimConfig::from_json(r#"{"preset":"Light"}"#);
        assert_eq!(config.preset, StepPreset::Light);
        assert!((config.gravity - GRAVITY).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_json_falls_back() {
        let config = SimConfig::from_json("{not json");
        assert_eq!(config.preset, StepPreset::Stable);
    }
}
