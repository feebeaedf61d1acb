use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated tuning knobs controlling every adjustable aspect of wave generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Controls anchor count, placement, and patrol radius.
    pub anchor: AnchorTuning,
    /// Controls target count, spread, and speed.
    pub target: TargetTuning,
    /// Divides the difficulty tier to obtain the wobble handed to the synthesizer.
    pub wobble_divisor: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            anchor: AnchorTuning::default(),
            target: TargetTuning::default(),
            wobble_divisor: 6.0,
        }
    }
}

impl WaveTuning {
    /// Checks that every knob lies in a range the generator can work with.
    pub fn validate(&self) -> Result<(), TuningError> {
        let anchor = &self.anchor;
        let target = &self.target;
        check_log_base("anchor.log_base", anchor.log_base)?;
        check_log_base("target.log_base", target.log_base)?;
        check_log_base("target.distance_log_base", target.distance_log_base)?;
        check_non_negative("anchor.play_area_degrees", anchor.play_area_degrees)?;
        check_finite("anchor.play_area_offset_degrees", anchor.play_area_offset_degrees)?;
        check_non_negative("anchor.distance_step", anchor.distance_step)?;
        check_non_negative("anchor.base_distance", anchor.base_distance)?;
        check_finite("anchor.spawn_height", anchor.spawn_height)?;
        check_non_negative("anchor.patrol_radius_base", anchor.patrol_radius_base)?;
        check_non_negative("anchor.patrol_radius_variance", anchor.patrol_radius_variance)?;
        check_non_negative("target.max_distance_scale", target.max_distance_scale)?;
        check_non_negative("target.min_distance_scale", target.min_distance_scale)?;
        check_non_negative("target.speed_scale", target.speed_scale)?;
        if !(self.wobble_divisor.is_finite() && self.wobble_divisor > 0.0) {
            return Err(TuningError::OutOfRange {
                field: "wobble_divisor",
                value: self.wobble_divisor,
                expected: "a finite value greater than zero",
            });
        }
        Ok(())
    }
}

/// Anchor placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorTuning {
    /// Logarithm base of the anchor count.
    ///
    /// One more anchor is added roughly every time the difficulty multiplies by it.
    pub log_base: f32,
    /// Angular width of the sector anchors spawn in, in degrees.
    pub play_area_degrees: f32,
    /// Angle the spawn sector is centred on, in degrees; 90 points straight ahead.
    pub play_area_offset_degrees: f32,
    /// Distance added per anchor in the wave; larger waves spawn further out.
    pub distance_step: f32,
    /// Distance every anchor keeps from the origin regardless of wave size.
    pub base_distance: f32,
    /// Height anchors spawn at.
    pub spawn_height: f32,
    /// Mean radius of the anchor patrol circle.
    pub patrol_radius_base: f32,
    /// Maximum deviation from the mean patrol radius in either direction.
    pub patrol_radius_variance: f32,
}

impl Default for AnchorTuning {
    fn default() -> Self {
        Self {
            log_base: 20.0,
            play_area_degrees: 90.0,
            play_area_offset_degrees: 90.0,
            distance_step: 5.0,
            base_distance: 10.0,
            spawn_height: 1.0,
            patrol_radius_base: 5.0,
            patrol_radius_variance: 2.0,
        }
    }
}

/// Target placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    /// Logarithm base of the per-anchor target count.
    pub log_base: f32,
    /// Logarithm base of the maximum target distance; the minimum distance uses twice this base.
    pub distance_log_base: f32,
    /// Scale applied to the logarithmic maximum distance.
    pub max_distance_scale: f32,
    /// Scale applied to the logarithmic minimum distance.
    pub min_distance_scale: f32,
    /// Target speed per difficulty tier.
    pub speed_scale: f32,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            log_base: 2.0,
            distance_log_base: 2.0,
            max_distance_scale: 0.03,
            min_distance_scale: 0.02,
            speed_scale: 0.1,
        }
    }
}

/// Reasons a tuning surface may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum TuningError {
    /// A knob held a value the generator cannot use.
    #[error("tuning field `{field}` is {value}, expected {expected}")]
    OutOfRange {
        /// Dotted path of the offending knob.
        field: &'static str,
        /// Value that was rejected.
        value: f32,
        /// Human readable description of the accepted range.
        expected: &'static str,
    },
}

fn check_log_base(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 1.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            expected: "a finite logarithm base greater than one",
        })
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            expected: "a finite non-negative value",
        })
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            expected: "a finite value",
        })
    }
}
