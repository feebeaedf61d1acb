#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement pattern synthesis for generated anchors and targets.
//!
//! Patterns are plain data. Live entities evaluate them every frame through
//! [`MovementPattern::displacement`], passing the eccentricity modifier that
//! is current for that frame.

use anchorfall_core::{DifficultySetting, EccentricityModifier, MovementSynthesizer, Vec3};
use serde::{Deserialize, Serialize};

const DEFAULT_PATROL_ANGULAR_SPEED: f32 = 0.25;
const DEFAULT_ORBIT_RATE: f32 = 10.0;

/// Kinematic descriptor attached to a generated entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Anchor circling away from its spawn point in the horizontal plane.
    Patrol {
        /// Unit heading the anchor starts moving along.
        heading: Vec3,
        /// Radius of the patrol circle in world units.
        radius: f32,
        /// Angular velocity around the patrol circle in radians per second.
        angular_speed: f32,
        /// Share of the radius the eccentricity modifier may displace the anchor by.
        wobble: f32,
    },
    /// Target looping around its anchor-relative spawn offset.
    Orbit {
        /// Closest the loop brings the target back towards its anchor.
        min_distance: f32,
        /// Furthest the target is allowed to drift from its anchor.
        max_distance: f32,
        /// Angular velocity of the loop in radians per second.
        angular_speed: f32,
        /// Share of the loop span the eccentricity modifier may displace the target by.
        wobble: f32,
    },
}

impl MovementPattern {
    /// Offset from the spawn position after `elapsed` seconds.
    ///
    /// Every pattern starts at its spawn position, so the offset at zero
    /// elapsed time is always zero.
    #[must_use]
    pub fn displacement(&self, elapsed: f32, eccentricity: EccentricityModifier) -> Vec3 {
        match *self {
            Self::Patrol {
                heading,
                radius,
                angular_speed,
                wobble,
            } => {
                let angle = angular_speed * elapsed;
                let forward = Vec3::new(heading.x, 0.0, heading.z)
                    .try_normalize()
                    .unwrap_or(Vec3::X);
                let lateral = Vec3::Y.cross(forward);
                let circle =
                    forward * (radius * angle.sin()) + lateral * (radius * (1.0 - angle.cos()));
                circle + eccentricity.get() * (wobble * radius * angle.sin())
            }
            Self::Orbit {
                min_distance,
                max_distance,
                angular_speed,
                wobble,
            } => {
                let angle = angular_speed * elapsed;
                let span = (max_distance - min_distance).max(0.0);
                let reach = min_distance.max(0.0) + span * 0.5;
                let loop_offset =
                    Vec3::new(angle.sin(), 0.5 * (2.0 * angle).sin(), 1.0 - angle.cos()) * reach;
                loop_offset + eccentricity.get() * (wobble * span * angle.sin())
            }
        }
    }
}

/// Default synthesizer turning generation parameters into [`MovementPattern`] values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternSynthesizer {
    patrol_angular_speed: f32,
    orbit_rate: f32,
}

impl PatternSynthesizer {
    /// Creates a synthesizer.
    ///
    /// `patrol_angular_speed` is the anchor angular velocity per difficulty
    /// tier; `orbit_rate` converts a target speed into an angular velocity.
    #[must_use]
    pub const fn new(patrol_angular_speed: f32, orbit_rate: f32) -> Self {
        Self {
            patrol_angular_speed,
            orbit_rate,
        }
    }
}

impl Default for PatternSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_PATROL_ANGULAR_SPEED, DEFAULT_ORBIT_RATE)
    }
}

impl MovementSynthesizer for PatternSynthesizer {
    type Pattern = MovementPattern;

    fn synthesize_anchor_movement(
        &self,
        initial_movement: Vec3,
        radius: f32,
        tier: DifficultySetting,
        wobble: f32,
    ) -> MovementPattern {
        MovementPattern::Patrol {
            heading: initial_movement,
            radius: radius.max(0.0),
            angular_speed: self.patrol_angular_speed * tier.scalar(),
            wobble,
        }
    }

    fn synthesize_target_movement(
        &self,
        min_distance: f32,
        max_distance: f32,
        speed: f32,
        wobble: f32,
    ) -> MovementPattern {
        MovementPattern::Orbit {
            min_distance,
            max_distance,
            angular_speed: speed * self.orbit_rate,
            wobble,
        }
    }
}
