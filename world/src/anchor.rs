use std::time::Duration;

use anchorfall_core::{AnchorSpec, EccentricityModifier, SpawnedEntity, Vec3};
use anchorfall_system_movement::MovementPattern;

use crate::pool::Poolable;

/// Pooled anchor instance animated from the parameters it was bound to.
#[derive(Debug, Default)]
pub struct LiveAnchor {
    spec: Option<AnchorSpec<MovementPattern>>,
    active: bool,
    elapsed: Duration,
    position: Vec3,
    target_positions: Vec<Vec3>,
}

impl LiveAnchor {
    /// Parameters the anchor was bound to on checkout.
    #[must_use]
    pub fn spec(&self) -> Option<&AnchorSpec<MovementPattern>> {
        self.spec.as_ref()
    }

    /// Current world-space position of the anchor.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current world-space positions of the targets clustered around the anchor.
    #[must_use]
    pub fn target_positions(&self) -> &[Vec3] {
        &self.target_positions
    }

    /// Simulated time since the anchor was activated.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Moves the anchor and its targets forward by `dt`.
    pub fn advance(&mut self, dt: Duration, eccentricity: EccentricityModifier) {
        if !self.active {
            return;
        }
        let Some(spec) = self.spec.as_ref() else {
            return;
        };

        self.elapsed = self.elapsed.saturating_add(dt);
        let t = self.elapsed.as_secs_f32();
        self.position =
            spec.initial_position() + spec.movement_pattern().displacement(t, eccentricity);

        let anchor = self.position;
        self.target_positions.clear();
        self.target_positions.extend(spec.targets().iter().map(|target| {
            let drift = target.movement_pattern().displacement(t, eccentricity);
            anchor + target.initial_position() + drift
        }));
    }
}

impl SpawnedEntity for LiveAnchor {
    type Pattern = MovementPattern;

    fn bind(&mut self, spec: AnchorSpec<MovementPattern>) {
        let origin = spec.initial_position();
        self.elapsed = Duration::ZERO;
        self.position = origin;
        self.target_positions.clear();
        self.target_positions
            .extend(spec.targets().iter().map(|target| origin + target.initial_position()));
        self.spec = Some(spec);
    }

    fn activate(&mut self) {
        self.active = self.spec.is_some();
    }
}

impl Poolable for LiveAnchor {
    fn reset(&mut self) {
        self.spec = None;
        self.active = false;
        self.elapsed = Duration::ZERO;
        self.position = Vec3::ZERO;
        self.target_positions.clear();
    }

    fn is_live(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorfall_core::TargetSpec;

    fn spec() -> AnchorSpec<MovementPattern> {
        let orbit = MovementPattern::Orbit {
            min_distance: 0.1,
            max_distance: 0.3,
            angular_speed: 1.0,
            wobble: 0.0,
        };
        AnchorSpec::new(
            vec![
                TargetSpec::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X, orbit),
                TargetSpec::new(Vec3::new(0.0, 0.25, 0.0), Vec3::Y, orbit),
            ],
            Vec3::new(0.0, 1.0, 20.0),
            Vec3::X,
            MovementPattern::Patrol {
                heading: Vec3::X,
                radius: 5.0,
                angular_speed: 0.5,
                wobble: 0.0,
            },
        )
    }

    #[test]
    fn bind_places_targets_around_the_spawn_point() {
        let mut anchor = LiveAnchor::default();
        anchor.bind(spec());
        assert_eq!(anchor.position(), Vec3::new(0.0, 1.0, 20.0));
        assert_eq!(
            anchor.target_positions(),
            &[Vec3::new(0.5, 1.0, 20.0), Vec3::new(0.0, 1.25, 20.0)]
        );
        assert!(!anchor.is_live());
    }

    #[test]
    fn inactive_anchors_do_not_move() {
        let mut anchor = LiveAnchor::default();
        anchor.bind(spec());
        anchor.advance(Duration::from_secs(1), EccentricityModifier::default());
        assert_eq!(anchor.elapsed(), Duration::ZERO);
        assert_eq!(anchor.position(), Vec3::new(0.0, 1.0, 20.0));
    }

    #[test]
    fn active_anchor_drags_its_targets_along() {
        let mut anchor = LiveAnchor::default();
        anchor.bind(spec());
        anchor.activate();
        anchor.advance(Duration::from_millis(1500), EccentricityModifier::default());

        assert_ne!(anchor.position(), Vec3::new(0.0, 1.0, 20.0));
        for target in anchor.target_positions() {
            assert!(target.distance(anchor.position()) < 1.0);
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut anchor = LiveAnchor::default();
        anchor.bind(spec());
        anchor.activate();
        anchor.reset();
        assert!(anchor.spec().is_none());
        assert!(anchor.target_positions().is_empty());
        assert!(!anchor.is_live());
    }
}
