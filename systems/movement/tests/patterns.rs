use anchorfall_core::{DifficultySetting, EccentricityModifier, MovementSynthesizer, Vec3};
use anchorfall_system_movement::{MovementPattern, PatternSynthesizer};

fn sample_patterns() -> Vec<MovementPattern> {
    let synthesizer = PatternSynthesizer::default();
    vec![
        synthesizer.synthesize_anchor_movement(
            Vec3::new(0.6, 0.0, 0.8),
            5.5,
            DifficultySetting::MEDIUM,
            2.0 / 6.0,
        ),
        synthesizer.synthesize_target_movement(0.04, 0.08, 0.2, 2.0 / 6.0),
    ]
}

#[test]
fn patterns_start_at_spawn_position() {
    let eccentricity = EccentricityModifier::new(Vec3::new(0.3, -0.2, 0.9));
    for pattern in sample_patterns() {
        let offset = pattern.displacement(0.0, eccentricity);
        assert!(
            offset.length() < 1e-6,
            "pattern {pattern:?} moved before any time elapsed: {offset:?}"
        );
    }
}

#[test]
fn eccentricity_is_read_at_evaluation_time() {
    let calm = EccentricityModifier::default();
    let skewed = EccentricityModifier::new(Vec3::new(0.5, 0.5, -0.5));
    for pattern in sample_patterns() {
        let before = pattern.displacement(1.3, calm);
        let after = pattern.displacement(1.3, skewed);
        assert!(
            (before - after).length() > 1e-6,
            "pattern {pattern:?} ignored the eccentricity modifier"
        );
    }
}

#[test]
fn patrol_stays_within_its_circle_without_eccentricity() {
    let pattern = MovementPattern::Patrol {
        heading: Vec3::X,
        radius: 4.0,
        angular_speed: 0.7,
        wobble: 0.5,
    };
    for step in 0..200 {
        let elapsed = step as f32 * 0.1;
        let offset = pattern.displacement(elapsed, EccentricityModifier::default());
        assert!(
            offset.length() <= 2.0 * 4.0 + 1e-4,
            "patrol left its circle at {elapsed}s: {offset:?}"
        );
        assert!(offset.y.abs() < 1e-6, "patrol left the horizontal plane");
    }
}
