use anchorfall_core::{DifficultyRating, DifficultySetting, Vec3, Wave, WaveId, WaveSeedContext};
use anchorfall_system_movement::{MovementPattern, PatternSynthesizer};
use anchorfall_system_wave_generation::{WaveGeneration, WaveTuning};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SETTINGS: [DifficultySetting; 3] = [
    DifficultySetting::EASY,
    DifficultySetting::MEDIUM,
    DifficultySetting::HARD,
];

fn ratings() -> Vec<f32> {
    vec![
        1.0, 1.5, 2.0, 7.3, 19.9, 20.0, 55.0, 100.002, 399.0, 400.0, 1_000.0, 8_000.0, 25_000.0,
        160_000.0, 1_000_000.0,
    ]
}

fn generate(rating: f32, setting: DifficultySetting, seed: u64) -> Wave<MovementPattern> {
    let generation = WaveGeneration::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generation.generate_with_rng(
        DifficultyRating::new(rating).expect("valid rating"),
        setting,
        &PatternSynthesizer::default(),
        &mut rng,
    )
}

#[test]
fn every_wave_has_at_least_one_anchor_and_target() {
    for rating in ratings() {
        for setting in SETTINGS {
            let wave = generate(rating, setting, 0x5eed);
            assert!(!wave.is_empty(), "rating {rating} produced an empty wave");
            for anchor in wave.iter() {
                assert!(
                    !anchor.targets().is_empty(),
                    "rating {rating} produced an anchor without targets"
                );
            }
        }
    }
}

#[test]
fn anchor_count_never_decreases_with_rating() {
    for setting in SETTINGS {
        let mut previous = 0;
        let mut rating = 1.0_f32;
        while rating < 2_000_000.0 {
            let count = generate(rating, setting, 11).len();
            assert!(
                count >= previous,
                "anchor count dropped from {previous} to {count} at rating {rating}"
            );
            previous = count;
            rating *= 1.37;
        }
        assert!(previous >= 4, "large ratings should produce several anchors");
    }
}

#[test]
fn initial_movements_are_unit_vectors() {
    for rating in ratings() {
        let wave = generate(rating, DifficultySetting::HARD, 99);
        for anchor in wave.iter() {
            let length = anchor.initial_movement().length();
            assert!((length - 1.0).abs() < 1e-5, "anchor heading length {length}");
            for target in anchor.targets() {
                let length = target.initial_movement().length();
                assert!((length - 1.0).abs() < 1e-5, "target heading length {length}");
            }
        }
    }
}

#[test]
fn reference_rating_yields_one_anchor_with_six_targets() {
    let wave = generate(100.002, DifficultySetting::EASY, 1);
    assert_eq!(wave.len(), 1);
    assert_eq!(wave.anchors()[0].targets().len(), 6);
    assert_eq!(wave.target_count(), 6);
}

#[test]
fn budget_is_split_evenly_across_anchors_and_targets() {
    let wave = generate(1.0e8, DifficultySetting::EASY, 23);
    assert_eq!(wave.len(), 6);

    let target_budget = 1.0e8_f32 / 6.0 / 23.0;
    let expected_max = target_budget.log2() * 0.03;
    let expected_min = target_budget.ln() / 4.0_f32.ln() * 0.02;
    for anchor in wave.iter() {
        assert_eq!(anchor.targets().len(), 23);
        for target in anchor.targets() {
            let MovementPattern::Orbit {
                min_distance,
                max_distance,
                ..
            } = *target.movement_pattern()
            else {
                panic!("targets orbit their anchor");
            };
            assert!(
                (max_distance - expected_max).abs() < 1e-5,
                "max distance {max_distance}, expected {expected_max}"
            );
            assert!((min_distance - expected_min).abs() < 1e-5);
        }
    }
    assert_eq!(wave.target_count(), 6 * 23);
}

#[test]
fn tiny_ratings_clamp_to_a_minimal_encounter() {
    let generation = WaveGeneration::default();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let wave = generation.generate_with_rng(
        DifficultyRating::saturating(-4.0),
        DifficultySetting::EASY,
        &PatternSynthesizer::default(),
        &mut rng,
    );
    assert_eq!(wave.len(), 1);
    assert_eq!(wave.target_count(), 1);
    for anchor in wave.iter() {
        for target in anchor.targets() {
            assert!(target.initial_position().is_finite());
            assert!(target.initial_position().length() < 1e-6);
        }
    }
}

#[test]
fn anchors_spawn_inside_the_forward_arc() {
    for rating in [100.002_f32, 8_000.0, 1_000_000.0] {
        let wave = generate(rating, DifficultySetting::MEDIUM, 42);
        let count = wave.len() as f32;
        let nearest = (count - 0.5) * 5.0 + 10.0;
        let furthest = (count + 0.5) * 5.0 + 10.0;
        for anchor in wave.iter() {
            let position = anchor.initial_position();
            assert!((position.y - 1.0).abs() < f32::EPSILON);
            let planar = Vec3::new(position.x, 0.0, position.z);
            let distance = planar.length();
            assert!(
                distance >= nearest - 1e-3 && distance <= furthest + 1e-3,
                "distance {distance} outside [{nearest}, {furthest}]"
            );
            assert!(
                position.z >= position.x.abs() - 1e-3,
                "anchor {position:?} outside the forward sector"
            );
        }
    }
}

#[test]
fn seeded_generation_replays_identically() {
    let generation = WaveGeneration::default();
    let synthesizer = PatternSynthesizer::default();
    let rating = DifficultyRating::new(12_345.0).expect("rating");
    let context = WaveSeedContext::new(0x4d59_5df4_d0f3_3173, WaveId::new(4));

    let first = generation.generate(rating, DifficultySetting::HARD, context, &synthesizer);
    let second = generation.generate(rating, DifficultySetting::HARD, context, &synthesizer);
    assert_eq!(first, second, "replay diverged between runs");

    let other_wave = generation.generate(
        rating,
        DifficultySetting::HARD,
        WaveSeedContext::new(0x4d59_5df4_d0f3_3173, WaveId::new(5)),
        &synthesizer,
    );
    assert_eq!(first.len(), other_wave.len());
    assert_ne!(first, other_wave, "different waves should not share samples");
}

#[test]
fn tuning_loads_partial_toml_over_defaults() {
    let tuning: WaveTuning = toml::from_str(
        r#"
        wobble_divisor = 3.0

        [anchor]
        log_base = 10.0
        "#,
    )
    .expect("tuning parses");
    assert!((tuning.anchor.log_base - 10.0).abs() < f32::EPSILON);
    assert!((tuning.anchor.distance_step - 5.0).abs() < f32::EPSILON);
    assert!((tuning.target.max_distance_scale - 0.03).abs() < f32::EPSILON);

    let generation = WaveGeneration::new(tuning).expect("valid tuning");
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let wave = generation.generate_with_rng(
        DifficultyRating::new(1_500.0).expect("rating"),
        DifficultySetting::EASY,
        &PatternSynthesizer::default(),
        &mut rng,
    );
    assert_eq!(wave.len(), 3);
}
