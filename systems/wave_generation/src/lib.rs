#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Difficulty-scaled wave generation system.
//!
//! A wave is a list of anchors, each owning a cluster of targets. Both counts
//! grow logarithmically with the difficulty budget they receive: the rating is
//! split evenly across anchors, and each anchor's share is split evenly across
//! its targets.

mod tuning;

use anchorfall_core::{
    AnchorSpec, DifficultyRating, DifficultySetting, MovementSynthesizer, TargetSpec, Vec3, Wave,
    WaveSeedContext,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitBall, UnitSphere};
use sha2::{Digest, Sha256};
use tracing::debug;

pub use tuning::{AnchorTuning, TargetTuning, TuningError, WaveTuning};

const RNG_STREAM_WAVE: &str = "anchorfall.wave";

/// Pure system that turns a difficulty rating into a [`Wave`].
#[derive(Debug, Default)]
pub struct WaveGeneration {
    tuning: WaveTuning,
}

impl WaveGeneration {
    /// Creates a generator using the provided tuning surface.
    pub fn new(tuning: WaveTuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self { tuning })
    }

    /// Tuning the generator was built with.
    #[must_use]
    pub fn tuning(&self) -> &WaveTuning {
        &self.tuning
    }

    /// Generates a wave from a random stream derived from `seed`.
    ///
    /// The same rating, setting, and seed context always produce the same wave.
    pub fn generate<S>(
        &self,
        rating: DifficultyRating,
        setting: DifficultySetting,
        seed: WaveSeedContext,
        synthesizer: &S,
    ) -> Wave<S::Pattern>
    where
        S: MovementSynthesizer + ?Sized,
    {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(seed, setting));
        self.generate_with_rng(rating, setting, synthesizer, &mut rng)
    }

    /// Generates a wave drawing every random sample from `rng`.
    pub fn generate_with_rng<S, R>(
        &self,
        rating: DifficultyRating,
        setting: DifficultySetting,
        synthesizer: &S,
        rng: &mut R,
    ) -> Wave<S::Pattern>
    where
        S: MovementSynthesizer + ?Sized,
        R: Rng + ?Sized,
    {
        let rating = rating.get();
        let anchor_count = floor_biased_log_count(rating, self.tuning.anchor.log_base);
        let anchor_budget = rating / anchor_count as f32;
        let wobble = setting.scalar() / self.tuning.wobble_divisor;

        let mut anchors = Vec::with_capacity(anchor_count);
        for _ in 0..anchor_count {
            let targets = self.generate_targets(anchor_budget, setting, wobble, synthesizer, rng);
            anchors.push(self.generate_anchor(
                targets,
                anchor_count,
                setting,
                wobble,
                synthesizer,
                rng,
            ));
        }

        let wave = Wave::new(anchors);
        debug!(
            rating,
            setting = setting.get(),
            anchors = wave.len(),
            targets = wave.target_count(),
            "generated wave"
        );
        wave
    }

    fn generate_anchor<S, R>(
        &self,
        targets: Vec<TargetSpec<S::Pattern>>,
        anchor_count: usize,
        setting: DifficultySetting,
        wobble: f32,
        synthesizer: &S,
        rng: &mut R,
    ) -> AnchorSpec<S::Pattern>
    where
        S: MovementSynthesizer + ?Sized,
        R: Rng + ?Sized,
    {
        let tuning = &self.tuning.anchor;
        let angle = (rng.gen::<f32>() - 0.5) * tuning.play_area_degrees.to_radians()
            + tuning.play_area_offset_degrees.to_radians();
        let distance = (anchor_count as f32 + rng.gen::<f32>() - 0.5) * tuning.distance_step
            + tuning.base_distance;
        let patrol_radius = tuning.patrol_radius_base
            + rng.gen_range(-1.0_f32..1.0) * tuning.patrol_radius_variance;

        let position = Vec3::new(
            distance * angle.cos(),
            tuning.spawn_height,
            distance * angle.sin(),
        );
        let initial_movement = sample_unit_vector(rng);
        let pattern = synthesizer.synthesize_anchor_movement(
            initial_movement,
            patrol_radius,
            setting,
            wobble,
        );

        AnchorSpec::new(targets, position, initial_movement, pattern)
    }

    fn generate_targets<S, R>(
        &self,
        anchor_budget: f32,
        setting: DifficultySetting,
        wobble: f32,
        synthesizer: &S,
        rng: &mut R,
    ) -> Vec<TargetSpec<S::Pattern>>
    where
        S: MovementSynthesizer + ?Sized,
        R: Rng + ?Sized,
    {
        let tuning = &self.tuning.target;
        let target_count = floor_biased_log_count(anchor_budget, tuning.log_base);
        let target_budget = anchor_budget / target_count as f32;

        // Every target of an anchor receives the same budget, so the bounds are shared.
        let max_distance = (log_base(target_budget, tuning.distance_log_base)
            * tuning.max_distance_scale)
            .max(0.0);
        let min_distance = (log_base(target_budget, tuning.distance_log_base * 2.0)
            * tuning.min_distance_scale)
            .max(0.0);
        let speed = setting.scalar() * tuning.speed_scale;

        (0..target_count)
            .map(|_| {
                let position = sample_in_unit_ball(rng) * max_distance;
                let movement = sample_unit_vector(rng);
                let pattern = synthesizer.synthesize_target_movement(
                    min_distance,
                    max_distance,
                    speed,
                    wobble,
                );
                TargetSpec::new(position, movement, pattern)
            })
            .collect()
    }
}

/// Converts a budget into an entity count growing logarithmically with `base`.
///
/// Half a step is subtracted before rounding so the count only increases once
/// the budget has almost reached the next power of `base`. Ties round to
/// even. Counts below one, including those produced by budgets under one or
/// by non-finite inputs, are clamped to one.
#[must_use]
pub fn floor_biased_log_count(budget: f32, base: f32) -> usize {
    let raw = (log_base(budget, base) - 0.5).round_ties_even();
    if raw >= 1.0 {
        raw as usize
    } else {
        debug!(budget, base, raw, "clamped degenerate count to one");
        1
    }
}

fn log_base(value: f32, base: f32) -> f32 {
    value.ln() / base.ln()
}

fn sample_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let sample: [f32; 3] = UnitSphere.sample(rng);
    Vec3::from_array(sample).try_normalize().unwrap_or(Vec3::X)
}

fn sample_in_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let sample: [f32; 3] = UnitBall.sample(rng);
    Vec3::from_array(sample)
}

fn derive_wave_seed(seed: WaveSeedContext, setting: DifficultySetting) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.global_seed().to_le_bytes());
    hasher.update(seed.wave().get().to_le_bytes());
    hasher.update(setting.get().to_le_bytes());
    hasher.update(RNG_STREAM_WAVE.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorfall_core::WaveId;

    #[derive(Debug)]
    struct RecordingSynthesizer;

    impl MovementSynthesizer for RecordingSynthesizer {
        type Pattern = (f32, f32, f32, f32);

        fn synthesize_anchor_movement(
            &self,
            _initial_movement: Vec3,
            radius: f32,
            tier: DifficultySetting,
            wobble: f32,
        ) -> Self::Pattern {
            (radius, tier.scalar(), wobble, 0.0)
        }

        fn synthesize_target_movement(
            &self,
            min_distance: f32,
            max_distance: f32,
            speed: f32,
            wobble: f32,
        ) -> Self::Pattern {
            (min_distance, max_distance, speed, wobble)
        }
    }

    #[test]
    fn counts_follow_floor_biased_rounding() {
        assert_eq!(floor_biased_log_count(100.002, 20.0), 1);
        assert_eq!(floor_biased_log_count(100.002, 2.0), 6);
        assert_eq!(floor_biased_log_count(20.0 * 20.0 * 20.0 * 1.5, 20.0), 3);
    }

    #[test]
    fn degenerate_budgets_clamp_to_one() {
        assert_eq!(floor_biased_log_count(1.0, 20.0), 1);
        assert_eq!(floor_biased_log_count(0.25, 2.0), 1);
        assert_eq!(floor_biased_log_count(f32::MIN_POSITIVE, 2.0), 1);
        assert_eq!(floor_biased_log_count(f32::NAN, 2.0), 1);
    }

    #[test]
    fn seed_derivation_separates_waves_and_settings() {
        let first = WaveSeedContext::new(7, WaveId::new(0));
        let second = WaveSeedContext::new(7, WaveId::new(1));
        assert_ne!(
            derive_wave_seed(first, DifficultySetting::EASY),
            derive_wave_seed(second, DifficultySetting::EASY)
        );
        assert_ne!(
            derive_wave_seed(first, DifficultySetting::EASY),
            derive_wave_seed(first, DifficultySetting::HARD)
        );
    }

    #[test]
    fn synthesizer_receives_tier_scaled_parameters() {
        let generation = WaveGeneration::default();
        let rating = DifficultyRating::new(100.002).expect("rating");
        let wave = generation.generate(
            rating,
            DifficultySetting::MEDIUM,
            WaveSeedContext::new(3, WaveId::new(0)),
            &RecordingSynthesizer,
        );

        let anchor = wave.get(0).expect("one anchor");
        let (radius, tier, wobble, _) = *anchor.movement_pattern();
        assert!((3.0..=7.0).contains(&radius), "patrol radius {radius}");
        assert!((tier - 2.0).abs() < f32::EPSILON);
        assert!((wobble - 2.0 / 6.0).abs() < 1e-6);

        let budget = 100.002_f32 / 6.0;
        let expected_max = budget.log2() * 0.03;
        let expected_min = budget.ln() / 4.0_f32.ln() * 0.02;
        for target in anchor.targets() {
            let (min_distance, max_distance, speed, target_wobble) = *target.movement_pattern();
            assert!((max_distance - expected_max).abs() < 1e-5);
            assert!((min_distance - expected_min).abs() < 1e-5);
            assert!((speed - 0.2).abs() < 1e-6);
            assert!((target_wobble - wobble).abs() < f32::EPSILON);
            assert!(target.initial_position().length() <= max_distance + 1e-5);
        }
    }
}
