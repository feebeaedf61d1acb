#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Anchorfall.
//!
//! The world owns the wave generator, the spawn scheduler, and the pool of
//! live anchors. Adapters mutate it exclusively through [`apply`] and read it
//! through the [`query`] module.

mod anchor;
mod pool;

use anchorfall_core::{Command, EntityPool, Event, WaveId, WaveSeedContext};
use anchorfall_system_movement::{MovementPattern, PatternSynthesizer};
use anchorfall_system_spawning::{Config as SchedulerConfig, SchedulerError, SpawnScheduler};
use anchorfall_system_wave_generation::{TuningError, WaveGeneration, WaveTuning};
use tracing::info;

pub use anchor::LiveAnchor;
pub use pool::{ObjectPool, Poolable};

const DEFAULT_GLOBAL_SEED: u64 = 0x4d59_5df4_d0f3_3173;

/// Construction parameters for a [`World`].
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Knobs handed to the wave generator.
    pub tuning: WaveTuning,
    /// Configuration of the spawn scheduler.
    pub scheduler: SchedulerConfig,
    /// Synthesizer turning generation parameters into movement patterns.
    pub synthesizer: PatternSynthesizer,
    /// Seed every per-wave random stream is derived from.
    pub global_seed: u64,
    /// Optional hard limit on the number of pooled anchor instances.
    pub pool_limit: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tuning: WaveTuning::default(),
            scheduler: SchedulerConfig::default(),
            synthesizer: PatternSynthesizer::default(),
            global_seed: DEFAULT_GLOBAL_SEED,
            pool_limit: None,
        }
    }
}

/// Represents the authoritative Anchorfall world state.
#[derive(Debug)]
pub struct World {
    generation: WaveGeneration,
    synthesizer: PatternSynthesizer,
    scheduler: SpawnScheduler<MovementPattern>,
    pool: ObjectPool<LiveAnchor>,
    global_seed: u64,
    next_wave: WaveId,
    current_wave: Option<WaveId>,
}

impl World {
    /// Creates a world using the default tuning and seeds.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(WaveGeneration::default(), WorldConfig::default())
    }

    /// Creates a world from explicit configuration, validating the tuning first.
    pub fn with_config(config: WorldConfig) -> Result<Self, TuningError> {
        let generation = WaveGeneration::new(config.tuning.clone())?;
        Ok(Self::from_parts(generation, config))
    }

    fn from_parts(generation: WaveGeneration, config: WorldConfig) -> Self {
        let pool = match config.pool_limit {
            Some(limit) => ObjectPool::with_capacity_limit(limit),
            None => ObjectPool::new(),
        };
        Self {
            generation,
            synthesizer: config.synthesizer,
            scheduler: SpawnScheduler::new(config.scheduler),
            pool,
            global_seed: config.global_seed,
            next_wave: WaveId::new(0),
            current_wave: None,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Only a tick can fail, and only when the anchor pool cannot supply an
/// instance. Live anchors still advance by the full frame in that case, and
/// the cursor is left untouched so the same anchor is retried on the next
/// tick.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), SchedulerError> {
    match command {
        Command::StartWave { rating, setting } => {
            let wave_id = world.next_wave;
            world.next_wave = wave_id.next();

            let wave = world.generation.generate(
                rating,
                setting,
                WaveSeedContext::new(world.global_seed, wave_id),
                &world.synthesizer,
            );
            info!(
                wave = wave_id.get(),
                rating = rating.get(),
                setting = setting.get(),
                anchors = wave.len(),
                targets = wave.target_count(),
                "starting wave"
            );
            out_events.push(Event::WaveGenerated {
                wave: wave_id,
                anchors: wave.len(),
                targets: wave.target_count(),
            });
            world.scheduler.initialize_wave(wave);
            world.current_wave = Some(wave_id);
        }
        Command::SetInWave { in_wave } => {
            world.scheduler.set_in_wave(in_wave);
        }
        Command::Tick { dt } => {
            let dispatch = world.scheduler.tick(dt, &mut world.pool, out_events);

            let eccentricity = world.scheduler.eccentricity();
            for (_, anchor) in world.pool.iter_checked_out_mut() {
                anchor.advance(dt, eccentricity);
            }
            dispatch?;
        }
        Command::RetireAnchor { handle } => {
            if world.pool.release(handle) {
                out_events.push(Event::AnchorRetired { handle });
            }
        }
        Command::DespawnAllAnchors => {
            let cleared_slots = world.scheduler.despawn_all_anchors(&mut world.pool);
            info!(cleared_slots, "despawned all anchors");
            out_events.push(Event::AnchorsDespawned { cleared_slots });
        }
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{LiveAnchor, World};
    use anchorfall_core::{EccentricityModifier, PoolHandle, Vec3, Wave, WaveId};
    use anchorfall_system_movement::MovementPattern;
    use anchorfall_system_spawning::SchedulerPhase;

    /// Number of slots whose anchor is still live.
    #[must_use]
    pub fn active_count(world: &World) -> usize {
        world.scheduler.active_count(&world.pool)
    }

    /// Index of the most recently dispatched anchor of the current wave.
    #[must_use]
    pub fn cursor(world: &World) -> Option<usize> {
        world.scheduler.cursor()
    }

    /// Number of anchors of the current wave still waiting for a slot.
    #[must_use]
    pub fn pending_count(world: &World) -> usize {
        world.scheduler.pending_count()
    }

    /// Coarse progress of the current wave.
    #[must_use]
    pub fn phase(world: &World) -> SchedulerPhase {
        world.scheduler.phase()
    }

    /// Reports whether the current wave has been fully dispatched and cleared.
    #[must_use]
    pub fn is_exhausted(world: &World) -> bool {
        world.scheduler.is_exhausted(&world.pool)
    }

    /// Whether ticks currently dispatch pending anchors.
    #[must_use]
    pub fn in_wave(world: &World) -> bool {
        world.scheduler.in_wave()
    }

    /// Eccentricity modifier live anchors currently apply.
    #[must_use]
    pub fn eccentricity(world: &World) -> EccentricityModifier {
        world.scheduler.eccentricity()
    }

    /// Identifier of the most recently started wave.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<WaveId> {
        world.current_wave
    }

    /// Provides read-only access to the wave being dispatched.
    #[must_use]
    pub fn wave(world: &World) -> Option<&Wave<MovementPattern>> {
        world.scheduler.wave()
    }

    /// Number of ticks that had spare capacity but could not find a slot.
    #[must_use]
    pub fn skipped_dispatches(world: &World) -> u64 {
        world.scheduler.skipped_dispatches()
    }

    /// Number of anchor instances the pool has created so far.
    #[must_use]
    pub fn pool_size(world: &World) -> usize {
        world.pool.len()
    }

    /// Read access to a single live anchor.
    #[must_use]
    pub fn anchor(world: &World, handle: PoolHandle) -> Option<&LiveAnchor> {
        world.pool.get(handle)
    }

    /// Captures a read-only view of every live anchor.
    #[must_use]
    pub fn anchor_view(world: &World) -> AnchorView {
        let snapshots = world
            .pool
            .iter_checked_out()
            .map(|(handle, anchor)| AnchorSnapshot {
                handle,
                position: anchor.position(),
                target_positions: anchor.target_positions().to_vec(),
                elapsed: anchor.elapsed(),
            })
            .collect();
        AnchorView { snapshots }
    }

    /// Read-only snapshot describing all live anchors.
    #[derive(Clone, Debug)]
    pub struct AnchorView {
        snapshots: Vec<AnchorSnapshot>,
    }

    impl AnchorView {
        /// Iterator over the captured snapshots in slot order.
        pub fn iter(&self) -> impl Iterator<Item = &AnchorSnapshot> {
            self.snapshots.iter()
        }

        /// Number of captured anchors.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no anchor is live.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the captured snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AnchorSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single anchor's state.
    #[derive(Clone, Debug, PartialEq)]
    pub struct AnchorSnapshot {
        /// Pool handle addressing the anchor.
        pub handle: PoolHandle,
        /// Current world-space position.
        pub position: Vec3,
        /// Current world-space positions of the anchor's targets.
        pub target_positions: Vec<Vec3>,
        /// Simulated time since the anchor was dispatched.
        pub elapsed: Duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorfall_core::{DifficultyRating, DifficultySetting};
    use std::time::Duration;

    fn start(world: &mut World, rating: f32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::StartWave {
                rating: DifficultyRating::new(rating).expect("rating"),
                setting: DifficultySetting::EASY,
            },
            &mut events,
        )
        .expect("starting a wave never fails");
        events
    }

    #[test]
    fn start_wave_reports_generated_wave() {
        let mut world = World::new();
        let events = start(&mut world, 100.002);

        assert_eq!(
            events,
            vec![Event::WaveGenerated {
                wave: WaveId::new(0),
                anchors: 1,
                targets: 6,
            }]
        );
        assert_eq!(query::current_wave(&world), Some(WaveId::new(0)));
        assert_eq!(query::pending_count(&world), 1);
        assert!(!query::in_wave(&world));
    }

    #[test]
    fn consecutive_waves_get_fresh_identifiers() {
        let mut world = World::new();
        let _ = start(&mut world, 50.0);
        let events = start(&mut world, 50.0);
        assert!(matches!(
            events.as_slice(),
            [Event::WaveGenerated { wave, .. }] if *wave == WaveId::new(1)
        ));
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let mut config = WorldConfig::default();
        config.tuning.target.log_base = 0.5;
        assert!(World::with_config(config).is_err());
    }

    #[test]
    fn retiring_a_stale_handle_is_silent() {
        let mut world = World::new();
        let _ = start(&mut world, 100.002);
        let mut events = Vec::new();
        apply(&mut world, Command::SetInWave { in_wave: true }, &mut events).expect("set");
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        )
        .expect("tick");
        let handle = query::anchor_view(&world)
            .iter()
            .map(|snapshot| snapshot.handle)
            .next()
            .expect("one anchor dispatched");

        events.clear();
        apply(&mut world, Command::RetireAnchor { handle }, &mut events).expect("retire");
        apply(&mut world, Command::RetireAnchor { handle }, &mut events).expect("retire");
        assert_eq!(events, vec![Event::AnchorRetired { handle }]);
        assert!(query::anchor(&world, handle).is_none());
    }
}
