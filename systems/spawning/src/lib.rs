#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame spawn scheduler that drip-feeds generated anchors into live slots.

use std::time::Duration;

use anchorfall_core::{
    EccentricityModifier, EntityPool, Event, PoolError, PoolHandle, SpawnedEntity, Vec3, Wave,
    SLOT_CAPACITY,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitBall};
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_ECCENTRICITY_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_RNG_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Configuration parameters required to construct the spawn scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    eccentricity_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided resample cadence and seed.
    ///
    /// A zero interval disables eccentricity resampling.
    #[must_use]
    pub const fn new(eccentricity_interval: Duration, rng_seed: u64) -> Self {
        Self {
            eccentricity_interval,
            rng_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_ECCENTRICITY_INTERVAL, DEFAULT_RNG_SEED)
    }
}

/// Coarse progress of the wave held by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerPhase {
    /// No wave has been initialized yet.
    Idle,
    /// Some anchors of the wave are still waiting for a slot.
    Dispatching,
    /// Every anchor has been dispatched; live anchors may still occupy slots.
    Draining,
}

/// Failures that abort a scheduler tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The pool could not provide an instance for the next anchor.
    #[error("entity pool failed to provide an anchor instance")]
    Pool(#[from] PoolError),
    /// The pool issued a handle it could not resolve; the handle has been
    /// released again.
    #[error("entity pool issued handle {handle:?} without a backing instance")]
    UnboundHandle {
        /// Handle returned by the pool.
        handle: PoolHandle,
    },
}

/// Stateful system dispatching at most one pending anchor per frame.
#[derive(Debug)]
pub struct SpawnScheduler<P> {
    wave: Option<Wave<P>>,
    cursor: Option<usize>,
    slots: [Option<PoolHandle>; SLOT_CAPACITY],
    in_wave: bool,
    eccentricity: EccentricityModifier,
    eccentricity_interval: Duration,
    accumulator: Duration,
    rng: ChaCha8Rng,
    skipped_dispatches: u64,
}

impl<P> SpawnScheduler<P> {
    /// Creates an idle scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            wave: None,
            cursor: None,
            slots: [None; SLOT_CAPACITY],
            in_wave: false,
            eccentricity: EccentricityModifier::default(),
            eccentricity_interval: config.eccentricity_interval,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            skipped_dispatches: 0,
        }
    }

    /// Stores a freshly generated wave and rewinds the cursor.
    ///
    /// Occupied slots are left untouched; use
    /// [`SpawnScheduler::despawn_all_anchors`] to clear them.
    pub fn initialize_wave(&mut self, wave: Wave<P>) {
        self.wave = Some(wave);
        self.cursor = None;
    }

    /// Whether ticks currently dispatch pending anchors.
    #[must_use]
    pub const fn in_wave(&self) -> bool {
        self.in_wave
    }

    /// Enables or disables dispatch on subsequent ticks.
    pub fn set_in_wave(&mut self, in_wave: bool) {
        self.in_wave = in_wave;
    }

    /// Advances the scheduler by one frame.
    ///
    /// Resamples the eccentricity modifier whenever its interval elapses,
    /// then, while in a wave and below capacity, binds the next pending
    /// anchor to a freshly acquired pool instance. Events describing what
    /// happened are appended to `out`.
    pub fn tick<E>(
        &mut self,
        dt: Duration,
        pool: &mut E,
        out: &mut Vec<Event>,
    ) -> Result<(), SchedulerError>
    where
        E: EntityPool,
        E::Entity: SpawnedEntity<Pattern = P>,
        P: Clone,
    {
        self.advance_eccentricity(dt, out);

        if !self.in_wave || self.active_count(pool) >= SLOT_CAPACITY {
            return Ok(());
        }

        let Some(wave_len) = self.wave.as_ref().map(Wave::len) else {
            return Ok(());
        };

        let next = self.cursor.map_or(0, |cursor| cursor.saturating_add(1));
        if next >= wave_len {
            self.cursor = Some(wave_len);
            return Ok(());
        }

        let Some(spec) = self.wave.as_ref().and_then(|wave| wave.get(next)).cloned() else {
            return Ok(());
        };

        let Some(slot) = self.claim_slot(pool, out) else {
            self.skipped_dispatches = self.skipped_dispatches.saturating_add(1);
            warn!(
                anchor_index = next,
                "no slot available despite spare capacity; anchor stays pending"
            );
            out.push(Event::DispatchSkipped { anchor_index: next });
            return Ok(());
        };

        let handle = pool.acquire()?;
        let Some(entity) = pool.entity_mut(handle) else {
            let _ = pool.release(handle);
            return Err(SchedulerError::UnboundHandle { handle });
        };
        entity.bind(spec);
        entity.activate();

        self.slots[slot] = Some(handle);
        self.cursor = Some(next);
        debug!(slot, anchor_index = next, "dispatched anchor");
        out.push(Event::AnchorDispatched {
            slot,
            handle,
            anchor_index: next,
        });
        Ok(())
    }

    /// Counts slots whose occupant the pool still reports as live.
    ///
    /// Slots holding recycled instances are not cleared here.
    #[must_use]
    pub fn active_count<E: EntityPool>(&self, pool: &E) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|handle| pool.is_live(**handle))
            .count()
    }

    /// Releases every pooled instance and empties every slot.
    ///
    /// The cursor is left where it is. Returns the number of slots that were
    /// occupied before the call.
    pub fn despawn_all_anchors<E: EntityPool>(&mut self, pool: &mut E) -> usize {
        pool.release_all();
        let cleared = self.slots.iter().flatten().count();
        self.slots = [None; SLOT_CAPACITY];
        cleared
    }

    /// Index of the most recently dispatched anchor, or `None` before the first dispatch.
    ///
    /// Once the wave is exhausted the cursor rests at the wave length.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Wave currently being dispatched.
    #[must_use]
    pub fn wave(&self) -> Option<&Wave<P>> {
        self.wave.as_ref()
    }

    /// Handles occupying each slot.
    #[must_use]
    pub const fn slots(&self) -> &[Option<PoolHandle>; SLOT_CAPACITY] {
        &self.slots
    }

    /// Eccentricity modifier live entities should apply this frame.
    #[must_use]
    pub const fn eccentricity(&self) -> EccentricityModifier {
        self.eccentricity
    }

    /// Number of ticks that found spare capacity but no slot to use.
    #[must_use]
    pub const fn skipped_dispatches(&self) -> u64 {
        self.skipped_dispatches
    }

    /// Number of anchors of the current wave that have not been dispatched.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let Some(wave) = self.wave.as_ref() else {
            return 0;
        };
        let dispatched = self
            .cursor
            .map_or(0, |cursor| cursor.saturating_add(1).min(wave.len()));
        wave.len() - dispatched
    }

    /// Reports how far the current wave has progressed.
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        match self.wave {
            None => SchedulerPhase::Idle,
            Some(_) if self.pending_count() == 0 => SchedulerPhase::Draining,
            Some(_) => SchedulerPhase::Dispatching,
        }
    }

    /// Reports whether every anchor was dispatched and none is alive anymore.
    ///
    /// The scheduler never acts on this itself; callers poll it to end a wave.
    #[must_use]
    pub fn is_exhausted<E: EntityPool>(&self, pool: &E) -> bool {
        self.phase() == SchedulerPhase::Draining && self.active_count(pool) == 0
    }

    fn claim_slot<E: EntityPool>(&mut self, pool: &E, out: &mut Vec<Event>) -> Option<usize> {
        if let Some(slot) = self.slots.iter().position(Option::is_none) {
            return Some(slot);
        }

        let (slot, handle) = self
            .slots
            .iter()
            .enumerate()
            .find_map(|(slot, occupant)| match occupant {
                Some(handle) if !pool.is_live(*handle) => Some((slot, *handle)),
                _ => None,
            })?;

        self.slots[slot] = None;
        warn!(slot, ?handle, "reclaimed slot holding a recycled anchor");
        out.push(Event::StaleSlotReclaimed { slot, handle });
        Some(slot)
    }

    fn advance_eccentricity(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.eccentricity_interval.is_zero() || dt.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator < self.eccentricity_interval {
            return;
        }

        let remainder = self.accumulator.as_nanos() % self.eccentricity_interval.as_nanos();
        self.accumulator = Duration::from_nanos(u64::try_from(remainder).unwrap_or(u64::MAX));

        let sample: [f32; 3] = UnitBall.sample(&mut self.rng);
        self.eccentricity = EccentricityModifier::new(Vec3::from_array(sample));
        debug!(modifier = ?self.eccentricity.get(), "resampled eccentricity modifier");
        out.push(Event::EccentricityResampled {
            modifier: self.eccentricity,
        });
    }
}

impl<P> Default for SpawnScheduler<P> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
