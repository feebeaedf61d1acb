#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Anchorfall engine.
//!
//! This crate defines the value types produced by wave generation, the
//! collaborator traits the spawn scheduler talks to, and the message surface
//! that connects adapters with the authoritative world. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what happened during the frame.

use std::{num::NonZeroU32, time::Duration};

pub use glam::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

/// Number of anchors that may be alive at the same time.
pub const SLOT_CAPACITY: usize = 5;

/// Scalar controlling the overall size and spread of a generated wave.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DifficultyRating(f32);

impl DifficultyRating {
    /// Smallest rating accepted by [`DifficultyRating::saturating`].
    pub const MIN: Self = Self(f32::MIN_POSITIVE);

    /// Creates a rating, rejecting values that are not finite and positive.
    pub fn new(value: f32) -> Result<Self, DifficultyError> {
        if !value.is_finite() {
            return Err(DifficultyError::NonFiniteRating(value));
        }
        if value <= 0.0 {
            return Err(DifficultyError::NonPositiveRating(value));
        }
        Ok(Self(value))
    }

    /// Creates a rating, clamping anything invalid to [`DifficultyRating::MIN`].
    #[must_use]
    pub fn saturating(value: f32) -> Self {
        Self::new(value).unwrap_or(Self::MIN)
    }

    /// Retrieves the raw rating value.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }
}

/// Coarse player-selected difficulty tier.
///
/// Tiers start at one (easy). The tier scales movement speed and wobble of
/// every generated entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DifficultySetting(NonZeroU32);

impl DifficultySetting {
    /// Easy tier.
    pub const EASY: Self = Self(match NonZeroU32::new(1) {
        Some(value) => value,
        None => unreachable!(),
    });
    /// Medium tier.
    pub const MEDIUM: Self = Self(match NonZeroU32::new(2) {
        Some(value) => value,
        None => unreachable!(),
    });
    /// Hard tier.
    pub const HARD: Self = Self(match NonZeroU32::new(3) {
        Some(value) => value,
        None => unreachable!(),
    });

    /// Creates a setting from its numeric tier, rejecting zero.
    pub fn new(tier: u32) -> Result<Self, DifficultyError> {
        NonZeroU32::new(tier)
            .map(Self)
            .ok_or(DifficultyError::ZeroSetting)
    }

    /// Numeric tier of the setting.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }

    /// Tier expressed as a float for kinematic scaling.
    #[must_use]
    pub fn scalar(&self) -> f32 {
        self.get() as f32
    }
}

/// Reasons a difficulty input may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum DifficultyError {
    /// The rating was NaN or infinite.
    #[error("difficulty rating must be finite, got {0}")]
    NonFiniteRating(f32),
    /// The rating was zero or negative.
    #[error("difficulty rating must be positive, got {0}")]
    NonPositiveRating(f32),
    /// The tier was zero.
    #[error("difficulty setting must be at least 1")]
    ZeroSetting,
}

/// Sequential identifier assigned to each wave started by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier of the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Inputs from which a reproducible per-wave random stream is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaveSeedContext {
    global_seed: u64,
    wave: WaveId,
}

impl WaveSeedContext {
    /// Creates a seed context for the provided wave.
    #[must_use]
    pub const fn new(global_seed: u64, wave: WaveId) -> Self {
        Self { global_seed, wave }
    }

    /// Session-wide seed shared by every wave.
    #[must_use]
    pub const fn global_seed(&self) -> u64 {
        self.global_seed
    }

    /// Wave the stream belongs to.
    #[must_use]
    pub const fn wave(&self) -> WaveId {
        self.wave
    }
}

/// Generated parameters for a single target owned by an anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec<P> {
    initial_position: Vec3,
    initial_movement: Vec3,
    movement_pattern: P,
}

impl<P> TargetSpec<P> {
    /// Creates a target description. `initial_position` is relative to the owning anchor.
    #[must_use]
    pub const fn new(initial_position: Vec3, initial_movement: Vec3, movement_pattern: P) -> Self {
        Self {
            initial_position,
            initial_movement,
            movement_pattern,
        }
    }

    /// Spawn offset of the target relative to its anchor.
    #[must_use]
    pub const fn initial_position(&self) -> Vec3 {
        self.initial_position
    }

    /// Unit heading the target starts with.
    #[must_use]
    pub const fn initial_movement(&self) -> Vec3 {
        self.initial_movement
    }

    /// Movement descriptor forwarded untouched to the live entity.
    #[must_use]
    pub const fn movement_pattern(&self) -> &P {
        &self.movement_pattern
    }
}

/// Generated parameters for an anchor and the targets clustered around it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorSpec<P> {
    targets: Vec<TargetSpec<P>>,
    initial_position: Vec3,
    initial_movement: Vec3,
    movement_pattern: P,
}

impl<P> AnchorSpec<P> {
    /// Creates an anchor description owning the provided targets.
    #[must_use]
    pub fn new(
        targets: Vec<TargetSpec<P>>,
        initial_position: Vec3,
        initial_movement: Vec3,
        movement_pattern: P,
    ) -> Self {
        Self {
            targets,
            initial_position,
            initial_movement,
            movement_pattern,
        }
    }

    /// Targets owned by the anchor, in generation order.
    #[must_use]
    pub fn targets(&self) -> &[TargetSpec<P>] {
        &self.targets
    }

    /// Spawn position of the anchor in the frame of reference of the player.
    #[must_use]
    pub const fn initial_position(&self) -> Vec3 {
        self.initial_position
    }

    /// Unit heading the anchor starts with.
    #[must_use]
    pub const fn initial_movement(&self) -> Vec3 {
        self.initial_movement
    }

    /// Movement descriptor forwarded untouched to the live entity.
    #[must_use]
    pub const fn movement_pattern(&self) -> &P {
        &self.movement_pattern
    }
}

/// Ordered list of anchors produced by one generation call.
///
/// The order is the dispatch order used by the spawn scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wave<P> {
    anchors: Vec<AnchorSpec<P>>,
}

impl<P> Wave<P> {
    /// Wraps the provided anchors into a wave.
    #[must_use]
    pub fn new(anchors: Vec<AnchorSpec<P>>) -> Self {
        Self { anchors }
    }

    /// Anchors in dispatch order.
    #[must_use]
    pub fn anchors(&self) -> &[AnchorSpec<P>] {
        &self.anchors
    }

    /// Retrieves the anchor at the provided dispatch index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&AnchorSpec<P>> {
        self.anchors.get(index)
    }

    /// Number of anchors in the wave.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Reports whether the wave contains no anchors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Total number of targets across every anchor.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.anchors.iter().map(|anchor| anchor.targets.len()).sum()
    }

    /// Iterator over the anchors in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &AnchorSpec<P>> {
        self.anchors.iter()
    }

    /// Consumes the wave, yielding the underlying anchors.
    #[must_use]
    pub fn into_vec(self) -> Vec<AnchorSpec<P>> {
        self.anchors
    }
}

/// Process-wide perturbation applied to every live entity's movement.
///
/// The spawn scheduler is the only writer. Entities receive it by reference
/// every frame and must not cache it across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EccentricityModifier(Vec3);

impl EccentricityModifier {
    /// Creates a modifier from the provided vector.
    #[must_use]
    pub const fn new(value: Vec3) -> Self {
        Self(value)
    }

    /// Retrieves the perturbation vector.
    #[must_use]
    pub const fn get(&self) -> Vec3 {
        self.0
    }
}

new_key_type! {
    /// Versioned reference to an instance owned by an [`EntityPool`].
    ///
    /// A handle outlives the instance it points to: once the pool recycles
    /// the instance the key version no longer matches and the handle reads as
    /// stale.
    pub struct PoolHandle;
}

/// Failures reported by an [`EntityPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Every instance is checked out and the pool may not grow further.
    #[error("entity pool exhausted at {limit} instances")]
    Exhausted {
        /// Hard limit configured on the pool.
        limit: usize,
    },
}

/// Produces opaque movement descriptors for generated entities.
pub trait MovementSynthesizer {
    /// Descriptor type attached to every generated anchor and target.
    type Pattern;

    /// Builds the patrol pattern of an anchor.
    fn synthesize_anchor_movement(
        &self,
        initial_movement: Vec3,
        radius: f32,
        tier: DifficultySetting,
        wobble: f32,
    ) -> Self::Pattern;

    /// Builds the pattern of a target moving around its anchor.
    fn synthesize_target_movement(
        &self,
        min_distance: f32,
        max_distance: f32,
        speed: f32,
        wobble: f32,
    ) -> Self::Pattern;
}

/// Live game object that receives a generated anchor on checkout.
pub trait SpawnedEntity {
    /// Movement descriptor type the entity understands.
    type Pattern;

    /// Hands the generated parameters to the entity. Called once per checkout.
    fn bind(&mut self, spec: AnchorSpec<Self::Pattern>);

    /// Makes the entity participate in the simulation.
    fn activate(&mut self);
}

/// Reusable instance provider consumed by the spawn scheduler.
pub trait EntityPool {
    /// Entity type handed out by the pool.
    type Entity: SpawnedEntity;

    /// Checks out an inactive instance, growing the pool when it is empty.
    fn acquire(&mut self) -> Result<PoolHandle, PoolError>;

    /// Mutable access to the instance behind a handle that is still checked out.
    fn entity_mut(&mut self, handle: PoolHandle) -> Option<&mut Self::Entity>;

    /// Reports whether the handle still refers to a live instance.
    fn is_live(&self, handle: PoolHandle) -> bool;

    /// Deactivates a single instance and returns it to the pool.
    ///
    /// Returns `false` when the handle was already stale.
    fn release(&mut self, handle: PoolHandle) -> bool;

    /// Deactivates every checked out instance and returns it to the pool.
    fn release_all(&mut self);
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Generates a new wave and hands it to the spawn scheduler.
    StartWave {
        /// Scalar controlling the size of the wave.
        rating: DifficultyRating,
        /// Tier controlling movement speed and wobble.
        setting: DifficultySetting,
    },
    /// Enables or disables anchor dispatch.
    SetInWave {
        /// Whether ticks should dispatch pending anchors.
        in_wave: bool,
    },
    /// Advances the simulation by a single frame.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Recycles a single anchor without going through the scheduler.
    RetireAnchor {
        /// Handle of the anchor to recycle.
        handle: PoolHandle,
    },
    /// Releases every live anchor back to the pool.
    DespawnAllAnchors,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new wave was generated and handed to the scheduler.
    WaveGenerated {
        /// Identifier of the generated wave.
        wave: WaveId,
        /// Number of anchors in the wave.
        anchors: usize,
        /// Number of targets across every anchor.
        targets: usize,
    },
    /// Confirms that a pending anchor was bound to a pooled instance.
    AnchorDispatched {
        /// Slot that now holds the anchor.
        slot: usize,
        /// Pool handle of the activated instance.
        handle: PoolHandle,
        /// Position of the anchor within the wave.
        anchor_index: usize,
    },
    /// Reports that a slot held an instance that was recycled behind the scheduler's back.
    StaleSlotReclaimed {
        /// Slot that was reclaimed.
        slot: usize,
        /// Handle that no longer refers to a live instance.
        handle: PoolHandle,
    },
    /// Reports that no slot could take the next anchor; the anchor stays pending.
    DispatchSkipped {
        /// Position of the anchor within the wave.
        anchor_index: usize,
    },
    /// Announces a freshly sampled eccentricity modifier.
    EccentricityResampled {
        /// Modifier every live entity reads from now on.
        modifier: EccentricityModifier,
    },
    /// Confirms that a single anchor was recycled.
    AnchorRetired {
        /// Handle of the recycled anchor.
        handle: PoolHandle,
    },
    /// Confirms that every live anchor was released.
    AnchorsDespawned {
        /// Number of occupied slots that were cleared.
        cleared_slots: usize,
    },
}
