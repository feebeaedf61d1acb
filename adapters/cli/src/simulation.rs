use std::{fmt, time::Duration};

use anchorfall_core::{Command, DifficultyRating, DifficultySetting, Event, PoolHandle};
use anchorfall_system_spawning::SchedulerError;
use anchorfall_world::{apply, query, World};
use tracing::info;

/// Parameters of a headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Plan {
    pub(crate) rating: DifficultyRating,
    pub(crate) setting: DifficultySetting,
    pub(crate) waves: u32,
    pub(crate) rating_growth: f32,
    pub(crate) frames: u32,
    pub(crate) frame: Duration,
    pub(crate) anchor_lifetime: Duration,
}

/// Tallies gathered from the events of a headless run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) frames_run: u32,
    pub(crate) waves_started: u32,
    pub(crate) waves_cleared: u32,
    pub(crate) anchors_generated: usize,
    pub(crate) targets_generated: usize,
    pub(crate) dispatched: usize,
    pub(crate) retired: usize,
    pub(crate) reclaimed: usize,
    pub(crate) skipped: usize,
    pub(crate) resamples: usize,
    pub(crate) peak_active: usize,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::WaveGenerated {
                anchors, targets, ..
            } => {
                self.waves_started += 1;
                self.anchors_generated += anchors;
                self.targets_generated += targets;
            }
            Event::AnchorDispatched { .. } => self.dispatched += 1,
            Event::AnchorRetired { .. } => self.retired += 1,
            Event::StaleSlotReclaimed { .. } => self.reclaimed += 1,
            Event::DispatchSkipped { .. } => self.skipped += 1,
            Event::EccentricityResampled { .. } => self.resamples += 1,
            Event::AnchorsDespawned { .. } => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames run: {}", self.frames_run)?;
        writeln!(
            f,
            "waves: {} started, {} cleared",
            self.waves_started, self.waves_cleared
        )?;
        writeln!(
            f,
            "anchors: {} generated, {} dispatched, {} retired",
            self.anchors_generated, self.dispatched, self.retired
        )?;
        writeln!(f, "targets generated: {}", self.targets_generated)?;
        writeln!(f, "peak active anchors: {}", self.peak_active)?;
        writeln!(f, "stale slots reclaimed: {}", self.reclaimed)?;
        writeln!(f, "dispatches skipped: {}", self.skipped)?;
        write!(f, "eccentricity resamples: {}", self.resamples)
    }
}

/// Drives the world frame by frame until the planned waves are cleared or the
/// frame budget runs out.
///
/// Anchors are retired once they have been alive for the planned lifetime,
/// standing in for a player destroying their targets.
pub(crate) fn run(world: &mut World, plan: &Plan) -> Result<Summary, SchedulerError> {
    let mut summary = Summary::default();
    let mut events = Vec::new();
    let mut rating = plan.rating;
    let mut waves_started = 1;
    start_wave(world, rating, plan.setting, &mut events)?;

    for _ in 0..plan.frames {
        apply(world, Command::Tick { dt: plan.frame }, &mut events)?;
        summary.frames_run += 1;
        summary.peak_active = summary.peak_active.max(query::active_count(world));

        let expired: Vec<PoolHandle> = query::anchor_view(world)
            .iter()
            .filter(|snapshot| snapshot.elapsed >= plan.anchor_lifetime)
            .map(|snapshot| snapshot.handle)
            .collect();
        for handle in expired {
            apply(world, Command::RetireAnchor { handle }, &mut events)?;
        }

        if query::is_exhausted(world) {
            summary.waves_cleared += 1;
            info!(
                wave = summary.waves_cleared,
                frame = summary.frames_run,
                "wave cleared"
            );
            if waves_started >= plan.waves {
                break;
            }
            rating = DifficultyRating::saturating(rating.get() * plan.rating_growth);
            waves_started += 1;
            start_wave(world, rating, plan.setting, &mut events)?;
        }

        for event in events.drain(..) {
            summary.record(&event);
        }
    }

    apply(world, Command::DespawnAllAnchors, &mut events)?;
    for event in events.drain(..) {
        summary.record(&event);
    }
    Ok(summary)
}

fn start_wave(
    world: &mut World,
    rating: DifficultyRating,
    setting: DifficultySetting,
    events: &mut Vec<Event>,
) -> Result<(), SchedulerError> {
    apply(world, Command::StartWave { rating, setting }, events)?;
    apply(world, Command::SetInWave { in_wave: true }, events)
}
