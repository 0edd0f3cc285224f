#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pickup spawn rules for Trail Arena.
//!
//! Two independent triggers feed the arena. Opportunistic spawns pick among the
//! score-gated kinds whenever a match starts, a respawning pickup is collected
//! or a multi pickup bursts. Counter-gated spawns follow the running number of
//! pickups collected this match, each kind on its own stride.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};
use trail_arena_core::{
    Command, Event, GridCell, OccupancyView, PickupKind, PickupTuning, PickupView,
};

const KIND_COUNT: usize = PickupKind::ALL.len();

/// Configuration parameters required to construct the pickup spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that decides which pickups appear and where.
#[derive(Debug)]
pub struct PickupSpawning {
    rng: ChaCha8Rng,
    top_score: u32,
    next_trigger: [u32; KIND_COUNT],
    awaiting: [bool; KIND_COUNT],
}

/// Spawns requested during a single `handle` call that the world has not seen yet.
struct Plan<'a> {
    pickups: &'a PickupView,
    occupancy: &'a OccupancyView,
    planned: [u32; KIND_COUNT],
    reserved: Vec<GridCell>,
}

impl Plan<'_> {
    fn pending(&self, kind: PickupKind) -> u32 {
        self.pickups
            .live_count(kind)
            .saturating_add(self.planned[kind.index()])
    }
}

impl PickupSpawning {
    /// Creates a new pickup spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            top_score: 0,
            next_trigger: [0; KIND_COUNT],
            awaiting: [false; KIND_COUNT],
        }
    }

    /// Collection count at which the next spawn of a counter-gated kind is due.
    ///
    /// Returns `None` for kinds that are not counter gated.
    #[must_use]
    pub fn next_trigger(&self, kind: PickupKind) -> Option<u32> {
        kind.is_counter_gated()
            .then(|| self.next_trigger[kind.index()])
    }

    /// Consumes events and immutable views to emit pickup spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        pickups: &PickupView,
        occupancy: &OccupancyView,
        tuning: &PickupTuning,
        out: &mut Vec<Command>,
    ) {
        let mut plan = Plan {
            pickups,
            occupancy,
            planned: [0; KIND_COUNT],
            reserved: Vec::new(),
        };

        for event in events {
            match event {
                Event::MatchReset { top_score, .. } => self.reset(*top_score, tuning),
                Event::ScoreChanged { top_score, .. } => self.top_score = *top_score,
                Event::MatchStarted => {
                    let _ = self.try_spawn(PickupKind::Score, &mut plan, tuning, out);
                    self.spawn_opportunistic(&mut plan, tuning, out);
                }
                Event::PickupCollected {
                    kind,
                    collected_total,
                    ..
                } => {
                    if kind.respawns_on_collect() {
                        let _ = self.try_spawn(*kind, &mut plan, tuning, out);
                    }
                    if *kind == PickupKind::Multi {
                        for _ in 0..tuning.multi_extra_spawns {
                            self.spawn_opportunistic(&mut plan, tuning, out);
                        }
                    }
                    self.check_counters(*collected_total, &mut plan, tuning, out);
                }
                Event::PickupUnlocked { kind, .. } => {
                    let _ = self.try_spawn(*kind, &mut plan, tuning, out);
                }
                Event::PickupSpawned { kind, .. } => self.confirm(*kind, tuning),
                Event::PickupSpawnRejected { kind, reason } => {
                    let slot = &mut self.awaiting[kind.index()];
                    if *slot {
                        *slot = false;
                        warn!(?kind, ?reason, "scheduled pickup was refused, retrying later");
                    }
                }
                _ => {}
            }
        }
    }

    fn reset(&mut self, top_score: u32, tuning: &PickupTuning) {
        self.top_score = top_score;
        self.awaiting = [false; KIND_COUNT];
        for kind in PickupKind::ALL {
            self.next_trigger[kind.index()] = tuning.rule(kind).counter_stride;
        }
    }

    fn confirm(&mut self, kind: PickupKind, tuning: &PickupTuning) {
        let index = kind.index();
        if !self.awaiting[index] {
            return;
        }
        self.awaiting[index] = false;
        let stride = tuning.rule(kind).counter_stride;
        self.next_trigger[index] = self.next_trigger[index].saturating_add(stride);
        debug!(?kind, next = self.next_trigger[index], "counter pickup scheduled");
    }

    fn check_counters(
        &mut self,
        collected_total: u32,
        plan: &mut Plan<'_>,
        tuning: &PickupTuning,
        out: &mut Vec<Command>,
    ) {
        for kind in PickupKind::COUNTER_GATED {
            let index = kind.index();
            if self.awaiting[index] || tuning.rule(kind).counter_stride == 0 {
                continue;
            }
            if collected_total < self.next_trigger[index] {
                continue;
            }
            if self.try_spawn(kind, plan, tuning, out) {
                self.awaiting[index] = true;
            }
        }
    }

    fn spawn_opportunistic(
        &mut self,
        plan: &mut Plan<'_>,
        tuning: &PickupTuning,
        out: &mut Vec<Command>,
    ) {
        let eligible: Vec<PickupKind> = PickupKind::SCORE_GATED
            .into_iter()
            .filter(|kind| self.can_spawn(*kind, plan, tuning))
            .collect();
        if eligible.is_empty() {
            debug!("no pickup kind eligible for an opportunistic spawn");
            return;
        }
        let kind = eligible[self.rng.gen_range(0..eligible.len())];
        let _ = self.try_spawn(kind, plan, tuning, out);
    }

    fn can_spawn(&self, kind: PickupKind, plan: &Plan<'_>, tuning: &PickupTuning) -> bool {
        tuning.is_unlocked(kind, self.top_score) && plan.pending(kind) < plan.pickups.cap(kind)
    }

    /// Requests a spawn of `kind` at a random isolated cell.
    ///
    /// Returns `false` when the kind is locked or capped, or when no cell was
    /// found within the placement budget.
    fn try_spawn(
        &mut self,
        kind: PickupKind,
        plan: &mut Plan<'_>,
        tuning: &PickupTuning,
        out: &mut Vec<Command>,
    ) -> bool {
        if !self.can_spawn(kind, plan, tuning) {
            debug!(?kind, top_score = self.top_score, "pickup kind unavailable");
            return false;
        }
        let Some(cell) = self.find_cell(plan, tuning.placement_attempts) else {
            warn!(
                ?kind,
                attempts = tuning.placement_attempts,
                "no free cell found for pickup"
            );
            return false;
        };
        plan.planned[kind.index()] += 1;
        plan.reserved.push(cell);
        out.push(Command::SpawnPickup {
            kind,
            position: plan.occupancy.cell_center(cell),
        });
        true
    }

    fn find_cell(&mut self, plan: &Plan<'_>, attempts: u32) -> Option<GridCell> {
        let dimensions = plan.occupancy.dimensions();
        if dimensions.divisions_x == 0 || dimensions.divisions_z == 0 {
            return None;
        }
        let half_cell = plan.occupancy.cell_size() * 0.5;
        for _ in 0..attempts {
            let cell = GridCell::new(
                self.rng.gen_range(0..dimensions.divisions_x) as i32,
                self.rng.gen_range(0..dimensions.divisions_z) as i32,
            );
            if !plan.occupancy.is_isolated(cell) || plan.reserved.contains(&cell) {
                continue;
            }
            if plan
                .pickups
                .is_near(plan.occupancy.cell_center(cell), half_cell)
            {
                continue;
            }
            return Some(cell);
        }
        None
    }
}
