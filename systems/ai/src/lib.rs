#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure decision engine steering AI opponents one step ahead of their movement.
//!
//! Every ready agent is evaluated once per tick, before the world advances it,
//! in strict priority order: opportunistic shot, survival, pickup pursuit and
//! finally cruising.

use std::cmp::Ordering;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use trail_arena_core::{
    AgentSnapshot, AgentView, AiTuning, Command, Controller, Direction, Event, GridCell,
    OccupantKind, OccupancyView, PickupView, Turn,
};

/// Configuration parameters required to construct the AI system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    pilot_player: bool,
}

impl Config {
    /// Creates a configuration that only steers AI-controlled agents.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            pilot_player: false,
        }
    }

    /// Also steers the human-controlled agent, for unattended matches.
    #[must_use]
    pub const fn with_player_autopilot(mut self, enabled: bool) -> Self {
        self.pilot_player = enabled;
        self
    }
}

/// Movement decision for a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Choice {
    Forward,
    Turn(Turn),
}

/// Pure system that emits steering and firing commands for AI agents.
#[derive(Debug)]
pub struct OpponentAi {
    rng: ChaCha8Rng,
    pilot_player: bool,
}

impl OpponentAi {
    /// Creates a new AI system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            pilot_player: config.pilot_player,
        }
    }

    /// Consumes events and immutable views to emit steering commands.
    ///
    /// Decisions are only made on ticks, and only for active agents whose step
    /// interval has elapsed.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        pickups: &PickupView,
        occupancy: &OccupancyView,
        tuning: &AiTuning,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for agent in agents.iter() {
            if !agent.is_active() || !agent.ready_for_step || !self.controls(agent) {
                continue;
            }
            self.decide(agent, pickups, occupancy, tuning, out);
        }
    }

    fn controls(&self, agent: &AgentSnapshot) -> bool {
        match agent.controller {
            Controller::Ai => true,
            Controller::Human => self.pilot_player,
        }
    }

    fn decide(
        &mut self,
        agent: &AgentSnapshot,
        pickups: &PickupView,
        occupancy: &OccupancyView,
        tuning: &AiTuning,
        out: &mut Vec<Command>,
    ) {
        let cell = occupancy.cell_of(agent.position);
        let look_ahead = tuning.look_ahead;

        let mut fired = false;
        if agent.ammo > 0 && hostile_trail_ahead(agent, cell, occupancy, tuning.shoot_look_ahead) {
            out.push(Command::FireProjectile { agent: agent.id });
            fired = true;
        }

        let forward = occupancy.safe_run(cell, agent.direction, look_ahead);

        let choice = if forward == 0 {
            if !fired && agent.ammo > 0 && own_trail_blocks(agent, cell, occupancy) {
                out.push(Command::FireProjectile { agent: agent.id });
            }
            match self.evaluate_turns(agent.direction, cell, occupancy, look_ahead) {
                Some((turn, _)) => Choice::Turn(turn),
                None => {
                    debug!(agent = agent.id.get(), "no safe move left");
                    Choice::Forward
                }
            }
        } else if let Some(choice) = pursue_pickup(agent, cell, pickups, occupancy, tuning) {
            choice
        } else if forward >= look_ahead {
            if self.rng.gen_bool(tuning.cruise_straight_probability.clamp(0.0, 1.0)) {
                Choice::Forward
            } else {
                match self.evaluate_turns(agent.direction, cell, occupancy, look_ahead) {
                    Some((turn, run)) if run >= look_ahead => Choice::Turn(turn),
                    _ => Choice::Forward,
                }
            }
        } else {
            match self.evaluate_turns(agent.direction, cell, occupancy, look_ahead) {
                Some((turn, run)) if run > forward => Choice::Turn(turn),
                _ => Choice::Forward,
            }
        };

        if let Choice::Turn(turn) = choice {
            debug!(agent = agent.id.get(), ?turn, forward, "ai steering");
            out.push(Command::SteerAgent {
                agent: agent.id,
                turn,
            });
        }
    }

    /// Compares the safe runs to the left and right of `direction`.
    ///
    /// The longer run wins, ties of at least one step are broken at random and
    /// `None` means neither side has a single safe step.
    fn evaluate_turns(
        &mut self,
        direction: Direction,
        cell: GridCell,
        occupancy: &OccupancyView,
        look_ahead: u32,
    ) -> Option<(Turn, u32)> {
        let left = occupancy.safe_run(cell, direction.turned(Turn::Left), look_ahead);
        let right = occupancy.safe_run(cell, direction.turned(Turn::Right), look_ahead);
        if left == 0 && right == 0 {
            return None;
        }
        match left.cmp(&right) {
            Ordering::Greater => Some((Turn::Left, left)),
            Ordering::Less => Some((Turn::Right, right)),
            Ordering::Equal => {
                let turn = if self.rng.gen_bool(0.5) {
                    Turn::Left
                } else {
                    Turn::Right
                };
                Some((turn, left))
            }
        }
    }
}

/// Reports whether another agent's trail lies within `range` cells ahead.
///
/// Heads and the agent's own trail in between do not hide it.
fn hostile_trail_ahead(
    agent: &AgentSnapshot,
    cell: GridCell,
    occupancy: &OccupancyView,
    range: u32,
) -> bool {
    let mut probe = cell;
    for _ in 0..range {
        probe = probe.step(agent.direction);
        if !occupancy.in_bounds(probe) {
            return false;
        }
        let hostile = occupancy
            .occupant(probe)
            .is_some_and(|occupant| occupant.kind == OccupantKind::Trail && occupant.agent != agent.id);
        if hostile {
            return true;
        }
    }
    false
}

fn own_trail_blocks(agent: &AgentSnapshot, cell: GridCell, occupancy: &OccupancyView) -> bool {
    occupancy
        .occupant(cell.step(agent.direction))
        .is_some_and(|occupant| occupant.kind == OccupantKind::Trail && occupant.agent == agent.id)
}

/// Greedily steps toward the nearest pickup within the seek radius.
///
/// A candidate must be safe and strictly closer than the current cell; ties
/// keep the current heading.
fn pursue_pickup(
    agent: &AgentSnapshot,
    cell: GridCell,
    pickups: &PickupView,
    occupancy: &OccupancyView,
    tuning: &AiTuning,
) -> Option<Choice> {
    let radius = i64::from(tuning.pickup_seek_radius);
    let target = pickups
        .iter()
        .map(|pickup| occupancy.cell_of(pickup.position))
        .map(|pickup_cell| (cell.distance_squared(pickup_cell), pickup_cell))
        .filter(|(distance, _)| *distance <= radius * radius)
        .min()
        .map(|(_, pickup_cell)| pickup_cell)?;

    let current = cell.distance_squared(target);
    let candidates = [
        (Choice::Forward, agent.direction),
        (Choice::Turn(Turn::Left), agent.direction.turned(Turn::Left)),
        (Choice::Turn(Turn::Right), agent.direction.turned(Turn::Right)),
    ];

    let mut best: Option<(i64, Choice)> = None;
    for (choice, direction) in candidates {
        let next = cell.step(direction);
        if !occupancy.is_safe(next) {
            continue;
        }
        let distance = next.distance_squared(target);
        if distance >= current {
            continue;
        }
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, choice));
        }
    }
    best.map(|(_, choice)| choice)
}
