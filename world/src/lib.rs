#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Trail Arena.

mod agents;
mod collision;
mod pickups;
mod projectiles;

use std::time::Duration;

use glam::Vec2;
use tracing::{debug, info, warn};
use trail_arena_core::{
    AgentColor, AgentId, ArenaConfig, Boundary, Command, Controller, Direction, Event,
    IntentRejection, LossCause, MatchOutcome, MatchPhase, PickupKind, PickupRejection,
    PowerUpKind, ProjectileId, WELCOME_BANNER,
};

use crate::{
    agents::{Agent, AgentState},
    collision::{Arena, Body, Stride},
    pickups::PickupRegistry,
    projectiles::Projectile,
};

const PLAYER_COLOR: AgentColor = AgentColor::from_rgb(0x00, 0xe5, 0xff);
const FIRST_OPPONENT_COLOR: AgentColor = AgentColor::from_rgb(0xff, 0x6d, 0x00);

/// Represents the authoritative Trail Arena world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: ArenaConfig,
    boundary: Boundary,
    phase: MatchPhase,
    outcome: MatchOutcome,
    agents: Vec<Agent>,
    pickups: PickupRegistry,
    projectiles: Vec<Projectile>,
    score: u32,
    top_score: u32,
    persisted_top_score: u32,
    unlocks_fired: [bool; PickupKind::ALL.len()],
    elapsed: Duration,
    next_agent_id: u32,
    next_projectile_id: u32,
}

impl World {
    /// Creates a world for the provided tuning, idle and ready for a first match.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        let mut world = Self {
            banner: WELCOME_BANNER,
            boundary: config.grid.initial_boundary(),
            pickups: PickupRegistry::new(&config.pickups),
            config,
            phase: MatchPhase::Idle,
            outcome: MatchOutcome::Ongoing,
            agents: Vec::new(),
            projectiles: Vec::new(),
            score: 0,
            top_score: 0,
            persisted_top_score: 0,
            unlocks_fired: [false; PickupKind::ALL.len()],
            elapsed: Duration::ZERO,
            next_agent_id: 0,
            next_projectile_id: 0,
        };
        let mut scratch = Vec::new();
        world.rebuild(0, &mut scratch);
        world
    }

    fn rebuild(&mut self, top_score: u32, out_events: &mut Vec<Event>) {
        self.boundary = self.config.grid.initial_boundary();
        self.phase = MatchPhase::Idle;
        self.outcome = MatchOutcome::Ongoing;
        self.agents.clear();
        self.pickups = PickupRegistry::new(&self.config.pickups);
        self.projectiles.clear();
        self.score = 0;
        self.top_score = top_score;
        self.persisted_top_score = top_score;
        for kind in PickupKind::ALL {
            self.unlocks_fired[kind.index()] =
                self.config.pickups.rule(kind).unlock_score <= top_score;
        }
        self.elapsed = Duration::ZERO;
        self.next_agent_id = 0;
        self.next_projectile_id = 0;

        out_events.push(Event::MatchReset {
            boundary: self.boundary,
            top_score,
        });

        let cell = self.config.grid.cell_size;
        let quarter = (self.boundary.x_max() - self.boundary.x_min()) * 0.25;
        let middle = self.boundary.center().y;
        let player_start = self
            .boundary
            .snap_point(Vec2::new(self.boundary.x_min() + quarter, middle), cell);
        let opponent_start = self
            .boundary
            .snap_point(Vec2::new(self.boundary.x_max() - quarter, middle), cell);
        let grace = self.config.ai.spawn_grace();

        let _ = self.spawn_agent(
            Controller::Human,
            PLAYER_COLOR,
            player_start,
            Direction::East,
            AgentState::Active,
            out_events,
        );
        let _ = self.spawn_agent(
            Controller::Ai,
            FIRST_OPPONENT_COLOR,
            opponent_start,
            Direction::West,
            AgentState::Spawning { remaining: grace },
            out_events,
        );

        out_events.push(Event::ScoreChanged {
            score: 0,
            top_score,
        });
        out_events.push(Event::PhaseChanged {
            phase: MatchPhase::Idle,
        });
    }

    fn spawn_agent(
        &mut self,
        controller: Controller,
        color: AgentColor,
        position: Vec2,
        direction: Direction,
        state: AgentState,
        out_events: &mut Vec<Event>,
    ) -> AgentId {
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        self.agents
            .push(Agent::new(id, controller, color, position, direction, state));
        out_events.push(Event::AgentSpawned {
            agent: id,
            controller,
            position,
            direction,
            color,
        });
        id
    }

    fn agent_mut(&mut self, agent_id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id == agent_id)
    }

    fn set_phase(&mut self, phase: MatchPhase, out_events: &mut Vec<Event>) {
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn reject_intent(
        agent: Option<AgentId>,
        reason: IntentRejection,
        out_events: &mut Vec<Event>,
    ) {
        debug!(agent = agent.map(|id| id.get()), ?reason, "intent rejected");
        out_events.push(Event::IntentRejected { agent, reason });
    }

    /// Validates that an intent may drive the agent, returning it when it can.
    fn intent_target(
        &mut self,
        agent_id: AgentId,
        out_events: &mut Vec<Event>,
    ) -> Option<&mut Agent> {
        if self.phase != MatchPhase::Active {
            Self::reject_intent(Some(agent_id), IntentRejection::PhaseDisallows, out_events);
            return None;
        }
        let Some(index) = self.agents.iter().position(|agent| agent.id == agent_id) else {
            Self::reject_intent(Some(agent_id), IntentRejection::UnknownAgent, out_events);
            return None;
        };
        if !self.agents[index].is_active() {
            Self::reject_intent(Some(agent_id), IntentRejection::AgentNotActive, out_events);
            return None;
        }
        self.agents.get_mut(index)
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.phase != MatchPhase::Active {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        for agent in &mut self.agents {
            if agent.tick_spawn_grace(dt) {
                debug!(agent = agent.id.get(), "agent admitted");
                out_events.push(Event::AgentAdmitted { agent: agent.id });
                continue;
            }
            if !agent.is_active() {
                continue;
            }
            agent.accumulator = agent.accumulator.saturating_add(dt);
            if agent.speed_boost.tick(dt) {
                out_events.push(Event::PowerUpExpired {
                    agent: agent.id,
                    kind: PowerUpKind::SpeedBoost,
                });
            }
            if agent.zoom_out.tick(dt) {
                out_events.push(Event::PowerUpExpired {
                    agent: agent.id,
                    kind: PowerUpKind::ZoomOut,
                });
            }
            if agent.sparse_trail.tick(dt) {
                out_events.push(Event::PowerUpExpired {
                    agent: agent.id,
                    kind: PowerUpKind::SparseTrail,
                });
            }
        }

        self.pickups.age(dt);

        let hit_radius = self.config.projectiles.hit_radius_cells * self.config.grid.cell_size;
        projectiles::advance(
            &mut self.projectiles,
            &mut self.agents,
            hit_radius,
            dt,
            out_events,
        );
    }

    fn advance_agents(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != MatchPhase::Active {
            return;
        }

        let cell = self.config.grid.cell_size;
        let boundary = self.boundary;
        let movement = &self.config.movement;
        let mut strides: Vec<Option<Stride>> = vec![None; self.agents.len()];

        for (agent, stride) in self.agents.iter_mut().zip(strides.iter_mut()) {
            if !agent.ready_for_step(movement) {
                continue;
            }
            let from = agent.position;
            let to = boundary.snap_point(from + agent.direction.unit() * cell, cell);
            agent.position = to;
            agent.committed_direction = agent.direction;
            agent.consume_interval(movement);
            *stride = Some(Stride {
                from,
                to,
                commits: agent.sparse_trail.would_commit(),
            });
            out_events.push(Event::AgentAdvanced {
                agent: agent.id,
                from,
                to,
            });
        }

        if strides.iter().all(Option::is_none) {
            return;
        }

        let arena = Arena {
            boundary,
            contact_radius: self.config.grid.contact_radius(),
            epsilon: self.config.movement.boundary_epsilon,
        };
        let losses = {
            let bodies: Vec<Body<'_>> = self
                .agents
                .iter()
                .zip(&strides)
                .map(|(agent, stride)| Body {
                    id: agent.id,
                    head: agent.position,
                    trail: &agent.trail,
                    live: agent.is_active(),
                    stride: *stride,
                })
                .collect();
            collision::resolve(&bodies, arena)
        };

        for (agent_id, cause) in losses {
            if let Some(agent) = self.agent_mut(agent_id) {
                agent.state = AgentState::Lost { cause };
            }
            debug!(agent = agent_id.get(), ?cause, "agent lost");
            out_events.push(Event::AgentLost {
                agent: agent_id,
                cause,
            });
        }

        for (agent, stride) in self.agents.iter_mut().zip(&strides) {
            let Some(stride) = stride else {
                continue;
            };
            if agent.is_lost() {
                continue;
            }
            if agent.sparse_trail.commit_step() {
                agent.trail.push(stride.from);
                out_events.push(Event::TrailSegmentAdded {
                    agent: agent.id,
                    position: stride.from,
                });
            }
        }

        let contact_radius = self.config.grid.contact_radius();
        for (index, stride) in strides.iter().enumerate() {
            if stride.is_none() || !self.agents[index].is_active() {
                continue;
            }
            let head = self.agents[index].position;
            if let Some(pickup) = self.pickups.take_touching(head, contact_radius) {
                pickups::collect(self, index, pickup, out_events);
            }
        }

        self.evaluate_outcome(out_events);
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if !matches!(self.phase, MatchPhase::Active | MatchPhase::Paused) {
            return;
        }
        let alive = |controller: Controller| {
            self.agents
                .iter()
                .any(|agent| agent.controller == controller && !agent.is_lost())
        };
        let outcome = MatchOutcome::from_survivors(alive(Controller::Human), alive(Controller::Ai));
        if outcome == MatchOutcome::Ongoing {
            return;
        }

        self.outcome = outcome;
        info!(
            ?outcome,
            score = self.score,
            top_score = self.top_score,
            "match ended"
        );
        self.set_phase(MatchPhase::GameOver, out_events);
        out_events.push(Event::MatchEnded {
            outcome,
            score: self.score,
            top_score: self.top_score,
        });
    }

    /// Adds points to the match score and announces any newly crossed unlocks.
    pub(crate) fn award_points(&mut self, points: u32, out_events: &mut Vec<Event>) {
        if points == 0 {
            return;
        }
        self.score = self.score.saturating_add(points);
        self.top_score = self.top_score.max(self.score);
        out_events.push(Event::ScoreChanged {
            score: self.score,
            top_score: self.top_score,
        });

        let mut crossed: Vec<(u32, PickupKind)> = PickupKind::ALL
            .iter()
            .filter(|kind| !self.unlocks_fired[kind.index()])
            .map(|kind| (self.config.pickups.rule(*kind).unlock_score, *kind))
            .filter(|(threshold, _)| *threshold <= self.score)
            .collect();
        crossed.sort_unstable();

        for (threshold, kind) in crossed {
            self.unlocks_fired[kind.index()] = true;
            if threshold > self.persisted_top_score {
                info!(?kind, threshold, "pickup unlocked");
                out_events.push(Event::PickupUnlocked { kind, threshold });
            }
        }
    }

    fn spawn_pickup(&mut self, kind: PickupKind, position: Vec2, out_events: &mut Vec<Event>) {
        let cell = self.config.grid.cell_size;
        let position = self.boundary.snap_point(position, cell);
        let rejection = if self.phase == MatchPhase::GameOver {
            Some(PickupRejection::PhaseDisallows)
        } else if !self.config.pickups.is_unlocked(kind, self.top_score) {
            Some(PickupRejection::Locked)
        } else if self.pickups.live_count(kind) >= self.pickups.cap(kind) {
            Some(PickupRejection::CapReached)
        } else {
            let occupancy = query::occupancy_view(self);
            let blocked = !occupancy.is_safe(occupancy.cell_of(position))
                || self
                    .pickups
                    .occupies(position, self.config.grid.contact_radius());
            blocked.then_some(PickupRejection::CellBlocked)
        };

        if let Some(reason) = rejection {
            debug!(?kind, ?reason, "pickup spawn rejected");
            out_events.push(Event::PickupSpawnRejected { kind, reason });
            return;
        }

        let pickup = self.pickups.insert(kind, position);
        debug!(?kind, pickup = pickup.get(), "pickup spawned");
        out_events.push(Event::PickupSpawned {
            pickup,
            kind,
            position,
        });
    }

    fn spawn_opponent(
        &mut self,
        position: Vec2,
        direction: Direction,
        color: AgentColor,
        out_events: &mut Vec<Event>,
    ) {
        if !matches!(self.phase, MatchPhase::Active | MatchPhase::Paused) {
            debug!(phase = ?self.phase, "opponent spawn ignored outside a running match");
            return;
        }
        let position = self
            .boundary
            .snap_point(position, self.config.grid.cell_size);
        let occupancy = query::occupancy_view(self);
        if !occupancy.is_safe(occupancy.cell_of(position)) {
            warn!(x = position.x, z = position.y, "opponent spawn cell is blocked");
            return;
        }
        let grace = self.config.ai.spawn_grace();
        let agent = self.spawn_agent(
            Controller::Ai,
            color,
            position,
            direction,
            AgentState::Spawning { remaining: grace },
            out_events,
        );
        info!(agent = agent.get(), "opponent joined");
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ResetMatch { top_score } => {
            info!(top_score, "match reset");
            world.rebuild(top_score, out_events);
        }
        Command::StartMatch => {
            if world.phase != MatchPhase::Idle {
                World::reject_intent(None, IntentRejection::PhaseDisallows, out_events);
                return;
            }
            info!("match started");
            out_events.push(Event::MatchStarted);
            world.set_phase(MatchPhase::Active, out_events);
        }
        Command::TogglePause => match world.phase {
            MatchPhase::Active => world.set_phase(MatchPhase::Paused, out_events),
            MatchPhase::Paused => world.set_phase(MatchPhase::Active, out_events),
            MatchPhase::Idle | MatchPhase::GameOver => {
                World::reject_intent(None, IntentRejection::PhaseDisallows, out_events);
            }
        },
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::AdvanceAgents => world.advance_agents(out_events),
        Command::SteerAgent { agent, turn } => {
            let Some(target) = world.intent_target(agent, out_events) else {
                return;
            };
            let next = target.direction.turned(turn);
            if next == target.committed_direction.opposite() {
                World::reject_intent(Some(agent), IntentRejection::ReversalBlocked, out_events);
                return;
            }
            target.direction = next;
            debug!(agent = agent.get(), direction = ?next, "agent steered");
            out_events.push(Event::AgentSteered {
                agent,
                direction: next,
            });
        }
        Command::FireProjectile { agent } => {
            let cell = world.config.grid.cell_size;
            let tuning = world.config.projectiles.clone();
            let projectile_id = ProjectileId::new(world.next_projectile_id);
            let Some(shooter) = world.intent_target(agent, out_events) else {
                return;
            };
            if shooter.ammo == 0 {
                World::reject_intent(Some(agent), IntentRejection::NoAmmo, out_events);
                return;
            }
            shooter.ammo -= 1;
            let heading = shooter.direction.unit();
            let projectile = Projectile {
                id: projectile_id,
                owner: agent,
                owner_controller: shooter.controller,
                position: shooter.position + heading * tuning.muzzle_offset_cells * cell,
                velocity: heading * tuning.speed,
                remaining: tuning.lifetime(),
            };
            let ammo = shooter.ammo;
            world.next_projectile_id = world.next_projectile_id.wrapping_add(1);
            world.projectiles.push(projectile);
            debug!(agent = agent.get(), ammo, "projectile fired");
            out_events.push(Event::ProjectileFired {
                projectile: projectile_id,
                owner: agent,
                position: projectile.position,
            });
            out_events.push(Event::AmmoChanged { agent, ammo });
        }
        Command::SpawnPickup { kind, position } => world.spawn_pickup(kind, position, out_events),
        Command::SpawnOpponent {
            position,
            direction,
            color,
        } => world.spawn_opponent(position, direction, color, out_events),
        Command::DetachAgent { agent } => {
            let Some(target) = world.agent_mut(agent) else {
                debug!(agent = agent.get(), "detach ignored for unknown agent");
                return;
            };
            if target.is_lost() {
                return;
            }
            target.state = AgentState::Lost {
                cause: LossCause::Detached,
            };
            warn!(agent = agent.get(), "agent detached, treating as lost");
            out_events.push(Event::AgentLost {
                agent,
                cause: LossCause::Detached,
            });
            world.evaluate_outcome(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use trail_arena_core::{
        AgentId, AgentView, ArenaConfig, Boundary, Controller, MatchOutcome, MatchPhase,
        Occupant, OccupantKind, OccupancyView, PickupView, ProjectileView, TrailSnapshot,
        TrailView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the tuning the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &ArenaConfig {
        &world.config
    }

    /// Current phase of the match state machine.
    #[must_use]
    pub fn phase(world: &World) -> MatchPhase {
        world.phase
    }

    /// Outcome of the match; `Ongoing` until it ends.
    #[must_use]
    pub fn outcome(world: &World) -> MatchOutcome {
        world.outcome
    }

    /// Current match score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// All-time top score including the running match.
    #[must_use]
    pub fn top_score(world: &World) -> u32 {
        world.top_score
    }

    /// Top score the current match started with.
    #[must_use]
    pub fn persisted_top_score(world: &World) -> u32 {
        world.persisted_top_score
    }

    /// Current play area rectangle.
    #[must_use]
    pub fn boundary(world: &World) -> Boundary {
        world.boundary
    }

    /// Simulated time the match has been active.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Pickups collected by any agent during this match.
    #[must_use]
    pub fn collected_total(world: &World) -> u32 {
        world.pickups.collected_total()
    }

    /// Identifier of the human-controlled agent.
    #[must_use]
    pub fn player(world: &World) -> Option<AgentId> {
        world
            .agents
            .iter()
            .find(|agent| agent.controller == Controller::Human)
            .map(|agent| agent.id)
    }

    /// Captures a read-only view of every agent.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(
            world
                .agents
                .iter()
                .map(|agent| agent.snapshot(&world.config.movement))
                .collect(),
        )
    }

    /// Captures a read-only view of every committed trail.
    #[must_use]
    pub fn trail_view(world: &World) -> TrailView {
        TrailView::from_snapshots(
            world
                .agents
                .iter()
                .map(|agent| TrailSnapshot {
                    owner: agent.id,
                    color: agent.color,
                    segments: agent.trail.clone(),
                })
                .collect(),
        )
    }

    /// Captures a read-only view of live pickups and their caps.
    #[must_use]
    pub fn pickup_view(world: &World) -> PickupView {
        world.pickups.view()
    }

    /// Captures a read-only view of projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .iter()
                .map(|projectile| projectile.snapshot())
                .collect(),
        )
    }

    /// Captures the occupancy map: every trail segment plus the heads of
    /// agents that have not been lost.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView {
        let trails = world.agents.iter().flat_map(|agent| {
            agent.trail.iter().map(move |segment| {
                (
                    *segment,
                    Occupant {
                        agent: agent.id,
                        kind: OccupantKind::Trail,
                    },
                )
            })
        });
        let heads = world
            .agents
            .iter()
            .filter(|agent| !agent.is_lost())
            .map(|agent| {
                (
                    agent.position,
                    Occupant {
                        agent: agent.id,
                        kind: OccupantKind::Head,
                    },
                )
            });
        OccupancyView::from_positions(
            world.boundary,
            world.config.grid.cell_size,
            trails.chain(heads),
        )
    }
}
