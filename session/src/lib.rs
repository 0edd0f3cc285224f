#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven controller that owns the world and every system.
//!
//! A [`Session`] turns player intents into world commands, pumps the
//! command/event pipeline once per frame and persists the top score when a
//! match ends.

mod store;

use std::time::Duration;

use tracing::{debug, info, warn};
use trail_arena_core::{ArenaConfig, AgentId, Command, Event, Intent, MatchPhase, Turn};
use trail_arena_system_ai::{self as ai, OpponentAi};
use trail_arena_system_pickups::{self as pickups, PickupSpawning};
use trail_arena_system_spawning::{self as spawning, Spawning};
use trail_arena_world::{self as world, query, World};

pub use store::{FileStore, HighScoreStore, MemoryStore, StoreError};

const MAX_SETTLE_PASSES: usize = 8;
const PICKUP_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;
const SPAWNING_SEED_SALT: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Configuration parameters required to construct a session.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    autopilot: bool,
}

impl Config {
    /// Creates a configuration for a human-driven session.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            autopilot: false,
        }
    }

    /// Hands the player's steering to the AI decision engine.
    #[must_use]
    pub const fn with_player_autopilot(mut self, enabled: bool) -> Self {
        self.autopilot = enabled;
        self
    }
}

/// Owns one arena and drives it frame by frame.
#[derive(Debug)]
pub struct Session<S: HighScoreStore> {
    world: World,
    ai: OpponentAi,
    pickups: PickupSpawning,
    spawning: Spawning,
    store: S,
    pending_intents: Vec<Intent>,
    pending_commands: Vec<Command>,
    look_back: bool,
    events: Vec<Event>,
}

impl<S: HighScoreStore> Session<S> {
    /// Builds a session and resets the arena using the stored top score.
    pub fn new(arena: ArenaConfig, config: Config, store: S) -> Result<Self, StoreError> {
        let top_score = store.load()?;
        let placement_attempts = arena.pickups.placement_attempts;
        let mut session = Self {
            world: World::new(arena),
            ai: OpponentAi::new(
                ai::Config::new(config.rng_seed).with_player_autopilot(config.autopilot),
            ),
            pickups: PickupSpawning::new(pickups::Config::new(
                config.rng_seed ^ PICKUP_SEED_SALT,
            )),
            spawning: Spawning::new(spawning::Config::new(
                placement_attempts,
                config.rng_seed ^ SPAWNING_SEED_SALT,
            )),
            store,
            pending_intents: Vec::new(),
            pending_commands: Vec::new(),
            look_back: false,
            events: Vec::new(),
        };
        session
            .pending_commands
            .push(Command::ResetMatch { top_score });
        let _ = session.advance(Duration::ZERO);
        Ok(session)
    }

    /// Queues a player intent for the next frame.
    pub fn submit(&mut self, intent: Intent) {
        self.pending_intents.push(intent);
    }

    /// Reports that presentation lost track of an agent; it is treated as lost.
    pub fn detach(&mut self, agent: AgentId) {
        self.pending_commands.push(Command::DetachAgent { agent });
    }

    /// Runs one frame and returns every event it produced, in order.
    pub fn advance(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();

        for command in std::mem::take(&mut self.pending_commands) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        for intent in std::mem::take(&mut self.pending_intents) {
            self.apply_intent(intent);
        }

        if query::phase(&self.world) == MatchPhase::Active {
            let mut tick_events = Vec::new();
            world::apply(&mut self.world, Command::Tick { dt }, &mut tick_events);

            let mut commands = Vec::new();
            self.ai.handle(
                &tick_events,
                &query::agent_view(&self.world),
                &query::pickup_view(&self.world),
                &query::occupancy_view(&self.world),
                &query::config(&self.world).ai,
                &mut commands,
            );
            for command in commands {
                world::apply(&mut self.world, command, &mut tick_events);
            }
            world::apply(&mut self.world, Command::AdvanceAgents, &mut tick_events);
            self.events.append(&mut tick_events);
        }

        self.settle();
        self.persist_on_match_end();
        &self.events
    }

    /// Events produced by the most recent frame.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Read-only access to the simulated arena.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Whether the camera should look behind the player; cosmetic only.
    #[must_use]
    pub const fn look_back(&self) -> bool {
        self.look_back
    }

    /// Store holding the persisted top score.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn apply_intent(&mut self, intent: Intent) {
        let phase = query::phase(&self.world);
        let player = query::player(&self.world);
        let command = match intent {
            Intent::TurnLeft | Intent::TurnRight | Intent::Shoot if phase == MatchPhase::Idle => {
                Some(Command::StartMatch)
            }
            Intent::TurnLeft => player.map(|agent| Command::SteerAgent {
                agent,
                turn: Turn::Left,
            }),
            Intent::TurnRight => player.map(|agent| Command::SteerAgent {
                agent,
                turn: Turn::Right,
            }),
            Intent::Shoot => player.map(|agent| Command::FireProjectile { agent }),
            Intent::TogglePause => Some(Command::TogglePause),
            Intent::Restart => Some(Command::ResetMatch {
                top_score: self.stored_top_score(),
            }),
            Intent::ToggleLookBack => {
                self.look_back = !self.look_back;
                debug!(look_back = self.look_back, "camera toggled");
                None
            }
        };
        if let Some(command) = command {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Feeds the frame's events to the spawn systems until they stop reacting.
    fn settle(&mut self) {
        let mut batch = self.events.clone();
        for _ in 0..MAX_SETTLE_PASSES {
            let mut commands = Vec::new();
            let pickup_view = query::pickup_view(&self.world);
            let occupancy = query::occupancy_view(&self.world);
            let config = query::config(&self.world);
            self.pickups.handle(
                &batch,
                &pickup_view,
                &occupancy,
                &config.pickups,
                &mut commands,
            );
            self.spawning
                .handle(&batch, &occupancy, config.ai.look_ahead, &mut commands);

            batch.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut batch);
            }
            if batch.is_empty() {
                return;
            }
            self.events.extend(batch.iter().cloned());
        }
        warn!(
            passes = MAX_SETTLE_PASSES,
            "spawn systems still reacting after the last settle pass"
        );
    }

    fn persist_on_match_end(&mut self) {
        let Some(top_score) = self.events.iter().find_map(|event| match event {
            Event::MatchEnded { top_score, .. } => Some(*top_score),
            _ => None,
        }) else {
            return;
        };
        if top_score <= query::persisted_top_score(&self.world) {
            return;
        }
        match self.store.save(top_score) {
            Ok(()) => info!(top_score, "new top score saved"),
            Err(error) => warn!(%error, "failed to persist top score"),
        }
    }

    fn stored_top_score(&self) -> u32 {
        match self.store.load() {
            Ok(top_score) => top_score,
            Err(error) => {
                let fallback = query::top_score(&self.world);
                warn!(%error, fallback, "falling back to in-memory top score");
                fallback
            }
        }
    }
}
