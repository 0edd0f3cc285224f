#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Trail Arena simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters translate player intents
//! into [`Command`] values, the world executes those commands via its `apply`
//! entry point, and then broadcasts [`Event`] values for systems to react to
//! deterministically. Systems consume event streams, query immutable views,
//! and respond exclusively with new command batches.

mod config;
mod grid;
mod views;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{
    AiTuning, ArenaConfig, GridTuning, MovementTuning, PickupRule, PickupTuning, PowerUpTuning,
    ProjectileTuning,
};
pub use grid::{Axis, Boundary, GridCell, GridDimensions};
pub use views::{
    AgentSnapshot, AgentView, Occupant, OccupantKind, OccupancyView, PickupCaps, PickupSnapshot,
    PickupView, PowerUpStatus, ProjectileSnapshot, ProjectileView, TrailSnapshot, TrailView,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Trail Arena.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the arena for a fresh match and returns to the idle phase.
    ResetMatch {
        /// All-time top score read from the durable store at match start.
        top_score: u32,
    },
    /// Moves an idle match into the active phase.
    StartMatch,
    /// Toggles between the active and paused phases.
    TogglePause,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Steps every agent whose interval elapsed and resolves collisions.
    AdvanceAgents,
    /// Requests that an agent turn a quarter turn before its next step.
    SteerAgent {
        /// Identifier of the agent being steered.
        agent: AgentId,
        /// Quarter turn to apply relative to the current heading.
        turn: Turn,
    },
    /// Requests that an agent spend one unit of ammo on a projectile.
    FireProjectile {
        /// Identifier of the shooting agent.
        agent: AgentId,
    },
    /// Requests that a pickup of the given kind appear at a cell center.
    SpawnPickup {
        /// Kind of pickup to create.
        kind: PickupKind,
        /// World-space center of the cell that hosts the pickup.
        position: Vec2,
    },
    /// Requests that a new AI opponent enter the arena.
    SpawnOpponent {
        /// World-space center of the cell the opponent starts on.
        position: Vec2,
        /// Initial heading of the opponent.
        direction: Direction,
        /// Appearance applied to the opponent and its trail.
        color: AgentColor,
    },
    /// Reports that the presentation layer dropped the handle of an agent.
    DetachAgent {
        /// Identifier of the agent whose handle vanished.
        agent: AgentId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the arena was rebuilt for a new match.
    MatchReset {
        /// Boundary of the fresh arena.
        boundary: Boundary,
        /// Top score recorded before the match began.
        top_score: u32,
    },
    /// Announces that an idle match became active.
    MatchStarted,
    /// Announces that the match entered a new phase.
    PhaseChanged {
        /// Phase that became current.
        phase: MatchPhase,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent was created.
    AgentSpawned {
        /// Identifier assigned to the agent.
        agent: AgentId,
        /// Source of the agent's steering decisions.
        controller: Controller,
        /// Cell center the agent occupies.
        position: Vec2,
        /// Initial heading of the agent.
        direction: Direction,
        /// Appearance of the agent.
        color: AgentColor,
    },
    /// Confirms that a spawning agent finished its grace period.
    AgentAdmitted {
        /// Identifier of the admitted agent.
        agent: AgentId,
    },
    /// Confirms that an agent changed heading.
    AgentSteered {
        /// Identifier of the steered agent.
        agent: AgentId,
        /// Heading the agent now faces.
        direction: Direction,
    },
    /// Confirms that an agent advanced one cell.
    AgentAdvanced {
        /// Identifier of the agent that advanced.
        agent: AgentId,
        /// Cell center the agent occupied before moving.
        from: Vec2,
        /// Cell center the agent occupies after moving.
        to: Vec2,
    },
    /// Reports that an agent was eliminated.
    AgentLost {
        /// Identifier of the eliminated agent.
        agent: AgentId,
        /// Collision class that eliminated the agent.
        cause: LossCause,
    },
    /// Confirms that a trail segment was committed behind an agent.
    TrailSegmentAdded {
        /// Owner of the trail.
        agent: AgentId,
        /// Cell center covered by the new segment.
        position: Vec2,
    },
    /// Confirms that a single trail segment was erased.
    TrailSegmentRemoved {
        /// Owner of the trail.
        agent: AgentId,
        /// Cell center of the erased segment.
        position: Vec2,
    },
    /// Confirms that every trail in the arena was erased.
    TrailsCleared,
    /// Confirms that a pickup appeared.
    PickupSpawned {
        /// Identifier assigned to the pickup.
        pickup: PickupId,
        /// Kind of the pickup.
        kind: PickupKind,
        /// Cell center hosting the pickup.
        position: Vec2,
    },
    /// Reports that a pickup spawn request was rejected.
    PickupSpawnRejected {
        /// Kind requested for spawning.
        kind: PickupKind,
        /// Reason the request failed.
        reason: PickupRejection,
    },
    /// Confirms that an agent collected a pickup.
    PickupCollected {
        /// Agent that collected the pickup.
        agent: AgentId,
        /// Kind of the collected pickup.
        kind: PickupKind,
        /// Cell center the pickup occupied.
        position: Vec2,
        /// Number of pickups collected by any agent during this match.
        collected_total: u32,
    },
    /// Confirms that a power-up was activated or stacked.
    PowerUpActivated {
        /// Agent receiving the power-up.
        agent: AgentId,
        /// Kind of power-up.
        kind: PowerUpKind,
        /// Level after activation.
        level: u32,
    },
    /// Reports that a power-up timer ran out.
    PowerUpExpired {
        /// Agent that held the power-up.
        agent: AgentId,
        /// Kind of power-up that expired.
        kind: PowerUpKind,
    },
    /// Reports an updated ammo count.
    AmmoChanged {
        /// Agent holding the ammo.
        agent: AgentId,
        /// Remaining ammo.
        ammo: u32,
    },
    /// Reports that the play area grew; visuals rebuild from `boundary`.
    BoundaryExpanded {
        /// Boundary after expansion.
        boundary: Boundary,
        /// Edge that was pushed outward.
        edge: Direction,
    },
    /// Reports that the live-instance cap of a pickup kind grew.
    PickupCapRaised {
        /// Kind whose cap increased.
        kind: PickupKind,
        /// New cap.
        cap: u32,
    },
    /// Requests that a spawning system place a new AI opponent.
    OpponentRequested {
        /// Agent whose pickup triggered the request.
        requested_by: AgentId,
    },
    /// Reports a new match score.
    ScoreChanged {
        /// Current match score.
        score: u32,
        /// All-time top score including this match.
        top_score: u32,
    },
    /// Announces that a pickup kind became available for the first time.
    PickupUnlocked {
        /// Kind that unlocked.
        kind: PickupKind,
        /// Score threshold that was crossed.
        threshold: u32,
    },
    /// Confirms that a projectile left an agent.
    ProjectileFired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Shooting agent.
        owner: AgentId,
        /// Spawn position of the projectile.
        position: Vec2,
    },
    /// Reports that a projectile erased a trail segment.
    ProjectileHit {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Owner of the erased trail segment.
        trail_owner: AgentId,
        /// Cell center of the erased segment.
        position: Vec2,
    },
    /// Reports that a projectile ran out of lifetime.
    ProjectileExpired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports that an intent was refused by the world.
    IntentRejected {
        /// Agent named by the intent, if any.
        agent: Option<AgentId>,
        /// Reason the intent was refused.
        reason: IntentRejection,
    },
    /// Announces the end of the match.
    MatchEnded {
        /// Final outcome.
        outcome: MatchOutcome,
        /// Final match score.
        score: u32,
        /// All-time top score after this match.
        top_score: u32,
    },
}

/// Discrete player intents delivered by input adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Quarter turn counter-clockwise.
    TurnLeft,
    /// Quarter turn clockwise.
    TurnRight,
    /// Fire a projectile.
    Shoot,
    /// Toggle the cosmetic rear camera.
    ToggleLookBack,
    /// Pause or resume the match.
    TogglePause,
    /// Abandon the current match and return to idle.
    Restart,
}

/// Visual appearance applied to an agent and its trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl AgentColor {
    /// Creates a new agent color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Grid-locked headings available to agents.
///
/// The arena is laid out on the x/z plane: east is `+x`, west is `-x`, south
/// is `+z` and north is `-z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Heading toward `-z`.
    North,
    /// Heading toward `+x`.
    East,
    /// Heading toward `+z`.
    South,
    /// Heading toward `-x`.
    West,
}

impl Direction {
    /// Every heading in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit vector of the heading; `y` carries the world z axis.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::North => Vec2::new(0.0, -1.0),
            Self::East => Vec2::new(1.0, 0.0),
            Self::South => Vec2::new(0.0, 1.0),
            Self::West => Vec2::new(-1.0, 0.0),
        }
    }

    /// Heading after applying a quarter turn.
    #[must_use]
    pub const fn turned(self, turn: Turn) -> Self {
        match (self, turn) {
            (Self::North, Turn::Left) | (Self::South, Turn::Right) => Self::West,
            (Self::North, Turn::Right) | (Self::South, Turn::Left) => Self::East,
            (Self::East, Turn::Left) | (Self::West, Turn::Right) => Self::North,
            (Self::East, Turn::Right) | (Self::West, Turn::Left) => Self::South,
        }
    }

    /// Heading pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Quarter turns relative to the current heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    /// Counter-clockwise quarter turn.
    Left,
    /// Clockwise quarter turn.
    Right,
}

/// Source of an agent's steering decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// Steered by player intents.
    Human,
    /// Steered by the AI decision engine.
    Ai,
}

/// Lifecycle stage of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Present but excluded from movement, collisions and decisions.
    Spawning,
    /// Moving and colliding.
    Active,
    /// Eliminated; the trail stays behind as an obstacle.
    Lost,
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PickupId(u32);

impl PickupId {
    /// Creates a new pickup identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Types of pickups that can appear in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PickupKind {
    /// Awards points and a speed boost.
    Score,
    /// Pushes one boundary edge outward.
    Expansion,
    /// Erases every trail.
    Clear,
    /// Widens the player's camera.
    Zoom,
    /// Leaves gaps in the collector's trail.
    Sparse,
    /// Grants one projectile.
    Ammo,
    /// Brings another AI opponent into the arena.
    AddAi,
    /// Awards bonus points, raises caps and spawns extra pickups.
    Multi,
}

impl PickupKind {
    /// Every pickup kind in declaration order.
    pub const ALL: [PickupKind; 8] = [
        PickupKind::Score,
        PickupKind::Expansion,
        PickupKind::Clear,
        PickupKind::Zoom,
        PickupKind::Sparse,
        PickupKind::Ammo,
        PickupKind::AddAi,
        PickupKind::Multi,
    ];

    /// Kinds spawned opportunistically and replaced as soon as they are collected.
    pub const SCORE_GATED: [PickupKind; 3] =
        [PickupKind::Score, PickupKind::Zoom, PickupKind::Sparse];

    /// Kinds scheduled by the cumulative collection counter.
    pub const COUNTER_GATED: [PickupKind; 5] = [
        PickupKind::Ammo,
        PickupKind::Clear,
        PickupKind::AddAi,
        PickupKind::Expansion,
        PickupKind::Multi,
    ];

    /// Dense index of the kind, matching its position in [`PickupKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Score => 0,
            Self::Expansion => 1,
            Self::Clear => 2,
            Self::Zoom => 3,
            Self::Sparse => 4,
            Self::Ammo => 5,
            Self::AddAi => 6,
            Self::Multi => 7,
        }
    }

    /// Reports whether a replacement is spawned as soon as one is collected.
    #[must_use]
    pub const fn respawns_on_collect(self) -> bool {
        matches!(self, Self::Score | Self::Zoom | Self::Sparse)
    }

    /// Reports whether the collection counter schedules this kind.
    #[must_use]
    pub const fn is_counter_gated(self) -> bool {
        !self.respawns_on_collect()
    }

    /// Name shown in unlock announcements.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Score => "Score",
            Self::Expansion => "Arena Expansion",
            Self::Clear => "Wall Clear",
            Self::Zoom => "Zoom Out",
            Self::Sparse => "Sparse Trail",
            Self::Ammo => "Ammo",
            Self::AddAi => "Extra Opponent",
            Self::Multi => "Multi Spawn",
        }
    }

    /// Color shown in unlock announcements and on the pickup itself.
    #[must_use]
    pub const fn color(self) -> AgentColor {
        match self {
            Self::Score => AgentColor::from_rgb(0xff, 0xd7, 0x00),
            Self::Expansion => AgentColor::from_rgb(0x00, 0xc8, 0x53),
            Self::Clear => AgentColor::from_rgb(0xff, 0xff, 0xff),
            Self::Zoom => AgentColor::from_rgb(0x29, 0xb6, 0xf6),
            Self::Sparse => AgentColor::from_rgb(0xab, 0x47, 0xbc),
            Self::Ammo => AgentColor::from_rgb(0xff, 0x70, 0x43),
            Self::AddAi => AgentColor::from_rgb(0xe5, 0x39, 0x35),
            Self::Multi => AgentColor::from_rgb(0xff, 0x40, 0x81),
        }
    }
}

/// Timed power-ups carried by agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Shortens the step interval.
    SpeedBoost,
    /// Widens the camera; cosmetic for the core.
    ZoomOut,
    /// Commits trail segments only every Nth step.
    SparseTrail,
}

/// Phases of the match state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Arena built, waiting for the first intent.
    Idle,
    /// Simulation running.
    Active,
    /// Simulation suspended by the player.
    Paused,
    /// A terminal outcome was reached.
    GameOver,
}

/// Match result derived after each resolved frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Player alive and at least one AI alive.
    Ongoing,
    /// Player lost while at least one AI remains.
    OpponentsWin,
    /// Player survives and every AI is gone.
    PlayerWins,
    /// Both sides ended in the same frame, or nobody is left.
    Draw,
}

impl MatchOutcome {
    /// Derives the outcome from the two sides' survival.
    #[must_use]
    pub const fn from_survivors(player_alive: bool, opponents_alive: bool) -> Self {
        match (player_alive, opponents_alive) {
            (true, true) => Self::Ongoing,
            (false, true) => Self::OpponentsWin,
            (true, false) => Self::PlayerWins,
            (false, false) => Self::Draw,
        }
    }

    /// Numeric winner code: 0 ongoing, 1 opponents, 2 player, 3 draw.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ongoing => 0,
            Self::OpponentsWin => 1,
            Self::PlayerWins => 2,
            Self::Draw => 3,
        }
    }
}

/// Collision classes that eliminate agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossCause {
    /// Head reached or crossed a boundary edge.
    Boundary,
    /// Two heads met.
    HeadOn,
    /// Head struck a trail segment.
    Trail,
    /// Two agents swapped cells in the same frame.
    CrossedPaths,
    /// The presentation handle of the agent disappeared.
    Detached,
}

/// Reasons an intent may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentRejection {
    /// The current match phase does not accept the intent.
    PhaseDisallows,
    /// No agent with the provided identifier exists.
    UnknownAgent,
    /// The agent is spawning or already lost.
    AgentNotActive,
    /// The turn would reverse the agent within a single step.
    ReversalBlocked,
    /// The agent has no ammo left.
    NoAmmo,
}

/// Reasons a pickup spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupRejection {
    /// The match is over.
    PhaseDisallows,
    /// The all-time top score has not reached the kind's threshold.
    Locked,
    /// The kind already has as many live instances as its cap allows.
    CapReached,
    /// The requested cell is outside the arena or occupied.
    CellBlocked,
}

#[cfg(test)]
mod tests {
    use super::{
        AgentId, Boundary, Direction, IntentRejection, MatchOutcome, PickupKind, PickupRejection,
        Turn,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn quarter_turns_never_reverse() {
        for direction in Direction::ALL {
            for turn in [Turn::Left, Turn::Right] {
                let turned = direction.turned(turn);
                assert_ne!(turned, direction);
                assert_ne!(turned, direction.opposite());
                assert_eq!(turned.unit().dot(direction.unit()), 0.0);
            }
        }
    }

    #[test]
    fn opposite_turns_cancel() {
        for direction in Direction::ALL {
            assert_eq!(direction.turned(Turn::Left).turned(Turn::Right), direction);
        }
    }

    #[test]
    fn four_left_turns_return_home() {
        let mut direction = Direction::East;
        for _ in 0..4 {
            direction = direction.turned(Turn::Left);
        }
        assert_eq!(direction, Direction::East);
        assert_eq!(Direction::East.turned(Turn::Left), Direction::North);
    }

    #[test]
    fn outcome_codes_match_survivors() {
        assert_eq!(MatchOutcome::from_survivors(true, true).code(), 0);
        assert_eq!(MatchOutcome::from_survivors(false, true).code(), 1);
        assert_eq!(MatchOutcome::from_survivors(true, false).code(), 2);
        assert_eq!(MatchOutcome::from_survivors(false, false).code(), 3);
    }

    #[test]
    fn pickup_kind_indices_are_dense() {
        for (index, kind) in PickupKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
    }

    #[test]
    fn gated_pools_partition_kinds() {
        for kind in PickupKind::ALL {
            let score_gated = PickupKind::SCORE_GATED.contains(&kind);
            let counter_gated = PickupKind::COUNTER_GATED.contains(&kind);
            assert!(score_gated ^ counter_gated, "{kind:?} must be in exactly one pool");
            assert_eq!(kind.is_counter_gated(), counter_gated);
        }
    }

    #[test]
    fn agent_id_round_trips_through_bincode() {
        assert_round_trip(&AgentId::new(42));
    }

    #[test]
    fn boundary_round_trips_through_bincode() {
        assert_round_trip(&Boundary::new(-10.0, 12.0, -4.0, 8.0));
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&IntentRejection::ReversalBlocked);
        assert_round_trip(&PickupRejection::CapReached);
    }
}
