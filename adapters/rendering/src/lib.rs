#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Trail Arena adapters.
//!
//! Renderers never touch the world directly. They receive a [`Scene`] captured
//! from world queries once per frame and report player input back as a
//! [`FrameInput`].

use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use thiserror::Error;
use trail_arena_core::{
    AgentColor, AgentId, Boundary, Direction, Event, GridDimensions, Intent, MatchOutcome,
    MatchPhase, PickupId, PickupKind, ProjectileId,
};
use trail_arena_world::{query, World};

const ZOOM_STEP: f32 = 0.25;
const LOST_FADE: f32 = 0.6;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

impl From<AgentColor> for Color {
    fn from(color: AgentColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Whether the left turn key was pressed on this frame.
    pub turn_left: bool,
    /// Whether the right turn key was pressed on this frame.
    pub turn_right: bool,
    /// Whether the fire key was pressed on this frame.
    pub shoot: bool,
    /// Whether the look-back toggle was pressed on this frame.
    pub look_back: bool,
    /// Whether the pause toggle was pressed on this frame.
    pub pause: bool,
    /// Whether the restart key was pressed on this frame.
    pub restart: bool,
}

impl FrameInput {
    /// Translates pressed keys into intents, turns first and restart last.
    #[must_use]
    pub fn intents(&self) -> Vec<Intent> {
        [
            (self.turn_left, Intent::TurnLeft),
            (self.turn_right, Intent::TurnRight),
            (self.shoot, Intent::Shoot),
            (self.look_back, Intent::ToggleLookBack),
            (self.pause, Intent::TogglePause),
            (self.restart, Intent::Restart),
        ]
        .into_iter()
        .filter_map(|(pressed, intent)| pressed.then_some(intent))
        .collect()
    }
}

/// Floor and wall geometry, rebuilt whenever the boundary changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaPresentation {
    /// Play area rectangle.
    pub boundary: Boundary,
    /// Side length of one grid cell in world units.
    pub cell_size: f32,
    /// Whole-cell extent used for grid lines.
    pub divisions: GridDimensions,
}

impl ArenaPresentation {
    /// Creates an arena descriptor for the provided boundary.
    pub fn new(boundary: Boundary, cell_size: f32) -> Result<Self, RenderingError> {
        if !(cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            boundary,
            cell_size,
            divisions: boundary.grid_dimensions(cell_size),
        })
    }

    /// Width of the play area in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.boundary.x_max() - self.boundary.x_min()
    }

    /// Depth of the play area in world units.
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.boundary.z_max() - self.boundary.z_min()
    }
}

/// Head of a single agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentPresentation {
    /// Agent identifier.
    pub id: AgentId,
    /// Head position.
    pub position: Vec2,
    /// Heading used to orient the head.
    pub direction: Direction,
    /// Head color, faded once the agent is lost.
    pub color: Color,
    /// Whether the head belongs to the player.
    pub is_player: bool,
    /// Whether the agent is still in its spawn grace period.
    pub spawning: bool,
    /// Whether the agent was eliminated.
    pub lost: bool,
}

/// Trail laid by one agent.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailPresentation {
    /// Agent that laid the trail.
    pub owner: AgentId,
    /// Wall color.
    pub color: Color,
    /// Cell centers covered by wall segments.
    pub segments: Vec<Vec2>,
}

/// Live pickup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickupPresentation {
    /// Pickup identifier.
    pub id: PickupId,
    /// Kind of pickup.
    pub kind: PickupKind,
    /// Cell center hosting the pickup.
    pub position: Vec2,
    /// Pickup color.
    pub color: Color,
    /// Spawn animation progress in the range 0.0..=1.0.
    pub spawn_progress: f32,
}

/// Projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectilePresentation {
    /// Projectile identifier.
    pub id: ProjectileId,
    /// Current position.
    pub position: Vec2,
    /// Shooter color.
    pub color: Color,
}

/// Unlock banner shown when a pickup kind becomes available.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    /// Kind that unlocked.
    pub kind: PickupKind,
    /// Human readable name.
    pub title: &'static str,
    /// Banner color.
    pub color: Color,
    /// Score threshold that was crossed.
    pub threshold: u32,
}

/// Heads-up display values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hud {
    /// Current match phase.
    pub phase: MatchPhase,
    /// Outcome once the match has ended.
    pub outcome: Option<MatchOutcome>,
    /// Current match score.
    pub score: u32,
    /// All-time top score.
    pub top_score: u32,
    /// Simulated time the match has been running.
    pub elapsed: Duration,
    /// Player ammo.
    pub ammo: u32,
    /// Player speed boost level.
    pub speed_level: u32,
    /// Player zoom-out level.
    pub zoom_level: u32,
    /// Player sparse trail level.
    pub sparse_level: u32,
    /// Camera distance multiplier derived from the zoom-out level.
    pub camera_zoom: f32,
    /// Whether the camera looks behind the player.
    pub look_back: bool,
}

/// Scene description combining the arena and everything inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Floor and wall geometry.
    pub arena: ArenaPresentation,
    /// Agent heads.
    pub agents: Vec<AgentPresentation>,
    /// Agent trails.
    pub trails: Vec<TrailPresentation>,
    /// Live pickups.
    pub pickups: Vec<PickupPresentation>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectilePresentation>,
    /// Heads-up display.
    pub hud: Hud,
    /// Unlock banners raised by the latest frame.
    pub announcements: Vec<Announcement>,
}

impl Scene {
    /// Captures the current world state and the events of the latest frame.
    pub fn capture(world: &World, look_back: bool, events: &[Event]) -> Result<Self, RenderingError> {
        let config = query::config(world);
        let arena = ArenaPresentation::new(query::boundary(world), config.grid.cell_size)?;
        let agent_view = query::agent_view(world);

        let agents = agent_view
            .iter()
            .map(|agent| {
                let base = Color::from(agent.color);
                let lost = agent.loss_cause.is_some();
                AgentPresentation {
                    id: agent.id,
                    position: agent.position,
                    direction: agent.direction,
                    color: if lost { base.with_alpha(LOST_FADE) } else { base },
                    is_player: agent_view
                        .player()
                        .is_some_and(|player| player.id == agent.id),
                    spawning: !lost && !agent.is_active(),
                    lost,
                }
            })
            .collect();

        let trails = query::trail_view(world)
            .iter()
            .map(|trail| TrailPresentation {
                owner: trail.owner,
                color: Color::from(trail.color),
                segments: trail.segments.clone(),
            })
            .collect();

        let animation = config.pickups.spawn_animation();
        let pickups = query::pickup_view(world)
            .iter()
            .map(|pickup| PickupPresentation {
                id: pickup.id,
                kind: pickup.kind,
                position: pickup.position,
                color: Color::from(pickup.kind.color()),
                spawn_progress: spawn_progress(pickup.age, animation),
            })
            .collect();

        let projectiles = query::projectile_view(world)
            .iter()
            .map(|projectile| ProjectilePresentation {
                id: projectile.id,
                position: projectile.position,
                color: agent_view
                    .get(projectile.owner)
                    .map_or(Color::new(1.0, 1.0, 1.0, 1.0), |owner| {
                        Color::from(owner.color).lighten(0.5)
                    }),
            })
            .collect();

        let player = agent_view.player();
        let zoom_level = player.map_or(0, |player| player.zoom_out.level);
        let phase = query::phase(world);
        let hud = Hud {
            phase,
            outcome: (phase == MatchPhase::GameOver).then(|| query::outcome(world)),
            score: query::score(world),
            top_score: query::top_score(world),
            elapsed: query::elapsed(world),
            ammo: player.map_or(0, |player| player.ammo),
            speed_level: player.map_or(0, |player| player.speed_boost.level),
            zoom_level,
            sparse_level: player.map_or(0, |player| player.sparse_trail.level),
            camera_zoom: 1.0 + zoom_level as f32 * ZOOM_STEP,
            look_back,
        };

        let announcements = events
            .iter()
            .filter_map(|event| match event {
                Event::PickupUnlocked { kind, threshold } => Some(Announcement {
                    kind: *kind,
                    title: kind.display_name(),
                    color: Color::from(kind.color()),
                    threshold: *threshold,
                }),
                _ => None,
            })
            .collect();

        Ok(Self {
            arena,
            agents,
            trails,
            pickups,
            projectiles,
            hud,
            announcements,
        })
    }
}

fn spawn_progress(age: Duration, animation: Duration) -> f32 {
    if animation.is_zero() {
        return 1.0;
    }
    (age.as_secs_f32() / animation.as_secs_f32()).clamp(0.0, 1.0)
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Trail Arena scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and replaces the scene before it is
    /// drawn. Returning `false` asks the backend to stop.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> bool;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive size to be drawn.
    #[error("cell size must be positive (received {cell_size})")]
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_arena_core::Command;
    use trail_arena_world as world;

    #[test]
    fn arena_rejects_non_positive_cell_size() {
        let boundary = Boundary::new(-4.0, 4.0, -4.0, 4.0);
        assert_eq!(
            ArenaPresentation::new(boundary, 0.0),
            Err(RenderingError::InvalidCellSize { cell_size: 0.0 })
        );
        let arena = ArenaPresentation::new(boundary, 2.0).expect("positive cell size");
        assert_eq!(arena.divisions.divisions_x, 4);
        assert_eq!(arena.width(), 8.0);
    }

    #[test]
    fn frame_input_maps_keys_to_intents_in_order() {
        let input = FrameInput {
            restart: true,
            turn_right: true,
            look_back: true,
            ..FrameInput::default()
        };
        assert_eq!(
            input.intents(),
            vec![Intent::TurnRight, Intent::ToggleLookBack, Intent::Restart]
        );
        assert!(FrameInput::default().intents().is_empty());
    }

    #[test]
    fn agent_colors_convert_to_unit_channels() {
        let color = Color::from(AgentColor::from_rgb(255, 0, 51));
        assert_eq!(color, Color::new(1.0, 0.0, 0.2, 1.0));
    }

    #[test]
    fn spawn_progress_saturates() {
        let animation = Duration::from_millis(500);
        assert_eq!(spawn_progress(Duration::ZERO, animation), 0.0);
        assert_eq!(spawn_progress(Duration::from_millis(250), animation), 0.5);
        assert_eq!(spawn_progress(Duration::from_secs(3), animation), 1.0);
        assert_eq!(spawn_progress(Duration::ZERO, Duration::ZERO), 1.0);
    }

    #[test]
    fn capture_reflects_a_fresh_match() {
        let mut world = World::default();
        let mut events = Vec::new();
        world::apply(&mut world, Command::StartMatch, &mut events);
        world::apply(
            &mut world,
            Command::SpawnPickup {
                kind: PickupKind::Score,
                position: Vec2::new(-31.0, -31.0),
            },
            &mut events,
        );

        let scene = Scene::capture(&world, true, &events).expect("valid arena");
        assert_eq!(scene.agents.len(), 2);
        assert_eq!(scene.agents.iter().filter(|agent| agent.is_player).count(), 1);
        assert!(scene.agents.iter().any(|agent| agent.spawning));
        assert_eq!(scene.pickups.len(), 1);
        assert_eq!(scene.pickups[0].spawn_progress, 0.0);
        assert_eq!(scene.hud.phase, MatchPhase::Active);
        assert_eq!(scene.hud.outcome, None);
        assert_eq!(scene.hud.elapsed, Duration::ZERO);
        assert_eq!(scene.hud.camera_zoom, 1.0);
        assert!(scene.hud.look_back);
        assert!(scene.announcements.is_empty());
    }

    #[test]
    fn hud_reports_active_time_only() {
        let mut world = World::default();
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: Duration::from_millis(40) }, &mut events);
        world::apply(&mut world, Command::StartMatch, &mut events);
        world::apply(&mut world, Command::Tick { dt: Duration::from_millis(40) }, &mut events);

        let scene = Scene::capture(&world, false, &events).expect("valid arena");
        assert_eq!(scene.hud.elapsed, Duration::from_millis(40));
    }

    #[test]
    fn unlock_events_become_announcements() {
        let world = World::default();
        let events = [Event::PickupUnlocked {
            kind: PickupKind::Sparse,
            threshold: 100,
        }];
        let scene = Scene::capture(&world, false, &events).expect("valid arena");
        assert_eq!(
            scene.announcements,
            vec![Announcement {
                kind: PickupKind::Sparse,
                title: "Sparse Trail",
                color: Color::from(PickupKind::Sparse.color()),
                threshold: 100,
            }]
        );
    }
}
