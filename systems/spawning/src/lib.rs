#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system placing AI opponents requested by add-AI pickups.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};
use trail_arena_core::{AgentColor, Command, Direction, Event, GridCell, OccupancyView};

const SPAWN_COLORS: [AgentColor; 4] = [
    AgentColor::from_rgb(0xff, 0x1e, 0x9b),
    AgentColor::from_rgb(0x76, 0xff, 0x03),
    AgentColor::from_rgb(0xff, 0xd6, 0x00),
    AgentColor::from_rgb(0x7c, 0x4d, 0xff),
];

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    placement_attempts: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided search budget and seed.
    #[must_use]
    pub const fn new(placement_attempts: u32, rng_seed: u64) -> Self {
        Self {
            placement_attempts,
            rng_seed,
        }
    }
}

/// Pure system that answers opponent requests with spawn commands.
#[derive(Debug)]
pub struct Spawning {
    placement_attempts: u32,
    rng: ChaCha8Rng,
    color_index: usize,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            placement_attempts: config.placement_attempts,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            color_index: 0,
        }
    }

    /// Consumes events and the occupancy view to emit opponent spawn commands.
    ///
    /// `look_ahead` is the run of clear cells a new opponent would like in front
    /// of it; when no direction offers that much the longest run wins.
    pub fn handle(
        &mut self,
        events: &[Event],
        occupancy: &OccupancyView,
        look_ahead: u32,
        out: &mut Vec<Command>,
    ) {
        let mut reserved = Vec::new();
        for event in events {
            match event {
                Event::MatchReset { .. } => self.color_index = 0,
                Event::OpponentRequested { requested_by } => {
                    let Some(cell) = self.select_cell(occupancy, &reserved) else {
                        warn!(
                            requested_by = requested_by.get(),
                            attempts = self.placement_attempts,
                            "no free cell found for opponent"
                        );
                        continue;
                    };
                    reserved.push(cell);
                    let direction = clearest_direction(occupancy, cell, look_ahead);
                    let color = self.next_color();
                    debug!(?cell, ?direction, "opponent spawn requested");
                    out.push(Command::SpawnOpponent {
                        position: occupancy.cell_center(cell),
                        direction,
                        color,
                    });
                }
                _ => {}
            }
        }
    }

    fn select_cell(&mut self, occupancy: &OccupancyView, reserved: &[GridCell]) -> Option<GridCell> {
        let dimensions = occupancy.dimensions();
        if dimensions.divisions_x == 0 || dimensions.divisions_z == 0 {
            return None;
        }
        (0..self.placement_attempts).find_map(|_| {
            let cell = GridCell::new(
                self.rng.gen_range(0..dimensions.divisions_x) as i32,
                self.rng.gen_range(0..dimensions.divisions_z) as i32,
            );
            (occupancy.is_isolated(cell) && !reserved.contains(&cell)).then_some(cell)
        })
    }

    fn next_color(&mut self) -> AgentColor {
        let color = SPAWN_COLORS[self.color_index % SPAWN_COLORS.len()];
        self.color_index = (self.color_index + 1) % SPAWN_COLORS.len();
        color
    }
}

/// Heading with the longest safe run from `cell`, first in [`Direction::ALL`] on ties.
fn clearest_direction(occupancy: &OccupancyView, cell: GridCell, look_ahead: u32) -> Direction {
    let mut best = (Direction::ALL[0], 0);
    for direction in Direction::ALL {
        let run = occupancy.safe_run(cell, direction, look_ahead);
        if run > best.1 {
            best = (direction, run);
        }
    }
    best.0
}
