//! Read-only snapshots the world hands to systems and adapters.

use std::{collections::HashMap, time::Duration};

use glam::Vec2;

use crate::{
    AgentColor, AgentId, Boundary, Controller, Direction, GridCell, GridDimensions, Lifecycle,
    LossCause, PickupId, PickupKind, ProjectileId,
};

/// Level and remaining time of a timed power-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerUpStatus {
    /// Stack level; zero while inactive.
    pub level: u32,
    /// Time left before the power-up expires.
    pub remaining: Duration,
}

impl PowerUpStatus {
    /// Reports whether the power-up currently has any effect.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.level > 0
    }
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Source of steering decisions.
    pub controller: Controller,
    /// Appearance of the agent and its trail.
    pub color: AgentColor,
    /// Cell center currently occupied by the head.
    pub position: Vec2,
    /// Heading the agent will step along next.
    pub direction: Direction,
    /// Heading the agent last stepped along.
    pub committed_direction: Direction,
    /// Lifecycle stage of the agent.
    pub lifecycle: Lifecycle,
    /// Collision class that eliminated the agent, once lost.
    pub loss_cause: Option<LossCause>,
    /// Indicates whether the agent accrued enough time to advance.
    pub ready_for_step: bool,
    /// Projectiles the agent may still fire.
    pub ammo: u32,
    /// Speed boost state.
    pub speed_boost: PowerUpStatus,
    /// Zoom-out state.
    pub zoom_out: PowerUpStatus,
    /// Sparse trail state.
    pub sparse_trail: PowerUpStatus,
    /// Number of committed trail segments.
    pub trail_len: usize,
}

impl AgentSnapshot {
    /// Reports whether the agent moves and collides.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }
}

/// Read-only snapshot describing every agent in the arena.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single agent.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// The human-controlled agent, if one exists.
    #[must_use]
    pub fn player(&self) -> Option<&AgentSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.controller == Controller::Human)
    }
}

/// Committed trail of one agent, oldest segment first.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailSnapshot {
    /// Agent that laid the trail.
    pub owner: AgentId,
    /// Trail color, matching the owner.
    pub color: AgentColor,
    /// Cell centers covered by the trail.
    pub segments: Vec<Vec2>,
}

/// Read-only snapshot of every trail in the arena.
#[derive(Clone, Debug, Default)]
pub struct TrailView {
    snapshots: Vec<TrailSnapshot>,
}

impl TrailView {
    /// Creates a new trail view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TrailSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.owner);
        Self { snapshots }
    }

    /// Iterator over trails ordered by owner.
    pub fn iter(&self) -> impl Iterator<Item = &TrailSnapshot> {
        self.snapshots.iter()
    }

    /// Trail segments laid by a single agent.
    #[must_use]
    pub fn segments_of(&self, agent: AgentId) -> &[Vec2] {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.owner == agent)
            .map_or(&[], |snapshot| snapshot.segments.as_slice())
    }

    /// Total number of segments across all trails.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.snapshots
            .iter()
            .map(|snapshot| snapshot.segments.len())
            .sum()
    }
}

/// Immutable representation of a live pickup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickupSnapshot {
    /// Identifier assigned by the world.
    pub id: PickupId,
    /// Kind of the pickup.
    pub kind: PickupKind,
    /// Cell center hosting the pickup.
    pub position: Vec2,
    /// Simulated time since the pickup appeared.
    pub age: Duration,
}

/// Live-instance caps per pickup kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PickupCaps {
    caps: [u32; PickupKind::ALL.len()],
}

impl PickupCaps {
    /// Creates caps from a per-kind lookup.
    #[must_use]
    pub fn from_fn(mut cap: impl FnMut(PickupKind) -> u32) -> Self {
        let mut caps = [0; PickupKind::ALL.len()];
        for kind in PickupKind::ALL {
            caps[kind.index()] = cap(kind);
        }
        Self { caps }
    }

    /// Current cap for the provided kind.
    #[must_use]
    pub const fn cap(&self, kind: PickupKind) -> u32 {
        self.caps[kind.index()]
    }

    /// Raises the cap for the provided kind by one and returns the new value.
    pub fn raise(&mut self, kind: PickupKind) -> u32 {
        let slot = &mut self.caps[kind.index()];
        *slot = slot.saturating_add(1);
        *slot
    }
}

/// Read-only snapshot of live pickups and their caps.
#[derive(Clone, Debug, Default)]
pub struct PickupView {
    snapshots: Vec<PickupSnapshot>,
    caps: PickupCaps,
}

impl PickupView {
    /// Creates a new pickup view from the provided snapshots and caps.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PickupSnapshot>, caps: PickupCaps) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots, caps }
    }

    /// Iterator over live pickups in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PickupSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live pickups of the provided kind.
    #[must_use]
    pub fn live_count(&self, kind: PickupKind) -> u32 {
        let count = self
            .snapshots
            .iter()
            .filter(|snapshot| snapshot.kind == kind)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Current cap for the provided kind.
    #[must_use]
    pub const fn cap(&self, kind: PickupKind) -> u32 {
        self.caps.cap(kind)
    }

    /// Reports whether a pickup already sits within `radius` of `position`.
    #[must_use]
    pub fn is_near(&self, position: Vec2, radius: f32) -> bool {
        self.snapshots
            .iter()
            .any(|snapshot| snapshot.position.distance(position) < radius)
    }}

/// Immutable representation of an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier assigned by the world.
    pub id: ProjectileId,
    /// Agent that fired the projectile.
    pub owner: AgentId,
    /// Current position.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Lifetime left before the projectile expires.
    pub remaining: Duration,
}

/// Read-only snapshot of every projectile in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over projectiles in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }
}

/// What fills an occupied cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OccupantKind {
    /// The head of a spawning or active agent.
    Head,
    /// A committed trail segment.
    Trail,
}

/// Occupant of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    /// Agent owning the head or trail.
    pub agent: AgentId,
    /// Whether the cell holds a head or a trail segment.
    pub kind: OccupantKind,
}

/// Read-only occupancy map of the live arena.
///
/// Cells are indexed relative to the boundary captured with the view, so the
/// map must be rebuilt after every boundary change.
#[derive(Clone, Debug)]
pub struct OccupancyView {
    boundary: Boundary,
    cell_size: f32,
    cells: HashMap<GridCell, Occupant>,
}

impl OccupancyView {
    /// Captures occupancy from world-space positions.
    ///
    /// Heads win over trail segments that share a cell.
    #[must_use]
    pub fn from_positions(
        boundary: Boundary,
        cell_size: f32,
        occupants: impl IntoIterator<Item = (Vec2, Occupant)>,
    ) -> Self {
        let mut cells: HashMap<GridCell, Occupant> = HashMap::new();
        for (position, occupant) in occupants {
            let cell = boundary.cell_of(position, cell_size);
            let entry = cells.entry(cell).or_insert(occupant);
            if occupant.kind == OccupantKind::Head {
                *entry = occupant;
            }
        }
        Self {
            boundary,
            cell_size,
            cells,
        }
    }

    /// Boundary the cells are indexed against.
    #[must_use]
    pub const fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Side length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Whole-cell extent of the arena.
    #[must_use]
    pub fn dimensions(&self) -> GridDimensions {
        self.boundary.grid_dimensions(self.cell_size)
    }

    /// Cell containing a world-space point.
    #[must_use]
    pub fn cell_of(&self, position: Vec2) -> GridCell {
        self.boundary.cell_of(position, self.cell_size)
    }

    /// World-space center of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell) -> Vec2 {
        self.boundary.cell_center(cell, self.cell_size)
    }

    /// Reports whether a cell lies inside the arena.
    #[must_use]
    pub fn in_bounds(&self, cell: GridCell) -> bool {
        self.boundary.contains_cell(cell, self.cell_size)
    }

    /// Returns the head or trail occupying the cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: GridCell) -> Option<Occupant> {
        self.cells.get(&cell).copied()
    }

    /// Reports whether an agent could step into the cell without dying.
    #[must_use]
    pub fn is_safe(&self, cell: GridCell) -> bool {
        self.in_bounds(cell) && !self.cells.contains_key(&cell)
    }

    /// Reports whether the cell and its four neighbours are all safe.
    ///
    /// Cells flush against a wall or an occupied cell are not isolated.
    #[must_use]
    pub fn is_isolated(&self, cell: GridCell) -> bool {
        self.is_safe(cell)
            && cell
                .neighbors()
                .iter()
                .all(|neighbor| self.is_safe(*neighbor))
    }

    /// Counts consecutive safe cells from `start` along `direction`, up to `limit`.
    ///
    /// `start` itself is not probed.
    #[must_use]
    pub fn safe_run(&self, start: GridCell, direction: Direction, limit: u32) -> u32 {
        let mut cell = start;
        let mut run = 0;
        while run < limit {
            cell = cell.step(direction);
            if !self.is_safe(cell) {
                break;
            }
            run += 1;
        }
        run
    }}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupancy(occupied: &[(GridCell, OccupantKind)]) -> OccupancyView {
        let boundary = Boundary::new(0.0, 20.0, 0.0, 20.0);
        let agent = AgentId::new(0);
        OccupancyView::from_positions(
            boundary,
            2.0,
            occupied.iter().map(|(cell, kind)| {
                (
                    boundary.cell_center(*cell, 2.0),
                    Occupant { agent, kind: *kind },
                )
            }),
        )
    }

    #[test]
    fn occupied_and_outside_cells_are_unsafe() {
        let view = occupancy(&[(GridCell::new(4, 4), OccupantKind::Trail)]);
        assert!(!view.is_safe(GridCell::new(4, 4)));
        assert!(!view.is_safe(GridCell::new(-1, 4)));
        assert!(!view.is_safe(GridCell::new(10, 4)));
        assert!(view.is_safe(GridCell::new(9, 9)));
    }

    #[test]
    fn cells_next_to_walls_are_not_isolated() {
        let view = occupancy(&[(GridCell::new(4, 4), OccupantKind::Trail)]);
        assert!(view.is_safe(GridCell::new(5, 4)));
        assert!(!view.is_isolated(GridCell::new(5, 4)));
        assert!(view.is_isolated(GridCell::new(5, 5)));
        assert!(view.is_safe(GridCell::new(0, 5)));
        assert!(!view.is_isolated(GridCell::new(0, 5)));
    }

    #[test]
    fn heads_take_precedence_over_trail_in_same_cell() {
        let cell = GridCell::new(2, 2);
        let view = occupancy(&[(cell, OccupantKind::Trail), (cell, OccupantKind::Head)]);
        assert_eq!(
            view.occupant(cell).map(|occupant| occupant.kind),
            Some(OccupantKind::Head)
        );
    }

    #[test]
    fn safe_run_stops_at_first_obstacle() {
        let view = occupancy(&[(GridCell::new(5, 0), OccupantKind::Trail)]);
        assert_eq!(view.safe_run(GridCell::new(1, 0), Direction::East, 6), 3);
        assert_eq!(view.safe_run(GridCell::new(6, 0), Direction::East, 6), 3);
        assert_eq!(view.safe_run(GridCell::new(0, 0), Direction::North, 6), 0);
    }

    #[test]
    fn caps_raise_independently() {
        let mut caps = PickupCaps::from_fn(|_| 1);
        assert_eq!(caps.raise(PickupKind::Zoom), 2);
        assert_eq!(caps.cap(PickupKind::Zoom), 2);
        assert_eq!(caps.cap(PickupKind::Score), 1);
    }
}
