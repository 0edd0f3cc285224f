//! Grid and boundary model mapping continuous coordinates onto cell centers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Direction;

/// Horizontal axes of the arena plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// World x axis.
    X,
    /// World z axis, carried in the `y` component of [`Vec2`].
    Z,
}

/// Axis-aligned play area rectangle.
///
/// The grid is anchored at the minimum corner rather than the origin, so every
/// cell center sits at `min + (index + 0.5) * cell_size` on each axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    x_min: f32,
    x_max: f32,
    z_min: f32,
    z_max: f32,
}

impl Boundary {
    /// Creates a boundary from its four edges.
    #[must_use]
    pub const fn new(x_min: f32, x_max: f32, z_min: f32, z_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            z_min,
            z_max,
        }
    }

    /// Lower edge on the x axis.
    #[must_use]
    pub const fn x_min(&self) -> f32 {
        self.x_min
    }

    /// Upper edge on the x axis.
    #[must_use]
    pub const fn x_max(&self) -> f32 {
        self.x_max
    }

    /// Lower edge on the z axis.
    #[must_use]
    pub const fn z_min(&self) -> f32 {
        self.z_min
    }

    /// Upper edge on the z axis.
    #[must_use]
    pub const fn z_max(&self) -> f32 {
        self.z_max
    }

    /// Lower edge on the provided axis.
    #[must_use]
    pub const fn min(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x_min,
            Axis::Z => self.z_min,
        }
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.x_min + self.x_max) * 0.5,
            (self.z_min + self.z_max) * 0.5,
        )
    }

    /// Maps a coordinate to the center of the cell it falls in.
    ///
    /// Snapping is idempotent: a value already on a cell center maps to itself.
    #[must_use]
    pub fn snap_to_grid_center(&self, value: f32, axis: Axis, cell_size: f32) -> f32 {
        if cell_size <= f32::EPSILON {
            return value;
        }
        let min = self.min(axis);
        let index = ((value - min) / cell_size).floor();
        min + (index + 0.5) * cell_size
    }

    /// Snaps both components of a point.
    #[must_use]
    pub fn snap_point(&self, point: Vec2, cell_size: f32) -> Vec2 {
        Vec2::new(
            self.snap_to_grid_center(point.x, Axis::X, cell_size),
            self.snap_to_grid_center(point.y, Axis::Z, cell_size),
        )
    }

    /// Number of whole cells spanned along each axis.
    #[must_use]
    pub fn grid_dimensions(&self, cell_size: f32) -> GridDimensions {
        if cell_size <= f32::EPSILON {
            return GridDimensions::default();
        }
        let divisions = |span: f32| -> u32 {
            let rounded = (span / cell_size).round();
            if rounded <= 0.0 {
                0
            } else {
                rounded as u32
            }
        };
        GridDimensions {
            divisions_x: divisions(self.x_max - self.x_min),
            divisions_z: divisions(self.z_max - self.z_min),
        }
    }

    /// Reports whether a point lies at or beyond any edge.
    ///
    /// `epsilon` widens the forbidden band inward so a point sitting on an edge
    /// within floating point noise still counts as outside.
    #[must_use]
    pub fn is_outside(&self, point: Vec2, epsilon: f32) -> bool {
        point.x <= self.x_min + epsilon
            || point.x >= self.x_max - epsilon
            || point.y <= self.z_min + epsilon
            || point.y >= self.z_max - epsilon
    }

    /// Returns a copy with the edge faced by `direction` pushed outward.
    #[must_use]
    pub fn expanded(&self, direction: Direction, amount: f32) -> Self {
        let mut next = *self;
        match direction {
            Direction::East => next.x_max += amount,
            Direction::West => next.x_min -= amount,
            Direction::South => next.z_max += amount,
            Direction::North => next.z_min -= amount,
        }
        next
    }

    /// Cell containing the provided point, relative to the current minimum corner.
    #[must_use]
    pub fn cell_of(&self, point: Vec2, cell_size: f32) -> GridCell {
        if cell_size <= f32::EPSILON {
            return GridCell::new(0, 0);
        }
        let column = ((point.x - self.x_min) / cell_size).floor();
        let row = ((point.y - self.z_min) / cell_size).floor();
        GridCell::new(column as i32, row as i32)
    }

    /// World-space center of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell, cell_size: f32) -> Vec2 {
        Vec2::new(
            self.x_min + (cell.column() as f32 + 0.5) * cell_size,
            self.z_min + (cell.row() as f32 + 0.5) * cell_size,
        )
    }

    /// Reports whether a cell lies inside the rectangle.
    #[must_use]
    pub fn contains_cell(&self, cell: GridCell, cell_size: f32) -> bool {
        let dimensions = self.grid_dimensions(cell_size);
        cell.column() >= 0
            && cell.row() >= 0
            && (cell.column() as u32) < dimensions.divisions_x
            && (cell.row() as u32) < dimensions.divisions_z
    }
}

/// Whole-cell extent of the boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridDimensions {
    /// Cells along the x axis.
    pub divisions_x: u32,
    /// Cells along the z axis.
    pub divisions_z: u32,
}

/// Integer cell index relative to the boundary's minimum corner.
///
/// Indices may be negative or exceed the grid for points outside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    column: i32,
    row: i32,
}

impl GridCell {
    /// Creates a new cell index.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index along the x axis.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index along the z axis.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Neighbouring cell one step along `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::North => Self::new(self.column, self.row - 1),
            Direction::East => Self::new(self.column + 1, self.row),
            Direction::South => Self::new(self.column, self.row + 1),
            Direction::West => Self::new(self.column - 1, self.row),
        }
    }

    /// The four edge-adjacent neighbours.
    #[must_use]
    pub const fn neighbors(self) -> [GridCell; 4] {
        [
            self.step(Direction::North),
            self.step(Direction::East),
            self.step(Direction::South),
            self.step(Direction::West),
        ]
    }

    /// Squared Euclidean distance between two cells.
    #[must_use]
    pub fn distance_squared(self, other: GridCell) -> i64 {
        let dx = i64::from(self.column) - i64::from(other.column);
        let dz = i64::from(self.row) - i64::from(other.row);
        dx * dx + dz * dz
    }
}
