//! Terrain grid consulted for movement speed and blocking.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Surface type of a single terrain cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground at full speed.
    #[default]
    Ground,
    /// Sticky ground that halves movement speed.
    Mud,
    /// Impassable obstacle.
    Wall,
}

impl TerrainKind {
    /// Movement speed multiplier applied while standing on the cell.
    #[must_use]
    pub const fn speed_multiplier(self) -> f32 {
        match self {
            Self::Ground => 1.0,
            Self::Mud => 0.5,
            Self::Wall => 0.0,
        }
    }

    /// Reports whether the cell refuses entry.
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Dense row-major grid of terrain cells anchored at the world origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    columns: u32,
    rows: u32,
    cell_size: f32,
    cells: Vec<TerrainKind>,
}

impl Terrain {
    /// Creates a grid of open ground.
    #[must_use]
    pub fn open(columns: u32, rows: u32, cell_size: f32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cell_size,
            cells: vec![TerrainKind::Ground; capacity],
        }
    }

    /// Overwrites a single cell; returns `false` when the cell lies outside the grid.
    pub fn set(&mut self, column: u32, row: u32, kind: TerrainKind) -> bool {
        match self.index(column, row) {
            Some(index) => {
                self.cells[index] = kind;
                true
            }
            None => false,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total width in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Total height in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Reports whether the position lies within the grid bounds.
    #[must_use]
    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.y >= 0.0
            && position.x < self.width()
            && position.y < self.height()
    }

    /// Terrain under the provided position, or `None` outside the grid.
    #[must_use]
    pub fn kind_at(&self, position: Vec2) -> Option<TerrainKind> {
        if !self.contains(position) || self.cell_size <= 0.0 {
            return None;
        }
        let column = (position.x / self.cell_size) as u32;
        let row = (position.y / self.cell_size) as u32;
        self.index(column, row).map(|index| self.cells[index])
    }

    /// Reports whether movement into the position is refused; outside counts as blocked.
    #[must_use]
    pub fn is_blocked(&self, position: Vec2) -> bool {
        self.kind_at(position).map_or(true, TerrainKind::is_blocked)
    }

    /// Speed multiplier under the provided position; zero outside the grid.
    #[must_use]
    pub fn speed_multiplier(&self, position: Vec2) -> f32 {
        self.kind_at(position)
            .map_or(0.0, TerrainKind::speed_multiplier)
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
