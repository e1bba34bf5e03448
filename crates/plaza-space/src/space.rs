//! The read-only space snapshot a room is constructed from.

use std::collections::HashSet;

use plaza_proto::{Position, SpaceId};

/// Immutable description of one space: grid dimensions and the static
/// obstacle layout. Fetched from the catalog collaborator at join time
/// and never mutated by the presence core.
#[derive(Debug, Clone)]
pub struct SpaceSnapshot {
    pub id: SpaceId,
    pub width: u32,
    pub height: u32,
    pub obstacles: HashSet<Position>,
}

impl SpaceSnapshot {
    /// Creates a snapshot with no obstacles.
    pub fn new(id: SpaceId, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            obstacles: HashSet::new(),
        }
    }

    /// Adds obstacle cells. Cells outside the grid are kept but can
    /// never match a validated position, so they are harmless.
    pub fn with_obstacles(
        mut self,
        obstacles: impl IntoIterator<Item = Position>,
    ) -> Self {
        self.obstacles.extend(obstacles);
        self
    }

    /// Whether the (possibly negative) coordinates fall inside the grid.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Whether the cell is part of the static obstacle layout.
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.obstacles.contains(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SpaceSnapshot {
        SpaceSnapshot::new(SpaceId::from("s"), 100, 200)
            .with_obstacles([Position::new(5, 5)])
    }

    #[test]
    fn test_in_bounds_accepts_interior_and_edges() {
        let s = snapshot();
        assert!(s.in_bounds(0, 0));
        assert!(s.in_bounds(99, 199));
    }

    #[test]
    fn test_in_bounds_rejects_outside() {
        let s = snapshot();
        assert!(!s.in_bounds(-1, 0));
        assert!(!s.in_bounds(0, -1));
        assert!(!s.in_bounds(100, 0));
        assert!(!s.in_bounds(0, 200));
    }

    #[test]
    fn test_is_obstacle() {
        let s = snapshot();
        assert!(s.is_obstacle(Position::new(5, 5)));
        assert!(!s.is_obstacle(Position::new(5, 6)));
    }
}
