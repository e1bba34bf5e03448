//! Pure movement validation.
//!
//! [`validate`] is the single place that decides whether a requested
//! position change is legal. It has no side effects and no dependency on
//! room state beyond the arguments, so every rule is unit-testable in
//! isolation.

use std::collections::HashMap;

use plaza_proto::{Position, UserId};

use crate::SpaceSnapshot;

/// Movement policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct MoveRules {
    /// Whether two users may occupy the same cell. Off by default:
    /// a move onto another member's cell is refused with
    /// [`RejectReason::Occupied`].
    pub allow_stacking: bool,
}

impl Default for MoveRules {
    fn default() -> Self {
        Self {
            allow_stacking: false,
        }
    }
}

/// Why a movement request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Target is outside the space's grid.
    OutOfBounds,
    /// Target is a static obstacle cell.
    Obstacle,
    /// Target is not exactly one cardinal step away from the current
    /// position (distance 0, a jump, or a diagonal).
    NonAdjacent,
    /// Target is currently occupied by another member.
    Occupied,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "out-of-bounds"),
            Self::Obstacle => write!(f, "obstacle"),
            Self::NonAdjacent => write!(f, "non-adjacent"),
            Self::Occupied => write!(f, "occupied"),
        }
    }
}

/// Decides whether moving from `from` to the requested target is legal.
///
/// Checks run in a fixed order and short-circuit on the first failure:
/// bounds, obstacle, step size (Manhattan distance exactly 1), occupancy.
/// On success returns the target as an in-bounds [`Position`].
///
/// The occupancy check does not need to exempt the mover: a passing step
/// check guarantees the target differs from `from`, so any occupant of
/// the target is necessarily someone else.
pub fn validate(
    space: &SpaceSnapshot,
    positions: &HashMap<UserId, Position>,
    from: Position,
    target: (i64, i64),
    rules: MoveRules,
) -> Result<Position, RejectReason> {
    let (x, y) = target;

    if !space.in_bounds(x, y) {
        return Err(RejectReason::OutOfBounds);
    }
    let to = Position::new(x as u32, y as u32);

    if space.is_obstacle(to) {
        return Err(RejectReason::Obstacle);
    }

    let distance = (x - i64::from(from.x)).abs() + (y - i64::from(from.y)).abs();
    if distance != 1 {
        return Err(RejectReason::NonAdjacent);
    }

    if !rules.allow_stacking && positions.values().any(|p| *p == to) {
        return Err(RejectReason::Occupied);
    }

    Ok(to)
}
