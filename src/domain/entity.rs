/// Entities: Player and Enemy, plus the movement intent type.
/// Treasures and traps are bare positions, tracked by the registry.

use super::grid::Pos;

/// Movement direction (one cell, 4-directional).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub const ALL: [MoveDir; 4] = [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub pos: Pos,
    pub health: i32,
}

impl Player {
    pub fn new(pos: Pos, health: i32) -> Self {
        Player { pos, health }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Apply damage, clamping at zero. Returns true if this blow was fatal.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        debug_assert!(amount >= 0, "negative damage {amount}");
        let was_alive = self.health > 0;
        self.health = (self.health - amount).max(0);
        was_alive && self.health == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub id: usize,
    pub pos: Pos,
    pub health: i32,
}

impl Enemy {
    pub fn new(id: usize, pos: Pos, health: i32) -> Self {
        Enemy { id, pos, health }
    }
}
