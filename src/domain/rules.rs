/// Pure movement and combat rules.
/// No world state: everything here takes the grid and positions explicitly,
/// so step.rs and the tests share one definition of "legal".

use super::entity::MoveDir;
use super::grid::{Grid, Pos};

/// Outcome of checking a player move against terrain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveCheck {
    /// Target lies outside the grid.
    OutOfBounds,
    /// Target is a wall.
    Wall,
    /// Target is enterable.
    Open(Pos),
}

pub fn check_move(grid: &Grid, from: Pos, dir: MoveDir) -> MoveCheck {
    let (dx, dy) = dir.delta();
    let target = from.offset(dx, dy);
    if !grid.in_bounds(target) {
        MoveCheck::OutOfBounds
    } else if grid.is_wall(target) {
        MoveCheck::Wall
    } else {
        MoveCheck::Open(target)
    }
}

/// Enemies strike only from an orthogonally adjacent cell.
pub fn in_attack_range(enemy: Pos, player: Pos) -> bool {
    enemy.manhattan(player) == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_into_open_floor() {
        let g = Grid::from_rows(&[
            "#####",
            "#...#",
            "#####",
        ]);
        assert_eq!(check_move(&g, Pos::new(1, 1), MoveDir::Right), MoveCheck::Open(Pos::new(2, 1)));
    }

    #[test]
    fn move_into_wall() {
        let g = Grid::from_rows(&[
            "#####",
            "#.#.#",
            "#####",
        ]);
        assert_eq!(check_move(&g, Pos::new(1, 1), MoveDir::Right), MoveCheck::Wall);
        assert_eq!(check_move(&g, Pos::new(1, 1), MoveDir::Up), MoveCheck::Wall);
    }

    #[test]
    fn move_off_the_edge() {
        // No border: floor runs to the edge
        let g = Grid::from_rows(&[
            "...",
            "...",
        ]);
        assert_eq!(check_move(&g, Pos::new(0, 0), MoveDir::Left), MoveCheck::OutOfBounds);
        assert_eq!(check_move(&g, Pos::new(0, 0), MoveDir::Up), MoveCheck::OutOfBounds);
        assert_eq!(check_move(&g, Pos::new(2, 1), MoveDir::Right), MoveCheck::OutOfBounds);
        assert_eq!(check_move(&g, Pos::new(2, 1), MoveDir::Down), MoveCheck::OutOfBounds);
    }

    #[test]
    fn attack_range_is_orthogonal_adjacency() {
        let p = Pos::new(5, 5);
        assert!(in_attack_range(Pos::new(5, 4), p));
        assert!(in_attack_range(Pos::new(6, 5), p));
        assert!(!in_attack_range(Pos::new(6, 6), p)); // diagonal
        assert!(!in_attack_range(Pos::new(5, 7), p)); // distance 2
        assert!(!in_attack_range(p, p));
    }
}
