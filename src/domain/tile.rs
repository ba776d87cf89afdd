/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Floor,
    Wall,
}

impl Tile {
    /// Does this tile block movement and path expansion?
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Can an entity occupy this cell?
    pub fn is_passable(self) -> bool {
        !self.is_wall()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_passable_wall_is_not() {
        assert!(Tile::Floor.is_passable());
        assert!(!Tile::Floor.is_wall());
        assert!(Tile::Wall.is_wall());
        assert!(!Tile::Wall.is_passable());
    }

    #[test]
    fn default_tile_is_floor() {
        assert_eq!(Tile::default(), Tile::Floor);
    }
}
