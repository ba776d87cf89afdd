/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound; the simulation
/// itself never reads them back.

use crate::domain::grid::Pos;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockReason {
    OutOfBounds,
    Wall,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    MoveBlocked { reason: BlockReason },
    TrapTriggered { at: Pos },
    TreasureFound { at: Pos },
    EnemyCollision { id: usize, at: Pos },
    EnemyAttacked { id: usize },
    EnemyMoved { id: usize, to: Pos },
    PlayerDied,
    ExitReached,
    LevelGenerated { depth: u32 },
}
