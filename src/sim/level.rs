/// Procedural level generation.
///
/// ## Terrain
///   Border = wall, interior = floor, then `floor(w * h * density)` extra
///   walls scattered at random interior cells. A scatter that lands on the
///   spawn or exit is skipped (not retried). Spawn is fixed at (1, 1), exit at
///   (w - 2, h - 2); both are forced back to floor. Connectivity is NOT
///   checked: the exit can occasionally be walled off.
///
/// ## Entities
///   Placed in order enemies → treasures → traps, each on a random interior
///   floor cell that is not the spawn, the exit, or already taken. Enemies
///   must also be farther than `enemy_spawn_distance` from the spawn.
///   Random sampling is capped at `placement_attempts`; after that a
///   row-major scan takes the first legal cell, and if there is none the
///   entity is dropped.

use log::{info, warn};
use rand::Rng;

use crate::config::DungeonConfig;
use crate::domain::entity::Enemy;
use crate::domain::grid::{Grid, Pos};
use crate::domain::registry::EntityRegistry;
use crate::domain::tile::Tile;

pub const SPAWN: Pos = Pos::new(1, 1);

/// One freshly generated level: terrain plus its entities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub grid: Grid,
    pub spawn: Pos,
    pub exit: Pos,
    pub entities: EntityRegistry,
}

#[derive(Clone, Copy, Debug)]
enum EntityKind {
    Enemy,
    Treasure,
    Trap,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn exit_for(width: usize, height: usize) -> Pos {
    Pos::new(width as i32 - 2, height as i32 - 2)
}

/// Build the terrain for a level. Returns `(grid, spawn, exit)`.
pub fn generate_grid(
    width: usize,
    height: usize,
    wall_density: f64,
    rng: &mut impl Rng,
) -> (Grid, Pos, Pos) {
    let mut grid = Grid::bordered(width, height);
    let spawn = SPAWN;
    let exit = exit_for(width, height);

    let wall_count = ((width * height) as f64 * wall_density).floor() as usize;
    for _ in 0..wall_count {
        let p = random_interior(&grid, rng);
        if p != spawn && p != exit {
            grid.set(p, Tile::Wall);
        }
    }

    grid.set(spawn, Tile::Floor);
    grid.set(exit, Tile::Floor);

    (grid, spawn, exit)
}

/// Place enemies, treasures and traps on an existing grid.
pub fn populate(
    grid: &Grid,
    spawn: Pos,
    exit: Pos,
    cfg: &DungeonConfig,
    enemy_health: i32,
    rng: &mut impl Rng,
) -> EntityRegistry {
    let mut reg = EntityRegistry::new();

    for id in 0..cfg.enemy_count {
        let found = place(grid, rng, cfg.placement_attempts, EntityKind::Enemy, |p| {
            is_free(grid, &reg, spawn, exit, p) && p.manhattan(spawn) > cfg.enemy_spawn_distance
        });
        if let Some(p) = found {
            reg.add_enemy(Enemy::new(id, p, enemy_health));
        }
    }

    for _ in 0..cfg.treasure_count {
        let found = place(grid, rng, cfg.placement_attempts, EntityKind::Treasure, |p| {
            is_free(grid, &reg, spawn, exit, p)
        });
        if let Some(p) = found {
            reg.treasures.insert(p);
        }
    }

    for _ in 0..cfg.trap_count {
        let found = place(grid, rng, cfg.placement_attempts, EntityKind::Trap, |p| {
            is_free(grid, &reg, spawn, exit, p)
        });
        if let Some(p) = found {
            reg.traps.insert(p);
        }
    }

    reg
}

/// Generate terrain and entities in one go.
pub fn generate_level(cfg: &DungeonConfig, enemy_health: i32, rng: &mut impl Rng) -> Level {
    let (grid, spawn, exit) = generate_grid(cfg.width, cfg.height, cfg.wall_density, rng);
    let entities = populate(&grid, spawn, exit, cfg, enemy_health, rng);

    info!(
        "generated {}x{} level: {} walls, {} enemies, {} treasures, {} traps",
        cfg.width,
        cfg.height,
        grid.interior().filter(|&p| grid.is_wall(p)).count(),
        entities.enemies().len(),
        entities.treasures.len(),
        entities.traps.len(),
    );

    Level { grid, spawn, exit, entities }
}

// ══════════════════════════════════════════════════════════════
// Placement helpers
// ══════════════════════════════════════════════════════════════

fn random_interior(grid: &Grid, rng: &mut impl Rng) -> Pos {
    let x = rng.gen_range(1..grid.width() as i32 - 1);
    let y = rng.gen_range(1..grid.height() as i32 - 1);
    Pos::new(x, y)
}

/// Floor, not spawn/exit, not taken by anything placed so far.
fn is_free(grid: &Grid, reg: &EntityRegistry, spawn: Pos, exit: Pos, p: Pos) -> bool {
    !grid.is_wall(p) && p != spawn && p != exit && !reg.is_occupied(p)
}

/// Rejection-sample a cell accepted by `accept`, falling back to a scan.
fn place(
    grid: &Grid,
    rng: &mut impl Rng,
    attempts: u32,
    kind: EntityKind,
    accept: impl Fn(Pos) -> bool,
) -> Option<Pos> {
    for _ in 0..attempts {
        let p = random_interior(grid, rng);
        if accept(p) {
            return Some(p);
        }
    }

    let scanned = grid.interior().find(|&p| accept(p));
    match scanned {
        Some(p) => warn!("{kind:?} placement fell back to scan after {attempts} tries: {p:?}"),
        None => warn!("no legal cell left for {kind:?}; skipping it"),
    }
    scanned
}
