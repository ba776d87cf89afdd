/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
/// Everything mutable lives here: terrain, entities, the player, the message
/// log, the enemy timer and the RNG. Only `sim::step` mutates it during play.
/// The renderer borrows it read-only once per frame.
///
/// ## Levels
///
/// `grid`, `spawn`, `exit` and `entities` are replaced together by
/// `regenerate()`. Health, the treasure counter and the enemy clock belong to
/// the run and survive a regeneration; `restart()` throws the whole run away.

use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{CombatConfig, DungeonConfig, GameConfig};
use crate::domain::entity::Player;
use crate::domain::grid::{Grid, Pos};
use crate::domain::registry::EntityRegistry;
use super::level::{self, Level};

pub const WELCOME: &str = "Welcome to the dungeon!";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

/// Append-only message log. The HUD shows only the tail.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn push(&mut self, msg: impl Into<String>) {
        self.entries.push(msg.into());
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[String] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}

pub struct WorldState {
    // ── Level (replaced wholesale on regeneration) ──
    pub grid: Grid,
    pub spawn: Pos,
    pub exit: Pos,
    pub entities: EntityRegistry,

    // ── Run state ──
    pub player: Player,
    pub treasure_count: u32,
    pub messages: MessageLog,
    pub phase: Phase,
    /// Levels generated this run, starting at 1.
    pub depth: u32,

    // ── Clock ──
    /// Frames since the last enemy turn.
    pub enemy_timer: u32,

    // ── Rules ──
    pub dungeon: DungeonConfig,
    pub combat: CombatConfig,
    pub enemy_turn_interval: u32,

    rng: ChaCha8Rng,
}

// ── Construction ──

impl WorldState {
    /// Start a run. Uses `config.seed` when set, OS entropy otherwise.
    pub fn new(config: &GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: &GameConfig, seed: u64) -> Self {
        Self::build(
            config.dungeon.clone(),
            config.combat.clone(),
            config.timing.enemy_turn_interval,
            seed,
        )
    }

    fn build(dungeon: DungeonConfig, combat: CombatConfig, enemy_turn_interval: u32, seed: u64) -> Self {
        info!("starting run with seed {seed}");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let level = level::generate_level(&dungeon, combat.enemy_health, &mut rng);

        let mut messages = MessageLog::default();
        messages.push(WELCOME);

        WorldState {
            grid: level.grid,
            spawn: level.spawn,
            exit: level.exit,
            entities: level.entities,
            player: Player::new(level.spawn, combat.max_health),
            treasure_count: 0,
            messages,
            phase: Phase::Playing,
            depth: 1,
            enemy_timer: 0,
            dungeon,
            combat,
            enemy_turn_interval,
            rng,
        }
    }

    /// Throw the run away and start a new one. The new seed is drawn from
    /// this run's RNG, so a seeded session stays reproducible across restarts.
    pub fn restart(&mut self) {
        let seed: u64 = self.rng.gen();
        let dungeon = self.dungeon.clone();
        let combat = self.combat.clone();
        *self = Self::build(dungeon, combat, self.enemy_turn_interval, seed);
    }

    /// Replace the level in place. Player goes back to spawn; health, the
    /// treasure counter and the enemy clock carry over. Returns the new depth.
    pub fn regenerate(&mut self) -> u32 {
        let Level { grid, spawn, exit, entities } =
            level::generate_level(&self.dungeon, self.combat.enemy_health, &mut self.rng);
        self.grid = grid;
        self.spawn = spawn;
        self.exit = exit;
        self.entities = entities;
        self.player.pos = spawn;
        self.depth += 1;
        info!("descended to depth {}", self.depth);
        self.depth
    }
}

// ── Queries / helpers ──

impl WorldState {
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.messages.push(msg);
    }
}

/// Test fixtures: build a world from an ASCII diagram.
///
/// Legend: `'#'` wall, `'.'` floor, `'@'` player, `'E'` enemy,
/// `'$'` treasure, `'^'` trap, `'>'` exit.
#[cfg(test)]
impl WorldState {
    pub fn from_rows(rows: &[&str]) -> Self {
        use crate::domain::entity::Enemy;

        let config = GameConfig::default();
        let mut world = Self::with_seed(&config, 0);
        world.grid = Grid::from_rows(rows);
        world.entities = EntityRegistry::new();

        let mut enemy_id = 0;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let p = Pos::new(x as i32, y as i32);
                match ch {
                    '@' => {
                        world.spawn = p;
                        world.player.pos = p;
                    }
                    '>' => world.exit = p,
                    'E' => {
                        world.entities.add_enemy(Enemy::new(enemy_id, p, config.combat.enemy_health));
                        enemy_id += 1;
                    }
                    '$' => {
                        world.entities.treasures.insert(p);
                    }
                    '^' => {
                        world.entities.traps.insert(p);
                    }
                    _ => {}
                }
            }
        }
        world
    }
}
