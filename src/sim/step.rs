/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Player move (if an intent arrived this frame)
///        bounds → wall → commit → trap → treasure → enemy collision → exit
///   2. Enemy timer; every `enemy_turn_interval` frames an enemy turn:
///        adjacent enemies attack, the rest take one A* step toward the player
///
/// Every outcome is written to the message log and mirrored as a GameEvent.
/// Nothing here fails: blocked moves and unreachable targets are ordinary
/// outcomes.

use log::debug;

use crate::domain::ai;
use crate::domain::entity::MoveDir;
use crate::domain::rules::{self, MoveCheck};
use super::event::{BlockReason, GameEvent};
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry points
// ══════════════════════════════════════════════════════════════

/// One frame: resolve the optional movement intent, then the enemy clock.
pub fn step(world: &mut WorldState, movement: Option<MoveDir>) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if let Some(dir) = movement {
        resolve_player_move(world, dir, &mut events);
    }
    resolve_enemy_clock(world, &mut events);

    events
}

pub fn move_player(world: &mut WorldState, dir: MoveDir) -> Vec<GameEvent> {
    let mut events = Vec::new();
    resolve_player_move(world, dir, &mut events);
    events
}

pub fn update_enemies(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    resolve_enemy_clock(world, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_move(world: &mut WorldState, dir: MoveDir, events: &mut Vec<GameEvent>) {
    if world.is_game_over() { return; }

    let target = match rules::check_move(&world.grid, world.player.pos, dir) {
        MoveCheck::OutOfBounds => {
            world.log("You can't go that way!");
            events.push(GameEvent::MoveBlocked { reason: BlockReason::OutOfBounds });
            return;
        }
        MoveCheck::Wall => {
            world.log("You bump into a wall.");
            events.push(GameEvent::MoveBlocked { reason: BlockReason::Wall });
            return;
        }
        MoveCheck::Open(p) => p,
    };

    world.player.pos = target;

    // Independent checks: one move can spring a trap, grab treasure
    // and run into an enemy all at once.
    if world.entities.spring_trap(target) {
        let dmg = world.combat.trap_damage;
        world.log(format!("You triggered a trap! -{dmg} health"));
        events.push(GameEvent::TrapTriggered { at: target });
        damage_player(world, dmg, events);
    }

    if world.entities.take_treasure(target) {
        world.treasure_count += 1;
        world.log("You found treasure!");
        events.push(GameEvent::TreasureFound { at: target });
    }

    for enemy in world.entities.remove_enemies_at(target) {
        let dmg = world.combat.collision_damage;
        debug!("player walked into enemy {} ({} hp) at {:?}", enemy.id, enemy.health, target);
        world.log(format!("You were attacked by an enemy! -{dmg} health"));
        events.push(GameEvent::EnemyCollision { id: enemy.id, at: target });
        damage_player(world, dmg, events);
    }

    // A dead player does not descend.
    if target == world.exit && !world.is_game_over() {
        world.log("Congratulations! You found the exit!");
        events.push(GameEvent::ExitReached);
        let depth = world.regenerate();
        events.push(GameEvent::LevelGenerated { depth });
    }
}

/// Apply damage; on the fatal blow log the death and end the run.
fn damage_player(world: &mut WorldState, amount: i32, events: &mut Vec<GameEvent>) {
    if world.player.take_damage(amount) {
        world.log("You have died!");
        world.phase = Phase::GameOver;
        events.push(GameEvent::PlayerDied);
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_clock(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.is_game_over() { return; }

    world.enemy_timer += 1;
    if world.enemy_timer < world.enemy_turn_interval { return; }
    world.enemy_timer = 0;

    resolve_enemy_turn(world, events);
}

/// Each enemy either attacks (adjacent) or steps along its path, never both.
/// Paths ignore other enemies, so enemies may end up sharing a cell.
fn resolve_enemy_turn(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let target = world.player.pos;

    for i in 0..world.entities.enemies().len() {
        if world.is_game_over() { break; }

        let (id, pos) = {
            let e = &world.entities.enemies()[i];
            (e.id, e.pos)
        };

        if rules::in_attack_range(pos, target) {
            let dmg = world.combat.enemy_attack_damage;
            debug!("enemy {id} attacks from {pos:?}");
            world.log(format!("An enemy attacks you! -{dmg} health"));
            events.push(GameEvent::EnemyAttacked { id });
            damage_player(world, dmg, events);
        } else if let Some(next) = ai::next_step(&world.grid, pos, target) {
            world.entities.move_enemy(i, next);
            events.push(GameEvent::EnemyMoved { id, to: next });
        } else {
            debug!("enemy {id} at {pos:?} has no route to {target:?}");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Enemy;
    use crate::domain::grid::Pos;
    use crate::domain::registry::EntityRegistry;
    use crate::domain::tile::Tile;

    fn tick_n(world: &mut WorldState, n: usize) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..n {
            all.extend(update_enemies(world));
        }
        all
    }

    // ── Move rejection ──

    #[test]
    fn out_of_bounds_move_is_rejected() {
        // No border row: the player stands on the grid edge
        let mut w = WorldState::from_rows(&[
            "@..",
            "..>",
        ]);
        let before = w.messages.len();
        let events = move_player(&mut w, MoveDir::Left);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert_eq!(w.messages.len(), before + 1);
        assert_eq!(w.messages.last(), Some("You can't go that way!"));
        assert_eq!(events, vec![GameEvent::MoveBlocked { reason: BlockReason::OutOfBounds }]);

        move_player(&mut w, MoveDir::Up);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert_eq!(w.messages.len(), before + 2);
    }

    #[test]
    fn wall_bump_is_rejected() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@#>#",
            "#####",
        ]);
        let before = w.messages.len();
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.pos, Pos::new(1, 1));
        assert_eq!(w.player.health, 100);
        assert_eq!(w.messages.len(), before + 1);
        assert_eq!(w.messages.last(), Some("You bump into a wall."));
    }

    #[test]
    fn plain_move_commits_silently() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@.>#",
            "#####",
        ]);
        let before = w.messages.len();
        let events = move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.pos, Pos::new(2, 1));
        assert_eq!(w.messages.len(), before);
        assert!(events.is_empty());
    }

    // ── Traps / treasure / collision ──

    #[test]
    fn trap_hurts_once_and_is_consumed() {
        let mut w = WorldState::from_rows(&[
            "######",
            "#@^^>#",
            "######",
        ]);
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 90);
        assert!(!w.entities.traps.contains(&Pos::new(2, 1)));
        assert!(w.entities.traps.contains(&Pos::new(3, 1)));
        assert_eq!(w.messages.last(), Some("You triggered a trap! -10 health"));

        // Step off and back on: trap is gone
        move_player(&mut w, MoveDir::Left);
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 90);
    }

    #[test]
    fn trap_damage_clamps_at_zero_and_ends_run() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@^>#",
            "#####",
        ]);
        w.player.health = 5;
        let events = move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 0);
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(w.messages.last(), Some("You have died!"));
        assert!(events.contains(&GameEvent::PlayerDied));
    }

    #[test]
    fn treasure_is_collected() {
        let mut w = WorldState::from_rows(&[
            "######",
            "#@$$>#",
            "######",
        ]);
        move_player(&mut w, MoveDir::Right);
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.treasure_count, 2);
        assert!(w.entities.treasures.is_empty());
        assert_eq!(w.player.health, 100);
        assert_eq!(w.messages.last(), Some("You found treasure!"));
    }

    #[test]
    fn walking_into_enemy_removes_it_and_hurts() {
        let mut w = WorldState::from_rows(&[
            "#######",
            "#@E.E>#",
            "#######",
        ]);
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.pos, Pos::new(2, 1));
        assert_eq!(w.player.health, 80);
        assert_eq!(w.entities.enemies().len(), 1);
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(4, 1));
        assert_eq!(w.messages.last(), Some("You were attacked by an enemy! -20 health"));
    }

    #[test]
    fn stacked_enemies_each_hit() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@.>#",
            "#####",
        ]);
        w.entities.add_enemy(Enemy::new(0, Pos::new(2, 1), 50));
        w.entities.add_enemy(Enemy::new(1, Pos::new(2, 1), 50));
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 60);
        assert!(w.entities.enemies().is_empty());
    }

    #[test]
    fn effects_on_one_cell_stack() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@.>#",
            "#####",
        ]);
        let cell = Pos::new(2, 1);
        w.entities.traps.insert(cell);
        w.entities.treasures.insert(cell);
        w.entities.add_enemy(Enemy::new(0, cell, 50));

        let events = move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 70);
        assert_eq!(w.treasure_count, 1);
        assert!(!w.entities.is_occupied(cell));
        assert_eq!(events, vec![
            GameEvent::TrapTriggered { at: cell },
            GameEvent::TreasureFound { at: cell },
            GameEvent::EnemyCollision { id: 0, at: cell },
        ]);
    }

    #[test]
    fn death_blocks_further_moves() {
        let mut w = WorldState::from_rows(&[
            "######",
            "#@E.>#",
            "######",
        ]);
        w.player.health = 20;
        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 0);
        assert!(w.is_game_over());

        let log_len = w.messages.len();
        let events = move_player(&mut w, MoveDir::Right);
        assert!(events.is_empty());
        assert_eq!(w.player.pos, Pos::new(2, 1));
        assert_eq!(w.messages.len(), log_len);
    }

    #[test]
    fn death_message_logged_once() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@.>#",
            "#####",
        ]);
        let cell = Pos::new(2, 1);
        w.player.health = 5;
        w.entities.traps.insert(cell);
        w.entities.add_enemy(Enemy::new(0, cell, 50));
        move_player(&mut w, MoveDir::Right);
        let deaths = w.messages.recent(10).iter().filter(|m| *m == "You have died!").count();
        assert_eq!(deaths, 1);
        assert_eq!(w.player.health, 0);
    }

    // ── Exit / regeneration ──

    #[test]
    fn exit_regenerates_and_keeps_health_and_treasure() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@>.#",
            "#####",
        ]);
        w.player.health = 40;
        w.treasure_count = 3;

        let events = move_player(&mut w, MoveDir::Right);
        assert_eq!(w.player.health, 40);
        assert_eq!(w.treasure_count, 3);
        assert_eq!(w.player.pos, Pos::new(1, 1));
        assert_eq!(w.depth, 2);
        assert_eq!(w.grid.width(), 20);
        assert_eq!(w.grid.height(), 15);
        assert_eq!(w.exit, Pos::new(18, 13));
        assert_eq!(w.messages.last(), Some("Congratulations! You found the exit!"));
        assert_eq!(events, vec![GameEvent::ExitReached, GameEvent::LevelGenerated { depth: 2 }]);
    }

    #[test]
    fn enemy_clock_carries_over_to_the_next_level() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@>.#",
            "#####",
        ]);
        tick_n(&mut w, 10);
        assert_eq!(w.enemy_timer, 10);

        move_player(&mut w, MoveDir::Right);
        assert_eq!(w.depth, 2);
        assert_eq!(w.enemy_timer, 10);

        // Five more frames complete the interval on the new level
        w.entities = EntityRegistry::new();
        w.grid.set(Pos::new(2, 1), Tile::Floor);
        w.grid.set(Pos::new(3, 1), Tile::Floor);
        w.entities.add_enemy(Enemy::new(0, Pos::new(3, 1), 50));
        tick_n(&mut w, 4);
        assert_eq!(w.enemy_timer, 14);
        tick_n(&mut w, 1);
        assert_eq!(w.enemy_timer, 0);
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(2, 1));
    }

    #[test]
    fn dying_on_the_exit_does_not_descend() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@>.#",
            "#####",
        ]);
        w.player.health = 10;
        w.entities.traps.insert(Pos::new(2, 1));

        move_player(&mut w, MoveDir::Right);
        assert!(w.is_game_over());
        assert_eq!(w.depth, 1);
        assert_eq!(w.player.pos, Pos::new(2, 1));
    }

    // ── Enemy clock ──

    #[test]
    fn enemies_wait_fourteen_frames_then_move() {
        let mut w = WorldState::from_rows(&[
            "#########",
            "#@....E>#",
            "#########",
        ]);
        let events = tick_n(&mut w, 14);
        assert!(events.is_empty());
        assert_eq!(w.enemy_timer, 14);
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(6, 1));

        let events = update_enemies(&mut w);
        assert_eq!(w.enemy_timer, 0);
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(5, 1));
        assert_eq!(events, vec![GameEvent::EnemyMoved { id: 0, to: Pos::new(5, 1) }]);
    }

    #[test]
    fn adjacent_enemy_attacks_on_fifteenth_frame_without_moving() {
        let mut w = WorldState::from_rows(&[
            "######",
            "#@E.>#",
            "######",
        ]);
        tick_n(&mut w, 14);
        assert_eq!(w.player.health, 100);

        let events = update_enemies(&mut w);
        assert_eq!(w.player.health, 90);
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(2, 1));
        assert_eq!(w.messages.last(), Some("An enemy attacks you! -10 health"));
        assert_eq!(events, vec![GameEvent::EnemyAttacked { id: 0 }]);

        // Next attack needs another full interval
        tick_n(&mut w, 14);
        assert_eq!(w.player.health, 90);
        update_enemies(&mut w);
        assert_eq!(w.player.health, 80);
    }

    #[test]
    fn diagonal_enemy_does_not_attack() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#@..#",
            "#.E>#",
            "#####",
        ]);
        tick_n(&mut w, 15);
        assert_eq!(w.player.health, 100);
        // It stepped instead, now orthogonally adjacent
        assert_eq!(w.entities.enemies()[0].pos.manhattan(w.player.pos), 1);
    }

    #[test]
    fn enemy_cut_off_by_walls_holds_position() {
        let mut w = WorldState::from_rows(&[
            "#######",
            "#@#..E#",
            "###..>#",
            "#######",
        ]);
        let events = tick_n(&mut w, 15);
        assert!(events.is_empty());
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(5, 1));
    }

    #[test]
    fn enemies_may_share_a_cell() {
        let mut w = WorldState::from_rows(&[
            "#########",
            "#@.....>#",
            "#########",
        ]);
        w.entities.add_enemy(Enemy::new(0, Pos::new(5, 1), 50));
        w.entities.add_enemy(Enemy::new(1, Pos::new(6, 1), 50));
        tick_n(&mut w, 15);
        // Enemy 0 steps to (4,1); enemy 1 paths through where 0 was
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(4, 1));
        assert_eq!(w.entities.enemies()[1].pos, Pos::new(5, 1));
        tick_n(&mut w, 15);
        tick_n(&mut w, 15);
        // Both reach (2,1) next to the player eventually; 0 arrives first
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(2, 1));
        assert_eq!(w.entities.enemies()[1].pos, Pos::new(3, 1));
        tick_n(&mut w, 15);
        // 0 attacks; 1 moves onto 0's cell
        assert_eq!(w.entities.enemies()[1].pos, Pos::new(2, 1));
        assert_eq!(w.player.health, 90);
    }

    #[test]
    fn remaining_enemies_stand_down_after_the_kill() {
        let mut w = WorldState::from_rows(&[
            "#####",
            "#.E.#",
            "#E@E#",
            "#..>#",
            "#####",
        ]);
        w.player.health = 10;
        tick_n(&mut w, 15);
        assert_eq!(w.player.health, 0);
        assert!(w.is_game_over());
        let attacks = w.messages.recent(10).iter().filter(|m| m.starts_with("An enemy attacks")).count();
        assert_eq!(attacks, 1);
    }

    #[test]
    fn game_over_freezes_enemy_clock() {
        let mut w = WorldState::from_rows(&[
            "#######",
            "#@..E>#",
            "#######",
        ]);
        w.phase = Phase::GameOver;
        tick_n(&mut w, 30);
        assert_eq!(w.enemy_timer, 0);
        assert_eq!(w.entities.enemies()[0].pos, Pos::new(4, 1));
    }

    // ── Frame step ──

    #[test]
    fn step_moves_player_then_runs_clock() {
        let mut w = WorldState::from_rows(&[
            "######",
            "#@..>#",
            "######",
        ]);
        step(&mut w, Some(MoveDir::Right));
        step(&mut w, None);
        assert_eq!(w.player.pos, Pos::new(2, 1));
        assert_eq!(w.enemy_timer, 2);
    }

    #[test]
    fn enemy_chasing_into_sealed_cell_stays_put() {
        let mut w = WorldState::with_seed(&GameConfig::default(), 7);
        w.entities = EntityRegistry::new();

        for _ in 0..3 {
            step(&mut w, Some(MoveDir::Right));
            step(&mut w, Some(MoveDir::Down));
        }

        // Seal the player in
        let p = w.player.pos;
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            w.grid.set(p.offset(dx, dy), Tile::Wall);
        }

        let lair = w.exit;
        w.grid.set(lair, Tile::Floor);
        w.entities.add_enemy(Enemy::new(0, lair, 50));
        assert!(ai::find_path(&w.grid, lair, p).is_empty());

        let health = w.player.health;
        for _ in 0..15 {
            step(&mut w, None);
        }
        assert_eq!(w.entities.enemies()[0].pos, lair);
        assert_eq!(w.player.health, health);
    }
}
