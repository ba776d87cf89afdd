/// Entity registry: enemies, treasures and traps for one level.
///
/// Enemies are kept in a `Vec` for ordered iteration (turn order, rendering)
/// plus an occupancy index keyed by position. Enemies may share a cell, so
/// the index stores a count rather than a single id. Treasures and traps are
/// plain position sets.
///
/// All enemy moves go through `move_enemy()` so the index never drifts.

use std::collections::{HashMap, HashSet};

use super::entity::Enemy;
use super::grid::Pos;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityRegistry {
    enemies: Vec<Enemy>,
    enemy_index: HashMap<Pos, usize>,
    pub treasures: HashSet<Pos>,
    pub traps: HashSet<Pos>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Enemies ──

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn add_enemy(&mut self, enemy: Enemy) {
        *self.enemy_index.entry(enemy.pos).or_insert(0) += 1;
        self.enemies.push(enemy);
    }

    #[inline]
    pub fn has_enemy_at(&self, p: Pos) -> bool {
        self.enemy_index.contains_key(&p)
    }

    /// Relocate enemy `idx` (position in `enemies()`), keeping the index in sync.
    pub fn move_enemy(&mut self, idx: usize, to: Pos) {
        let from = self.enemies[idx].pos;
        if from == to {
            return;
        }
        self.unindex(from);
        *self.enemy_index.entry(to).or_insert(0) += 1;
        self.enemies[idx].pos = to;
    }

    /// Remove every enemy standing on `p`, returning them in turn order.
    pub fn remove_enemies_at(&mut self, p: Pos) -> Vec<Enemy> {
        if self.enemy_index.remove(&p).is_none() {
            return vec![];
        }
        let (removed, kept): (Vec<Enemy>, Vec<Enemy>) =
            std::mem::take(&mut self.enemies).into_iter().partition(|e| e.pos == p);
        self.enemies = kept;
        removed
    }

    fn unindex(&mut self, p: Pos) {
        if let Some(count) = self.enemy_index.get_mut(&p) {
            *count -= 1;
            if *count == 0 {
                self.enemy_index.remove(&p);
            }
        }
    }

    // ── Treasures / traps ──

    /// Remove a treasure at `p`. Returns true if one was there.
    pub fn take_treasure(&mut self, p: Pos) -> bool {
        self.treasures.remove(&p)
    }

    /// Consume a trap at `p`. Returns true if one was there.
    pub fn spring_trap(&mut self, p: Pos) -> bool {
        self.traps.remove(&p)
    }

    /// Is `p` taken by any entity in the registry?
    pub fn is_occupied(&self, p: Pos) -> bool {
        self.has_enemy_at(p) || self.treasures.contains(&p) || self.traps.contains(&p)
    }
}
