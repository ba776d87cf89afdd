/// Enemy AI: A* shortest path over terrain.
///
/// Terrain only: other enemies and the player are not obstacles. The caller
/// decides what to do with the path (enemies take one step along it per turn).
///
///   - 4-directional adjacency, uniform step cost 1
///   - Manhattan heuristic (admissible and consistent on this grid)
///   - frontier ties broken by insertion order, so results are deterministic

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::grid::{Grid, Pos};

const DIRS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Shortest path from `start` to `goal`, both inclusive.
/// Empty when the goal cannot be reached; `[start]` when `start == goal`.
pub fn find_path(grid: &Grid, start: Pos, goal: Pos) -> Vec<Pos> {
    if start == goal {
        return vec![start];
    }
    if !grid.in_bounds(start) || grid.is_wall(goal) {
        return vec![];
    }

    let n = grid.cell_count();
    let mut g_score = vec![u32::MAX; n];
    let mut came_from: Vec<Option<Pos>> = vec![None; n];
    let mut closed = vec![false; n];

    // Reverse((f, seq, g, pos)): min-heap on f, then insertion order.
    let mut frontier = BinaryHeap::with_capacity(64);
    let mut seq: u64 = 0;

    g_score[grid.index(start)] = 0;
    frontier.push(Reverse((heuristic(start, goal), seq, 0u32, start)));

    while let Some(Reverse((_, _, g, current))) = frontier.pop() {
        let ci = grid.index(current);
        // Stale entry: a cheaper route to `current` was queued later.
        if closed[ci] || g > g_score[ci] {
            continue;
        }
        if current == goal {
            return reconstruct(grid, &came_from, start, goal);
        }
        closed[ci] = true;

        for &(dx, dy) in &DIRS {
            let next = current.offset(dx, dy);
            if !grid.tile(next).is_passable() {
                continue;
            }
            let ni = grid.index(next);
            let tentative = g + 1;
            if tentative >= g_score[ni] {
                continue;
            }
            // Strictly better: record it, and reopen if it was closed.
            closed[ni] = false;
            g_score[ni] = tentative;
            came_from[ni] = Some(current);
            seq += 1;
            frontier.push(Reverse((tentative + heuristic(next, goal), seq, tentative, next)));
        }
    }

    vec![]
}

fn heuristic(a: Pos, b: Pos) -> u32 {
    a.manhattan(b) as u32
}

fn reconstruct(grid: &Grid, came_from: &[Option<Pos>], start: Pos, goal: Pos) -> Vec<Pos> {
    let mut path = vec![goal];
    let mut node = goal;
    while node != start {
        match came_from[grid.index(node)] {
            Some(prev) => {
                path.push(prev);
                node = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Where an enemy at `from` should step to chase `target`, if anywhere.
/// `None` = no route, or already there.
pub fn next_step(grid: &Grid, from: Pos, target: Pos) -> Option<Pos> {
    let path = find_path(grid, from, target);
    match path.get(1) {
        Some(&step) if !grid.is_wall(step) => Some(step),
        _ => None,
    }
}
