/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout (rows):
///   0        HUD: title, depth, health bar, treasure count
///   2..      map viewport (camera follows the player on large grids)
///   +1..+3   last three log messages
///   +5       key help
///
/// The renderer only ever borrows the world; it owns no game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Pos;
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 8],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // this char occupies 2 terminal columns
    cont: bool, // right half of the previous wide char (not printed)
}

impl Cell {
    /// Explicit dark background for every cell, so the terminal's own
    /// default never shows through between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel used to invalidate the back buffer: differs from any real cell.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    /// Overwriting either half of a wide char blanks the other half.
    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = y * self.width + x;
        let old = self.cells[i];
        if old.cont && !cell.cont && x > 0 {
            self.cells[i - 1] = Cell::BLANK;
        }
        if old.wide && x + 1 < self.width {
            self.cells[i + 1] = Cell::BLANK;
        }
        self.cells[i] = cell;
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Put a wide glyph at (x, y) with its continuation at (x + 1, y).
    fn put_wide(&mut self, x: usize, y: usize, c: char, bg: Color) {
        if x + 1 >= self.width {
            return;
        }
        self.set(x, y, Cell::from_char_wide(c, bg));
        self.set(x + 1, y, Cell::WIDE_CONT);
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y)).filter(|c| !c.cont).map(|c| c.as_str().to_string()).collect()
    }
}

// ── Layout ──

/// Each game cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MESSAGE_LINES: usize = 3;
/// HUD + gap + gap + messages + gap + help.
const RESERVED_ROWS: usize = MAP_ROW + 1 + MESSAGE_LINES + 1 + 1;

const TITLE: &str = "AI Dungeon Master";
const HELP: &str = " Arrows/WASD: Move   R: Restart   P/F1: Pause   Q/Esc: Quit";
const HEALTH_BAR_LEN: usize = 10;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const WALL_FG: Color = Color::Rgb { r: 120, g: 120, b: 120 };
const WALL_BG: Color = Color::Rgb { r: 70, g: 70, b: 70 };
const FLOOR_FG: Color = Color::Rgb { r: 70, g: 70, b: 90 };
const OVERLAY_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const HIGHLIGHT: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const DANGER: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const HEALTH_OK: Color = Color::Rgb { r: 80, g: 255, b: 80 };

/// Visible window onto the grid, in grid cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Camera {
    x: i32,
    y: i32,
    view_w: usize,
    view_h: usize,
}

impl Camera {
    /// Center on `focus`, clamped so the view never scrolls past the grid edge.
    fn follow(focus: Pos, grid_w: usize, grid_h: usize, max_w: usize, max_h: usize) -> Self {
        let view_w = max_w.min(grid_w).max(1);
        let view_h = max_h.min(grid_h).max(1);
        Camera {
            x: follow_axis(focus.x, grid_w, view_w),
            y: follow_axis(focus.y, grid_h, view_h),
            view_w,
            view_h,
        }
    }
}

fn follow_axis(focus: i32, world_len: usize, view_len: usize) -> i32 {
    if world_len <= view_len {
        return 0;
    }
    let max_origin = (world_len - view_len) as i32;
    (focus - view_len as i32 / 2).clamp(0, max_origin)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, paused: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        compose_frame(&mut self.front, world, paused);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose_frame(buf: &mut FrameBuffer, w: &WorldState, paused: bool) {
    buf.clear();

    let cam = Camera::follow(
        w.player.pos,
        w.grid.width(),
        w.grid.height(),
        buf.width / CELL_W,
        buf.height.saturating_sub(RESERVED_ROWS),
    );

    compose_hud(buf, w);
    compose_map(buf, w, &cam);
    compose_messages(buf, w, MAP_ROW + cam.view_h + 1);
    buf.put_str(0, MAP_ROW + cam.view_h + 2 + MESSAGE_LINES, HELP, Color::DarkGrey, Color::Reset);

    if w.is_game_over() {
        compose_game_over(buf, &cam);
    } else if paused {
        compose_pause_overlay(buf, &cam);
    }
}

fn health_bar(health: i32, max: i32) -> String {
    let filled = (health.max(0) as usize * HEALTH_BAR_LEN) / max.max(1) as usize;
    let filled = filled.min(HEALTH_BAR_LEN);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(HEALTH_BAR_LEN - filled))
}

fn compose_hud(buf: &mut FrameBuffer, w: &WorldState) {
    buf.fill_row(HUD_ROW, HUD_BG);

    let title = format!(" {TITLE}  Depth {:<3}", w.depth);
    buf.put_str(0, HUD_ROW, &title, HIGHLIGHT, HUD_BG);

    let max = w.combat.max_health;
    let health_fg = if w.player.health * 4 <= max { DANGER } else { HEALTH_OK };
    let health = format!(
        "Health: {}/{} {}",
        w.player.health,
        max,
        health_bar(w.player.health, max)
    );
    let hx = title.chars().count() + 1;
    buf.put_str(hx, HUD_ROW, &health, health_fg, HUD_BG);

    let treasure = format!("Treasures: {}", w.treasure_count);
    buf.put_str(hx + health.chars().count() + 2, HUD_ROW, &treasure, Color::White, HUD_BG);
}

fn compose_map(buf: &mut FrameBuffer, w: &WorldState, cam: &Camera) {
    for vy in 0..cam.view_h {
        let row = MAP_ROW + vy;
        for vx in 0..cam.view_w {
            let p = Pos::new(cam.x + vx as i32, cam.y + vy as i32);
            compose_cell(buf, w, p, vx * CELL_W, row);
        }
    }
}

/// One grid cell. Priority: player, enemy, exit, trap, treasure, terrain.
fn compose_cell(buf: &mut FrameBuffer, w: &WorldState, p: Pos, col: usize, row: usize) {
    let glyph = if w.player.pos == p {
        Some('🧙')
    } else if w.entities.has_enemy_at(p) {
        Some('👹')
    } else if w.exit == p {
        Some('🚪')
    } else if w.entities.traps.contains(&p) {
        Some('🔥')
    } else if w.entities.treasures.contains(&p) {
        Some('💰')
    } else {
        None
    };

    if let Some(c) = glyph {
        buf.put_wide(col, row, c, Color::Reset);
        return;
    }

    let (c0, c1, fg, bg) = if w.grid.is_wall(p) {
        ('▓', '▓', WALL_FG, WALL_BG)
    } else {
        ('·', ' ', FLOOR_FG, Color::Reset)
    };
    buf.set(col, row, Cell::from_char(c0, fg, bg));
    buf.set(col + 1, row, Cell::from_char(c1, fg, bg));
}

fn compose_messages(buf: &mut FrameBuffer, w: &WorldState, top: usize) {
    for (i, msg) in w.messages.recent(MESSAGE_LINES).iter().enumerate() {
        let line = format!(" › {msg}");
        buf.put_str(0, top + i, &line, Color::White, Color::Reset);
    }
}

/// Dark box centered on the map viewport, `lines` centered inside it.
/// On maps smaller than the box it spills over, clipped only by the screen.
fn compose_overlay(buf: &mut FrameBuffer, cam: &Camera, lines: &[(&str, Color)]) {
    let view_cols = cam.view_w * CELL_W;
    let box_w = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0) + 8;
    let box_w = box_w.min(buf.width);
    let box_h = (lines.len() + 2).min(buf.height.saturating_sub(MAP_ROW));
    let box_x = view_cols.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + cam.view_h.saturating_sub(box_h) / 2;

    for y in box_y..box_y + box_h {
        for x in box_x..box_x + box_w {
            buf.set(x, y, Cell::from_char(' ', Color::Reset, OVERLAY_BG));
        }
    }
    for (i, (text, fg)) in lines.iter().enumerate() {
        let x = box_x + box_w.saturating_sub(text.chars().count()) / 2;
        buf.put_str(x, box_y + 1 + i, text, *fg, OVERLAY_BG);
    }
}

fn compose_game_over(buf: &mut FrameBuffer, cam: &Camera) {
    compose_overlay(buf, cam, &[
        ("GAME OVER", DANGER),
        ("", Color::White),
        ("Press R to restart", Color::White),
    ]);
}

fn compose_pause_overlay(buf: &mut FrameBuffer, cam: &Camera) {
    compose_overlay(buf, cam, &[
        ("PAUSED", HIGHLIGHT),
        ("", Color::White),
        ("P / F1   Resume", Color::White),
        ("R        Restart", Color::White),
        ("Q / Esc  Quit", Color::White),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::Phase;

    fn frame(w: &WorldState, paused: bool, cols: usize, rows: usize) -> FrameBuffer {
        let mut buf = FrameBuffer::new(cols, rows);
        compose_frame(&mut buf, w, paused);
        buf
    }

    fn contains_text(buf: &FrameBuffer, needle: &str) -> bool {
        (0..buf.height).any(|y| buf.row_text(y).contains(needle))
    }

    fn small_world() -> WorldState {
        WorldState::from_rows(&[
            "#######",
            "#@E^$>#",
            "#######",
        ])
    }

    #[test]
    fn hud_shows_health_and_treasure() {
        let mut w = small_world();
        w.player.health = 40;
        w.treasure_count = 3;
        let buf = frame(&w, false, 100, 20);
        let hud = buf.row_text(HUD_ROW);
        assert!(hud.contains(TITLE));
        assert!(hud.contains("Health: 40/100"));
        assert!(hud.contains("Treasures: 3"));
        assert!(hud.contains("Depth 1"));
    }

    #[test]
    fn map_glyphs_follow_priority() {
        let w = small_world();
        let buf = frame(&w, false, 100, 20);
        let row = MAP_ROW + 1;
        assert_eq!(buf.get(2, row).as_str(), "🧙");
        assert_eq!(buf.get(4, row).as_str(), "👹");
        assert_eq!(buf.get(6, row).as_str(), "🔥");
        assert_eq!(buf.get(8, row).as_str(), "💰");
        assert_eq!(buf.get(10, row).as_str(), "🚪");
        assert_eq!(buf.get(0, row).as_str(), "▓");
    }

    #[test]
    fn player_drawn_over_enemy_on_same_cell() {
        let mut w = small_world();
        w.entities.add_enemy(crate::domain::entity::Enemy::new(9, Pos::new(1, 1), 50));
        let buf = frame(&w, false, 100, 20);
        assert_eq!(buf.get(2, MAP_ROW + 1).as_str(), "🧙");
    }

    #[test]
    fn only_last_three_messages_shown() {
        let mut w = small_world();
        for i in 0..5 {
            w.log(format!("note {i}"));
        }
        let buf = frame(&w, false, 100, 20);
        assert!(!contains_text(&buf, "note 1"));
        assert!(contains_text(&buf, "note 2"));
        assert!(contains_text(&buf, "note 4"));
    }

    #[test]
    fn overlays() {
        let mut w = small_world();
        assert!(contains_text(&frame(&w, true, 100, 20), "PAUSED"));
        assert!(!contains_text(&frame(&w, false, 100, 20), "PAUSED"));

        w.phase = Phase::GameOver;
        let buf = frame(&w, false, 100, 20);
        assert!(contains_text(&buf, "GAME OVER"));
        assert!(contains_text(&buf, "Press R to restart"));
    }

    #[test]
    fn camera_keeps_player_in_view() {
        assert_eq!(follow_axis(1, 20, 40), 0);
        assert_eq!(follow_axis(1, 60, 20), 0);
        assert_eq!(follow_axis(30, 60, 20), 20);
        assert_eq!(follow_axis(58, 60, 20), 40);

        let cam = Camera::follow(Pos::new(58, 40), 60, 45, 30, 10);
        assert_eq!((cam.view_w, cam.view_h), (30, 10));
        assert!((cam.x..cam.x + 30).contains(&58));
        assert!((cam.y..cam.y + 10).contains(&40));
    }

    #[test]
    fn overwriting_half_a_wide_glyph_blanks_the_other_half() {
        let mut buf = FrameBuffer::new(6, 1);
        buf.put_wide(2, 0, '💰', Color::Reset);
        buf.put_str(3, 0, "x", Color::White, Color::Reset);
        assert_eq!(buf.get(2, 0), Cell::BLANK);
        assert_eq!(buf.get(3, 0).as_str(), "x");
    }

    #[test]
    fn health_bar_scales_and_clamps() {
        assert_eq!(health_bar(100, 100), format!("[{}]", "█".repeat(10)));
        assert_eq!(health_bar(0, 100), format!("[{}]", "░".repeat(10)));
        assert_eq!(health_bar(45, 100), format!("[{}{}]", "█".repeat(4), "░".repeat(6)));
    }
}
