/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` (one Cell per terminal column)
///   2. Compare each cell with `back` (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The active region is drawn as characters, two terminal columns per grid
/// cell. Entities are drawn at the cell holding their body centre.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::archetype::Kind;
use crate::domain::entity::Entity;
use crate::domain::grid::{COLUMN_COUNT, ROW_COUNT};
use crate::domain::tile::TileKind;
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, World};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: if bg == Color::Reset { Self::BASE_BG } else { bg } }
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

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Renderer ──

/// Terminal columns per grid cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MSG_ROW: usize = MAP_ROW + ROW_COUNT + 1;
const HELP_ROW: usize = MSG_ROW + 2;

const HUD_BG: Color = Color::Rgb { r: 40, g: 30, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    message: String,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            message: String::new(),
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
        self.sync_size()?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Keep a one-line summary of the most notable event of the frame.
    pub fn note(&mut self, events: &[GameEvent]) {
        for ev in events {
            let msg = match ev {
                GameEvent::ItemCollected { kind } => format!("Picked up {kind:?}"),
                GameEvent::PlayerDamaged { amount, health } => format!("Ouch! -{amount} (health {health})"),
                GameEvent::DoorOpened { .. } => "The door opens".to_string(),
                GameEvent::SpringLaunched => "Boing!".to_string(),
                GameEvent::PlayerRespawned => String::new(),
                _ => continue,
            };
            self.message = msg;
        }
    }

    pub fn render(&mut self, world: &World) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.sync_size()?;
        }

        self.front.clear();
        self.compose_hud(world);
        self.compose_region(world);
        self.compose_footer(world);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // force a full repaint
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &World) {
        let p = &w.player;
        let hud = format!(
            " {}  [{},{}]  Lives:{}  Health:{:<3}  Coins:{}  Keys:{} ",
            w.name, w.active.0, w.active.1, p.lives.max(0), p.health, p.coins, p.keys,
        );
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_region(&mut self, w: &World) {
        let grid = w.grid();
        for r in 0..ROW_COUNT {
            for c in 0..COLUMN_COUNT {
                let kind = grid.get(r as i32, c as i32).map_or(TileKind::Empty, |t| t.kind);
                let (ch, fg, bg) = tile_glyph(kind);
                self.put_cell(r as i32, c as i32, ch, fg, bg);
            }
        }
        for e in w.region().objects.live() {
            if e.anim.alpha > 0 {
                let (ch, fg) = entity_glyph(e);
                self.put_entity(e, ch, fg);
            }
        }
        let player = &w.player.entity;
        if player.anim.alpha > 0 {
            let fg = if w.phase == Phase::Playing { Color::Rgb { r: 255, g: 255, b: 120 } } else { Color::Red };
            self.put_entity(player, if player.anim.flip { '<' } else { '>' }, fg);
        }
    }

    fn compose_footer(&mut self, w: &World) {
        let (msg, fg) = match w.phase {
            Phase::Killed => ("You died. SPACE to try again".to_string(), Color::Red),
            Phase::GameOver => ("GAME OVER. SPACE to quit".to_string(), Color::Red),
            Phase::LevelComplete => ("You found the statue! SPACE to quit".to_string(), Color::Green),
            _ => (self.message.clone(), Color::Rgb { r: 220, g: 200, b: 90 }),
        };
        self.front.put_str(1, MSG_ROW, &msg, fg, Color::Reset);
        let help = " ←→/AD: Walk   ↑↓/WS: Climb, jump   SPACE: Open door   Q/ESC: Quit";
        self.front.put_str(0, HELP_ROW, help, Color::DarkGrey, Color::Reset);
    }

    fn put_cell(&mut self, r: i32, c: i32, ch: char, fg: Color, bg: Color) {
        if r < 0 || c < 0 {
            return;
        }
        let (row, col) = (MAP_ROW + r as usize, c as usize * CELL_W);
        self.front.set(col, row, Cell::new(ch, fg, bg));
        self.front.set(col + 1, row, Cell::new(ch, fg, bg));
    }

    /// Draw over the tile at the entity's cell, keeping the tile background.
    fn put_entity(&mut self, e: &Entity, ch: char, fg: Color) {
        let (r, c) = e.cell();
        if r < 0 || c < 0 || r as usize >= ROW_COUNT || c as usize >= COLUMN_COUNT {
            return;
        }
        let (row, col) = (MAP_ROW + r as usize, c as usize * CELL_W);
        let bg = self.front.get(col, row).bg;
        self.front.set(col, row, Cell::new(ch, fg, bg));
        self.front.set(col + 1, row, Cell::new(' ', fg, bg));
    }
}

fn tile_glyph(kind: TileKind) -> (char, Color, Color) {
    let rock = Color::Rgb { r: 90, g: 80, b: 100 };
    let earth = Color::Rgb { r: 110, g: 70, b: 40 };
    match kind {
        TileKind::Empty => (' ', Color::White, Color::Reset),
        TileKind::Wall | TileKind::FakeWall => ('▒', Color::Grey, rock),
        TileKind::WallTop => ('▀', Color::White, rock),
        TileKind::Ground | TileKind::FakeGround => ('░', Color::Rgb { r: 150, g: 100, b: 60 }, earth),
        TileKind::GroundTop => ('▀', Color::Green, earth),
        TileKind::Stair => ('▔', Color::Grey, Color::Reset),
        TileKind::Water => ('~', Color::Cyan, Color::Rgb { r: 20, g: 40, b: 110 }),
        TileKind::Grass => ('"', Color::Green, Color::Reset),
        TileKind::Mushroom => ('♠', Color::Magenta, Color::Reset),
        TileKind::Tree => ('♣', Color::DarkGreen, Color::Reset),
        TileKind::Rock => ('●', Color::Grey, Color::Reset),
        TileKind::Spike => ('▲', Color::White, Color::Reset),
        TileKind::Pillar => ('║', Color::Grey, Color::Reset),
        TileKind::Door => ('▌', Color::Yellow, earth),
        TileKind::Ladder => ('╫', Color::Rgb { r: 200, g: 150, b: 90 }, Color::Reset),
        TileKind::ArrowLeft => ('◄', Color::Grey, rock),
        TileKind::ArrowRight => ('►', Color::Grey, rock),
    }
}

fn entity_glyph(e: &Entity) -> (char, Color) {
    match e.kind() {
        Kind::Player => ('>', Color::Yellow),
        Kind::Scorpion => ('s', Color::Rgb { r: 230, g: 120, b: 40 }),
        Kind::Rat => ('r', Color::Grey),
        Kind::Blob => ('q', Color::Green),
        Kind::Spider => ('p', Color::DarkMagenta),
        Kind::Ghost => ('g', Color::White),
        Kind::Fireball => ('*', Color::Red),
        Kind::Bat => ('v', Color::DarkGrey),
        Kind::Skeleton => ('e', Color::White),
        Kind::IceShot => ('-', Color::Cyan),
        Kind::FireShot => ('·', Color::Red),
        Kind::DropSpawner => (' ', Color::Blue),
        Kind::Drop => ('\'', Color::Blue),
        Kind::Platform => ('=', Color::Rgb { r: 200, g: 150, b: 90 }),
        Kind::Cloud => ('☁', Color::White),
        Kind::Spring => (if e.state > 0 { '^' } else { 'z' }, Color::Grey),
        Kind::Fan => (['|', '/', '-', '\\'][(e.anim.frame & 3) as usize], Color::Cyan),
        Kind::Torch => (if e.anim.frame == 0 { 'i' } else { '!' }, Color::Rgb { r: 255, g: 160, b: 0 }),
        Kind::WaterSurface => (if e.anim.frame % 2 == 0 { '≈' } else { '~' }, Color::Cyan),
        Kind::Coin => ('o', Color::Yellow),
        Kind::Gem => ('◆', Color::Magenta),
        Kind::Key => ('k', Color::Yellow),
        Kind::Heart => ('♥', Color::Red),
        Kind::Statuary => ('Ω', Color::Yellow),
        Kind::Apple => ('a', Color::Red),
        Kind::Pear => ('i', Color::Green),
        Kind::LadderPart => ('H', Color::Rgb { r: 200, g: 150, b: 90 }),
        Kind::Pick => ('T', Color::Grey),
    }
}
