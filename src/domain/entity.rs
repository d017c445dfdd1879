/// Entities: the shared record driven by behaviors, and the Player that
/// extends it with gameplay counters.
///
/// Positions are in world units (one cell = `CELL_SIZE`). The body rectangle
/// comes from the archetype and is what collision and hit-testing use; it
/// can be smaller than the sprite.

use super::archetype::{Archetype, Kind};
use super::grid::{cell_at, CELL_SIZE, FRAME_RATE};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }
}

/// Absolute edges of a rectangle in world units.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Borders {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Borders {
    /// Borders of grid cell (r, c).
    pub fn of_cell(r: i32, c: i32) -> Self {
        let left = CELL_SIZE * c as f64;
        let top = CELL_SIZE * r as f64;
        Borders { left, right: left + CELL_SIZE, top, bottom: top + CELL_SIZE }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimMode {
    Frame,
    /// Row-shifted water ripple; the presenter interprets the frame as a phase.
    Wave,
    /// Single frame, horizontal flip toggles each tick (ladder climbing).
    Flip,
}

/// Animation descriptor. The core only chooses the frame range and rate and
/// ticks it; the presenter maps `frame` to sprite-sheet pixels.
#[derive(Clone, Debug)]
pub struct Animation {
    pub frame_start: i32,
    pub frame_end: i32,
    pub frame: i32,
    /// Seconds per frame; infinite when fps is 0 (frozen).
    pub delay: f64,
    /// Seconds until the next frame.
    pub counter: f64,
    pub flip: bool,
    pub alpha: i32,
    pub mode: AnimMode,
}

impl Default for Animation {
    fn default() -> Self {
        Animation {
            frame_start: 0,
            frame_end: 0,
            frame: 0,
            delay: f64::INFINITY,
            counter: 0.0,
            flip: false,
            alpha: 255,
            mode: AnimMode::Frame,
        }
    }
}

impl Animation {
    fn set_ex(&mut self, start: i32, end: i32, fps: u32, mode: AnimMode) {
        self.mode = mode;
        self.frame_start = start;
        self.frame_end = end;
        self.delay = if fps == 0 { f64::INFINITY } else { 1.0 / fps as f64 };
        if self.frame < start || self.frame > end {
            self.frame = start;
        }
        if self.counter > self.delay || self.counter < 0.0 {
            self.counter = self.delay;
        }
    }

    /// Loop frames `start..=end` at `fps`. Re-setting the current range keeps
    /// the playback position.
    pub fn set(&mut self, start: i32, end: i32, fps: u32) {
        self.set_ex(start, end, fps, AnimMode::Frame);
    }

    pub fn set_flip(&mut self, frame: i32, fps: u32) {
        self.set_ex(frame, frame, fps, AnimMode::Flip);
    }

    pub fn set_wave(&mut self, phases: i32, fps: u32) {
        self.set_ex(0, phases - 1, fps, AnimMode::Wave);
    }

    /// Tick by `dt` seconds. Returns true when the frame moved.
    pub fn advance(&mut self, dt: f64) -> bool {
        self.counter -= dt;
        if self.counter > 0.0 {
            return false;
        }
        self.counter = self.delay;
        self.frame += 1;
        if self.frame > self.frame_end {
            self.frame = self.frame_start;
        }
        if self.mode == AnimMode::Flip {
            self.flip = !self.flip;
        }
        true
    }
}

/// Animation rate for a per-frame movement speed.
pub fn speed_to_fps(speed: f64) -> u32 {
    (speed * FRAME_RATE as f64 / 12.0).abs().ceil() as u32
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub archetype: &'static Archetype,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Timeline counter; see `sim::behavior`.
    pub state: i32,
    pub removed: bool,
    pub anim: Animation,
}

impl Entity {
    /// A fresh entity at the top-left of cell (row, col). The id is assigned
    /// by the registry on insertion.
    pub fn new(archetype: &'static Archetype, row: i32, col: i32) -> Self {
        Entity {
            id: EntityId(0),
            archetype,
            x: CELL_SIZE * col as f64,
            y: CELL_SIZE * row as f64,
            vx: 0.0,
            vy: 0.0,
            state: 0,
            removed: false,
            anim: Animation::default(),
        }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.archetype.kind
    }

    /// Body rectangle in world coordinates.
    pub fn body(&self) -> Borders {
        let b = self.archetype.body;
        let left = self.x + b.x;
        let top = self.y + b.y;
        Borders { left, right: left + b.w, top, bottom: top + b.h }
    }

    /// Cell containing the body centre.
    pub fn cell(&self) -> (i32, i32) {
        let b = self.archetype.body;
        cell_at(self.x + b.x + b.w / 2.0, self.y + b.y + b.h / 2.0)
    }

    /// Set velocity and face the horizontal direction of travel.
    pub fn set_speed(&mut self, vx: f64, vy: f64) {
        self.vx = vx;
        self.vy = vy;
        self.anim.flip = vx < 0.0;
    }

    #[inline]
    pub fn reverse_x(&mut self) {
        self.set_speed(-self.vx, self.vy);
    }

    /// +1 facing right, -1 facing left.
    #[inline]
    pub fn facing(&self) -> f64 {
        if self.anim.flip { -1.0 } else { 1.0 }
    }
}

/// Body-centre overlap test: the distance between centres is strictly less
/// than half the summed extents on both axes.
pub fn hit_test(a: &Entity, b: &Entity) -> bool {
    let (ra, rb) = (a.archetype.body, b.archetype.body);
    let dx = (a.x + ra.x + ra.w / 2.0) - (b.x + rb.x + rb.w / 2.0);
    let dy = (a.y + ra.y + ra.h / 2.0) - (b.y + rb.y + rb.h / 2.0);
    dx.abs() < (ra.w + rb.w) / 2.0 && dy.abs() < (ra.h + rb.h) / 2.0
}

/// The player: one entity plus counters. Created once; moved, never rebuilt.
#[derive(Clone, Debug)]
pub struct Player {
    pub entity: Entity,
    pub lives: i32,
    pub health: i32,
    pub invincibility_ms: f64,
    pub coins: u32,
    pub keys: u32,
    pub on_ladder: bool,
    pub in_air: bool,
    /// Set while UP is held at a ladder top; cleared on release.
    pub jump_denied: bool,
}

impl Player {
    pub fn new(row: i32, col: i32, lives: i32, health: i32) -> Self {
        Player {
            entity: Entity::new(Kind::Player.archetype(), row, col),
            lives,
            health,
            invincibility_ms: 0.0,
            coins: 0,
            keys: 0,
            on_ladder: false,
            in_air: false,
            jump_denied: false,
        }
    }

    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincibility_ms > 0.0
    }
}
