/// Player controller.
///
/// Unlike the archetype timelines this runs in real time: velocities are in
/// world units per second and scaled by the clock's clamped delta.
///
/// Per frame, `process_input` turns the sampled intent into velocities and
/// ladder flags, then `process_player`:
///
///   1. moves along x, then y, resolving against the edges of the cell the
///      player occupied before moving; corner rows/columns are sampled too
///      once the sprite hangs more than a margin past the cell
///   2. handles region borders (transition, clamp, or death at the bottom)
///   3. gravity, ladder exit, water, invincibility, respawn bookkeeping

use tracing::debug;

use crate::domain::entity::{Borders, Entity, Player};
use crate::domain::grid::{
    TileGrid, CELL_HALF, CELL_SIZE, COLUMN_COUNT, REGION_HEIGHT, REGION_WIDTH, ROW_COUNT,
};
use crate::domain::tile::{Solid, TileKind};
use super::event::GameEvent;
use super::world::{self, Phase, RespawnPoint, World};

pub const WALK_SPEED: f64 = 72.0;
pub const CLIMB_SPEED: f64 = 48.0;
pub const JUMP_SPEED: f64 = 216.0;
pub const GRAVITY: f64 = 1152.0;
pub const MAX_FALL: f64 = 120.0;
pub const MAX_SPEED: f64 = 384.0;
const BLINK_MS: f64 = 200.0;

/// Held controls for one frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PlayerIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub interact: bool,
}

pub fn process_input(world: &mut World, intent: PlayerIntent, events: &mut Vec<GameEvent>) {
    let idx = world.active_index();
    let grid = &mut world.regions[idx].grid;
    let p = &mut world.player;
    let (r, c) = p.entity.cell();

    if intent.left || intent.right {
        p.entity.vx = if intent.left { -WALK_SPEED } else { WALK_SPEED };
        p.entity.anim.flip = intent.left;
        if !p.on_ladder {
            if p.in_air {
                p.entity.anim.set(1, 1, 0);
            } else {
                p.entity.anim.set(1, 2, 8);
            }
        }
    } else {
        p.entity.vx = 0.0;
        if !p.on_ladder {
            p.entity.anim.set(0, 0, 0);
        }
    }

    if intent.up {
        if grid.is_ladder(r, c) {
            p.on_ladder = true;
            p.jump_denied = true;
            p.entity.vy = -CLIMB_SPEED;
            p.entity.x = CELL_SIZE * c as f64;
            p.entity.anim.set_flip(3, 6);
        } else {
            p.on_ladder = false;
            if !p.in_air && !p.jump_denied {
                p.entity.vy = -JUMP_SPEED;
                p.in_air = true;
            }
        }
    } else if intent.down {
        if grid.is_ladder(r + 1, c) || p.on_ladder {
            if !p.on_ladder {
                // step into the ladder so the landing check lets go
                p.on_ladder = true;
                p.entity.y = CELL_SIZE * r as f64 + CELL_HALF + 1.0;
            }
            p.entity.vy = CLIMB_SPEED;
            p.entity.x = CELL_SIZE * c as f64;
            p.entity.anim.set_flip(3, 6);
        }
    } else if p.on_ladder {
        p.entity.vy = 0.0;
        p.entity.anim.set(3, 3, 0);
    } else {
        p.jump_denied = false;
    }

    if intent.interact && p.keys > 0 {
        if let Some((dr, dc)) = grid.find_near_door(r, c) {
            p.keys -= 1;
            grid.set(dr, dc, TileKind::Empty);
            debug!(row = dr, col = dc, keys = p.keys, "door opened");
            events.push(GameEvent::DoorOpened { row: dr, col: dc });
        }
    }
}

/// Advance the player by `dt` seconds.
pub fn process_player(world: &mut World, dt: f64, events: &mut Vec<GameEvent>) {
    let idx = world.active_index();
    move_in_region(&mut world.player, &world.regions[idx].grid, dt);

    cross_borders(world, events);
    if world.phase != Phase::Playing {
        return;
    }

    let idx = world.active_index();
    let active = world.active;
    let grid = &world.regions[idx].grid;
    let p = &mut world.player;
    let (r, c) = p.entity.cell();

    if !p.on_ladder {
        p.entity.vy = (p.entity.vy + GRAVITY * dt).min(MAX_FALL);
    }

    if p.on_ladder && !grid.is_ladder(r, c) {
        p.on_ladder = false;
        p.entity.anim.set(0, 0, 0);
        if p.entity.vy < 0.0 {
            p.entity.vy = 0.0;
            p.entity.y = CELL_SIZE * r as f64;
        }
    }

    if grid.is_water(r, c) {
        world::kill_player(p, &mut world.phase, events);
    }

    if p.invincibility_ms > 0.0 {
        p.invincibility_ms = (p.invincibility_ms - dt * 1000.0).max(0.0);
        let blink = (p.invincibility_ms / BLINK_MS) as i64 % 2;
        p.entity.anim.alpha = if blink == 0 { 255 } else { 0 };
    }

    if !p.in_air && !p.on_ladder && world.phase == Phase::Playing {
        world.respawn = RespawnPoint { region: active, x: p.entity.x, y: p.entity.y };
    }
}

fn sprite(e: &Entity) -> Borders {
    Borders { left: e.x, right: e.x + CELL_SIZE, top: e.y, bottom: e.y + CELL_SIZE }
}

fn move_in_region(p: &mut Player, grid: &TileGrid, dt: f64) {
    let margin = (CELL_SIZE - p.entity.archetype.body.w) / 2.0;
    let (r, c) = p.entity.cell();
    let cell = Borders::of_cell(r, c);
    let e = &mut p.entity;
    e.vx = e.vx.clamp(-MAX_SPEED, MAX_SPEED);
    e.vy = e.vy.clamp(-MAX_SPEED, MAX_SPEED);

    e.x += e.vx * dt;
    let s = sprite(e);
    let high = s.top + margin < cell.top;
    let low = s.bottom - margin > cell.bottom;
    if s.left < cell.left && e.vx <= 0.0 {
        let blocked = grid.is_solid(r, c - 1, Solid::RIGHT)
            || (high && grid.is_solid(r - 1, c - 1, Solid::RIGHT))
            || (low && grid.is_solid(r + 1, c - 1, Solid::RIGHT));
        if blocked {
            e.x = cell.left;
            e.vx = 0.0;
        }
    } else if s.right > cell.right && e.vx >= 0.0 {
        let blocked = grid.is_solid(r, c + 1, Solid::LEFT)
            || (high && grid.is_solid(r - 1, c + 1, Solid::LEFT))
            || (low && grid.is_solid(r + 1, c + 1, Solid::LEFT));
        if blocked {
            e.x = cell.left;
            e.vx = 0.0;
        }
    }

    e.y += e.vy * dt;
    let s = sprite(e);
    let left = s.left + margin < cell.left;
    let right = s.right - margin > cell.right;
    if s.bottom > cell.bottom && e.vy >= 0.0 {
        let landed = grid.is_solid(r + 1, c, Solid::TOP)
            || (left && grid.is_solid(r + 1, c - 1, Solid::TOP))
            || (right && grid.is_solid(r + 1, c + 1, Solid::TOP))
            || (!p.on_ladder && grid.is_climbable_ladder(r + 1, c));
        if landed {
            e.y = cell.top;
            e.vy = 0.0;
            p.in_air = false;
            if p.on_ladder {
                p.on_ladder = false;
                e.anim.set(0, 0, 0);
            }
        } else {
            p.in_air = !p.on_ladder;
        }
    } else if s.top < cell.top && e.vy <= 0.0 {
        let bumped = grid.is_solid(r - 1, c, Solid::BOTTOM)
            || (left && grid.is_solid(r - 1, c - 1, Solid::BOTTOM))
            || (right && grid.is_solid(r - 1, c + 1, Solid::BOTTOM));
        if bumped {
            e.y = cell.top;
            e.vy = 0.0;
        }
        p.in_air = !p.on_ladder;
    }
}

/// Does the cell of region (rr, rc) let the player through? Missing
/// regions never do.
fn neighbour_open(world: &World, rr: Option<usize>, rc: Option<usize>, r: i32, c: i32) -> bool {
    match (rr, rc) {
        (Some(rr), Some(rc)) => world.region_at(rr, rc).map_or(false, |n| !n.grid.blocks_anything(r, c)),
        _ => false,
    }
}

fn cross_borders(world: &mut World, events: &mut Vec<GameEvent>) {
    let (lr, lc) = world.active;
    let (r, c) = world.player.entity.cell();
    let body_h = world.player.entity.archetype.body.h;
    let last_col = COLUMN_COUNT as i32 - 1;
    let last_row = ROW_COUNT as i32 - 1;

    let x = world.player.entity.x;
    if x < 0.0 {
        if neighbour_open(world, Some(lr), lc.checked_sub(1), r, last_col) {
            if x + CELL_HALF < 0.0 {
                world.set_active_region(lr, lc - 1, events);
                world.player.entity.x = REGION_WIDTH - CELL_HALF - 1.0;
            }
        } else {
            world.player.entity.x = 0.0;
        }
    } else if x + CELL_SIZE > REGION_WIDTH {
        if neighbour_open(world, Some(lr), Some(lc + 1), r, 0) {
            if x + CELL_HALF > REGION_WIDTH {
                world.set_active_region(lr, lc + 1, events);
                world.player.entity.x = -CELL_HALF + 1.0;
            }
        } else {
            world.player.entity.x = REGION_WIDTH - CELL_SIZE;
        }
    }

    let y = world.player.entity.y;
    if y + body_h > REGION_HEIGHT {
        if lr + 1 < world.region_rows {
            if neighbour_open(world, Some(lr + 1), Some(lc), 0, c) {
                if y + body_h / 2.0 > REGION_HEIGHT {
                    world.set_active_region(lr + 1, lc, events);
                    world.player.entity.y = -CELL_HALF + 1.0;
                }
            } else {
                world.player.entity.y = REGION_HEIGHT - body_h;
                world.player.in_air = false;
            }
        } else {
            debug!("fell out of the world");
            world.kill_player(events);
        }
    } else if y < 0.0 {
        // the top of the world clamps like a walled neighbour
        if neighbour_open(world, lr.checked_sub(1), Some(lc), last_row, c) {
            if y + CELL_HALF < 0.0 {
                world.set_active_region(lr - 1, lc, events);
                world.player.entity.y = REGION_HEIGHT - CELL_HALF - 1.0;
            }
        } else {
            world.player.entity.y = 0.0;
            world.player.entity.vy = world.player.entity.vy.max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::domain::grid::grid_from;

    const DT: f64 = 1.0 / 30.0;
    const FLOOR: &str = "####################";

    fn world_with(rows: usize, cols: usize, grids: &[&[&str]]) -> World {
        let mut w = World::new(rows, cols, PlayerConfig::default(), Some(7));
        for (region, g) in w.regions.iter_mut().zip(grids) {
            region.grid = grid_from(g);
        }
        w
    }

    fn place(w: &mut World, row: i32, col: i32) {
        w.player.entity.x = CELL_SIZE * col as f64;
        w.player.entity.y = CELL_SIZE * row as f64;
    }

    fn run(w: &mut World, intent: PlayerIntent, frames: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..frames {
            process_input(w, intent, &mut events);
            process_player(w, DT, &mut events);
        }
        events
    }

    #[test]
    fn falls_and_lands_on_the_floor() {
        let mut w = world_with(1, 1, &[&["", "", "", "", "", FLOOR]]);
        place(&mut w, 1, 4);
        run(&mut w, PlayerIntent::default(), 60);
        assert_eq!(w.player.entity.y, 64.0);
        assert!(!w.player.in_air);
        assert_eq!(w.respawn.y, 64.0);
        assert!(w.player.entity.vy <= MAX_FALL);
    }

    #[test]
    fn wall_stops_walking() {
        let mut w = world_with(1, 1, &[&["", "", "", "", "      #", FLOOR]]);
        place(&mut w, 4, 4);
        let right = PlayerIntent { right: true, ..Default::default() };
        run(&mut w, right, 30);
        assert_eq!(w.player.entity.x, 80.0);
        assert!(!w.player.entity.anim.flip);

        let left = PlayerIntent { left: true, ..Default::default() };
        run(&mut w, left, 5);
        assert!(w.player.entity.x < 80.0);
        assert!(w.player.entity.anim.flip);
    }

    #[test]
    fn climbs_to_the_ladder_top_without_bouncing() {
        let mut w = world_with(1, 1, &[&[
            "", "", "", "", "",
            "    #=#",
            "     =",
            "     =",
            "     =",
            "     =",
            FLOOR,
        ]]);
        place(&mut w, 9, 5);
        let up = PlayerIntent { up: true, ..Default::default() };
        run(&mut w, up, 1);
        assert!(w.player.on_ladder);
        assert_eq!(w.player.entity.vy, -CLIMB_SPEED);

        run(&mut w, up, 100);
        assert_eq!(w.player.entity.y, 64.0);
        assert!(!w.player.on_ladder);
        assert!(!w.player.in_air);
        assert!(w.player.jump_denied);

        run(&mut w, PlayerIntent::default(), 1);
        assert!(!w.player.jump_denied);
        run(&mut w, up, 1);
        assert!(w.player.in_air);
        assert!(w.player.entity.y < 64.0);
    }

    #[test]
    fn climbs_down_from_the_top() {
        let mut w = world_with(1, 1, &[&[
            "", "", "", "", "",
            "    #=#",
            "     =",
            "     =",
            FLOOR,
        ]]);
        place(&mut w, 4, 5);
        run(&mut w, PlayerIntent::default(), 5);
        assert_eq!(w.player.entity.y, 64.0);

        let down = PlayerIntent { down: true, ..Default::default() };
        run(&mut w, down, 100);
        assert_eq!(w.player.entity.y, 112.0);
        assert!(!w.player.on_ladder);
        assert!(!w.player.in_air);
    }

    #[test]
    fn jump_leaves_the_ground() {
        let mut w = world_with(1, 1, &[&["", "", "", "", "", FLOOR]]);
        place(&mut w, 4, 4);
        run(&mut w, PlayerIntent::default(), 3);
        let up = PlayerIntent { up: true, ..Default::default() };
        run(&mut w, up, 1);
        assert!(w.player.in_air);
        assert!(w.player.entity.vy < 0.0);
        run(&mut w, PlayerIntent::default(), 60);
        assert_eq!(w.player.entity.y, 64.0);
        assert!(!w.player.in_air);
    }

    #[test]
    fn key_opens_adjacent_door() {
        let mut w = world_with(1, 1, &[&["", "", "", "", "      d", FLOOR]]);
        place(&mut w, 4, 5);
        let interact = PlayerIntent { interact: true, ..Default::default() };
        let ev = run(&mut w, interact, 1);
        assert!(ev.is_empty());
        assert!(w.grid().is_solid(4, 6, Solid::LEFT));

        w.player.keys = 1;
        let ev = run(&mut w, interact, 1);
        assert_eq!(ev, vec![GameEvent::DoorOpened { row: 4, col: 6 }]);
        assert_eq!(w.player.keys, 0);
        assert!(!w.grid().blocks_anything(4, 6));
    }

    #[test]
    fn water_kills() {
        let mut w = world_with(1, 1, &[&["", "", "", "", "    ~", FLOOR]]);
        place(&mut w, 4, 4);
        run(&mut w, PlayerIntent::default(), 1);
        assert_eq!(w.phase, Phase::Killed);
        assert_eq!(w.player.lives, 2);
    }

    #[test]
    fn walks_into_the_region_to_the_right() {
        let open: &[&str] = &["", "", "", "", "", "", "", "", FLOOR];
        let mut w = world_with(1, 2, &[open, open]);
        place(&mut w, 7, 19);
        let right = PlayerIntent { right: true, ..Default::default() };
        let ev = run(&mut w, right, 10);
        assert_eq!(w.active, (0, 1));
        assert!(ev.contains(&GameEvent::RegionEntered { row: 0, col: 1 }));
        assert!(w.player.entity.x < CELL_SIZE);
    }

    #[test]
    fn walled_neighbour_clamps_at_the_edge() {
        let open: &[&str] = &["", "", "", "", "", "", "", "", FLOOR];
        let walled: &[&str] = &["", "", "", "", "", "", "", "#", FLOOR];
        let mut w = world_with(1, 2, &[open, walled]);
        place(&mut w, 7, 19);
        let right = PlayerIntent { right: true, ..Default::default() };
        run(&mut w, right, 10);
        assert_eq!(w.active, (0, 0));
        assert_eq!(w.player.entity.x, REGION_WIDTH - CELL_SIZE);
    }

    #[test]
    fn falls_into_the_region_below() {
        let mut w = world_with(2, 1, &[&[], &["", "", "", "", FLOOR]]);
        place(&mut w, 14, 3);
        let ev = run(&mut w, PlayerIntent::default(), 10);
        assert_eq!(w.active, (1, 0));
        assert!(ev.contains(&GameEvent::RegionEntered { row: 1, col: 0 }));
        run(&mut w, PlayerIntent::default(), 60);
        assert_eq!(w.player.entity.y, 48.0);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn falling_off_the_last_region_kills() {
        let mut w = world_with(1, 1, &[&[]]);
        place(&mut w, 14, 3);
        run(&mut w, PlayerIntent::default(), 10);
        assert_eq!(w.phase, Phase::Killed);
    }

    #[test]
    fn jump_from_the_top_row_stays_in_the_world() {
        let mut w = world_with(1, 1, &[&["", FLOOR]]);
        place(&mut w, 0, 4);
        run(&mut w, PlayerIntent::default(), 3);
        assert_eq!(w.player.entity.y, 0.0);

        let up = PlayerIntent { up: true, ..Default::default() };
        for _ in 0..20 {
            run(&mut w, up, 1);
            assert!(w.player.entity.y >= 0.0, "y = {}", w.player.entity.y);
        }
        run(&mut w, PlayerIntent::default(), 30);
        assert_eq!(w.player.entity.y, 0.0);
        assert!(!w.player.in_air);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn cannot_walk_over_a_top_row_wall() {
        let mut w = world_with(1, 1, &[&["   #################", FLOOR]]);
        place(&mut w, 0, 1);
        run(&mut w, PlayerIntent::default(), 3);

        let jump_right = PlayerIntent { up: true, right: true, ..Default::default() };
        let right = PlayerIntent { right: true, ..Default::default() };
        for intent in [jump_right; 10].into_iter().chain([right; 30]) {
            run(&mut w, intent, 1);
            assert!(w.player.entity.y >= 0.0, "y = {}", w.player.entity.y);
            assert!(w.respawn.y >= 0.0);
        }
        assert!(w.player.entity.x <= 2.0 * CELL_SIZE);
        assert_eq!(w.player.entity.y, 0.0);
        assert!(!w.player.in_air);
    }

    #[test]
    fn invincibility_counts_down_and_blinks() {
        let mut w = world_with(1, 1, &[&["", "", "", "", "", FLOOR]]);
        place(&mut w, 4, 4);
        w.player.invincibility_ms = 250.0;
        run(&mut w, PlayerIntent::default(), 1);
        assert_eq!(w.player.entity.anim.alpha, 0);
        run(&mut w, PlayerIntent::default(), 10);
        assert_eq!(w.player.invincibility_ms, 0.0);
        assert_eq!(w.player.entity.anim.alpha, 255);
    }
}
