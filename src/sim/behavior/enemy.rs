/// Hostile timelines: patrol walkers, shooters, bats, teleporters and the
/// shots they fire.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::domain::archetype::Kind;
use crate::domain::collision::{is_visible, move_body};
use crate::domain::entity::{speed_to_fps, Entity};
use crate::domain::grid::{ms_to_frames, CELL_SIZE, COLUMN_COUNT, ROW_COUNT};
use crate::domain::tile::Solid;
use crate::sim::event::GameEvent;
use super::FrameCtx;

pub const PATROL_DAMAGE: i32 = 50;
pub const BAT_DAMAGE: i32 = 35;
pub const SHOT_DAMAGE: i32 = 35;

// ── Patrol ──

const PATROL_MOVING: i32 = ms_to_frames(10_000);
const PATROL_WAITING: i32 = ms_to_frames(12_000);

/// Random heading, random head start into the moving phase.
pub fn patrol_init(e: &mut Entity, rng: &mut SmallRng) {
    let dir = if rng.gen::<bool>() { 1.0 } else { -1.0 };
    e.set_speed(e.archetype.speed * dir, 0.0);
    e.state = -rng.gen_range(0..PATROL_MOVING);
}

/// Walk (without leaving the floor), stand a while, then restart with a
/// randomised moving phase and a coin-flip heading.
pub fn patrol_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= PATROL_MOVING {
        walk(e, ctx);
    } else if e.state <= PATROL_WAITING {
        e.anim.set(2, 2, 0);
    } else {
        e.state = PATROL_MOVING - ctx.rng.gen_range(0..PATROL_MOVING * 2);
        if ctx.rng.gen::<bool>() {
            e.reverse_x();
        }
    }
    e.state += 1;
}

fn walk(e: &mut Entity, ctx: &FrameCtx) {
    if move_body(e, ctx.grid, e.vx, e.vy, true).any() {
        e.reverse_x();
    }
    e.anim.set(1, 2, speed_to_fps(e.vx));
}

/// Turn to face the player, flinch, and hurt them. `resume` is the state the
/// counter jumps to (the start of the post-hit pause).
fn strike(e: &mut Entity, ctx: &mut FrameCtx, resume: i32) {
    let px = ctx.player.entity.x;
    if (e.vx < 0.0 && px > e.x) || (e.vx > 0.0 && px < e.x) {
        e.reverse_x();
    }
    e.state = resume;
    e.anim.set(4, 4, 0);
    ctx.damage_player(PATROL_DAMAGE);
}

pub fn patrol_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    strike(e, ctx, PATROL_MOVING + 1);
}

/// Patrol, plus a rare toggle between walking and sprinting.
pub fn sprinter_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    patrol_frame(e, ctx);
    if ctx.rng.gen_range(0..100) == 99 {
        let base = e.archetype.speed;
        let speed = if e.vx.abs() > base { base } else { base * 2.5 };
        e.set_speed(speed * e.facing(), e.vy);
    }
}

// ── Shooter ──

const SHOOTER_MOVING: i32 = 0;
const SHOOTER_ATTACK1: i32 = ms_to_frames(750);
const SHOOTER_ATTACK2: i32 = ms_to_frames(1000);

/// Patrol until the player is in sight, then fire one ice shot and hold the
/// attack pose. Touching it is harmless.
pub fn shooter_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= SHOOTER_MOVING {
        if is_visible(e, &ctx.player.entity, ctx.grid) {
            let mut shot = ctx.create(Kind::IceShot);
            shot.x = if e.anim.flip {
                e.x - shot.archetype.sprite.w as f64
            } else {
                e.x + e.archetype.sprite.w as f64
            };
            shot.y = e.y;
            shot.set_speed(shot.vx * e.facing(), shot.vy);
            ctx.events.push(GameEvent::ProjectileFired { kind: Kind::IceShot, by: e.id });
            ctx.spawn(shot);
            e.state = SHOOTER_MOVING + 1;
        } else if move_body(e, ctx.grid, e.vx, e.vy, true).any() {
            e.reverse_x();
        }
        e.anim.set(1, 2, speed_to_fps(e.vx));
    } else if e.state <= SHOOTER_ATTACK1 {
        e.anim.set(4, 4, 2);
    } else if e.state <= SHOOTER_ATTACK2 {
        e.anim.set(1, 1, 2);
    } else {
        e.state = SHOOTER_MOVING;
    }

    if e.state > SHOOTER_MOVING {
        e.state += 1;
    }
}

// ── Fireball ──

const FIREBALL_MOVING: i32 = 0;
const FIREBALL_ATTACK1: i32 = ms_to_frames(500);
const FIREBALL_ATTACK2: i32 = ms_to_frames(1000);

pub fn fireball_init(e: &mut Entity, rng: &mut SmallRng) {
    patrol_init(e, rng);
    e.vy = e.vx;
    e.state = 0;
}

/// Diagonal bouncer. Fires on sight like the shooter, but keeps moving
/// through its attack phases.
pub fn fireball_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= FIREBALL_MOVING {
        if is_visible(e, &ctx.player.entity, ctx.grid) {
            let mut shot = ctx.create(Kind::FireShot);
            shot.x = e.x + e.facing() * 20.0;
            shot.y = e.y + 2.0;
            shot.set_speed(shot.vx * e.facing(), shot.vy);
            ctx.events.push(GameEvent::ProjectileFired { kind: Kind::FireShot, by: e.id });
            ctx.spawn(shot);
            e.state = FIREBALL_MOVING + 1;
        }
        e.anim.set(0, 1, 24);
    } else if e.state <= FIREBALL_ATTACK1 {
        e.anim.set(4, 4, 24);
    } else if e.state <= FIREBALL_ATTACK2 {
        e.anim.set(0, 1, 24);
    } else {
        e.state = FIREBALL_MOVING;
    }

    let m = move_body(e, ctx.grid, e.vx, e.vy, false);
    if m.any() {
        let vx = if m.x() { -e.vx } else { e.vx };
        let vy = if m.y() { -e.vy } else { e.vy };
        e.set_speed(vx, vy);
    }
    if ctx.rng.gen_range(0..100) == 99 && ctx.rng.gen::<bool>() {
        e.reverse_x();
    }

    if e.state > FIREBALL_MOVING {
        e.state += 1;
    }
}

// ── Bat ──

const BAT_NEW_DIRECTION: i32 = 16;

pub fn bat_init(e: &mut Entity, rng: &mut SmallRng) {
    patrol_init(e, rng);
    e.anim.set(0, 1, 12);
    // down first, so it comes back to its starting height
    e.vy = 1.0;
    e.state = 0;
}

/// Horizontal flight with a vertical hop on odd ticks; the vertical heading
/// flips every `BAT_NEW_DIRECTION` ticks whether or not it hit anything.
pub fn bat_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    let dy = if e.state % 2 != 0 { e.vy } else { 0.0 };
    let m = move_body(e, ctx.grid, e.vx, dy, false);
    if m.x() {
        e.reverse_x();
    }
    if m.y() {
        e.vy = -e.vy;
    }
    e.state += 1;
    if e.state >= BAT_NEW_DIRECTION {
        e.state = 0;
        e.vy = -e.vy;
    }
}

// ── Teleporter ──

const TELEPORTER_MOVING: i32 = ms_to_frames(4000);
const TELEPORTER_PAUSE: i32 = ms_to_frames(7000);
const TELEPORTER_JUMP: i32 = ms_to_frames(8000);
const TELEPORTER_REAPPEAR: i32 = ms_to_frames(9000);
const TELEPORTER_RESET: i32 = ms_to_frames(2000);

/// Walk, fade out, vanish, reappear somewhere else on a different row,
/// fade back in.
pub fn teleporter_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= TELEPORTER_MOVING {
        walk(e, ctx);
        e.anim.alpha = 255;
    } else if e.state <= TELEPORTER_PAUSE {
        e.anim.set(2, 2, 0);
        e.anim.alpha = fade(TELEPORTER_PAUSE - e.state, TELEPORTER_PAUSE - TELEPORTER_MOVING);
    } else if e.state <= TELEPORTER_JUMP {
        e.anim.alpha = 0;
        if e.state == TELEPORTER_JUMP {
            if let Some((r, c)) = teleport(e, ctx) {
                ctx.events.push(GameEvent::Teleported { id: e.id, row: r, col: c });
            }
        }
    } else if e.state <= TELEPORTER_REAPPEAR {
        e.anim.alpha = fade(e.state - TELEPORTER_JUMP, TELEPORTER_REAPPEAR - TELEPORTER_JUMP);
    } else {
        e.state = -ctx.rng.gen_range(0..TELEPORTER_RESET);
        e.anim.alpha = 255;
    }
    e.state += 1;
}

fn fade(step: i32, span: i32) -> i32 {
    (255 * step / span.max(1)).clamp(0, 255)
}

/// Random-cell trials; the first cell with floor below, free itself, and on
/// another row than the current one wins.
fn teleport(e: &mut Entity, ctx: &mut FrameCtx) -> Option<(i32, i32)> {
    let (prev_r, _) = e.cell();
    for _ in 0..ROW_COUNT * COLUMN_COUNT {
        let r = ctx.rng.gen_range(0..ROW_COUNT as i32 - 1);
        let c = ctx.rng.gen_range(0..COLUMN_COUNT as i32);
        if ctx.grid.is_solid(r + 1, c, Solid::TOP) && !ctx.grid.is_solid(r, c, Solid::ALL) && r != prev_r {
            e.x = CELL_SIZE * c as f64;
            e.y = CELL_SIZE * r as f64;
            return Some((r, c));
        }
    }
    None
}

/// Only solid (and dangerous) while walking.
pub fn teleporter_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= TELEPORTER_MOVING {
        strike(e, ctx, TELEPORTER_MOVING + 1);
    }
}

// ── Shots ──

const SHOT_MOVING: i32 = 0;
const SHOT_IMPACT: i32 = ms_to_frames(170);

pub fn shot_init(e: &mut Entity) {
    e.set_speed(e.archetype.speed, 0.0);
    e.anim.set(1, 2, 9);
}

/// Fly straight until something stops it, show the impact briefly, go away.
pub fn shot_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= SHOT_MOVING {
        if move_body(e, ctx.grid, e.vx, e.vy, false).any() {
            e.anim.set(3, 3, 0);
            e.state = SHOT_MOVING + 1;
        }
    } else if e.state <= SHOT_IMPACT {
        e.state += 1;
    } else {
        e.removed = true;
    }
}

/// Hurts, then lingers for the impact frame instead of vanishing at once.
pub fn shot_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    e.anim.set(3, 3, 0);
    if e.state <= SHOT_MOVING {
        e.state = SHOT_MOVING + 1;
    }
    ctx.damage_player(SHOT_DAMAGE);
}
