/// Level props: drops and their spawners, platforms, clouds, springs, fans,
/// torches and water surfaces.
///
/// Props that act on the player work in the player's units (world units per
/// second), not the per-frame units the props themselves move in.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::domain::archetype::Kind;
use crate::domain::collision::move_body;
use crate::domain::entity::Entity;
use crate::domain::grid::{ms_to_frames, CELL_SIZE};
use crate::sim::event::GameEvent;
use super::FrameCtx;

pub const DROP_DAMAGE: i32 = 20;

// ── Drops ──

const SPAWNER_FIRST_DELAY: i32 = ms_to_frames(2000);
const SPAWNER_RECUR_MIN: i32 = ms_to_frames(2000);
const SPAWNER_RECUR_SPREAD: i32 = ms_to_frames(8000);

const DROP_FALLING: i32 = 0;
const DROP_FELL: i32 = ms_to_frames(1000);
const DROP_MAX_SPEED: f64 = 5.0;

pub fn drop_spawner_init(e: &mut Entity, rng: &mut SmallRng) {
    e.state = -rng.gen_range(0..SPAWNER_FIRST_DELAY);
}

/// Counts up to zero, releases a drop at its own position, and rewinds by a
/// random recurrence delay.
pub fn drop_spawner_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state >= 0 {
        let mut drop = ctx.create(Kind::Drop);
        drop.x = e.x;
        drop.y = e.y;
        ctx.spawn(drop);
        ctx.events.push(GameEvent::DropReleased);
        e.state = -(SPAWNER_RECUR_MIN + ctx.rng.gen_range(0..SPAWNER_RECUR_SPREAD));
    } else {
        e.state += 1;
    }
}

pub fn drop_init(e: &mut Entity) {
    e.state = DROP_FALLING;
    e.anim.set(1, 1, 0);
}

/// Accelerate down (capped) until blocked, then sit and fade for a moment.
pub fn drop_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.state <= DROP_FALLING {
        if e.vy < DROP_MAX_SPEED {
            e.vy += 1.0;
        }
        if move_body(e, ctx.grid, 0.0, e.vy, false).any() {
            e.vy = 0.0;
            e.state = DROP_FALLING + 1;
            e.anim.set(2, 2, 0);
        }
    } else if e.state <= DROP_FELL {
        e.anim.alpha = 255 * (DROP_FELL - e.state) / DROP_FELL;
        e.state += 1;
    } else {
        e.removed = true;
    }
}

// ── Platforms ──

pub fn platform_init(e: &mut Entity) {
    e.set_speed(e.archetype.speed, 0.0);
}

pub fn platform_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    if move_body(e, ctx.grid, e.vx, e.vy, false).any() {
        e.set_speed(-e.vx, -e.vy);
    }
}

/// Resolve overlap with the player: mostly-side contact pushes the player
/// out sideways; mostly-vertical contact puts them on top (carried along
/// when they are not walking) or under it.
pub fn platform_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    const BORDER: f64 = 5.0;
    let pb = ctx.player.entity.body();
    let eb = e.body();
    let body = ctx.player.entity.archetype.body;
    let p = &mut *ctx.player;

    if pb.bottom - eb.top > BORDER && eb.bottom - pb.top > BORDER {
        if pb.right >= eb.left && pb.left <= eb.left {
            p.entity.x = eb.left - body.x - body.w;
        } else if pb.left <= eb.right && pb.right >= eb.right {
            p.entity.x = eb.right - body.x;
        }
    } else if pb.right - eb.left > BORDER && eb.right - pb.left > BORDER {
        if pb.bottom >= eb.top && pb.top <= eb.top {
            if p.entity.vx == 0.0 {
                p.entity.x += e.vx;
            }
            p.entity.y = eb.top - body.y - body.h;
            p.entity.vy = p.entity.vy.min(0.0);
            p.in_air = false;
        } else if pb.top <= eb.bottom && pb.bottom >= eb.bottom {
            p.entity.y = eb.bottom - body.y;
        }
    }
}

/// Stops a falling player while their top half is above the cloud's bottom.
pub fn cloud_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    let p = &mut *ctx.player;
    if p.entity.y + CELL_SIZE / 2.0 < e.y + CELL_SIZE {
        if p.entity.vy > 0.0 {
            p.entity.vy = 0.0;
        }
        p.in_air = false;
    }
}

// ── Springs ──

const SPRING_COOLDOWN: i32 = ms_to_frames(1000);
const SPRING_REACH: f64 = 16.0;
const SPRING_MIN_FALL: f64 = 48.0;
const SPRING_LAUNCH: f64 = -360.0;

pub fn spring_frame(e: &mut Entity) {
    if e.state > 0 {
        e.state -= 1;
    } else {
        e.anim.set(0, 0, 0);
    }
}

/// Launch a player landing on it fast enough; then rest for the cooldown.
pub fn spring_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    let pb = ctx.player.entity.body();
    let eb = e.body();
    if e.state == 0 && pb.bottom >= eb.bottom - SPRING_REACH && ctx.player.entity.vy > SPRING_MIN_FALL {
        ctx.player.entity.vy = SPRING_LAUNCH;
        ctx.player.in_air = true;
        e.state = SPRING_COOLDOWN;
        e.anim.set(1, 1, 0);
        ctx.events.push(GameEvent::SpringLaunched);
    }
}

// ── Fans ──

const FAN_RADIUS: f64 = CELL_SIZE * 2.5;
const FAN_PUSH_X: f64 = 48.0;
const FAN_PUSH_Y: f64 = 72.0;

pub fn fan_init(e: &mut Entity) {
    e.anim.set(0, 3, 2);
}

/// Push the player away, scaled by direction, while within the radius.
pub fn fan_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    let p = &mut ctx.player.entity;
    let dx = p.x - e.x;
    let dy = p.y - e.y;
    let dr = dx.hypot(dy);
    if dr < FAN_RADIUS {
        let r = if dr > 0.0 { dr } else { 0.1 };
        p.vx += FAN_PUSH_X * dx / r;
        p.vy += FAN_PUSH_Y * dy / r;
    }
}

// ── Scenery ──

pub fn torch_init(e: &mut Entity) {
    e.anim.set(0, 1, 12);
}

pub fn water_init(e: &mut Entity) {
    e.anim.set_wave(16, 2);
}

/// Deadly only when the player is actually in the surface row.
pub fn water_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    if e.cell().0 == ctx.player.entity.cell().0 {
        ctx.kill_player();
    }
}
