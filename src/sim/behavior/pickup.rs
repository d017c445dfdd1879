/// Pickups: apply an effect on first touch, pop up, fade, disappear.

use crate::domain::archetype::Class;
use crate::domain::entity::Entity;
use crate::domain::grid::ms_to_frames;
use crate::sim::event::GameEvent;
use super::FrameCtx;

const ITEM_IDLE: i32 = 0;
const ITEM_TAKEN: i32 = ms_to_frames(500);

pub fn item_hit(item: &mut Entity, ctx: &mut FrameCtx) {
    if item.state > ITEM_IDLE {
        return;
    }
    match item.archetype.class {
        Class::Coin => ctx.player.coins += 1,
        Class::Key => ctx.player.keys += 1,
        Class::Heart => ctx.player.lives += 1,
        Class::Goal => ctx.complete_level(),
        _ => {}
    }
    ctx.events.push(GameEvent::ItemCollected { kind: item.kind() });
    item.state = ITEM_IDLE + 1;
    item.vy = -7.0;
    item.anim.set(0, 0, 0);
}

pub fn item_frame(item: &mut Entity) {
    if item.state <= ITEM_IDLE {
        return;
    }
    if item.state <= ITEM_TAKEN {
        item.anim.alpha = (item.anim.alpha - 25).max(0);
        if item.vy < 0.0 {
            item.vy += (item.state % 2) as f64;
        } else {
            item.vy = 0.0;
        }
        item.y += item.vy;
        item.state += 1;
    } else {
        item.removed = true;
    }
}
