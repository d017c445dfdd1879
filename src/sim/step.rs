/// The step function: advances the world by one frame.
///
/// Processing order while playing:
///   1. Player intent (velocities, ladders, doors)
///   2. Player movement, region borders, gravity, hazards
///   3. Entities of the active region, in registry order:
///      on_frame, then on_hit if the bodies overlap; spawns are appended
///      right away and so run later in this same frame
///   4. Animation ticks
///
/// Outside of play only `interact` matters: it respawns after a death and
/// quits from the end screens. Registry compaction runs on its own cadence
/// regardless of phase, always after iteration has finished.

use tracing::debug;

use crate::domain::entity::hit_test;
use super::behavior::{self, FrameCtx};
use super::event::GameEvent;
use super::player::{self, PlayerIntent};
use super::world::{Phase, Region, World};

/// The two times a frame needs from the clock.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ClockView {
    /// Clamped length of the last frame.
    pub frame_ms: u64,
    /// Unclamped time since start.
    pub total_ms: u64,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut World, intent: PlayerIntent, clock: ClockView) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    let dt = clock.frame_ms as f64 / 1000.0;

    match world.phase {
        Phase::Playing => {
            player::process_input(world, intent, &mut events);
            player::process_player(world, dt, &mut events);
            update_objects(world, &mut events);
            advance_animations(world, dt);
        }
        Phase::Killed => {
            if intent.interact {
                world.respawn_player(&mut events);
            }
        }
        Phase::GameOver | Phase::LevelComplete => {
            if intent.interact {
                world.phase = Phase::Quit;
            }
        }
        Phase::Quit => {}
    }

    compact_if_due(world, clock.total_ms, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Entities
// ══════════════════════════════════════════════════════════════

/// Walk the active registry by index; the length is re-read each turn so
/// entities appended mid-walk are reached too. Removed entries are skipped,
/// never unlinked here.
fn update_objects(world: &mut World, events: &mut Vec<GameEvent>) {
    let idx = world.active_index();
    let World { regions, player, phase, rng, tuning, .. } = world;
    let Region { grid, objects } = &mut regions[idx];

    let mut i = 0;
    while i < objects.len() {
        let e = objects.at_mut(i);
        if !e.removed {
            let mut ctx = FrameCtx {
                grid: &*grid,
                player: &mut *player,
                phase: &mut *phase,
                tuning: &*tuning,
                rng: &mut *rng,
                events: &mut *events,
                spawns: Vec::new(),
            };
            behavior::on_frame(e, &mut ctx);
            if !e.removed && *ctx.phase == Phase::Playing && hit_test(e, &ctx.player.entity) {
                behavior::on_hit(e, &mut ctx);
            }
            let spawns = ctx.spawns;
            for spawned in spawns {
                debug!(kind = ?spawned.kind(), "spawned in frame");
                objects.append(spawned);
            }
        }
        i += 1;
    }
}

fn advance_animations(world: &mut World, dt: f64) {
    for e in world.region_mut().objects.iter_mut().filter(|e| !e.removed) {
        e.anim.advance(dt);
    }
    world.player.entity.anim.advance(dt);
}

// ══════════════════════════════════════════════════════════════
// Compaction
// ══════════════════════════════════════════════════════════════

fn compact_if_due(world: &mut World, total_ms: u64, events: &mut Vec<GameEvent>) {
    if total_ms < world.next_clean_ms {
        return;
    }
    world.next_clean_ms = total_ms + world.clean_period_ms;
    let removed = world.compact();
    if removed > 0 {
        debug!(removed, "registry compacted");
        events.push(GameEvent::Compacted { removed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::domain::archetype::Kind;
    use crate::domain::grid::{grid_from, CELL_SIZE};

    const FRAME: ClockView = ClockView { frame_ms: 33, total_ms: 33 };

    fn at(total_ms: u64) -> ClockView {
        ClockView { frame_ms: 33, total_ms }
    }

    fn world(rows: &[&str]) -> World {
        let mut w = World::new(1, 1, PlayerConfig::default(), Some(3));
        w.regions[0].grid = grid_from(rows);
        w
    }

    fn place_player(w: &mut World, row: i32, col: i32) {
        w.player.entity.x = CELL_SIZE * col as f64;
        w.player.entity.y = CELL_SIZE * row as f64;
    }

    #[test]
    fn shooter_fires_once_at_visible_player() {
        let mut w = world(&["", "", "", "####################"]);
        place_player(&mut w, 2, 6);
        let ghost = w.spawn(Kind::Ghost, 2, 2);
        if let Some(g) = w.region_mut().objects.get_mut(ghost) {
            g.set_speed(1.0, 0.0);
            g.state = 0;
        }

        let ev = step(&mut w, PlayerIntent::default(), FRAME);
        assert_eq!(w.region().objects.len(), 2);
        assert_eq!(
            ev.iter().filter(|e| matches!(e, GameEvent::ProjectileFired { .. })).count(),
            1
        );
        let shot = w.region().objects.iter().find(|e| e.kind() == Kind::IceShot);
        // appended shots move in the frame they are fired
        assert!(shot.map_or(false, |s| s.x > 48.0));
        assert!(w.region().objects.get(ghost).map_or(false, |g| g.state > 0));

        let ev = step(&mut w, PlayerIntent::default(), at(66));
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::ProjectileFired { .. })));
    }

    #[test]
    fn removed_entities_are_skipped_until_compaction() {
        let mut w = world(&["", "", "", "####################"]);
        place_player(&mut w, 2, 6);
        let coin = w.spawn(Kind::Coin, 2, 6);
        w.region_mut().objects.mark_removed(coin);

        let ev = step(&mut w, PlayerIntent::default(), FRAME);
        assert_eq!(w.player.coins, 0);
        assert!(ev.is_empty());
        assert_eq!(w.region().objects.len(), 1);

        let ev = step(&mut w, PlayerIntent::default(), at(10_000));
        assert_eq!(w.region().objects.len(), 0);
        assert!(ev.contains(&GameEvent::Compacted { removed: 1 }));
        assert_eq!(w.next_clean_ms, 20_000);
    }

    #[test]
    fn compaction_waits_for_its_period() {
        let mut w = world(&[]);
        let drop = w.spawn(Kind::Pear, 5, 5);
        w.region_mut().objects.mark_removed(drop);
        step(&mut w, PlayerIntent::default(), at(9_999));
        assert_eq!(w.region().objects.len(), 1);
        step(&mut w, PlayerIntent::default(), at(10_001));
        assert_eq!(w.region().objects.len(), 0);
    }

    #[test]
    fn touching_an_item_collects_it() {
        let mut w = world(&["", "", "", "####################"]);
        place_player(&mut w, 2, 6);
        w.spawn(Kind::Key, 2, 6);
        let ev = step(&mut w, PlayerIntent::default(), FRAME);
        assert_eq!(w.player.keys, 1);
        assert_eq!(ev, vec![GameEvent::ItemCollected { kind: Kind::Key }]);
    }

    #[test]
    fn interact_respawns_after_death() {
        let mut w = world(&["", "", "", "####################"]);
        place_player(&mut w, 2, 6);
        step(&mut w, PlayerIntent::default(), FRAME);
        assert_eq!(w.respawn.x, 96.0);

        let mut ev = Vec::new();
        w.kill_player(&mut ev);
        assert_eq!(w.phase, Phase::Killed);
        place_player(&mut w, 0, 0);

        // frozen while dead
        let ev = step(&mut w, PlayerIntent { right: true, ..Default::default() }, FRAME);
        assert!(ev.is_empty());
        assert_eq!(w.player.entity.x, 0.0);

        let ev = step(&mut w, PlayerIntent { interact: true, ..Default::default() }, FRAME);
        assert_eq!(ev, vec![GameEvent::PlayerRespawned]);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!((w.player.entity.x, w.player.entity.y), (96.0, 32.0));
    }

    #[test]
    fn end_screens_quit_on_interact() {
        let mut w = world(&[]);
        w.phase = Phase::LevelComplete;
        step(&mut w, PlayerIntent::default(), FRAME);
        assert_eq!(w.phase, Phase::LevelComplete);
        step(&mut w, PlayerIntent { interact: true, ..Default::default() }, FRAME);
        assert_eq!(w.phase, Phase::Quit);
    }

    #[test]
    fn animations_tick_with_the_frame() {
        let mut w = world(&[]);
        let torch = w.spawn(Kind::Torch, 5, 5);
        step(&mut w, PlayerIntent::default(), FRAME);
        assert_eq!(w.region().objects.get(torch).map(|t| t.anim.frame), Some(1));
    }
}
