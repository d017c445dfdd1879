/// Behavior engine: per-archetype timelines.
///
/// Every entity carries an integer `state` counter. Each behavior compares it
/// against thresholds (in frames, from `ms_to_frames`) to pick its current
/// phase, and usually increments it once per frame:
///
/// ```text
///  0          PHASE_1         PHASE_2        PHASE_N
///  |-------------|-----x---------|---- ... ----|
///                      |
///                    state
/// ```
///
/// A value exactly equal to a threshold still belongs to the phase ending
/// there. Counters may start negative to stagger instances.
///
/// Three hooks per archetype, dispatched on `Behavior`:
///   - `on_init`  once, when the entity is created
///   - `on_frame` once per frame for every live entity of the active region
///   - `on_hit`   after `on_frame`, when the body overlaps the player's
///
/// Anything without a hook does nothing.

mod enemy;
mod pickup;
mod prop;

use rand::rngs::SmallRng;

use crate::config::PlayerConfig;
use crate::domain::archetype::{Behavior, Kind};
use crate::domain::entity::{Entity, Player};
use crate::domain::grid::TileGrid;
use super::event::GameEvent;
use super::world::{self, Phase};

/// What a behavior may touch while its entity is borrowed out of the
/// registry. New entities go to `spawns` and are appended after the hook
/// returns, so they are updated later in the same frame.
pub struct FrameCtx<'a> {
    pub grid: &'a TileGrid,
    pub player: &'a mut Player,
    pub phase: &'a mut Phase,
    pub tuning: &'a PlayerConfig,
    pub rng: &'a mut SmallRng,
    pub events: &'a mut Vec<GameEvent>,
    pub spawns: Vec<Entity>,
}

impl<'a> FrameCtx<'a> {
    pub fn damage_player(&mut self, amount: i32) {
        world::damage_player(self.player, self.phase, self.tuning, amount, self.events);
    }

    pub fn kill_player(&mut self) {
        world::kill_player(self.player, self.phase, self.events);
    }

    pub fn complete_level(&mut self) {
        world::complete_level(self.phase, self.events);
    }

    /// Build and initialise a new entity; the caller positions it and hands
    /// it back through `spawn`.
    pub fn create(&mut self, kind: Kind) -> Entity {
        create(kind, 0, 0, self.rng)
    }

    pub fn spawn(&mut self, e: Entity) {
        self.spawns.push(e);
    }
}

/// A fresh entity at cell (row, col) with its init hook applied.
pub fn create(kind: Kind, row: i32, col: i32, rng: &mut SmallRng) -> Entity {
    let mut e = Entity::new(kind.archetype(), row, col);
    on_init(&mut e, rng);
    e
}

pub fn on_init(e: &mut Entity, rng: &mut SmallRng) {
    match e.archetype.behavior {
        Behavior::Patrol | Behavior::Sprinter | Behavior::Shooter | Behavior::Teleporter => {
            enemy::patrol_init(e, rng)
        }
        Behavior::Fireball => enemy::fireball_init(e, rng),
        Behavior::Bat => enemy::bat_init(e, rng),
        Behavior::Shot => enemy::shot_init(e),
        Behavior::DropSpawner => prop::drop_spawner_init(e, rng),
        Behavior::Drop => prop::drop_init(e),
        Behavior::Platform => prop::platform_init(e),
        Behavior::Fan => prop::fan_init(e),
        Behavior::Torch => prop::torch_init(e),
        Behavior::WaterSurface => prop::water_init(e),
        Behavior::Item | Behavior::Spring | Behavior::Cloud | Behavior::Inert => {}
    }
}

pub fn on_frame(e: &mut Entity, ctx: &mut FrameCtx) {
    match e.archetype.behavior {
        Behavior::Patrol => enemy::patrol_frame(e, ctx),
        Behavior::Sprinter => enemy::sprinter_frame(e, ctx),
        Behavior::Shooter => enemy::shooter_frame(e, ctx),
        Behavior::Fireball => enemy::fireball_frame(e, ctx),
        Behavior::Bat => enemy::bat_frame(e, ctx),
        Behavior::Teleporter => enemy::teleporter_frame(e, ctx),
        Behavior::Shot => enemy::shot_frame(e, ctx),
        Behavior::DropSpawner => prop::drop_spawner_frame(e, ctx),
        Behavior::Drop => prop::drop_frame(e, ctx),
        Behavior::Platform => prop::platform_frame(e, ctx),
        Behavior::Spring => prop::spring_frame(e),
        Behavior::Fan => prop::fan_frame(e, ctx),
        Behavior::Item => pickup::item_frame(e),
        Behavior::Cloud | Behavior::Torch | Behavior::WaterSurface | Behavior::Inert => {}
    }
}

pub fn on_hit(e: &mut Entity, ctx: &mut FrameCtx) {
    match e.archetype.behavior {
        Behavior::Patrol | Behavior::Sprinter => enemy::patrol_hit(e, ctx),
        Behavior::Teleporter => enemy::teleporter_hit(e, ctx),
        Behavior::Fireball | Behavior::Bat => ctx.damage_player(enemy::BAT_DAMAGE),
        Behavior::Shot => enemy::shot_hit(e, ctx),
        Behavior::Drop => ctx.damage_player(prop::DROP_DAMAGE),
        Behavior::Platform => prop::platform_hit(e, ctx),
        Behavior::Cloud => prop::cloud_hit(e, ctx),
        Behavior::Spring => prop::spring_hit(e, ctx),
        Behavior::WaterSurface => prop::water_hit(e, ctx),
        Behavior::Item => pickup::item_hit(e, ctx),
        Behavior::Shooter | Behavior::DropSpawner | Behavior::Fan | Behavior::Torch | Behavior::Inert => {}
    }
}

/// Shared fixture for the behavior tests: a world-less context over a grid.
#[cfg(test)]
pub(crate) mod testkit {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    pub struct Kit {
        pub grid: TileGrid,
        pub player: Player,
        pub phase: Phase,
        pub tuning: PlayerConfig,
        pub rng: SmallRng,
        pub events: Vec<GameEvent>,
    }

    impl Kit {
        pub fn new(grid: TileGrid) -> Self {
            Kit {
                grid,
                player: Player::new(0, 0, 3, 100),
                phase: Phase::Playing,
                tuning: PlayerConfig::default(),
                rng: SmallRng::seed_from_u64(42),
                events: Vec::new(),
            }
        }

        /// Run `f` with a context; returns whatever was spawned.
        pub fn with<R>(&mut self, f: impl FnOnce(&mut FrameCtx) -> R) -> (R, Vec<Entity>) {
            let mut ctx = FrameCtx {
                grid: &self.grid,
                player: &mut self.player,
                phase: &mut self.phase,
                tuning: &self.tuning,
                rng: &mut self.rng,
                events: &mut self.events,
                spawns: Vec::new(),
            };
            let r = f(&mut ctx);
            (r, ctx.spawns)
        }

        pub fn frame(&mut self, e: &mut Entity) -> Vec<Entity> {
            self.with(|ctx| on_frame(e, ctx)).1
        }

        pub fn hit(&mut self, e: &mut Entity) -> Vec<Entity> {
            self.with(|ctx| on_hit(e, ctx)).1
        }

        pub fn create(&mut self, kind: Kind, row: i32, col: i32) -> Entity {
            create(kind, row, col, &mut self.rng)
        }
    }
}
