/// World: the explicit simulation context for a running game.
///
/// ## Layout
///
/// The level is a grid of regions (one screen each), stored row-major. Only
/// the active region is simulated; the others keep their entities frozen
/// until the player walks back in.
///
/// ## Player entry points
///
/// `damage_player`, `kill_player`, `complete_level` and `set_active_region`
/// are the calls behaviors and the controller make into the game. The first
/// three are also available as free functions over the individual fields so
/// a behavior can reach them while the region's registry is borrowed.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::domain::archetype::Kind;
use crate::domain::entity::{EntityId, Player};
use crate::domain::grid::TileGrid;
use crate::domain::registry::ObjectRegistry;
use super::behavior;
use super::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Killed,
    GameOver,
    LevelComplete,
    Quit,
}

#[derive(Clone, Debug, Default)]
pub struct Region {
    pub grid: TileGrid,
    pub objects: ObjectRegistry,
}

impl Region {
    /// Create an entity of `kind` at cell (row, col), run its init, append it.
    pub fn spawn(&mut self, kind: Kind, row: i32, col: i32, rng: &mut SmallRng) -> EntityId {
        let e = behavior::create(kind, row, col, rng);
        debug!(?kind, row, col, "spawn");
        self.objects.append(e)
    }
}

/// Where the player last stood on solid ground.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RespawnPoint {
    pub region: (usize, usize),
    pub x: f64,
    pub y: f64,
}

pub struct World {
    pub name: String,
    pub regions: Vec<Region>,
    pub region_rows: usize,
    pub region_cols: usize,
    pub active: (usize, usize),
    pub player: Player,
    pub phase: Phase,
    pub respawn: RespawnPoint,
    pub rng: SmallRng,
    pub tuning: PlayerConfig,
    pub clean_period_ms: u64,
    pub next_clean_ms: u64,
}

impl World {
    /// An empty world of `rows × cols` regions with the player at the
    /// top-left cell of region (0, 0).
    pub fn new(rows: usize, cols: usize, tuning: PlayerConfig, seed: Option<u64>) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        let player = Player::new(0, 0, tuning.lives, tuning.health);
        World {
            name: String::new(),
            regions: (0..rows * cols).map(|_| Region::default()).collect(),
            region_rows: rows,
            region_cols: cols,
            active: (0, 0),
            respawn: RespawnPoint { region: (0, 0), x: player.entity.x, y: player.entity.y },
            player,
            phase: Phase::Playing,
            rng,
            tuning,
            clean_period_ms: 10_000,
            next_clean_ms: 10_000,
        }
    }

    #[inline]
    pub fn region_index(&self, r: usize, c: usize) -> usize {
        r * self.region_cols + c
    }

    pub fn region_at(&self, r: usize, c: usize) -> Option<&Region> {
        if r < self.region_rows && c < self.region_cols {
            self.regions.get(self.region_index(r, c))
        } else {
            None
        }
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.region_index(self.active.0, self.active.1)
    }

    pub fn region(&self) -> &Region {
        &self.regions[self.active_index()]
    }

    pub fn region_mut(&mut self) -> &mut Region {
        let i = self.active_index();
        &mut self.regions[i]
    }

    pub fn grid(&self) -> &TileGrid {
        &self.region().grid
    }

    /// Spawn into the active region.
    #[cfg(test)]
    pub fn spawn(&mut self, kind: Kind, row: i32, col: i32) -> EntityId {
        let i = self.active_index();
        self.regions[i].spawn(kind, row, col, &mut self.rng)
    }

    /// Switch the simulated region. Out-of-range requests are refused.
    pub fn set_active_region(&mut self, r: usize, c: usize, events: &mut Vec<GameEvent>) -> bool {
        if r >= self.region_rows || c >= self.region_cols {
            return false;
        }
        self.active = (r, c);
        debug!(row = r, col = c, "region entered");
        events.push(GameEvent::RegionEntered { row: r, col: c });
        true
    }

    #[cfg(test)]
    pub fn damage_player(&mut self, amount: i32, events: &mut Vec<GameEvent>) {
        damage_player(&mut self.player, &mut self.phase, &self.tuning, amount, events);
    }

    pub fn kill_player(&mut self, events: &mut Vec<GameEvent>) {
        kill_player(&mut self.player, &mut self.phase, events);
    }

    #[cfg(test)]
    pub fn complete_level(&mut self, events: &mut Vec<GameEvent>) {
        complete_level(&mut self.phase, events);
    }

    /// Put the player back at the last stable ground position.
    pub fn respawn_player(&mut self, events: &mut Vec<GameEvent>) {
        let RespawnPoint { region, x, y } = self.respawn;
        if region != self.active {
            self.set_active_region(region.0, region.1, events);
        }
        let p = &mut self.player;
        p.entity.x = x;
        p.entity.y = y;
        p.entity.vx = 0.0;
        p.entity.vy = 0.0;
        p.entity.anim.set(0, 0, 0);
        p.entity.anim.alpha = 255;
        p.invincibility_ms = self.tuning.respawn_invincibility_ms;
        p.health = self.tuning.health;
        p.on_ladder = false;
        p.in_air = false;
        self.phase = Phase::Playing;
        info!(x, y, lives = p.lives, "player respawned");
        events.push(GameEvent::PlayerRespawned);
    }

    /// Compact every region's registry. Returns the number of entities freed.
    pub fn compact(&mut self) -> usize {
        self.regions.iter_mut().map(|r| r.objects.compact()).sum()
    }
}

/// Subtract `amount` from health. No-op while invincible. Reaching zero
/// kills; surviving grants a short invincibility window.
pub fn damage_player(
    player: &mut Player,
    phase: &mut Phase,
    tuning: &PlayerConfig,
    amount: i32,
    events: &mut Vec<GameEvent>,
) {
    if player.is_invincible() || *phase != Phase::Playing {
        return;
    }
    player.health = (player.health - amount).max(0);
    events.push(GameEvent::PlayerDamaged { amount, health: player.health });
    if player.health == 0 {
        kill_player(player, phase, events);
    } else {
        player.invincibility_ms = tuning.hit_invincibility_ms;
    }
}

/// Lose a life. No-op while invincible or when not playing, so a second
/// kill in the same frame does nothing.
pub fn kill_player(player: &mut Player, phase: &mut Phase, events: &mut Vec<GameEvent>) {
    if player.is_invincible() || *phase != Phase::Playing {
        return;
    }
    player.entity.anim.set(5, 5, 0);
    player.lives -= 1;
    if player.lives > 0 {
        *phase = Phase::Killed;
        info!(lives = player.lives, "player killed");
        events.push(GameEvent::PlayerKilled { lives: player.lives });
    } else {
        *phase = Phase::GameOver;
        info!("game over");
        events.push(GameEvent::PlayerKilled { lives: 0 });
        events.push(GameEvent::GameOver);
    }
}

pub fn complete_level(phase: &mut Phase, events: &mut Vec<GameEvent>) {
    if *phase != Phase::Playing {
        return;
    }
    *phase = Phase::LevelComplete;
    info!("level complete");
    events.push(GameEvent::LevelComplete);
}
