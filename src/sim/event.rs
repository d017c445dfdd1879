/// Events emitted during a simulation step.
/// The presentation layer consumes these for messages and effects.

use crate::domain::archetype::Kind;
use crate::domain::entity::EntityId;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    ItemCollected { kind: Kind },
    PlayerDamaged { amount: i32, health: i32 },
    PlayerKilled { lives: i32 },
    GameOver,
    LevelComplete,
    PlayerRespawned,
    RegionEntered { row: usize, col: usize },
    ProjectileFired { kind: Kind, by: EntityId },
    DropReleased,
    Teleported { id: EntityId, row: i32, col: i32 },
    SpringLaunched,
    DoorOpened { row: i32, col: i32 },
    Compacted { removed: usize },
}
