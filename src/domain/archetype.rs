/// Archetypes: the immutable template shared by every entity of one kind.
///
/// The catalog is a static table indexed by `Kind`, so an entity holds a
/// `&'static Archetype` and never owns a copy. Speeds are world units per
/// frame (see `sim::behavior`).

use super::entity::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Kind {
    Player,
    Scorpion,
    Rat,
    Blob,
    Spider,
    Ghost,
    Fireball,
    Bat,
    Skeleton,
    IceShot,
    FireShot,
    DropSpawner,
    Drop,
    Platform,
    Cloud,
    Spring,
    Fan,
    Torch,
    WaterSurface,
    Coin,
    Gem,
    Key,
    Heart,
    Statuary,
    Apple,
    Pear,
    LadderPart,
    Pick,
}

/// Coarse grouping; drives item effects and presentation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Class {
    Player,
    Enemy,
    Projectile,
    Drop,
    Platform,
    Spring,
    Fan,
    Scenery,
    Water,
    Coin,
    Key,
    Heart,
    Goal,
    Item,
}

/// Which timeline drives the entity. Matched in `sim::behavior`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Behavior {
    Inert,
    Patrol,
    Sprinter,
    Shooter,
    Fireball,
    Bat,
    Teleporter,
    Shot,
    DropSpawner,
    Drop,
    Platform,
    Cloud,
    Spring,
    Fan,
    Torch,
    WaterSurface,
    Item,
}

/// Sprite-sheet cell and size. Opaque to the simulation except for `w`,
/// which places freshly fired shots beside the shooter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Sprite {
    pub row: u16,
    pub col: u16,
    pub w: u16,
    pub h: u16,
}

#[derive(Debug)]
pub struct Archetype {
    pub kind: Kind,
    pub class: Class,
    pub sprite: Sprite,
    pub body: Rect,
    pub speed: f64,
    pub behavior: Behavior,
}

const fn arch(
    kind: Kind,
    class: Class,
    sprite: (u16, u16, u16, u16),
    body: (f64, f64, f64, f64),
    speed: f64,
    behavior: Behavior,
) -> Archetype {
    Archetype {
        kind,
        class,
        sprite: Sprite { row: sprite.0, col: sprite.1, w: sprite.2, h: sprite.3 },
        body: Rect::new(body.0, body.1, body.2, body.3),
        speed,
        behavior,
    }
}

const FULL: (f64, f64, f64, f64) = (0.0, 0.0, 16.0, 16.0);

static CATALOG: [Archetype; 28] = [
    arch(Kind::Player,       Class::Player,     (1, 26, 16, 16),  (6.0, 0.0, 4.0, 16.0),  0.0, Behavior::Inert),
    arch(Kind::Scorpion,     Class::Enemy,      (10, 26, 16, 16), (3.0, 5.0, 10.0, 11.0), 1.0, Behavior::Patrol),
    arch(Kind::Rat,          Class::Enemy,      (9, 26, 16, 16),  (2.0, 5.0, 12.0, 11.0), 1.0, Behavior::Patrol),
    arch(Kind::Blob,         Class::Enemy,      (61, 26, 16, 16), (3.0, 6.0, 10.0, 10.0), 1.0, Behavior::Patrol),
    arch(Kind::Spider,       Class::Enemy,      (11, 26, 16, 16), (3.0, 6.0, 10.0, 10.0), 1.0, Behavior::Sprinter),
    arch(Kind::Ghost,        Class::Enemy,      (7, 26, 16, 16),  (2.0, 0.0, 12.0, 16.0), 1.0, Behavior::Shooter),
    arch(Kind::Fireball,     Class::Enemy,      (13, 26, 16, 16), (2.0, 3.0, 14.0, 12.0), 1.5, Behavior::Fireball),
    arch(Kind::Bat,          Class::Enemy,      (8, 26, 16, 16),  (0.0, 3.0, 16.0, 10.0), 1.5, Behavior::Bat),
    arch(Kind::Skeleton,     Class::Enemy,      (6, 26, 16, 16),  (1.0, 0.0, 14.0, 16.0), 1.0, Behavior::Teleporter),
    arch(Kind::IceShot,      Class::Projectile, (52, 0, 16, 16),  (0.0, 4.0, 16.0, 7.0),  5.0, Behavior::Shot),
    arch(Kind::FireShot,     Class::Projectile, (60, 26, 16, 16), (6.0, 6.0, 4.0, 4.0),   4.0, Behavior::Shot),
    arch(Kind::DropSpawner,  Class::Drop,       (37, 43, 16, 16), (6.0, 6.0, 4.0, 4.0),   0.0, Behavior::DropSpawner),
    arch(Kind::Drop,         Class::Drop,       (37, 43, 16, 16), (6.0, 6.0, 4.0, 4.0),   0.0, Behavior::Drop),
    arch(Kind::Platform,     Class::Platform,   (4, 6, 16, 8),    (0.0, 0.0, 16.0, 8.0),  1.5, Behavior::Platform),
    arch(Kind::Cloud,        Class::Platform,   (51, 6, 16, 16),  FULL,                   0.0, Behavior::Cloud),
    arch(Kind::Spring,       Class::Spring,     (65, 26, 16, 16), (0.0, 8.0, 16.0, 8.0),  0.0, Behavior::Spring),
    arch(Kind::Fan,          Class::Fan,        (64, 26, 16, 16), FULL,                   0.0, Behavior::Fan),
    arch(Kind::Torch,        Class::Scenery,    (62, 26, 16, 16), (5.0, 0.0, 6.0, 6.0),   0.0, Behavior::Torch),
    arch(Kind::WaterSurface, Class::Water,      (8, 0, 16, 16),   FULL,                   0.0, Behavior::WaterSurface),
    arch(Kind::Coin,         Class::Coin,       (63, 26, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::Gem,          Class::Coin,       (50, 32, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::Key,          Class::Key,        (45, 26, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::Heart,        Class::Heart,      (62, 31, 16, 16), (4.0, 4.0, 8.0, 8.0),   0.0, Behavior::Item),
    arch(Kind::Statuary,     Class::Goal,       (52, 27, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::Apple,        Class::Item,       (15, 26, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::Pear,         Class::Item,       (15, 27, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::LadderPart,   Class::Item,       (62, 29, 16, 16), FULL,                   0.0, Behavior::Item),
    arch(Kind::Pick,         Class::Item,       (62, 30, 16, 16), FULL,                   0.0, Behavior::Item),
];

impl Kind {
    pub fn archetype(self) -> &'static Archetype {
        &CATALOG[self as usize]
    }
}
