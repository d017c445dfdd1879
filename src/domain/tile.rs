/// Tile descriptors.
///
/// Tiles are interned: every grid cell holds a `&'static Tile` pointing into
/// the catalog below, so two cells of the same kind share one descriptor.
/// Solidity is stored per edge, which is what makes one-way platforms
/// (`Stair`) and arrow blocks (`ArrowLeft` / `ArrowRight`) possible.

/// Per-edge solidity bitset.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Solid(u8);

impl Solid {
    pub const NONE: Solid = Solid(0);
    pub const TOP: Solid = Solid(0b0001);
    pub const BOTTOM: Solid = Solid(0b0010);
    pub const LEFT: Solid = Solid(0b0100);
    pub const RIGHT: Solid = Solid(0b1000);
    pub const ALL: Solid = Solid(0b1111);

    /// Does this set contain every edge in `other`?
    #[inline]
    pub fn contains(self, other: Solid) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Solid {
    type Output = Solid;

    fn bitor(self, rhs: Solid) -> Solid {
        Solid(self.0 | rhs.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    None,
    Wall,
    Water,
    Ladder,
    Door,
    Scenery,
    Spike,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Empty,
    Wall,
    WallTop,
    FakeWall,   // drawn like a wall, walk-through
    Stair,      // solid from above only
    Ground,
    GroundTop,
    FakeGround,
    Water,
    Grass,
    Mushroom,
    Tree,
    Rock,
    Spike,
    Pillar,
    Door,
    Ladder,
    ArrowLeft,  // blocks only when entered from the left
    ArrowRight, // blocks only when entered from the right
}

/// Immutable tile descriptor.
#[derive(Debug)]
pub struct Tile {
    pub kind: TileKind,
    pub category: Category,
    pub solid: Solid,
}

const fn tile(kind: TileKind, category: Category, solid: Solid) -> Tile {
    Tile { kind, category, solid }
}

static CATALOG: [Tile; 19] = [
    tile(TileKind::Empty,      Category::None,    Solid::NONE),
    tile(TileKind::Wall,       Category::Wall,    Solid::ALL),
    tile(TileKind::WallTop,    Category::Wall,    Solid::ALL),
    tile(TileKind::FakeWall,   Category::None,    Solid::NONE),
    tile(TileKind::Stair,      Category::Wall,    Solid::TOP),
    tile(TileKind::Ground,     Category::Wall,    Solid::ALL),
    tile(TileKind::GroundTop,  Category::Wall,    Solid::ALL),
    tile(TileKind::FakeGround, Category::None,    Solid::NONE),
    tile(TileKind::Water,      Category::Water,   Solid::NONE),
    tile(TileKind::Grass,      Category::Scenery, Solid::NONE),
    tile(TileKind::Mushroom,   Category::Scenery, Solid::NONE),
    tile(TileKind::Tree,       Category::Scenery, Solid::NONE),
    tile(TileKind::Rock,       Category::Scenery, Solid::ALL),
    tile(TileKind::Spike,      Category::Spike,   Solid::NONE),
    tile(TileKind::Pillar,     Category::Scenery, Solid::NONE),
    tile(TileKind::Door,       Category::Door,    Solid::ALL),
    tile(TileKind::Ladder,     Category::Ladder,  Solid::NONE),
    tile(TileKind::ArrowLeft,  Category::Wall,    Solid::LEFT),
    tile(TileKind::ArrowRight, Category::Wall,    Solid::RIGHT),
];

impl TileKind {
    /// The shared descriptor for this kind.
    pub fn tile(self) -> &'static Tile {
        &CATALOG[self as usize]
    }
}

impl Tile {
    /// Solid on every requested edge. An empty request is never solid.
    #[inline]
    pub fn is_solid(&self, edges: Solid) -> bool {
        !edges.is_empty() && self.solid.contains(edges)
    }

    /// Solid on at least one edge.
    #[inline]
    pub fn blocks_anything(&self) -> bool {
        !self.solid.is_empty()
    }
}
