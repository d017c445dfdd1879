/// World file loader.
///
/// ## Sources (priority order):
///   1. The configured world file
///   2. The embedded default world
///
/// ## Format:
///   ```
///   # World Name
///   # any further '#' lines are comments
///   <15 lines, each 20 × region-columns characters>   ← region row 0
///   <empty line>
///   <15 lines>                                        ← region row 1
///   ```
///
/// Region rows are separated by an empty line. Every line has the same
/// width, a whole number of regions across. Spaces are empty cells.
///
/// ## Legend:
///   '*' = Wall          'x' = Ground        '~' = Water
///   '-' = Stair         '=' = Ladder        'd' = Door
///   '<' '>' = Arrows    ',' = Grass         '.' = Mushroom
///   ';' = Tree          '@' = Rock          '^' = Spike
///   '|' = Pillar        'o' = Coin          'O' = Gem
///   'k' = Key           'h' = Heart         'a' = Apple
///   'i' = Pear          'S' = Statuary      'g' = Ghost
///   's' = Scorpion      'p' = Spider        'r' = Rat
///   'b' = Bat           'q' = Blob          'f' = Fireball
///   'e' = Skeleton      '`' = Drop spawner  '_' = Platform
///   '/' = Spring        'F' = Fan           '&' = Cloud
///   '!' = Torch         '+' = Fake wall     'X' = Fake ground
///   'H' = Ladder part   'T' = Pick          'P' = Player start (exactly one)
///
/// Walls and ground get their top variant unless more of either sits right
/// above. The top cell of a body of water also carries a surface entity.

use thiserror::Error;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::archetype::Kind;
use crate::domain::entity::Player;
use crate::domain::grid::{CELL_SIZE, COLUMN_COUNT, ROW_COUNT};
use crate::domain::tile::TileKind;
use super::world::{RespawnPoint, World};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// No map lines at all.
    #[error("world file has no map lines")]
    Empty,
    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow { line: usize, expected: usize, found: usize },
    #[error("region row {region_row}: expected {} lines, found {lines}", ROW_COUNT)]
    RegionHeight { region_row: usize, lines: usize },
    #[error("no player start ('P') in world")]
    MissingStart,
    #[error("line {line}: second player start")]
    DuplicateStart { line: usize },
}

/// A parsed world file, validated but not yet instantiated.
#[derive(Clone, Debug)]
pub struct WorldDef {
    pub name: String,
    pub region_rows: usize,
    pub region_cols: usize,
    /// (region row, region col, cell row, cell col)
    pub start: (usize, usize, i32, i32),
    lines: Vec<Vec<char>>,
}

impl WorldDef {
    /// Character at cell (r, c) of region (lr, lc); None outside the region.
    fn char_at(&self, lr: usize, lc: usize, r: i32, c: i32) -> Option<char> {
        if r < 0 || c < 0 || r as usize >= ROW_COUNT || c as usize >= COLUMN_COUNT {
            return None;
        }
        self.lines
            .get(lr * ROW_COUNT + r as usize)
            .and_then(|line| line.get(lc * COLUMN_COUNT + c as usize))
            .copied()
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Parse and instantiate a world file.
pub fn load_world(text: &str, config: &GameConfig) -> Result<World, LevelError> {
    let def = parse_world(text)?;
    Ok(build_world(&def, config))
}

/// The world compiled into the binary.
pub fn default_world(config: &GameConfig) -> Result<World, LevelError> {
    load_world(&embedded_world(), config)
}

pub fn parse_world(text: &str) -> Result<WorldDef, LevelError> {
    let mut name: Option<String> = None;
    let mut blocks: Vec<Vec<(usize, Vec<char>)>> = Vec::new();
    let mut current: Vec<(usize, Vec<char>)> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if let Some(comment) = line.strip_prefix('#') {
            if name.is_none() && !comment.trim().is_empty() {
                name = Some(comment.trim().to_string());
            }
            continue;
        }
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push((i + 1, line.chars().collect()));
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let (first_line, first) = match blocks.first().and_then(|b| b.first()) {
        Some((n, chars)) => (*n, chars.len()),
        None => return Err(LevelError::Empty),
    };
    if first % COLUMN_COUNT != 0 {
        let expected = (first / COLUMN_COUNT + 1) * COLUMN_COUNT;
        return Err(LevelError::RaggedRow { line: first_line, expected, found: first });
    }
    let width = first;

    for (region_row, block) in blocks.iter().enumerate() {
        if block.len() != ROW_COUNT {
            return Err(LevelError::RegionHeight { region_row, lines: block.len() });
        }
        if let Some((line, chars)) = block.iter().find(|(_, chars)| chars.len() != width) {
            return Err(LevelError::RaggedRow { line: *line, expected: width, found: chars.len() });
        }
    }

    let mut start = None;
    for (i, (line, chars)) in blocks.iter().flatten().enumerate() {
        for (x, ch) in chars.iter().enumerate() {
            if *ch != 'P' {
                continue;
            }
            if start.is_some() {
                return Err(LevelError::DuplicateStart { line: *line });
            }
            start = Some((
                i / ROW_COUNT,
                x / COLUMN_COUNT,
                (i % ROW_COUNT) as i32,
                (x % COLUMN_COUNT) as i32,
            ));
        }
    }
    let start = start.ok_or(LevelError::MissingStart)?;

    Ok(WorldDef {
        name: name.unwrap_or_else(|| "Untitled".to_string()),
        region_rows: blocks.len(),
        region_cols: width / COLUMN_COUNT,
        start,
        lines: blocks.into_iter().flatten().map(|(_, chars)| chars).collect(),
    })
}

/// Instantiate every region: tiles, entities, and the player at the start.
pub fn build_world(def: &WorldDef, config: &GameConfig) -> World {
    let mut world = World::new(def.region_rows, def.region_cols, config.player.clone(), config.seed);
    world.name = def.name.clone();
    world.clean_period_ms = config.timing.clean_period_ms;
    world.next_clean_ms = config.timing.clean_period_ms;

    for lr in 0..def.region_rows {
        for lc in 0..def.region_cols {
            let idx = world.region_index(lr, lc);
            let region = &mut world.regions[idx];
            for r in 0..ROW_COUNT as i32 {
                for c in 0..COLUMN_COUNT as i32 {
                    let Some(ch) = def.char_at(lr, lc, r, c) else { continue };
                    let above = def.char_at(lr, lc, r - 1, c);
                    region.grid.set(r, c, tile_for(ch, above));

                    if ch == '~' && !matches!(above, None | Some('~' | 'x' | '*')) {
                        region.spawn(Kind::WaterSurface, r, c, &mut world.rng);
                    }
                    if let Some(kind) = kind_for(ch) {
                        let id = region.spawn(kind, r, c, &mut world.rng);
                        if kind == Kind::DropSpawner {
                            // hang from the ceiling of the cell
                            if let Some(e) = region.objects.get_mut(id) {
                                let body = e.archetype.body;
                                e.y = CELL_SIZE * r as f64 - (CELL_SIZE - body.h) / 2.0 - 1.0;
                            }
                        }
                    }
                }
            }
            debug!(row = lr, col = lc, entities = region.objects.len(), "region built");
        }
    }

    let (lr, lc, r, c) = def.start;
    world.player = Player::new(r, c, config.player.lives, config.player.health);
    world.active = (lr, lc);
    world.respawn = RespawnPoint {
        region: (lr, lc),
        x: world.player.entity.x,
        y: world.player.entity.y,
    };
    info!(
        name = %world.name,
        regions = def.region_rows * def.region_cols,
        start_region = ?(lr, lc),
        "world loaded"
    );
    world
}

// ══════════════════════════════════════════════════════════════
// Legend
// ══════════════════════════════════════════════════════════════

fn tile_for(ch: char, above: Option<char>) -> TileKind {
    let covered = matches!(above, None | Some('*' | 'x'));
    match ch {
        '*' if covered => TileKind::Wall,
        '*' => TileKind::WallTop,
        'x' if covered => TileKind::Ground,
        'x' => TileKind::GroundTop,
        '~' => TileKind::Water,
        '-' => TileKind::Stair,
        '=' => TileKind::Ladder,
        'd' => TileKind::Door,
        '<' => TileKind::ArrowLeft,
        '>' => TileKind::ArrowRight,
        ',' => TileKind::Grass,
        '.' => TileKind::Mushroom,
        ';' => TileKind::Tree,
        '@' => TileKind::Rock,
        '^' => TileKind::Spike,
        '|' => TileKind::Pillar,
        '+' => TileKind::FakeWall,
        'X' => TileKind::FakeGround,
        _ => TileKind::Empty,
    }
}

fn kind_for(ch: char) -> Option<Kind> {
    let kind = match ch {
        'o' => Kind::Coin,
        'O' => Kind::Gem,
        'k' => Kind::Key,
        'h' => Kind::Heart,
        'a' => Kind::Apple,
        'i' => Kind::Pear,
        'H' => Kind::LadderPart,
        'T' => Kind::Pick,
        'S' => Kind::Statuary,
        'g' => Kind::Ghost,
        's' => Kind::Scorpion,
        'p' => Kind::Spider,
        'r' => Kind::Rat,
        'b' => Kind::Bat,
        'q' => Kind::Blob,
        'f' => Kind::Fireball,
        'e' => Kind::Skeleton,
        '`' => Kind::DropSpawner,
        '_' => Kind::Platform,
        '/' => Kind::Spring,
        'F' => Kind::Fan,
        '&' => Kind::Cloud,
        '!' => Kind::Torch,
        _ => return None,
    };
    Some(kind)
}

// ══════════════════════════════════════════════════════════════
// Embedded world
// ══════════════════════════════════════════════════════════════

/// Regions are given side by side; rows shorter than a region are padded.
fn make_embedded(name: &str, regions: &[&[&str]]) -> String {
    let mut text = format!("# {name}\n");
    for r in 0..ROW_COUNT {
        for region in regions {
            let row = region.get(r).copied().unwrap_or("");
            text.push_str(&format!("{row:<width$}", width = COLUMN_COUNT));
        }
        text.push('\n');
    }
    text
}

fn embedded_world() -> String {
    make_embedded("Shallow Caves", &[
        &[
            "********************",
            "*      !      !     ",
            "*  o o        `     ",
            "*xxxxxx=   xxxxxx   ",
            "*      =        s   ",
            "*      =  ,, xxxxxxx",
            "*   k  =  xxx       ",
            "*xxxxxxxxx      o o ",
            "*         _         ",
            "*  P              g ",
            "*xxxxxx    xxxxxxxxx",
            "*     *  / *        ",
            "*  .  *xxxxx   ~~~  ",
            "*,,,,,*    ,,,,~~~,,",
            "xxxxxxxxxxxxxxxxxxxx",
        ],
        &[
            "********************",
            "       b           *",
            "                   *",
            "   xxxx     O      *",
            "          xxxx     *",
            "  q               S*",
            "xxxxxx   xxxxxxxxxx*",
            "     d   =         *",
            "     d   =   F     *",
            "xxxxxxxxx=   xxxxxx*",
            "         =         *",
            "  e      =   &&&   *",
            "       h      ~~~  *",
            "  r    xxxx   ~~~  *",
            "xxxxxxxxxxxxxxxxxxxx",
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::TileGrid;
    use crate::sim::world::Phase;

    fn config() -> GameConfig {
        let mut cfg = GameConfig::from_toml_str("").expect("defaults");
        cfg.seed = Some(11);
        cfg
    }

    fn region(rows: &[&str]) -> String {
        make_embedded("Test", &[rows])
    }

    fn kind_at(grid: &TileGrid, r: i32, c: i32) -> Option<TileKind> {
        grid.get(r, c).map(|t| t.kind)
    }

    #[test]
    fn embedded_world_loads() {
        let w = default_world(&config()).expect("embedded world");
        assert_eq!(w.name, "Shallow Caves");
        assert_eq!((w.region_rows, w.region_cols), (1, 2));
        assert_eq!(w.active, (0, 0));
        assert_eq!((w.player.entity.x, w.player.entity.y), (48.0, 144.0));
        assert_eq!(w.phase, Phase::Playing);
        assert!(w.regions.iter().all(|r| !r.objects.is_empty()));
    }

    #[test]
    fn top_variants_follow_the_cell_above() {
        let w = load_world(&region(&["", " *", " *", " x", " x", "P"]), &config()).expect("world");
        let g = w.grid();
        assert_eq!(kind_at(g, 1, 1), Some(TileKind::WallTop));
        assert_eq!(kind_at(g, 2, 1), Some(TileKind::Wall));
        assert_eq!(kind_at(g, 3, 1), Some(TileKind::Ground));
        assert_eq!(kind_at(g, 4, 1), Some(TileKind::Ground));
    }

    #[test]
    fn water_surface_only_on_top_row() {
        let w = load_world(&region(&["P", "", " ~~", " ~~"]), &config()).expect("world");
        let surfaces: Vec<_> = w.region().objects.iter()
            .filter(|e| e.kind() == Kind::WaterSurface)
            .map(|e| (e.y, e.x))
            .collect();
        assert_eq!(surfaces, vec![(32.0, 16.0), (32.0, 32.0)]);
        assert_eq!(kind_at(w.grid(), 3, 1), Some(TileKind::Water));
    }

    #[test]
    fn entities_and_start_across_regions() {
        let left: &[&str] = &["o"];
        let right: &[&str] = &["", " P", "  s"];
        let mut text = make_embedded("Two", &[left, right]);
        text.push('\n');
        text.push_str(&make_embedded("", &[&["g"], &[]]).replace("# \n", ""));
        let w = load_world(&text, &config()).expect("world");
        assert_eq!((w.region_rows, w.region_cols), (2, 2));
        assert_eq!(w.active, (0, 1));
        assert_eq!(w.respawn.region, (0, 1));
        assert_eq!(w.region_at(0, 0).map(|r| r.objects.len()), Some(1));
        assert_eq!(w.region_at(0, 1).map(|r| r.objects.len()), Some(1));
        assert_eq!(w.region_at(1, 0).map(|r| r.objects.len()), Some(1));
        assert_eq!(w.region_at(1, 1).map(|r| r.objects.len()), Some(0));
    }

    #[test]
    fn drop_spawner_hangs_from_the_ceiling() {
        let w = load_world(&region(&["****", " `P"]), &config()).expect("world");
        let spawner = w.region().objects.iter().find(|e| e.kind() == Kind::DropSpawner);
        assert_eq!(spawner.map(|e| e.y), Some(16.0 - 6.0 - 1.0));
    }

    #[test]
    fn first_comment_names_the_world() {
        let text = format!("# Deep\n# second comment\n{}", region(&["P"]).replace("# Test\n", ""));
        assert_eq!(parse_world(&text).map(|d| d.name), Ok("Deep".to_string()));
        let unnamed = region(&["P"]).replace("# Test\n", "");
        assert_eq!(parse_world(&unnamed).map(|d| d.name), Ok("Untitled".to_string()));
    }

    #[test]
    fn malformed_files_are_rejected() {
        assert_eq!(parse_world("# only a name\n").map(|_| ()), Err(LevelError::Empty));

        let short = region(&["P"]).lines().take(10).collect::<Vec<_>>().join("\n");
        assert_eq!(
            parse_world(&short).map(|_| ()),
            Err(LevelError::RegionHeight { region_row: 0, lines: 9 })
        );

        let ragged = region(&["P"]).replace("# Test\n", "").replacen("\n", "x\n", 3);
        assert!(matches!(parse_world(&ragged), Err(LevelError::RaggedRow { found: 21, .. })));

        assert_eq!(parse_world(&region(&["o"])).map(|_| ()), Err(LevelError::MissingStart));

        assert_eq!(
            parse_world(&region(&["P", "P"])).map(|_| ()),
            Err(LevelError::DuplicateStart { line: 3 })
        );
    }

    #[test]
    fn fake_tiles_and_tools_are_placeable() {
        let w = load_world(&region(&["+X", "HTP"]), &config()).expect("world");
        assert_eq!(kind_at(w.grid(), 0, 0), Some(TileKind::FakeWall));
        assert_eq!(kind_at(w.grid(), 0, 1), Some(TileKind::FakeGround));
        assert!(!w.grid().blocks_anything(0, 0));
        assert!(!w.grid().blocks_anything(0, 1));
        let kinds: Vec<Kind> = w.region().objects.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![Kind::LadderPart, Kind::Pick]);
    }

    #[test]
    fn errors_name_the_offending_line() {
        let e = LevelError::RaggedRow { line: 4, expected: 20, found: 21 };
        assert_eq!(e.to_string(), "line 4: expected 20 columns, found 21");
        let e = LevelError::RegionHeight { region_row: 1, lines: 9 };
        assert_eq!(e.to_string(), "region row 1: expected 15 lines, found 9");
    }
}
