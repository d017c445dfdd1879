/// Region tile grid and its query layer.
///
/// Every query takes signed (row, col) and answers "no" for anything outside
/// the grid, so callers can probe neighbours (`r - 1`, `c + 1`) freely
/// without bounds checks.
///
/// ## Query table
/// ┌────────────────────────┬────────────────────────────────────────────┐
/// │ Query                   │ True when                                   │
/// ├────────────────────────┼────────────────────────────────────────────┤
/// │ is_valid_cell           │ 0 <= r < ROW_COUNT, 0 <= c < COLUMN_COUNT    │
/// │ is_solid(edges)         │ valid, and the tile is solid on ALL edges    │
/// │ is_ladder / is_water    │ valid, and category matches                  │
/// │ is_solid_or_ladder      │ solid from above, or a ladder                │
/// │ is_climbable_ladder     │ ladder AND (shelf left/right OR topmost)     │
/// └────────────────────────┴────────────────────────────────────────────┘

use super::tile::{Category, Solid, Tile, TileKind};

pub const CELL_SIZE: f64 = 16.0;
pub const CELL_HALF: f64 = CELL_SIZE / 2.0;
pub const COLUMN_COUNT: usize = 20;
pub const ROW_COUNT: usize = 15;
pub const REGION_WIDTH: f64 = CELL_SIZE * COLUMN_COUNT as f64;
pub const REGION_HEIGHT: f64 = CELL_SIZE * ROW_COUNT as f64;

/// Rate that behavior timelines are written against. Independent of the
/// configured display rate.
pub const FRAME_RATE: i32 = 30;

/// Milliseconds → whole frames, truncating toward zero.
pub const fn ms_to_frames(ms: i32) -> i32 {
    ms * FRAME_RATE / 1000
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    cells: [[&'static Tile; COLUMN_COUNT]; ROW_COUNT],
}

impl Default for TileGrid {
    fn default() -> Self {
        TileGrid::new()
    }
}

impl TileGrid {
    /// A grid of empty cells.
    pub fn new() -> Self {
        TileGrid { cells: [[TileKind::Empty.tile(); COLUMN_COUNT]; ROW_COUNT] }
    }

    /// Tile at a valid cell, `None` outside the grid.
    #[inline]
    pub fn get(&self, r: i32, c: i32) -> Option<&'static Tile> {
        if is_valid_cell(r, c) {
            Some(self.cells[r as usize][c as usize])
        } else {
            None
        }
    }

    /// Replace a cell (door opening). Out-of-range writes are ignored.
    pub fn set(&mut self, r: i32, c: i32, kind: TileKind) {
        if is_valid_cell(r, c) {
            self.cells[r as usize][c as usize] = kind.tile();
        }
    }

    #[inline]
    pub fn is_solid(&self, r: i32, c: i32, edges: Solid) -> bool {
        self.get(r, c).map_or(false, |t| t.is_solid(edges))
    }

    /// Solid on any edge at all. Used for region-edge passability.
    #[inline]
    pub fn blocks_anything(&self, r: i32, c: i32) -> bool {
        self.get(r, c).map_or(false, |t| t.blocks_anything())
    }

    #[inline]
    pub fn cell_has_category(&self, r: i32, c: i32, category: Category) -> bool {
        self.get(r, c).map_or(false, |t| t.category == category)
    }

    #[inline]
    pub fn is_ladder(&self, r: i32, c: i32) -> bool {
        self.cell_has_category(r, c, Category::Ladder)
    }

    #[inline]
    pub fn is_water(&self, r: i32, c: i32) -> bool {
        self.cell_has_category(r, c, Category::Water)
    }

    /// Floor support for ground-bound walkers.
    #[inline]
    pub fn is_solid_or_ladder(&self, r: i32, c: i32) -> bool {
        self.is_solid(r, c, Solid::TOP) || self.is_ladder(r, c)
    }

    /// A ladder cell an entity can stand on: it has a shelf on either side,
    /// or it is the topmost segment of its ladder.
    pub fn is_climbable_ladder(&self, r: i32, c: i32) -> bool {
        self.is_ladder(r, c)
            && (self.is_solid(r, c - 1, Solid::TOP)
                || self.is_solid(r, c + 1, Solid::TOP)
                || !self.is_ladder(r - 1, c))
    }

    /// Door at (r, c), or immediately left, or immediately right, in that order.
    pub fn find_near_door(&self, r: i32, c: i32) -> Option<(i32, i32)> {
        [c, c - 1, c + 1]
            .into_iter()
            .find(|&cc| self.cell_has_category(r, cc, Category::Door))
            .map(|cc| (r, cc))
    }
}

#[inline]
pub fn is_valid_cell(r: i32, c: i32) -> bool {
    r >= 0 && (r as usize) < ROW_COUNT && c >= 0 && (c as usize) < COLUMN_COUNT
}

/// World position → (row, col). Floors, so positions left of / above the
/// region map to negative (invalid) cells rather than to cell 0.
#[inline]
pub fn cell_at(x: f64, y: f64) -> (i32, i32) {
    ((y / CELL_SIZE).floor() as i32, (x / CELL_SIZE).floor() as i32)
}

/// Build a grid from ASCII rows (test fixtures).
///
/// `#` wall, `=` ladder, `-` stair, `~` water, `d` door, `<` / `>` arrows,
/// anything else empty. Short rows and missing rows are padded with empty.
#[cfg(test)]
pub fn grid_from(rows: &[&str]) -> TileGrid {
    let mut grid = TileGrid::new();
    for (r, row) in rows.iter().enumerate().take(ROW_COUNT) {
        for (c, ch) in row.chars().enumerate().take(COLUMN_COUNT) {
            let kind = match ch {
                '#' => TileKind::Wall,
                '=' => TileKind::Ladder,
                '-' => TileKind::Stair,
                '~' => TileKind::Water,
                'd' => TileKind::Door,
                '<' => TileKind::ArrowLeft,
                '>' => TileKind::ArrowRight,
                _ => TileKind::Empty,
            };
            grid.set(r as i32, c as i32, kind);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_REQUESTS: [Solid; 6] = [
        Solid::TOP, Solid::BOTTOM, Solid::LEFT, Solid::RIGHT, Solid::ALL, Solid::NONE,
    ];

    #[test]
    fn valid_cell_bounds() {
        assert!(is_valid_cell(0, 0));
        assert!(is_valid_cell(14, 19));
        assert!(!is_valid_cell(15, 0));
        assert!(!is_valid_cell(0, 20));
        assert!(!is_valid_cell(-1, 3));
        assert!(!is_valid_cell(3, -1));
    }

    #[test]
    fn non_solid_cells_are_never_solid() {
        let g = grid_from(&["=~ d", "    "]);
        for (r, c) in [(0, 0), (0, 1), (0, 2), (1, 0), (1, 3)] {
            for req in ALL_REQUESTS {
                assert!(!g.is_solid(r, c, req), "({r},{c}) {req:?}");
            }
        }
        assert!(g.is_solid(0, 3, Solid::ALL));
    }

    #[test]
    fn out_of_range_predicates_are_false() {
        let mut g = TileGrid::new();
        for r in 0..ROW_COUNT as i32 {
            for c in 0..COLUMN_COUNT as i32 {
                g.set(r, c, TileKind::Wall);
            }
        }
        for (r, c) in [(-1, 0), (0, -1), (15, 0), (0, 20), (-5, 40)] {
            for req in ALL_REQUESTS {
                assert!(!g.is_solid(r, c, req));
            }
            assert!(!g.is_ladder(r, c));
            assert!(!g.is_water(r, c));
            assert!(!g.is_climbable_ladder(r, c));
            assert!(!g.cell_has_category(r, c, Category::Wall));
            assert!(!g.blocks_anything(r, c));
        }
    }

    #[test]
    fn solid_requires_all_requested_edges() {
        let g = grid_from(&["-<>"]);
        assert!(g.is_solid(0, 0, Solid::TOP));
        assert!(!g.is_solid(0, 0, Solid::TOP | Solid::LEFT));
        assert!(g.is_solid(0, 1, Solid::LEFT));
        assert!(!g.is_solid(0, 1, Solid::RIGHT));
        assert!(g.is_solid(0, 2, Solid::RIGHT));
        assert!(!g.is_solid(0, 2, Solid::LEFT | Solid::RIGHT));
    }

    #[test]
    fn topmost_ladder_segment_is_climbable() {
        let g = grid_from(&[
            "     ",
            "  =  ",
            "  =  ",
            " #=  ",
            "  =  ",
        ]);
        assert!(g.is_climbable_ladder(1, 2));  // top segment
        assert!(!g.is_climbable_ladder(2, 2)); // mid, no shelf
        assert!(g.is_climbable_ladder(3, 2));  // shelf on the left
        assert!(!g.is_climbable_ladder(4, 2));
        assert!(!g.is_climbable_ladder(0, 2)); // not a ladder at all
    }

    #[test]
    fn door_search_order() {
        let g = grid_from(&["d d", " d "]);
        assert_eq!(g.find_near_door(0, 1), Some((0, 0)));
        assert_eq!(g.find_near_door(1, 1), Some((1, 1)));
        assert_eq!(g.find_near_door(1, 3), None);
        assert_eq!(g.find_near_door(0, 3), Some((0, 2)));
    }

    #[test]
    fn ms_to_frames_truncates() {
        assert_eq!(ms_to_frames(1000), 30);
        assert_eq!(ms_to_frames(170), 5);
        assert_eq!(ms_to_frames(33), 0);
        assert_eq!(ms_to_frames(-2000), -60);
    }

    #[test]
    fn cell_at_floors_negative_positions() {
        assert_eq!(cell_at(0.0, 0.0), (0, 0));
        assert_eq!(cell_at(31.9, 16.0), (1, 1));
        assert_eq!(cell_at(-0.5, 8.0), (0, -1));
    }
}
