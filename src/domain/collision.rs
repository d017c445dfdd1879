/// Entity movement against the tile grid.
///
/// `move_body` is the single movement primitive for every non-player mover:
///
///   1. Apply the whole displacement.
///   2. If the entity's new cell is fully solid, undo everything → blocked XY.
///   3. Otherwise test each axis on its own, against the edge of the cell the
///      body centre now occupies, looking only at the side it moves toward.
///
/// A blocked axis is put back to where it started; the other axis keeps its
/// motion. Callers read the result and react (usually by reversing).

use super::entity::{Borders, Entity};
use super::grid::{TileGrid, CELL_HALF, CELL_SIZE, REGION_HEIGHT, REGION_WIDTH};
use super::tile::Solid;

/// Which axes could not move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Blocked(u8);

impl Blocked {
    pub const NONE: Blocked = Blocked(0);
    pub const X: Blocked = Blocked(0b01);
    pub const Y: Blocked = Blocked(0b10);
    pub const XY: Blocked = Blocked(0b11);

    #[inline]
    pub fn x(self) -> bool {
        self.0 & Self::X.0 != 0
    }

    #[inline]
    pub fn y(self) -> bool {
        self.0 & Self::Y.0 != 0
    }

    #[inline]
    pub fn any(self) -> bool {
        self.0 != 0
    }
}

impl std::ops::BitOrAssign for Blocked {
    fn bitor_assign(&mut self, rhs: Blocked) {
        self.0 |= rhs.0;
    }
}

/// Move `e` by (dx, dy) world units. With `check_floor`, horizontal moves
/// that would step off a ledge are refused.
pub fn move_body(e: &mut Entity, grid: &TileGrid, dx: f64, dy: f64, check_floor: bool) -> Blocked {
    let (x0, y0) = (e.x, e.y);
    e.x += dx;
    e.y += dy;

    let (r, c) = e.cell();
    if grid.is_solid(r, c, Solid::ALL) {
        e.x = x0;
        e.y = y0;
        return Blocked::XY;
    }

    let cell = Borders::of_cell(r, c);
    let body = e.body();
    let mut result = Blocked::NONE;

    if dx > 0.0 && body.right > cell.right {
        if grid.is_solid(r, c + 1, Solid::LEFT)
            || body.right > REGION_WIDTH
            || (check_floor && !grid.is_solid_or_ladder(r + 1, c + 1))
        {
            e.x = x0;
            result |= Blocked::X;
        }
    } else if dx < 0.0 && body.left < cell.left {
        if grid.is_solid(r, c - 1, Solid::RIGHT)
            || body.left < 0.0
            || (check_floor && !grid.is_solid_or_ladder(r + 1, c - 1))
        {
            e.x = x0;
            result |= Blocked::X;
        }
    }

    if dy > 0.0 && body.bottom > cell.bottom {
        if grid.is_solid(r + 1, c, Solid::TOP) || body.bottom > REGION_HEIGHT {
            e.y = y0;
            result |= Blocked::Y;
        }
    } else if dy < 0.0 && body.top < cell.top {
        if grid.is_solid(r - 1, c, Solid::BOTTOM) || body.top < 0.0 {
            e.y = y0;
            result |= Blocked::Y;
        }
    }

    result
}

/// Can `source` see `target`? The target must overlap the source's
/// horizontal band (one cell tall, centred on the source's mid-line), lie on
/// the side the source faces, and no cell solid on both vertical edges may
/// sit between them. Samples one ray along the band, stepping a cell at a
/// time from half a cell past the nearer x.
pub fn is_visible(source: &Entity, target: &Entity, grid: &TileGrid) -> bool {
    let band = source.y + CELL_HALF;
    if !(target.y + CELL_SIZE > band && target.y < band) {
        return false;
    }

    let facing_left = source.anim.flip;
    let (x1, x2) = if target.x < source.x && facing_left {
        (target.x, source.x)
    } else if target.x > source.x && !facing_left {
        (source.x, target.x)
    } else {
        return false;
    };

    let r = (band / CELL_SIZE).floor() as i32;
    let mut x = x1 + CELL_HALF;
    while x < x2 {
        let c = (x / CELL_SIZE).floor() as i32;
        if grid.is_solid(r, c, Solid::LEFT | Solid::RIGHT) {
            return false;
        }
        x += CELL_SIZE;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::archetype::Kind;
    use crate::domain::grid::grid_from;

    fn scorpion_flush_right(row: i32, col: i32) -> Entity {
        let mut e = Entity::new(Kind::Scorpion.archetype(), row, col);
        // body spans x+3 .. x+13; put its right edge on the cell boundary
        e.x += 3.0;
        e
    }

    #[test]
    fn walled_in_entity_is_blocked_horizontally() {
        let g = grid_from(&[
            "",
            " # # ",
            " ### ",
        ]);
        let mut e = scorpion_flush_right(1, 2);
        let x0 = e.x;
        let m = move_body(&mut e, &g, 1.0, 0.0, true);
        assert!(m.x());
        assert!(!m.y());
        assert_eq!(e.x, x0);
    }

    #[test]
    fn repeated_blocked_moves_do_not_drift() {
        let g = grid_from(&["", "  #", "###"]);
        let mut e = scorpion_flush_right(1, 1);
        let start = (e.x, e.y);
        for _ in 0..20 {
            assert!(move_body(&mut e, &g, 0.7, 0.0, false).x());
        }
        assert_eq!((e.x, e.y), start);
    }

    #[test]
    fn ledge_stops_floor_checked_walker_only() {
        let g = grid_from(&["", "", "### "]);
        let mut walker = scorpion_flush_right(1, 2);
        assert_eq!(move_body(&mut walker, &g, 1.0, 0.0, true), Blocked::X);

        let mut flyer = scorpion_flush_right(1, 2);
        assert_eq!(move_body(&mut flyer, &g, 1.0, 0.0, false), Blocked::NONE);
        assert_eq!(flyer.x, 36.0);
    }

    #[test]
    fn ladder_counts_as_floor_support() {
        let g = grid_from(&["", "", "##="]);
        let mut e = scorpion_flush_right(1, 1);
        assert_eq!(move_body(&mut e, &g, 1.0, 0.0, true), Blocked::NONE);
    }

    #[test]
    fn landing_blocks_only_the_vertical_axis() {
        let g = grid_from(&["", "", "####"]);
        let mut e = Entity::new(Kind::Drop.archetype(), 1, 1);
        e.y += 6.0; // body bottom (y + 10) on the cell boundary
        let m = move_body(&mut e, &g, 0.5, 1.5, false);
        assert_eq!(m, Blocked::Y);
        assert_eq!(e.y, 22.0);
        assert_eq!(e.x, 16.5);
    }

    #[test]
    fn stepping_into_a_solid_cell_is_fully_rejected() {
        let g = grid_from(&["", " #"]);
        let mut e = Entity::new(Kind::IceShot.archetype(), 1, 0);
        let m = move_body(&mut e, &g, 10.0, 0.0, false);
        assert_eq!(m, Blocked::XY);
        assert_eq!((e.x, e.y), (0.0, 16.0));
    }

    #[test]
    fn region_edges_block() {
        let g = grid_from(&[]);
        let mut e = Entity::new(Kind::IceShot.archetype(), 3, 0);
        assert!(move_body(&mut e, &g, -1.0, 0.0, false).x());
        let mut e = Entity::new(Kind::IceShot.archetype(), 0, 19);
        assert!(move_body(&mut e, &g, 1.0, 0.0, false).x());
    }

    #[test]
    fn arrows_block_one_side() {
        // '<' is solid on its left edge: entering from the left is refused.
        let g = grid_from(&["", " <"]);
        let mut e = Entity::new(Kind::IceShot.archetype(), 1, 0);
        assert!(move_body(&mut e, &g, 1.0, 0.0, false).x());
        // '>' lets a rightward mover through.
        let g = grid_from(&["", " >"]);
        let mut e = Entity::new(Kind::IceShot.archetype(), 1, 0);
        assert!(!move_body(&mut e, &g, 1.0, 0.0, false).any());
    }

    #[test]
    fn visibility_needs_facing_and_clear_line() {
        let g = grid_from(&["", "", "     #     "]);
        let mut ghost = Entity::new(Kind::Ghost.archetype(), 2, 2);
        let mut target = Entity::new(Kind::Player.archetype(), 2, 4);

        ghost.set_speed(1.0, 0.0);
        assert!(is_visible(&ghost, &target, &g));

        ghost.set_speed(-1.0, 0.0);
        assert!(!is_visible(&ghost, &target, &g));

        ghost.set_speed(1.0, 0.0);
        target.x = 16.0 * 8.0; // wall at column 5 in between
        assert!(!is_visible(&ghost, &target, &g));

        target.x = 16.0 * 4.0;
        target.y = 16.0 * 3.0; // one row below the band
        assert!(!is_visible(&ghost, &target, &g));
    }
}
