//! Octant shadow-casting field of view for the hero.
//! This module exists to keep the stage's visible and explored flags current.
//! It does not own monster sight, which uses per-query lines instead.

use crate::state::Stage;
use crate::types::Pos;

/// An occluded interval of an octant, in slope units normalized to [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
struct Shadow {
    start: f64,
    end: f64,
}

impl Shadow {
    /// The interval a tile at (row, col) occludes in rows behind it. The top
    /// edge of the shadow starts a row late so walls stay visible along their
    /// own face.
    fn project(row: i32, col: i32) -> Shadow {
        let top_left = col as f64 / (row as f64 + 2.0);
        let bottom_right = (col as f64 + 1.0) / (row as f64 + 1.0);
        Shadow { start: top_left, end: bottom_right }
    }

    fn contains(&self, other: &Shadow) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

/// The accumulated shadows of one octant sweep, kept sorted and disjoint.
#[derive(Default)]
struct ShadowLine {
    shadows: Vec<Shadow>,
}

impl ShadowLine {
    fn is_in_shadow(&self, projection: &Shadow) -> bool {
        self.shadows.iter().any(|shadow| shadow.contains(projection))
    }

    /// Inserts a new shadow, merging with every neighbor it touches. A wide
    /// shadow can swallow several existing intervals at once.
    fn add(&mut self, shadow: Shadow) {
        let index = self
            .shadows
            .partition_point(|existing| existing.start < shadow.start);

        let merged = if index > 0 && self.shadows[index - 1].end >= shadow.start {
            self.shadows[index - 1].end = self.shadows[index - 1].end.max(shadow.end);
            index - 1
        } else {
            self.shadows.insert(index, shadow);
            index
        };

        // Absorb every following interval the merged shadow now reaches.
        while merged + 1 < self.shadows.len()
            && self.shadows[merged + 1].start <= self.shadows[merged].end
        {
            self.shadows[merged].end = self.shadows[merged].end.max(self.shadows[merged + 1].end);
            self.shadows.remove(merged + 1);
        }
    }

    fn is_full(&self) -> bool {
        self.shadows.len() == 1 && self.shadows[0].start <= 0.0 && self.shadows[0].end >= 1.0
    }
}

/// Maps octant-local (row, col) onto a stage offset from the origin.
fn transform_octant(row: i32, col: i32, octant: usize) -> (i32, i32) {
    match octant {
        0 => (-row, col),
        1 => (-col, row),
        2 => (col, row),
        3 => (row, col),
        4 => (row, -col),
        5 => (col, -row),
        6 => (-col, -row),
        7 => (-row, -col),
        _ => unreachable!("octants are 0..8"),
    }
}

/// Recomputes visibility out to `max_distance` around `origin`. Returns the
/// number of tiles explored for the first time by this refresh.
pub fn refresh(stage: &mut Stage, origin: Pos, max_distance: u32) -> u32 {
    stage.clear_visible();
    let mut newly_explored = 0u32;
    if stage.mark_visible(origin) {
        newly_explored += 1;
    }
    for octant in 0..8 {
        newly_explored += refresh_octant(stage, origin, octant, max_distance as i32);
    }
    newly_explored
}

fn refresh_octant(stage: &mut Stage, origin: Pos, octant: usize, max_distance: i32) -> u32 {
    let mut line = ShadowLine::default();
    let mut newly_explored = 0u32;

    for row in 1..=max_distance {
        // Once the line is a single full shadow, everything behind is hidden.
        if line.is_full() {
            break;
        }
        let (dy, dx) = transform_octant(row, 0, octant);
        if !stage.in_bounds(origin.step(dy, dx)) {
            break;
        }
        for col in 0..=row {
            let (dy, dx) = transform_octant(row, col, octant);
            let pos = origin.step(dy, dx);
            if !stage.in_bounds(pos) {
                break;
            }
            let projection = Shadow::project(row, col);
            if !line.is_in_shadow(&projection) {
                if stage.mark_visible(pos) {
                    newly_explored += 1;
                }
                if !stage.is_transparent(pos) {
                    line.add(projection);
                    if line.is_full() {
                        break;
                    }
                }
            }
        }
    }
    newly_explored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind;

    fn p(y: i32, x: i32) -> Pos {
        Pos { y, x }
    }

    #[test]
    fn shadow_line_merges_touching_intervals() {
        let mut line = ShadowLine::default();
        line.add(Shadow { start: 0.0, end: 0.3 });
        line.add(Shadow { start: 0.6, end: 1.0 });
        assert_eq!(line.shadows.len(), 2);
        assert!(!line.is_full());
        line.add(Shadow { start: 0.2, end: 0.7 });
        assert_eq!(line.shadows.len(), 1);
        assert!(line.is_full());
    }

    #[test]
    fn shadow_line_absorbs_every_interval_a_wide_insert_reaches() {
        let mut line = ShadowLine::default();
        line.add(Shadow { start: 0.0, end: 0.3 });
        line.add(Shadow { start: 0.35, end: 0.4 });
        line.add(Shadow { start: 0.25, end: 0.5 });
        assert_eq!(line.shadows, vec![Shadow { start: 0.0, end: 0.5 }]);
        assert!(line.is_in_shadow(&Shadow { start: 0.42, end: 0.48 }));

        // One insert can span several disjoint intervals at once.
        let mut line = ShadowLine::default();
        line.add(Shadow { start: 0.0, end: 0.1 });
        line.add(Shadow { start: 0.2, end: 0.3 });
        line.add(Shadow { start: 0.4, end: 0.5 });
        line.add(Shadow { start: 0.05, end: 0.45 });
        assert_eq!(line.shadows, vec![Shadow { start: 0.0, end: 0.5 }]);
    }

    #[test]
    fn open_room_is_fully_visible() {
        let mut stage = Stage::new(9, 9);
        refresh(&mut stage, p(4, 4), 10);
        for y in 1..8 {
            for x in 1..8 {
                assert!(stage.is_visible(p(y, x)), "({y},{x}) should be visible");
            }
        }
    }

    #[test]
    fn refresh_counts_each_tile_as_newly_explored_once() {
        let mut stage = Stage::new(9, 9);
        let first = refresh(&mut stage, p(4, 4), 10);
        assert!(first > 0);
        let second = refresh(&mut stage, p(4, 4), 10);
        assert_eq!(second, 0);
    }

    #[test]
    fn a_wall_casts_a_shadow_behind_itself() {
        let mut stage = Stage::new(13, 13);
        stage.set_tile(p(6, 8), TileKind::Wall);
        refresh(&mut stage, p(6, 2), 12);
        assert!(stage.is_visible(p(6, 8)), "the blocking wall itself is lit");
        assert!(!stage.is_visible(p(6, 11)), "tiles behind the wall are dark");
        assert!(stage.is_visible(p(2, 8)), "tiles off the shadow stay lit");
    }

    #[test]
    fn closed_doors_occlude_and_open_doors_do_not() {
        let mut stage = Stage::new(13, 13);
        stage.set_tile(p(6, 6), TileKind::ClosedDoor);
        refresh(&mut stage, p(6, 2), 12);
        assert!(!stage.is_visible(p(6, 10)));
        stage.set_tile(p(6, 6), TileKind::OpenDoor);
        refresh(&mut stage, p(6, 2), 12);
        assert!(stage.is_visible(p(6, 10)));
    }

    #[test]
    fn max_distance_caps_the_lit_area() {
        let mut stage = Stage::new(21, 21);
        refresh(&mut stage, p(10, 10), 4);
        assert!(stage.is_visible(p(10, 14)));
        assert!(!stage.is_visible(p(10, 15)));
        assert!(!stage.is_visible(p(4, 10)));
    }

    #[test]
    fn stale_visibility_is_cleared_on_refresh() {
        let mut stage = Stage::new(21, 21);
        refresh(&mut stage, p(10, 10), 4);
        refresh(&mut stage, p(3, 3), 4);
        assert!(!stage.is_visible(p(10, 14)));
        assert!(stage.is_explored(p(10, 14)), "exploration persists across moves");
        assert!(stage.is_visible(p(3, 5)));
    }
}
