//! Bresenham line rasterization between two stage cells.
//! This module exists so targeting and visibility checks agree on which cells
//! a sight line crosses. It does not own opacity or occupancy rules.

use crate::types::Pos;

/// The ordered cells Bresenham's algorithm visits from `from` to `to`,
/// inclusive of both endpoints. Always terminates in O(max(|dy|, |dx|)).
pub fn line(from: Pos, to: Pos) -> Vec<Pos> {
    // Normalize to a shallow, left-to-right walk; undo both swaps on output.
    let steep = (to.y - from.y).abs() > (to.x - from.x).abs();
    let (mut x0, mut y0, mut x1, mut y1) = if steep {
        (from.y, from.x, to.y, to.x)
    } else {
        (from.x, from.y, to.x, to.y)
    };
    let mut reversed = false;
    if x0 > x1 {
        (x0, x1) = (x1, x0);
        (y0, y1) = (y1, y0);
        reversed = true;
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let y_step = if y0 < y1 { 1 } else { -1 };
    let mut error = dx / 2;
    let mut y = y0;

    let mut cells = Vec::with_capacity((dx + 1) as usize);
    for x in x0..=x1 {
        cells.push(if steep { Pos { y: x, x: y } } else { Pos { y, x } });
        error -= dy;
        if error < 0 {
            y += y_step;
            error += dx;
        }
    }
    if reversed {
        cells.reverse();
    }
    cells
}
