//! Arena: the fixed-size cell grid, collision testing and the line sweep.

use crate::piece::Matrix;
use std::collections::VecDeque;

/// Playfield grid. y=0 is the top row; cells are codes 0 (empty) or 1..=7.
/// Dimensions are fixed at construction; only contents mutate.
#[derive(Debug, Clone)]
pub struct Arena {
    width: usize,
    height: usize,
    /// rows[y][x]; rows[0] is the top. A VecDeque so the sweep can drop a full
    /// row and push a fresh empty one in at the top.
    rows: VecDeque<Vec<u8>>,
}

impl Arena {
    pub fn new(width: u16, height: u16) -> Self {
        let (w, h) = (width as usize, height as usize);
        let rows = (0..h).map(|_| vec![0; w]).collect();
        Self {
            width: w,
            height: h,
            rows,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell code at (x, y); 0 for anything out of range.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> u8 {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(0)
    }

    /// Write a cell code. Out-of-range writes are silently skipped; the merge
    /// path relies on that when an upstream invariant has already been broken.
    #[inline]
    pub fn set_cell(&mut self, x: usize, y: usize, code: u8) {
        if x < self.width && y < self.height {
            self.rows[y][x] = code;
        }
    }

    /// True if `shape` placed with its top-left corner at (x, y) overlaps a
    /// wall, the floor, or an occupied cell. Cells above the top (`ay < 0`)
    /// never collide, so pieces may spawn and rotate partially off-screen.
    pub fn collides(&self, shape: &Matrix, x: i32, y: i32) -> bool {
        for (sy, row) in shape.iter().enumerate() {
            for (sx, &code) in row.iter().enumerate() {
                if code == 0 {
                    continue;
                }
                let ax = x + sx as i32;
                let ay = y + sy as i32;
                if ax < 0 || ax >= self.width as i32 || ay >= self.height as i32 {
                    return true;
                }
                if ay >= 0 && self.rows[ay as usize][ax as usize] != 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Remove every fully occupied row, shifting the rows above it down and
    /// inserting an empty row at the top. Rows are scanned bottom-to-top and an
    /// index is re-examined after a removal (the rows above just shifted into
    /// it). Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0;
        let mut y = self.height;
        while y > 0 {
            y -= 1;
            if self.rows[y].iter().all(|&c| c != 0) {
                self.rows.remove(y);
                self.rows.push_front(vec![0; self.width]);
                cleared += 1;
                y += 1;
            }
        }
        cleared
    }

    /// Empty every cell without touching the allocation or dimensions.
    pub fn reset_all(&mut self) {
        for row in &mut self.rows {
            row.fill(0);
        }
    }
}
