// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! NWG two-sub-step thinning, accelerated by a 512-entry lookup table
//! per sub-step and run row-parallel. Structurally the same
//! connectivity test as [`crate::raster::zhang_suen_thin`] — same `(2,6)`
//! neighbor-count window, same single-transition count, same two
//! direction-dependent conditions — but table-driven instead of
//! re-evaluated per pixel, and iterated to a fixed point rather than
//! run once.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use lazy_static::lazy_static;

use crate::raster::Mask;

/// Builds one sub-step's 512-entry table. Bit 8 of `code` is the
/// center pixel (must be set for deletion to apply at all); bits 0..8
/// are the 8 neighbors in the same clockwise-from-top order the
/// classic thinning test uses.
fn build_lut(step: usize) -> Vec<bool> {
    let mut table = vec![false; 512];
    for (code, slot) in table.iter_mut().enumerate() {
        if code & 0x100 == 0 {
            continue;
        }
        let p: [bool; 8] = core::array::from_fn(|i| (code >> i) & 1 == 1);
        let b = p.iter().filter(|&&v| v).count();
        if !(2..=6).contains(&b) {
            continue;
        }
        let a = p
            .iter()
            .zip(p.iter().cycle().skip(1))
            .filter(|&(&cur, &next)| !cur && next)
            .count();
        if a != 1 {
            continue;
        }
        let (p1, p3, p5, p7) = (p[0], p[2], p[4], p[6]);
        *slot = if step == 0 {
            !(p1 && p3 && p5) && !(p3 && p5 && p7)
        } else {
            !(p1 && p3 && p7) && !(p1 && p5 && p7)
        };
    }
    table
}

lazy_static! {
    static ref LUT_A: Vec<bool> = build_lut(0);
    static ref LUT_B: Vec<bool> = build_lut(1);
}

fn neighbor_code(data: &[u8], width: usize, height: usize, x: usize, y: usize) -> usize {
    let at = |dx: i64, dy: i64| -> usize {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
            0
        } else {
            usize::from(data[ny as usize * width + nx as usize] == 255)
        }
    };
    let center = usize::from(data[y * width + x] == 255);
    (center << 8)
        | at(0, -1)
        | (at(1, -1) << 1)
        | (at(1, 0) << 2)
        | (at(1, 1) << 3)
        | (at(0, 1) << 4)
        | (at(-1, 1) << 5)
        | (at(-1, 0) << 6)
        | (at(-1, -1) << 7)
}

fn thinning_step(data: &[u8], width: usize, height: usize, lut: &[bool]) -> (Vec<u8>, bool) {
    let mut to_clear = vec![false; width * height];

    let compute_row = |y: usize, row: &mut [bool]| {
        for (x, slot) in row.iter_mut().enumerate() {
            if data[y * width + x] == 255 {
                let code = neighbor_code(data, width, height, x, y);
                *slot = lut[code];
            }
        }
    };

    #[cfg(feature = "parallel")]
    {
        to_clear
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| compute_row(y, row));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (y, row) in to_clear.chunks_mut(width).enumerate() {
            compute_row(y, row);
        }
    }

    let mut out = data.to_vec();
    let mut changed = false;
    for (idx, &clear) in to_clear.iter().enumerate() {
        if clear {
            out[idx] = 0;
            changed = true;
        }
    }
    (out, changed)
}

/// Thins `mask` to a one-pixel-wide skeleton, iterating the two
/// sub-steps to a fixed point.
#[must_use]
pub fn nwg_thin(mask: &Mask) -> Mask {
    let width = mask.width();
    let height = mask.height();
    let mut data = mask.data().to_vec();

    loop {
        let (after_a, changed_a) = thinning_step(&data, width, height, &LUT_A);
        data = after_a;
        let (after_b, changed_b) = thinning_step(&data, width, height, &LUT_B);
        data = after_b;
        if !changed_a && !changed_b {
            break;
        }
    }

    Mask::from_data(width, height, data).expect("dimensions preserved")
}

/// Single cleanup pass: a 0-pixel whose four orthogonal neighbors are
/// exactly three set (and whose four diagonal neighbors are all
/// clear) is filled, restoring 4-connectivity the thinning pass
/// sometimes breaks at a missing corner.
#[must_use]
pub fn clean_thinned(mask: &Mask) -> Mask {
    let width = mask.width();
    let height = mask.height();
    let mut out = mask.clone();
    if width < 3 || height < 3 {
        return out;
    }
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if mask.is_set(x as i64, y as i64) {
                continue;
            }
            let count4 = [(0i64, -1i64), (-1, 0), (1, 0), (0, 1)]
                .iter()
                .filter(|&&(dx, dy)| mask.is_set(x as i64 + dx, y as i64 + dy))
                .count();
            let count8 = [(-1i64, -1i64), (1, -1), (-1, 1), (1, 1)]
                .iter()
                .filter(|&&(dx, dy)| mask.is_set(x as i64 + dx, y as i64 + dy))
                .count();
            if count4 == 3 && count8 == 0 {
                out.set(x, y, 255);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thinning_is_idempotent() {
        let mut mask = Mask::filled(7, 7, 0);
        for x in 0..7 {
            mask.set(x, 3, 255);
        }
        for y in 0..7 {
            mask.set(3, y, 255);
        }
        let once = nwg_thin(&mask);
        let twice = nwg_thin(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn thick_block_reduces_to_skeleton() {
        let mut mask = Mask::filled(6, 6, 0);
        for y in 1..5 {
            for x in 1..5 {
                mask.set(x, y, 255);
            }
        }
        let thinned = nwg_thin(&mask);
        assert!(thinned.count_set() < mask.count_set());
        assert!(thinned.count_set() > 0);
    }

    #[test]
    fn clean_thinned_fills_missing_corner() {
        let mut mask = Mask::filled(3, 3, 0);
        mask.set(1, 0, 255);
        mask.set(0, 1, 255);
        mask.set(2, 1, 255);
        mask.set(1, 2, 255);
        let cleaned = clean_thinned(&mask);
        assert!(cleaned.is_set(1, 1));
    }
}
