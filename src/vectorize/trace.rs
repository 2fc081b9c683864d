// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! 8-neighborhood polyline tracing over a thinned, cleaned mask.
//!
//! At each step the tracer extends the path by the first unvisited lit
//! neighbor in a priority order keyed on the heading used to reach the
//! current pixel: continuing straight ranks first, then the
//! neighboring headings by increasing angular turn. This is the same
//! "priority table keyed by last direction" shape the source's 17
//! precomputed orderings implement; here the table is generated once
//! from the turn angle rather than transcribed literally (see the
//! crate's design notes for why).

use std::collections::HashSet;

use crate::geom::{Point, Polyline};
use crate::raster::{Mask, NEIGHBORS_8};

/// Priority order of neighbor indices (into [`NEIGHBORS_8`]) to try
/// when the last step used heading `last_dir`, ranked by increasing
/// angular turn from continuing straight. `None` (no heading yet,
/// i.e. the first step from a seed) uses the natural table order.
fn priority_order(last_dir: Option<usize>) -> [usize; 8] {
    let Some(last) = last_dir else {
        return [0, 1, 2, 3, 4, 5, 6, 7];
    };
    let mut order = [0usize; 8];
    for (slot, turn) in order.iter_mut().zip(0..8usize) {
        // Alternate +turn/-turn around the straight-ahead heading so
        // ties (equal angular distance) favor one consistent winding.
        let offset = if turn % 2 == 0 {
            turn / 2
        } else {
            8 - turn.div_ceil(2)
        };
        *slot = (last + offset) % 8;
    }
    order
}

fn heading(from: (i64, i64), to: (i64, i64)) -> Option<usize> {
    let delta = (to.0 - from.0, to.1 - from.1);
    NEIGHBORS_8.iter().position(|&offset| offset == delta)
}

fn grow(
    path: &mut Vec<(i64, i64)>,
    mask: &Mask,
    visited: &mut HashSet<(i64, i64)>,
    at_front: bool,
) {
    loop {
        let (current, prev) = if at_front {
            (path[0], path.get(1).copied())
        } else {
            let last = path.len() - 1;
            (path[last], if last > 0 { Some(path[last - 1]) } else { None })
        };
        let last_dir = prev.and_then(|p| {
            if at_front {
                heading(current, p).map(|d| (d + 4) % 8)
            } else {
                heading(p, current)
            }
        });

        let mut advanced = false;
        for &idx in &priority_order(last_dir) {
            let (dx, dy) = NEIGHBORS_8[idx];
            let candidate = (current.0 + dx, current.1 + dy);
            if mask.is_set(candidate.0, candidate.1) && !visited.contains(&candidate) {
                visited.insert(candidate);
                if at_front {
                    path.insert(0, candidate);
                } else {
                    path.push(candidate);
                }
                advanced = true;
                break;
            }
        }
        if !advanced {
            break;
        }
    }
}

/// Re-attaches a single already-visited neighbor at `end` (front or
/// back of `path`) if that neighbor lies at least 4 hops away from
/// `end` along the path itself — closing small loops without folding
/// degenerate short stubs back on themselves. Preserves the source's
/// literal (if unexplained) `<4` cutoff; see the crate's design notes.
fn try_reattach_end(path: &mut Vec<(i64, i64)>, mask: &Mask, at_front: bool) {
    let end = if at_front { path[0] } else { path[path.len() - 1] };
    for &(dx, dy) in &NEIGHBORS_8 {
        let candidate = (end.0 + dx, end.1 + dy);
        if !mask.is_set(candidate.0, candidate.1) {
            continue;
        }
        if let Some(pos) = path.iter().position(|&p| p == candidate) {
            let hops_from_end = if at_front { pos } else { path.len() - 1 - pos };
            if hops_from_end >= 4 {
                if at_front {
                    path.insert(0, candidate);
                } else {
                    path.push(candidate);
                }
                return;
            }
        }
    }
}

/// Traces every lit pixel of `mask` into a set of integer-coordinate
/// polylines. Every set pixel appears in exactly one returned path.
#[must_use]
pub fn trace_polylines(mask: &Mask) -> Vec<Vec<(i64, i64)>> {
    let width = mask.width();
    let height = mask.height();
    let mut visited = HashSet::new();
    let mut paths = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let seed = (x as i64, y as i64);
            if !mask.is_set(seed.0, seed.1) || visited.contains(&seed) {
                continue;
            }
            visited.insert(seed);
            let mut path = vec![seed];
            grow(&mut path, mask, &mut visited, false);
            grow(&mut path, mask, &mut visited, true);

            if path.len() >= 4 {
                try_reattach_end(&mut path, mask, false);
                try_reattach_end(&mut path, mask, true);
            }
            if path.len() == 1 {
                path.push(seed);
            }
            paths.push(path);
        }
    }
    paths
}

/// Converts integer pixel-coordinate paths into float [`Polyline`]s.
#[must_use]
pub fn paths_to_polylines(paths: Vec<Vec<(i64, i64)>>) -> Vec<Polyline> {
    paths
        .into_iter()
        .map(|path| {
            let points = path
                .into_iter()
                .map(|(x, y)| Point::from_pixel(x, y))
                .collect();
            Polyline::from_vec_unchecked(points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traces_a_straight_line() {
        let mut mask = Mask::filled(5, 1, 0);
        for x in 0..5 {
            mask.set(x, 0, 255);
        }
        let paths = trace_polylines(&mask);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 5);
    }

    #[test]
    fn covers_every_set_pixel_exactly_once() {
        let mut mask = Mask::filled(6, 6, 0);
        for x in 0..6 {
            mask.set(x, 2, 255);
        }
        for y in 0..6 {
            mask.set(3, y, 255);
        }
        let paths = trace_polylines(&mask);
        let covered: HashSet<(i64, i64)> = paths.into_iter().flatten().collect();
        assert_eq!(covered.len(), mask.count_set());
    }

    #[test]
    fn cross_shape_traces_into_one_five_pixel_polyline() {
        let mut mask = Mask::filled(3, 3, 0);
        mask.set(1, 0, 255);
        mask.set(0, 1, 255);
        mask.set(1, 1, 255);
        mask.set(2, 1, 255);
        mask.set(1, 2, 255);
        let paths = trace_polylines(&mask);
        let total: usize = paths.iter().map(Vec::len).sum();
        assert_eq!(total, 5);
    }
}
