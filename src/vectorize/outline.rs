// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Outline extraction from a filled mask: per-component Moore-neighbor
//! boundary tracing, then splitting each boundary loop at pixels that
//! touch the image border.
//!
//! Hole hierarchy (the source's CCOMP walk) is not tracked: every
//! component contributes only its outer boundary. The converters that
//! feed `outline_masks` do not produce masks where an interior hole
//! matters for a pen outline, so this is a deliberate simplification,
//! not a missing feature.

use crate::raster::{connected_components, Mask, NEIGHBORS_8};

fn topmost_leftmost(component: &[(usize, usize)]) -> (i64, i64) {
    let &(x, y) = component
        .iter()
        .min_by_key(|&&(x, y)| (y, x))
        .expect("component is non-empty");
    (x as i64, y as i64)
}

/// Moore-neighbor boundary trace starting at `start`, which must be
/// the topmost-then-leftmost pixel of its component (guaranteed to lie
/// on the outer boundary).
fn trace_boundary(mask: &Mask, start: (i64, i64)) -> Vec<(i64, i64)> {
    let mut boundary = vec![start];
    if !NEIGHBORS_8
        .iter()
        .any(|&(dx, dy)| mask.is_set(start.0 + dx, start.1 + dy))
    {
        // Isolated single pixel: its own one-point boundary.
        return boundary;
    }

    let mut current = start;
    let mut backtrack_dir = 4usize; // west: guaranteed background since start is topmost-leftmost.
    let limit = mask.width() * mask.height() * 8 + 8;

    loop {
        let mut advanced = None;
        for step in 0..8 {
            let dir = (backtrack_dir + 1 + step) % 8;
            let (dx, dy) = NEIGHBORS_8[dir];
            let candidate = (current.0 + dx, current.1 + dy);
            if mask.is_set(candidate.0, candidate.1) {
                advanced = Some((candidate, dir));
                break;
            }
        }
        let Some((next, dir)) = advanced else {
            break;
        };
        if next == start && boundary.len() > 1 {
            break;
        }
        boundary.push(next);
        backtrack_dir = (dir + 4) % 8;
        current = next;
        if boundary.len() > limit {
            break;
        }
    }
    boundary
}

/// Splits a closed boundary loop at every pixel touching the image
/// border. No border touches: the whole loop is one closed contour.
/// One or more touches: the loop becomes a cycle of open segments,
/// each anchored at consecutive border touches (the last segment
/// closes back to the first touch), left for the global stitching
/// pass to fuse and re-classify.
fn split_at_border(loop_pts: &[(i64, i64)], mask: &Mask) -> (Vec<Vec<(i64, i64)>>, Vec<Vec<(i64, i64)>>) {
    let border_idxs: Vec<usize> = loop_pts
        .iter()
        .enumerate()
        .filter(|&(_, &(x, y))| mask.on_border(x as usize, y as usize))
        .map(|(i, _)| i)
        .collect();

    if border_idxs.is_empty() {
        return (Vec::new(), vec![loop_pts.to_vec()]);
    }

    let n = loop_pts.len();
    let start = border_idxs[0];
    let rotated: Vec<(i64, i64)> = (0..n).map(|i| loop_pts[(start + i) % n]).collect();
    let mut rel: Vec<usize> = border_idxs.iter().map(|&i| (i + n - start) % n).collect();
    rel.sort_unstable();

    let mut segments = Vec::new();
    for w in 0..rel.len() {
        let a = rel[w];
        let b = if w + 1 < rel.len() { rel[w + 1] } else { n };
        let mut seg: Vec<(i64, i64)> = (a..b).map(|i| rotated[i]).collect();
        seg.push(rotated[b % n]);
        segments.push(seg);
    }
    (segments, Vec::new())
}

/// Extracts polylines and contours from every 8-connected component of
/// `mask`, in integer pixel coordinates.
#[must_use]
pub fn extract_contours_from_filled(mask: &Mask) -> (Vec<Vec<(i64, i64)>>, Vec<Vec<(i64, i64)>>) {
    let mut polylines = Vec::new();
    let mut contours = Vec::new();
    for component in connected_components(mask) {
        if component.len() < 3 {
            continue;
        }
        let start = topmost_leftmost(&component);
        let boundary = trace_boundary(mask, start);
        if boundary.len() < 3 {
            continue;
        }
        let (segs, closed) = split_at_border(&boundary, mask);
        polylines.extend(segs);
        contours.extend(closed);
    }
    (polylines, contours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_square_becomes_one_contour() {
        let mut mask = Mask::filled(10, 10, 0);
        for y in 3..7 {
            for x in 3..7 {
                mask.set(x, y, 255);
            }
        }
        let (polylines, contours) = extract_contours_from_filled(&mask);
        assert!(polylines.is_empty());
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn border_touching_square_becomes_open_segments() {
        let mut mask = Mask::filled(10, 10, 0);
        for y in 0..4 {
            for x in 0..4 {
                mask.set(x, y, 255);
            }
        }
        let (polylines, contours) = extract_contours_from_filled(&mask);
        assert!(contours.is_empty());
        assert!(!polylines.is_empty());
        for seg in &polylines {
            for pair in seg.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                assert!(
                    (x1 - x0).abs() <= 1 && (y1 - y0).abs() <= 1,
                    "segment jumps from {:?} to {:?}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn square_filling_the_whole_mask_has_no_diagonal_closing_jumps() {
        let mut mask = Mask::filled(10, 10, 0);
        for y in 0..10 {
            for x in 0..10 {
                mask.set(x, y, 255);
            }
        }
        let (polylines, contours) = extract_contours_from_filled(&mask);
        assert!(contours.is_empty());
        assert!(!polylines.is_empty());
        for seg in &polylines {
            for pair in seg.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                assert!(
                    (x1 - x0).abs() <= 1 && (y1 - y0).abs() <= 1,
                    "segment jumps from {:?} to {:?}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }
}
