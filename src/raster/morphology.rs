// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Binary morphology: structuring elements, erode/dilate/open/close,
//! connected-component labeling, and the ring-kernel neighbor-count
//! convolution the `LineAndFill` converter uses to classify pixels.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::image::Mask;

/// Shape of a structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    Elliptical,
    Rect,
}

/// Builds the `(2r+1)×(2r+1)` offset list for a structuring element of
/// the given radius and shape.
#[must_use]
pub fn kernel_offsets(radius: i64, shape: KernelShape) -> Vec<(i64, i64)> {
    if radius <= 0 {
        return vec![(0, 0)];
    }
    let mut offsets = Vec::new();
    let r2 = (radius * radius) as f64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let inside = match shape {
                KernelShape::Rect => true,
                KernelShape::Elliptical => (dx * dx + dy * dy) as f64 <= r2,
            };
            if inside {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

#[must_use]
pub fn dilate(mask: &Mask, radius: i64, shape: KernelShape) -> Mask {
    if radius <= 0 {
        return mask.clone();
    }
    let offsets = kernel_offsets(radius, shape);
    let mut out = Mask::filled(mask.width(), mask.height(), 0);
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let hit = offsets
                .iter()
                .any(|&(dx, dy)| mask.is_set(x as i64 + dx, y as i64 + dy));
            if hit {
                out.set(x, y, 255);
            }
        }
    }
    out
}

#[must_use]
pub fn erode(mask: &Mask, radius: i64, shape: KernelShape) -> Mask {
    if radius <= 0 {
        return mask.clone();
    }
    let offsets = kernel_offsets(radius, shape);
    let mut out = Mask::filled(mask.width(), mask.height(), 0);
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let all = offsets
                .iter()
                .all(|&(dx, dy)| mask.is_set(x as i64 + dx, y as i64 + dy));
            if all {
                out.set(x, y, 255);
            }
        }
    }
    out
}

#[must_use]
pub fn open(mask: &Mask, radius: i64, shape: KernelShape) -> Mask {
    dilate(&erode(mask, radius, shape), radius, shape)
}

#[must_use]
pub fn close(mask: &Mask, radius: i64, shape: KernelShape) -> Mask {
    erode(&dilate(mask, radius, shape), radius, shape)
}

/// 8-connected neighbor offsets, used by component labeling and by
/// the tracer.
pub const NEIGHBORS_8: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Labels 8-connected components of set pixels. Returns, for each
/// component, its pixel coordinates.
#[must_use]
pub fn connected_components(mask: &Mask) -> Vec<Vec<(usize, usize)>> {
    let width = mask.width();
    let height = mask.height();
    let mut visited = vec![false; width * height];
    let mut components = Vec::new();

    for y0 in 0..height {
        for x0 in 0..width {
            let idx0 = y0 * width + x0;
            if visited[idx0] || !mask.is_set(x0 as i64, y0 as i64) {
                continue;
            }
            let mut stack = vec![(x0, y0)];
            visited[idx0] = true;
            let mut component = Vec::new();
            while let Some((x, y)) = stack.pop() {
                component.push((x, y));
                for &(dx, dy) in &NEIGHBORS_8 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                        continue;
                    }
                    let nidx = ny as usize * width + nx as usize;
                    if !visited[nidx] && mask.is_set(nx, ny) {
                        visited[nidx] = true;
                        stack.push((nx as usize, ny as usize));
                    }
                }
            }
            components.push(component);
        }
    }
    components
}

/// Clears components with area below `min_size`.
#[must_use]
pub fn remove_small_components(mask: &Mask, min_size: usize) -> Mask {
    let mut out = mask.clone();
    for component in connected_components(mask) {
        if component.len() < min_size {
            for (x, y) in component {
                out.set(x, y, 0);
            }
        }
    }
    out
}

/// Counts set neighbors in a `(2r+1)×(2r+1)` ring (excluding the
/// center) for every pixel, row-parallel when the `parallel` feature
/// is enabled — each output row only depends on input rows within
/// `radius`, a disjoint write target.
#[must_use]
pub fn ring_neighbor_counts(mask: &Mask, radius: i64) -> Vec<u32> {
    let width = mask.width();
    let height = mask.height();
    let offsets: Vec<(i64, i64)> = kernel_offsets(radius, KernelShape::Rect)
        .into_iter()
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .collect();

    let compute_row = |y: usize, row: &mut [u32]| {
        for (x, cell) in row.iter_mut().enumerate() {
            let mut count = 0u32;
            for &(dx, dy) in &offsets {
                if mask.is_set(x as i64 + dx, y as i64 + dy) {
                    count += 1;
                }
            }
            *cell = count;
        }
    };

    let mut counts = vec![0u32; width * height];

    #[cfg(feature = "parallel")]
    {
        counts
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| compute_row(y, row));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (y, row) in counts.chunks_mut(width).enumerate() {
            compute_row(y, row);
        }
    }

    counts
}

/// Classic Zhang-Suen thinning, used by the `LineAndFill` converter to
/// judge which components of its line classification are too small
/// to survive as strokes. Distinct from the NWG thinning the edge
/// vectorizer uses: simpler, and run once to completion rather than
/// exposed as a LUT-accelerated row-parallel pass.
#[must_use]
pub fn zhang_suen_thin(mask: &Mask) -> Mask {
    let width = mask.width();
    let height = mask.height();
    let mut data = mask.data().to_vec();

    let at = |data: &[u8], x: i64, y: i64| -> bool {
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            false
        } else {
            data[y as usize * width + x as usize] == 255
        }
    };

    loop {
        let mut changed = false;
        for step in 0..2 {
            let mut to_clear = Vec::new();
            for y in 0..height {
                for x in 0..width {
                    if !at(&data, x as i64, y as i64) {
                        continue;
                    }
                    let p = [
                        at(&data, x as i64, y as i64 - 1),
                        at(&data, x as i64 + 1, y as i64 - 1),
                        at(&data, x as i64 + 1, y as i64),
                        at(&data, x as i64 + 1, y as i64 + 1),
                        at(&data, x as i64, y as i64 + 1),
                        at(&data, x as i64 - 1, y as i64 + 1),
                        at(&data, x as i64 - 1, y as i64),
                        at(&data, x as i64 - 1, y as i64 - 1),
                    ];
                    let b: u32 = p.iter().filter(|&&v| v).count() as u32;
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
                    let cond = if step == 0 {
                        !(p1 && p3 && p5) && !(p3 && p5 && p7)
                    } else {
                        !(p1 && p3 && p7) && !(p1 && p5 && p7)
                    };
                    if cond {
                        to_clear.push(y * width + x);
                    }
                }
            }
            if !to_clear.is_empty() {
                changed = true;
                for idx in to_clear {
                    data[idx] = 0;
                }
            }
        }
        if !changed {
            break;
        }
    }

    Mask::from_data(width, height, data).expect("dimensions preserved")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilate_grows_single_pixel() {
        let mut mask = Mask::filled(5, 5, 0);
        mask.set(2, 2, 255);
        let dilated = dilate(&mask, 1, KernelShape::Rect);
        assert_eq!(dilated.count_set(), 9);
    }

    #[test]
    fn erode_then_dilate_is_open() {
        let mut mask = Mask::filled(5, 5, 0);
        mask.set(2, 2, 255);
        let opened = open(&mask, 1, KernelShape::Rect);
        assert_eq!(opened.count_set(), 0);
    }

    #[test]
    fn small_components_are_removed() {
        let mut mask = Mask::filled(10, 10, 0);
        mask.set(0, 0, 255);
        for x in 0..5 {
            mask.set(x, 5, 255);
        }
        let cleaned = remove_small_components(&mask, 3);
        assert_eq!(cleaned.count_set(), 5);
    }

    #[test]
    fn ring_neighbor_counts_excludes_center() {
        let mut mask = Mask::filled(3, 3, 255);
        mask.set(1, 1, 0);
        let counts = ring_neighbor_counts(&mask, 1);
        assert_eq!(counts[1 * 3 + 1], 8);
    }

    #[test]
    fn thinning_reduces_a_thick_line_to_a_skeleton() {
        let mut mask = Mask::filled(5, 5, 0);
        for y in 1..4 {
            for x in 0..5 {
                mask.set(x, y, 255);
            }
        }
        let thinned = zhang_suen_thin(&mask);
        assert!(thinned.count_set() < mask.count_set());
        assert!(thinned.count_set() > 0);
    }
}
