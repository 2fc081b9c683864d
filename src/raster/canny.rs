// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Canny edge detection: Sobel gradient, non-maximum suppression, and
//! double-threshold hysteresis.

use super::image::Mask;

fn sobel(gray: &Mask) -> (Vec<f64>, Vec<f64>) {
    let width = gray.width();
    let height = gray.height();
    let mut gx = vec![0.0; width * height];
    let mut gy = vec![0.0; width * height];

    for y in 0..height {
        for x in 0..width {
            let p = |dx: i64, dy: i64| f64::from(gray.get(x as i64 + dx, y as i64 + dy));
            let sx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1))
                - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let sy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1))
                - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            gx[y * width + x] = sx;
            gy[y * width + x] = sy;
        }
    }
    (gx, gy)
}

/// Detects edges with the classic Canny pipeline. `low`/`high` are
/// compared against gradient magnitude on the same 0..1020 scale a
/// Sobel-of-0..255-input produces (matching the original's raw
/// threshold units, not a normalized 0..1 scale).
#[must_use]
pub fn canny(gray: &Mask, low: f64, high: f64) -> Mask {
    let width = gray.width();
    let height = gray.height();
    if width == 0 || height == 0 {
        return Mask::filled(width, height, 0);
    }

    let (gx, gy) = sobel(gray);
    let mut magnitude = vec![0.0; width * height];
    let mut direction = vec![0.0; width * height];
    for i in 0..width * height {
        magnitude[i] = gx[i].hypot(gy[i]);
        direction[i] = gy[i].atan2(gx[i]);
    }

    let mut suppressed = vec![0.0; width * height];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            let angle = direction[idx].to_degrees().rem_euclid(180.0);
            let (n1, n2) = if !(22.5..157.5).contains(&angle) {
                (idx - 1, idx + 1)
            } else if (22.5..67.5).contains(&angle) {
                (idx - width + 1, idx + width - 1)
            } else if (67.5..112.5).contains(&angle) {
                (idx - width, idx + width)
            } else {
                (idx - width - 1, idx + width + 1)
            };
            if magnitude[idx] >= magnitude[n1] && magnitude[idx] >= magnitude[n2] {
                suppressed[idx] = magnitude[idx];
            }
        }
    }

    let mut strong = vec![false; width * height];
    let mut weak = vec![false; width * height];
    for (i, &m) in suppressed.iter().enumerate() {
        if m >= high {
            strong[i] = true;
        } else if m >= low {
            weak[i] = true;
        }
    }

    let mut out = Mask::filled(width, height, 0);
    let mut stack: Vec<usize> = strong
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s)
        .map(|(i, _)| i)
        .collect();
    for &i in &stack {
        out.set(i % width, i / width, 255);
    }
    while let Some(idx) = stack.pop() {
        let x = idx % width;
        let y = idx / width;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                    continue;
                }
                let nidx = ny as usize * width + nx as usize;
                if weak[nidx] && !out.is_set(nx, ny) {
                    out.set(nx as usize, ny as usize, 255);
                    stack.push(nidx);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_no_edges() {
        let gray = Mask::filled(10, 10, 128);
        let edges = canny(&gray, 50.0, 150.0);
        assert_eq!(edges.count_set(), 0);
    }

    #[test]
    fn sharp_step_produces_an_edge() {
        let mut data = vec![0u8; 20 * 20];
        for y in 0..20 {
            for x in 10..20 {
                data[y * 20 + x] = 255;
            }
        }
        let gray = Mask::from_data(20, 20, data).unwrap();
        let edges = canny(&gray, 50.0, 150.0);
        assert!(edges.count_set() > 0);
    }
}
