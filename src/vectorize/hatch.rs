// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Angle-configurable hatch-line generation inside a filled mask's
//! bounding box.

use crate::geom::{HatchLine, Point};
use crate::raster::Mask;

/// Maps a shell-language hatch mode character to the angle(s), in
/// degrees, the generator should sweep. `"+"` and `"x"` expand to two
/// angles; the rest map one-to-one. Anything unrecognized falls back
/// to `default_angle`.
#[must_use]
pub fn angles_for_mode(mode: &str, default_angle: f64) -> Vec<f64> {
    match mode {
        "/" => vec![135.0],
        "\\" => vec![45.0],
        "|" => vec![90.0],
        "-" => vec![0.0],
        "x" => vec![45.0, 135.0],
        "+" => vec![0.0, 90.0],
        _ => vec![default_angle],
    }
}

fn bounding_box(mask: &Mask) -> Option<(i64, i64, i64, i64)> {
    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    let mut min_y = i64::MAX;
    let mut max_y = i64::MIN;
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.is_set(x as i64, y as i64) {
                min_x = min_x.min(x as i64);
                max_x = max_x.max(x as i64);
                min_y = min_y.min(y as i64);
                max_y = max_y.max(y as i64);
            }
        }
    }
    if min_x > max_x {
        None
    } else {
        Some((min_x, min_y, max_x, max_y))
    }
}

/// Generates parallel hatch lines across `mask`'s bounding box at
/// `angle_degrees`, spaced `spacing` pixels apart perpendicular to the
/// line direction, rotated about the bbox center. Each contiguous
/// in-mask run sampled along a line becomes one two-point
/// [`HatchLine`].
#[must_use]
pub fn generate_hatch_lines(mask: &Mask, spacing: i64, angle_degrees: f64) -> Vec<HatchLine> {
    let spacing = spacing.max(1);
    let Some((min_x, min_y, max_x, max_y)) = bounding_box(mask) else {
        return Vec::new();
    };

    let center = Point::new(
        f64::from((min_x + max_x) as i32) / 2.0,
        f64::from((min_y + max_y) as i32) / 2.0,
    );
    let width = (max_x - min_x + 1) as f64;
    let height = (max_y - min_y + 1) as f64;
    let half_diag = (width * width + height * height).sqrt() / 2.0 + 1.0;

    let theta = angle_degrees.to_radians();
    let dir = Point::new(theta.cos(), theta.sin());
    let perp = Point::new(-theta.sin(), theta.cos());

    let mut lines = Vec::new();
    let spacing_f = f64::from(i32::try_from(spacing).unwrap_or(i32::MAX));
    let steps = (half_diag / spacing_f).ceil() as i64;

    for k in -steps..=steps {
        let offset = k as f64 * spacing_f;
        let line_center = center + perp * offset;
        let sample_count = (2.0 * half_diag).ceil() as i64;

        let mut run_start: Option<Point> = None;
        let mut run_last: Option<Point> = None;
        for s in 0..=sample_count {
            let t = s as f64 - half_diag;
            let point = line_center + dir * t;
            let (px, py) = point.to_pixel();
            let inside = mask.is_set(px, py);
            if inside {
                if run_start.is_none() {
                    run_start = Some(point);
                }
                run_last = Some(point);
            } else if let (Some(start), Some(last)) = (run_start.take(), run_last.take()) {
                if !start.fuzzy_eq(&last) {
                    lines.push(HatchLine::new(start, last));
                }
            }
        }
        if let (Some(start), Some(last)) = (run_start, run_last) {
            if !start.fuzzy_eq(&last) {
                lines.push(HatchLine::new(start, last));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_hatch_on_square_produces_lines() {
        let mut mask = Mask::filled(20, 20, 0);
        for y in 5..15 {
            for x in 5..15 {
                mask.set(x, y, 255);
            }
        }
        let lines = generate_hatch_lines(&mask, 3, 0.0);
        assert!(!lines.is_empty());
        for line in &lines {
            assert!((line.start().y() - line.end().y()).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_mask_yields_no_hatch_lines() {
        let mask = Mask::filled(10, 10, 0);
        assert!(generate_hatch_lines(&mask, 3, 0.0).is_empty());
    }

    #[test]
    fn plus_mode_expands_to_two_angles() {
        assert_eq!(angles_for_mode("+", 0.0), vec![0.0, 90.0]);
        assert_eq!(angles_for_mode("/", 0.0), vec![135.0]);
    }
}
