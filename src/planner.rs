// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! The output planner: a rigid affine that fits a color's drawn
//! strokes onto a physical sheet of paper, with an optional "double"
//! duplication and margin/border rendering.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::{Contour, Point};

/// Output-planner knobs. All distances are in the same unit as the
/// input geometry (millimeters, per the stroke-file grammar).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub paper_width: f64,
    pub paper_height: f64,
    pub paper_margin: f64,
    pub direction: f64,
    pub allow_center_drift: bool,
    pub size_percent: f64,
    pub double_mode: bool,
    pub add_border: bool,
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1.0..=1000.0).contains(&self.paper_width) {
            return Err(Error::invalid_configuration("paper_width out of range"));
        }
        if !(1.0..=1000.0).contains(&self.paper_height) {
            return Err(Error::invalid_configuration("paper_height out of range"));
        }
        let max_margin = self.paper_width.min(self.paper_height) / 2.0;
        if !(0.0..=max_margin).contains(&self.paper_margin) {
            return Err(Error::invalid_configuration("paper_margin out of range"));
        }
        if !(0.0..360.0).contains(&self.direction) {
            return Err(Error::invalid_configuration("direction out of range"));
        }
        if !(1.0..=100.0).contains(&self.size_percent) {
            return Err(Error::invalid_configuration("size_percent out of range"));
        }
        Ok(())
    }

    #[must_use]
    fn drawable(&self) -> (f64, f64) {
        (
            self.paper_width - 2.0 * self.paper_margin,
            self.paper_height - 2.0 * self.paper_margin,
        )
    }
}

fn bbox(points: &[Point]) -> Option<(Point, Point)> {
    let mut iter = points.iter();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;
    for &p in iter {
        min = Point::new(min.x().min(p.x()), min.y().min(p.y()));
        max = Point::new(max.x().max(p.x()), max.y().max(p.y()));
    }
    Some((min, max))
}

fn transform_all(strokes: &mut [Vec<Point>], f: impl Fn(Point) -> Point) {
    for stroke in strokes.iter_mut() {
        for point in stroke.iter_mut() {
            *point = f(*point);
        }
    }
}

/// Applies the full output-planner affine to `strokes` in place:
/// recenter on the origin, rotate by `direction`, scale to fit the
/// drawable area (centered if `allow_center_drift`, else symmetric
/// about the origin), optionally split into a "double" top/bottom
/// pair, apply the final `size_percent` scale, then translate to the
/// paper center.
pub fn plan(strokes: &mut Vec<Vec<Point>>, config: &PlannerConfig) -> Result<()> {
    config.validate()?;
    let all_points: Vec<Point> = strokes.iter().flatten().copied().collect();
    let Some((min, max)) = bbox(&all_points) else {
        return Ok(());
    };

    let center = Point::new((min.x() + max.x()) / 2.0, (min.y() + max.y()) / 2.0);
    transform_all(strokes, |p| p - center);

    if config.direction != 0.0 {
        transform_all(strokes, |p| p.rotated(config.direction.to_radians()));
    }

    let rotated_points: Vec<Point> = strokes.iter().flatten().copied().collect();
    let Some((rmin, rmax)) = bbox(&rotated_points) else {
        return Ok(());
    };
    let width = (rmax.x() - rmin.x()).max(1e-9);
    let height = (rmax.y() - rmin.y()).max(1e-9);
    let (drawable_w, drawable_h) = config.drawable();
    let fit_scale = (drawable_w / width).min(drawable_h / height);
    transform_all(strokes, |p| p * fit_scale);

    if config.allow_center_drift {
        let fitted: Vec<Point> = strokes.iter().flatten().copied().collect();
        if let Some((fmin, fmax)) = bbox(&fitted) {
            let fcenter = Point::new((fmin.x() + fmax.x()) / 2.0, (fmin.y() + fmax.y()) / 2.0);
            transform_all(strokes, |p| p - fcenter);
        }
    }

    if config.double_mode {
        let shrink = std::f64::consts::FRAC_1_SQRT_2;
        let mut rotated: Vec<Vec<Point>> = strokes
            .iter()
            .map(|stroke| {
                stroke
                    .iter()
                    .map(|&p| p.rotated(std::f64::consts::FRAC_PI_2) * shrink)
                    .collect()
            })
            .collect();
        let upper_offset = Point::new(0.0, -drawable_h / 4.0);
        let lower_offset = Point::new(0.0, drawable_h / 4.0);
        let mut upper = rotated.clone();
        transform_all(&mut upper, |p| p + upper_offset);
        transform_all(&mut rotated, |p| p + lower_offset);
        upper.extend(rotated);
        *strokes = upper;
    }

    let final_scale = config.size_percent / 100.0;
    transform_all(strokes, |p| p * final_scale);

    let paper_center = Point::new(config.paper_width / 2.0, config.paper_height / 2.0);
    transform_all(strokes, |p| p + paper_center);

    Ok(())
}

/// Builds the margin rectangle (and, in double mode, the midline) as
/// contours/polylines to be written into the `"black"`-named color's
/// geometry, per `add_border`.
#[must_use]
pub fn border_contour(config: &PlannerConfig) -> Option<Contour> {
    if !config.add_border {
        return None;
    }
    let m = config.paper_margin;
    let (w, h) = (config.paper_width, config.paper_height);
    Some(Contour::from_vec_unchecked(vec![
        Point::new(m, m),
        Point::new(w - m, m),
        Point::new(w - m, h - m),
        Point::new(m, h - m),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlannerConfig {
        PlannerConfig {
            paper_width: 200.0,
            paper_height: 200.0,
            paper_margin: 10.0,
            direction: 0.0,
            allow_center_drift: true,
            size_percent: 100.0,
            double_mode: false,
            add_border: false,
        }
    }

    #[test]
    fn centers_strokes_on_paper() {
        let mut strokes = vec![vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]];
        plan(&mut strokes, &config()).unwrap();
        let all: Vec<Point> = strokes.iter().flatten().copied().collect();
        let (min, max) = bbox(&all).unwrap();
        let center = Point::new((min.x() + max.x()) / 2.0, (min.y() + max.y()) / 2.0);
        assert!((center.x() - 100.0).abs() < 1e-6);
        assert!((center.y() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn scales_to_fit_drawable_area() {
        let mut strokes = vec![vec![Point::new(0.0, 0.0), Point::new(1000.0, 0.0)]];
        plan(&mut strokes, &config()).unwrap();
        let all: Vec<Point> = strokes.iter().flatten().copied().collect();
        let (min, max) = bbox(&all).unwrap();
        assert!((max.x() - min.x()) <= 180.0 + 1e-6);
    }

    #[test]
    fn rejects_margin_larger_than_half_the_shorter_side() {
        let mut bad = config();
        bad.paper_margin = 150.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn border_contour_tracks_margin() {
        let mut cfg = config();
        cfg.add_border = true;
        let contour = border_contour(&cfg).unwrap();
        assert_eq!(contour.vertices()[0], Point::new(10.0, 10.0));
    }
}
