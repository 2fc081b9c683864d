// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Stroke-order optimization: given a color's polylines and contours,
//! returns a pen-down sequence minimizing pen-up travel. Open polylines
//! may be drawn reversed for free; contours are materialized into
//! closed polylines and drawn from a fixed start vertex.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::{Contour, Point, Polyline};

/// One drawable stroke: its points, and whether it is free to be drawn
/// starting from either end.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    is_open: bool,
}

impl Stroke {
    #[must_use]
    pub fn from_polyline(polyline: &Polyline) -> Self {
        Self {
            points: polyline.points().to_vec(),
            is_open: true,
        }
    }

    #[must_use]
    pub fn from_contour(contour: &Contour) -> Self {
        Self {
            points: contour.to_closed_polyline().into_points(),
            is_open: false,
        }
    }

    #[must_use]
    pub fn front(&self) -> Point {
        self.points[0]
    }

    #[must_use]
    pub fn back(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Orients the stroke so it starts at `from` if that end is nearer
    /// (or the stroke is closed, where only the forward orientation is
    /// legal). Returns the (possibly reversed) point sequence and the
    /// pen-up distance spent getting there.
    #[must_use]
    fn oriented_from(&self, from: Point) -> (Vec<Point>, f64) {
        let d_front = from.distance_to(&self.front());
        if !self.is_open {
            return (self.points.clone(), d_front);
        }
        let d_back = from.distance_to(&self.back());
        if d_back < d_front {
            let mut reversed = self.points.clone();
            reversed.reverse();
            (reversed, d_back)
        } else {
            (self.points.clone(), d_front)
        }
    }
}

/// A fully ordered draw path for one color: each stroke in the order
/// and orientation it should be drawn in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawPath {
    pub strokes: Vec<Vec<Point>>,
}

impl DrawPath {
    /// Sum of pen-up Euclidean distances between the end of one stroke
    /// and the start of the next, including the initial move from the
    /// origin to the first stroke.
    #[must_use]
    pub fn pen_up_travel(&self) -> f64 {
        let mut total = 0.0;
        let mut pen = Point::origin();
        for stroke in &self.strokes {
            total += pen.distance_to(&stroke[0]);
            pen = stroke[stroke.len() - 1];
        }
        total
    }
}

/// Optimizer strategy: lookahead-greedy (the default) or beam search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Strategy {
    Greedy { n: usize },
    Beam { width: usize, top_k: usize },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Greedy { n: 3 }
    }
}

impl Strategy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Greedy { n } if n < 1 => Err(Error::invalid_configuration(
                "n_lookahead must be >= 1",
            )),
            Self::Beam { width, .. } if width < 1 => {
                Err(Error::invalid_configuration("beam_width must be >= 1"))
            }
            Self::Beam { top_k, .. } if top_k < 1 => {
                Err(Error::invalid_configuration("top_k must be >= 1"))
            }
            _ => Ok(()),
        }
    }
}

fn strokes_from(polylines: &[Polyline], contours: &[Contour]) -> Vec<Stroke> {
    let mut strokes: Vec<Stroke> = polylines.iter().map(Stroke::from_polyline).collect();
    strokes.extend(contours.iter().map(Stroke::from_contour));
    strokes
}

/// Runs a pure greedy nearest-neighbor pass over `remaining` (indices
/// into `strokes`) starting at `from`, for up to `steps` strokes.
/// Returns the order consumed and the total pen-up distance spent.
fn greedy_run(strokes: &[Stroke], remaining: &[usize], from: Point, steps: usize) -> (Vec<usize>, f64) {
    let mut pool: Vec<usize> = remaining.to_vec();
    let mut order = Vec::new();
    let mut pen = from;
    let mut total = 0.0;
    for _ in 0..steps {
        if pool.is_empty() {
            break;
        }
        let mut best_pos = 0;
        let mut best_dist = f64::INFINITY;
        for (pos, &idx) in pool.iter().enumerate() {
            let (_, dist) = strokes[idx].oriented_from(pen);
            if dist < best_dist {
                best_dist = dist;
                best_pos = pos;
            }
        }
        let idx = pool.remove(best_pos);
        let (oriented, dist) = strokes[idx].oriented_from(pen);
        total += dist;
        pen = oriented[oriented.len() - 1];
        order.push(idx);
    }
    (order, total)
}

/// Lookahead-greedy: every candidate first stroke is scored by running
/// a plain greedy pass `n-1` further steps from it; the candidate with
/// the shortest `n`-step prefix total is chosen as the actual first
/// stroke, then greedy continues from there to the end.
#[must_use]
pub fn greedy_optimize_nlookahead(polylines: &[Polyline], contours: &[Contour], n: usize) -> DrawPath {
    let strokes = strokes_from(polylines, contours);
    if strokes.is_empty() {
        return DrawPath::default();
    }
    let all: Vec<usize> = (0..strokes.len()).collect();
    let origin = Point::origin();

    let mut best_first = 0;
    let mut best_prefix_total = f64::INFINITY;
    for &first in &all {
        let rest: Vec<usize> = all.iter().copied().filter(|&i| i != first).collect();
        let (first_oriented, first_dist) = strokes[first].oriented_from(origin);
        let after_first = first_oriented[first_oriented.len() - 1];
        let (_, rest_total) = greedy_run(&strokes, &rest, after_first, n.saturating_sub(1));
        let prefix_total = first_dist + rest_total;
        if prefix_total < best_prefix_total {
            best_prefix_total = prefix_total;
            best_first = first;
        }
    }

    let mut pen = origin;
    let mut result = DrawPath::default();
    let (oriented, _) = strokes[best_first].oriented_from(pen);
    pen = oriented[oriented.len() - 1];
    result.strokes.push(oriented);

    let mut remaining: Vec<usize> = all.into_iter().filter(|&i| i != best_first).collect();
    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_dist = f64::INFINITY;
        for (pos, &idx) in remaining.iter().enumerate() {
            let (_, dist) = strokes[idx].oriented_from(pen);
            if dist < best_dist {
                best_dist = dist;
                best_pos = pos;
            }
        }
        let idx = remaining.remove(best_pos);
        let (oriented, _) = strokes[idx].oriented_from(pen);
        pen = oriented[oriented.len() - 1];
        result.strokes.push(oriented);
    }
    result
}

#[derive(Clone)]
struct BeamState {
    order: Vec<usize>,
    pen: Point,
    total: f64,
}

/// Beam search: keeps at most `width` partial orderings, expanding
/// each into its `top_k` nearest unused candidates (with free
/// reversal) at every step, then truncating back to `width` by
/// accumulated pen-up distance.
#[must_use]
pub fn beam_search_optimize(polylines: &[Polyline], contours: &[Contour], width: usize, top_k: usize) -> DrawPath {
    let strokes = strokes_from(polylines, contours);
    if strokes.is_empty() {
        return DrawPath::default();
    }
    let n = strokes.len();

    let mut beam = vec![BeamState {
        order: Vec::new(),
        pen: Point::origin(),
        total: 0.0,
    }];

    for _ in 0..n {
        let mut candidates = Vec::new();
        for state in &beam {
            let mut scored: Vec<(usize, f64)> = (0..n)
                .filter(|i| !state.order.contains(i))
                .map(|i| (i, strokes[i].oriented_from(state.pen).1))
                .collect();
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));
            for &(idx, dist) in scored.iter().take(top_k) {
                let mut order = state.order.clone();
                order.push(idx);
                let (oriented, _) = strokes[idx].oriented_from(state.pen);
                candidates.push(BeamState {
                    order,
                    pen: oriented[oriented.len() - 1],
                    total: state.total + dist,
                });
            }
        }
        candidates.sort_by(|a, b| a.total.total_cmp(&b.total));
        candidates.truncate(width);
        beam = candidates;
    }

    let best = beam
        .into_iter()
        .min_by(|a, b| a.total.total_cmp(&b.total))
        .unwrap_or_else(|| BeamState {
            order: Vec::new(),
            pen: Point::origin(),
            total: 0.0,
        });

    let mut result = DrawPath::default();
    let mut pen = Point::origin();
    for idx in best.order {
        let (oriented, _) = strokes[idx].oriented_from(pen);
        pen = oriented[oriented.len() - 1];
        result.strokes.push(oriented);
    }
    result
}

/// Dispatches to the configured strategy.
#[must_use]
pub fn optimize(polylines: &[Polyline], contours: &[Contour], strategy: Strategy) -> DrawPath {
    match strategy {
        Strategy::Greedy { n } => greedy_optimize_nlookahead(polylines, contours, n),
        Strategy::Beam { width, top_k } => beam_search_optimize(polylines, contours, width, top_k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_reverses_second_stroke_for_shorter_travel() {
        let a = Polyline::from_vec_unchecked(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let b = Polyline::from_vec_unchecked(vec![Point::new(5.0, 0.0), Point::new(4.0, 0.0)]);
        let path = greedy_optimize_nlookahead(&[a, b], &[], 3);
        assert_eq!(path.strokes.len(), 2);
        assert!((path.pen_up_travel() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn beam_search_matches_or_beats_greedy() {
        let a = Polyline::from_vec_unchecked(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let b = Polyline::from_vec_unchecked(vec![Point::new(5.0, 0.0), Point::new(4.0, 0.0)]);
        let c = Polyline::from_vec_unchecked(vec![Point::new(2.0, 3.0), Point::new(2.0, 10.0)]);
        let greedy = greedy_optimize_nlookahead(&[a.clone(), b.clone(), c.clone()], &[], 3);
        let beam = beam_search_optimize(&[a, b, c], &[], 12, 8);
        assert!(beam.pen_up_travel() <= greedy.pen_up_travel() + 1e-9);
    }

    #[test]
    fn empty_input_yields_empty_path() {
        let path = greedy_optimize_nlookahead(&[], &[], 3);
        assert!(path.strokes.is_empty());
        assert_eq!(path.pen_up_travel(), 0.0);
    }

    #[test]
    fn strategy_rejects_zero_lookahead() {
        assert!(Strategy::Greedy { n: 0 }.validate().is_err());
        assert!(Strategy::Beam { width: 0, top_k: 8 }.validate().is_err());
    }
}
