// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Endpoint fusion, closed-polyline reclassification, and
//! contour–polyline splicing — the "stitching" half of the vectorizer,
//! run once at the end over a color's full merged geometry.

use crate::geom::{Contour, Polyline};

/// Converts every polyline whose endpoints coincide under tolerance
/// into a contour, dropping the duplicated closing vertex.
#[must_use]
pub fn classify_lines(polylines: Vec<Polyline>) -> (Vec<Polyline>, Vec<Contour>) {
    let mut open = Vec::new();
    let mut closed = Vec::new();
    for polyline in polylines {
        if polyline.is_closed() {
            closed.push(Contour::from_closed_polyline(polyline));
        } else {
            open.push(polyline);
        }
    }
    (open, closed)
}

fn try_merge_pair(a: &Polyline, b: &Polyline) -> Option<Polyline> {
    if a.last().fuzzy_eq(&b.first()) {
        let mut combined = a.clone();
        combined.extend_from(b);
        Some(combined)
    } else if a.last().fuzzy_eq(&b.last()) {
        let mut combined = a.clone();
        combined.extend_from(&b.reversed());
        Some(combined)
    } else if a.first().fuzzy_eq(&b.last()) {
        let mut combined = b.clone();
        combined.extend_from(a);
        Some(combined)
    } else if a.first().fuzzy_eq(&b.first()) {
        let mut combined = a.reversed();
        combined.extend_from(b);
        Some(combined)
    } else {
        None
    }
}

/// Repeatedly merges polylines whose endpoints coincide, trying all
/// four head/tail orientations, until no more merges are possible.
#[must_use]
pub fn merge_polylines(mut polylines: Vec<Polyline>) -> Vec<Polyline> {
    loop {
        let mut merged_at = None;
        'search: for i in 0..polylines.len() {
            for j in 0..polylines.len() {
                if i == j {
                    continue;
                }
                if let Some(combined) = try_merge_pair(&polylines[i], &polylines[j]) {
                    merged_at = Some((i, j, combined));
                    break 'search;
                }
            }
        }
        let Some((i, j, combined)) = merged_at else {
            break;
        };
        let keep = i.min(j);
        let remove = i.max(j);
        polylines[keep] = combined;
        polylines.remove(remove);
    }
    polylines
}

/// Splices a polyline into a contour at a shared vertex `v`: the
/// polyline is oriented so its matching endpoint becomes the tail,
/// then the contour is walked from `v + 1` all the way around back to
/// `v`, producing one polyline that starts at the polyline's free end
/// and closes back onto `v` — reclassified into a contour by the
/// caller's next pass.
fn splice(polyline: &Polyline, contour: &Contour, vertex_index: usize) -> Polyline {
    let oriented = if polyline.last().fuzzy_eq(&contour.vertices()[vertex_index]) {
        polyline.clone()
    } else {
        polyline.reversed()
    };
    let mut points = oriented.into_points();
    points.extend(contour.walk_forward_from(vertex_index));
    Polyline::from_vec_unchecked(points)
}

/// Repeatedly splices any polyline endpoint touching a contour vertex
/// into that contour (consuming it), re-classifying newly closed
/// results, until no more splices apply.
#[must_use]
pub fn stitch_contours(
    mut polylines: Vec<Polyline>,
    mut contours: Vec<Contour>,
) -> (Vec<Polyline>, Vec<Contour>) {
    loop {
        let mut spliced = None;
        'search: for pi in 0..polylines.len() {
            for ci in 0..contours.len() {
                let vertex_index = contours[ci]
                    .index_of(&polylines[pi].first())
                    .or_else(|| contours[ci].index_of(&polylines[pi].last()));
                if let Some(v) = vertex_index {
                    let combined = splice(&polylines[pi], &contours[ci], v);
                    spliced = Some((pi, ci, combined));
                    break 'search;
                }
            }
        }
        let Some((pi, ci, combined)) = spliced else {
            break;
        };
        polylines[pi] = combined;
        contours.remove(ci);

        let mut i = 0;
        while i < polylines.len() {
            if polylines[i].is_closed() {
                let closed = polylines.remove(i);
                contours.push(Contour::from_closed_polyline(closed));
            } else {
                i += 1;
            }
        }
    }
    (polylines, contours)
}

/// Full stitching pipeline: merge to a fixed point, classify closed
/// results into contours, splice remaining polylines into contours
/// where an endpoint touches a contour vertex, and reclassify again.
#[must_use]
pub fn reconcile(polylines: Vec<Polyline>, contours: Vec<Contour>) -> (Vec<Polyline>, Vec<Contour>) {
    let merged = merge_polylines(polylines);
    let (open, mut closed) = classify_lines(merged);
    closed.extend(contours);
    stitch_contours(open, closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;

    #[test]
    fn coincident_endpoints_merge_into_one_polyline() {
        let a = Polyline::from_vec_unchecked(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        let b = Polyline::from_vec_unchecked(vec![Point::new(10.0, 0.0), Point::new(20.0, 0.0)]);
        let merged = merge_polylines(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].points().len(), 3);
        assert_eq!(merged[0].last(), Point::new(20.0, 0.0));
    }

    #[test]
    fn closed_polyline_becomes_contour() {
        let square = Polyline::from_vec_unchecked(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        let (open, closed) = classify_lines(vec![square]);
        assert!(open.is_empty());
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].len(), 3);
    }

    #[test]
    fn polyline_splices_into_contour_at_shared_vertex() {
        let square = Contour::from_vec_unchecked(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]);
        let tail = Polyline::from_vec_unchecked(vec![Point::new(10.0, 0.0), Point::new(15.0, -5.0)]);
        let (polylines, contours) = stitch_contours(vec![tail], vec![square]);
        assert!(contours.is_empty());
        assert_eq!(polylines.len(), 1);
        assert_eq!(
            polylines[0].points(),
            &[
                Point::new(15.0, -5.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
            ]
        );
    }
}
