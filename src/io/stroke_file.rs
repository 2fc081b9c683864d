// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! The on-disk stroke file: a line-oriented ASCII format the plotter
//! reads. Millimeter point coordinates, `n` terminates a polyline,
//! `e` terminates a color.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::geom::Point;
use crate::optimize::DrawPath;

const MAX_COLORS: usize = 64;
const MAX_NAME_LEN: usize = 64;

/// Serializes `paths` (one [`DrawPath`] per color, in palette order)
/// alongside their names into the stroke-file grammar.
#[must_use]
pub fn write_stroke_file(names: &[String], paths: &[DrawPath]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", names.len());
    for name in names {
        let _ = writeln!(out, "{name}");
    }
    for path in paths {
        for stroke in &path.strokes {
            for point in stroke {
                let _ = writeln!(out, "{} {}", point.x(), point.y());
            }
            let _ = writeln!(out, "n");
        }
        let _ = writeln!(out, "e");
    }
    out
}

/// Parses a stroke file into per-color names and [`DrawPath`]s.
/// Reports malformed input with the 1-based line number it occurred
/// on.
pub fn read_stroke_file(text: &str) -> Result<(Vec<String>, Vec<DrawPath>)> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let (count_line, count_str) = lines
        .next()
        .ok_or_else(|| Error::parse_error(1, "empty stroke file"))?;
    let count: usize = count_str
        .trim()
        .parse()
        .map_err(|_| Error::parse_error(count_line, "color count is not an integer"))?;
    if count < 1 || count > MAX_COLORS {
        return Err(Error::parse_error(
            count_line,
            format!("color count {count} out of range 1..={MAX_COLORS}"),
        ));
    }

    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let (line_no, name) = lines
            .next()
            .ok_or_else(|| Error::parse_error(count_line, "missing color name"))?;
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(Error::parse_error(line_no, "color name out of range"));
        }
        names.push(name.to_string());
    }

    let mut paths = Vec::with_capacity(count);
    for _ in 0..count {
        let mut path = DrawPath::default();
        let mut current: Vec<Point> = Vec::new();
        loop {
            let (line_no, line) = lines
                .next()
                .ok_or_else(|| Error::parse_error(0, "missing 'e' terminator"))?;
            match line.trim() {
                "n" => {
                    if current.len() < 2 {
                        return Err(Error::parse_error(line_no, "polyline needs >= 2 points"));
                    }
                    path.strokes.push(std::mem::take(&mut current));
                }
                "e" => {
                    if !current.is_empty() {
                        if current.len() < 2 {
                            return Err(Error::parse_error(line_no, "polyline needs >= 2 points"));
                        }
                        path.strokes.push(std::mem::take(&mut current));
                    }
                    break;
                }
                point_line => {
                    let mut parts = point_line.split_whitespace();
                    let x = parts
                        .next()
                        .and_then(|s| s.parse::<f64>().ok())
                        .ok_or_else(|| Error::parse_error(line_no, "bad point"))?;
                    let y = parts
                        .next()
                        .and_then(|s| s.parse::<f64>().ok())
                        .ok_or_else(|| Error::parse_error(line_no, "bad point"))?;
                    if parts.next().is_some() {
                        return Err(Error::parse_error(line_no, "bad point"));
                    }
                    current.push(Point::new(x, y));
                }
            }
        }
        paths.push(path);
    }

    Ok((names, paths))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_single_color_path() {
        let mut path = DrawPath::default();
        path.strokes.push(vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)]);
        let names = vec!["black".to_string()];
        let text = write_stroke_file(&names, &[path.clone()]);
        let (read_names, read_paths) = read_stroke_file(&text).unwrap();
        assert_eq!(read_names, names);
        assert_eq!(read_paths[0], path);
    }

    #[test]
    fn rejects_polyline_with_one_point() {
        let text = "1\nblack\n0 0\ne\n";
        assert!(read_stroke_file(text).is_err());
    }

    #[test]
    fn rejects_color_count_out_of_range() {
        let text = "0\n";
        assert!(read_stroke_file(text).is_err());
    }

    #[test]
    fn rejects_malformed_point_line() {
        let text = "1\nblack\n0 abc\nn\ne\n";
        assert!(read_stroke_file(text).is_err());
    }
}
