// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! The vectorizer: turns a color's accumulated masks into hatch lines,
//! polylines, and contours, then stitches and simplifies the result.
//! The densest subsystem in the crate; see the submodules for each
//! stage.

mod hatch;
mod outline;
mod simplify;
mod stitch;
mod thinning;
mod trace;

pub use hatch::{angles_for_mode, generate_hatch_lines};
pub use outline::extract_contours_from_filled;
pub use simplify::{
    douglas_peucker, douglas_peucker_closed, path_length, remove_jitter, simplify_contour,
    simplify_polyline, simplify_vw, subdivide,
};
pub use stitch::{classify_lines, merge_polylines, reconcile, stitch_contours};
pub use thinning::{clean_thinned, nwg_thin};
pub use trace::{paths_to_polylines, trace_polylines};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::{Contour, HatchLine, Point, Polyline};
use crate::raster::remove_small_components;
use crate::vector_data::VectorData;

/// Per-color (or wildcard `"_"`) hatch override: spacing, mode
/// character, and an optional substitute color the hatch lines (and
/// any outline-sourced geometry) are filed under instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HatchSetting {
    pub spacing: Option<i64>,
    pub mode: Option<String>,
    pub substitute_color: Option<String>,
}

/// Vectorizer-wide configuration: default hatch spacing/angle, the
/// component-area and stroke-length floors, jitter tolerance, and any
/// per-color hatch overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizeConfig {
    pub hatch_line_spacing: i64,
    pub hatch_line_angle: f64,
    pub min_component_size: usize,
    pub jitter_epsilon: f64,
    pub min_polyline_length: f64,
    pub hatch_settings: HashMap<String, HatchSetting>,
}

impl VectorizeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hatch_line_spacing < 1 {
            return Err(Error::invalid_configuration(
                "hatch_line_spacing must be >= 1",
            ));
        }
        if self.min_component_size < 1 {
            return Err(Error::invalid_configuration(
                "min_component_size must be >= 1",
            ));
        }
        Ok(())
    }

    fn setting_for(&self, color_name: &str) -> Option<&HatchSetting> {
        self.hatch_settings
            .get(color_name)
            .or_else(|| self.hatch_settings.get("_"))
    }
}

fn resolve_substitute(data: &VectorData, setting: Option<&HatchSetting>, default_id: u8) -> u8 {
    setting
        .and_then(|s| s.substitute_color.as_deref())
        .and_then(|name| data.palette().id_of(name))
        .and_then(|id| u8::try_from(id).ok())
        .unwrap_or(default_id)
}

fn int_path_to_polyline(path: &[(i64, i64)]) -> Polyline {
    let points: Vec<Point> = path.iter().map(|&(x, y)| Point::from_pixel(x, y)).collect();
    Polyline::from_vec_unchecked(points)
}

fn generate_hatches_for_color(
    data: &mut VectorData,
    config: &VectorizeConfig,
    color_id: u8,
) -> Result<()> {
    let Some(mask) = data.filled_masks.get(&color_id).cloned() else {
        return Ok(());
    };
    let cleaned = remove_small_components(&mask, config.min_component_size);
    let color_name = data
        .palette()
        .name_of(usize::from(color_id))
        .unwrap_or_default()
        .to_string();
    let setting = config.setting_for(&color_name);

    let spacing = setting
        .and_then(|s| s.spacing)
        .filter(|&s| s > 0)
        .unwrap_or(config.hatch_line_spacing);
    let angles = setting
        .and_then(|s| s.mode.as_deref())
        .map_or_else(|| vec![config.hatch_line_angle], |mode| {
            angles_for_mode(mode, config.hatch_line_angle)
        });
    let use_id = resolve_substitute(data, setting, color_id);

    let mut lines: Vec<HatchLine> = Vec::new();
    for angle in angles {
        lines.extend(generate_hatch_lines(&cleaned, spacing, angle));
    }
    data.hatch_lines.entry(use_id).or_default().extend(lines);
    Ok(())
}

fn vectorize_edges_for_color(data: &mut VectorData, config: &VectorizeConfig, color_id: u8) {
    let Some(mask) = data.edge_masks.get(&color_id).cloned() else {
        return;
    };
    let thinned = nwg_thin(&mask);
    let cleaned = clean_thinned(&thinned);
    let mut polylines = paths_to_polylines(trace_polylines(&cleaned));
    polylines.retain(|p| path_length(p.points(), false) >= config.min_polyline_length);
    for polyline in &mut polylines {
        let denoised = remove_jitter(polyline.points(), config.jitter_epsilon, false);
        *polyline = Polyline::from_vec_unchecked(denoised);
    }
    data.polylines.entry(color_id).or_default().extend(polylines);
}

fn vectorize_outlines_for_color(data: &mut VectorData, config: &VectorizeConfig, color_id: u8) {
    let Some(mask) = data.outline_masks.get(&color_id).cloned() else {
        return;
    };
    let (raw_polylines, raw_contours) = extract_contours_from_filled(&mask);
    let color_name = data
        .palette()
        .name_of(usize::from(color_id))
        .unwrap_or_default()
        .to_string();
    let use_id = resolve_substitute(data, config.setting_for(&color_name), color_id);

    let polylines: Vec<Polyline> = raw_polylines.iter().map(|p| int_path_to_polyline(p)).collect();
    let contours: Vec<Contour> = raw_contours
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| {
            let points: Vec<Point> = c.iter().map(|&(x, y)| Point::from_pixel(x, y)).collect();
            Contour::from_vec_unchecked(points)
        })
        .collect();

    data.polylines.entry(use_id).or_default().extend(polylines);
    data.contours.entry(use_id).or_default().extend(contours);
}

/// Runs the full per-color vectorization pipeline over `data`'s
/// accumulated masks: hatch generation, edge vectorization, outline
/// vectorization, short-stroke culling, stitching, and simplification
/// — in that order, matching the ordering guarantee that hatches
/// precede edges precede outlines and that stitching/simplification
/// run once at the end over the merged state.
pub fn vectorize(data: &mut VectorData, config: &VectorizeConfig) -> Result<()> {
    config.validate()?;

    let color_ids: Vec<u8> = {
        let mut ids: Vec<u8> = data
            .filled_masks
            .keys()
            .chain(data.edge_masks.keys())
            .chain(data.outline_masks.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };

    for &color_id in &color_ids {
        generate_hatches_for_color(data, config, color_id)?;
    }
    for &color_id in &color_ids {
        vectorize_edges_for_color(data, config, color_id);
    }
    for &color_id in &color_ids {
        vectorize_outlines_for_color(data, config, color_id);
    }
    for contours in data.contours.values_mut() {
        contours.retain(|c| path_length(c.vertices(), true) >= config.min_polyline_length);
    }

    let stitched_ids: Vec<u8> = data
        .polylines
        .keys()
        .chain(data.contours.keys())
        .copied()
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();

    for color_id in stitched_ids {
        let polylines = data.polylines.remove(&color_id).unwrap_or_default();
        let contours = data.contours.remove(&color_id).unwrap_or_default();
        let (polylines, contours) = reconcile(polylines, contours);

        let simplified_polylines = polylines
            .iter()
            .map(|p| {
                let points = simplify_polyline(p.points(), 2, 0.86);
                Polyline::from_vec_unchecked(points)
            })
            .collect::<Vec<_>>();
        let simplified_contours = contours
            .iter()
            .map(|c| {
                let points = simplify_contour(c.vertices(), 2, 0.86);
                Contour::from_vec_unchecked(points)
            })
            .collect::<Vec<_>>();

        if !simplified_polylines.is_empty() {
            data.polylines.insert(color_id, simplified_polylines);
        }
        if !simplified_contours.is_empty() {
            data.contours.insert(color_id, simplified_contours);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Palette, PaletteEntry};
    use crate::raster::Mask;

    fn config() -> VectorizeConfig {
        VectorizeConfig {
            hatch_line_spacing: 4,
            hatch_line_angle: 0.0,
            min_component_size: 1,
            jitter_epsilon: 0.5,
            min_polyline_length: 0.0,
            hatch_settings: HashMap::new(),
        }
    }

    #[test]
    fn edge_mask_produces_a_traced_polyline() {
        let palette = Palette::new(vec![PaletteEntry::parse_hex("black", "000000").unwrap()]);
        let mut data = VectorData::new(10, 10, palette);
        let mut mask = Mask::filled(10, 10, 0);
        for x in 1..9 {
            mask.set(x, 5, 255);
        }
        data.union_edge(0, &mask);

        vectorize(&mut data, &config()).unwrap();
        assert!(data.polylines.contains_key(&0) || data.contours.contains_key(&0));
    }

    #[test]
    fn filled_mask_produces_hatch_lines() {
        let palette = Palette::new(vec![PaletteEntry::parse_hex("black", "000000").unwrap()]);
        let mut data = VectorData::new(20, 20, palette);
        let mut mask = Mask::filled(20, 20, 0);
        for y in 5..15 {
            for x in 5..15 {
                mask.set(x, y, 255);
            }
        }
        data.union_filled(0, &mask);

        vectorize(&mut data, &config()).unwrap();
        assert!(data.hatch_lines.get(&0).is_some_and(|lines| !lines.is_empty()));
    }

    #[test]
    fn outline_mask_produces_a_contour() {
        let palette = Palette::new(vec![PaletteEntry::parse_hex("black", "000000").unwrap()]);
        let mut data = VectorData::new(20, 20, palette);
        let mut mask = Mask::filled(20, 20, 0);
        for y in 5..15 {
            for x in 5..15 {
                mask.set(x, y, 255);
            }
        }
        data.union_outline(0, &mask);

        vectorize(&mut data, &config()).unwrap();
        assert!(data.contours.contains_key(&0));
    }
}
