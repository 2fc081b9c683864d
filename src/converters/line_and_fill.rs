// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;
use crate::error::{Error, Result};
use crate::modemap::ModeMap;
use crate::raster::{
    connected_components, dilate, open, remove_small_components, ring_neighbor_counts,
    zhang_suen_thin, KernelShape, Mask,
};
use crate::vector_data::VectorData;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineAndFillConfig {
    pub outline_mode: bool,
    pub radius: i64,
    pub min_size: usize,
    pub opening_radius: i64,
}

impl LineAndFillConfig {
    pub fn validate(&self) -> Result<()> {
        if !(4..=20).contains(&self.radius) {
            return Err(Error::invalid_configuration("radius must be in [4,20]"));
        }
        if self.min_size < 1 {
            return Err(Error::invalid_configuration("min_size must be >= 1"));
        }
        if self.opening_radius < 0 {
            return Err(Error::invalid_configuration("opening_radius must be >= 0"));
        }
        Ok(())
    }
}

fn unset_component(mask: &mut Mask, component: &[(usize, usize)]) {
    for &(x, y) in component {
        mask.set(x, y, 0);
    }
}

fn set_component(mask: &mut Mask, component: &[(usize, usize)]) {
    for &(x, y) in component {
        mask.set(x, y, 255);
    }
}

pub(super) fn apply(
    config: &LineAndFillConfig,
    colormap: &ColorMap,
    mode_map: &ModeMap,
    mode_id: u8,
    data: &mut VectorData,
) -> Result<()> {
    let mode_mask = mode_map.mask_for(mode_id);

    for color_id in colormap.present_colors() {
        let masked = colormap.mask_for(color_id).intersect(&mode_mask);
        if masked.count_set() == 0 {
            continue;
        }
        let cleaned = remove_small_components(&masked, config.min_size);
        let masked = open(&cleaned, config.opening_radius, KernelShape::Rect);
        if masked.count_set() == 0 {
            continue;
        }

        let counts = ring_neighbor_counts(&masked, config.radius);
        let threshold = 2 * config.radius * config.radius;

        let mut candidate_lines = Mask::filled(masked.width(), masked.height(), 0);
        for y in 0..masked.height() {
            for x in 0..masked.width() {
                if masked.is_set(x as i64, y as i64)
                    && i64::from(counts[y * masked.width() + x]) <= threshold
                {
                    candidate_lines.set(x, y, 255);
                }
            }
        }

        // Subtract regions thick enough to be solid fills: an
        // open+dilate at the same radius approximates "large enough
        // to be a fill, not a line".
        let solid_core = open(&masked, config.radius, KernelShape::Elliptical);
        let solid = dilate(&solid_core, config.radius, KernelShape::Elliptical);
        let mut lines = candidate_lines.intersect(&solid.invert());
        lines = remove_small_components(&lines, 10);

        let mut fills = masked.intersect(&lines.invert());

        // Reclassify line components whose thinned skeleton is
        // shorter than 4 pixels: too small to be a meaningful stroke,
        // so they fold back into the fill. `edge_masks` receives the
        // un-thinned line mask; thinning here is only a size probe.
        let thinned = zhang_suen_thin(&lines);
        for component in connected_components(&lines) {
            let thinned_count = component
                .iter()
                .filter(|&&(x, y)| thinned.is_set(x as i64, y as i64))
                .count();
            if thinned_count < 4 {
                unset_component(&mut lines, &component);
                set_component(&mut fills, &component);
            }
        }

        data.union_edge(color_id, &lines);
        data.union_filled(color_id, &fills);
        if config.outline_mode {
            data.union_outline(color_id, &fills);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::build_binary;
    use crate::raster::BgrImage;

    #[test]
    fn thin_stroke_is_classified_as_line() {
        let mut data_vec = vec![[255u8, 255, 255]; 40 * 40];
        for y in 0..40 {
            data_vec[y * 40 + 20] = [0, 0, 0];
        }
        let image = BgrImage::from_data(40, 40, data_vec).unwrap();
        let colormap = build_binary(&image, 128).unwrap();

        let mut mode_map = ModeMap::new(40, 40);
        for y in 0..40 {
            for x in 0..40 {
                mode_map.paint(x, y, 1);
            }
        }

        let mut data = VectorData::new(40, 40, colormap.palette().clone());
        let config = LineAndFillConfig {
            outline_mode: false,
            radius: 4,
            min_size: 1,
            opening_radius: 0,
        };
        apply(&config, &colormap, &mode_map, 1, &mut data).unwrap();
        assert!(data.edge_masks.get(&1).is_some_and(|m| m.count_set() > 0));
    }
}
