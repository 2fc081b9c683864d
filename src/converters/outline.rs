// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;
use crate::error::{Error, Result};
use crate::modemap::ModeMap;
use crate::raster::{open, remove_small_components, KernelShape};
use crate::vector_data::VectorData;

/// Same pipeline as [`super::EdgeConfig`] but writes to
/// `outline_masks[c]`. The "white" color, if present, is skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutlineConfig {
    pub min_size: usize,
    pub opening_radius: i64,
}

impl OutlineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_size < 1 {
            return Err(Error::invalid_configuration("min_size must be >= 1"));
        }
        if self.opening_radius < 0 {
            return Err(Error::invalid_configuration("opening_radius must be >= 0"));
        }
        Ok(())
    }
}

pub(super) fn apply(
    config: &OutlineConfig,
    colormap: &ColorMap,
    mode_map: &ModeMap,
    mode_id: u8,
    data: &mut VectorData,
) -> Result<()> {
    let mode_mask = mode_map.mask_for(mode_id);
    let white_id = colormap.palette().white_id();

    for color_id in colormap.present_colors() {
        if Some(usize::from(color_id)) == white_id {
            continue;
        }
        let base = colormap.mask_for(color_id);
        let cleaned = remove_small_components(&base, config.min_size);
        let opened = open(&cleaned, config.opening_radius, KernelShape::Elliptical);
        let restricted = opened.intersect(&mode_mask);
        data.union_outline(color_id, &restricted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::build_binary;
    use crate::raster::BgrImage;

    #[test]
    fn writes_to_outline_not_edge() {
        let image = BgrImage::from_data(4, 4, vec![[0, 0, 0]; 16]).unwrap();
        let colormap = build_binary(&image, 128).unwrap();
        let mut mode_map = ModeMap::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                mode_map.paint(x, y, 1);
            }
        }
        let mut data = VectorData::new(4, 4, colormap.palette().clone());
        let config = OutlineConfig {
            min_size: 1,
            opening_radius: 0,
        };
        apply(&config, &colormap, &mode_map, 1, &mut data).unwrap();
        assert!(!data.edge_masks.contains_key(&1));
        assert_eq!(data.outline_masks[&1].count_set(), 16);
    }
}
