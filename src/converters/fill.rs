// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;
use crate::error::{Error, Result};
use crate::modemap::ModeMap;
use crate::raster::{canny, close, dilate, erode, open, remove_small_components, KernelShape, Mask};
use crate::vector_data::VectorData;

/// `erosion_radius` keeps the source's sign convention: positive
/// values dilate the closed mask, negative values erode it. Do not
/// rename without also updating callers that rely on the sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    pub outline_mode: bool,
    pub canny_mode: Option<String>,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub color_edges: Option<String>,
    pub back_outline: Option<String>,
    pub closing_radius: i64,
    pub erosion_radius: i64,
    pub min_size: usize,
    pub opening_radius: i64,
}

impl FillConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_size < 1 {
            return Err(Error::invalid_configuration("min_size must be >= 1"));
        }
        if self.opening_radius < 0 || self.closing_radius < 0 {
            return Err(Error::invalid_configuration(
                "opening_radius and closing_radius must be >= 0",
            ));
        }
        if !(-20..=20).contains(&self.erosion_radius) {
            return Err(Error::invalid_configuration(
                "erosion_radius must be in [-20,20]",
            ));
        }
        if !(0.0..=1000.0).contains(&self.low_threshold) || !(0.0..=1000.0).contains(&self.high_threshold) {
            return Err(Error::invalid_configuration(
                "low_threshold and high_threshold must be in [0,1000]",
            ));
        }
        Ok(())
    }
}

/// Inter-color boundary of `assign`: a pixel is an edge if any
/// 4-neighbor carries a different color-id.
fn color_boundary(colormap: &ColorMap) -> Mask {
    let width = colormap.width();
    let height = colormap.height();
    let mut out = Mask::filled(width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let here = colormap.assign_at(x, y);
            let mut boundary = false;
            if x > 0 && colormap.assign_at(x - 1, y) != here {
                boundary = true;
            }
            if !boundary && x + 1 < width && colormap.assign_at(x + 1, y) != here {
                boundary = true;
            }
            if !boundary && y > 0 && colormap.assign_at(x, y - 1) != here {
                boundary = true;
            }
            if !boundary && y + 1 < height && colormap.assign_at(x, y + 1) != here {
                boundary = true;
            }
            if boundary {
                out.set(x, y, 255);
            }
        }
    }
    out
}

pub(super) fn apply(
    config: &FillConfig,
    original: &crate::raster::BgrImage,
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
        let pre_erosion = opened.intersect(&mode_mask);

        let closed = if config.closing_radius > 0 {
            close(&pre_erosion, config.closing_radius, KernelShape::Elliptical)
        } else {
            pre_erosion.clone()
        };

        let final_mask = match config.erosion_radius.cmp(&0) {
            std::cmp::Ordering::Greater => {
                dilate(&closed, config.erosion_radius, KernelShape::Elliptical)
            }
            std::cmp::Ordering::Less => {
                erode(&closed, -config.erosion_radius, KernelShape::Elliptical)
            }
            std::cmp::Ordering::Equal => closed,
        };

        data.union_filled(color_id, &final_mask);
        if config.outline_mode {
            data.union_outline(color_id, &pre_erosion);
        }
    }

    if let Some(name) = &config.canny_mode {
        if let Some(target_id) = colormap.palette().id_of(name) {
            let gray = original.to_grayscale();
            let edges = canny(&gray, config.low_threshold, config.high_threshold);
            let restricted = edges.intersect(&mode_mask);
            data.union_edge(u8::try_from(target_id).unwrap(), &restricted);
        }
    }

    if let Some(name) = &config.color_edges {
        if let Some(target_id) = colormap.palette().id_of(name) {
            let boundary = color_boundary(colormap).intersect(&mode_mask);
            data.union_edge(u8::try_from(target_id).unwrap(), &boundary);
        }
    }

    if let Some(name) = &config.back_outline {
        if let Some(target_id) = colormap.palette().id_of(name) {
            if let Some(white) = white_id {
                let white_mask = colormap.mask_for(u8::try_from(white).unwrap());
                let complement = white_mask.invert().intersect(&mode_mask);
                data.union_outline(u8::try_from(target_id).unwrap(), &complement);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::build_binary;
    use crate::raster::BgrImage;

    fn full_mode_map(width: usize, height: usize, mode_id: u8) -> ModeMap {
        let mut map = ModeMap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                map.paint(x, y, mode_id);
            }
        }
        map
    }

    #[test]
    fn erosion_radius_sign_dilates_positive_erodes_negative() {
        let image = BgrImage::from_data(6, 6, vec![[0, 0, 0]; 36]).unwrap();
        let colormap = build_binary(&image, 128).unwrap();
        let mode_map = full_mode_map(6, 6, 1);

        let mut dilated_data = VectorData::new(6, 6, colormap.palette().clone());
        let dilate_config = FillConfig {
            outline_mode: false,
            canny_mode: None,
            low_threshold: 50.0,
            high_threshold: 150.0,
            color_edges: None,
            back_outline: None,
            closing_radius: 0,
            erosion_radius: 1,
            min_size: 1,
            opening_radius: 0,
        };
        apply(&dilate_config, &image, &colormap, &mode_map, 1, &mut dilated_data).unwrap();

        let mut eroded_data = VectorData::new(6, 6, colormap.palette().clone());
        let erode_config = FillConfig {
            erosion_radius: -1,
            ..dilate_config
        };
        apply(&erode_config, &image, &colormap, &mode_map, 1, &mut eroded_data).unwrap();

        assert!(
            dilated_data.filled_masks[&1].count_set() >= eroded_data.filled_masks[&1].count_set()
        );
    }
}
