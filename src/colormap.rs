// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! The colormap builder: binary threshold, nearest-Lab multi-palette,
//! and achromatic pre-classified multi-palette.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::palette::{Palette, PaletteEntry};
use crate::raster::{bgr8_to_lab, bgr_to_hls, double_cone_saturation, BgrImage, Mask};

/// Per-pixel palette assignment plus the derived per-color masks,
/// names, and BGR values every downstream stage reads.
#[derive(Debug, Clone)]
pub struct ColorMap {
    width: usize,
    height: usize,
    /// Color-id per pixel, row-major. `u8` is sufficient: the stroke
    /// file format caps color count at 64.
    assign: Vec<u8>,
    palette: Palette,
}

impl ColorMap {
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn assign_at(&self, x: usize, y: usize) -> u8 {
        self.assign[y * self.width + x]
    }

    /// Builds the binary mask for color-id `c`: `assign == c`. Only
    /// materializes colors with at least one pixel, per the spec's
    /// output invariant.
    #[must_use]
    pub fn mask_for(&self, color_id: u8) -> Mask {
        let data = self
            .assign
            .iter()
            .map(|&a| if a == color_id { 255 } else { 0 })
            .collect();
        Mask::from_data(self.width, self.height, data).expect("dimensions match by construction")
    }

    /// Color-ids that own at least one pixel, in palette order.
    #[must_use]
    pub fn present_colors(&self) -> Vec<u8> {
        (0..self.palette.len())
            .map(|id| u8::try_from(id).expect("palette capped at 64 entries"))
            .filter(|&id| self.assign.iter().any(|&a| a == id))
            .collect()
    }

    fn from_assign(width: usize, height: usize, assign: Vec<u8>, palette: Palette) -> Self {
        Self {
            width,
            height,
            assign,
            palette,
        }
    }
}

fn validate_image(image: &BgrImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::invalid_input("image has zero width or height"));
    }
    Ok(())
}

/// Grayscale threshold at `threshold∈[1,254]`. Pixels with gray ≥
/// threshold are "white" (id 0); the rest are "black" (id 1).
pub fn build_binary(image: &BgrImage, threshold: u8) -> Result<ColorMap> {
    validate_image(image)?;
    if threshold == 0 || threshold == 255 {
        return Err(Error::invalid_configuration(
            "binary threshold must be in [1,254]",
        ));
    }

    let gray = image.to_grayscale();
    let assign: Vec<u8> = gray
        .data()
        .iter()
        .map(|&g| if g >= threshold { 0 } else { 1 })
        .collect();

    let palette = Palette::new(vec![
        PaletteEntry {
            name: "white".to_string(),
            bgr: [255, 255, 255],
        },
        PaletteEntry {
            name: "black".to_string(),
            bgr: [0, 0, 0],
        },
    ]);

    Ok(ColorMap::from_assign(
        image.width(),
        image.height(),
        assign,
        palette,
    ))
}

fn nearest_lab_id(pixel: [u8; 3], palette: &Palette) -> u8 {
    let lab = bgr8_to_lab(pixel);
    let mut best_id = 0usize;
    let mut best_dist = f64::INFINITY;
    for (id, entry) in palette.entries().iter().enumerate() {
        let dist = lab.distance_squared(&bgr8_to_lab(entry.bgr));
        if dist < best_dist {
            best_dist = dist;
            best_id = id;
        }
    }
    u8::try_from(best_id).expect("palette capped at 64 entries")
}

/// Nearest-color-in-Lab assignment against a ≥2-entry palette. Ties
/// (equal squared distance) favor the lower palette index, which
/// falls out of `<` comparison against a running best.
pub fn build_multi(image: &BgrImage, palette: &Palette) -> Result<ColorMap> {
    validate_image(image)?;
    palette.validate_multi()?;

    let pixels = image.data();
    let assign: Vec<u8> = {
        #[cfg(feature = "parallel")]
        {
            pixels.par_iter().map(|&p| nearest_lab_id(p, palette)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            pixels.iter().map(|&p| nearest_lab_id(p, palette)).collect()
        }
    };

    Ok(ColorMap::from_assign(
        image.width(),
        image.height(),
        assign,
        palette.clone(),
    ))
}

/// Configuration for the achromatic pre-pass: any pixel whose
/// double-cone saturation is below `sensitivity` is assigned to one
/// of `achro_palette.len()` gray tiers instead of the nearest
/// chromatic color. `thresholds` has `achro_palette.len() - 1`
/// strictly increasing values in `[0,100]` compared against the
/// pixel's Lab `L`.
#[derive(Debug, Clone)]
pub struct AchroConfig {
    pub achro_palette: Palette,
    pub sensitivity: f64,
    pub thresholds: Vec<f64>,
}

impl AchroConfig {
    pub fn validate(&self) -> Result<()> {
        let tier_count = self.achro_palette.len();
        if !(2..=4).contains(&tier_count) {
            return Err(Error::invalid_configuration(
                "achromatic palette must have 2 to 4 gray tiers",
            ));
        }
        if self.thresholds.len() != tier_count - 1 {
            return Err(Error::invalid_configuration(
                "achromatic thresholds must be one fewer than the number of gray tiers",
            ));
        }
        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(Error::invalid_configuration(
                "achromatic sensitivity must be in [0,1]",
            ));
        }
        if self.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::invalid_configuration(
                "achromatic thresholds must be strictly increasing",
            ));
        }
        Ok(())
    }

    fn tier_for(&self, lab_l: f64) -> usize {
        self.thresholds.iter().filter(|&&t| lab_l >= t).count()
    }
}

/// Achromatic pre-pass over [`build_multi`]: achromatic pixels are
/// assigned to a gray tier (ids `0..achro_palette.len()`); the rest
/// fall through to nearest-Lab against `palette` (ids offset by
/// `achro_palette.len()`).
pub fn build_achro_multi(
    image: &BgrImage,
    palette: &Palette,
    achro: &AchroConfig,
) -> Result<ColorMap> {
    validate_image(image)?;
    palette.validate_multi()?;
    achro.validate()?;

    let offset = achro.achro_palette.len();
    let pixels = image.data();

    let classify = |&[b, g, r]: &[u8; 3]| -> u8 {
        let normalized = (f64::from(b) / 255.0, f64::from(g) / 255.0, f64::from(r) / 255.0);
        let hls = bgr_to_hls(normalized.0, normalized.1, normalized.2);
        let saturation = double_cone_saturation(hls);
        if saturation <= achro.sensitivity {
            let lab = bgr8_to_lab([b, g, r]);
            u8::try_from(achro.tier_for(lab.l)).expect("tier count capped at 4")
        } else {
            offset as u8 + nearest_lab_id([b, g, r], palette)
        }
    };

    let assign: Vec<u8> = {
        #[cfg(feature = "parallel")]
        {
            pixels.par_iter().map(classify).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            pixels.iter().map(classify).collect()
        }
    };

    let mut entries = achro.achro_palette.entries().to_vec();
    entries.extend(palette.entries().iter().cloned());
    let merged = Palette::new(entries);

    Ok(ColorMap::from_assign(
        image.width(),
        image.height(),
        assign,
        merged,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(width: usize, height: usize, bgr: [u8; 3]) -> BgrImage {
        BgrImage::from_data(width, height, vec![bgr; width * height]).unwrap()
    }

    #[test]
    fn binary_assigns_uniform_gray_to_black() {
        let image = solid_image(4, 4, [128, 128, 128]);
        let colormap = build_binary(&image, 128).unwrap();
        assert!((0..4).flat_map(|y| (0..4).map(move |x| (x, y)))
            .all(|(x, y)| colormap.assign_at(x, y) == 1));
    }

    #[test]
    fn binary_rejects_out_of_range_threshold() {
        let image = solid_image(2, 2, [0, 0, 0]);
        assert!(build_binary(&image, 0).is_err());
        assert!(build_binary(&image, 255).is_err());
    }

    #[test]
    fn multi_rejects_single_entry_palette() {
        let image = solid_image(2, 2, [0, 0, 0]);
        let palette = Palette::new(vec![PaletteEntry::parse_hex("a", "000000").unwrap()]);
        assert!(build_multi(&image, &palette).is_err());
    }

    #[test]
    fn multi_picks_nearest_color() {
        let image = solid_image(2, 2, [0, 0, 0]);
        let palette = Palette::new(vec![
            PaletteEntry::parse_hex("white", "FFFFFF").unwrap(),
            PaletteEntry::parse_hex("black", "000000").unwrap(),
        ]);
        let colormap = build_multi(&image, &palette).unwrap();
        assert_eq!(colormap.assign_at(0, 0), 1);
    }

    #[test]
    fn achro_rejects_non_monotone_thresholds() {
        let achro = AchroConfig {
            achro_palette: Palette::new(vec![
                PaletteEntry::parse_hex("light", "CCCCCC").unwrap(),
                PaletteEntry::parse_hex("dark", "333333").unwrap(),
            ]),
            sensitivity: 0.1,
            thresholds: vec![80.0],
        };
        assert!(achro.validate().is_ok());

        let bad = AchroConfig {
            thresholds: vec![],
            ..achro
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn achro_classifies_gray_pixel_into_a_tier() {
        let image = solid_image(2, 2, [128, 128, 128]);
        let palette = Palette::new(vec![
            PaletteEntry::parse_hex("red", "FF0000").unwrap(),
            PaletteEntry::parse_hex("blue", "0000FF").unwrap(),
        ]);
        let achro = AchroConfig {
            achro_palette: Palette::new(vec![
                PaletteEntry::parse_hex("light", "CCCCCC").unwrap(),
                PaletteEntry::parse_hex("dark", "333333").unwrap(),
            ]),
            sensitivity: 0.5,
            thresholds: vec![50.0],
        };
        let colormap = build_achro_multi(&image, &palette, &achro).unwrap();
        assert!(colormap.assign_at(0, 0) < 2);
    }
}
