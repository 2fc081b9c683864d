// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! The user-painted mode map: attributes each pixel to a converter
//! instance.

use crate::error::{Error, Result};
use crate::raster::Mask;

/// `mode_map(x,y) = m` attributes that pixel to converter-instance
/// `m`; `0` means unattributed. Backed by the same `Mask` storage as
/// other single-channel rasters, but values are instance ids rather
/// than a strict 0/255 mask.
#[derive(Debug, Clone)]
pub struct ModeMap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ModeMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_data(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::invalid_input(
                "mode map data length does not match width * height",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn check_matches(&self, width: usize, height: usize) -> Result<()> {
        if self.width != width || self.height != height {
            return Err(Error::invalid_input(
                "mode map size does not match image size",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn mode_at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn paint(&mut self, x: usize, y: usize, mode_id: u8) {
        self.data[y * self.width + x] = mode_id;
    }

    /// The boolean mask of pixels attributed to `mode_id`, the
    /// per-converter filter every converter applies before writing.
    #[must_use]
    pub fn mask_for(&self, mode_id: u8) -> Mask {
        let data = self
            .data
            .iter()
            .map(|&m| if m == mode_id { 255 } else { 0 })
            .collect();
        Mask::from_data(self.width, self.height, data).expect("dimensions match by construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_restricted_to_painted_pixels() {
        let mut map = ModeMap::new(3, 3);
        map.paint(1, 1, 5);
        let mask = map.mask_for(5);
        assert_eq!(mask.count_set(), 1);
        assert!(mask.is_set(1, 1));
    }

    #[test]
    fn rejects_size_mismatch() {
        let map = ModeMap::new(3, 3);
        assert!(map.check_matches(4, 4).is_err());
    }
}
