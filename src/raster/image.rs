// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};

/// A single-channel 8-bit raster. Used for binary masks (0/255) and
/// grayscale images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Mask {
    #[must_use]
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_data(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::invalid_input(
                "mask data length does not match width * height",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            0
        } else {
            self.data[y as usize * self.width + x as usize]
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    #[must_use]
    #[inline]
    pub fn is_set(&self, x: i64, y: i64) -> bool {
        self.get(x, y) == 255
    }

    #[must_use]
    pub fn on_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// Number of set (255) pixels.
    #[must_use]
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v == 255).count()
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.data.chunks_mut(self.width)
    }

    #[cfg(feature = "parallel")]
    pub fn par_rows_mut(&mut self) -> impl rayon::prelude::IndexedParallelIterator<Item = &mut [u8]> {
        self.data.par_chunks_mut(self.width)
    }

    #[must_use]
    pub fn bitor(&self, other: &Self) -> Self {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| if a == 255 || b == 255 { 255 } else { 0 })
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn union_from(&mut self, other: &Self) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            if b == 255 {
                *a = 255;
            }
        }
    }

    #[must_use]
    pub fn invert(&self) -> Self {
        let data = self.data.iter().map(|&v| 255 - v).collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| if a == 255 && b == 255 { 255 } else { 0 })
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// A BGR color raster, 8 bits per channel, matching the byte order the
/// original capture pipeline and the palette hex codes both use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgrImage {
    width: usize,
    height: usize,
    /// Flattened `[b, g, r]` triples, row-major.
    data: Vec<[u8; 3]>,
}

impl BgrImage {
    pub fn from_data(width: usize, height: usize, data: Vec<[u8; 3]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_input("image has zero width or height"));
        }
        if data.len() != width * height {
            return Err(Error::invalid_input(
                "image data length does not match width * height",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn data(&self) -> &[[u8; 3]] {
        &self.data
    }

    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        self.data[y * self.width + x]
    }

    /// Grayscale via the BT.601-ish weights the teacher's `Rgb::to_gray`
    /// uses, applied channel-swapped for BGR.
    #[must_use]
    pub fn to_grayscale(&self) -> Mask {
        let data = self
            .data
            .iter()
            .map(|&[b, g, r]| {
                let gray = (u32::from(r) * 11 + u32::from(g) * 16 + u32::from(b) * 5) / 32;
                u8::try_from(gray).unwrap_or(255)
            })
            .collect();
        Mask {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_out_of_bounds_reads_as_unset() {
        let mask = Mask::filled(2, 2, 255);
        assert_eq!(mask.get(-1, 0), 0);
        assert_eq!(mask.get(5, 5), 0);
        assert!(mask.is_set(0, 0));
    }

    #[test]
    fn bitor_unions_pixels() {
        let mut a = Mask::filled(2, 1, 0);
        a.set(0, 0, 255);
        let mut b = Mask::filled(2, 1, 0);
        b.set(1, 0, 255);
        let merged = a.bitor(&b);
        assert_eq!(merged.count_set(), 2);
    }

    #[test]
    fn rejects_mismatched_data_length() {
        let err = BgrImage::from_data(2, 2, vec![[0, 0, 0]]).unwrap_err();
        assert_eq!(err.message(), "image data length does not match width * height");
    }
}
