// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Raster primitives: the grayscale/BGR image types, color-space
//! conversions, binary morphology, and Canny edges that every stage
//! above this one builds on.

pub mod canny;
pub mod color;
pub mod image;
pub mod morphology;

pub use canny::canny;
pub use color::{bgr8_to_lab, bgr_to_hls, bgr_to_lab, double_cone_saturation, Hls, Lab};
pub use image::{BgrImage, Mask};
pub use morphology::{
    close, connected_components, dilate, erode, kernel_offsets, open, remove_small_components,
    ring_neighbor_counts, zhang_suen_thin, KernelShape, NEIGHBORS_8,
};
