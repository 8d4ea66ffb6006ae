//! Image preprocessing for plate localization
//!
//! Grayscale conversion, Gaussian smoothing and Canny edge extraction.

use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

/// Convert any decoded image to single-channel 8-bit grayscale
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Gaussian sigma for an odd kernel size when no sigma is given explicitly.
///
/// Matches the usual computer-vision convention: 1.1 for a 5x5 kernel.
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Smooth a grayscale image with a Gaussian of the given kernel size
pub fn smooth(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    gaussian_blur_f32(gray, sigma_for_kernel(kernel_size).max(f32::EPSILON))
}

/// Binary Canny edge map (255 = edge, 0 = background)
pub fn edge_map(gray: &GrayImage, kernel_size: u32, low: f32, high: f32) -> GrayImage {
    let blurred = smooth(gray, kernel_size);
    canny(&blurred, low, high)
}
