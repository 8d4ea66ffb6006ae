//! License plate localization
//!
//! Finds the first quadrilateral among the largest contours of the edge map.
//! The rule is a heuristic: any four-cornered outline (a window, a sign) is
//! accepted, and rotated or low-contrast plates are missed.

use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use imageproc::point::Point;
use tracing::debug;

use super::geometry::{
    approximate_closed_polygon, closed_perimeter, compress_chain, contour_area, PlateRegion,
};
use super::preprocess::edge_map;
use crate::config::LocatorConfig;
use crate::error::PlateError;

/// Outcome of a localization pass
#[derive(Debug, Clone, PartialEq)]
pub enum PlateLocation {
    /// A quadrilateral was accepted
    Found {
        /// Bounding box of the accepted polygon, inside the image bounds
        region: PlateRegion,
        /// Vertices of the polygon approximation
        corners: Vec<Point<i32>>,
    },
    /// No candidate contour approximated to a quadrilateral
    NotFound,
}

impl PlateLocation {
    #[cfg(test)]
    pub fn region(&self) -> Option<PlateRegion> {
        match self {
            PlateLocation::Found { region, .. } => Some(*region),
            PlateLocation::NotFound => None,
        }
    }
}

/// Decode an uploaded buffer into an image
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PlateError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Crop a grayscale image to `region`, clamped to the image bounds
pub fn crop_region(gray: &GrayImage, region: PlateRegion) -> GrayImage {
    let (width, height) = gray.dimensions();
    let r = region.clamp_to(width, height);
    image::imageops::crop_imm(gray, r.x, r.y, r.width, r.height).to_image()
}

/// Edge and contour based plate locator
#[derive(Debug, Clone, Default)]
pub struct PlateLocator {
    config: LocatorConfig,
}

impl PlateLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Locate a plate in a grayscale image
    pub fn locate(&self, gray: &GrayImage) -> PlateLocation {
        let edges = edge_map(
            gray,
            self.config.blur_kernel_size,
            self.config.canny_low,
            self.config.canny_high,
        );
        self.locate_in_edges(&edges)
    }

    /// Locate a plate in an already computed binary edge map
    pub fn locate_in_edges(&self, edges: &GrayImage) -> PlateLocation {
        let Some(corners) = self.find_quadrilateral(edges) else {
            return PlateLocation::NotFound;
        };

        let (width, height) = edges.dimensions();
        match PlateRegion::bounding(&corners).map(|r| r.clamp_to(width, height)) {
            Some(region) if !region.is_empty() => {
                debug!(?region, "Plate candidate accepted");
                PlateLocation::Found { region, corners }
            }
            _ => PlateLocation::NotFound,
        }
    }

    /// Scan the largest contours in descending area order and return the
    /// polygon of the first one that approximates to `corner_count` vertices
    fn find_quadrilateral(&self, edges: &GrayImage) -> Option<Vec<Point<i32>>> {
        let mut candidates: Vec<(f64, Vec<Point<i32>>)> = find_contours::<i32>(edges)
            .into_iter()
            .map(|contour| {
                let points = compress_chain(&contour.points);
                (contour_area(&points), points)
            })
            .collect();

        let total = candidates.len();
        // Stable, so equal areas keep extraction order
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.truncate(self.config.max_candidates);

        debug!(
            contours = total,
            examined = candidates.len(),
            "Ranking contours by area"
        );

        for (rank, (area, points)) in candidates.into_iter().enumerate() {
            if points.len() < self.config.corner_count {
                continue;
            }

            let perimeter = closed_perimeter(&points);
            if perimeter <= 0.0 {
                continue;
            }

            let approx =
                approximate_closed_polygon(&points, self.config.approx_epsilon_ratio * perimeter);
            if approx.len() == self.config.corner_count {
                debug!(rank, area, perimeter, "Quadrilateral contour found");
                return Some(approx);
            }
        }

        None
    }
}
