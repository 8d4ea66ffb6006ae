//! Vision/OCR Layer
//!
//! Locates a license plate in a decoded image and reads it with OCR:
//! grayscale -> locate -> crop -> recognize -> trim.

pub mod geometry;
pub mod locator;
pub mod ocr;
pub mod preprocess;

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::PlateError;

pub use locator::{crop_region, decode_image, PlateLocation, PlateLocator};
pub use ocr::{OcrEngine, TesseractCli};

/// Text shown when no plate-shaped region was found
pub const NOT_DETECTED_TEXT: &str = "License plate not detected";

/// Result of a recognition pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// A region was located; holds the trimmed OCR text, possibly empty
    Found(String),
    /// No plate-shaped region was located
    NotFound,
}

impl Recognition {
    /// Text to present to the user
    pub fn display_text(&self) -> &str {
        match self {
            Recognition::Found(text) => text,
            Recognition::NotFound => NOT_DETECTED_TEXT,
        }
    }
}

/// Locator and OCR engine composed into one recognition call
pub struct PlateRecognizer<E: OcrEngine> {
    locator: PlateLocator,
    engine: E,
}

impl<E: OcrEngine> PlateRecognizer<E> {
    pub fn new(locator: PlateLocator, engine: E) -> Self {
        Self { locator, engine }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Locate and read the plate in a decoded image
    pub fn recognize(&self, image: &image::DynamicImage) -> Result<Recognition, PlateError> {
        let start = Instant::now();
        let gray = preprocess::to_grayscale(image);

        let region = match self.locator.locate(&gray) {
            PlateLocation::Found { region, corners } => {
                debug!(?corners, "Plate outline");
                region
            }
            PlateLocation::NotFound => {
                info!(elapsed = ?start.elapsed(), "No license plate candidate found");
                return Ok(Recognition::NotFound);
            }
        };

        let plate = crop_region(&gray, region);
        let text = self.engine.recognize(&plate)?.trim().to_string();

        info!(
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            text = %text,
            elapsed = ?start.elapsed(),
            "License plate recognized"
        );
        Ok(Recognition::Found(text))
    }

    /// Decode an encoded image buffer and recognize it
    pub fn recognize_bytes(&self, bytes: &[u8]) -> Result<Recognition, PlateError> {
        let image = decode_image(bytes)?;
        debug!(width = image.width(), height = image.height(), "Image decoded");
        self.recognize(&image)
    }

    /// Read an image file from disk and recognize it
    pub fn recognize_file(&self, path: &Path) -> Result<Recognition, PlateError> {
        let bytes = std::fs::read(path)?;
        self.recognize_bytes(&bytes)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{BrokenOcr, CannedOcr};
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use std::io::Cursor;

    fn car_with_plate() -> DynamicImage {
        let mut img = GrayImage::from_pixel(240, 160, Luma([25]));
        draw_filled_rect_mut(&mut img, Rect::at(60, 50).of_size(120, 60), Luma([225]));
        DynamicImage::ImageLuma8(img)
    }

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn recognizer(text: &str) -> PlateRecognizer<CannedOcr> {
        PlateRecognizer::new(PlateLocator::default(), CannedOcr::new(text))
    }

    #[test]
    fn test_found_text_is_trimmed() {
        let recognizer = recognizer("  \tKA 01 AB 1234 \n\n");
        let result = recognizer.recognize(&car_with_plate()).unwrap();

        assert_eq!(result, Recognition::Found("KA 01 AB 1234".to_string()));
        assert_eq!(recognizer.engine().calls(), 1);
    }

    #[test]
    fn test_crop_handed_to_engine_matches_plate() {
        let recognizer = recognizer("X");
        recognizer.recognize(&car_with_plate()).unwrap();

        let (w, h) = recognizer.engine().last_size.lock().unwrap().unwrap();
        assert!((118..=126).contains(&w), "width = {}", w);
        assert!((58..=66).contains(&h), "height = {}", h);
    }

    #[test]
    fn test_empty_text_is_still_found() {
        let result = recognizer(" \n ").recognize(&car_with_plate()).unwrap();

        assert_eq!(result, Recognition::Found(String::new()));
        assert_ne!(result, Recognition::NotFound);
        assert_eq!(result.display_text(), "");
    }

    #[test]
    fn test_not_found_skips_ocr() {
        let recognizer = recognizer("SHOULD NOT RUN");
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(120, 80, Luma([140])));

        let result = recognizer.recognize(&blank).unwrap();
        assert_eq!(result, Recognition::NotFound);
        assert_eq!(result.display_text(), NOT_DETECTED_TEXT);
        assert_eq!(recognizer.engine().calls(), 0);
    }

    #[test]
    fn test_recognize_bytes_decodes_png() {
        let bytes = encode(&car_with_plate(), ImageFormat::Png);
        let result = recognizer("MH12").recognize_bytes(&bytes).unwrap();

        assert_eq!(result, Recognition::Found("MH12".to_string()));
    }

    #[test]
    fn test_recognize_bytes_rejects_garbage() {
        let result = recognizer("MH12").recognize_bytes(b"\x00\x01not an image");
        assert!(matches!(result, Err(PlateError::Decode(_))));
    }

    #[test]
    fn test_solid_jpeg_is_not_found() {
        let solid = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            160,
            120,
            image::Rgb([90, 120, 200]),
        ));
        let bytes = encode(&solid, ImageFormat::Jpeg);

        let result = recognizer("IGNORED").recognize_bytes(&bytes).unwrap();
        assert_eq!(result, Recognition::NotFound);
        assert_eq!(result.display_text(), "License plate not detected");
    }

    #[test]
    fn test_engine_error_propagates() {
        let recognizer = PlateRecognizer::new(PlateLocator::default(), BrokenOcr);
        let result = recognizer.recognize(&car_with_plate());

        assert!(matches!(result, Err(PlateError::Ocr(_))));
    }

    #[test]
    fn test_recognize_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.png");
        std::fs::write(&path, encode(&car_with_plate(), ImageFormat::Png)).unwrap();

        let result = recognizer("DL 3C").recognize_file(&path).unwrap();
        assert_eq!(result, Recognition::Found("DL 3C".to_string()));

        let missing = recognizer("DL 3C").recognize_file(&dir.path().join("missing.png"));
        assert!(matches!(missing, Err(PlateError::Io(_))));
    }
}
