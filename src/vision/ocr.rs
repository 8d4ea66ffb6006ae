//! OCR (Optical Character Recognition) module
//!
//! Text recognition is delegated to the Tesseract command line tool. The
//! cropped plate is handed over as a temporary grayscale PNG.

use image::{GrayImage, ImageFormat};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::OcrConfig;
use crate::error::PlateError;

/// OCR engine abstraction so the recognizer can run without Tesseract in tests
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in a tightly cropped grayscale region.
    ///
    /// The returned text is untrimmed; callers trim it.
    fn recognize(&self, region: &GrayImage) -> Result<String, PlateError>;
}

impl<T: OcrEngine + ?Sized> OcrEngine for Arc<T> {
    fn recognize(&self, region: &GrayImage) -> Result<String, PlateError> {
        (**self).recognize(region)
    }
}

/// Tesseract engine driven through its executable
#[derive(Debug, Clone)]
pub struct TesseractCli {
    config: OcrConfig,
}

impl TesseractCli {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Check whether the configured executable can be launched
    pub fn is_available(&self) -> bool {
        match Command::new(&self.config.tesseract_cmd).arg("--version").output() {
            Ok(output) => output.status.success(),
            Err(e) => {
                warn!(
                    "Tesseract not runnable at {:?}: {}",
                    self.config.tesseract_cmd, e
                );
                false
            }
        }
    }

    fn run(&self, image_path: &Path) -> Result<String, PlateError> {
        let output = Command::new(&self.config.tesseract_cmd)
            .arg(image_path)
            .arg("stdout")
            .arg("--psm")
            .arg(self.config.psm.to_string())
            .arg("-l")
            .arg(&self.config.lang)
            .output()
            .map_err(|e| {
                PlateError::Ocr(format!(
                    "failed to launch {:?}: {}",
                    self.config.tesseract_cmd, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlateError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, region: &GrayImage) -> Result<String, PlateError> {
        let tmp = tempfile::Builder::new()
            .prefix("plate-")
            .suffix(".png")
            .tempfile()?;

        region
            .save_with_format(tmp.path(), ImageFormat::Png)
            .map_err(|e| PlateError::Ocr(format!("failed to encode plate crop: {}", e)))?;

        debug!(
            width = region.width(),
            height = region.height(),
            psm = self.config.psm,
            "Running tesseract"
        );

        self.run(tmp.path())
    }
}
