//! Application Configuration
//!
//! Server, locator and OCR settings stored in TOML format.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP upload service settings
    pub server: ServerConfig,
    /// Plate localization thresholds
    pub locator: LocatorConfig,
    /// OCR engine settings
    pub ocr: OcrConfig,
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.locator.validate()?;
        Ok(())
    }
}

/// Upload service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Directory where raw uploads are stored and served from
    pub upload_dir: PathBuf,
    /// Lowercase file extensions accepted by the upload endpoint
    pub allowed_extensions: Vec<String>,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.allowed_extensions.is_empty() {
            bail!("server.allowed_extensions must not be empty");
        }
        if self.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be greater than 0");
        }
        Ok(())
    }
}

/// Plate locator thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Gaussian kernel size (odd), sigma is derived from it
    pub blur_kernel_size: u32,
    /// Canny hysteresis low threshold
    pub canny_low: f32,
    /// Canny hysteresis high threshold
    pub canny_high: f32,
    /// Number of largest contours examined
    pub max_candidates: usize,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub approx_epsilon_ratio: f64,
    /// Vertex count a contour approximation must have to be accepted
    pub corner_count: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            canny_low: 100.0,
            canny_high: 200.0,
            max_candidates: 10,
            approx_epsilon_ratio: 0.02,
            corner_count: 4,
        }
    }
}

impl LocatorConfig {
    fn validate(&self) -> Result<()> {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            bail!(
                "locator.blur_kernel_size must be odd and positive, got {}",
                self.blur_kernel_size
            );
        }
        if self.canny_low < 0.0 || self.canny_low > self.canny_high {
            bail!(
                "locator.canny_low ({}) must be in 0..=canny_high ({})",
                self.canny_low,
                self.canny_high
            );
        }
        if self.max_candidates == 0 {
            bail!("locator.max_candidates must be greater than 0");
        }
        if self.approx_epsilon_ratio.is_nan() || self.approx_epsilon_ratio <= 0.0 {
            bail!("locator.approx_epsilon_ratio must be positive");
        }
        if self.corner_count < 3 {
            bail!("locator.corner_count must be at least 3");
        }
        Ok(())
    }
}

/// Tesseract OCR settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable
    pub tesseract_cmd: PathBuf,
    /// Page segmentation mode (8 = single word)
    pub psm: u8,
    /// Tesseract language code
    pub lang: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            psm: 8,
            lang: "eng".to_string(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.server.allowed_extensions, vec!["png", "jpg", "jpeg"]);

        assert_eq!(config.locator.blur_kernel_size, 5);
        assert!((config.locator.canny_low - 100.0).abs() < f32::EPSILON);
        assert!((config.locator.canny_high - 200.0).abs() < f32::EPSILON);
        assert_eq!(config.locator.max_candidates, 10);
        assert!((config.locator.approx_epsilon_ratio - 0.02).abs() < 1e-9);
        assert_eq!(config.locator.corner_count, 4);

        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("tesseract"));
        assert_eq!(config.ocr.psm, 8);
        assert_eq!(config.ocr.lang, "eng");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.locator.max_candidates = 25;
        config.ocr.tesseract_cmd = PathBuf::from("/opt/tesseract/bin/tesseract");

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.locator.max_candidates, 25);
        assert_eq!(parsed.ocr.tesseract_cmd, config.ocr.tesseract_cmd);
        assert_eq!(parsed.server.bind, config.server.bind);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[locator]\ncanny_low = 50.0\n").unwrap();

        assert!((parsed.locator.canny_low - 50.0).abs() < f32::EPSILON);
        assert!((parsed.locator.canny_high - 200.0).abs() < f32::EPSILON);
        assert_eq!(parsed.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(parsed.ocr.psm, 8);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.server.bind, loaded.server.bind);
        assert_eq!(config.locator.max_candidates, loaded.locator.max_candidates);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[locator]\nblur_kernel_size = 4").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_locator_bounds() {
        let mut config = AppConfig::default();
        config.locator.canny_low = 300.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.locator.max_candidates = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.locator.approx_epsilon_ratio = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.locator.corner_count = 2;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }
}
