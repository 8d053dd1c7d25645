use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Tuning knobs for extraction and artifact rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Vertical bin height used to group tokens into lines, in page units.
    /// Calibrated against one statement family; denser layouts may need less.
    pub line_bin_height: f64,
    /// Decimal places kept when comparing boxes for duplicates.
    pub dedup_decimals: u32,
    pub merchant_max_chars: usize,
    pub filename_max_chars: usize,
    /// RGB, each channel in 0.0–1.0.
    pub highlight_color: [f32; 3],
    pub highlight_opacity: f32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            line_bin_height: 2.0,
            dedup_decimals: 1,
            merchant_max_chars: 40,
            filename_max_chars: 80,
            highlight_color: [1.0, 1.0, 0.0],
            highlight_opacity: 0.35,
        }
    }
}

impl ExtractionSettings {
    pub fn from_toml(toml_content: &str) -> Result<Self, SettingsError> {
        let settings: ExtractionSettings = toml::from_str(toml_content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.line_bin_height.is_finite() || self.line_bin_height <= 0.0 {
            return Err(SettingsError::Invalid {
                name: "line_bin_height",
                reason: format!("must be a positive number, got {}", self.line_bin_height),
            });
        }
        if self.dedup_decimals > 6 {
            return Err(SettingsError::Invalid {
                name: "dedup_decimals",
                reason: format!("at most 6 places, got {}", self.dedup_decimals),
            });
        }
        if self.merchant_max_chars == 0 || self.filename_max_chars == 0 {
            return Err(SettingsError::Invalid {
                name: "filename_max_chars",
                reason: "name limits must be non-zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.highlight_opacity) {
            return Err(SettingsError::Invalid {
                name: "highlight_opacity",
                reason: format!("must be within 0.0–1.0, got {}", self.highlight_opacity),
            });
        }
        if self.highlight_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(SettingsError::Invalid {
                name: "highlight_color",
                reason: format!("channels must be within 0.0–1.0, got {:?}", self.highlight_color),
            });
        }
        Ok(())
    }
}
