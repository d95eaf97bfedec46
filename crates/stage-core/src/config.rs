//! Editor configuration.
//!
//! Every field has a default matching the stock demo scene, so an empty JSON
//! object (or no config at all) yields a working editor.

use crate::error::ConfigError;
use crate::model::{Bounds, Color, MIN_FONT_SIZE, Size};
use serde::{Deserialize, Serialize};

/// The host window (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Stage size as fractions of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub width_fraction: f32,
    pub height_fraction: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width_fraction: 0.7,
            height_fraction: 1.0,
        }
    }
}

impl StageConfig {
    pub fn stage_size(&self, viewport: Viewport) -> Size {
        Size::new(
            viewport.width * self.width_fraction,
            viewport.height * self.height_fraction,
        )
    }
}

/// Where an asset-backed node appears once its asset has loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub url: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Attach aspect-locked corner handles when selected.
    #[serde(default)]
    pub keep_aspect_ratio: bool,
    /// Attach corner handles at all when selected.
    #[serde(default)]
    pub resizable: bool,
}

impl AssetConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }
}

fn default_image() -> AssetConfig {
    AssetConfig {
        url: "https://konvajs.org/assets/lion.png".into(),
        x: 50.0,
        y: 50.0,
        width: 200.0,
        height: 200.0,
        keep_aspect_ratio: true,
        resizable: true,
    }
}

fn default_video() -> AssetConfig {
    AssetConfig {
        url: "https://www.w3schools.com/html/mov_bbb.mp4".into(),
        x: 300.0,
        y: 50.0,
        width: 300.0,
        height: 200.0,
        keep_aspect_ratio: false,
        resizable: false,
    }
}

/// Initial state of the text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDefaults {
    pub content: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// Fill as `#RRGGBB`.
    pub fill: String,
    /// Whether the label exists when the editor mounts.
    pub visible_on_mount: bool,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            content: "Hello Konva".into(),
            x: 100.0,
            y: 100.0,
            font_size: 30.0,
            fill: "#000000".into(),
            visible_on_mount: false,
        }
    }
}

impl TextDefaults {
    pub fn fill_color(&self) -> Color {
        Color::from_hex(&self.fill).unwrap_or(Color::BLACK)
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub stage: StageConfig,
    pub image: AssetConfig,
    pub video: AssetConfig,
    pub text: TextDefaults,
    /// Pixels moved by one step-move command.
    pub move_step: f32,
    /// Font-size change of one increase/decrease command.
    pub font_step: f32,
    pub min_font_size: f32,
    /// Pointer travel under which a press/release pair counts as a click.
    pub click_slop: f32,
    /// Side length of a drawn handle square; also its hit radius.
    pub handle_size: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stage: StageConfig::default(),
            image: default_image(),
            video: default_video(),
            text: TextDefaults::default(),
            move_step: 10.0,
            font_step: 2.0,
            min_font_size: MIN_FONT_SIZE,
            click_slop: 3.0,
            handle_size: 8.0,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_step <= 0.0 {
            return Err(ConfigError::Range(format!(
                "move_step must be positive, got {}",
                self.move_step
            )));
        }
        if self.min_font_size < MIN_FONT_SIZE {
            return Err(ConfigError::Range(format!(
                "min_font_size must be at least {MIN_FONT_SIZE}, got {}",
                self.min_font_size
            )));
        }
        if self.text.font_size < self.min_font_size {
            return Err(ConfigError::Range(format!(
                "text.font_size {} is below min_font_size {}",
                self.text.font_size, self.min_font_size
            )));
        }
        Ok(())
    }
}
