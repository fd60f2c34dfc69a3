//! Input configuration
//!
//! Supports multiple profiles (debug, release) with different settings.

use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Viewport geometry used by the screen-edge predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Viewport width in logical pixels
    pub width: i32,
    /// Viewport height in logical pixels
    pub height: i32,
    /// Thickness of the band along each side that counts as "at the edge"
    pub edge_margin: i32,
}

impl ScreenConfig {
    pub const DEFAULT_WIDTH: i32 = 1680;
    pub const DEFAULT_HEIGHT: i32 = 1080;
    pub const DEFAULT_EDGE_MARGIN: i32 = 30;

    /// Rejects geometry the edge predicates cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let reason = if self.width <= 0 || self.height <= 0 {
            "screen size must be positive"
        } else if self.edge_margin < 0 {
            "edge margin must not be negative"
        } else {
            return Ok(());
        };
        Err(InputError::InvalidScreen {
            width: self.width,
            height: self.height,
            edge_margin: self.edge_margin,
            reason,
        })
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            edge_margin: Self::DEFAULT_EDGE_MARGIN,
        }
    }
}

/// Input subsystem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    /// Screen geometry for edge predicates
    pub screen: ScreenConfig,
}

impl InputConfig {
    /// Loads configuration for `profile` from the `config/` directory
    ///
    /// Sources are layered in this order:
    /// 1. built-in defaults (1680x1080 viewport, 30 px margin)
    /// 2. config/default.toml
    /// 3. config/{profile}.toml
    /// 4. Environment variables with prefix APP_ (e.g., APP_SCREEN__EDGE_MARGIN=40)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"), profile)
    }

    /// Same as [`InputConfig::load`] but reads files from `dir`
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(profile)).required(false))
            // Use __ as separator for nested fields (e.g., APP_SCREEN__WIDTH)
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("profile", profile)?
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Loads configuration using the APP_PROFILE environment variable,
    /// defaulting to "debug"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("APP_PROFILE").unwrap_or_else(|_| "debug".to_string());
        Self::load(&profile)
    }

    /// Rejects geometry the edge predicates cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.screen
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let screen = ScreenConfig::default();
        Config::builder()
            .set_default("profile", "debug")?
            .set_default("screen.width", screen.width as i64)?
            .set_default("screen.height", screen.height as i64)?
            .set_default("screen.edge_margin", screen.edge_margin as i64)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            profile: "debug".to_string(),
            screen: ScreenConfig::default(),
        }
    }
}
